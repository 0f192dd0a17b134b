//! Rows of the hosted tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Row, Table};
use crate::access::role::Role;

fn default_color() -> String {
    "coral".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub track_id: Uuid,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub course_id: Uuid,
    #[serde(default)]
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    #[default]
    Video,
    Text,
    Quiz,
    Practice,
}

impl LessonType {
    pub const ALL: [LessonType; 4] = [
        LessonType::Video,
        LessonType::Text,
        LessonType::Practice,
        LessonType::Quiz,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LessonType::Video => "Vídeo",
            LessonType::Text => "Leitura",
            LessonType::Practice => "Prática",
            LessonType::Quiz => "Quiz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_transcript: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub lesson_type: LessonType,
    pub module_id: Uuid,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub progress_percent: i32,
    #[serde(default)]
    pub video_position: Option<i32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[serde(default)]
    pub track_id: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
    pub certificate_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionReply {
    pub id: Uuid,
    pub discussion_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_solution: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_instructor: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

macro_rules! impl_row {
    ($($ty:ty => $table:expr),* $(,)?) => {
        $(impl Row for $ty {
            const TABLE: Table = $table;
        })*
    };
}

impl_row! {
    Track => Table::Tracks,
    Course => Table::Courses,
    Module => Table::Modules,
    Lesson => Table::Lessons,
    Enrollment => Table::Enrollments,
    LessonProgress => Table::LessonProgress,
    LessonNote => Table::LessonNotes,
    Certificate => Table::Certificates,
    Discussion => Table::Discussions,
    DiscussionReply => Table::DiscussionReplies,
    UserRole => Table::UserRoles,
    Profile => Table::Profiles,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hosted_row_shapes_decode() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "7d7a6c8e-3b0c-4d2e-9a55-1f0b8e8a2f11",
            "title": "Seletores",
            "content": null,
            "lesson_type": "practice",
            "module_id": "0b6f8a3e-5c1d-4e7a-8f2b-9d3c4e5f6a7b",
            "is_published": true,
            "order_index": 3,
            "created_at": "2024-03-01T12:00:00.123456+00:00",
            "updated_at": "2024-03-01T12:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(lesson.lesson_type, LessonType::Practice);
        assert_eq!(lesson.lesson_type.label(), "Prática");
        assert!(lesson.video_url.is_none());

        let role: UserRole = serde_json::from_value(json!({
            "id": "1b6f8a3e-5c1d-4e7a-8f2b-9d3c4e5f6a7b",
            "user_id": "2b6f8a3e-5c1d-4e7a-8f2b-9d3c4e5f6a7b",
            "role": "mentor",
            "created_at": "2024-03-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(role.role, Role::Mentor);
    }

    #[test]
    fn test_lesson_type_labels() {
        let labels: Vec<_> = LessonType::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Vídeo", "Leitura", "Prática", "Quiz"]);
    }
}
