//! Mentor area: dashboard, courses, students, discussions and analytics.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::count_by;
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Course, Db, Discussion, DiscussionReply, Enrollment, LessonProgress, Profile};
use crate::util;

const RECENT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MentorStats {
    pub published_courses: u64,
    pub students: u64,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscussionItem {
    pub id: Uuid,
    pub title: String,
    pub course_title: Option<String>,
    pub author: String,
    pub is_pinned: bool,
    pub reply_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentItem {
    pub id: Uuid,
    pub student: String,
    pub course_title: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorDashboard {
    pub first_name: String,
    pub stats: MentorStats,
    pub recent_discussions: Vec<DiscussionItem>,
    pub recent_enrollments: Vec<EnrollmentItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorCourse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub enrollment_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorCourses {
    pub courses: Vec<MentorCourse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentItem {
    pub user_id: Uuid,
    pub full_name: String,
    pub initials: String,
    pub enrollment_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorStudents {
    pub students: Vec<StudentItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorDiscussions {
    pub discussions: Vec<DiscussionItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub course_id: Uuid,
    pub title: String,
    pub enrollments: u64,
    /// Share of enrollments marked complete.
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorAnalytics {
    pub courses: Vec<CourseAnalytics>,
    pub total_enrollments: u64,
}

async fn names(
    db: Db<'_>,
    user_ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ApiError> {
    let ids: HashSet<Uuid> = user_ids.into_iter().collect();
    let profiles: Vec<Profile> = db.list(Query::new().is_in("user_id", ids)).await?;
    Ok(profiles
        .into_iter()
        .filter_map(|p| Some((p.user_id, p.full_name?)))
        .collect())
}

async fn course_titles(
    db: Db<'_>,
    course_ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ApiError> {
    let ids: HashSet<Uuid> = course_ids.into_iter().collect();
    let courses: Vec<Course> = db
        .list(Query::new().is_in("id", ids))
        .await?;
    Ok(courses.into_iter().map(|c| (c.id, c.title)).collect())
}

fn display_name(names: &HashMap<Uuid, String>, user_id: &Uuid) -> String {
    names
        .get(user_id)
        .cloned()
        .unwrap_or_else(|| "Usuário".to_string())
}

async fn discussion_items(
    db: Db<'_>,
    limit: Option<usize>,
) -> Result<Vec<DiscussionItem>, ApiError> {
    let mut query = Query::new().order_by_desc("created_at");
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let discussions: Vec<Discussion> = db.list(query).await?;

    let (authors, courses, replies) = futures::try_join!(
        names(db, discussions.iter().map(|d| d.user_id)),
        course_titles(db, discussions.iter().map(|d| d.course_id)),
        db.list::<DiscussionReply>(
            Query::new().is_in("discussion_id", discussions.iter().map(|d| d.id))
        ),
    )?;
    let reply_counts = count_by(&replies, |r| r.discussion_id);

    Ok(discussions
        .into_iter()
        .map(|d| DiscussionItem {
            author: display_name(&authors, &d.user_id),
            course_title: courses.get(&d.course_id).cloned(),
            reply_count: reply_counts.get(&d.id).copied().unwrap_or(0),
            id: d.id,
            title: d.title,
            is_pinned: d.is_pinned,
            created_at: d.created_at,
        })
        .collect())
}

async fn recent_enrollments(db: Db<'_>) -> Result<Vec<EnrollmentItem>, ApiError> {
    let enrollments: Vec<Enrollment> = db
        .list(Query::new().order_by_desc("enrolled_at").limit(RECENT))
        .await?;
    let (students, courses) = futures::try_join!(
        names(db, enrollments.iter().map(|e| e.user_id)),
        course_titles(db, enrollments.iter().map(|e| e.course_id)),
    )?;

    Ok(enrollments
        .into_iter()
        .map(|e| EnrollmentItem {
            student: display_name(&students, &e.user_id),
            course_title: courses.get(&e.course_id).cloned(),
            id: e.id,
            enrolled_at: e.enrolled_at,
        })
        .collect())
}

pub async fn stats(db: Db<'_>) -> Result<MentorStats, ApiError> {
    let (published_courses, enrollments, completed, progress_rows) = futures::try_join!(
        db.count::<Course>(Query::new().eq("is_published", true)),
        db.list::<Enrollment>(Query::new()),
        db.count::<LessonProgress>(Query::new().eq("is_completed", true)),
        db.count::<LessonProgress>(Query::new()),
    )?;
    let students: HashSet<Uuid> = enrollments.iter().map(|e| e.user_id).collect();

    Ok(MentorStats {
        published_courses,
        students: students.len() as u64,
        completion_rate: util::percent(completed, progress_rows),
    })
}

pub async fn dashboard(db: Db<'_>, user_id: Uuid) -> Result<MentorDashboard, ApiError> {
    let (profile, stats, recent_discussions, recent_enrollments) = futures::try_join!(
        super::student::profile(db, user_id),
        stats(db),
        discussion_items(db, Some(RECENT)),
        recent_enrollments(db),
    )?;

    Ok(MentorDashboard {
        first_name: util::first_name(
            profile.as_ref().and_then(|p| p.full_name.as_deref()),
            "Mentor",
        )
        .to_string(),
        stats,
        recent_discussions,
        recent_enrollments,
    })
}

pub async fn courses(db: Db<'_>) -> Result<MentorCourses, ApiError> {
    let courses: Vec<Course> = db
        .list(
            Query::new()
                .eq("is_published", true)
                .order_by("order_index"),
        )
        .await?;
    let enrollments: Vec<Enrollment> = db
        .list(Query::new().is_in("course_id", courses.iter().map(|c| c.id)))
        .await?;
    let counts = count_by(&enrollments, |e| e.course_id);

    Ok(MentorCourses {
        courses: courses
            .into_iter()
            .map(|c| MentorCourse {
                enrollment_count: counts.get(&c.id).copied().unwrap_or(0),
                id: c.id,
                title: c.title,
                slug: c.slug,
                description: c.description,
                duration: c.duration,
            })
            .collect(),
    })
}

pub async fn students(db: Db<'_>) -> Result<MentorStudents, ApiError> {
    let enrollments: Vec<Enrollment> = db.list(Query::new().order_by_desc("enrolled_at")).await?;
    let counts = count_by(&enrollments, |e| e.user_id);

    // Most recently enrolled first, each student once.
    let mut seen = HashSet::new();
    let order: Vec<Uuid> = enrollments
        .iter()
        .map(|e| e.user_id)
        .filter(|id| seen.insert(*id))
        .collect();
    let profiles = names(db, order.iter().copied()).await?;

    Ok(MentorStudents {
        students: order
            .into_iter()
            .map(|user_id| {
                let full_name = display_name(&profiles, &user_id);
                StudentItem {
                    initials: util::initials(profiles.get(&user_id).map(String::as_str)),
                    enrollment_count: counts.get(&user_id).copied().unwrap_or(0),
                    user_id,
                    full_name,
                }
            })
            .collect(),
    })
}

pub async fn discussions(db: Db<'_>) -> Result<MentorDiscussions, ApiError> {
    Ok(MentorDiscussions {
        discussions: discussion_items(db, None).await?,
    })
}

pub async fn analytics(db: Db<'_>) -> Result<MentorAnalytics, ApiError> {
    let (courses, enrollments) = futures::try_join!(
        db.list::<Course>(Query::new().eq("is_published", true).order_by("order_index")),
        db.list::<Enrollment>(Query::new()),
    )?;
    let totals = count_by(&enrollments, |e| e.course_id);
    let completed = count_by(
        &enrollments
            .iter()
            .filter(|e| e.completed_at.is_some())
            .collect::<Vec<_>>(),
        |e| e.course_id,
    );

    Ok(MentorAnalytics {
        total_enrollments: enrollments.len() as u64,
        courses: courses
            .into_iter()
            .map(|c| {
                let total = totals.get(&c.id).copied().unwrap_or(0);
                let done = completed.get(&c.id).copied().unwrap_or(0);
                CourseAnalytics {
                    course_id: c.id,
                    title: c.title,
                    enrollments: total,
                    completion_rate: util::percent(done, total),
                }
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryApi;
    use crate::db::Table;
    use serde_json::json;

    struct Fixture {
        store: MemoryApi,
        html: Uuid,
        ana: Uuid,
        bia: Uuid,
    }

    fn fixture() -> Fixture {
        let store = MemoryApi::new();
        let track = store.seed(Table::Tracks, json!({"title": "Web", "slug": "web"}));
        let html = store.seed(
            Table::Courses,
            json!({"title": "HTML", "slug": "html", "track_id": track, "is_published": true}),
        );
        let css = store.seed(
            Table::Courses,
            json!({"title": "CSS", "slug": "css", "track_id": track, "is_published": true,
                   "order_index": 1}),
        );
        store.seed(
            Table::Courses,
            json!({"title": "Rascunho", "slug": "rascunho", "track_id": track}),
        );

        let ana = Uuid::new_v4();
        let bia = Uuid::new_v4();
        store.seed(Table::Profiles, json!({"user_id": ana, "full_name": "Ana Souza"}));
        store.seed(
            Table::Enrollments,
            json!({"user_id": ana, "course_id": html, "enrolled_at": "2024-03-01T10:00:00Z",
                   "completed_at": "2024-04-01T10:00:00Z"}),
        );
        store.seed(
            Table::Enrollments,
            json!({"user_id": ana, "course_id": css, "enrolled_at": "2024-03-02T10:00:00Z"}),
        );
        store.seed(
            Table::Enrollments,
            json!({"user_id": bia, "course_id": html, "enrolled_at": "2024-03-03T10:00:00Z"}),
        );
        Fixture { store, html, ana, bia }
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let f = fixture();
        let lesson = Uuid::new_v4();
        f.store.seed(
            Table::LessonProgress,
            json!({"user_id": f.ana, "lesson_id": lesson, "is_completed": true}),
        );
        f.store.seed(Table::LessonProgress, json!({"user_id": f.bia, "lesson_id": lesson}));
        let d = f.store.seed(
            Table::Discussions,
            json!({"title": "Dúvida sobre tags", "course_id": f.html, "user_id": f.ana}),
        );
        f.store.seed(Table::DiscussionReplies, json!({"discussion_id": d, "user_id": f.bia}));

        let view = dashboard(Db::new(&f.store, Some("t")), Uuid::new_v4()).await.unwrap();
        assert_eq!(view.first_name, "Mentor");
        assert_eq!(
            view.stats,
            MentorStats {
                published_courses: 2,
                students: 2,
                completion_rate: 50
            }
        );
        assert_eq!(view.recent_discussions[0].author, "Ana Souza");
        assert_eq!(view.recent_discussions[0].course_title.as_deref(), Some("HTML"));
        assert_eq!(view.recent_discussions[0].reply_count, 1);
        assert_eq!(view.recent_enrollments.len(), 3);
        assert_eq!(view.recent_enrollments[0].student, "Usuário");
    }

    #[tokio::test]
    async fn test_students_are_distinct() {
        let f = fixture();
        let view = students(Db::new(&f.store, Some("t"))).await.unwrap();
        assert_eq!(view.students.len(), 2);
        assert_eq!(view.students[0].user_id, f.bia);
        assert_eq!(view.students[1].enrollment_count, 2);
        assert_eq!(view.students[1].initials, "AS");
    }

    #[tokio::test]
    async fn test_courses_and_analytics() {
        let f = fixture();
        let db = Db::new(&f.store, Some("t"));

        let listed = courses(db).await.unwrap();
        let titles: Vec<_> = listed.courses.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["HTML", "CSS"]);
        assert_eq!(listed.courses[0].enrollment_count, 2);

        let report = analytics(db).await.unwrap();
        assert_eq!(report.total_enrollments, 3);
        assert_eq!(report.courses[0].completion_rate, 50);
        assert_eq!(report.courses[1].completion_rate, 0);
    }

    #[tokio::test]
    async fn test_discussions_newest_first() {
        let f = fixture();
        let old = f.store.seed(
            Table::Discussions,
            json!({"title": "Boas-vindas", "course_id": f.html, "user_id": f.ana,
                   "is_pinned": true, "created_at": "2024-03-01T10:00:00Z"}),
        );
        let new = f.store.seed(
            Table::Discussions,
            json!({"title": "Seletores", "course_id": f.html, "user_id": f.bia,
                   "created_at": "2024-05-01T10:00:00Z"}),
        );
        f.store.seed(Table::DiscussionReplies, json!({"discussion_id": old, "user_id": f.bia}));
        f.store.seed(Table::DiscussionReplies, json!({"discussion_id": old, "user_id": f.ana}));

        let view = discussions(Db::new(&f.store, Some("t"))).await.unwrap();
        let ids: Vec<_> = view.discussions.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![new, old]);
        assert_eq!(view.discussions[0].author, "Usuário");
        assert_eq!(view.discussions[0].reply_count, 0);
        assert!(view.discussions[1].is_pinned);
        assert_eq!(view.discussions[1].author, "Ana Souza");
        assert_eq!(view.discussions[1].reply_count, 2);
    }
}
