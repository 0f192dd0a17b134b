//! Student area: dashboard, enrolled courses, track browser, certificates and community.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{count_by, Placeholder};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{
    Certificate, Course, Db, Enrollment, Lesson, LessonProgress, Module, Profile, Track,
};
use crate::util;

const RECENT_ENROLLMENTS: usize = 5;
const FEATURED_TRACKS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StudentStats {
    pub enrollments: u64,
    pub certificates: u64,
    pub lessons_completed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse {
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub track_slug: Option<String>,
    pub track_title: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub completed: bool,
    pub progress_percent: u32,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub course_count: u64,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub first_name: String,
    pub stats: StudentStats,
    pub recent_courses: Vec<EnrolledCourse>,
    pub featured_tracks: Vec<TrackSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentCourses {
    pub courses: Vec<EnrolledCourse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentTracks {
    pub tracks: Vec<TrackSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateItem {
    pub id: Uuid,
    pub certificate_number: String,
    pub issued_at: DateTime<Utc>,
    /// Title of the course or track the certificate was issued for.
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentCertificates {
    pub certificates: Vec<CertificateItem>,
}

pub(crate) async fn profile(db: Db<'_>, user_id: Uuid) -> Result<Option<Profile>, ApiError> {
    db.first(Query::new().eq("user_id", user_id)).await
}

/// Completion percent per course for one user.
pub(crate) async fn course_progress(
    db: Db<'_>,
    user_id: Uuid,
    course_ids: &[Uuid],
) -> Result<HashMap<Uuid, u32>, ApiError> {
    let modules: Vec<Module> = db
        .list(Query::new().is_in("course_id", course_ids))
        .await?;
    let lessons: Vec<Lesson> = db
        .list(Query::new().is_in("module_id", modules.iter().map(|m| m.id)))
        .await?;
    let completed: Vec<LessonProgress> = db
        .list(
            Query::new()
                .eq("user_id", user_id)
                .eq("is_completed", true)
                .is_in("lesson_id", lessons.iter().map(|l| l.id)),
        )
        .await?;

    let course_of_module: HashMap<Uuid, Uuid> =
        modules.iter().map(|m| (m.id, m.course_id)).collect();
    let course_of_lesson: HashMap<Uuid, Uuid> = lessons
        .iter()
        .filter_map(|l| course_of_module.get(&l.module_id).map(|c| (l.id, *c)))
        .collect();

    let totals = count_by(&lessons, |l| course_of_module.get(&l.module_id).copied());
    let done: HashSet<Uuid> = completed.iter().map(|p| p.lesson_id).collect();
    let done_per_course = count_by(&done.into_iter().collect::<Vec<_>>(), |id| {
        course_of_lesson.get(id).copied()
    });

    Ok(course_ids
        .iter()
        .map(|id| {
            let total = totals.get(&Some(*id)).copied().unwrap_or(0);
            let done = done_per_course.get(&Some(*id)).copied().unwrap_or(0);
            (*id, util::percent(done, total))
        })
        .collect())
}

async fn enrolled_courses(
    db: Db<'_>,
    user_id: Uuid,
    limit: Option<usize>,
) -> Result<Vec<EnrolledCourse>, ApiError> {
    let mut query = Query::new()
        .eq("user_id", user_id)
        .order_by_desc("enrolled_at");
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let enrollments: Vec<Enrollment> = db.list(query).await?;

    let course_ids: Vec<Uuid> = enrollments.iter().map(|e| e.course_id).collect();
    let courses: Vec<Course> = db.list(Query::new().is_in("id", &course_ids)).await?;
    let tracks: Vec<Track> = db
        .list(Query::new().is_in("id", courses.iter().map(|c| c.track_id)))
        .await?;
    let progress = course_progress(db, user_id, &course_ids).await?;

    let courses: HashMap<Uuid, Course> = courses.into_iter().map(|c| (c.id, c)).collect();
    let tracks: HashMap<Uuid, Track> = tracks.into_iter().map(|t| (t.id, t)).collect();

    Ok(enrollments
        .into_iter()
        .filter_map(|enrollment| {
            let course = courses.get(&enrollment.course_id)?;
            let track = tracks.get(&course.track_id);
            Some(EnrolledCourse {
                enrollment_id: enrollment.id,
                course_id: course.id,
                title: course.title.clone(),
                slug: course.slug.clone(),
                description: course.description.clone(),
                thumbnail_url: course.thumbnail_url.clone(),
                duration: course.duration.clone(),
                track_slug: track.map(|t| t.slug.clone()),
                track_title: track.map(|t| t.title.clone()),
                enrolled_at: enrollment.enrolled_at,
                completed: enrollment.completed_at.is_some(),
                progress_percent: progress.get(&course.id).copied().unwrap_or(0),
                href: format!("/app/cursos/{}", course.slug),
            })
        })
        .collect())
}

async fn track_summaries(db: Db<'_>, limit: Option<usize>) -> Result<Vec<TrackSummary>, ApiError> {
    let mut query = Query::new().order_by("order_index");
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let tracks: Vec<Track> = db.list(query).await?;
    let courses: Vec<Course> = db
        .list(Query::new().is_in("track_id", tracks.iter().map(|t| t.id)))
        .await?;
    let counts = count_by(&courses, |c| c.track_id);

    Ok(tracks
        .into_iter()
        .map(|t| TrackSummary {
            course_count: counts.get(&t.id).copied().unwrap_or(0),
            href: format!("/trilhas/{}", t.slug),
            id: t.id,
            title: t.title,
            slug: t.slug,
            description: t.description,
            color: t.color,
        })
        .collect())
}

pub async fn stats(db: Db<'_>, user_id: Uuid) -> Result<StudentStats, ApiError> {
    let (enrollments, certificates, lessons_completed) = futures::try_join!(
        db.count::<Enrollment>(Query::new().eq("user_id", user_id)),
        db.count::<Certificate>(Query::new().eq("user_id", user_id)),
        db.count::<LessonProgress>(
            Query::new()
                .eq("user_id", user_id)
                .eq("is_completed", true)
        ),
    )?;

    Ok(StudentStats {
        enrollments,
        certificates,
        lessons_completed,
    })
}

pub async fn dashboard(db: Db<'_>, user_id: Uuid) -> Result<StudentDashboard, ApiError> {
    let (profile, stats, recent_courses, featured_tracks) = futures::try_join!(
        profile(db, user_id),
        stats(db, user_id),
        enrolled_courses(db, user_id, Some(RECENT_ENROLLMENTS)),
        track_summaries(db, Some(FEATURED_TRACKS)),
    )?;

    Ok(StudentDashboard {
        first_name: util::first_name(
            profile.as_ref().and_then(|p| p.full_name.as_deref()),
            "Aluna",
        )
        .to_string(),
        stats,
        recent_courses,
        featured_tracks,
    })
}

pub async fn courses(db: Db<'_>, user_id: Uuid) -> Result<StudentCourses, ApiError> {
    Ok(StudentCourses {
        courses: enrolled_courses(db, user_id, None).await?,
    })
}

pub async fn tracks(db: Db<'_>) -> Result<StudentTracks, ApiError> {
    Ok(StudentTracks {
        tracks: track_summaries(db, None).await?,
    })
}

pub async fn certificates(db: Db<'_>, user_id: Uuid) -> Result<StudentCertificates, ApiError> {
    let certificates: Vec<Certificate> = db
        .list(
            Query::new()
                .eq("user_id", user_id)
                .order_by_desc("issued_at"),
        )
        .await?;

    let course_ids = certificates.iter().filter_map(|c| c.course_id);
    let track_ids = certificates.iter().filter_map(|c| c.track_id);
    let (courses, tracks) = futures::try_join!(
        db.list::<Course>(Query::new().is_in("id", course_ids)),
        db.list::<Track>(Query::new().is_in("id", track_ids)),
    )?;
    let titles: HashMap<Uuid, String> = courses
        .into_iter()
        .map(|c| (c.id, c.title))
        .chain(tracks.into_iter().map(|t| (t.id, t.title)))
        .collect();

    Ok(StudentCertificates {
        certificates: certificates
            .into_iter()
            .map(|c| CertificateItem {
                title: c
                    .course_id
                    .or(c.track_id)
                    .and_then(|id| titles.get(&id).cloned())
                    .unwrap_or_else(|| "Certificado".to_string()),
                id: c.id,
                certificate_number: c.certificate_number,
                issued_at: c.issued_at,
            })
            .collect(),
    })
}

pub fn community() -> Placeholder {
    Placeholder {
        title: "Comunidade",
        description: "Conecte-se com outras alunas",
        notice: "Em breve!",
    }
}
