//! Public pages: landing, track catalog, track and course detail, about and login.

use serde::Serialize;
use uuid::Uuid;

use super::{count_by, course_outline, EmptyState, Lookup};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Course, Db, Lesson, LessonType, Module, Track};

const FEATURED_TRACKS: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct TrackCard {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub duration: Option<String>,
    pub course_count: u64,
}

impl TrackCard {
    fn new(track: Track, course_count: u64) -> Self {
        Self {
            id: track.id,
            title: track.title,
            slug: track.slug,
            description: track.description,
            color: track.color,
            icon: track.icon,
            duration: track.duration,
            course_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LandingPage {
    pub featured_tracks: Vec<TrackCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackCatalog {
    pub tracks: Vec<TrackCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseCard {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Where the card links to.
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackDetail {
    pub track: Track,
    pub courses: Vec<CourseCard>,
    pub total_courses: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonItem {
    pub id: Uuid,
    pub title: String,
    pub lesson_type: LessonType,
    pub type_label: &'static str,
    pub duration: Option<String>,
}

impl From<&Lesson> for LessonItem {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            lesson_type: lesson.lesson_type,
            type_label: lesson.lesson_type.label(),
            duration: lesson.duration.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutline {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub lessons: Vec<LessonItem>,
}

impl ModuleOutline {
    fn new(module: Module, lessons: &[Lesson]) -> Self {
        Self {
            id: module.id,
            title: module.title,
            description: module.description,
            lessons: lessons.iter().map(LessonItem::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    pub track_title: String,
    pub track_slug: String,
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
    pub lesson_count: usize,
    /// Where enrolled students continue.
    pub start_href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutPage {
    pub title: &'static str,
    pub mission: &'static str,
    pub values: [&'static str; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginPage {
    pub sign_in_action: &'static str,
    pub sign_up_action: &'static str,
}

/// Published tracks by `order_index`, each with its number of published courses.
async fn published_track_cards(
    db: Db<'_>,
    limit: Option<usize>,
) -> Result<Vec<TrackCard>, ApiError> {
    let mut query = Query::new().eq("is_published", true).order_by("order_index");
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let tracks: Vec<Track> = db.list(query).await?;

    let courses: Vec<Course> = db
        .list(
            Query::new()
                .select("id,title,slug,track_id,is_published,order_index,created_at,updated_at")
                .eq("is_published", true)
                .is_in("track_id", tracks.iter().map(|t| t.id)),
        )
        .await?;
    let counts = count_by(&courses, |c| c.track_id);

    Ok(tracks
        .into_iter()
        .map(|track| {
            let count = counts.get(&track.id).copied().unwrap_or(0);
            TrackCard::new(track, count)
        })
        .collect())
}

pub async fn landing(db: Db<'_>) -> Result<LandingPage, ApiError> {
    Ok(LandingPage {
        featured_tracks: published_track_cards(db, Some(FEATURED_TRACKS)).await?,
    })
}

pub async fn track_catalog(db: Db<'_>) -> Result<TrackCatalog, ApiError> {
    Ok(TrackCatalog {
        tracks: published_track_cards(db, None).await?,
    })
}

pub async fn track_detail(db: Db<'_>, track_slug: &str) -> Result<Lookup<TrackDetail>, ApiError> {
    let Some(track) = db.first::<Track>(Query::new().eq("slug", track_slug)).await? else {
        return Ok(Lookup::NotFound(EmptyState::new(
            "Trilha não encontrada",
            "/trilhas",
            "Voltar para trilhas",
        )));
    };

    let courses: Vec<Course> = db
        .list(Query::new().eq("track_id", track.id).order_by("order_index"))
        .await?;
    let courses: Vec<CourseCard> = courses
        .into_iter()
        .map(|c| CourseCard {
            href: format!("/trilhas/{}/cursos/{}", track.slug, c.slug),
            id: c.id,
            title: c.title,
            slug: c.slug,
            description: c.description,
            duration: c.duration,
            thumbnail_url: c.thumbnail_url,
        })
        .collect();

    Ok(Lookup::Found(TrackDetail {
        total_courses: courses.len(),
        courses,
        track,
    }))
}

pub async fn course_detail(
    db: Db<'_>,
    track_slug: &str,
    course_slug: &str,
) -> Result<Lookup<CourseDetail>, ApiError> {
    let track = db.first::<Track>(Query::new().eq("slug", track_slug)).await?;
    let course = match &track {
        Some(track) => {
            db.first::<Course>(
                Query::new()
                    .eq("slug", course_slug)
                    .eq("track_id", track.id),
            )
            .await?
        }
        None => None,
    };

    let (Some(track), Some(course)) = (track, course) else {
        return Ok(Lookup::NotFound(EmptyState::new(
            "Curso não encontrado",
            format!("/trilhas/{track_slug}"),
            "Voltar para trilha",
        )));
    };

    let outline = course_outline(db, course.id, true).await?;
    let lesson_count = outline.iter().map(|(_, lessons)| lessons.len()).sum();

    Ok(Lookup::Found(CourseDetail {
        start_href: format!("/app/cursos/{}", course.slug),
        track_title: track.title,
        track_slug: track.slug,
        modules: outline
            .into_iter()
            .map(|(module, lessons)| ModuleOutline::new(module, &lessons))
            .collect(),
        lesson_count,
        course,
    }))
}

pub fn about() -> AboutPage {
    AboutPage {
        title: "Sobre a Okan",
        mission: "Formar mulheres para carreiras em tecnologia com trilhas práticas, mentoria e \
                  comunidade.",
        values: ["Aprendizado prático", "Mentoria próxima", "Comunidade acolhedora"],
    }
}

pub fn login() -> LoginPage {
    LoginPage {
        sign_in_action: "/login",
        sign_up_action: "/cadastro",
    }
}
