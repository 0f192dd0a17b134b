//! Course view and lesson player for signed-in students, with their progress actions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{course_outline, EmptyState, Lookup, Notice};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Course, Db, Enrollment, Lesson, LessonNote, LessonProgress, LessonType, Module};
use crate::util;

const LESSON_NOT_FOUND: &str = "Aula não encontrada";

#[derive(Debug, Clone, Serialize)]
pub struct LessonStatus {
    pub id: Uuid,
    pub title: String,
    pub lesson_type: LessonType,
    pub type_label: &'static str,
    pub duration: Option<String>,
    pub completed: bool,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleProgress {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub lessons: Vec<LessonStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonLink {
    pub id: Uuid,
    pub title: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub course: Course,
    pub enrolled: bool,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub modules: Vec<ModuleProgress>,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub progress_percent: u32,
    /// First lesson not yet completed, in course order.
    pub next_lesson: Option<LessonLink>,
    pub enroll_action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonPlayer {
    pub course_title: String,
    pub course_slug: String,
    pub module_title: String,
    pub lesson: Lesson,
    pub type_label: &'static str,
    /// 1-based position across the whole course.
    pub position: usize,
    pub total_lessons: usize,
    pub previous: Option<LessonLink>,
    pub next: Option<LessonLink>,
    pub completed: bool,
    pub notes: String,
    pub progress_percent: u32,
    pub modules: Vec<ModuleProgress>,
    pub complete_action: String,
    pub notes_action: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotesForm {
    #[serde(default)]
    pub content: String,
}

fn lesson_href(course_slug: &str, lesson_id: Uuid) -> String {
    format!("/app/cursos/{course_slug}/aula/{lesson_id}")
}

fn link(course_slug: &str, lesson: &Lesson) -> LessonLink {
    LessonLink {
        id: lesson.id,
        title: lesson.title.clone(),
        href: lesson_href(course_slug, lesson.id),
    }
}

/// A course outline with the user's completed lesson ids.
struct Progressed {
    outline: Vec<(Module, Vec<Lesson>)>,
    completed: HashSet<Uuid>,
}

impl Progressed {
    async fn load(db: Db<'_>, user_id: Uuid, course_id: Uuid) -> Result<Self, ApiError> {
        let outline = course_outline(db, course_id, true).await?;
        let rows: Vec<LessonProgress> = db
            .list(
                Query::new()
                    .eq("user_id", user_id)
                    .eq("is_completed", true)
                    .is_in(
                        "lesson_id",
                        outline.iter().flat_map(|(_, lessons)| lessons.iter().map(|l| l.id)),
                    ),
            )
            .await?;

        Ok(Self {
            outline,
            completed: rows.into_iter().map(|p| p.lesson_id).collect(),
        })
    }

    fn lessons(&self) -> impl Iterator<Item = (&Module, &Lesson)> + '_ {
        self.outline
            .iter()
            .flat_map(|(module, lessons)| lessons.iter().map(move |l| (module, l)))
    }

    fn total(&self) -> usize {
        self.lessons().count()
    }

    fn completed_count(&self) -> usize {
        self.lessons()
            .filter(|(_, l)| self.completed.contains(&l.id))
            .count()
    }

    fn percent(&self) -> u32 {
        util::percent(self.completed_count() as u64, self.total() as u64)
    }

    fn modules(&self, course_slug: &str) -> Vec<ModuleProgress> {
        self.outline
            .iter()
            .map(|(module, lessons)| ModuleProgress {
                id: module.id,
                title: module.title.clone(),
                description: module.description.clone(),
                lessons: lessons
                    .iter()
                    .map(|l| LessonStatus {
                        id: l.id,
                        title: l.title.clone(),
                        lesson_type: l.lesson_type,
                        type_label: l.lesson_type.label(),
                        duration: l.duration.clone(),
                        completed: self.completed.contains(&l.id),
                        href: lesson_href(course_slug, l.id),
                    })
                    .collect(),
            })
            .collect()
    }
}

async fn course_by_slug(db: Db<'_>, slug: &str) -> Result<Option<Course>, ApiError> {
    db.first(Query::new().eq("slug", slug)).await
}

async fn enrollment(
    db: Db<'_>,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Enrollment>, ApiError> {
    db.first(
        Query::new()
            .eq("user_id", user_id)
            .eq("course_id", course_id),
    )
    .await
}

pub async fn course_view(
    db: Db<'_>,
    user_id: Uuid,
    course_slug: &str,
) -> Result<Lookup<CourseView>, ApiError> {
    let Some(course) = course_by_slug(db, course_slug).await? else {
        return Ok(Lookup::NotFound(EmptyState::new(
            "Curso não encontrado",
            "/app/cursos",
            "Voltar aos cursos",
        )));
    };

    let (enrollment, progress) = futures::try_join!(
        enrollment(db, user_id, course.id),
        Progressed::load(db, user_id, course.id),
    )?;

    let next_lesson = progress
        .lessons()
        .find(|(_, l)| !progress.completed.contains(&l.id))
        .map(|(_, l)| link(&course.slug, l));

    Ok(Lookup::Found(CourseView {
        enrolled: enrollment.is_some(),
        enrolled_at: enrollment.map(|e| e.enrolled_at),
        modules: progress.modules(&course.slug),
        total_lessons: progress.total(),
        completed_lessons: progress.completed_count(),
        progress_percent: progress.percent(),
        next_lesson,
        enroll_action: format!("/app/cursos/{}/inscricao", course.slug),
        course,
    }))
}

async fn try_enroll(db: Db<'_>, user_id: Uuid, course_slug: &str) -> Result<(), ApiError> {
    let course: Course = db.one(Query::new().eq("slug", course_slug)).await?;
    if enrollment(db, user_id, course.id).await?.is_some() {
        return Ok(());
    }

    #[derive(Serialize)]
    struct NewEnrollment {
        user_id: Uuid,
        course_id: Uuid,
    }

    db.insert::<Enrollment>(&NewEnrollment {
        user_id,
        course_id: course.id,
    })
    .await
}

/// Enrolls the user; enrolling twice is a no-op.
pub async fn enroll(db: Db<'_>, user_id: Uuid, course_slug: &str) -> Notice {
    match try_enroll(db, user_id, course_slug).await {
        Ok(()) => Notice::success("Inscrição realizada com sucesso!"),
        Err(e) => {
            tracing::warn!(user = %user_id, course = course_slug, error = %e, "Enrollment failed");
            Notice::error("Erro ao realizar inscrição")
        }
    }
}

pub async fn lesson_player(
    db: Db<'_>,
    user_id: Uuid,
    course_slug: &str,
    lesson_id: Uuid,
) -> Result<Lookup<LessonPlayer>, ApiError> {
    let not_found = || {
        Lookup::NotFound(EmptyState::new(
            LESSON_NOT_FOUND,
            format!("/app/cursos/{course_slug}"),
            "Voltar ao curso",
        ))
    };

    let Some(course) = course_by_slug(db, course_slug).await? else {
        return Ok(not_found());
    };

    let progress = Progressed::load(db, user_id, course.id).await?;
    let sequence: Vec<(&Module, &Lesson)> = progress.lessons().collect();
    let Some(index) = sequence.iter().position(|(_, l)| l.id == lesson_id) else {
        return Ok(not_found());
    };

    let note: Option<LessonNote> = db
        .first(
            Query::new()
                .eq("user_id", user_id)
                .eq("lesson_id", lesson_id),
        )
        .await?;

    let (module, lesson) = sequence[index];
    let previous = index
        .checked_sub(1)
        .map(|i| link(&course.slug, sequence[i].1));
    let next = sequence.get(index + 1).map(|(_, l)| link(&course.slug, l));

    Ok(Lookup::Found(LessonPlayer {
        course_title: course.title.clone(),
        course_slug: course.slug.clone(),
        module_title: module.title.clone(),
        type_label: lesson.lesson_type.label(),
        position: index + 1,
        total_lessons: sequence.len(),
        previous,
        next,
        completed: progress.completed.contains(&lesson.id),
        notes: note.map(|n| n.content).unwrap_or_default(),
        progress_percent: progress.percent(),
        modules: progress.modules(&course.slug),
        complete_action: format!("{}/concluir", lesson_href(&course.slug, lesson.id)),
        notes_action: format!("{}/anotacoes", lesson_href(&course.slug, lesson.id)),
        lesson: lesson.clone(),
    }))
}

async fn try_mark_complete(db: Db<'_>, user_id: Uuid, lesson_id: Uuid) -> Result<(), ApiError> {
    #[derive(Serialize)]
    struct Completion {
        user_id: Uuid,
        lesson_id: Uuid,
        is_completed: bool,
        progress_percent: i32,
        completed_at: DateTime<Utc>,
    }

    let completion = Completion {
        user_id,
        lesson_id,
        is_completed: true,
        progress_percent: 100,
        completed_at: Utc::now(),
    };
    let mine = Query::new()
        .eq("user_id", user_id)
        .eq("lesson_id", lesson_id);

    match db.first::<LessonProgress>(mine).await? {
        Some(existing) => {
            db.update::<LessonProgress>(Query::new().eq("id", existing.id), &completion)
                .await
        }
        None => db.insert::<LessonProgress>(&completion).await,
    }
}

/// Whether `lesson_id` is a published lesson of the course at `course_slug`.
async fn lesson_in_course(
    db: Db<'_>,
    course_slug: &str,
    lesson_id: Uuid,
) -> Result<bool, ApiError> {
    let Some(course) = course_by_slug(db, course_slug).await? else {
        return Ok(false);
    };
    let outline = course_outline(db, course.id, true).await?;
    Ok(outline
        .iter()
        .flat_map(|(_, lessons)| lessons)
        .any(|lesson| lesson.id == lesson_id))
}

pub async fn mark_complete(
    db: Db<'_>,
    user_id: Uuid,
    course_slug: &str,
    lesson_id: Uuid,
) -> Notice {
    let result = match lesson_in_course(db, course_slug, lesson_id).await {
        Ok(true) => try_mark_complete(db, user_id, lesson_id).await,
        Ok(false) => return Notice::error(LESSON_NOT_FOUND),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Notice::success("Aula concluída!"),
        Err(e) => Notice::failed("Erro ao concluir aula: ", &e),
    }
}

async fn try_save_notes(
    db: Db<'_>,
    user_id: Uuid,
    lesson_id: Uuid,
    content: &str,
) -> Result<(), ApiError> {
    #[derive(Serialize)]
    struct NoteRow<'a> {
        user_id: Uuid,
        lesson_id: Uuid,
        content: &'a str,
    }

    let row = NoteRow {
        user_id,
        lesson_id,
        content,
    };
    let existing: Option<LessonNote> = db
        .first(
            Query::new()
                .eq("user_id", user_id)
                .eq("lesson_id", lesson_id),
        )
        .await?;

    match existing {
        Some(note) => db.update::<LessonNote>(Query::new().eq("id", note.id), &row).await,
        None => db.insert::<LessonNote>(&row).await,
    }
}

pub async fn save_notes(
    db: Db<'_>,
    user_id: Uuid,
    course_slug: &str,
    lesson_id: Uuid,
    form: &NotesForm,
) -> Notice {
    let result = match lesson_in_course(db, course_slug, lesson_id).await {
        Ok(true) => try_save_notes(db, user_id, lesson_id, &form.content).await,
        Ok(false) => return Notice::error(LESSON_NOT_FOUND),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Notice::success("Anotações salvas!"),
        Err(e) => Notice::failed("Erro ao salvar anotações: ", &e),
    }
}
