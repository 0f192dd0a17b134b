use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{next_order_index, required_title, settle, Messages};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Course, Db, Lesson, LessonType, Module};
use crate::pages::{EmptyState, Lookup, Notice, PageCtx};
use crate::util;

const MESSAGES: Messages = Messages {
    noun: "aula",
    created: "Aula criada com sucesso!",
    updated: "Aula atualizada com sucesso!",
    deleted: "Aula excluída com sucesso!",
};


#[derive(Debug, Clone, Serialize)]
pub struct LessonEntry {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub type_label: &'static str,
}

impl From<Lesson> for LessonEntry {
    fn from(lesson: Lesson) -> Self {
        Self {
            type_label: lesson.lesson_type.label(),
            lesson,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonTypeOption {
    pub value: LessonType,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonList {
    pub module: Module,
    pub course: Course,
    pub lessons: Vec<LessonEntry>,
    pub lesson_types: Vec<LessonTypeOption>,
}

/// One row of the all-lessons index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedLesson {
    pub id: Uuid,
    pub title: String,
    pub type_label: &'static str,
    pub is_published: bool,
    pub module_title: Option<String>,
    pub course_title: Option<String>,
    pub manage_href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonIndex {
    pub lessons: Vec<IndexedLesson>,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonForm {
    #[serde(default)]
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
    #[serde(default = "default_published")]
    pub is_published: bool,
}

impl Default for LessonForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: None,
            video_url: None,
            video_transcript: None,
            duration: None,
            lesson_type: LessonType::default(),
            is_published: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct LessonRow {
    title: String,
    content: Option<String>,
    video_url: Option<String>,
    video_transcript: Option<String>,
    duration: Option<String>,
    lesson_type: LessonType,
    is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_index: Option<i32>,
}

impl LessonRow {
    fn from_form(form: LessonForm) -> Result<Self, Notice> {
        Ok(Self {
            title: required_title(&form.title)?,
            content: util::non_blank(form.content),
            video_url: util::non_blank(form.video_url),
            video_transcript: util::non_blank(form.video_transcript),
            duration: util::non_blank(form.duration),
            lesson_type: form.lesson_type,
            is_published: form.is_published,
            module_id: None,
            order_index: None,
        })
    }
}

fn lesson_types() -> Vec<LessonTypeOption> {
    LessonType::ALL
        .into_iter()
        .map(|value| LessonTypeOption {
            value,
            label: value.label(),
        })
        .collect()
}

/// Lessons of one module in order, with the module and its course.
pub async fn list(db: Db<'_>, module_id: Uuid) -> Result<Lookup<LessonList>, ApiError> {
    let module = db.first::<Module>(Query::new().eq("id", module_id)).await?;
    let course = match &module {
        Some(module) => db.first::<Course>(Query::new().eq("id", module.course_id)).await?,
        None => None,
    };
    let (Some(module), Some(course)) = (module, course) else {
        return Ok(Lookup::NotFound(EmptyState::new(
            "Módulo não encontrado",
            "/admin/cursos",
            "Voltar para cursos",
        )));
    };

    let lessons: Vec<Lesson> = db
        .list(Query::new().eq("module_id", module.id).order_by("order_index"))
        .await?;

    Ok(Lookup::Found(LessonList {
        module,
        course,
        lessons: lessons.into_iter().map(LessonEntry::from).collect(),
        lesson_types: lesson_types(),
    }))
}

/// Every lesson with the module and course it belongs to.
pub async fn index(db: Db<'_>) -> Result<LessonIndex, ApiError> {
    let (lessons, modules, courses) = futures::try_join!(
        db.list::<Lesson>(Query::new().order_by("module_id").order_by("order_index")),
        db.list::<Module>(Query::new()),
        db.list::<Course>(Query::new()),
    )?;
    let modules: HashMap<Uuid, Module> = modules.into_iter().map(|m| (m.id, m)).collect();
    let courses: HashMap<Uuid, String> = courses.into_iter().map(|c| (c.id, c.title)).collect();

    Ok(LessonIndex {
        lessons: lessons
            .into_iter()
            .map(|l| {
                let module = modules.get(&l.module_id);
                IndexedLesson {
                    type_label: l.lesson_type.label(),
                    module_title: module.map(|m| m.title.clone()),
                    course_title: module.and_then(|m| courses.get(&m.course_id).cloned()),
                    manage_href: format!("/admin/modulos/{}/aulas", l.module_id),
                    id: l.id,
                    title: l.title,
                    is_published: l.is_published,
                }
            })
            .collect(),
    })
}

async fn create(db: Db<'_>, module_id: Uuid, mut row: LessonRow) -> Result<(), ApiError> {
    let count = db
        .count::<Lesson>(Query::new().eq("module_id", module_id))
        .await?;
    row.module_id = Some(module_id);
    row.order_index = Some(next_order_index(count));
    db.insert::<Lesson>(&row).await
}

pub async fn create_in(ctx: PageCtx<'_>, module_id: Uuid, form: LessonForm) -> Notice {
    let notice = match LessonRow::from_form(form) {
        Ok(row) => MESSAGES.created(create(ctx.db, module_id, row).await),
        Err(notice) => return notice,
    };
    settle(&ctx, notice)
}

pub async fn update(ctx: PageCtx<'_>, id: Uuid, form: LessonForm) -> Notice {
    let notice = match LessonRow::from_form(form) {
        Ok(row) => MESSAGES.updated(ctx.db.update::<Lesson>(Query::new().eq("id", id), &row).await),
        Err(notice) => return notice,
    };
    settle(&ctx, notice)
}

pub async fn delete(ctx: PageCtx<'_>, id: Uuid) -> Notice {
    let notice = MESSAGES.deleted(ctx.db.delete::<Lesson>(Query::new().eq("id", id)).await);
    settle(&ctx, notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cache::QueryCache;
    use crate::db::memory::MemoryApi;
    use crate::db::Table;
    use serde_json::json;
    use std::time::Duration;

    fn module(store: &MemoryApi) -> Uuid {
        let track = store.seed(Table::Tracks, json!({"title": "Web", "slug": "web"}));
        let course = store.seed(
            Table::Courses,
            json!({"title": "HTML", "slug": "html", "track_id": track}),
        );
        store.seed(Table::Modules, json!({"title": "Básico", "course_id": course}))
    }

    #[tokio::test]
    async fn test_create_defaults_and_order() {
        let store = MemoryApi::new();
        let views = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);
        let m = module(&store);

        let first = LessonForm {
            title: "Tags".into(),
            video_url: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(create_in(ctx, m, first).await.message, "Aula criada com sucesso!");
        let second = LessonForm {
            title: "Exercício".into(),
            lesson_type: LessonType::Practice,
            ..Default::default()
        };
        create_in(ctx, m, second).await;

        let view = list(ctx.db, m).await.unwrap().found().unwrap();
        assert_eq!(view.course.title, "HTML");
        assert_eq!(view.lessons.len(), 2);
        assert_eq!(view.lessons[0].lesson.video_url, None);
        assert_eq!(view.lessons[0].lesson.lesson_type, LessonType::Video);
        assert!(view.lessons[0].lesson.is_published);
        assert_eq!(view.lessons[1].lesson.order_index, 2);
        assert_eq!(view.lessons[1].type_label, "Prática");

        let labels: Vec<_> = view.lesson_types.iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["Vídeo", "Leitura", "Prática", "Quiz"]);
    }

    #[test]
    fn test_form_defaults_when_fields_are_missing() {
        let form: LessonForm = serde_json::from_value(json!({"title": "Intro"})).unwrap();
        assert!(form.is_published);
        assert_eq!(form.lesson_type, LessonType::Video);
    }

    #[tokio::test]
    async fn test_index_and_missing_module() {
        let store = MemoryApi::new();
        let m = module(&store);
        store.seed(
            Table::Lessons,
            json!({"title": "Intro", "module_id": m, "lesson_type": "quiz"}),
        );
        let db = Db::new(&store, Some("t"));

        let index = index(db).await.unwrap();
        assert_eq!(index.lessons[0].course_title.as_deref(), Some("HTML"));
        assert_eq!(index.lessons[0].type_label, "Quiz");
        assert_eq!(index.lessons[0].manage_href, format!("/admin/modulos/{m}/aulas"));

        match list(db, Uuid::new_v4()).await.unwrap() {
            Lookup::NotFound(empty) => assert_eq!(empty.title, "Módulo não encontrado"),
            Lookup::Found(_) => panic!("unexpected module"),
        }
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryApi::new();
        let views = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);
        let m = module(&store);
        let lesson = store.seed(Table::Lessons, json!({"title": "Intro", "module_id": m}));

        let form = LessonForm {
            title: "Introdução".into(),
            lesson_type: LessonType::Text,
            content: Some("Conteúdo".into()),
            ..Default::default()
        };
        assert_eq!(update(ctx, lesson, form).await.message, "Aula atualizada com sucesso!");
        assert_eq!(store.rows(Table::Lessons)[0]["lesson_type"], json!("text"));

        assert_eq!(delete(ctx, lesson).await.message, "Aula excluída com sucesso!");
        assert!(store.rows(Table::Lessons).is_empty());
    }
}
