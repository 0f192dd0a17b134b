use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{next_order_index, required_title, settle, Messages};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Course, Db, Lesson, Module};
use crate::pages::{course_outline, EmptyState, Lookup, Notice, PageCtx};
use crate::util;

const MESSAGES: Messages = Messages {
    noun: "módulo",
    created: "Módulo criado com sucesso!",
    updated: "Módulo atualizado com sucesso!",
    deleted: "Módulo excluído com sucesso!",
};


#[derive(Debug, Clone, Serialize)]
pub struct ModuleEntry {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<Lesson>,
    pub lessons_href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleList {
    pub course: Course,
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModuleRow {
    title: String,
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    course_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_index: Option<i32>,
}

impl ModuleRow {
    fn from_form(form: ModuleForm) -> Result<Self, Notice> {
        Ok(Self {
            title: required_title(&form.title)?,
            description: util::non_blank(form.description),
            course_id: None,
            order_index: None,
        })
    }
}

/// Modules of a course in order, each with all of its lessons.
pub async fn list(db: Db<'_>, course_id: Uuid) -> Result<Lookup<ModuleList>, ApiError> {
    let Some(course) = db.first::<Course>(Query::new().eq("id", course_id)).await? else {
        return Ok(Lookup::NotFound(EmptyState::new(
            "Curso não encontrado",
            "/admin/cursos",
            "Voltar para cursos",
        )));
    };

    let modules = course_outline(db, course.id, false)
        .await?
        .into_iter()
        .map(|(module, lessons)| ModuleEntry {
            lessons_href: format!("/admin/modulos/{}/aulas", module.id),
            module,
            lessons,
        })
        .collect();

    Ok(Lookup::Found(ModuleList { course, modules }))
}

async fn create(db: Db<'_>, course_id: Uuid, mut row: ModuleRow) -> Result<(), ApiError> {
    let count = db
        .count::<Module>(Query::new().eq("course_id", course_id))
        .await?;
    row.course_id = Some(course_id);
    row.order_index = Some(next_order_index(count));
    db.insert::<Module>(&row).await
}

pub async fn create_in(ctx: PageCtx<'_>, course_id: Uuid, form: ModuleForm) -> Notice {
    let notice = match ModuleRow::from_form(form) {
        Ok(row) => MESSAGES.created(create(ctx.db, course_id, row).await),
        Err(notice) => return notice,
    };
    settle(&ctx, notice)
}

pub async fn update(ctx: PageCtx<'_>, id: Uuid, form: ModuleForm) -> Notice {
    let notice = match ModuleRow::from_form(form) {
        Ok(row) => MESSAGES.updated(ctx.db.update::<Module>(Query::new().eq("id", id), &row).await),
        Err(notice) => return notice,
    };
    settle(&ctx, notice)
}

pub async fn delete(ctx: PageCtx<'_>, id: Uuid) -> Notice {
    let notice = MESSAGES.deleted(ctx.db.delete::<Module>(Query::new().eq("id", id)).await);
    settle(&ctx, notice)
}
