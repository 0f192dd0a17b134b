use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{next_order_index, settle, titled, Messages};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Course, Db, Track};
use crate::pages::{Notice, PageCtx};
use crate::util;

const MESSAGES: Messages = Messages {
    noun: "curso",
    created: "Curso criado com sucesso!",
    updated: "Curso atualizado com sucesso!",
    deleted: "Curso excluído com sucesso!",
};


#[derive(Debug, Clone, Serialize)]
pub struct CourseEntry {
    #[serde(flatten)]
    pub course: Course,
    pub track_title: Option<String>,
    pub modules_href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackOption {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseList {
    pub courses: Vec<CourseEntry>,
    /// Track selector for the course form, by title.
    pub track_options: Vec<TrackOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub track_id: Option<Uuid>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Serialize)]
struct CourseRow {
    title: String,
    slug: String,
    description: Option<String>,
    duration: Option<String>,
    thumbnail_url: Option<String>,
    track_id: Uuid,
    is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_index: Option<i32>,
}

impl CourseRow {
    fn from_form(form: CourseForm) -> Result<Self, Notice> {
        let (title, slug) = titled(&form.title, form.slug)?;
        let track_id = form
            .track_id
            .ok_or_else(|| Notice::error("Selecione uma trilha"))?;
        Ok(Self {
            title,
            slug,
            description: util::non_blank(form.description),
            duration: util::non_blank(form.duration),
            thumbnail_url: util::non_blank(form.thumbnail_url),
            track_id,
            is_published: form.is_published,
            order_index: None,
        })
    }
}

pub async fn list(db: Db<'_>) -> Result<CourseList, ApiError> {
    let (courses, tracks) = futures::try_join!(
        db.list::<Course>(Query::new().order_by("order_index")),
        db.list::<Track>(Query::new().order_by("title")),
    )?;
    let titles: HashMap<Uuid, &str> = tracks.iter().map(|t| (t.id, t.title.as_str())).collect();

    let courses = courses
        .into_iter()
        .map(|course| CourseEntry {
            track_title: titles.get(&course.track_id).map(|t| t.to_string()),
            modules_href: format!("/admin/cursos/{}/modulos", course.id),
            course,
        })
        .collect();

    Ok(CourseList {
        courses,
        track_options: tracks
            .into_iter()
            .map(|t| TrackOption {
                id: t.id,
                title: t.title,
            })
            .collect(),
    })
}

async fn create(db: Db<'_>, mut row: CourseRow) -> Result<(), ApiError> {
    let count = db.count::<Course>(Query::new()).await?;
    row.order_index = Some(next_order_index(count));
    db.insert::<Course>(&row).await
}

pub async fn save(ctx: PageCtx<'_>, id: Option<Uuid>, form: CourseForm) -> Notice {
    let row = match CourseRow::from_form(form) {
        Ok(row) => row,
        Err(notice) => return notice,
    };

    let notice = match id {
        None => MESSAGES.created(create(ctx.db, row).await),
        Some(id) => {
            let updated = ctx.db.update::<Course>(Query::new().eq("id", id), &row).await;
            MESSAGES.updated(updated)
        }
    };
    settle(&ctx, notice)
}

/// Deletes the course row only; its modules and lessons are left to the store.
pub async fn delete(ctx: PageCtx<'_>, id: Uuid) -> Notice {
    let notice = MESSAGES.deleted(ctx.db.delete::<Course>(Query::new().eq("id", id)).await);
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

    #[tokio::test]
    async fn test_list_joins_track_titles() {
        let store = MemoryApi::new();
        let web = store.seed(Table::Tracks, json!({"title": "Web", "slug": "web"}));
        store.seed(Table::Tracks, json!({"title": "Dados", "slug": "dados"}));
        store.seed(Table::Courses, json!({"title": "HTML", "slug": "html", "track_id": web}));

        let view = list(Db::new(&store, Some("t"))).await.unwrap();
        assert_eq!(view.courses[0].track_title.as_deref(), Some("Web"));
        let options: Vec<_> = view.track_options.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(options, vec!["Dados", "Web"]);

        let json = serde_json::to_value(&view.courses[0]).unwrap();
        assert_eq!(json["slug"], json!("html"));
        assert_eq!(json["track_title"], json!("Web"));
    }

    #[tokio::test]
    async fn test_save_requires_track() {
        let store = MemoryApi::new();
        let views = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);

        let notice = save(
            ctx,
            None,
            CourseForm {
                title: "HTML".into(),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(notice.message, "Selecione uma trilha");
        assert!(store.rows(Table::Courses).is_empty());
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let store = MemoryApi::new();
        let views = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);
        let web = store.seed(Table::Tracks, json!({"title": "Web", "slug": "web"}));

        let form = CourseForm {
            title: "Lógica de Programação".into(),
            track_id: Some(web),
            thumbnail_url: Some("".into()),
            ..Default::default()
        };
        assert_eq!(save(ctx, None, form.clone()).await.message, "Curso criado com sucesso!");

        let rows = store.rows(Table::Courses);
        assert_eq!(rows[0]["slug"], json!("logica-de-programacao"));
        assert_eq!(rows[0]["order_index"], json!(1));
        assert_eq!(rows[0]["thumbnail_url"], json!(null));

        let id: Uuid = serde_json::from_value(rows[0]["id"].clone()).unwrap();
        let renamed = CourseForm {
            title: "Lógica".into(),
            ..form
        };
        assert_eq!(save(ctx, Some(id), renamed).await.message, "Curso atualizado com sucesso!");
        assert_eq!(store.rows(Table::Courses)[0]["slug"], json!("logica"));

        assert_eq!(delete(ctx, id).await.message, "Curso excluído com sucesso!");
    }
}
