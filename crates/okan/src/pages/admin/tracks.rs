use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{next_order_index, settle, titled, Messages};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Db, Track};
use crate::pages::{Notice, PageCtx};
use crate::util;

const MESSAGES: Messages = Messages {
    noun: "trilha",
    created: "Trilha criada com sucesso!",
    updated: "Trilha atualizada com sucesso!",
    deleted: "Trilha excluída com sucesso!",
};


#[derive(Debug, Clone, Serialize)]
pub struct TrackList {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Serialize)]
struct TrackRow {
    title: String,
    slug: String,
    description: Option<String>,
    color: String,
    icon: Option<String>,
    duration: Option<String>,
    is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_index: Option<i32>,
}

impl TrackRow {
    fn from_form(form: TrackForm) -> Result<Self, Notice> {
        let (title, slug) = titled(&form.title, form.slug)?;
        Ok(Self {
            title,
            slug,
            description: util::non_blank(form.description),
            color: util::non_blank(form.color).unwrap_or_else(|| "coral".to_string()),
            icon: util::non_blank(form.icon),
            duration: util::non_blank(form.duration),
            is_published: form.is_published,
            order_index: None,
        })
    }
}

pub async fn list(db: Db<'_>) -> Result<TrackList, ApiError> {
    Ok(TrackList {
        tracks: db.list(Query::new().order_by("order_index")).await?,
    })
}

async fn create(db: Db<'_>, mut row: TrackRow) -> Result<(), ApiError> {
    let count = db.count::<Track>(Query::new()).await?;
    row.order_index = Some(next_order_index(count));
    db.insert::<Track>(&row).await
}

/// Creates a track, or updates track `id` when given.
pub async fn save(ctx: PageCtx<'_>, id: Option<Uuid>, form: TrackForm) -> Notice {
    let row = match TrackRow::from_form(form) {
        Ok(row) => row,
        Err(notice) => return notice,
    };

    let notice = match id {
        None => MESSAGES.created(create(ctx.db, row).await),
        Some(id) => MESSAGES.updated(ctx.db.update::<Track>(Query::new().eq("id", id), &row).await),
    };
    settle(&ctx, notice)
}

pub async fn delete(ctx: PageCtx<'_>, id: Uuid) -> Notice {
    let notice = MESSAGES.deleted(ctx.db.delete::<Track>(Query::new().eq("id", id)).await);
    settle(&ctx, notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cache::{QueryCache, QueryKey};
    use crate::db::memory::MemoryApi;
    use crate::db::Table;
    use crate::pages::CATALOG;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn form(title: &str) -> TrackForm {
        TrackForm {
            title: title.to_string(),
            description: Some("   ".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_appends_and_defaults() {
        let store = MemoryApi::new();
        let views: QueryCache<Value> = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);
        store.seed(Table::Tracks, json!({"title": "Web", "slug": "web", "order_index": 1}));
        views.insert(QueryKey::global(CATALOG), json!({}));

        let notice = save(ctx, None, form("Ciência de Dados")).await;
        assert_eq!(notice.message, "Trilha criada com sucesso!");
        assert!(views.is_empty());

        let listed = list(ctx.db).await.unwrap();
        let created = &listed.tracks[1];
        assert_eq!(created.slug, "ciencia-de-dados");
        assert_eq!(created.order_index, 2);
        assert_eq!(created.color, "coral");
        assert_eq!(created.description, None);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryApi::new();
        let views = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);
        let id = store.seed(Table::Tracks, json!({"title": "Web", "slug": "web"}));

        let notice = save(
            ctx,
            Some(id),
            TrackForm {
                slug: Some("web-moderna".into()),
                color: Some("teal".into()),
                ..form("Web Moderna")
            },
        )
        .await;
        assert_eq!(notice.message, "Trilha atualizada com sucesso!");
        let rows = store.rows(Table::Tracks);
        assert_eq!(rows[0]["slug"], json!("web-moderna"));
        assert_eq!(rows[0]["color"], json!("teal"));

        assert_eq!(delete(ctx, id).await.message, "Trilha excluída com sucesso!");
        assert!(store.rows(Table::Tracks).is_empty());
    }

    #[tokio::test]
    async fn test_rejections() {
        let store = MemoryApi::new();
        let views = QueryCache::new(Duration::from_secs(300));
        let ctx = PageCtx::new(&store, Some("t"), &views);
        store.seed(Table::Tracks, json!({"title": "Web", "slug": "web"}));
        views.insert(QueryKey::new(CATALOG, "tracks"), json!([]));

        assert_eq!(save(ctx, None, form("")).await.message, "Preencha o título");

        let duplicate = save(ctx, None, form("Web")).await;
        assert!(!duplicate.is_success());
        assert!(duplicate.message.starts_with("Erro ao criar trilha: "));
        assert_eq!(views.len(), 1);
    }
}
