//! Page view models.
//!
//! Each page function runs the queries its screen needs and returns a serializable view model.
//! Mutations return a [`Notice`] instead of failing, the way the screens show a toast.

pub mod admin;
pub mod application;
pub mod learning;
pub mod mentor;
pub mod public;
pub mod student;

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::api::cache::{QueryCache, QueryKey};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{DataApi, Db, Lesson, Module};
use uuid::Uuid;

/// Cache resource of the public catalog views (landing, track listing, track and course
/// detail). Every other page is rebuilt from source rows on each request.
pub const CATALOG: &str = "catalog";

/// Data access plus the view cache, for one request.
#[derive(Clone, Copy)]
pub struct PageCtx<'a> {
    pub db: Db<'a>,
    pub views: &'a QueryCache<Value>,
}

impl<'a> PageCtx<'a> {
    pub fn new(
        api: &'a dyn DataApi,
        bearer: Option<&'a str>,
        views: &'a QueryCache<Value>,
    ) -> Self {
        Self {
            db: Db::new(api, bearer),
            views,
        }
    }

    /// Serves a view from the cache, building and caching it on a miss.
    pub async fn cached<T, F>(&self, key: QueryKey, build: F) -> Result<Value, ApiError>
    where
        T: Serialize,
        F: Future<Output = Result<T, ApiError>>,
    {
        self.views
            .get_or_fetch(key, || async { Ok(serde_json::to_value(build.await?)?) })
            .await
    }

    pub fn invalidate(&self, resource: &str) {
        self.views.invalidate_resource(resource);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-style outcome of a form action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Error notice carrying the store's message after `prefix`.
    pub fn failed(prefix: &str, error: &ApiError) -> Self {
        warn!(error = %error, "{}", prefix.trim_end_matches([':', ' ']));
        Self::error(format!("{prefix}{}", error.user_message()))
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

/// Shown in place of a page whose entity does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub title: String,
    pub link_href: String,
    pub link_label: String,
}

impl EmptyState {
    pub fn new(title: &str, link_href: impl Into<String>, link_label: &str) -> Self {
        Self {
            title: title.to_string(),
            link_href: link_href.into(),
            link_label: link_label.to_string(),
        }
    }
}

/// A page that either found its entity or renders an empty state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound(EmptyState),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound(_) => None,
        }
    }
}

/// Screens that exist in navigation but have no content yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub title: &'static str,
    pub description: &'static str,
    pub notice: &'static str,
}

/// Counts rows per key, e.g. courses per track.
pub(crate) fn count_by<T, K: Eq + Hash>(
    rows: &[T],
    key: impl Fn(&T) -> K,
) -> HashMap<K, u64> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(key(row)).or_insert(0) += 1;
    }
    counts
}

/// Modules of a course in order, each with its lessons in order.
pub(crate) async fn course_outline(
    db: Db<'_>,
    course_id: Uuid,
    published_only: bool,
) -> Result<Vec<(Module, Vec<Lesson>)>, ApiError> {
    let modules: Vec<Module> = db
        .list(Query::new().eq("course_id", course_id).order_by("order_index"))
        .await?;

    let mut lesson_query = Query::new()
        .is_in("module_id", modules.iter().map(|m| m.id))
        .order_by("order_index");
    if published_only {
        lesson_query = lesson_query.eq("is_published", true);
    }
    let lessons: Vec<Lesson> = db.list(lesson_query).await?;

    Ok(modules
        .into_iter()
        .map(|module| {
            let own = lessons
                .iter()
                .filter(|l| l.module_id == module.id)
                .cloned()
                .collect();
            (module, own)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_serializes_with_status_tag() {
        #[derive(Serialize)]
        struct Found {
            title: &'static str,
        }

        let found = serde_json::to_value(Lookup::Found(Found { title: "Dados" })).unwrap();
        assert_eq!(found, json!({"status": "found", "title": "Dados"}));

        let missing: Lookup<Found> = Lookup::NotFound(EmptyState::new(
            "Trilha não encontrada",
            "/trilhas",
            "Voltar para trilhas",
        ));
        assert_eq!(
            serde_json::to_value(missing).unwrap()["status"],
            json!("not_found")
        );
    }

    #[test]
    fn test_failed_notice_keeps_store_message() {
        let err = ApiError::Status {
            status: 409,
            message: "duplicate key".into(),
            code: None,
        };
        let notice = Notice::failed("Erro ao criar trilha: ", &err);
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Erro ao criar trilha: duplicate key");
        assert!(!notice.is_success());
    }

    #[test]
    fn test_count_by() {
        let counts = count_by(&["a", "b", "a"], |s| *s);
        assert_eq!(counts["a"], 2);
        assert_eq!(counts["b"], 1);
    }
}
