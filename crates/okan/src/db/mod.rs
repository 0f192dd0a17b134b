//! Table access for the learning platform.
//!
//! Everything the pages read or write goes through [`DataApi`], implemented by the hosted
//! client in production and by an in-memory store in tests. [`Db`] wraps it with typed rows.

#[cfg(test)]
pub mod memory;
mod types;

pub use types::*;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tracks,
    Courses,
    Modules,
    Lessons,
    Enrollments,
    LessonProgress,
    LessonNotes,
    Certificates,
    Discussions,
    DiscussionReplies,
    UserRoles,
    Profiles,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Tracks => "tracks",
            Table::Courses => "courses",
            Table::Modules => "modules",
            Table::Lessons => "lessons",
            Table::Enrollments => "enrollments",
            Table::LessonProgress => "lesson_progress",
            Table::LessonNotes => "lesson_notes",
            Table::Certificates => "certificates",
            Table::Discussions => "discussions",
            Table::DiscussionReplies => "discussion_replies",
            Table::UserRoles => "user_roles",
            Table::Profiles => "profiles",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Row-level operations against the hosted store.
///
/// `bearer` is the signed-in user's access token; row-level authorization is enforced by the
/// store, so anonymous calls only see what public policies allow.
#[async_trait]
pub trait DataApi: Send + Sync {
    async fn select(
        &self,
        table: Table,
        query: &Query,
        bearer: Option<&str>,
    ) -> Result<Vec<Value>, ApiError>;

    /// Exact number of rows matching the query's filters.
    async fn count(&self, table: Table, query: &Query, bearer: Option<&str>)
        -> Result<u64, ApiError>;

    async fn insert(&self, table: Table, row: Value, bearer: Option<&str>) -> Result<(), ApiError>;

    async fn update(
        &self,
        table: Table,
        query: &Query,
        changes: Value,
        bearer: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn delete(&self, table: Table, query: &Query, bearer: Option<&str>)
        -> Result<(), ApiError>;
}

/// A typed row stored in a known table.
pub trait Row: DeserializeOwned + Send {
    const TABLE: Table;
}

/// Typed view over a [`DataApi`] for one caller.
#[derive(Clone, Copy)]
pub struct Db<'a> {
    api: &'a dyn DataApi,
    bearer: Option<&'a str>,
}

impl<'a> Db<'a> {
    pub fn new(api: &'a dyn DataApi, bearer: Option<&'a str>) -> Self {
        Self { api, bearer }
    }

    pub async fn list<T: Row>(&self, query: Query) -> Result<Vec<T>, ApiError> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }

        let rows = self.api.select(T::TABLE, &query, self.bearer).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(ApiError::from))
            .collect()
    }

    pub async fn first<T: Row>(&self, query: Query) -> Result<Option<T>, ApiError> {
        Ok(self.list(query.limit(1)).await?.into_iter().next())
    }

    /// Like [`Db::first`], but a missing row is an error.
    pub async fn one<T: Row>(&self, query: Query) -> Result<T, ApiError> {
        self.first(query).await?.ok_or(ApiError::NotFound {
            table: T::TABLE.name(),
        })
    }

    pub async fn count<T: Row>(&self, query: Query) -> Result<u64, ApiError> {
        if query.matches_nothing() {
            return Ok(0);
        }
        self.api.count(T::TABLE, &query, self.bearer).await
    }

    pub async fn insert<T: Row>(&self, row: &impl Serialize) -> Result<(), ApiError> {
        let row = serde_json::to_value(row)?;
        self.api.insert(T::TABLE, row, self.bearer).await
    }

    pub async fn update<T: Row>(
        &self,
        query: Query,
        changes: &impl Serialize,
    ) -> Result<(), ApiError> {
        let changes = serde_json::to_value(changes)?;
        self.api.update(T::TABLE, &query, changes, self.bearer).await
    }

    pub async fn delete<T: Row>(&self, query: Query) -> Result<(), ApiError> {
        self.api.delete(T::TABLE, &query, self.bearer).await
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryApi;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_typed_list_and_count() {
        let store = MemoryApi::new();
        let track = store.seed(
            Table::Tracks,
            json!({"title": "Dados", "slug": "dados", "order_index": 2}),
        );
        store.seed(
            Table::Tracks,
            json!({"title": "Front-end", "slug": "front-end", "order_index": 1}),
        );

        let db = Db::new(&store, None);
        let tracks: Vec<Track> = db.list(Query::new().order_by("order_index")).await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].slug, "front-end");
        assert_eq!(tracks[1].id, track);
        assert_eq!(tracks[0].color, "coral");

        assert_eq!(db.count::<Track>(Query::new().eq("slug", "dados")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_in_filter_short_circuits() {
        let store = MemoryApi::new();
        store.fail(Table::Lessons);

        let db = Db::new(&store, None);
        let query = Query::new().is_in("module_id", Vec::<String>::new());
        assert!(db.list::<Lesson>(query.clone()).await.unwrap().is_empty());
        assert_eq!(db.count::<Lesson>(query).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_reports_missing_table() {
        let store = MemoryApi::new();
        let err = Db::new(&store, None)
            .one::<Course>(Query::new().eq("slug", "nada"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { table: "courses" }));
    }
}
