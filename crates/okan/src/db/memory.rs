//! In-memory [`DataApi`] used by tests.
//!
//! Interprets [`Query`] filters, ordering and limits the way the hosted REST endpoint does,
//! fills in the column defaults the hosted schema declares and rejects duplicate slugs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{DataApi, Table};
use crate::api::error::ApiError;
use crate::api::query::{Filter, Query};

#[derive(Default)]
pub struct MemoryApi {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    failing: Mutex<HashSet<Table>>,
    selects: AtomicUsize,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row with schema defaults applied and returns its id.
    pub fn seed(&self, table: Table, row: Value) -> Uuid {
        let row = with_defaults(table, row);
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| id.parse().ok())
            .unwrap_or_default();
        self.tables.lock().unwrap().entry(table).or_default().push(row);
        id
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every later call touching `table` fail.
    pub fn fail(&self, table: Table) {
        self.failing.lock().unwrap().insert(table);
    }

    /// Number of select calls served so far.
    pub fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    fn check(&self, table: Table) -> Result<(), ApiError> {
        if self.failing.lock().unwrap().contains(&table) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("{table} is unavailable"),
                code: None,
            });
        }
        Ok(())
    }

    fn matching(&self, table: Table, query: &Query) -> Vec<Value> {
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();

        rows.sort_by(|a, b| {
            query
                .order
                .iter()
                .map(|o| {
                    let ord = compare(a.get(o.column), b.get(o.column));
                    if o.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        rows
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, expected) => row.get(*column).map(cell_text).as_ref() == Some(expected),
        Filter::In(column, values) => row
            .get(*column)
            .map(cell_text)
            .is_some_and(|v| values.contains(&v)),
        Filter::IsNull(column) => row.get(*column).map_or(true, Value::is_null),
    }
}

/// Ascending order with nulls last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;

    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Equal,
        (None, Some(_)) => Greater,
        (Some(_), None) => Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => cell_text(x).cmp(&cell_text(y)),
    }
}

fn with_defaults(table: Table, row: Value) -> Value {
    let now = Utc::now().to_rfc3339();
    let mut base = json!({
        "id": Uuid::new_v4().to_string(),
        "created_at": now,
        "updated_at": now,
    });

    let extra = match table {
        Table::Tracks => json!({"color": "coral", "is_published": false, "order_index": 0}),
        Table::Courses => json!({"is_published": false, "order_index": 0}),
        Table::Modules => json!({"order_index": 0}),
        Table::Lessons => {
            json!({"lesson_type": "video", "is_published": true, "order_index": 0})
        }
        Table::Enrollments => json!({"enrolled_at": now, "completed_at": null}),
        Table::LessonProgress => {
            json!({"is_completed": false, "progress_percent": 0, "completed_at": null})
        }
        Table::LessonNotes => json!({"content": ""}),
        Table::Certificates => json!({
            "issued_at": now,
            "certificate_number": format!("OKAN-{}", &Uuid::new_v4().simple().to_string()[..8]),
        }),
        Table::Discussions => json!({"is_pinned": false, "content": ""}),
        Table::DiscussionReplies => json!({"is_solution": false, "content": ""}),
        Table::UserRoles => json!({"role": "student"}),
        Table::Profiles => json!({"is_instructor": false}),
    };

    merge(&mut base, extra);
    merge(&mut base, row);
    base
}

fn merge(target: &mut Value, source: Value) {
    if let (Some(target), Value::Object(source)) = (target.as_object_mut(), source) {
        for (key, value) in source {
            target.insert(key, value);
        }
    }
}

fn slug_taken(rows: &[Value], row: &Map<String, Value>) -> bool {
    row.get("slug")
        .is_some_and(|slug| rows.iter().any(|r| r.get("slug") == Some(slug)))
}

#[async_trait]
impl DataApi for MemoryApi {
    async fn select(
        &self,
        table: Table,
        query: &Query,
        _bearer: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        self.check(table)?;
        self.selects.fetch_add(1, Ordering::SeqCst);
        Ok(self.matching(table, query))
    }

    async fn count(
        &self,
        table: Table,
        query: &Query,
        _bearer: Option<&str>,
    ) -> Result<u64, ApiError> {
        self.check(table)?;
        let unlimited = Query {
            limit: None,
            ..query.clone()
        };
        Ok(self.matching(table, &unlimited).len() as u64)
    }

    async fn insert(
        &self,
        table: Table,
        row: Value,
        _bearer: Option<&str>,
    ) -> Result<(), ApiError> {
        self.check(table)?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table).or_default();

        if matches!(table, Table::Tracks | Table::Courses) {
            if let Some(fields) = row.as_object() {
                if slug_taken(rows, fields) {
                    return Err(ApiError::Status {
                        status: 409,
                        message: format!(
                            "duplicate key value violates unique constraint \"{table}_slug_key\""
                        ),
                        code: Some("23505".to_string()),
                    });
                }
            }
        }

        rows.push(with_defaults(table, row));
        Ok(())
    }

    async fn update(
        &self,
        table: Table,
        query: &Query,
        changes: Value,
        _bearer: Option<&str>,
    ) -> Result<(), ApiError> {
        self.check(table)?;
        let now = Utc::now().to_rfc3339();
        let mut tables = self.tables.lock().unwrap();
        for row in tables.entry(table).or_default().iter_mut() {
            if query.filters.iter().all(|f| matches(row, f)) {
                merge(row, changes.clone());
                if row.get("updated_at").is_some() {
                    merge(row, json!({ "updated_at": now }));
                }
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        table: Table,
        query: &Query,
        _bearer: Option<&str>,
    ) -> Result<(), ApiError> {
        self.check(table)?;
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table)
            .or_default()
            .retain(|row| !query.filters.iter().all(|f| matches(row, f)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filters_order_and_nulls_last() {
        let store = MemoryApi::new();
        store.seed(Table::Tracks, json!({"title": "B", "slug": "b", "order_index": 2}));
        store.seed(
            Table::Tracks,
            json!({"title": "A", "slug": "a", "order_index": 1, "icon": "x"}),
        );
        store.seed(Table::Tracks, json!({"title": "C", "slug": "c", "order_index": null}));

        let rows = store
            .select(Table::Tracks, &Query::new().order_by("order_index"), None)
            .await
            .unwrap();
        let slugs: Vec<_> = rows.iter().map(|r| r["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);

        let null_icons = store
            .count(Table::Tracks, &Query::new().is_null("icon"), None)
            .await
            .unwrap();
        assert_eq!(null_icons, 2);

        let picked = store
            .select(Table::Tracks, &Query::new().is_in("slug", ["a", "c"]), None)
            .await
            .unwrap();
        assert_eq!(picked.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected() {
        let store = MemoryApi::new();
        store
            .insert(Table::Tracks, json!({"title": "A", "slug": "a"}), None)
            .await
            .unwrap();
        let err = store
            .insert(Table::Tracks, json!({"title": "A2", "slug": "a"}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 409, .. }));
    }
}
