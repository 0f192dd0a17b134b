//! Role lookup for signed-in users.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::role::{Role, RoleSet};
use crate::api::cache::{CacheStats, QueryCache, QueryKey};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{DataApi, Table};

const ROLES_RESOURCE: &str = "user_roles";

#[derive(Deserialize)]
struct RoleRow {
    role: String,
}

/// Fetches and caches the role set of each user.
pub struct RoleResolver {
    data: Arc<dyn DataApi>,
    cache: QueryCache<RoleSet>,
}

impl RoleResolver {
    pub fn new(data: Arc<dyn DataApi>, ttl: Duration) -> Self {
        Self {
            data,
            cache: QueryCache::new(ttl),
        }
    }

    fn key(user_id: Uuid) -> QueryKey {
        QueryKey::new(ROLES_RESOURCE, user_id.to_string())
    }

    async fn fetch(&self, user_id: Uuid, bearer: &str) -> Result<RoleSet, ApiError> {
        let query = Query::new().select("role").eq("user_id", user_id);
        let rows = self.data.select(Table::UserRoles, &query, Some(bearer)).await?;

        let mut roles = RoleSet::empty();
        for row in rows {
            let RoleRow { role } = serde_json::from_value(row)?;
            match role.parse::<Role>() {
                Ok(role) => roles.insert(role),
                Err(e) => debug!(user = %user_id, error = %e, "Ignoring role row"),
            }
        }
        Ok(roles)
    }

    /// Roles held by `user_id`. A failed lookup is logged and treated as holding no role; it is
    /// not cached, so the next request retries.
    pub async fn resolve(&self, user_id: Uuid, bearer: &str) -> RoleSet {
        match self
            .cache
            .get_or_fetch(Self::key(user_id), || self.fetch(user_id, bearer))
            .await
        {
            Ok(roles) => roles,
            Err(e) => {
                warn!(user = %user_id, error = %e, "Role lookup failed; treating as no roles");
                RoleSet::empty()
            }
        }
    }

    /// Forgets the cached roles of one user (sign-out, role edits).
    pub fn invalidate(&self, user_id: Uuid) {
        self.cache.invalidate(&Self::key(user_id));
    }

    /// Drops role sets whose staleness window has passed.
    pub fn cleanup_expired(&self) {
        self.cache.cleanup_expired();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryApi;
    use serde_json::json;

    fn resolver(store: &Arc<MemoryApi>) -> RoleResolver {
        RoleResolver::new(store.clone(), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_resolves_all_role_rows() {
        let store = Arc::new(MemoryApi::new());
        let user = Uuid::new_v4();
        store.seed(Table::UserRoles, json!({"user_id": user, "role": "student"}));
        store.seed(Table::UserRoles, json!({"user_id": user, "role": "admin"}));
        store.seed(Table::UserRoles, json!({"user_id": Uuid::new_v4(), "role": "mentor"}));

        let roles = resolver(&store).resolve(user, "t").await;
        assert!(roles.is_student());
        assert!(roles.is_admin());
        assert!(!roles.is_mentor());
        assert_eq!(roles.primary(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_cached_until_invalidated() {
        let store = Arc::new(MemoryApi::new());
        let user = Uuid::new_v4();
        store.seed(Table::UserRoles, json!({"user_id": user, "role": "student"}));

        let resolver = resolver(&store);
        resolver.resolve(user, "t").await;
        store.seed(Table::UserRoles, json!({"user_id": user, "role": "mentor"}));

        assert!(!resolver.resolve(user, "t").await.is_mentor());
        assert_eq!(store.selects(), 1);

        resolver.invalidate(user);
        assert!(resolver.resolve(user, "t").await.is_mentor());
        assert_eq!(store.selects(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_means_no_roles() {
        let store = Arc::new(MemoryApi::new());
        store.fail(Table::UserRoles);

        let roles = resolver(&store).resolve(Uuid::new_v4(), "t").await;
        assert!(roles.is_empty());
        assert_eq!(roles.home_path(), "/");
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired_role_sets() {
        let store = Arc::new(MemoryApi::new());
        let resolver = RoleResolver::new(store.clone(), Duration::ZERO);
        for _ in 0..50 {
            resolver.resolve(Uuid::new_v4(), "t").await;
        }
        assert_eq!(resolver.stats().total_entries, 50);
        assert_eq!(resolver.stats().active_entries, 0);

        resolver.cleanup_expired();
        assert_eq!(resolver.stats().total_entries, 0);
    }
}
