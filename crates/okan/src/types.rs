use std::sync::Arc;

use serde_json::Value;

use crate::access::resolver::RoleResolver;
use crate::api::auth::AuthApi;
use crate::api::cache::QueryCache;
use crate::api::client::HostedClient;
use crate::api::error::ApiError;
use crate::config::AppConfig;
use crate::db::DataApi;
use crate::session::SessionProvider;

/// Process-wide state shared by every request handler.
pub struct AppState {
    /// Table access, authorized per call with the caller's token
    pub data: Arc<dyn DataApi>,
    pub sessions: SessionProvider,
    pub roles: RoleResolver,
    /// Cached public catalog views, keyed by resource and scope
    pub views: QueryCache<Value>,
}

impl AppState {
    /// Wires the hosted client into every service.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Arc::new(HostedClient::new(&config.api_url, config.api_key.clone())?);
        let data: Arc<dyn DataApi> = client.clone();
        let auth: Arc<dyn AuthApi> = client;
        let ttl = config.cache_ttl;

        Ok(Self {
            sessions: SessionProvider::new(auth, ttl),
            roles: RoleResolver::new(data.clone(), ttl),
            views: QueryCache::new(ttl),
            data,
        })
    }
}
