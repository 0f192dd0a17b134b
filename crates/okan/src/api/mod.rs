//! Hosted data API access: REST table client, auth client, query builder and query cache.

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod query;

pub use auth::{AuthApi, AuthSession, AuthUser, SignUpOutcome};
pub use cache::{CacheStats, QueryCache, QueryKey, SessionKey};
pub use client::HostedClient;
pub use error::{ApiError, AuthFailure};
pub use query::Query;
