//! Session handling: who is signed in, sign-in, sign-up and sign-out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::role::RoleSet;
use crate::api::auth::{AuthApi, AuthSession, AuthUser, SignUpOutcome};
use crate::api::cache::{CacheStats, QueryCache, SessionKey};
use crate::api::error::ApiError;

/// Name of the cookie holding the access token.
pub const SESSION_COOKIE: &str = "okan_session";

/// The signed-in user behind a request, with resolved roles.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user: AuthUser,
    pub roles: RoleSet,
    pub access_token: String,
}

impl Viewer {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

pub struct SessionProvider {
    auth: Arc<dyn AuthApi>,
    identities: QueryCache<AuthUser, SessionKey>,
}

impl SessionProvider {
    pub fn new(auth: Arc<dyn AuthApi>, ttl: Duration) -> Self {
        Self {
            auth,
            identities: QueryCache::new(ttl),
        }
    }

    /// Resolves the user behind an access token. Unknown, expired or unverifiable tokens all
    /// leave the visitor anonymous.
    pub async fn current_user(&self, access_token: &str) -> Option<AuthUser> {
        let key = SessionKey::from_token(access_token);
        if let Some(user) = self.identities.get(&key) {
            return Some(user);
        }

        match self.auth.get_user(access_token).await {
            Ok(user) => {
                self.identities.insert(key, user.clone());
                Some(user)
            }
            Err(e) if e.needs_reauth() => {
                debug!(session = %key, "Session token rejected");
                None
            }
            Err(e) => {
                warn!(session = %key, error = %e, "Could not verify session");
                None
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let session = self.auth.sign_in_with_password(email.trim(), password).await?;
        self.identities.insert(
            SessionKey::from_token(&session.access_token),
            session.user.clone(),
        );
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, ApiError> {
        let outcome = self
            .auth
            .sign_up(email.trim(), password, full_name.trim())
            .await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.identities.insert(
                SessionKey::from_token(&session.access_token),
                session.user.clone(),
            );
        }
        Ok(outcome)
    }

    /// Drops identities whose staleness window has passed.
    pub fn cleanup_expired(&self) {
        self.identities.cleanup_expired();
    }

    pub fn stats(&self) -> CacheStats {
        self.identities.stats()
    }

    /// Ends the session locally even when the hosted sign-out fails.
    pub async fn sign_out(&self, access_token: &str) {
        let key = SessionKey::from_token(access_token);
        self.identities.invalidate(&key);

        match self.auth.sign_out(access_token).await {
            Ok(()) => info!(session = %key, "Signed out"),
            Err(e) => warn!(session = %key, error = %e, "Hosted sign-out failed"),
        }
    }
}
