//! Test doubles shared by unit tests across the crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::access::resolver::RoleResolver;
use crate::api::auth::{AuthApi, AuthSession, AuthUser, SignUpOutcome};
use crate::api::cache::QueryCache;
use crate::api::error::{ApiError, AuthFailure};
use crate::db::memory::MemoryApi;
use crate::db::Table;
use crate::session::SessionProvider;
use crate::types::AppState;

struct Account {
    email: String,
    password: String,
    user: AuthUser,
}

/// Auth endpoint double: accounts and issued tokens live in memory.
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<Vec<Account>>,
    tokens: Mutex<HashMap<String, AuthUser>>,
    lookups: AtomicUsize,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, password: &str, full_name: &str) -> Uuid {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: json!({ "full_name": full_name }),
            identities: None,
        };
        let id = user.id;
        self.accounts.lock().unwrap().push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user,
        });
        id
    }

    /// Issues a token for an existing account without going through sign-in.
    pub fn token_for(&self, user_id: Uuid) -> String {
        let user = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .expect("unknown test user");
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(token.clone(), user);
        token
    }

    pub fn user_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn session_for(&self, user: AuthUser) -> AuthSession {
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(token.clone(), user.clone());
        AuthSession {
            access_token: token,
            refresh_token: None,
            expires_in: Some(3600),
            user,
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let user = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email && a.password == password)
            .map(|a| a.user.clone())
            .ok_or(ApiError::Auth(AuthFailure::InvalidCredentials))?;
        Ok(self.session_for(user))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, ApiError> {
        if self.accounts.lock().unwrap().iter().any(|a| a.email == email) {
            return Err(ApiError::Auth(AuthFailure::AlreadyRegistered));
        }
        let id = self.add_user(email, password, full_name);
        let user = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
            .ok_or(ApiError::Auth(AuthFailure::Other("lost account".into())))?;
        Ok(SignUpOutcome::SignedIn(self.session_for(user)))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(ApiError::Auth(AuthFailure::SessionExpired))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        self.tokens.lock().unwrap().remove(access_token);
        Ok(())
    }
}

/// App state over in-memory doubles, plus handles to seed them.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryApi>,
    pub auth: Arc<FakeAuth>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryApi::new());
        let auth = Arc::new(FakeAuth::new());
        let ttl = Duration::from_secs(300);

        let state = Arc::new(AppState {
            data: store.clone(),
            sessions: SessionProvider::new(auth.clone(), ttl),
            roles: RoleResolver::new(store.clone(), ttl),
            views: QueryCache::new(ttl),
        });

        Self { state, store, auth }
    }

    /// Creates an account with a profile and the given roles; returns its id and a token.
    pub fn user(&self, full_name: &str, roles: &[&str]) -> (Uuid, String) {
        let email = format!("{}@okan.dev", Uuid::new_v4().simple());
        let id = self.auth.add_user(&email, "segredo", full_name);
        self.store.seed(
            Table::Profiles,
            json!({ "user_id": id, "full_name": full_name }),
        );
        for role in roles {
            self.store
                .seed(Table::UserRoles, json!({ "user_id": id, "role": role }));
        }
        (id, self.auth.token_for(id))
    }
}
