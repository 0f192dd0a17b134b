//! Authentication calls against the hosted auth endpoint.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::client::HostedClient;
use super::error::{ApiError, AuthFailure};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    /// Linked sign-in identities. An empty list on sign-up means the address was taken.
    #[serde(default, skip_serializing)]
    pub identities: Option<Vec<Value>>,
}

impl AuthUser {
    /// `full_name` stored in the user metadata at sign-up.
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account was confirmed immediately and a session issued.
    SignedIn(AuthSession),
    /// The account exists but the address must be confirmed first.
    ConfirmationRequired(AuthUser),
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, ApiError>;

    /// The user an access token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, ApiError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError>;
}

/// Maps rejected auth calls onto the failures the login screen distinguishes.
fn classify(error: ApiError) -> ApiError {
    let ApiError::Status {
        status,
        message,
        code,
    } = &error
    else {
        return error;
    };

    let lowered = message.to_lowercase();
    match code.as_deref() {
        Some("invalid_credentials" | "invalid_grant") => {
            ApiError::Auth(AuthFailure::InvalidCredentials)
        }
        Some("user_already_exists" | "email_exists") => {
            ApiError::Auth(AuthFailure::AlreadyRegistered)
        }
        _ if lowered.contains("invalid login credentials") => {
            ApiError::Auth(AuthFailure::InvalidCredentials)
        }
        _ if lowered.contains("already registered") => {
            ApiError::Auth(AuthFailure::AlreadyRegistered)
        }
        _ if (400..500).contains(status) => ApiError::Auth(AuthFailure::Other(message.clone())),
        _ => error,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(AuthSession),
    User(AuthUser),
}

#[async_trait]
impl AuthApi for HostedClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let url = self.auth_base.join("token?grant_type=password")?;
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password }));

        let response = self.send(request, "auth/token").await.map_err(classify)?;
        let session: AuthSession = response.json().await?;
        info!(user = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, ApiError> {
        let url = self.auth_base.join("signup")?;
        let request = self.request(Method::POST, url, None).json(&json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        }));

        let response = self.send(request, "auth/signup").await.map_err(classify)?;
        match response.json::<SignUpBody>().await? {
            SignUpBody::Session(session) => {
                info!(user = %session.user.id, "Signed up");
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpBody::User(user) if user.identities.as_ref().is_some_and(Vec::is_empty) => {
                Err(ApiError::Auth(AuthFailure::AlreadyRegistered))
            }
            SignUpBody::User(user) => {
                info!(user = %user.id, "Signed up, awaiting confirmation");
                Ok(SignUpOutcome::ConfirmationRequired(user))
            }
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, ApiError> {
        let url = self.auth_base.join("user")?;
        let request = self.request(Method::GET, url, Some(access_token));

        match self.send(request, "auth/user").await {
            Ok(response) => Ok(response.json().await?),
            Err(ApiError::Status {
                status: 401 | 403, ..
            }) => Err(ApiError::Auth(AuthFailure::SessionExpired)),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        let url = self.auth_base.join("logout")?;
        let request = self.request(Method::POST, url, Some(access_token));
        self.send(request, "auth/logout").await?;
        Ok(())
    }
}
