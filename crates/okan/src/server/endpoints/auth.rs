//! Sign-in, sign-up and sign-out.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::auth::{AuthSession, SignUpOutcome};
use crate::api::error::{ApiError, AuthFailure};
use crate::pages::Notice;
use crate::server::middleware::session_token;
use crate::session::{Viewer, SESSION_COOKIE};
use crate::types::AppState;

/// Cookie lifetime when the auth service does not say.
const DEFAULT_SESSION_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

fn session_cookie(session: &AuthSession) -> String {
    format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.access_token,
        session.expires_in.unwrap_or(DEFAULT_SESSION_SECS)
    )
}

fn cleared_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Sets the session cookie and sends the user to their primary role's home.
async fn start_session(state: &AppState, session: &AuthSession) -> Response {
    let roles = state
        .roles
        .resolve(session.user.id, &session.access_token)
        .await;
    (
        [(SET_COOKIE, session_cookie(session))],
        Redirect::to(roles.home_path()),
    )
        .into_response()
}

fn rejected(status: StatusCode, error: &ApiError) -> Response {
    (status, Json(Notice::error(error.user_message()))).into_response()
}

/// POST /login
pub async fn post_login(State(s): State<Arc<AppState>>, Json(form): Json<SignInForm>) -> Response {
    match s.sessions.sign_in(&form.email, &form.password).await {
        Ok(session) => start_session(&s, &session).await,
        Err(e) => {
            warn!(error = %e, "Sign-in failed");
            let status = match e {
                ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            rejected(status, &e)
        }
    }
}

/// POST /cadastro
pub async fn post_sign_up(
    State(s): State<Arc<AppState>>,
    Json(form): Json<SignUpForm>,
) -> Response {
    if [&form.full_name, &form.email, &form.password]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(Notice::error("Preencha todos os campos")),
        )
            .into_response();
    }

    match s
        .sessions
        .sign_up(&form.full_name, &form.email, &form.password)
        .await
    {
        Ok(SignUpOutcome::SignedIn(session)) => {
            info!(user = %session.user.id, "Account created");
            start_session(&s, &session).await
        }
        Ok(SignUpOutcome::ConfirmationRequired(user)) => {
            info!(user = %user.id, "Account created, awaiting confirmation");
            Json(Notice::success(
                "Cadastro realizado! Verifique seu e-mail para confirmar a conta.",
            ))
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Sign-up failed");
            let status = match e {
                ApiError::Auth(AuthFailure::AlreadyRegistered) => StatusCode::CONFLICT,
                ApiError::Auth(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            rejected(status, &e)
        }
    }
}

/// POST /logout
pub async fn post_logout(
    State(s): State<Arc<AppState>>,
    viewer: Option<Extension<Viewer>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = session_token(&headers) {
        s.sessions.sign_out(token).await;
    }
    if let Some(Extension(viewer)) = viewer {
        s.roles.invalidate(viewer.id());
    }

    ([(SET_COOKIE, cleared_cookie())], Redirect::to("/")).into_response()
}
