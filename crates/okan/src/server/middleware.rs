//! Request middleware: session resolution and the route guard.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use crate::access::{allowed_roles, evaluate, GuardDecision, SessionState};
use crate::session::{Viewer, SESSION_COOKIE};
use crate::types::AppState;

/// Access token from the session cookie, or from an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token);

    from_cookie
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn resolve_viewer(state: &AppState, token: &str) -> Option<Viewer> {
    let user = state.sessions.current_user(token).await?;
    let roles = state.roles.resolve(user.id, token).await;
    Some(Viewer {
        user,
        roles,
        access_token: token.to_string(),
    })
}

/// Resolves who is signed in and enforces the route table's role rules.
///
/// The viewer, when there is one, is attached to the request as an extension for handlers.
pub async fn guard(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let viewer = match session_token(req.headers()) {
        Some(token) => resolve_viewer(&state, token).await,
        None => None,
    };

    let path = req.uri().path();
    if let Some(allowed) = allowed_roles(path) {
        let session = match &viewer {
            Some(viewer) => SessionState::Authenticated(viewer.roles),
            None => SessionState::Anonymous,
        };

        match evaluate(session, allowed) {
            GuardDecision::Render => {}
            GuardDecision::Redirect(to) => {
                debug!(path = path, to = to, "Guard redirect");
                return Redirect::to(to).into_response();
            }
            // Session state is fully resolved above.
            GuardDecision::Pending => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }

    if let Some(viewer) = viewer {
        req.extensions_mut().insert(viewer);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(session_token(&headers), Some("abc"));

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; okan_session=xyz; other=1"),
        );
        assert_eq!(session_token(&headers), Some("xyz"));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("okan_session="));
        assert_eq!(session_token(&empty), None);
    }
}
