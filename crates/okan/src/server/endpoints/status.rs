use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use crate::access::routes::{redirect_for, REDIRECTS};
use crate::types::AppState;

/// GET /health
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    Json(json!({
        "status": "ok",
        "view_cache": s.views.stats(),
        "identity_cache": s.sessions.stats(),
        "role_cache": s.roles.stats(),
    }))
    .into_response()
}

/// GET on a legacy path listed in the redirect table.
pub async fn get_legacy(uri: Uri) -> Response {
    match redirect_for(uri.path()) {
        Some(to) => Redirect::permanent(to).into_response(),
        None => super::pages::not_found().await,
    }
}

/// Paths `get_legacy` answers for.
pub fn legacy_paths() -> impl Iterator<Item = &'static str> {
    REDIRECTS.iter().map(|(from, _)| *from)
}
