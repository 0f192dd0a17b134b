//! Student actions: application form, enrollment, lesson completion and notes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Json};
use tracing::info;
use uuid::Uuid;

use crate::db::Db;
use crate::pages::application::{self, ApplicationForm, ApplicationPage};
use crate::pages::learning::{self, NotesForm};
use crate::server::types::notice_response;
use crate::session::Viewer;
use crate::types::AppState;

/// POST /inscricao
pub async fn post_application(Json(form): Json<ApplicationForm>) -> Json<ApplicationPage> {
    Json(application::submit(form))
}

/// POST /app/cursos/:course_slug/inscricao
pub async fn post_enroll(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(course_slug): Path<String>,
) -> Response {
    info!(user = %viewer.id(), course = %course_slug, "POST enroll");

    let db = Db::new(s.data.as_ref(), Some(&viewer.access_token));
    notice_response(learning::enroll(db, viewer.id(), &course_slug).await)
}

/// POST /app/cursos/:course_slug/aula/:lesson_id/concluir
pub async fn post_complete(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path((course_slug, lesson_id)): Path<(String, Uuid)>,
) -> Response {
    info!(user = %viewer.id(), course = %course_slug, lesson = %lesson_id, "POST complete lesson");

    let db = Db::new(s.data.as_ref(), Some(&viewer.access_token));
    notice_response(learning::mark_complete(db, viewer.id(), &course_slug, lesson_id).await)
}

/// POST /app/cursos/:course_slug/aula/:lesson_id/anotacoes
pub async fn post_notes(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path((course_slug, lesson_id)): Path<(String, Uuid)>,
    Json(form): Json<NotesForm>,
) -> Response {
    info!(user = %viewer.id(), course = %course_slug, lesson = %lesson_id, "POST notes");

    let db = Db::new(s.data.as_ref(), Some(&viewer.access_token));
    notice_response(learning::save_notes(db, viewer.id(), &course_slug, lesson_id, &form).await)
}
