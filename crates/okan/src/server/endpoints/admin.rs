//! Admin catalog and user actions. Each returns the resulting notice.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Json};
use tracing::info;
use uuid::Uuid;

use crate::pages::admin::courses::{self, CourseForm};
use crate::pages::admin::lessons::{self, LessonForm};
use crate::pages::admin::modules::{self, ModuleForm};
use crate::pages::admin::tracks::{self, TrackForm};
use crate::pages::admin::users::{self, AddRoleForm, RemoveRoleForm};
use crate::pages::PageCtx;
use crate::server::types::notice_response;
use crate::session::Viewer;
use crate::types::AppState;

fn ctx<'a>(s: &'a AppState, viewer: &'a Viewer) -> PageCtx<'a> {
    PageCtx::new(s.data.as_ref(), Some(&viewer.access_token), &s.views)
}

/// POST /admin/trilhas
pub async fn post_track(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(form): Json<TrackForm>,
) -> Response {
    info!(admin = %viewer.id(), "POST /admin/trilhas");
    notice_response(tracks::save(ctx(&s, &viewer), None, form).await)
}

/// PUT /admin/trilhas/:track_id
pub async fn put_track(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(track_id): Path<Uuid>,
    Json(form): Json<TrackForm>,
) -> Response {
    info!(admin = %viewer.id(), track = %track_id, "PUT /admin/trilhas");
    notice_response(tracks::save(ctx(&s, &viewer), Some(track_id), form).await)
}

/// DELETE /admin/trilhas/:track_id
pub async fn delete_track(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(track_id): Path<Uuid>,
) -> Response {
    info!(admin = %viewer.id(), track = %track_id, "DELETE /admin/trilhas");
    notice_response(tracks::delete(ctx(&s, &viewer), track_id).await)
}

/// POST /admin/cursos
pub async fn post_course(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(form): Json<CourseForm>,
) -> Response {
    info!(admin = %viewer.id(), "POST /admin/cursos");
    notice_response(courses::save(ctx(&s, &viewer), None, form).await)
}

/// PUT /admin/cursos/:course_id
pub async fn put_course(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(course_id): Path<Uuid>,
    Json(form): Json<CourseForm>,
) -> Response {
    info!(admin = %viewer.id(), course = %course_id, "PUT /admin/cursos");
    notice_response(courses::save(ctx(&s, &viewer), Some(course_id), form).await)
}

/// DELETE /admin/cursos/:course_id
pub async fn delete_course(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(course_id): Path<Uuid>,
) -> Response {
    info!(admin = %viewer.id(), course = %course_id, "DELETE /admin/cursos");
    notice_response(courses::delete(ctx(&s, &viewer), course_id).await)
}

/// POST /admin/cursos/:course_id/modulos
pub async fn post_module(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(course_id): Path<Uuid>,
    Json(form): Json<ModuleForm>,
) -> Response {
    info!(admin = %viewer.id(), course = %course_id, "POST module");
    notice_response(modules::create_in(ctx(&s, &viewer), course_id, form).await)
}

/// PUT /admin/modulos/:module_id
pub async fn put_module(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(module_id): Path<Uuid>,
    Json(form): Json<ModuleForm>,
) -> Response {
    info!(admin = %viewer.id(), module = %module_id, "PUT module");
    notice_response(modules::update(ctx(&s, &viewer), module_id, form).await)
}

/// DELETE /admin/modulos/:module_id
pub async fn delete_module(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(module_id): Path<Uuid>,
) -> Response {
    info!(admin = %viewer.id(), module = %module_id, "DELETE module");
    notice_response(modules::delete(ctx(&s, &viewer), module_id).await)
}

/// POST /admin/modulos/:module_id/aulas
pub async fn post_lesson(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(module_id): Path<Uuid>,
    Json(form): Json<LessonForm>,
) -> Response {
    info!(admin = %viewer.id(), module = %module_id, "POST lesson");
    notice_response(lessons::create_in(ctx(&s, &viewer), module_id, form).await)
}

/// PUT /admin/aulas/:lesson_id
pub async fn put_lesson(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(lesson_id): Path<Uuid>,
    Json(form): Json<LessonForm>,
) -> Response {
    info!(admin = %viewer.id(), lesson = %lesson_id, "PUT lesson");
    notice_response(lessons::update(ctx(&s, &viewer), lesson_id, form).await)
}

/// DELETE /admin/aulas/:lesson_id
pub async fn delete_lesson(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(lesson_id): Path<Uuid>,
) -> Response {
    info!(admin = %viewer.id(), lesson = %lesson_id, "DELETE lesson");
    notice_response(lessons::delete(ctx(&s, &viewer), lesson_id).await)
}

/// POST /admin/usuarios/papeis
pub async fn post_role(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(form): Json<AddRoleForm>,
) -> Response {
    info!(admin = %viewer.id(), user = %form.user_id, role = %form.role, "POST role");
    notice_response(users::add_role(ctx(&s, &viewer).db, &s.roles, form).await)
}

/// DELETE /admin/usuarios/papeis/:role_id
pub async fn delete_role(
    State(s): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(role_id): Path<Uuid>,
) -> Response {
    info!(admin = %viewer.id(), role_row = %role_id, "DELETE role");
    let form = RemoveRoleForm { role_id };
    notice_response(users::remove_role(ctx(&s, &viewer).db, &s.roles, form).await)
}
