use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{middleware as mw, Router};
use tower_http::trace::TraceLayer;

use crate::access::routes::ROUTES;
use crate::server::endpoints::{admin, auth, learning, pages, status};
use crate::types::AppState;

mod endpoints;
mod middleware;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router. Every request passes the guard middleware, which looks the path up in the
/// route table before any handler runs.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // One GET per page in the route table
    let page_router = ROUTES
        .iter()
        .fold(Router::new(), |router, route| {
            router.route(route.pattern, get(pages::render))
        });

    let legacy_router = status::legacy_paths()
        .fold(Router::new(), |router, path| {
            router.route(path, get(status::get_legacy))
        });

    let session_router = Router::new()
        .route("/login", post(auth::post_login))
        .route("/cadastro", post(auth::post_sign_up))
        .route("/logout", post(auth::post_logout))
        .route("/inscricao", post(learning::post_application));

    let student_router = Router::new()
        .route("/app/cursos/:course_slug/inscricao", post(learning::post_enroll))
        .route(
            "/app/cursos/:course_slug/aula/:lesson_id/concluir",
            post(learning::post_complete),
        )
        .route(
            "/app/cursos/:course_slug/aula/:lesson_id/anotacoes",
            post(learning::post_notes),
        );

    let admin_router = Router::new()
        .route("/admin/trilhas", post(admin::post_track))
        .route(
            "/admin/trilhas/:track_id",
            put(admin::put_track).delete(admin::delete_track),
        )
        .route("/admin/cursos", post(admin::post_course))
        .route(
            "/admin/cursos/:course_id",
            put(admin::put_course).delete(admin::delete_course),
        )
        .route("/admin/cursos/:course_id/modulos", post(admin::post_module))
        .route(
            "/admin/modulos/:module_id",
            put(admin::put_module).delete(admin::delete_module),
        )
        .route("/admin/modulos/:module_id/aulas", post(admin::post_lesson))
        .route(
            "/admin/aulas/:lesson_id",
            put(admin::put_lesson).delete(admin::delete_lesson),
        )
        .route("/admin/usuarios/papeis", post(admin::post_role))
        .route("/admin/usuarios/papeis/:role_id", delete(admin::delete_role));

    Router::new()
        .route("/health", get(status::get_health))
        .merge(page_router)
        .merge(legacy_router)
        .merge(session_router)
        .merge(student_router)
        .merge(admin_router)
        .fallback(pages::not_found)
        .layer(mw::from_fn_with_state(app_state.clone(), middleware::guard))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
