//! GET handler for every page in the route table.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::nav::{self, NavShell};
use crate::access::routes::{match_path, Page, RouteMatch};
use crate::api::cache::QueryKey;
use crate::api::error::ApiError;
use crate::db::Db;
use crate::pages::admin::{self, courses, lessons, modules, tracks, users};
use crate::pages::{
    application, learning, mentor, public, student, EmptyState, PageCtx, CATALOG,
};
use crate::server::types::{ApiErrorType, PageResponse};
use crate::session::Viewer;
use crate::types::AppState;

fn json(view: impl Serialize) -> Result<Value, ApiErrorType> {
    Ok(serde_json::to_value(view).map_err(ApiError::from)?)
}

fn param<'a>(hit: &'a RouteMatch<'_>, name: &str) -> &'a str {
    hit.param(name).unwrap_or_default()
}

fn id_param(hit: &RouteMatch<'_>, name: &str) -> Result<Uuid, ApiErrorType> {
    param(hit, name).parse().map_err(|_| {
        ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Invalid identifier",
            Some(format!("{name} must be a UUID")),
        ))
    })
}

fn signed_in(viewer: Option<&Viewer>) -> Result<&Viewer, ApiErrorType> {
    viewer.ok_or_else(|| (StatusCode::UNAUTHORIZED, "Not signed in", None).into())
}

fn shell(viewer: &Viewer, path: &str) -> NavShell {
    NavShell {
        sections: nav::sections(viewer.roles, path),
        user: nav::user_menu(
            viewer.user.full_name(),
            viewer.user.email.as_deref(),
            viewer
                .user
                .user_metadata
                .get("avatar_url")
                .and_then(Value::as_str),
        ),
    }
}

/// Builds the view model of the matched page.
async fn build(
    state: &AppState,
    viewer: Option<&Viewer>,
    hit: &RouteMatch<'_>,
) -> Result<Value, ApiErrorType> {
    // Catalog views are shared across visitors, so they are read with the public key and
    // cached. Everything else is read as the viewer on every request.
    let catalog = PageCtx::new(state.data.as_ref(), None, &state.views);
    let db = Db::new(state.data.as_ref(), viewer.map(|v| v.access_token.as_str()));

    let value = match hit.route.page {
        Page::Landing => {
            catalog
                .cached(QueryKey::new(CATALOG, "landing"), public::landing(catalog.db))
                .await?
        }
        Page::TrackCatalog => {
            catalog
                .cached(QueryKey::new(CATALOG, "tracks"), public::track_catalog(catalog.db))
                .await?
        }
        Page::TrackDetail => {
            let slug = param(hit, "track_slug");
            catalog
                .cached(
                    QueryKey::new(CATALOG, format!("track/{slug}")),
                    public::track_detail(catalog.db, slug),
                )
                .await?
        }
        Page::CourseDetail => {
            let (track, course) = (param(hit, "track_slug"), param(hit, "course_slug"));
            catalog
                .cached(
                    QueryKey::new(CATALOG, format!("course/{track}/{course}")),
                    public::course_detail(catalog.db, track, course),
                )
                .await?
        }
        Page::Login => json(public::login())?,
        Page::About => json(public::about())?,
        Page::Application => json(application::application_page())?,

        Page::StudentDashboard => json(student::dashboard(db, signed_in(viewer)?.id()).await?)?,
        Page::StudentCourses => json(student::courses(db, signed_in(viewer)?.id()).await?)?,
        Page::CourseView => {
            let id = signed_in(viewer)?.id();
            json(learning::course_view(db, id, param(hit, "course_slug")).await?)?
        }
        Page::LessonPlayer => {
            let id = signed_in(viewer)?.id();
            let lesson_id = id_param(hit, "lesson_id")?;
            json(learning::lesson_player(db, id, param(hit, "course_slug"), lesson_id).await?)?
        }
        Page::StudentTracks => json(student::tracks(db).await?)?,
        Page::StudentCertificates => {
            json(student::certificates(db, signed_in(viewer)?.id()).await?)?
        }
        Page::StudentCommunity => json(student::community())?,

        Page::MentorDashboard => json(mentor::dashboard(db, signed_in(viewer)?.id()).await?)?,
        Page::MentorCourses => json(mentor::courses(db).await?)?,
        Page::MentorStudents => json(mentor::students(db).await?)?,
        Page::MentorDiscussions => json(mentor::discussions(db).await?)?,
        Page::MentorAnalytics => json(mentor::analytics(db).await?)?,

        Page::AdminDashboard => json(admin::dashboard(db).await?)?,
        Page::AdminTracks => json(tracks::list(db).await?)?,
        Page::AdminCourses => json(courses::list(db).await?)?,
        Page::AdminModules => json(modules::list(db, id_param(hit, "course_id")?).await?)?,
        Page::AdminLessons => json(lessons::list(db, id_param(hit, "module_id")?).await?)?,
        Page::AdminLessonIndex => json(lessons::index(db).await?)?,
        Page::AdminUsers => json(users::list(db).await?)?,
        Page::AdminCertificates => json(admin::certificates())?,
        Page::AdminReports => json(admin::reports())?,
        Page::AdminSettings => json(admin::settings())?,
    };
    Ok(value)
}

/// GET for any path in the route table. The guard has already run.
pub async fn render(
    State(s): State<Arc<AppState>>,
    viewer: Option<Extension<Viewer>>,
    uri: Uri,
) -> Response {
    let path = uri.path();
    let Some(hit) = match_path(path) else {
        return not_found().await;
    };
    let viewer = viewer.map(|Extension(v)| v);

    info!(
        page = ?hit.route.page,
        user = ?viewer.as_ref().map(Viewer::id),
        "GET {}",
        path
    );

    match build(&s, viewer.as_ref(), &hit).await {
        Ok(data) => Json(PageResponse {
            page: hit.route.page,
            title: hit.route.title,
            nav: viewer.as_ref().map(|v| shell(v, path)),
            data,
        })
        .into_response(),
        Err(e) => {
            warn!(page = ?hit.route.page, error = %e.error, details = ?e.details, "Page failed");
            e.into_response()
        }
    }
}

/// Everything outside the route table.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(EmptyState::new("Página não encontrada", "/", "Voltar ao início")),
    )
        .into_response()
}
