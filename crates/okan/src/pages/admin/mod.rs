//! Admin area: dashboard, catalog CRUD screens, users and placeholder screens.

pub mod courses;
pub mod lessons;
pub mod modules;
pub mod tracks;
pub mod users;

use serde::Serialize;

use super::{Notice, PageCtx, Placeholder, CATALOG};
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Certificate, Course, Db, Enrollment, Profile, Track};
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub tracks: u64,
    pub courses: u64,
    pub users: u64,
    pub enrollments: u64,
    pub certificates: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub stats: AdminStats,
}

pub async fn dashboard(db: Db<'_>) -> Result<AdminDashboard, ApiError> {
    let (tracks, courses, users, enrollments, certificates) = futures::try_join!(
        db.count::<Track>(Query::new()),
        db.count::<Course>(Query::new()),
        db.count::<Profile>(Query::new()),
        db.count::<Enrollment>(Query::new()),
        db.count::<Certificate>(Query::new()),
    )?;

    Ok(AdminDashboard {
        stats: AdminStats {
            tracks,
            courses,
            users,
            enrollments,
            certificates,
        },
    })
}

pub fn certificates() -> Placeholder {
    Placeholder {
        title: "Certificados",
        description: "Gerencie os certificados",
        notice: "Em construção",
    }
}

pub fn reports() -> Placeholder {
    Placeholder {
        title: "Relatórios",
        description: "Visualize relatórios",
        notice: "Em construção",
    }
}

pub fn settings() -> Placeholder {
    Placeholder {
        title: "Configurações",
        description: "Configure a plataforma",
        notice: "Em construção",
    }
}

/// Notice texts of one CRUD screen.
pub(crate) struct Messages {
    /// Lowercase entity name used in error prefixes, e.g. "trilha".
    pub noun: &'static str,
    pub created: &'static str,
    pub updated: &'static str,
    pub deleted: &'static str,
}

impl Messages {
    fn outcome(&self, result: Result<(), ApiError>, ok: &'static str, verb: &str) -> Notice {
        match result {
            Ok(()) => Notice::success(ok),
            Err(e) => Notice::failed(&format!("Erro ao {verb} {}: ", self.noun), &e),
        }
    }

    pub fn created(&self, result: Result<(), ApiError>) -> Notice {
        self.outcome(result, self.created, "criar")
    }

    pub fn updated(&self, result: Result<(), ApiError>) -> Notice {
        self.outcome(result, self.updated, "atualizar")
    }

    pub fn deleted(&self, result: Result<(), ApiError>) -> Notice {
        self.outcome(result, self.deleted, "excluir")
    }
}

/// Drops the cached catalog views after a successful catalog change.
pub(crate) fn settle(ctx: &PageCtx<'_>, notice: Notice) -> Notice {
    if notice.is_success() {
        ctx.invalidate(CATALOG);
    }
    notice
}

pub(crate) fn required_title(title: &str) -> Result<String, Notice> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Notice::error("Preencha o título"));
    }
    Ok(title.to_string())
}

/// Title plus slug, deriving the slug from the title unless one was submitted.
pub(crate) fn titled(title: &str, slug: Option<String>) -> Result<(String, String), Notice> {
    let title = required_title(title)?;
    let slug = util::non_blank(slug).unwrap_or_else(|| util::slugify(&title));
    if slug.is_empty() {
        return Err(Notice::error("Preencha o slug"));
    }
    Ok((title, slug))
}

/// Position for a row appended after `count` siblings.
pub(crate) fn next_order_index(count: u64) -> i32 {
    i32::try_from(count).map_or(i32::MAX, |c| c.saturating_add(1))
}
