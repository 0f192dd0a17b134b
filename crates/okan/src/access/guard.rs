//! Route guard decision.
//!
//! The decision is a pure function of the session state and the allowed roles so it can be
//! checked exhaustively; the HTTP middleware in `server::middleware` only feeds it resolved state.

use super::role::{Role, RoleSet};

/// Path unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Where the visitor stands when the guard is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Identity or roles are still being resolved.
    Loading,
    Anonymous,
    Authenticated(RoleSet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Nothing decided yet; show a loading indicator instead of redirecting early.
    Pending,
    Render,
    Redirect(&'static str),
}

/// Decides whether a protected page renders for the visitor.
///
/// Authenticated users without any allowed role are sent to the home of their highest held
/// role (admin, mentor, student), or to `/` when they hold none.
pub fn evaluate(session: SessionState, allowed: &[Role]) -> GuardDecision {
    match session {
        SessionState::Loading => GuardDecision::Pending,
        SessionState::Anonymous => GuardDecision::Redirect(LOGIN_PATH),
        SessionState::Authenticated(roles) if roles.intersects(allowed) => GuardDecision::Render,
        SessionState::Authenticated(roles) => GuardDecision::Redirect(roles.home_path()),
    }
}
