//! Role-based access: roles, the route table, the guard decision and the navigation shell.

pub mod guard;
pub mod nav;
pub mod resolver;
pub mod role;
pub mod routes;

pub use guard::{evaluate, GuardDecision, SessionState, LOGIN_PATH};
pub use resolver::RoleResolver;
pub use role::{Role, RoleSet};
pub use routes::{allowed_roles, match_path, Page, RouteSpec, ROUTES};
