//! Sidebar navigation per role.

use serde::Serialize;

use super::role::{Role, RoleSet};
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

const fn link(href: &'static str, label: &'static str, icon: &'static str) -> NavLink {
    NavLink { href, label, icon }
}

pub static STUDENT_LINKS: &[NavLink] = &[
    link("/app", "Início", "layout-dashboard"),
    link("/app/cursos", "Meus Cursos", "book-open"),
    link("/app/trilhas", "Explorar Trilhas", "folder-open"),
    link("/app/certificados", "Certificados", "award"),
    link("/app/comunidade", "Comunidade", "message-square"),
];

pub static MENTOR_LINKS: &[NavLink] = &[
    link("/mentor", "Dashboard", "layout-dashboard"),
    link("/mentor/cursos", "Meus Cursos", "book-open"),
    link("/mentor/alunos", "Meus Alunos", "users"),
    link("/mentor/discussoes", "Discussões", "message-square"),
    link("/mentor/analytics", "Analytics", "bar-chart-3"),
];

pub static ADMIN_LINKS: &[NavLink] = &[
    link("/admin", "Dashboard", "layout-dashboard"),
    link("/admin/trilhas", "Trilhas", "folder-open"),
    link("/admin/cursos", "Cursos", "book-open"),
    link("/admin/aulas", "Aulas", "play"),
    link("/admin/usuarios", "Usuários", "user-cog"),
    link("/admin/certificados", "Certificados", "graduation-cap"),
    link("/admin/relatorios", "Relatórios", "file-text"),
    link("/admin/configuracoes", "Configurações", "settings"),
];

fn section_for(role: Role) -> (&'static str, &'static [NavLink]) {
    match role {
        Role::Student => ("Aluna", STUDENT_LINKS),
        Role::Mentor => ("Mentor", MENTOR_LINKS),
        Role::Admin => ("Administração", ADMIN_LINKS),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavSection {
    pub role: Role,
    pub label: &'static str,
    pub links: Vec<NavItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMenu {
    pub display_name: String,
    pub initials: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Everything the application shell shows around an authenticated page.
#[derive(Debug, Clone, Serialize)]
pub struct NavShell {
    pub sections: Vec<NavSection>,
    pub user: UserMenu,
}

/// Sidebar sections for the held roles, student first and admin last, with the link for
/// `current_path` marked active.
pub fn sections(roles: RoleSet, current_path: &str) -> Vec<NavSection> {
    roles
        .iter()
        .map(|role| {
            let (label, links) = section_for(role);
            NavSection {
                role,
                label,
                links: links
                    .iter()
                    .map(|l| NavItem {
                        href: l.href,
                        label: l.label,
                        icon: l.icon,
                        active: l.href == current_path,
                    })
                    .collect(),
            }
        })
        .collect()
}

pub fn user_menu(
    full_name: Option<&str>,
    email: Option<&str>,
    avatar_url: Option<&str>,
) -> UserMenu {
    let display_name = full_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Usuário")
        .to_string();

    UserMenu {
        display_name,
        initials: util::initials(full_name),
        email: email.map(str::to_string),
        avatar_url: avatar_url.map(str::to_string),
    }
}
