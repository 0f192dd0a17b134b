//! Static route table.
//!
//! Every page the service renders is listed here with the roles allowed to see it. The router
//! registers its GET handlers from this table and the guard middleware looks requests up in it,
//! so a page cannot be served without its access rule.

use serde::Serialize;

use super::role::Role;

/// Roles allowed into `/app/*`.
pub const STUDENT_AREA: &[Role] = &[Role::Student, Role::Mentor, Role::Admin];
/// Roles allowed into `/mentor/*`.
pub const MENTOR_AREA: &[Role] = &[Role::Mentor, Role::Admin];
/// Roles allowed into `/admin/*`.
pub const ADMIN_AREA: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Landing,
    TrackCatalog,
    TrackDetail,
    CourseDetail,
    Login,
    About,
    Application,
    StudentDashboard,
    StudentCourses,
    CourseView,
    LessonPlayer,
    StudentTracks,
    StudentCertificates,
    StudentCommunity,
    MentorDashboard,
    MentorCourses,
    MentorStudents,
    MentorDiscussions,
    MentorAnalytics,
    AdminDashboard,
    AdminTracks,
    AdminCourses,
    AdminModules,
    AdminLessons,
    AdminLessonIndex,
    AdminUsers,
    AdminCertificates,
    AdminReports,
    AdminSettings,
}

#[derive(Debug)]
pub struct RouteSpec {
    /// Path pattern; `:name` segments capture a parameter.
    pub pattern: &'static str,
    pub page: Page,
    pub title: &'static str,
    /// `None` for public pages.
    pub allowed: Option<&'static [Role]>,
}

const fn public(pattern: &'static str, page: Page, title: &'static str) -> RouteSpec {
    RouteSpec {
        pattern,
        page,
        title,
        allowed: None,
    }
}

const fn guarded(
    pattern: &'static str,
    page: Page,
    title: &'static str,
    allowed: &'static [Role],
) -> RouteSpec {
    RouteSpec {
        pattern,
        page,
        title,
        allowed: Some(allowed),
    }
}

pub static ROUTES: &[RouteSpec] = &[
    public("/", Page::Landing, "Okan"),
    public("/trilhas", Page::TrackCatalog, "Trilhas"),
    public("/trilhas/:track_slug", Page::TrackDetail, "Trilha"),
    public(
        "/trilhas/:track_slug/cursos/:course_slug",
        Page::CourseDetail,
        "Curso",
    ),
    public("/login", Page::Login, "Entrar"),
    public("/sobre", Page::About, "Sobre"),
    public("/inscricao", Page::Application, "Inscrição"),
    guarded("/app", Page::StudentDashboard, "Dashboard", STUDENT_AREA),
    guarded("/app/cursos", Page::StudentCourses, "Meus Cursos", STUDENT_AREA),
    guarded("/app/cursos/:course_slug", Page::CourseView, "Curso", STUDENT_AREA),
    guarded(
        "/app/cursos/:course_slug/aula/:lesson_id",
        Page::LessonPlayer,
        "Aula",
        STUDENT_AREA,
    ),
    guarded("/app/trilhas", Page::StudentTracks, "Explorar Trilhas", STUDENT_AREA),
    guarded(
        "/app/certificados",
        Page::StudentCertificates,
        "Certificados",
        STUDENT_AREA,
    ),
    guarded("/app/comunidade", Page::StudentCommunity, "Comunidade", STUDENT_AREA),
    guarded("/mentor", Page::MentorDashboard, "Dashboard do Mentor", MENTOR_AREA),
    guarded("/mentor/cursos", Page::MentorCourses, "Meus Cursos", MENTOR_AREA),
    guarded("/mentor/alunos", Page::MentorStudents, "Meus Alunos", MENTOR_AREA),
    guarded(
        "/mentor/discussoes",
        Page::MentorDiscussions,
        "Discussões",
        MENTOR_AREA,
    ),
    guarded("/mentor/analytics", Page::MentorAnalytics, "Analytics", MENTOR_AREA),
    guarded("/admin", Page::AdminDashboard, "Dashboard", ADMIN_AREA),
    guarded("/admin/trilhas", Page::AdminTracks, "Trilhas", ADMIN_AREA),
    guarded("/admin/cursos", Page::AdminCourses, "Cursos", ADMIN_AREA),
    guarded(
        "/admin/cursos/:course_id/modulos",
        Page::AdminModules,
        "Módulos",
        ADMIN_AREA,
    ),
    guarded(
        "/admin/modulos/:module_id/aulas",
        Page::AdminLessons,
        "Aulas",
        ADMIN_AREA,
    ),
    guarded("/admin/aulas", Page::AdminLessonIndex, "Aulas", ADMIN_AREA),
    guarded("/admin/usuarios", Page::AdminUsers, "Usuários", ADMIN_AREA),
    guarded(
        "/admin/certificados",
        Page::AdminCertificates,
        "Certificados",
        ADMIN_AREA,
    ),
    guarded("/admin/relatorios", Page::AdminReports, "Relatórios", ADMIN_AREA),
    guarded(
        "/admin/configuracoes",
        Page::AdminSettings,
        "Configurações",
        ADMIN_AREA,
    ),
];

/// Legacy paths that permanently point elsewhere.
pub static REDIRECTS: &[(&str, &str)] = &[("/dashboard", "/app")];

/// A route table hit with its captured parameters.
#[derive(Debug)]
pub struct RouteMatch<'p> {
    pub route: &'static RouteSpec,
    pub params: Vec<(&'static str, &'p str)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn match_pattern<'p>(pattern: &'static str, path: &'p str) -> Option<Vec<(&'static str, &'p str)>> {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = Vec::new();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    if actual.is_empty() {
                        return None;
                    }
                    params.push((name, actual));
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

/// Looks a request path up in the route table.
pub fn match_path(path: &str) -> Option<RouteMatch<'_>> {
    let path = normalize(path);
    ROUTES.iter().find_map(|route| {
        match_pattern(route.pattern, path).map(|params| RouteMatch { route, params })
    })
}

/// Target of a legacy redirect, if `path` is one.
pub fn redirect_for(path: &str) -> Option<&'static str> {
    let path = normalize(path);
    REDIRECTS
        .iter()
        .find(|(from, _)| *from == path)
        .map(|(_, to)| *to)
}

fn in_area(path: &str, area: &str) -> bool {
    path == area
        || path
            .strip_prefix(area)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Roles allowed to reach `path`, or `None` when it is public.
///
/// Paths in the table use their own rule; anything else under an area prefix (form posts and
/// deletes such as `/admin/trilhas/:track_id`) inherits the area's rule.
pub fn allowed_roles(path: &str) -> Option<&'static [Role]> {
    if let Some(hit) = match_path(path) {
        return hit.route.allowed;
    }

    let path = normalize(path);
    if in_area(path, "/admin") {
        Some(ADMIN_AREA)
    } else if in_area(path, "/mentor") {
        Some(MENTOR_AREA)
    } else if in_area(path, "/app") {
        Some(STUDENT_AREA)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_static_and_params() {
        let hit = match_path("/trilhas").unwrap();
        assert_eq!(hit.route.page, Page::TrackCatalog);
        assert!(hit.params.is_empty());

        let hit = match_path("/trilhas/front-end/cursos/html-basico").unwrap();
        assert_eq!(hit.route.page, Page::CourseDetail);
        assert_eq!(hit.param("track_slug"), Some("front-end"));
        assert_eq!(hit.param("course_slug"), Some("html-basico"));

        let hit = match_path("/app/cursos/html-basico/aula/42/").unwrap();
        assert_eq!(hit.route.page, Page::LessonPlayer);
        assert_eq!(hit.param("lesson_id"), Some("42"));

        assert!(match_path("/trilhas/a/b").is_none());
        assert!(match_path("/nao-existe").is_none());
        assert_eq!(match_path("/?x=1").unwrap().route.page, Page::Landing);
    }

    #[test]
    fn test_allowed_roles_per_area() {
        assert_eq!(allowed_roles("/"), None);
        assert_eq!(allowed_roles("/trilhas/front-end"), None);
        assert_eq!(allowed_roles("/app"), Some(STUDENT_AREA));
        assert_eq!(allowed_roles("/app/certificados"), Some(STUDENT_AREA));
        assert_eq!(allowed_roles("/mentor/analytics"), Some(MENTOR_AREA));
        assert_eq!(allowed_roles("/admin/usuarios"), Some(ADMIN_AREA));

        // Not page routes, but still inside a guarded area.
        assert_eq!(allowed_roles("/admin/trilhas/123"), Some(ADMIN_AREA));
        assert_eq!(
            allowed_roles("/app/cursos/html/aula/1/concluir"),
            Some(STUDENT_AREA)
        );
        assert_eq!(allowed_roles("/administrator"), None);
        assert_eq!(allowed_roles("/apple"), None);
    }

    #[test]
    fn test_every_protected_route_lives_in_its_area() {
        for route in ROUTES {
            let expected = if in_area(route.pattern, "/admin") {
                Some(ADMIN_AREA)
            } else if in_area(route.pattern, "/mentor") {
                Some(MENTOR_AREA)
            } else if in_area(route.pattern, "/app") {
                Some(STUDENT_AREA)
            } else {
                None
            };
            assert_eq!(route.allowed, expected, "{}", route.pattern);
        }
    }

    #[test]
    fn test_legacy_redirects() {
        assert_eq!(redirect_for("/dashboard"), Some("/app"));
        assert_eq!(redirect_for("/dashboard/"), Some("/app"));
        assert_eq!(redirect_for("/app"), None);
    }
}
