//! Navigation Tree: the static mapping of URL paths to role scopes and pages.

use crate::types::Role;

/// Role requirement attached to a path-prefix subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteScope {
    pub prefix: &'static str,
    pub role: Role,
}

impl RouteScope {
    /// Where unauthenticated visitors of this subtree are sent.
    #[must_use]
    pub fn login_path(&self) -> &'static str {
        self.role.login_path()
    }
}

pub const ADMINISTRATOR_SCOPE: RouteScope = RouteScope {
    prefix: "/administrator",
    role: Role::Administrator,
};
pub const ADMIN_SCOPE: RouteScope = RouteScope {
    prefix: "/admin",
    role: Role::Admin,
};
pub const USER_SCOPE: RouteScope = RouteScope {
    prefix: "/user",
    role: Role::User,
};

pub const SCOPES: &[RouteScope] = &[ADMINISTRATOR_SCOPE, ADMIN_SCOPE, USER_SCOPE];

/// Page a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login(Role),
    Dashboard(Role),
    Accounts,
    PermissionGroups,
    Regulations,
    Flights,
    Airports,
    Bookings,
    FlightSearch,
    MyBookings,
    Profile,
}

/// One entry of the navigation table. `scope: None` is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub scope: Option<RouteScope>,
    pub page: Page,
}

const fn public(path: &'static str, page: Page) -> Route {
    Route {
        path,
        scope: None,
        page,
    }
}

const fn scoped(scope: RouteScope, path: &'static str, page: Page) -> Route {
    Route {
        path,
        scope: Some(scope),
        page,
    }
}

pub const NAVIGATION: &[Route] = &[
    public("/", Page::Home),
    public("/administrator/login", Page::Login(Role::Administrator)),
    scoped(ADMINISTRATOR_SCOPE, "/administrator", Page::Dashboard(Role::Administrator)),
    scoped(ADMINISTRATOR_SCOPE, "/administrator/accounts", Page::Accounts),
    scoped(ADMINISTRATOR_SCOPE, "/administrator/permission-groups", Page::PermissionGroups),
    scoped(ADMINISTRATOR_SCOPE, "/administrator/regulations", Page::Regulations),
    public("/admin/login", Page::Login(Role::Admin)),
    scoped(ADMIN_SCOPE, "/admin", Page::Dashboard(Role::Admin)),
    scoped(ADMIN_SCOPE, "/admin/flights", Page::Flights),
    scoped(ADMIN_SCOPE, "/admin/airports", Page::Airports),
    scoped(ADMIN_SCOPE, "/admin/bookings", Page::Bookings),
    public("/user/login", Page::Login(Role::User)),
    scoped(USER_SCOPE, "/user", Page::Dashboard(Role::User)),
    scoped(USER_SCOPE, "/user/flights", Page::FlightSearch),
    scoped(USER_SCOPE, "/user/bookings", Page::MyBookings),
    scoped(USER_SCOPE, "/user/profile", Page::Profile),
];

/// Strip query, fragment and trailing slashes. The root stays `/`.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// `prefix` matches `path` itself or any path below it, on segment boundaries.
fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Route for `path`: the entry with the longest matching prefix.
///
/// Nested paths without their own entry (`/admin/flights/42`) resolve to
/// their nearest ancestor page.
#[must_use]
pub fn resolve(path: &str) -> Option<&'static Route> {
    let path = normalize(path);
    NAVIGATION
        .iter()
        .filter(|r| covers(r.path, path))
        .max_by_key(|r| r.path.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_paths_are_unique() {
        let mut paths: Vec<_> = NAVIGATION.iter().map(|r| r.path).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), NAVIGATION.len());
    }

    #[test]
    fn scoped_routes_live_under_their_prefix() {
        for route in NAVIGATION {
            if let Some(scope) = route.scope {
                assert!(covers(scope.prefix, route.path), "{}", route.path);
            }
        }
    }

    #[test]
    fn login_pages_are_public() {
        for role in Role::ALL {
            let route = resolve(role.login_path()).unwrap();
            assert_eq!(route.page, Page::Login(role));
            assert_eq!(route.scope, None);
        }
    }

    fn scope_of(path: &str) -> Option<RouteScope> {
        resolve(path).and_then(|r| r.scope)
    }

    #[test]
    fn admin_prefix_does_not_capture_administrator() {
        assert_eq!(scope_of("/administrator/accounts"), Some(ADMINISTRATOR_SCOPE));
        assert_eq!(scope_of("/admin/flights"), Some(ADMIN_SCOPE));
        assert_eq!(scope_of("/adminx"), None);
        assert_eq!(resolve("/adminx").map(|r| r.page), None);
    }

    #[test]
    fn nested_paths_resolve_to_nearest_page() {
        assert_eq!(resolve("/admin/flights/42/edit").unwrap().page, Page::Flights);
        assert_eq!(resolve("/admin/unknown").unwrap().page, Page::Dashboard(Role::Admin));
    }

    #[test]
    fn query_fragment_and_trailing_slash_ignored() {
        assert_eq!(resolve("/user/bookings/?page=2").unwrap().page, Page::MyBookings);
        assert_eq!(resolve("/user/profile#email").unwrap().page, Page::Profile);
        assert_eq!(resolve("").unwrap().page, Page::Home);
    }

    #[test]
    fn root_only_matches_itself() {
        assert_eq!(resolve("/").unwrap().page, Page::Home);
        assert!(resolve("/movies").is_none());
        assert_eq!(scope_of("/"), None);
    }
}
