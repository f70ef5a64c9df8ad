//! Route access by role
//!
//! All role branching goes through `can_access`; callers never compare
//! roles themselves.

use std::fmt;

use crate::models::Role;

/// Areas of the application a user can open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    /// Statistics and close history
    Dashboard,
    /// Stores, payment methods, users and company settings
    Admin,
    /// The operator's own home page
    Operator,
    NewClose,
    Profile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Admin => "/admin",
            Self::Operator => "/operatore",
            Self::NewClose => "/close/new",
            Self::Profile => "/profile",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Whether a user with `role` may open `route`; `None` means signed out
pub fn can_access(route: Route, role: Option<Role>) -> bool {
    match (route, role) {
        (Route::Login, _) => true,
        (_, None) => false,
        (Route::Dashboard | Route::Admin, Some(role)) => role.is_admin(),
        (Route::Operator, Some(role)) => matches!(role, Role::Operator | Role::SuperAdmin),
        (Route::NewClose | Route::Profile, Some(_)) => true,
    }
}

/// Where to send a user who may not open `route`
pub fn redirect_for(route: Route, role: Option<Role>) -> Option<Route> {
    if can_access(route, role) {
        return None;
    }
    Some(match role {
        None => Route::Login,
        Some(role) => landing(role),
    })
}

/// First page after sign-in
pub fn landing(role: Role) -> Route {
    match role {
        Role::SuperAdmin => Route::Admin,
        Role::Admin => Route::Dashboard,
        Role::Operator => Route::Operator,
    }
}
