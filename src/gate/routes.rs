//! Declarative route table
//!
//! Each protected subtree declares who may see it. Lookups pick the longest prefix
//! that matches on a path-segment boundary, so `/admin` covers `/admin/patients`
//! but not `/administration`.

use crate::auth::Role;
use crate::navigation::{self, LOGIN, REGISTER, ROOT, SUPER_ADMIN_LOGIN};

/// Who may see a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Anyone, logged in or not
    Public,
    /// Any authenticated session
    Authenticated,
    /// Authenticated sessions whose role is in the list
    Roles(Vec<Role>),
}

impl Access {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Access::Public | Access::Authenticated => true,
            Access::Roles(roles) => roles.contains(&role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: String,
    pub access: Access,
    /// Where unauthenticated visitors are sent
    pub login_route: &'static str,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, access: Access) -> Self {
        Self {
            prefix: prefix.into(),
            access,
            login_route: LOGIN,
        }
    }

    pub fn with_login_route(mut self, login_route: &'static str) -> Self {
        self.login_route = login_route;
        self
    }

    fn matches(&self, path: &str) -> bool {
        if self.prefix == ROOT {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    fallback: RouteRule,
}

impl RouteTable {
    /// Empty table where every path requires authentication
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: RouteRule::new(ROOT, Access::Authenticated),
        }
    }

    pub fn rule(mut self, rule: RouteRule) -> Self {
        if rule.prefix == ROOT {
            self.fallback = rule;
        } else {
            self.rules.push(rule);
        }
        self
    }

    /// The rule governing `path`
    pub fn rule_for(&self, path: &str) -> &RouteRule {
        let path = navigation::normalize(path);
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.prefix.len())
            .unwrap_or(&self.fallback)
    }

    pub fn rules(&self) -> impl Iterator<Item = &RouteRule> {
        self.rules.iter().chain(std::iter::once(&self.fallback))
    }

    /// The portal's areas: one subtree per staff role
    pub fn clinic_portal() -> Self {
        let area = |prefix: &str, role: Role| RouteRule::new(prefix, Access::Roles(vec![role]));

        RouteTable::new()
            .rule(RouteRule::new(ROOT, Access::Authenticated))
            .rule(RouteRule::new(LOGIN, Access::Public))
            .rule(RouteRule::new(REGISTER, Access::Public))
            .rule(area("/admin", Role::Admin))
            .rule(area("/clinic-manager", Role::ClinicManager))
            .rule(area("/secretary", Role::Secretary))
            .rule(area("/doctor", Role::Doctor))
            .rule(area("/optician", Role::Optician))
            .rule(area("/super-admin", Role::SuperAdmin).with_login_route(SUPER_ADMIN_LOGIN))
            .rule(RouteRule::new(SUPER_ADMIN_LOGIN, Access::Public))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::clinic_portal()
    }
}
