//! Path classification

use solace_domain::constants::{AUTH_CALLBACK_PATH, AUTH_PREFIX, DASHBOARD_PREFIX, ONBOARDING_PREFIX};
use solace_domain::Role;

/// Route family of a path
///
/// Onboarding and dashboard routes carry the role segment when it names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Public,
    Auth,
    Callback,
    Onboarding(Option<Role>),
    Dashboard(Option<Role>),
}

impl PathClass {
    /// Dashboard and onboarding routes require authentication
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Onboarding(_) | Self::Dashboard(_))
    }
}

fn under<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

fn role_segment(rest: &str) -> Option<Role> {
    rest.trim_start_matches('/').split('/').next().and_then(Role::parse)
}

/// Classify a path, ignoring query, fragment and trailing slashes
#[must_use]
pub fn classify(path: &str) -> PathClass {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };

    if under(path, AUTH_CALLBACK_PATH).is_some() {
        PathClass::Callback
    } else if under(path, AUTH_PREFIX).is_some() {
        PathClass::Auth
    } else if let Some(rest) = under(path, ONBOARDING_PREFIX) {
        PathClass::Onboarding(role_segment(rest))
    } else if let Some(rest) = under(path, DASHBOARD_PREFIX) {
        PathClass::Dashboard(role_segment(rest))
    } else {
        PathClass::Public
    }
}
