//! Route decision table

use solace_domain::constants::SIGN_IN_PATH;
use solace_domain::Role;

use super::routes::PathClass;

/// What to do with a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    Allow,
    RedirectToSignIn,
    RedirectToOnboarding(&'static str),
    RedirectToDashboard(&'static str),
}

impl GateAction {
    /// Redirect target, if any
    #[must_use]
    pub const fn target(self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectToSignIn => Some(SIGN_IN_PATH),
            Self::RedirectToOnboarding(path) | Self::RedirectToDashboard(path) => Some(path),
        }
    }
}

/// Inputs to one gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateInput {
    pub authenticated: bool,
    pub role: Role,
    pub onboarding_complete: bool,
    pub path: PathClass,
}

/// Resolve the action for a navigation
///
/// Dashboard sub-paths that name a different role are left to the
/// dashboard itself.
#[must_use]
pub fn decide(input: GateInput) -> GateAction {
    if !input.authenticated {
        return if input.path.is_protected() {
            GateAction::RedirectToSignIn
        } else {
            GateAction::Allow
        };
    }

    let Some(onboarding) = input.role.onboarding_path() else {
        return GateAction::Allow;
    };

    if input.onboarding_complete {
        return match input.path {
            PathClass::Auth | PathClass::Onboarding(_) => {
                GateAction::RedirectToDashboard(input.role.dashboard_path())
            }
            PathClass::Public | PathClass::Callback | PathClass::Dashboard(_) => GateAction::Allow,
        };
    }

    match input.path {
        PathClass::Onboarding(Some(role)) if role == input.role => GateAction::Allow,
        PathClass::Public | PathClass::Callback => GateAction::Allow,
        PathClass::Auth | PathClass::Onboarding(_) | PathClass::Dashboard(_) => {
            GateAction::RedirectToOnboarding(onboarding)
        }
    }
}

/// Where an authenticated user lands after sign-in
#[must_use]
pub fn landing_path(role: Role, onboarding_complete: bool) -> &'static str {
    match role.onboarding_path() {
        Some(onboarding) if !onboarding_complete => onboarding,
        _ => role.dashboard_path(),
    }
}
