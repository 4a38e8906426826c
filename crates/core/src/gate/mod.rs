//! Onboarding gate: pure route-protection decisions

pub mod decision;
pub mod onboarding;
pub mod routes;

pub use decision::{decide, landing_path, GateAction, GateInput};
pub use onboarding::onboarding_complete;
pub use routes::{classify, PathClass};

use solace_domain::{CanonicalUser, Role};

/// Evaluate the gate for an optional user at `path`
#[must_use]
pub fn evaluate(user: Option<&CanonicalUser>, path: &str) -> GateAction {
    let path = classify(path);
    match user {
        Some(user) => decide(GateInput {
            authenticated: true,
            role: user.role,
            onboarding_complete: onboarding_complete(user),
            path,
        }),
        None => decide(GateInput {
            authenticated: false,
            role: Role::Guest,
            onboarding_complete: false,
            path,
        }),
    }
}
