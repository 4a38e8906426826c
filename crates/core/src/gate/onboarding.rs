//! "Onboarding complete" derivation
//!
//! The flag has been written under several historical spellings. Any truthy
//! spelling counts; failing that, a completion timestamp counts.

use solace_domain::utils::coerce::{completion_flag, timestamp_present};
use solace_domain::utils::probes::{ONBOARDING_FLAG, ONBOARDING_TIMESTAMP};
use solace_domain::{CanonicalUser, JsonMap};

/// True if any flag spelling in `metadata` is truthy
#[must_use]
pub fn flag_set(metadata: &JsonMap) -> bool {
    ONBOARDING_FLAG.any(metadata, |value| completion_flag(value) == Some(true))
}

/// True if a completion timestamp is recorded in `metadata`
#[must_use]
pub fn timestamp_set(metadata: &JsonMap) -> bool {
    ONBOARDING_TIMESTAMP.any(metadata, timestamp_present)
}

/// Derive completion from the profile columns and every metadata bag
#[must_use]
pub fn onboarding_complete(user: &CanonicalUser) -> bool {
    let profile = &user.profile;
    let bags = [Some(&user.metadata), profile.metadata.as_ref()];

    if profile.onboarding_completed == Some(true) || bags.iter().flatten().any(|bag| flag_set(bag))
    {
        return true;
    }

    profile.onboarding_completed_at.is_some() || bags.iter().flatten().any(|bag| timestamp_set(bag))
}
