//! Closed role set and its fixed route table

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::HOME_PATH;
use crate::impl_wire_conversions;

/// Application role
///
/// `Guest` is the sentinel for "no profile row yet" and is never privileged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    Patient,
    Counselor,
    Admin,
    #[default]
    Guest,
}

impl_wire_conversions!(Role {
    Patient => "patient",
    Counselor => "counselor",
    Admin => "admin",
    Guest => "guest",
});

impl Role {
    /// Whitelist parse; anything outside the closed set is `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        value.parse().ok()
    }

    /// Landing route for an authenticated user of this role
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::Patient => "/dashboard/patient",
            Self::Counselor => "/dashboard/counselor",
            Self::Admin => "/dashboard/admin",
            Self::Guest => HOME_PATH,
        }
    }

    /// Onboarding route, for roles that have one
    #[must_use]
    pub const fn onboarding_path(self) -> Option<&'static str> {
        match self {
            Self::Patient => Some("/onboarding/patient"),
            Self::Counselor => Some("/onboarding/counselor"),
            Self::Admin | Self::Guest => None,
        }
    }

    #[must_use]
    pub const fn requires_onboarding(self) -> bool {
        self.onboarding_path().is_some()
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Unknown strings deserialize to `Guest` rather than failing the whole row
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}
