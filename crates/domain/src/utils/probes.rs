//! Named accessors over legacy metadata spellings
//!
//! Several attributes have been written under different keys over time
//! (`contactPhone` vs `contact_phone`, a nested `onboarding.completed`, ...).
//! Each accessor is an ordered list of extraction rules; the first rule
//! whose value coerces wins.

use serde_json::Value;

use crate::types::JsonMap;

/// One extraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Top-level key
    Key(&'static str),
    /// `outer.inner`, where `outer` is an object
    Nested(&'static str, &'static str),
}

impl Rule {
    fn lookup<'a>(&self, bag: &'a JsonMap) -> Option<&'a Value> {
        let value = match *self {
            Self::Key(key) => bag.get(key),
            Self::Nested(outer, inner) => bag.get(outer)?.as_object()?.get(inner),
        }?;
        (!value.is_null()).then_some(value)
    }
}

/// Ordered set of rules for a single attribute
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub name: &'static str,
    rules: &'static [Rule],
}

impl Probe {
    #[must_use]
    pub const fn new(name: &'static str, rules: &'static [Rule]) -> Self {
        Self { name, rules }
    }

    /// Non-null values in rule order
    pub fn values<'a>(&'a self, bag: &'a JsonMap) -> impl Iterator<Item = &'a Value> + 'a {
        self.rules.iter().filter_map(move |rule| rule.lookup(bag))
    }

    /// First value that `coerce` accepts
    pub fn first<T>(&self, bag: &JsonMap, coerce: impl Fn(&Value) -> Option<T>) -> Option<T> {
        self.values(bag).find_map(coerce)
    }

    /// True if any spelling satisfies `predicate`
    pub fn any(&self, bag: &JsonMap, predicate: impl Fn(&Value) -> bool) -> bool {
        self.values(bag).any(predicate)
    }
}

use Rule::{Key, Nested};

pub const FULL_NAME: Probe =
    Probe::new("full_name", &[Key("full_name"), Key("fullName"), Key("name"), Key("display_name")]);

pub const PROFESSIONAL_TITLE: Probe = Probe::new(
    "professional_title",
    &[Key("professional_title"), Key("professionalTitle"), Key("title")],
);

pub const AVATAR_URL: Probe =
    Probe::new("avatar_url", &[Key("avatar_url"), Key("avatarUrl"), Key("picture")]);

pub const ROLE: Probe = Probe::new("role", &[Key("role"), Key("user_role"), Key("userRole")]);

pub const AVAILABILITY: Probe = Probe::new("availability", &[Key("availability")]);

pub const SPECIALTY: Probe =
    Probe::new("specialty", &[Key("specialty"), Key("specialization"), Key("specialisation")]);

pub const YEARS_EXPERIENCE: Probe = Probe::new(
    "years_experience",
    &[Key("years_experience"), Key("yearsExperience"), Key("experience_years")],
);

pub const PREFERRED_LANGUAGE: Probe = Probe::new(
    "preferred_language",
    &[Key("preferred_language"), Key("preferredLanguage"), Key("language")],
);

pub const TREATMENT_STAGE: Probe =
    Probe::new("treatment_stage", &[Key("treatment_stage"), Key("treatmentStage")]);

pub const CONTACT_PHONE: Probe = Probe::new(
    "phone",
    &[Key("contactPhone"), Key("contact_phone"), Key("phoneNumber"), Key("phone")],
);

pub const EMERGENCY_CONTACT_NAME: Probe = Probe::new(
    "emergency_contact_name",
    &[
        Key("emergency_contact_name"),
        Key("emergencyContactName"),
        Nested("emergency_contact", "name"),
        Nested("emergencyContact", "name"),
    ],
);

pub const EMERGENCY_CONTACT_PHONE: Probe = Probe::new(
    "emergency_contact_phone",
    &[
        Key("emergency_contact_phone"),
        Key("emergencyContactPhone"),
        Nested("emergency_contact", "phone"),
        Nested("emergencyContact", "phone"),
    ],
);

pub const NOTIFICATION_PREFERENCES: Probe = Probe::new(
    "notification_preferences",
    &[Key("notification_preferences"), Key("notificationPreferences")],
);

pub const SECURITY_PREFERENCES: Probe = Probe::new(
    "security_preferences",
    &[Key("security_preferences"), Key("securityPreferences")],
);

pub const SUPPORT_PREFERENCES: Probe = Probe::new(
    "support_preferences",
    &[Key("support_preferences"), Key("supportPreferences")],
);

pub const ONBOARDING_FLAG: Probe = Probe::new(
    "onboarding_completed",
    &[
        Key("onboarding_completed"),
        Key("onboardingCompleted"),
        Key("onboarding_complete"),
        Key("has_completed_onboarding"),
        Nested("onboarding", "completed"),
        Nested("onboarding", "isComplete"),
        Nested("onboarding", "is_completed"),
    ],
);

pub const ONBOARDING_TIMESTAMP: Probe = Probe::new(
    "onboarding_completed_at",
    &[
        Key("onboarding_completed_at"),
        Key("onboardingCompletedAt"),
        Nested("onboarding", "completed_at"),
        Nested("onboarding", "completedAt"),
    ],
);
