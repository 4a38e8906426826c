//! `profiles` row, caller overrides, and provider-derived hints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;
use super::JsonMap;
use crate::impl_wire_conversions;
use crate::utils::coerce::{self, lenient};
use crate::utils::probes;

/// Counselor approval state
///
/// Transitions are decided elsewhere; this crate only stores and surfaces
/// the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    NeedsMoreInfo,
    Suspended,
}

impl_wire_conversions!(ApprovalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    NeedsMoreInfo => "needs_more_info",
    Suspended => "suspended",
});

/// Which profile sections other users may see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilitySettings {
    pub profile_visible: bool,
    pub show_contact_info: bool,
    pub show_availability: bool,
    /// Keys written by newer clients are carried through untouched
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            profile_visible: true,
            show_contact_info: false,
            show_availability: true,
            extra: JsonMap::new(),
        }
    }
}

/// One row of the `profiles` table
///
/// Every column is optional: rows are created lazily and older rows predate
/// most columns. Legacy encodings are normalised on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRow {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub professional_title: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub availability: Option<String>,
    pub specialty: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub years_experience: Option<i64>,
    pub preferred_language: Option<String>,
    pub treatment_stage: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notification_preferences: Option<JsonMap>,
    pub security_preferences: Option<JsonMap>,
    pub support_preferences: Option<JsonMap>,
    pub metadata: Option<JsonMap>,
    pub visibility_settings: Option<VisibilitySettings>,
    #[serde(deserialize_with = "lenient::parsed")]
    pub approval_status: Option<ApprovalStatus>,
    pub approval_submitted_at: Option<DateTime<Utc>>,
    pub approval_reviewed_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub onboarding_completed: Option<bool>,
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileRow {
    /// Empty row for `id`, used before anything is known
    pub fn empty(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    /// Stored metadata, or an empty bag
    #[must_use]
    pub fn metadata_or_empty(&self) -> JsonMap {
        self.metadata.clone().unwrap_or_default()
    }
}

/// Caller-supplied values for one write
///
/// `None` means "not supplied", never "clear". `metadata` is merged into the
/// stored bag key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub professional_title: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub availability: Option<String>,
    pub specialty: Option<String>,
    pub years_experience: Option<i64>,
    pub preferred_language: Option<String>,
    pub treatment_stage: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notification_preferences: Option<JsonMap>,
    pub security_preferences: Option<JsonMap>,
    pub support_preferences: Option<JsonMap>,
    pub metadata: JsonMap,
    pub visibility_settings: Option<VisibilitySettings>,
    pub approval_status: Option<ApprovalStatus>,
    pub approval_submitted_at: Option<DateTime<Utc>>,
    pub approval_reviewed_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub onboarding_completed: Option<bool>,
    pub onboarding_completed_at: Option<DateTime<Utc>>,
}

impl ProfileUpdate {
    /// Override that only changes the role
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        Self { role: Some(role), ..Self::default() }
    }

    /// Override that stamps onboarding completion
    #[must_use]
    pub fn completing_onboarding(at: DateTime<Utc>) -> Self {
        Self {
            onboarding_completed: Some(true),
            onboarding_completed_at: Some(at),
            ..Self::default()
        }
    }

    /// Layer `other` on top of `self`; supplied fields in `other` win
    #[must_use]
    pub fn merged_with(mut self, other: Self) -> Self {
        overlay(&mut self.email, other.email);
        overlay(&mut self.full_name, other.full_name);
        overlay(&mut self.professional_title, other.professional_title);
        overlay(&mut self.avatar_url, other.avatar_url);
        overlay(&mut self.role, other.role);
        overlay(&mut self.availability, other.availability);
        overlay(&mut self.specialty, other.specialty);
        overlay(&mut self.years_experience, other.years_experience);
        overlay(&mut self.preferred_language, other.preferred_language);
        overlay(&mut self.treatment_stage, other.treatment_stage);
        overlay(&mut self.phone, other.phone);
        overlay(&mut self.emergency_contact_name, other.emergency_contact_name);
        overlay(&mut self.emergency_contact_phone, other.emergency_contact_phone);
        overlay(&mut self.notification_preferences, other.notification_preferences);
        overlay(&mut self.security_preferences, other.security_preferences);
        overlay(&mut self.support_preferences, other.support_preferences);
        overlay(&mut self.visibility_settings, other.visibility_settings);
        overlay(&mut self.approval_status, other.approval_status);
        overlay(&mut self.approval_submitted_at, other.approval_submitted_at);
        overlay(&mut self.approval_reviewed_at, other.approval_reviewed_at);
        overlay(&mut self.approval_notes, other.approval_notes);
        overlay(&mut self.onboarding_completed, other.onboarding_completed);
        overlay(&mut self.onboarding_completed_at, other.onboarding_completed_at);
        self.metadata.extend(other.metadata);
        self
    }
}

fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Typed view of provider-declared metadata
///
/// Built once per reconciliation through the legacy-spelling probes. These
/// values are fallbacks only: they never replace a populated stored column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderHints {
    pub full_name: Option<String>,
    pub professional_title: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub availability: Option<String>,
    pub specialty: Option<String>,
    pub years_experience: Option<i64>,
    pub preferred_language: Option<String>,
    pub treatment_stage: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notification_preferences: Option<JsonMap>,
    pub security_preferences: Option<JsonMap>,
    pub support_preferences: Option<JsonMap>,
    /// Raw bag, merged under stored metadata
    pub metadata: JsonMap,
}

impl ProviderHints {
    #[must_use]
    pub fn from_metadata(metadata: &JsonMap) -> Self {
        let text = |probe: probes::Probe| probe.first(metadata, coerce::non_empty_string);
        let record = |probe: probes::Probe| {
            probe.first(metadata, coerce::plain_record).filter(|bag| !bag.is_empty())
        };

        Self {
            full_name: text(probes::FULL_NAME),
            professional_title: text(probes::PROFESSIONAL_TITLE),
            avatar_url: text(probes::AVATAR_URL),
            // Self-declared metadata never grants admin
            role: probes::ROLE
                .first(metadata, coerce::known_role)
                .filter(|role| *role != Role::Admin),
            availability: text(probes::AVAILABILITY),
            specialty: text(probes::SPECIALTY),
            years_experience: probes::YEARS_EXPERIENCE.first(metadata, coerce::whole_number),
            preferred_language: text(probes::PREFERRED_LANGUAGE),
            treatment_stage: text(probes::TREATMENT_STAGE),
            phone: text(probes::CONTACT_PHONE),
            emergency_contact_name: text(probes::EMERGENCY_CONTACT_NAME),
            emergency_contact_phone: text(probes::EMERGENCY_CONTACT_PHONE),
            notification_preferences: record(probes::NOTIFICATION_PREFERENCES),
            security_preferences: record(probes::SECURITY_PREFERENCES),
            support_preferences: record(probes::SUPPORT_PREFERENCES),
            metadata: metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn legacy_column_encodings_are_normalised() {
        let row: ProfileRow = serde_json::from_value(json!({
            "id": "p1",
            "role": "Counselor",
            "years_experience": "8",
            "approval_status": "needs_more_info",
            "onboarding_completed": "yes",
            "unknown_column": 1
        }))
        .unwrap();

        assert_eq!(row.role, Some(Role::Counselor));
        assert_eq!(row.years_experience, Some(8));
        assert_eq!(row.approval_status, Some(ApprovalStatus::NeedsMoreInfo));
        assert_eq!(row.onboarding_completed, Some(true));
    }

    #[test]
    fn unknown_approval_status_reads_as_absent() {
        let row: ProfileRow =
            serde_json::from_value(json!({ "id": "p1", "approval_status": "limbo" })).unwrap();
        assert_eq!(row.approval_status, None);
    }

    #[test]
    fn visibility_keeps_unknown_keys() {
        let settings: VisibilitySettings =
            serde_json::from_value(json!({ "show_contact_info": true, "show_rates": false }))
                .unwrap();
        assert!(settings.show_contact_info);
        assert!(settings.profile_visible);
        assert_eq!(settings.extra["show_rates"], false);
    }

    #[test]
    fn provider_hints_probe_legacy_spellings() {
        let metadata = json!({
            "fullName": "Dana Reyes",
            "phoneNumber": "555-0101",
            "role": "counselor",
            "yearsExperience": "6",
            "notificationPreferences": { "email": true },
            "security_preferences": {}
        });
        let hints = ProviderHints::from_metadata(metadata.as_object().unwrap());

        assert_eq!(hints.full_name.as_deref(), Some("Dana Reyes"));
        assert_eq!(hints.phone.as_deref(), Some("555-0101"));
        assert_eq!(hints.role, Some(Role::Counselor));
        assert_eq!(hints.years_experience, Some(6));
        assert!(hints.notification_preferences.is_some());
        assert_eq!(hints.security_preferences, None);
    }

    #[test]
    fn provider_metadata_cannot_claim_admin() {
        let metadata = json!({ "role": "admin" });
        let hints = ProviderHints::from_metadata(metadata.as_object().unwrap());
        assert_eq!(hints.role, None);
    }

    #[test]
    fn later_update_wins_and_metadata_unions() {
        let first = ProfileUpdate {
            full_name: Some("A".into()),
            phone: Some("1".into()),
            metadata: json!({ "a": 1 }).as_object().cloned().unwrap(),
            ..ProfileUpdate::default()
        };
        let second = ProfileUpdate {
            full_name: Some("B".into()),
            metadata: json!({ "b": 2 }).as_object().cloned().unwrap(),
            ..ProfileUpdate::default()
        };

        let merged = first.merged_with(second);
        assert_eq!(merged.full_name.as_deref(), Some("B"));
        assert_eq!(merged.phone.as_deref(), Some("1"));
        assert_eq!(merged.metadata.len(), 2);
    }
}
