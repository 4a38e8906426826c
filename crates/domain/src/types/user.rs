//! Canonical user: the one merged view the application reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::counselor::CounselorExtensionRow;
use super::document::{current_document, DocumentRecord, DocumentType};
use super::identity::Identity;
use super::profile::{ProfileRow, ProviderHints};
use super::role::Role;
use super::JsonMap;

/// Identity fields plus every reconciled profile attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Reconciled `profiles` attributes
    pub profile: ProfileRow,
    /// Superset of provider and stored metadata
    #[serde(default)]
    pub metadata: JsonMap,
    #[serde(default)]
    pub counselor_profile: Option<CounselorExtensionRow>,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
}

impl CanonicalUser {
    /// User built from session metadata alone, before any store read
    #[must_use]
    pub fn provisional(identity: &Identity) -> Self {
        let hints = ProviderHints::from_metadata(&identity.metadata);
        let role = hints.role.unwrap_or_default();
        let profile = ProfileRow {
            id: identity.id.clone(),
            email: identity.email.clone(),
            full_name: hints.full_name,
            professional_title: hints.professional_title,
            avatar_url: hints.avatar_url,
            role: hints.role,
            availability: hints.availability,
            specialty: hints.specialty,
            years_experience: hints.years_experience,
            preferred_language: hints.preferred_language,
            treatment_stage: hints.treatment_stage,
            phone: hints.phone,
            emergency_contact_name: hints.emergency_contact_name,
            emergency_contact_phone: hints.emergency_contact_phone,
            notification_preferences: hints.notification_preferences,
            security_preferences: hints.security_preferences,
            support_preferences: hints.support_preferences,
            metadata: Some(identity.metadata.clone()),
            ..ProfileRow::default()
        };

        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            role,
            email_confirmed_at: identity.email_confirmed_at,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
            profile,
            metadata: identity.metadata.clone(),
            counselor_profile: None,
            documents: Vec::new(),
        }
    }

    /// Replace the profile-derived parts with a reconciled row
    ///
    /// Role comes from the row when it has one; otherwise the current role is
    /// kept.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfileRow) -> Self {
        if let Some(role) = profile.role {
            self.role = role;
        }
        if self.email.is_none() {
            self.email.clone_from(&profile.email);
        }
        if let Some(stored) = &profile.metadata {
            self.metadata.extend(stored.clone());
        }
        self.profile = profile;
        self
    }

    /// Most recent document of the given type
    #[must_use]
    pub fn current_document(&self, document_type: DocumentType) -> Option<&DocumentRecord> {
        current_document(&self.documents, document_type)
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.profile.full_name.as_deref().or(self.email.as_deref())
    }
}
