//! Profile reconciliation
//!
//! Merges a stored `profiles` row, provider-declared metadata and caller
//! overrides into one attribute set, and derives the minimal write that
//! brings the row in line with it.
//!
//! Per-attribute precedence, most authoritative first:
//!
//! | Group | Order |
//! |-------|-------|
//! | display, operational, locale, contact | explicit → stored (non-blank) → provider → absent |
//! | role | explicit → stored → provider (never admin) → absent (reads as guest) |
//! | preference bags | explicit → stored (non-empty) → provider → `{}` |
//! | visibility, approval, onboarding | explicit → stored |
//! | metadata | provider ∪ stored ∪ explicit, later wins per key |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use solace_domain::constants::PROFILES_TABLE;
use solace_domain::{
    Identity, JsonMap, ProfileRow, ProfileUpdate, ProviderHints, Result, SolaceError,
};
use tracing::{debug, info};

use super::ports::ProfileStore;

/// Columns the merge never copies into a payload
const UNWRITTEN_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Insert,
    Update,
}

/// Columns to write and how
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileWrite {
    pub mode: WriteMode,
    pub payload: JsonMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub merged: ProfileRow,
    /// `None` when the stored row already matches
    pub write: Option<ProfileWrite>,
}

/// Inputs to a single reconciliation
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub profile_id: &'a str,
    pub email: Option<&'a str>,
    pub existing: Option<&'a ProfileRow>,
    pub provider: &'a ProviderHints,
    pub overrides: &'a ProfileUpdate,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

fn text(explicit: &Option<String>, stored: Option<&String>, provider: &Option<String>) -> Option<String> {
    explicit.clone().or_else(|| non_blank(stored)).or_else(|| provider.clone())
}

fn scalar<T: Clone>(explicit: &Option<T>, stored: Option<&T>, provider: &Option<T>) -> Option<T> {
    explicit.clone().or_else(|| stored.cloned()).or_else(|| provider.clone())
}

fn bag(explicit: &Option<JsonMap>, stored: Option<&JsonMap>, provider: &Option<JsonMap>) -> JsonMap {
    explicit
        .clone()
        .or_else(|| stored.filter(|b| !b.is_empty()).cloned())
        .or_else(|| provider.clone())
        .unwrap_or_default()
}

fn preserved<T: Clone>(explicit: &Option<T>, stored: Option<&T>) -> Option<T> {
    explicit.clone().or_else(|| stored.cloned())
}

fn columns(row: &ProfileRow) -> JsonMap {
    match serde_json::to_value(row) {
        Ok(Value::Object(map)) => map,
        _ => JsonMap::new(),
    }
}

/// Pure merge of one profile; performs no I/O
#[must_use]
pub fn reconcile(input: &ReconcileInput<'_>, now: DateTime<Utc>) -> ReconcileOutcome {
    let stored = input.existing;
    let hints = input.provider;
    let explicit = input.overrides;

    macro_rules! stored {
        ($field:ident) => {
            stored.and_then(|row| row.$field.as_ref())
        };
    }

    let stored_metadata = stored!(metadata);
    let mut metadata = hints.metadata.clone();
    if let Some(bag) = stored_metadata {
        metadata.extend(bag.clone());
    }
    metadata.extend(explicit.metadata.clone());

    let email = explicit
        .email
        .clone()
        .or_else(|| non_blank(stored!(email)))
        .or_else(|| input.email.map(str::to_string));

    let mut merged = ProfileRow {
        id: input.profile_id.to_string(),
        email,
        full_name: text(&explicit.full_name, stored!(full_name), &hints.full_name),
        professional_title: text(
            &explicit.professional_title,
            stored!(professional_title),
            &hints.professional_title,
        ),
        avatar_url: text(&explicit.avatar_url, stored!(avatar_url), &hints.avatar_url),
        role: scalar(&explicit.role, stored!(role), &hints.role),
        availability: text(&explicit.availability, stored!(availability), &hints.availability),
        specialty: text(&explicit.specialty, stored!(specialty), &hints.specialty),
        years_experience: scalar(
            &explicit.years_experience,
            stored!(years_experience),
            &hints.years_experience,
        ),
        preferred_language: text(
            &explicit.preferred_language,
            stored!(preferred_language),
            &hints.preferred_language,
        ),
        treatment_stage: text(
            &explicit.treatment_stage,
            stored!(treatment_stage),
            &hints.treatment_stage,
        ),
        phone: text(&explicit.phone, stored!(phone), &hints.phone),
        emergency_contact_name: text(
            &explicit.emergency_contact_name,
            stored!(emergency_contact_name),
            &hints.emergency_contact_name,
        ),
        emergency_contact_phone: text(
            &explicit.emergency_contact_phone,
            stored!(emergency_contact_phone),
            &hints.emergency_contact_phone,
        ),
        notification_preferences: Some(bag(
            &explicit.notification_preferences,
            stored!(notification_preferences),
            &hints.notification_preferences,
        )),
        security_preferences: Some(bag(
            &explicit.security_preferences,
            stored!(security_preferences),
            &hints.security_preferences,
        )),
        support_preferences: Some(bag(
            &explicit.support_preferences,
            stored!(support_preferences),
            &hints.support_preferences,
        )),
        metadata: (stored_metadata.is_some() || !metadata.is_empty()).then_some(metadata),
        visibility_settings: preserved(&explicit.visibility_settings, stored!(visibility_settings)),
        approval_status: preserved(&explicit.approval_status, stored!(approval_status)),
        approval_submitted_at: preserved(
            &explicit.approval_submitted_at,
            stored!(approval_submitted_at),
        ),
        approval_reviewed_at: preserved(
            &explicit.approval_reviewed_at,
            stored!(approval_reviewed_at),
        ),
        approval_notes: preserved(&explicit.approval_notes, stored!(approval_notes)),
        onboarding_completed: preserved(
            &explicit.onboarding_completed,
            stored!(onboarding_completed),
        ),
        onboarding_completed_at: preserved(
            &explicit.onboarding_completed_at,
            stored!(onboarding_completed_at),
        ),
        created_at: stored.and_then(|row| row.created_at),
        updated_at: stored.and_then(|row| row.updated_at),
    };

    let stored_columns = stored.map(columns).unwrap_or_default();
    let mut payload: JsonMap = columns(&merged)
        .into_iter()
        .filter(|(column, value)| {
            !UNWRITTEN_COLUMNS.contains(&column.as_str())
                && !value.is_null()
                && stored_columns.get(column) != Some(value)
        })
        .collect();

    let mode = match stored {
        None => Some(WriteMode::Insert),
        Some(_) if payload.is_empty() => None,
        Some(_) => Some(WriteMode::Update),
    };

    let write = mode.map(|mode| {
        if mode == WriteMode::Insert {
            payload.insert("id".into(), Value::from(input.profile_id));
        }
        payload.insert("updated_at".into(), Value::from(now.to_rfc3339()));
        merged.updated_at = Some(now);
        ProfileWrite { mode, payload }
    });

    ReconcileOutcome { merged, write }
}

/// Store-backed reconciler
pub struct ProfileReconciler {
    store: Arc<dyn ProfileStore>,
}

impl ProfileReconciler {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Merged view of the stored row and provider metadata, without writing
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn read(&self, identity: &Identity) -> Result<ProfileRow> {
        let existing = self.store.fetch(&identity.id).await?;
        let hints = ProviderHints::from_metadata(&identity.metadata);
        let overrides = ProfileUpdate::default();
        let input = ReconcileInput {
            profile_id: &identity.id,
            email: identity.email.as_deref(),
            existing: existing.as_ref(),
            provider: &hints,
            overrides: &overrides,
        };

        let mut merged = reconcile(&input, Utc::now()).merged;
        merged.updated_at = existing.and_then(|row| row.updated_at);
        Ok(merged)
    }

    /// Reconcile and persist
    ///
    /// The stored row is re-read on every call so concurrent writers are
    /// never overwritten from a stale copy.
    ///
    /// # Errors
    /// Returns `SolaceError::ReconciliationWrite` if the existence check or
    /// the write fails.
    pub async fn sync(&self, identity: &Identity, overrides: &ProfileUpdate) -> Result<ReconcileOutcome> {
        let wrap = |err: SolaceError| SolaceError::reconciliation(PROFILES_TABLE, &err);

        let existing = self.store.fetch(&identity.id).await.map_err(wrap)?;
        let hints = ProviderHints::from_metadata(&identity.metadata);
        let input = ReconcileInput {
            profile_id: &identity.id,
            email: identity.email.as_deref(),
            existing: existing.as_ref(),
            provider: &hints,
            overrides,
        };
        let outcome = reconcile(&input, Utc::now());

        match &outcome.write {
            None => debug!(user_id = %identity.id, "Profile already reconciled; skipping write"),
            Some(write) => {
                match write.mode {
                    WriteMode::Insert => self.store.insert(&write.payload).await,
                    WriteMode::Update => self.store.update(&identity.id, &write.payload).await,
                }
                .map_err(wrap)?;
                info!(
                    user_id = %identity.id,
                    mode = ?write.mode,
                    columns = write.payload.len(),
                    "Profile reconciled"
                );
            }
        }

        Ok(outcome)
    }
}
