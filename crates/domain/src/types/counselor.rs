//! `counselor_profiles` extension row

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JsonMap;

/// Practice, availability and licensing details for a counselor
///
/// One-to-one with the `profiles` row, keyed by `profile_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounselorExtensionRow {
    pub profile_id: String,
    pub practice_name: Option<String>,
    pub service_regions: Option<Vec<String>>,
    pub timezones: Option<Vec<String>>,
    pub session_modalities: Option<Vec<String>>,
    pub session_durations: Option<Vec<i64>>,
    pub accepting_new_clients: Option<bool>,
    pub offers_sliding_scale: Option<bool>,
    pub specializations: Option<Vec<String>>,
    pub demographics: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub bio: Option<String>,
    pub approach: Option<String>,
    pub motivation: Option<String>,
    pub license_number: Option<String>,
    pub license_jurisdiction: Option<String>,
    pub license_expires_on: Option<String>,
    pub metadata: Option<JsonMap>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Caller-supplied counselor fields for one write
///
/// Only supplied fields become column assignments; unsupplied fields are
/// never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounselorProfileUpdate {
    pub practice_name: Option<String>,
    pub service_regions: Option<Vec<String>>,
    pub timezones: Option<Vec<String>>,
    pub session_modalities: Option<Vec<String>>,
    pub session_durations: Option<Vec<i64>>,
    pub accepting_new_clients: Option<bool>,
    pub offers_sliding_scale: Option<bool>,
    pub specializations: Option<Vec<String>>,
    pub demographics: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub bio: Option<String>,
    pub approach: Option<String>,
    pub motivation: Option<String>,
    pub license_number: Option<String>,
    pub license_jurisdiction: Option<String>,
    pub license_expires_on: Option<String>,
    pub metadata: Option<JsonMap>,
}

impl CounselorProfileUpdate {
    /// Column assignments for the supplied fields only
    #[must_use]
    pub fn to_assignments(&self) -> JsonMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.retain(|_, value| !value.is_null());
                map
            }
            _ => JsonMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_assignments().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assignments_contain_only_supplied_fields() {
        let update = CounselorProfileUpdate {
            bio: Some("Ten years in community practice".into()),
            accepting_new_clients: Some(false),
            timezones: Some(vec![]),
            ..CounselorProfileUpdate::default()
        };

        let assignments = update.to_assignments();
        assert_eq!(assignments.len(), 3);
        assert_eq!(assignments["accepting_new_clients"], json!(false));
        assert_eq!(assignments["timezones"], json!([]));
        assert!(!assignments.contains_key("practice_name"));
    }

    #[test]
    fn default_update_is_empty() {
        assert!(CounselorProfileUpdate::default().is_empty());
    }
}
