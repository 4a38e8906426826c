//! Session resolution tiers: provider, verified cache, unauthenticated

mod support;

use std::time::{Duration, Instant};

use serde_json::json;
use solace_common::auth::{AUTH_TOKEN_KEY, AUTH_USER_KEY, USER_ROLE_KEY};
use solace_common::CredentialStore;
use solace_core::identity::IdentityProvider;
use solace_core::session::{Resolution, SessionSource};
use solace_domain::{CanonicalUser, DocumentRecord, DocumentType, Role};
use support::{cached, identity, session, Harness};

fn resolved(resolution: Resolution) -> solace_core::session::ResolvedSession {
    match resolution {
        Resolution::Authenticated(session) => *session,
        Resolution::Unauthenticated => panic!("expected an authenticated resolution"),
    }
}

#[tokio::test]
async fn provider_session_is_enriched_from_the_profile_store() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({ "role": "patient" }));
    h.seed_complete_patient("p1");
    h.provider.hold_session(session("live-token", user));

    let session = resolved(h.resolver.resolve().await);

    assert_eq!(session.source, SessionSource::Provider);
    assert_eq!(session.access_token, "live-token");
    assert_eq!(session.user.role, Role::Patient);
    assert_eq!(session.user.profile.full_name.as_deref(), Some("Pat Patient"));
    assert_eq!(h.credentials.save_count(), 1, "resolved user is cached");
}

#[tokio::test]
async fn stalled_enrichment_falls_back_to_session_metadata() {
    let h = Harness::new();
    let user = identity("c1", "c@example.com", json!({ "role": "counselor", "full_name": "Casey" }));
    h.provider.hold_session(session("live-token", user));
    h.profiles.hang_reads(true);

    let started = Instant::now();
    let session = resolved(h.resolver.resolve().await);

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.source, SessionSource::Provider);
    assert_eq!(session.user.role, Role::Counselor);
    assert_eq!(session.user.profile.full_name.as_deref(), Some("Casey"));
    assert_eq!(session.user.profile.onboarding_completed, None);
}

#[tokio::test]
async fn unreachable_provider_uses_verified_cached_credentials() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({ "role": "patient" }));
    h.seed_complete_patient("p1");
    h.provider.fail_session(true);
    h.provider.accept_token("cached-token", user.clone());
    h.credentials.save(&cached("cached-token", &CanonicalUser::provisional(&user))).unwrap();

    let session = resolved(h.resolver.resolve().await);

    assert_eq!(session.source, SessionSource::Cache);
    assert_eq!(session.access_token, "cached-token");
    assert_eq!(session.user.profile.onboarding_completed, Some(true));
}

#[tokio::test]
async fn hung_provider_falls_through_to_the_cache_within_the_bound() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({ "role": "patient" }));
    h.provider.hang_session(true);
    h.provider.accept_token("cached-token", user.clone());
    h.credentials.save(&cached("cached-token", &CanonicalUser::provisional(&user))).unwrap();

    let started = Instant::now();
    let session = resolved(h.resolver.resolve().await);

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.source, SessionSource::Cache);
}

#[tokio::test]
async fn verified_cached_token_becomes_the_provider_session() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({ "role": "patient" }));
    h.seed_complete_patient("p1");
    h.provider.accept_token("cached-token", user.clone());
    h.credentials.save(&cached("cached-token", &CanonicalUser::provisional(&user))).unwrap();

    let first = resolved(h.resolver.resolve().await);
    assert_eq!(first.source, SessionSource::Cache);
    assert_eq!(h.provider.restored_sessions(), 1);

    let held = h.provider.get_session().await.unwrap().unwrap();
    assert_eq!(held.access_token, "cached-token");

    let second = resolved(h.resolver.resolve().await);
    assert_eq!(second.source, SessionSource::Provider);
    assert_eq!(second.user.profile.onboarding_completed, Some(true));
}

#[tokio::test]
async fn failed_cache_hydration_drops_the_restored_session() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({ "role": "patient" }));
    h.provider.accept_token("cached-token", user.clone());
    h.credentials.save(&cached("cached-token", &CanonicalUser::provisional(&user))).unwrap();
    h.profiles.hang_reads(true);

    assert!(h.resolver.resolve().await.user().is_none());
    assert_eq!(h.provider.restored_sessions(), 1);
    assert!(h.provider.get_session().await.unwrap().is_none());
    assert!(h.credentials.is_empty());
}

#[tokio::test]
async fn rejected_cached_token_is_discarded() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({}));
    h.provider.fail_session(true);
    h.credentials.save(&cached("stale-token", &CanonicalUser::provisional(&user))).unwrap();

    assert!(h.resolver.resolve().await.user().is_none());
    assert!(h.credentials.is_empty());
    assert_eq!(h.credentials.clear_count(), 1);
}

#[tokio::test]
async fn cached_token_for_a_different_user_is_discarded() {
    let h = Harness::new();
    let cached_user = identity("p1", "p@example.com", json!({}));
    let token_owner = identity("p2", "q@example.com", json!({}));
    h.provider.accept_token("shared-token", token_owner);
    h.credentials.save(&cached("shared-token", &CanonicalUser::provisional(&cached_user))).unwrap();

    assert!(h.resolver.resolve().await.user().is_none());
    assert!(h.credentials.is_empty());
}

#[tokio::test]
async fn unreadable_cached_user_fails_closed() {
    let h = Harness::new();
    h.credentials.set_raw(AUTH_TOKEN_KEY, "token");
    h.credentials.set_raw(AUTH_USER_KEY, "{not json");
    h.credentials.set_raw(USER_ROLE_KEY, "patient");

    assert!(h.resolver.resolve().await.user().is_none());
    assert!(h.credentials.is_empty());
}

#[tokio::test]
async fn credential_read_failure_fails_closed() {
    let h = Harness::new();
    h.credentials.fail_reads(true);

    assert!(h.resolver.resolve().await.user().is_none());
    assert_eq!(h.credentials.clear_count(), 1);
}

#[tokio::test]
async fn no_session_and_no_cache_is_unauthenticated() {
    let h = Harness::new();
    h.provider.hang_session(true);

    let started = Instant::now();
    assert!(h.resolver.resolve().await.user().is_none());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(h.credentials.save_count(), 0);
}

#[tokio::test]
async fn counselor_users_carry_extension_row_and_documents() {
    let h = Harness::new();
    let user = identity("c1", "c@example.com", json!({ "role": "counselor" }));
    h.profiles.seed(json!({ "id": "c1", "role": "counselor" }));
    h.counselors.seed(json!({ "profile_id": "c1", "practice_name": "Calm Waters" }));
    h.documents.seed(DocumentRecord {
        id: "d1".into(),
        profile_id: "c1".into(),
        document_type: DocumentType::License,
        storage_path: "c1/license/1-license.pdf".into(),
        file_name: "license.pdf".into(),
        review_status: None,
        uploaded_at: None,
    });
    h.provider.hold_session(session("live-token", user));

    let session = resolved(h.resolver.resolve().await);

    let extension = session.user.counselor_profile.as_ref().unwrap();
    assert_eq!(extension.practice_name.as_deref(), Some("Calm Waters"));
    assert_eq!(session.user.current_document(DocumentType::License).unwrap().id, "d1");
}

#[tokio::test]
async fn counselor_extension_failure_keeps_the_profile_level_user() {
    let h = Harness::new();
    let user = identity("c1", "c@example.com", json!({ "role": "counselor" }));
    h.profiles.seed(json!({ "id": "c1", "role": "counselor", "full_name": "Casey" }));
    h.counselors.fail_reads(true);
    h.provider.hold_session(session("live-token", user));

    let session = resolved(h.resolver.resolve().await);

    assert_eq!(session.user.role, Role::Counselor);
    assert_eq!(session.user.profile.full_name.as_deref(), Some("Casey"));
    assert!(session.user.counselor_profile.is_none());
}

#[tokio::test]
async fn discarding_the_cache_clears_every_key() {
    let h = Harness::new();
    let user = identity("p1", "p@example.com", json!({}));
    h.credentials.save(&cached("t", &CanonicalUser::provisional(&user))).unwrap();

    h.resolver.discard_cache();

    assert!(h.credentials.is_empty());
}
