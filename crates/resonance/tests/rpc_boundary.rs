//! Boundary stories driven through `handle_raw`, the way a transport would.

use resonance::{
    handle_raw, initialize_root, initialize_root_with_store, rpc_codes, RootConfig, RootState,
    SigningSecret,
};
use resonance_auth::InMemorySessionStore;
use resonance_core::{ClearanceLevel, Session, SessionStore, SubjectId, Timestamp};
use serde_json::{json, Value};
use std::sync::Arc;

fn rpc(state: &RootState, method: &str, params: Value) -> Value {
    let raw = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    })
    .to_string();
    let response = handle_raw(state, &raw);
    assert!(response.error.is_none(), "{method} failed: {:?}", response.error);
    response.result.unwrap_or(Value::Null)
}

fn authenticate(state: &RootState, subject: &str, signature: &str, pattern: &str) -> Value {
    rpc(
        state,
        "auth/authenticate",
        json!({
            "subject_id": subject,
            "emotional_signature": signature,
            "consciousness_pattern": pattern,
            "claimed_frequency": 432.0,
        }),
    )
}

fn check(state: &RootState, subject: &str, level: &str) -> Value {
    rpc(
        state,
        "auth/check_access",
        json!({ "subject_id": subject, "required_level": level }),
    )
}

#[test]
fn bob_authenticates_and_enters_public_areas() {
    let state = initialize_root(RootConfig::default(), SigningSecret::new("story-secret")).unwrap();

    let auth = authenticate(&state, "bob", "emotional-signature-a", "consciousness-pattern-x");
    assert_eq!(auth["success"], true);
    assert_eq!(auth["clearance_level"], "ECL_EMOTIONAL");

    assert_eq!(check(&state, "bob", "ECL_PUBLIC")["granted"], true);
    assert_eq!(check(&state, "bob", "ECL_EMOTIONAL")["granted"], true);
    assert_eq!(check(&state, "bob", "ECL_SECURITY")["granted"], false);
    assert_eq!(check(&state, "bob", "ECL_MAXIMUM")["granted"], false);
}

#[test]
fn each_level_is_reachable_over_the_boundary() {
    let state = initialize_root(RootConfig::default(), SigningSecret::new("story-secret")).unwrap();

    let cases = [
        ("p", "signature-0", "consciousness-0", "ECL_PUBLIC"),
        ("e", "signature-0", "consciousness-pattern-x", "ECL_EMOTIONAL"),
        ("s", "signature-79", "consciousness-pattern-x", "ECL_SECURITY"),
        ("m", "signature-947", "consciousness-pattern-x", "ECL_MAXIMUM"),
    ];
    for (subject, signature, pattern, expected) in cases {
        let auth = authenticate(&state, subject, signature, pattern);
        assert_eq!(auth["clearance_level"], expected, "subject {subject}");
    }
    assert_eq!(rpc(&state, "auth/snapshot", json!({}))["active_session_count"], 4);
}

#[test]
fn credentials_from_another_deployment_are_malformed() {
    let ours = initialize_root(RootConfig::default(), SigningSecret::new("ours")).unwrap();
    let theirs = initialize_root(RootConfig::default(), SigningSecret::new("theirs")).unwrap();

    let token = authenticate(&theirs, "eve", "emotional-signature-a", "consciousness-pattern-x")
        ["credential"]
        .as_str()
        .unwrap()
        .to_string();

    let verdict = rpc(&ours, "auth/verify_credential", json!({ "token": token }));
    assert_eq!(verdict["valid"], false);
    assert_eq!(verdict["reason"], "MALFORMED");

    let verdict = rpc(&theirs, "auth/verify_credential", json!({ "token": token }));
    assert_eq!(verdict["valid"], true);
}

#[test]
fn expired_sessions_are_not_found_and_swept() {
    let store = Arc::new(InMemorySessionStore::new());
    let state = initialize_root_with_store(
        RootConfig::default(),
        SigningSecret::new("story-secret"),
        store.clone(),
    )
    .unwrap();

    let stale_issue = Timestamp::now().minus_seconds(2 * 86_400);
    store
        .put(Session::new(
            SubjectId::new("old"),
            ClearanceLevel::Maximum,
            stale_issue,
            "rsn1.stale",
        ))
        .unwrap();
    store
        .put(Session::new(
            SubjectId::new("older"),
            ClearanceLevel::Security,
            stale_issue,
            "rsn1.stale",
        ))
        .unwrap();
    assert_eq!(rpc(&state, "auth/snapshot", json!({}))["active_session_count"], 0);

    let denied = check(&state, "old", "ECL_PUBLIC");
    assert_eq!(denied["granted"], false);
    assert_eq!(denied["reason"], "NOT_FOUND");

    assert_eq!(rpc(&state, "auth/evict_expired", json!({}))["evicted"], 1);
    assert!(store.is_empty());
}

#[test]
fn base_frequency_comes_from_configuration() {
    let config = RootConfig {
        base_frequency: 528.0,
        ..RootConfig::default()
    };
    let state = initialize_root(config, SigningSecret::new("story-secret")).unwrap();

    let rejected = authenticate(&state, "bob", "emotional-signature-a", "consciousness-pattern-x");
    assert_eq!(rejected["success"], false);
    assert_eq!(rejected["reason"], "INVALID_FREQUENCY");

    let accepted = rpc(
        &state,
        "auth/authenticate",
        json!({
            "subject_id": "bob",
            "emotional_signature": "emotional-signature-a",
            "consciousness_pattern": "consciousness-pattern-x",
            "claimed_frequency": 528.0,
        }),
    );
    assert_eq!(accepted["success"], true);

    let snapshot = rpc(&state, "auth/snapshot", json!({}));
    assert_eq!(snapshot["base_frequency"], 528.0);
    assert_eq!(snapshot["chambers"][3]["frequency"], 2112.0);
}

#[test]
fn envelope_errors_are_json_rpc_errors() {
    let state = initialize_root(RootConfig::default(), SigningSecret::new("story-secret")).unwrap();

    let response = handle_raw(&state, r#"{"jsonrpc":"2.0","method":"auth/logout","id":9}"#);
    assert_eq!(response.error.unwrap().code, rpc_codes::INVALID_PARAMS);

    let response = handle_raw(&state, "[]");
    assert_eq!(response.error.unwrap().code, rpc_codes::PARSE_ERROR);
}
