//! Resonance Root Library
//!
//! Configuration, error aggregation and the JSON-RPC boundary for the
//! resonance clearance service. The binary is a thin shell around this crate.
//!
//! # Architecture
//!
//! `initialize_root` builds the scorer, the credential issuer and the session
//! store into a single [`AccessGate`] held by [`RootState`]. `handle_request`
//! routes `auth/*` methods to the gate. Authentication and access failures
//! are ordinary results with a stable `code`; JSON-RPC errors are reserved
//! for envelope problems.

pub mod config;
pub mod error;

pub use config::{LoggingConfig, RootConfig, SigningSecret, SIGNING_SECRET_ENV};
pub use error::{RootError, RootResult};

use resonance_auth::{
    AccessGate, AuthOutcome, AuthRequest, CredentialIssuer, CredentialVerification,
    InMemorySessionStore, ResonanceScorer,
};
use resonance_core::{AccessDecision, ClearanceLevel, SessionStore, SubjectId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// JSON-RPC types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    pub id: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<serde_json::Value>, method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params: Some(params),
            id: id.into(),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: serde_json::Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

/// Standard JSON-RPC error codes.
pub mod rpc_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

// ---------------------------------------------------------------------------
// Root state
// ---------------------------------------------------------------------------

/// Runtime state for the service. Created by `initialize_root`.
pub struct RootState {
    pub config: RootConfig,
    pub gate: AccessGate,
}

/// Build the service from validated configuration and a resolved secret.
pub fn initialize_root(config: RootConfig, secret: SigningSecret) -> RootResult<RootState> {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    initialize_root_with_store(config, secret, store)
}

/// As `initialize_root`, with a caller-supplied session store.
pub fn initialize_root_with_store(
    config: RootConfig,
    secret: SigningSecret,
    store: Arc<dyn SessionStore>,
) -> RootResult<RootState> {
    config.validate()?;
    let issuer = CredentialIssuer::new(secret.as_bytes())?;
    let scorer = ResonanceScorer::new(config.base_frequency);
    info!(base_frequency = config.base_frequency, "resonance service initialized");
    Ok(RootState {
        gate: AccessGate::new(scorer, issuer, store),
        config,
    })
}

// ---------------------------------------------------------------------------
// Method parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AuthenticateParams {
    subject_id: String,
    emotional_signature: String,
    consciousness_pattern: String,
    claimed_frequency: f64,
}

#[derive(Debug, Deserialize)]
struct CheckAccessParams {
    subject_id: String,
    required_level: String,
}

#[derive(Debug, Deserialize)]
struct VerifyCredentialParams {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SubjectParams {
    subject_id: String,
}

#[derive(Debug, Deserialize)]
struct SetResonanceParams {
    status: String,
}

fn parse_params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, JsonRpcResponse> {
    let params = request
        .params
        .clone()
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    serde_json::from_value(params).map_err(|e| {
        JsonRpcResponse::error(
            request.id.clone(),
            rpc_codes::INVALID_PARAMS,
            format!("invalid params: {}", e),
        )
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Handle one JSON-RPC request.
pub fn handle_request(state: &RootState, request: &JsonRpcRequest) -> JsonRpcResponse {
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::error(
            request.id.clone(),
            rpc_codes::INVALID_REQUEST,
            format!("unsupported JSON-RPC version: {}", request.jsonrpc),
        );
    }

    info!(method = %request.method, "handling request");

    let handled = match request.method.as_str() {
        "auth/authenticate" => handle_authenticate(state, request),
        "auth/check_access" => handle_check_access(state, request),
        "auth/verify_credential" => handle_verify_credential(state, request),
        "auth/logout" => handle_logout(state, request),
        "auth/snapshot" => handle_snapshot(state, request),
        "auth/set_resonance" => handle_set_resonance(state, request),
        "auth/evict_expired" => handle_evict_expired(state, request),
        _ => {
            warn!(method = %request.method, "unknown method");
            return JsonRpcResponse::error(
                request.id.clone(),
                rpc_codes::METHOD_NOT_FOUND,
                format!("unknown method: {}", request.method),
            );
        }
    };

    match handled {
        Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
        Err(response) => response,
    }
}

/// Parse a raw JSON string and dispatch it.
pub fn handle_raw(state: &RootState, raw: &str) -> JsonRpcResponse {
    match serde_json::from_str::<JsonRpcRequest>(raw) {
        Ok(request) => handle_request(state, &request),
        Err(e) => JsonRpcResponse::error(
            serde_json::Value::Null,
            rpc_codes::PARSE_ERROR,
            format!("parse error: {}", e),
        ),
    }
}

type Handled = Result<serde_json::Value, JsonRpcResponse>;

fn handle_authenticate(state: &RootState, request: &JsonRpcRequest) -> Handled {
    let params: AuthenticateParams = parse_params(request)?;
    let auth_request = AuthRequest::new(
        params.subject_id,
        params.emotional_signature.into_bytes(),
        params.consciousness_pattern.into_bytes(),
        params.claimed_frequency,
    );

    Ok(match state.gate.authenticate(&auth_request) {
        AuthOutcome::Success(success) => json!({
            "success": true,
            "subject_id": success.subject_id,
            "clearance_level": success.clearance_level,
            "credential": success.credential,
            "expires_at": success.expires_at.to_rfc3339(),
            "analysis": success.analysis,
        }),
        AuthOutcome::Failed(failure) => json!({
            "success": false,
            "reason": failure.code,
            "message": failure.message,
            "stage": failure.stage,
        }),
    })
}

fn handle_check_access(state: &RootState, request: &JsonRpcRequest) -> Handled {
    let params: CheckAccessParams = parse_params(request)?;
    let required: ClearanceLevel = params.required_level.parse().map_err(|e| {
        JsonRpcResponse::error(
            request.id.clone(),
            rpc_codes::INVALID_PARAMS,
            format!("invalid params: {}", e),
        )
    })?;

    let subject_id = SubjectId::new(params.subject_id);
    Ok(match state.gate.check_access(&subject_id, required) {
        AccessDecision::Granted { clearance } => json!({
            "granted": true,
            "clearance": clearance,
        }),
        AccessDecision::Denied { reason } => json!({
            "granted": false,
            "reason": reason.code(),
            "message": reason.to_string(),
        }),
    })
}

fn handle_verify_credential(state: &RootState, request: &JsonRpcRequest) -> Handled {
    let params: VerifyCredentialParams = parse_params(request)?;
    Ok(match state.gate.verify_credential(&params.token) {
        CredentialVerification::Valid(claims) => json!({
            "valid": true,
            "claims": claims,
        }),
        CredentialVerification::Invalid { code, message } => json!({
            "valid": false,
            "reason": code,
            "message": message,
        }),
    })
}

fn handle_logout(state: &RootState, request: &JsonRpcRequest) -> Handled {
    let params: SubjectParams = parse_params(request)?;
    let outcome = state.gate.logout(&SubjectId::new(params.subject_id));
    Ok(json!({ "success": outcome.success }))
}

fn handle_snapshot(state: &RootState, request: &JsonRpcRequest) -> Handled {
    serde_json::to_value(state.gate.snapshot()).map_err(|e| {
        JsonRpcResponse::error(
            request.id.clone(),
            rpc_codes::INTERNAL_ERROR,
            format!("failed to serialize snapshot: {}", e),
        )
    })
}

fn handle_set_resonance(state: &RootState, request: &JsonRpcRequest) -> Handled {
    let params: SetResonanceParams = parse_params(request)?;
    state
        .gate
        .set_system_resonance(&params.status)
        .map_err(|e| {
            JsonRpcResponse::error(
                request.id.clone(),
                rpc_codes::INVALID_PARAMS,
                e.public_message(),
            )
        })?;
    Ok(json!({ "success": true }))
}

fn handle_evict_expired(state: &RootState, request: &JsonRpcRequest) -> Handled {
    let evicted = state.gate.evict_expired().map_err(|e| {
        warn!(error = %e, "expiry sweep failed");
        JsonRpcResponse::error(
            request.id.clone(),
            rpc_codes::INTERNAL_ERROR,
            e.public_message(),
        )
    })?;
    Ok(json!({ "evicted": evicted }))
}
