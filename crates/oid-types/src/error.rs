//! The closed error taxonomy for the workspace.
//!
//! Setup-time failures (config validation, environment resolution, capability
//! matching) are returned as `Err` and are never retried: they indicate a
//! configuration or identity mismatch that retrying cannot fix. Transaction
//! execution failure is *not* an error - it is reported through
//! [`TxExecResult::success`](crate::transaction::TxExecResult) because a valid
//! transaction rejected at execution is an expected outcome, not an
//! exceptional one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OidError {
    /// A required configuration field is absent or has the wrong type.
    #[error("missing required config field `{0}`")]
    MissingConfigField(String),

    /// A required configuration array is absent or empty.
    #[error("missing or empty config array `{0}`")]
    MissingConfigArray(String),

    /// A default-version index falls outside its package list.
    #[error("version index {index} out of range for `{field}` (list length {len})")]
    InvalidVersionIndex {
        field: String,
        index: i64,
        len: usize,
    },

    /// The type-filtered policy query returned no edges.
    #[error("no policy object found for type `{0}`")]
    PolicyNotFound(String),

    /// No owned controller capability matches the identity.
    #[error("no controller capability of type `{cap_type}` matches identity `{identity}`")]
    ControllerCapNotFound { cap_type: String, identity: String },

    /// A session-dependent accessor was called before `connect` succeeded.
    #[error("session not initialized: call connect() first")]
    NotInitialized,

    /// Faucet requested outside a testnet session, or no faucet URL configured.
    #[error("faucet unavailable: {0}")]
    FaucetUnavailable(String),

    /// RPC, indexing-service, or relay HTTP failure, with the parsed body
    /// attached for diagnostics where available.
    #[error("remote service error (status {status}): {body}")]
    RemoteService { status: u16, body: String },

    /// Byte-blob or JSON decoding failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Ledger RPC protocol-level failure (transport ok, response malformed).
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Requested catalog operation does not exist.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OidError {
    /// True for the fail-fast "connect first" error, so callers can prompt
    /// for a connection rather than surfacing a generic failure.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, OidError::NotInitialized)
    }
}
