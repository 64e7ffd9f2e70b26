//! Shared types for the oid-sdk workspace.
//!
//! This crate provides the foundational types used across the workspace,
//! breaking circular dependency chains:
//!
//! - [`address`] - address normalization and DID segment extraction
//! - [`codec`] - byte-array JSON field encoding/decoding
//! - [`config`] - on-chain configuration schema and validation
//! - [`error`] - the closed error taxonomy ([`OidError`])
//! - [`transaction`] - transaction data, call arguments, execution results
//! - [`retry`] - bounded retry with fixed backoff

pub mod address;
pub mod codec;
pub mod config;
pub mod error;
pub mod retry;
pub mod transaction;

pub use config::{ConfigMap, ConfigSource, LoadedConfig};
pub use error::OidError;
pub use retry::RetryConfig;
pub use transaction::{CallArg, MoveCall, ObjectRef, TransactionData, TxExecResult};

/// A specialized Result for OID SDK operations.
pub type Result<T> = std::result::Result<T, OidError>;
