//! OID SDK
//!
//! Client library for the OID identity ledger:
//!
//! - **Config resolution**: load the on-chain JSON configuration from a
//!   caller-specified object, the user's own config object, or the
//!   network-pinned default
//! - **Environment derivation**: signer, sender address, versioned contract
//!   packages, and the policy object discovered by index query
//! - **Transaction execution**: a fixed catalog of remote entry points,
//!   submitted directly or through a fee-sponsoring relay with fallback
//! - **Sessions**: a stateful facade binding a decentralized identifier to
//!   its controller capabilities and credit tokens
//!
//! See [`oid_client::session::SessionManager`] for the high-level entry
//! point.

pub use oid_client as client;
pub use oid_transport as transport;
pub use oid_types as types;

pub use oid_client::session::{Session, SessionManager};
pub use oid_client::{EnvResolver, Environment, OidApi};
pub use oid_transport::ledger::JsonRpcLedger;
pub use oid_types::{CallArg, ConfigMap, LoadedConfig, OidError, TxExecResult};
