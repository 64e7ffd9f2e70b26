//! OID SDK core pipeline.
//!
//! Everything between a configuration object on the ledger and an executed
//! transaction:
//!
//! - [`config_loader`]: resolve a configuration (explicit object, user-owned
//!   object, or network-pinned default)
//! - [`env`]: derive the execution environment (signer, sender, versioned
//!   packages, discovered policy object), memoized single-flight
//! - [`executor`]: build, sign, and submit - directly or through a sponsor
//!   relay with deterministic fallback
//! - [`catalog`]: the declarative table of remote entry points
//! - [`session`]: the stateful facade binding an identity to its on-chain
//!   capabilities and credit tokens
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oid_client::session::SessionManager;
//! use oid_transport::ledger::JsonRpcLedger;
//!
//! let rpc = Arc::new(JsonRpcLedger::new("https://fullnode.testnet.iota.example:443"));
//! let manager = SessionManager::new(rpc);
//! let session = manager.connect("did:oid:testnet:0xabc", "seed phrase", "testnet")?;
//! let result = manager.execute("new_oid", vec![/* ... */])?;
//! ```

pub mod balance;
pub mod catalog;
pub mod config_loader;
pub mod env;
pub mod executor;
pub mod session;
pub mod signer;

pub use catalog::{find_operation, OidApi, OpDescriptor, OPERATIONS};
pub use config_loader::ConfigLoader;
pub use env::{EnvResolver, Environment, DEFAULT_GAS_BUDGET};
pub use executor::{sign_and_execute, ExecOptions};
pub use session::{Session, SessionManager};
pub use signer::{Ed25519Signer, Signer};
