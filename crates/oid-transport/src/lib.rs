//! OID SDK Transport Layer
//!
//! Network edges for the OID client:
//!
//! - [`ledger`]: the ledger RPC collaborator (trait + JSON-RPC HTTP binding)
//! - [`indexer`]: cursor-paginated, type-filtered queries against the
//!   GraphQL-style indexing service
//! - [`gas_station`]: the fee-sponsorship relay (reserve gas, execute signed
//!   bytes)
//! - [`network`]: network-name normalization and per-network defaults
//!
//! # Example
//!
//! ```ignore
//! use oid_transport::indexer::{Indexer, IndexerClient};
//!
//! let indexer = IndexerClient::new("https://indexer.testnet.example/graphql");
//! let edges = indexer.query_objects("0xa::token::TokenPolicy<0xa::oid::OID>", None, 1)?;
//! ```

pub mod gas_station;
pub mod indexer;
pub mod ledger;
pub mod network;

pub use gas_station::{GasReservation, GasStation, GasStationClient, GasStationConfig};
pub use indexer::{Indexer, IndexerClient, ObjectEdge, PageInfo};
pub use ledger::{JsonRpcLedger, LedgerRpc, ObjectRecord, OwnedObjectsPage, TxResponse};
pub use network::NetworkTable;

use std::time::Duration;

/// Default request timeout for HTTP collaborators.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default connect timeout for HTTP collaborators.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub fn build_agent(timeout: Duration, connect_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .timeout_connect(connect_timeout)
        .build()
}

/// Agent with the workspace's default request and connect timeouts; every
/// HTTP collaborator builds its agent here.
pub fn default_agent() -> ureq::Agent {
    build_agent(
        Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
    )
}
