//! Network-name normalization and per-network defaults.
//!
//! The pinned default config object ids live in an injected table rather
//! than a module-level global, so tests and alternative deployments can
//! substitute their own entries.

use std::collections::HashMap;

/// Pinned per-network entries: the default config object and, where known,
/// the package id publishing user config objects.
#[derive(Debug, Clone, Default)]
pub struct NetworkEntry {
    /// Object id of the network's pinned default configuration.
    pub default_config_object: String,
    /// Package id whose `oid_config::Config` type marks user-owned configs.
    pub config_package: Option<String>,
    /// Default fullnode RPC endpoint.
    pub rpc_endpoint: Option<String>,
}

/// Injected map of network name to pinned defaults.
#[derive(Debug, Clone, Default)]
pub struct NetworkTable {
    entries: HashMap<String, NetworkEntry>,
}

const MAINNET_CONFIG_OBJECT: &str =
    "0x9f0c7bcf66f9bc69fa40ac23f5d5388929a8545c37a9d5f600dddfcf211a0d25";
const TESTNET_CONFIG_OBJECT: &str =
    "0x0c3a36a945ccc0a5f63d1873041a04a4bb63f1abfa91a11a10cb01a5482bd7c2";
const DEVNET_CONFIG_OBJECT: &str =
    "0x41fbd81d85b932fbd73ca5c8092e4ea15c9a7b1b5e0e2f4c6a0b9a02a3f0ce11";

impl NetworkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped per-network entries.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            "mainnet",
            NetworkEntry {
                default_config_object: MAINNET_CONFIG_OBJECT.to_string(),
                config_package: None,
                rpc_endpoint: Some("https://fullnode.mainnet.iota.example:443".to_string()),
            },
        );
        table.insert(
            "testnet",
            NetworkEntry {
                default_config_object: TESTNET_CONFIG_OBJECT.to_string(),
                config_package: None,
                rpc_endpoint: Some("https://fullnode.testnet.iota.example:443".to_string()),
            },
        );
        table.insert(
            "devnet",
            NetworkEntry {
                default_config_object: DEVNET_CONFIG_OBJECT.to_string(),
                config_package: None,
                rpc_endpoint: Some("https://fullnode.devnet.iota.example:443".to_string()),
            },
        );
        table
    }

    pub fn insert(&mut self, network: &str, entry: NetworkEntry) {
        self.entries.insert(network.to_string(), entry);
    }

    pub fn get(&self, network: &str) -> Option<&NetworkEntry> {
        self.entries.get(network)
    }

    /// Pinned default config object id for a network, if one exists.
    pub fn default_config_object(&self, network: &str) -> Option<&str> {
        self.entries
            .get(network)
            .map(|e| e.default_config_object.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Normalize a caller-supplied network name.
///
/// `"iota"` (any casing) is an alias for `"mainnet"`; every other string
/// passes through trimmed but otherwise unchanged, so table entries keyed
/// with their original casing still resolve (unrecognized names are
/// resolved - or rejected - later, against the injected table).
pub fn normalize_network(network: &str) -> String {
    let trimmed = network.trim();
    if trimmed.eq_ignore_ascii_case("iota") {
        "mainnet".to_string()
    } else {
        trimmed.to_string()
    }
}
