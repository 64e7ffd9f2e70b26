//! Shared mock collaborators for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use oid_transport::gas_station::{GasReservation, GasStation};
use oid_transport::indexer::{Indexer, ObjectEdge, PageInfo};
use oid_transport::ledger::{LedgerRpc, ObjectRecord, OwnedObjectsPage, TxResponse};
use oid_transport::network::{NetworkEntry, NetworkTable};
use oid_types::codec::encode_json_field;
use oid_types::config::ConfigMap;
use oid_types::{ObjectRef, OidError};

/// In-memory ledger: objects by id, owned objects by struct type (owner is
/// ignored so tests do not need to predict derived addresses), scripted
/// execution responses, and a call log.
#[derive(Default)]
pub struct MockLedger {
    pub objects: Mutex<HashMap<String, ObjectRecord>>,
    pub owned: Mutex<Vec<ObjectRecord>>,
    pub exec_status: Mutex<Option<String>>,
    pub fail_execute: bool,
    pub fail_wait: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_object(&self, record: ObjectRecord) {
        self.objects
            .lock()
            .unwrap()
            .insert(record.object_id.clone(), record);
    }

    pub fn insert_owned(&self, record: ObjectRecord) {
        self.owned.lock().unwrap().push(record);
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    fn log(&self, method: &str) {
        self.calls.lock().unwrap().push(method.to_string());
    }
}

impl LedgerRpc for MockLedger {
    fn get_object(&self, object_id: &str) -> Result<ObjectRecord, OidError> {
        self.log("get_object");
        self.objects
            .lock()
            .unwrap()
            .get(object_id)
            .cloned()
            .ok_or_else(|| OidError::Rpc(format!("object not found: {object_id}")))
    }

    fn get_owned_objects(
        &self,
        _owner: &str,
        type_filter: Option<&str>,
        _cursor: Option<&str>,
    ) -> Result<OwnedObjectsPage, OidError> {
        self.log("get_owned_objects");
        let objects = self
            .owned
            .lock()
            .unwrap()
            .iter()
            .filter(|obj| match type_filter {
                Some(t) => obj.object_type.as_deref() == Some(t),
                None => true,
            })
            .cloned()
            .collect();
        Ok(OwnedObjectsPage {
            objects,
            has_next_page: false,
            next_cursor: None,
        })
    }

    fn execute_transaction(
        &self,
        _tx_bytes: &[u8],
        _signatures: &[String],
    ) -> Result<TxResponse, OidError> {
        self.log("execute_transaction");
        if self.fail_execute {
            return Err(OidError::Rpc("node rejected submission".to_string()));
        }
        Ok(TxResponse {
            digest: "DIGEST".to_string(),
            status: "pending".to_string(),
            effects: None,
        })
    }

    fn wait_for_transaction(&self, digest: &str) -> Result<TxResponse, OidError> {
        self.log("wait_for_transaction");
        if self.fail_wait {
            return Err(OidError::Rpc("finality timeout".to_string()));
        }
        let status = self
            .exec_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "success".to_string());
        Ok(TxResponse {
            digest: digest.to_string(),
            status,
            effects: Some(json!({
                "created": [{"reference": {"objectId": "0xcreated"}}]
            })),
        })
    }
}

/// Indexer serving one fixed page and counting queries.
pub struct MockIndexer {
    pub edges: Vec<ObjectEdge>,
    pub queries: Mutex<usize>,
    /// Hold each query this long, to force overlap in concurrency tests.
    pub latency: std::time::Duration,
}

impl MockIndexer {
    pub fn with_policy(address: &str) -> Self {
        Self {
            edges: vec![ObjectEdge {
                cursor: None,
                address: address.to_string(),
                version: Some(1),
                type_repr: None,
                data: None,
            }],
            queries: Mutex::new(0),
            latency: std::time::Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self {
            edges: vec![],
            queries: Mutex::new(0),
            latency: std::time::Duration::ZERO,
        }
    }

    pub fn query_count(&self) -> usize {
        *self.queries.lock().unwrap()
    }
}

impl Indexer for MockIndexer {
    fn query_objects_page(
        &self,
        _object_type: &str,
        _owner: Option<&str>,
        _after: Option<&str>,
    ) -> Result<(Vec<ObjectEdge>, PageInfo), OidError> {
        *self.queries.lock().unwrap() += 1;
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok((self.edges.clone(), PageInfo::default()))
    }
}

/// Gas station with scripted failures and call counters.
pub struct MockStation {
    pub label: &'static str,
    pub fail_reserve: bool,
    pub fail_execute: bool,
    pub reserve_calls: Mutex<usize>,
    pub execute_calls: Mutex<usize>,
}

impl MockStation {
    pub fn working(label: &'static str) -> Self {
        Self {
            label,
            fail_reserve: false,
            fail_execute: false,
            reserve_calls: Mutex::new(0),
            execute_calls: Mutex::new(0),
        }
    }

    pub fn broken(label: &'static str) -> Self {
        Self {
            fail_reserve: true,
            ..Self::working(label)
        }
    }
}

impl GasStation for MockStation {
    fn reserve_gas(
        &self,
        _gas_budget: u64,
        _duration_secs: u64,
    ) -> Result<GasReservation, OidError> {
        *self.reserve_calls.lock().unwrap() += 1;
        if self.fail_reserve {
            return Err(OidError::RemoteService {
                status: 503,
                body: format!("{} reserve failed", self.label),
            });
        }
        Ok(GasReservation {
            sponsor_address: "0xsponsor".to_string(),
            reservation_id: 7,
            gas_coins: vec![ObjectRef {
                object_id: "0xgascoin".to_string(),
                version: 1,
                digest: "GD".to_string(),
            }],
        })
    }

    fn execute_tx(
        &self,
        _reservation_id: u64,
        _tx_bytes_b64: &str,
        _user_sig: &str,
    ) -> Result<Value, OidError> {
        *self.execute_calls.lock().unwrap() += 1;
        if self.fail_execute {
            return Err(OidError::RemoteService {
                status: 500,
                body: format!("{} execute failed", self.label),
            });
        }
        Ok(json!({
            "status": {"status": "success"},
            "transactionDigest": format!("D-{}", self.label),
        }))
    }
}

/// A baseline public configuration with every required key.
pub fn base_config() -> Value {
    json!({
        "network": "testnet",
        "graphqlProvider": "http://indexer.local/graphql",
        "objectPackages": ["0xA"],
        "objectDefaultPackageVersion": 0,
        "documentPackages": ["0xB"],
        "documentDefaultPackageVersion": 0,
        "IOTAidentityPackage": "0xip",
        "OIDidentityPackage": "0xop",
        "OIDcreditPackage": "0xcp",
    })
}

/// Build an on-chain config object record carrying `config` in its byte
/// `json` field.
pub fn config_object(object_id: &str, package: &str, version: u64, config: &Value) -> ObjectRecord {
    ObjectRecord {
        object_id: object_id.to_string(),
        version,
        object_type: Some(format!("{package}::oid_config::Config")),
        fields: json!({ "json": encode_json_field(config) }),
        digest: None,
    }
}

/// Network table pinning `object_id` as the default config for `network`.
pub fn pinned_network(network: &str, object_id: &str) -> NetworkTable {
    let mut table = NetworkTable::new();
    table.insert(
        network,
        NetworkEntry {
            default_config_object: object_id.to_string(),
            config_package: None,
            rpc_endpoint: None,
        },
    );
    table
}

pub fn config_map(value: Value) -> ConfigMap {
    ConfigMap::from_value(value)
}

/// Controller capability record.
pub fn cap_record(object_id: &str, package: &str, controller_of: &str, version: u64) -> ObjectRecord {
    ObjectRecord {
        object_id: object_id.to_string(),
        version,
        object_type: Some(format!("{package}::controller::ControllerCap")),
        fields: json!({ "controller_of": controller_of }),
        digest: None,
    }
}

/// Credit token record of the type derived from `credit_package`.
pub fn token_record(object_id: &str, credit_package: &str, balance: u64) -> ObjectRecord {
    ObjectRecord {
        object_id: object_id.to_string(),
        version: 1,
        object_type: Some(format!("0x2::token::Token<{credit_package}::oid::OID>")),
        fields: json!({ "balance": balance.to_string() }),
        digest: None,
    }
}
