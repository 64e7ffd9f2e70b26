//! Ledger RPC collaborator.
//!
//! The core treats the distributed-ledger client as an opaque RPC service:
//! object fetch, owned-object listing (cursor-paginated), transaction
//! submission, and wait-for-finality. [`LedgerRpc`] is the seam; tests
//! substitute in-memory implementations, production code uses
//! [`JsonRpcLedger`].

use serde_json::{json, Value};
use tracing::debug;

use oid_types::OidError;

use crate::default_agent;

/// One on-chain object as the RPC surfaces it.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub object_id: String,
    pub version: u64,
    /// Exact struct type, e.g. `0xa::oid_config::Config`.
    pub object_type: Option<String>,
    /// Decoded Move field contents (`content.fields`).
    pub fields: Value,
    pub digest: Option<String>,
}

/// One page of an owned-objects listing.
#[derive(Debug, Clone, Default)]
pub struct OwnedObjectsPage {
    pub objects: Vec<ObjectRecord>,
    pub has_next_page: bool,
    pub next_cursor: Option<String>,
}

/// Result of submitting or awaiting a transaction.
#[derive(Debug, Clone)]
pub struct TxResponse {
    pub digest: String,
    /// Execution status as reported by the node (`success` or a failure
    /// description).
    pub status: String,
    pub effects: Option<Value>,
}

impl TxResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// The ledger RPC capability the core depends on.
pub trait LedgerRpc: Send + Sync {
    fn get_object(&self, object_id: &str) -> Result<ObjectRecord, OidError>;

    fn get_owned_objects(
        &self,
        owner: &str,
        type_filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<OwnedObjectsPage, OidError>;

    /// Submit signed transaction bytes.
    fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signatures: &[String],
    ) -> Result<TxResponse, OidError>;

    /// Wait until the transaction is final and return its effects.
    fn wait_for_transaction(&self, digest: &str) -> Result<TxResponse, OidError>;

    /// List all owned objects of a type, looping pages sequentially.
    fn get_owned_objects_all(
        &self,
        owner: &str,
        type_filter: Option<&str>,
    ) -> Result<Vec<ObjectRecord>, OidError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.get_owned_objects(owner, type_filter, cursor.as_deref())?;
            all.extend(page.objects);
            match (page.has_next_page, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(all)
    }
}

/// Thin JSON-RPC HTTP binding of [`LedgerRpc`].
#[derive(Clone)]
pub struct JsonRpcLedger {
    endpoint: String,
    agent: ureq::Agent,
}

impl JsonRpcLedger {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: default_agent(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, OidError> {
        debug!(method, "ledger rpc call");
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = match self.agent.post(&self.endpoint).send_json(&body) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(OidError::RemoteService { status, body });
            }
            Err(e) => {
                return Err(OidError::RemoteService {
                    status: 0,
                    body: format!("rpc request failed: {e}"),
                })
            }
        };

        let payload: Value = response
            .into_json()
            .map_err(|e| OidError::Rpc(format!("failed to parse rpc response: {e}")))?;

        if let Some(err) = payload.get("error") {
            return Err(OidError::Rpc(format!("{method} failed: {err}")));
        }

        payload
            .get("result")
            .cloned()
            .ok_or_else(|| OidError::Rpc(format!("{method}: no result in response")))
    }
}

/// Parse the RPC's object envelope (`data.{objectId, version, type,
/// content.fields, digest}`) into an [`ObjectRecord`].
fn parse_object(value: &Value) -> Result<ObjectRecord, OidError> {
    let data = value.get("data").unwrap_or(value);
    let object_id = data
        .get("objectId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| OidError::Rpc("object response missing objectId".to_string()))?
        .to_string();
    let version = data
        .get("version")
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        })
        .unwrap_or(0);
    Ok(ObjectRecord {
        object_id,
        version,
        object_type: data
            .get("type")
            .and_then(|v| v.as_str())
            .map(String::from),
        fields: data
            .get("content")
            .and_then(|c| c.get("fields"))
            .cloned()
            .unwrap_or(Value::Null),
        digest: data
            .get("digest")
            .and_then(|v| v.as_str())
            .map(String::from),
    })
}

fn parse_tx_response(value: &Value) -> Result<TxResponse, OidError> {
    let digest = value
        .get("digest")
        .and_then(|v| v.as_str())
        .ok_or_else(|| OidError::Rpc("transaction response missing digest".to_string()))?
        .to_string();
    let status = value
        .get("effects")
        .and_then(|e| e.get("status"))
        .and_then(|s| s.get("status").or(Some(s)))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string();
    Ok(TxResponse {
        digest,
        status,
        effects: value.get("effects").cloned(),
    })
}

impl LedgerRpc for JsonRpcLedger {
    fn get_object(&self, object_id: &str) -> Result<ObjectRecord, OidError> {
        let result = self.call(
            "oid_getObject",
            json!([object_id, {"showContent": true, "showType": true}]),
        )?;
        parse_object(&result)
    }

    fn get_owned_objects(
        &self,
        owner: &str,
        type_filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<OwnedObjectsPage, OidError> {
        let filter = type_filter.map(|t| json!({"StructType": t}));
        let result = self.call(
            "oid_getOwnedObjects",
            json!([
                owner,
                {"filter": filter, "options": {"showContent": true, "showType": true}},
                cursor,
            ]),
        )?;

        let objects = result
            .get("data")
            .and_then(|d| d.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| parse_object(item).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(OwnedObjectsPage {
            objects,
            has_next_page: result
                .get("hasNextPage")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            next_cursor: result
                .get("nextCursor")
                .and_then(|v| v.as_str())
                .map(String::from),
        })
    }

    fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signatures: &[String],
    ) -> Result<TxResponse, OidError> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(tx_bytes);
        let result = self.call(
            "oid_executeTransaction",
            json!([encoded, signatures, {"showEffects": true}]),
        )?;
        parse_tx_response(&result)
    }

    fn wait_for_transaction(&self, digest: &str) -> Result<TxResponse, OidError> {
        let result = self.call(
            "oid_waitForTransaction",
            json!([digest, {"showEffects": true}]),
        )?;
        parse_tx_response(&result)
    }
}
