//! Transaction data, call arguments, and execution results.
//!
//! A [`TransactionData`] is the client-side representation of one ledger
//! transaction: sender, gas parameters, and a list of Move calls. It is
//! BCS-serialized into the byte payload that the signer signs and the RPC
//! (or sponsor relay) submits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OidError;

/// The network-reserved shared clock object.
pub const CLOCK_OBJECT_ID: &str = "0x6";

/// One positional argument of a Move call.
///
/// The variants cover exactly the encodings the remote entry points take:
/// strings, unsigned integers of fixed widths, addresses, object references,
/// and the literal shared clock reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallArg {
    Str(String),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Address(String),
    /// Reference to an owned or shared object by id.
    Object(String),
    /// The shared clock object (`0x6`).
    Clock,
}

/// A single Move entry-point invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<CallArg>,
}

impl MoveCall {
    /// Fully-qualified target, e.g. `0xa::oid_object::new_oid`.
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// A reference to a specific object version, as used for gas payment coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(alias = "objectId")]
    pub object_id: String,
    pub version: u64,
    pub digest: String,
}

/// Client-side transaction under construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionData {
    pub sender: Option<String>,
    pub gas_budget: Option<u64>,
    /// Payer address when it differs from the sender (sponsored execution).
    pub gas_owner: Option<String>,
    /// Coins reserved to pay for gas (sponsored execution).
    pub gas_payment: Vec<ObjectRef>,
    pub calls: Vec<MoveCall>,
}

impl TransactionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_call(mut self, call: MoveCall) -> Self {
        self.calls.push(call);
        self
    }

    pub fn set_sender(&mut self, sender: impl Into<String>) {
        self.sender = Some(sender.into());
    }

    pub fn set_gas_budget(&mut self, budget: u64) {
        self.gas_budget = Some(budget);
    }

    pub fn set_gas_owner(&mut self, owner: impl Into<String>) {
        self.gas_owner = Some(owner.into());
    }

    pub fn set_gas_payment(&mut self, coins: Vec<ObjectRef>) {
        self.gas_payment = coins;
    }

    /// BCS-encode the transaction into the signable byte payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, OidError> {
        bcs::to_bytes(self).map_err(|e| OidError::Codec(format!("bcs encoding failed: {e}")))
    }
}

/// Outcome of one transaction attempt. Immutable once produced.
///
/// Execution failure is part of this value (`success == false`), never an
/// `Err` from the executor's direct path: callers check the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxExecResult {
    pub success: bool,
    pub digest: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub effects: Option<Value>,
    /// Present when the operation creates an object.
    pub created_object: Option<String>,
}

impl TxExecResult {
    pub fn success(digest: impl Into<String>, status: impl Into<String>, effects: Option<Value>) -> Self {
        Self {
            success: true,
            digest: Some(digest.into()),
            status: Some(status.into()),
            error: None,
            effects,
            created_object: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            digest: None,
            status: None,
            error: Some(error.into()),
            effects: None,
            created_object: None,
        }
    }

    pub fn with_created_object(mut self, id: Option<String>) -> Self {
        self.created_object = id;
        self
    }
}

/// Extract the first created object id from a raw effects payload.
///
/// Effects shapes vary between the RPC and relay responses; both list
/// created objects either as `created: [{reference: {objectId}}]` or as
/// `created: [{objectId}]`.
pub fn created_object_id(effects: &Value) -> Option<String> {
    let created = effects.get("created")?.as_array()?;
    let first = created.first()?;
    let id = first
        .get("reference")
        .and_then(|r| r.get("objectId"))
        .or_else(|| first.get("objectId"))?;
    id.as_str().map(String::from)
}
