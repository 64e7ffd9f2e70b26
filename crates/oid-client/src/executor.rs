//! Transaction execution.
//!
//! One entry point, two paths. The direct path signs locally and submits
//! through the ledger RPC; it never returns `Err` - every failure is folded
//! into `TxExecResult { success: false, .. }` so callers render "try again"
//! instead of crashing. The sponsored path reserves gas from a relay, has
//! the relay submit the signed bytes, and falls back once to a configured
//! secondary relay; if both fail, the primary's error propagates.
//!
//! In both paths an optional `on_executed` callback observes the final
//! result exactly once. It is infallible by construction and panics inside
//! it are contained; it can never alter the returned result.

use serde_json::Value;
use tracing::{debug, warn};

use oid_transport::gas_station::GasStation;
use oid_transport::ledger::LedgerRpc;
use oid_types::transaction::created_object_id;
use oid_types::{OidError, TransactionData, TxExecResult};

use crate::signer::{serialize_signature, Signer};

/// How long a relay gas reservation is held.
pub const RESERVE_DURATION_SECS: u64 = 30;

/// Callback observing the final execution result.
pub type OnExecuted<'a> = &'a (dyn Fn(&TxExecResult) + Send + Sync);

/// Execution options for one transaction.
pub struct ExecOptions<'a> {
    pub gas_budget: u64,
    pub use_gas_station: bool,
    pub gas_station: Option<&'a dyn GasStation>,
    pub gas_station_secondary: Option<&'a dyn GasStation>,
    pub on_executed: Option<OnExecuted<'a>>,
}

impl<'a> ExecOptions<'a> {
    pub fn direct(gas_budget: u64) -> Self {
        Self {
            gas_budget,
            use_gas_station: false,
            gas_station: None,
            gas_station_secondary: None,
            on_executed: None,
        }
    }
}

/// Build, sign, and submit one transaction.
pub fn sign_and_execute(
    rpc: &dyn LedgerRpc,
    signer: &dyn Signer,
    tx: TransactionData,
    opts: &ExecOptions<'_>,
) -> Result<TxExecResult, OidError> {
    let outcome = if opts.use_gas_station {
        execute_sponsored(signer, tx, opts)
    } else {
        Ok(execute_direct(rpc, signer, tx, opts.gas_budget))
    };

    // The callback sees the final result exactly once, success or failure,
    // and cannot change what we return.
    if let Some(callback) = opts.on_executed {
        let snapshot = match &outcome {
            Ok(result) => result.clone(),
            Err(e) => TxExecResult::failure(e.to_string()),
        };
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(&snapshot)));
    }

    outcome
}

/// Direct self-paid submission. Never returns `Err`.
fn execute_direct(
    rpc: &dyn LedgerRpc,
    signer: &dyn Signer,
    mut tx: TransactionData,
    gas_budget: u64,
) -> TxExecResult {
    tx.set_sender(signer.address());
    tx.set_gas_budget(gas_budget);

    let attempt = || -> Result<TxExecResult, OidError> {
        let bytes = tx.to_bytes()?;
        let signature = serialize_signature(signer, &bytes);
        let submitted = rpc.execute_transaction(&bytes, &[signature])?;
        let final_state = rpc.wait_for_transaction(&submitted.digest)?;

        debug!(digest = %final_state.digest, status = %final_state.status, "transaction executed");

        let created = final_state
            .effects
            .as_ref()
            .and_then(created_object_id);
        let mut result = if final_state.is_success() {
            TxExecResult::success(final_state.digest, final_state.status, final_state.effects)
        } else {
            TxExecResult {
                success: false,
                digest: Some(final_state.digest),
                status: Some(final_state.status.clone()),
                error: Some(final_state.status),
                effects: final_state.effects,
                created_object: None,
            }
        };
        result.created_object = created.filter(|_| result.success);
        Ok(result)
    };

    match attempt() {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "direct execution failed");
            TxExecResult::failure(e.to_string())
        }
    }
}

/// Sponsored submission through a relay, with one sequential fallback.
fn execute_sponsored(
    signer: &dyn Signer,
    tx: TransactionData,
    opts: &ExecOptions<'_>,
) -> Result<TxExecResult, OidError> {
    let primary = opts.gas_station.ok_or_else(|| {
        OidError::MissingConfigField("gasStationURL/gasStationToken".to_string())
    })?;

    match execute_via_station(signer, tx.clone(), primary, opts.gas_budget) {
        Ok(result) => Ok(result),
        Err(primary_err) => match opts.gas_station_secondary {
            Some(secondary) => {
                warn!(error = %primary_err, "primary gas station failed, trying secondary");
                match execute_via_station(signer, tx, secondary, opts.gas_budget) {
                    Ok(result) => Ok(result),
                    // Both relays failed: the original error propagates.
                    Err(secondary_err) => {
                        warn!(error = %secondary_err, "secondary gas station failed");
                        Err(primary_err)
                    }
                }
            }
            None => Err(primary_err),
        },
    }
}

fn execute_via_station(
    signer: &dyn Signer,
    mut tx: TransactionData,
    station: &dyn GasStation,
    gas_budget: u64,
) -> Result<TxExecResult, OidError> {
    use base64::Engine;

    let reservation = station.reserve_gas(gas_budget, RESERVE_DURATION_SECS)?;
    debug!(
        reservation_id = reservation.reservation_id,
        sponsor = %reservation.sponsor_address,
        "gas reserved"
    );

    tx.set_sender(signer.address());
    tx.set_gas_owner(reservation.sponsor_address);
    tx.set_gas_payment(reservation.gas_coins);
    tx.set_gas_budget(gas_budget);

    let bytes = tx.to_bytes()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let signature = serialize_signature(signer, &bytes);

    let effects = station.execute_tx(reservation.reservation_id, &encoded, &signature)?;
    Ok(map_relay_effects(effects))
}

fn map_relay_effects(effects: Value) -> TxExecResult {
    let status = effects
        .get("status")
        .and_then(|s| s.get("status").or(Some(s)))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string();
    let digest = effects
        .get("transactionDigest")
        .or_else(|| effects.get("digest"))
        .and_then(|d| d.as_str())
        .map(String::from);
    let success = status == "success";
    let created = created_object_id(&effects).filter(|_| success);

    TxExecResult {
        success,
        digest,
        error: (!success).then(|| status.clone()),
        status: Some(status),
        effects: Some(effects),
        created_object: created,
    }
}
