//! Sponsor relay ("gas station") client.
//!
//! The relay reserves gas coins on the user's behalf and submits the signed
//! transaction bytes, paying fees from its own sponsor address. Two calls:
//!
//! - `POST {base}/v1/reserve_gas` with `{gas_budget, reserve_duration_secs}`
//! - `POST {base}/v1/execute_tx` with `{reservation_id, tx_bytes, user_sig}`
//!
//! Both carry `Authorization: Bearer <token>`; non-2xx responses are fatal
//! with the parsed body attached for diagnostics.

use serde_json::{json, Value};
use tracing::debug;

use oid_types::{ObjectRef, OidError};

use crate::default_agent;

/// Endpoint + token pair for one relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasStationConfig {
    pub url: String,
    pub token: String,
}

/// A successful gas reservation.
#[derive(Debug, Clone)]
pub struct GasReservation {
    pub sponsor_address: String,
    pub reservation_id: u64,
    pub gas_coins: Vec<ObjectRef>,
}

/// The relay capability the executor depends on. Implemented by the HTTP
/// client below and by scripted mocks in tests.
pub trait GasStation: Send + Sync {
    fn reserve_gas(&self, gas_budget: u64, duration_secs: u64) -> Result<GasReservation, OidError>;

    /// Submit base64 transaction bytes plus the user signature; returns the
    /// raw effects payload.
    fn execute_tx(
        &self,
        reservation_id: u64,
        tx_bytes_b64: &str,
        user_sig: &str,
    ) -> Result<Value, OidError>;
}

/// HTTP implementation of [`GasStation`].
#[derive(Clone)]
pub struct GasStationClient {
    base: String,
    token: String,
    agent: ureq::Agent,
}

impl GasStationClient {
    pub fn new(config: &GasStationConfig) -> Self {
        Self {
            base: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            agent: default_agent(),
        }
    }

    fn post(&self, path: &str, body: Value) -> Result<Value, OidError> {
        let url = format!("{}{}", self.base, path);
        debug!(url = %url, "gas station request");

        let response = match self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(&body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(OidError::RemoteService { status, body });
            }
            Err(e) => {
                return Err(OidError::RemoteService {
                    status: 0,
                    body: format!("gas station request failed: {e}"),
                })
            }
        };

        response
            .into_json()
            .map_err(|e| OidError::Rpc(format!("failed to parse gas station response: {e}")))
    }
}

impl GasStation for GasStationClient {
    fn reserve_gas(&self, gas_budget: u64, duration_secs: u64) -> Result<GasReservation, OidError> {
        let payload = self.post(
            "/v1/reserve_gas",
            json!({
                "gas_budget": gas_budget,
                "reserve_duration_secs": duration_secs,
            }),
        )?;
        parse_reservation(&payload)
    }

    fn execute_tx(
        &self,
        reservation_id: u64,
        tx_bytes_b64: &str,
        user_sig: &str,
    ) -> Result<Value, OidError> {
        let payload = self.post(
            "/v1/execute_tx",
            json!({
                "reservation_id": reservation_id,
                "tx_bytes": tx_bytes_b64,
                "user_sig": user_sig,
            }),
        )?;
        payload
            .get("effects")
            .cloned()
            .ok_or_else(|| OidError::Rpc("gas station response missing effects".to_string()))
    }
}

fn parse_reservation(payload: &Value) -> Result<GasReservation, OidError> {
    let result = payload
        .get("result")
        .ok_or_else(|| OidError::Rpc("gas station response missing result".to_string()))?;

    let sponsor_address = result
        .get("sponsor_address")
        .and_then(|v| v.as_str())
        .ok_or_else(|| OidError::Rpc("reservation missing sponsor_address".to_string()))?
        .to_string();
    let reservation_id = result
        .get("reservation_id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| OidError::Rpc("reservation missing reservation_id".to_string()))?;

    let gas_coins = result
        .get("gas_coins")
        .and_then(|v| v.as_array())
        .map(|coins| {
            coins
                .iter()
                .filter_map(|coin| {
                    Some(ObjectRef {
                        object_id: coin.get("objectId")?.as_str()?.to_string(),
                        version: coin.get("version")?.as_u64()?,
                        digest: coin
                            .get("digest")
                            .and_then(|d| d.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(GasReservation {
        sponsor_address,
        reservation_id,
        gas_coins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reservation() {
        let payload = json!({
            "result": {
                "sponsor_address": "0xsponsor",
                "reservation_id": 42,
                "gas_coins": [
                    {"objectId": "0xcoin", "version": 3, "digest": "D"}
                ]
            }
        });
        let res = parse_reservation(&payload).unwrap();
        assert_eq!(res.sponsor_address, "0xsponsor");
        assert_eq!(res.reservation_id, 42);
        assert_eq!(res.gas_coins.len(), 1);
        assert_eq!(res.gas_coins[0].object_id, "0xcoin");
    }

    #[test]
    fn test_parse_reservation_missing_result() {
        assert!(parse_reservation(&json!({})).is_err());
        assert!(parse_reservation(&json!({"result": {}})).is_err());
    }
}
