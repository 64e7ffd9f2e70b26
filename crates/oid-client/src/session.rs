//! Session management.
//!
//! The stateful facade binding a decentralized identifier to its on-chain
//! controller capabilities and credit tokens. One state machine:
//! uninitialized -> (connect) -> ready -> (disconnect) -> uninitialized; a
//! failed connect lands back in uninitialized with the error returned.
//! Every session-dependent accessor goes through [`SessionManager::session`],
//! which fails fast with [`OidError::NotInitialized`] so callers can prompt
//! "connect first" instead of surfacing a generic failure.
//!
//! The session record is swapped whole on every transition - getters always
//! observe one consistent record, never a partially-updated one.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use oid_transport::gas_station::GasStation;
use oid_transport::indexer::Indexer;
use oid_transport::ledger::{LedgerRpc, ObjectRecord};
use oid_transport::network::{normalize_network, NetworkTable};
use oid_types::address::{addresses_equal, did_trailing_segment};
use oid_types::config::{keys, ConfigMap, ConfigSource, LoadedConfig};
use oid_types::{CallArg, OidError, RetryConfig, TxExecResult};

use crate::balance::extract_balance;
use crate::catalog::OidApi;
use crate::config_loader::ConfigLoader;
use crate::env::{credit_token_type, EnvResolver, Environment};

/// HTTP capability for the faucet POST; a seam so tests can count requests.
pub trait FaucetHttp: Send + Sync {
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, OidError>;
}

struct UreqFaucet {
    agent: ureq::Agent,
}

impl FaucetHttp for UreqFaucet {
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, OidError> {
        let response = match self.agent.post(url).send_json(body) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(OidError::RemoteService { status, body });
            }
            Err(e) => {
                return Err(OidError::RemoteService {
                    status: 0,
                    body: format!("faucet request failed: {e}"),
                })
            }
        };
        response
            .into_json()
            .map_err(|e| OidError::Rpc(format!("failed to parse faucet response: {e}")))
    }
}

/// Public snapshot of a ready session.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: String,
    pub network: String,
    pub address: String,
    pub config: LoadedConfig,
    pub iota_controller_cap: String,
    pub oid_controller_cap: String,
    pub credit_tokens: Vec<String>,
    pub active_token: Option<String>,
}

struct SessionState {
    session: Session,
    env: Arc<Environment>,
    api: Arc<OidApi>,
}

type CreditListener = Box<dyn Fn(&TxExecResult) + Send + Sync>;

pub struct SessionManager {
    rpc: Arc<dyn LedgerRpc>,
    networks: NetworkTable,
    state: Mutex<Option<Arc<SessionState>>>,
    listeners: Mutex<Vec<CreditListener>>,
    indexer_override: Option<Arc<dyn Indexer>>,
    station_override: Option<(Arc<dyn GasStation>, Option<Arc<dyn GasStation>>)>,
    faucet_http: Arc<dyn FaucetHttp>,
    faucet_retry: RetryConfig,
}

impl SessionManager {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            rpc,
            networks: NetworkTable::builtin(),
            state: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            indexer_override: None,
            station_override: None,
            faucet_http: Arc::new(UreqFaucet {
                agent: oid_transport::default_agent(),
            }),
            faucet_retry: RetryConfig::default(),
        }
    }

    pub fn with_networks(mut self, networks: NetworkTable) -> Self {
        self.networks = networks;
        self
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.indexer_override = Some(indexer);
        self
    }

    pub fn with_stations(
        mut self,
        primary: Arc<dyn GasStation>,
        secondary: Option<Arc<dyn GasStation>>,
    ) -> Self {
        self.station_override = Some((primary, secondary));
        self
    }

    pub fn with_faucet_http(mut self, http: Arc<dyn FaucetHttp>) -> Self {
        self.faucet_http = http;
        self
    }

    pub fn with_faucet_retry(mut self, retry: RetryConfig) -> Self {
        self.faucet_retry = retry;
        self
    }

    fn loader(&self) -> ConfigLoader {
        ConfigLoader::new(self.rpc.clone(), self.networks.clone())
    }

    /// Establish a session: load the network's official config, resolve the
    /// environment, match both controller capabilities, and list owned
    /// credit tokens.
    pub fn connect(&self, identity: &str, seed: &str, network: &str) -> Result<Session, OidError> {
        // A failed connect must land back in uninitialized.
        *self.state.lock() = None;

        let network = normalize_network(network);
        info!(identity, network = %network, "connecting session");

        let loaded = self.loader().load_public_config(&network)?;
        let config = loaded.config.clone();

        let mut resolver = EnvResolver::new(config.clone(), seed, None);
        if let Some(indexer) = &self.indexer_override {
            resolver = resolver.with_indexer(indexer.clone());
        }
        let env = resolver.resolve()?;

        let iota_package = config.require_str(keys::IOTA_IDENTITY_PACKAGE)?;
        let oid_package = config.require_str(keys::OID_IDENTITY_PACKAGE)?;
        let segment = did_trailing_segment(identity);

        let iota_cap = self.match_capability(&env.sender, iota_package, identity, segment)?;
        let oid_cap = self.match_capability(&env.sender, oid_package, identity, segment)?;

        // Zero credit tokens is fine: a session may exist purely to request
        // an initial grant.
        let credit_tokens = self.list_credit_tokens(&config, &env.sender)?;
        let active_token = credit_tokens.first().map(|t| t.object_id.clone());

        let mut api = OidApi::new(self.rpc.clone(), resolver);
        if let Some((primary, secondary)) = &self.station_override {
            api = api.with_stations(primary.clone(), secondary.clone());
        }

        let session = Session {
            identity: identity.to_string(),
            network,
            address: env.sender.clone(),
            config: loaded,
            iota_controller_cap: iota_cap,
            oid_controller_cap: oid_cap,
            credit_tokens: credit_tokens.iter().map(|t| t.object_id.clone()).collect(),
            active_token,
        };

        *self.state.lock() = Some(Arc::new(SessionState {
            session: session.clone(),
            env,
            api: Arc::new(api),
        }));

        Ok(session)
    }

    pub fn disconnect(&self) {
        info!("disconnecting session");
        *self.state.lock() = None;
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().is_some()
    }

    fn ensure_state(&self) -> Result<Arc<SessionState>, OidError> {
        self.state.lock().clone().ok_or(OidError::NotInitialized)
    }

    /// Current session snapshot; `NotInitialized` before connect.
    pub fn session(&self) -> Result<Session, OidError> {
        Ok(self.ensure_state()?.session.clone())
    }

    pub fn address(&self) -> Result<String, OidError> {
        Ok(self.ensure_state()?.session.address.clone())
    }

    pub fn identity(&self) -> Result<String, OidError> {
        Ok(self.ensure_state()?.session.identity.clone())
    }

    pub fn iota_controller_cap(&self) -> Result<String, OidError> {
        Ok(self.ensure_state()?.session.iota_controller_cap.clone())
    }

    pub fn oid_controller_cap(&self) -> Result<String, OidError> {
        Ok(self.ensure_state()?.session.oid_controller_cap.clone())
    }

    pub fn active_token(&self) -> Result<Option<String>, OidError> {
        Ok(self.ensure_state()?.session.active_token.clone())
    }

    /// Register a listener notified after every successful execution.
    pub fn on_credit_change(&self, listener: impl Fn(&TxExecResult) + Send + Sync + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    fn notify(&self, result: &TxExecResult) {
        for listener in self.listeners.lock().iter() {
            listener(result);
        }
    }

    /// Execute a catalog operation within the session.
    pub fn execute(&self, name: &str, args: Vec<CallArg>) -> Result<TxExecResult, OidError> {
        let state = self.ensure_state()?;
        let callback = |result: &TxExecResult| {
            if result.success {
                self.notify(result);
            }
        };
        state.api.execute(name, args, Some(&callback))
    }

    /// Fetch the official configuration fresh, optionally overlaid with a
    /// caller override (raw JSON, `{json}` wrapper, `{objectId}` wrapper, or
    /// a bare object-id string). The override wins key-by-key; session state
    /// is not mutated.
    pub fn config(
        &self,
        network: Option<&str>,
        custom: Option<&Value>,
    ) -> Result<LoadedConfig, OidError> {
        let network = match network {
            Some(n) => normalize_network(n),
            None => self.ensure_state()?.session.network.clone(),
        };
        let official = self.loader().load_public_config(&network)?;

        let Some(custom) = custom else {
            return Ok(official);
        };

        let (overlay, source, object_id) = self.interpret_override(custom)?;
        let merged = official.config.merged_with(&overlay);
        Ok(LoadedConfig::new(merged, source, object_id))
    }

    fn interpret_override(
        &self,
        custom: &Value,
    ) -> Result<(ConfigMap, ConfigSource, String), OidError> {
        // Bare object-id string.
        if let Some(id) = custom.as_str() {
            let loaded = self.loader().load_config_object(id)?;
            return Ok((loaded.config, ConfigSource::Object, loaded.object_id));
        }
        let Some(map) = custom.as_object() else {
            return Err(OidError::Codec(
                "unsupported config override shape".to_string(),
            ));
        };
        // {objectId} wrapper, resolved by on-chain lookup.
        if let Some(id) = map.get("objectId").and_then(|v| v.as_str()) {
            let loaded = self.loader().load_config_object(id)?;
            return Ok((loaded.config, ConfigSource::Object, loaded.object_id));
        }
        // {json} wrapper around a raw config object.
        if let Some(inner) = map.get("json") {
            return Ok((
                ConfigMap::from_value(inner.clone()),
                ConfigSource::Manual,
                String::new(),
            ));
        }
        // Raw JSON object.
        Ok((
            ConfigMap::from_value(custom.clone()),
            ConfigSource::Manual,
            String::new(),
        ))
    }

    /// Refresh the owned credit-token list and optionally switch the active
    /// selection. The requested token must be owned.
    pub fn credit_token(&self, address: Option<&str>) -> Result<Option<String>, OidError> {
        let state = self.ensure_state()?;
        let tokens = self.list_credit_tokens(&state.session.config.config, &state.session.address)?;
        let ids: Vec<String> = tokens.iter().map(|t| t.object_id.clone()).collect();

        let active = match address {
            Some(wanted) => {
                let owned = ids.iter().find(|id| addresses_equal(id, wanted)).cloned();
                Some(owned.ok_or_else(|| {
                    OidError::Other(anyhow::anyhow!("credit token {wanted} is not owned"))
                })?)
            }
            None => state
                .session
                .active_token
                .clone()
                .filter(|prev| ids.iter().any(|id| addresses_equal(id, prev)))
                .or_else(|| ids.first().cloned()),
        };

        self.swap_tokens(&state, ids, active.clone());
        Ok(active)
    }

    /// Total balance across owned credit tokens.
    pub fn credit_balance(&self) -> Result<u64, OidError> {
        let state = self.ensure_state()?;
        let tokens = self.list_credit_tokens(&state.session.config.config, &state.session.address)?;
        Ok(tokens
            .iter()
            .filter_map(|t| extract_balance(&t.fields))
            .sum())
    }

    /// Request an initial credit grant from the testnet faucet, then poll
    /// for the minted token and merge fragments into one survivor.
    ///
    /// Only valid on a testnet session; the check precedes any HTTP.
    pub fn faucet(&self) -> Result<String, OidError> {
        let state = self.ensure_state()?;
        if state.session.network != "testnet" {
            return Err(OidError::FaucetUnavailable(format!(
                "faucet is only available on testnet, not `{}`",
                state.session.network
            )));
        }

        let fresh = self.loader().load_public_config("testnet")?;
        let faucet_url = fresh
            .config
            .opt_str(keys::FAUCET_URL)
            .ok_or_else(|| OidError::FaucetUnavailable("no faucetURL configured".to_string()))?
            .to_string();
        let credit_package = fresh.config.require_str(keys::OID_CREDIT_PACKAGE)?.to_string();

        let before = state.session.credit_tokens.len();
        self.faucet_http.post_json(
            &faucet_url,
            &json!({
                "creditPackage": credit_package,
                "address": state.session.address,
            }),
        )?;
        info!(address = %state.session.address, "faucet grant requested");

        // Index visibility after the mint is eventually consistent.
        let polled = oid_types::retry::retry_until(self.faucet_retry, || {
            let tokens = self
                .list_credit_tokens(&fresh.config, &state.session.address)
                .ok()?;
            (tokens.len() > before).then_some(tokens)
        });
        let tokens = match polled {
            Some(tokens) => tokens,
            None => self.list_credit_tokens(&fresh.config, &state.session.address)?,
        };

        let mut message = "credits minted".to_string();
        let mut ids: Vec<String> = tokens.iter().map(|t| t.object_id.clone()).collect();

        if ids.len() > 1 {
            // Prefer the previously active token as the merge survivor.
            let survivor = state
                .session
                .active_token
                .clone()
                .filter(|prev| ids.iter().any(|id| addresses_equal(id, prev)))
                .unwrap_or_else(|| ids[0].clone());

            let mut join_failed = false;
            for victim in ids.iter().filter(|id| !addresses_equal(id, &survivor)) {
                let joined = state.api.execute(
                    "join_credits",
                    vec![
                        CallArg::Object(survivor.clone()),
                        CallArg::Object(victim.clone()),
                    ],
                    None,
                );
                match joined {
                    Ok(result) if result.success => {}
                    Ok(result) => {
                        warn!(victim = %victim, error = ?result.error, "token join rejected");
                        join_failed = true;
                    }
                    Err(e) => {
                        warn!(victim = %victim, error = %e, "token join failed");
                        join_failed = true;
                    }
                }
            }

            // The mint itself already succeeded; a failed join only softens
            // the report.
            if join_failed {
                message = "credits minted; token merge incomplete".to_string();
            }

            ids = self
                .list_credit_tokens(&fresh.config, &state.session.address)?
                .iter()
                .map(|t| t.object_id.clone())
                .collect();
            let active = ids
                .iter()
                .find(|id| addresses_equal(id, &survivor))
                .cloned()
                .or_else(|| ids.first().cloned());
            self.swap_tokens(&state, ids, active);
        } else {
            let active = ids.first().cloned();
            self.swap_tokens(&state, ids, active);
        }

        Ok(message)
    }

    /// Replace the session record with updated token state (whole-record
    /// swap; readers never see a half-updated session).
    fn swap_tokens(&self, state: &Arc<SessionState>, tokens: Vec<String>, active: Option<String>) {
        let mut session = state.session.clone();
        session.credit_tokens = tokens;
        session.active_token = active;
        *self.state.lock() = Some(Arc::new(SessionState {
            session,
            env: state.env.clone(),
            api: state.api.clone(),
        }));
    }

    fn list_credit_tokens(
        &self,
        config: &ConfigMap,
        owner: &str,
    ) -> Result<Vec<ObjectRecord>, OidError> {
        let credit_package = config.require_str(keys::OID_CREDIT_PACKAGE)?;
        let token_type = credit_token_type(credit_package);
        self.rpc.get_owned_objects_all(owner, Some(&token_type))
    }

    fn match_capability(
        &self,
        owner: &str,
        package: &str,
        identity: &str,
        segment: &str,
    ) -> Result<String, OidError> {
        let cap_type = format!("{package}::controller::ControllerCap");
        let candidates = self.rpc.get_owned_objects_all(owner, Some(&cap_type))?;
        debug!(cap_type = %cap_type, candidates = candidates.len(), "matching controller capability");

        select_controller_cap(candidates, segment)
            .map(|cap| cap.object_id)
            .ok_or_else(|| OidError::ControllerCapNotFound {
                cap_type,
                identity: identity.to_string(),
            })
    }
}

/// The `controller_of` field, read directly or via the one documented
/// nested path (`controller_of.fields.id`).
fn controller_of(fields: &Value) -> Option<&str> {
    let field = fields.get("controller_of")?;
    field
        .as_str()
        .or_else(|| field.get("fields")?.get("id")?.as_str())
}

/// Deterministic capability selection: among candidates whose
/// `controller_of` equals the identity segment, take the highest version;
/// ties break to the lexicographically smallest address. Never ambiguous,
/// never random.
fn select_controller_cap(candidates: Vec<ObjectRecord>, segment: &str) -> Option<ObjectRecord> {
    candidates
        .into_iter()
        .filter(|cap| controller_of(&cap.fields).is_some_and(|of| addresses_equal(of, segment)))
        .max_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| b.object_id.cmp(&a.object_id))
        })
}
