//! Execution-environment resolution.
//!
//! Turns a validated configuration plus a seed into everything a method
//! call needs: the signer, the sender address, the versioned package
//! addresses, the policy object discovered by index query, and the derived
//! type strings used for later filtering.
//!
//! Resolution is memoized per resolver instance with single-flight
//! semantics: the whole resolution runs under a mutex, so concurrent
//! callers arriving before the first resolution completes block and then
//! share the cached environment - exactly one policy lookup is issued.
//! Validation happens before any network I/O.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use oid_transport::gas_station::GasStationConfig;
use oid_transport::indexer::{Indexer, IndexerClient};
use oid_types::config::{keys, ConfigMap};
use oid_types::OidError;

use crate::signer::{Ed25519Signer, Signer};

/// Fixed fallback when neither the config nor the caller supplies a budget.
pub const DEFAULT_GAS_BUDGET: u64 = 50_000_000;

/// Type of the policy object governing credit-token rules, parameterized by
/// the package that published the OID token.
pub fn policy_type(package: &str) -> String {
    format!("0x2::token::TokenPolicy<{package}::oid::OID>")
}

/// Type of an owned credit-token object.
pub fn credit_token_type(package: &str) -> String {
    format!("0x2::token::Token<{package}::oid::OID>")
}

/// Type of an OID object published by the given package.
pub fn oid_object_type(package: &str) -> String {
    format!("{package}::oid_object::Oid")
}

/// Fully-derived, immutable execution environment.
pub struct Environment {
    pub signer: Arc<dyn Signer>,
    pub sender: String,
    pub network: String,
    /// Indexing-service endpoint the environment was resolved against.
    pub graphql_provider: String,
    pub indexer: Arc<dyn Indexer>,
    /// `objectPackages[objectDefaultPackageVersion]`.
    pub package_id: String,
    /// `documentPackages[documentDefaultPackageVersion]`.
    pub document_package_id: String,
    /// Publisher of the OID token type (`OIDcreditPackage`; falls back to
    /// the object package when unset).
    pub credit_package_id: String,
    /// Policy object discovered by type-filtered index query.
    pub policy: String,
    pub credit_token_type: String,
    pub oid_object_type: String,
    pub gas_budget: u64,
    pub use_gas_station: bool,
    pub gas_station: Option<GasStationConfig>,
    pub gas_station_secondary: Option<GasStationConfig>,
}

/// Lazily resolves and memoizes an [`Environment`] from a configuration.
pub struct EnvResolver {
    config: ConfigMap,
    seed: String,
    seed_path: Option<String>,
    /// Injected indexer (tests); when absent, an HTTP client is built from
    /// the config's `graphqlProvider`.
    indexer_override: Option<Arc<dyn Indexer>>,
    resolved: Mutex<Option<Arc<Environment>>>,
}

impl EnvResolver {
    pub fn new(config: ConfigMap, seed: impl Into<String>, seed_path: Option<String>) -> Self {
        Self {
            config,
            seed: seed.into(),
            seed_path,
            indexer_override: None,
            resolved: Mutex::new(None),
        }
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.indexer_override = Some(indexer);
        self
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Resolve the environment, memoized.
    ///
    /// Holding the lock across the whole resolution is what makes this
    /// single-flight: a second caller blocks until the first resolution
    /// settles, then reads the cache instead of issuing its own lookups.
    pub fn resolve(&self) -> Result<Arc<Environment>, OidError> {
        let mut slot = self.resolved.lock();
        if let Some(env) = slot.as_ref() {
            return Ok(env.clone());
        }
        let env = Arc::new(self.resolve_inner()?);
        *slot = Some(env.clone());
        Ok(env)
    }

    fn resolve_inner(&self) -> Result<Environment, OidError> {
        // Validation first; no network I/O may precede it.
        let network = self.config.require_str(keys::NETWORK)?.to_string();
        let graphql_provider = self.config.require_str(keys::GRAPHQL_PROVIDER)?.to_string();
        let object_packages = self.config.require_str_array(keys::OBJECT_PACKAGES)?;
        let document_packages = self.config.require_str_array(keys::DOCUMENT_PACKAGES)?;
        let object_version = self
            .config
            .require_index(keys::OBJECT_DEFAULT_VERSION, object_packages.len())?;
        let document_version = self
            .config
            .require_index(keys::DOCUMENT_DEFAULT_VERSION, document_packages.len())?;
        if self.seed.is_empty() {
            return Err(OidError::MissingConfigField("seed".to_string()));
        }

        let package_id = object_packages[object_version].clone();
        let document_package_id = document_packages[document_version].clone();
        let credit_package_id = self
            .config
            .opt_str(keys::OID_CREDIT_PACKAGE)
            .unwrap_or(&package_id)
            .to_string();

        let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::from_seed(
            &self.seed,
            self.seed_path.as_deref(),
        ));
        let sender = signer.address().to_string();

        let indexer: Arc<dyn Indexer> = match &self.indexer_override {
            Some(indexer) => indexer.clone(),
            None => Arc::new(IndexerClient::new(&graphql_provider)),
        };

        // Policy discovery: first edge of a type-filtered query.
        let wanted = policy_type(&package_id);
        let (edges, _) = indexer.query_objects_page(&wanted, None, None)?;
        let policy = edges
            .first()
            .map(|edge| edge.address.clone())
            .ok_or_else(|| OidError::PolicyNotFound(wanted.clone()))?;

        debug!(
            network = %network,
            package_id = %package_id,
            policy = %policy,
            "environment resolved"
        );

        let gas_station = self.station_config(keys::GAS_STATION_URL, keys::GAS_STATION_TOKEN);
        let gas_station_secondary =
            self.station_config(keys::GAS_STATION2_URL, keys::GAS_STATION2_TOKEN);

        Ok(Environment {
            signer,
            sender,
            network,
            graphql_provider,
            indexer,
            credit_token_type: credit_token_type(&credit_package_id),
            oid_object_type: oid_object_type(&package_id),
            package_id,
            document_package_id,
            credit_package_id,
            policy,
            gas_budget: self
                .config
                .opt_u64(keys::GAS_BUDGET)
                .unwrap_or(DEFAULT_GAS_BUDGET),
            use_gas_station: self.config.opt_bool(keys::USE_GAS_STATION).unwrap_or(false),
            gas_station,
            gas_station_secondary,
        })
    }

    fn station_config(&self, url_key: &str, token_key: &str) -> Option<GasStationConfig> {
        match (self.config.opt_str(url_key), self.config.opt_str(token_key)) {
            (Some(url), Some(token)) => Some(GasStationConfig {
                url: url.to_string(),
                token: token.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_strings() {
        assert_eq!(
            policy_type("0xa"),
            "0x2::token::TokenPolicy<0xa::oid::OID>"
        );
        assert_eq!(credit_token_type("0xa"), "0x2::token::Token<0xa::oid::OID>");
        assert_eq!(oid_object_type("0xa"), "0xa::oid_object::Oid");
    }
}
