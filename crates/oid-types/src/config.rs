//! On-chain configuration schema and validation.
//!
//! A configuration is a flat JSON object loaded from one of three sources:
//! the network-pinned default object, the latest user-owned config object,
//! or a caller-supplied value. Consumption is strongly typed: the generic
//! JSON value is parsed first, then validated field-by-field through the
//! accessors here, which map missing or malformed fields to the closed
//! error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OidError;

/// Well-known configuration keys.
pub mod keys {
    pub const NETWORK: &str = "network";
    pub const GRAPHQL_PROVIDER: &str = "graphqlProvider";
    pub const OBJECT_PACKAGES: &str = "objectPackages";
    pub const OBJECT_DEFAULT_VERSION: &str = "objectDefaultPackageVersion";
    pub const DOCUMENT_PACKAGES: &str = "documentPackages";
    pub const DOCUMENT_DEFAULT_VERSION: &str = "documentDefaultPackageVersion";
    pub const IOTA_IDENTITY_PACKAGE: &str = "IOTAidentityPackage";
    pub const OID_IDENTITY_PACKAGE: &str = "OIDidentityPackage";
    pub const OID_CREDIT_PACKAGE: &str = "OIDcreditPackage";
    pub const USE_GAS_STATION: &str = "useGasStation";
    pub const GAS_STATION_URL: &str = "gasStationURL";
    pub const GAS_STATION_TOKEN: &str = "gasStationToken";
    pub const GAS_STATION2_URL: &str = "gasStation2URL";
    pub const GAS_STATION2_TOKEN: &str = "gasStation2Token";
    pub const GAS_BUDGET: &str = "gasBudget";
    pub const FAUCET_URL: &str = "faucetURL";
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Latest config object owned by the session address.
    User,
    /// Network-pinned default config object.
    Default,
    /// Caller-supplied JSON, no on-chain provenance.
    Manual,
    /// Explicitly named on-chain object.
    Object,
}

/// A configuration tagged with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedConfig {
    pub config: ConfigMap,
    pub source: ConfigSource,
    /// Source object id; empty for [`ConfigSource::Manual`].
    pub object_id: String,
}

impl LoadedConfig {
    pub fn new(config: ConfigMap, source: ConfigSource, object_id: impl Into<String>) -> Self {
        Self {
            config,
            source,
            object_id: object_id.into(),
        }
    }
}

/// A flat JSON configuration object with typed, validating accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap(pub Map<String, Value>);

impl ConfigMap {
    /// Wrap a JSON value; non-objects become an empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Required non-empty string field.
    pub fn require_str(&self, key: &str) -> Result<&str, OidError> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OidError::MissingConfigField(key.to_string()))
    }

    /// Required non-empty array of strings.
    pub fn require_str_array(&self, key: &str) -> Result<Vec<String>, OidError> {
        let items = self
            .0
            .get(key)
            .and_then(|v| v.as_array())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| OidError::MissingConfigArray(key.to_string()))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(String::from)
                    .ok_or_else(|| OidError::MissingConfigArray(key.to_string()))
            })
            .collect()
    }

    /// Required index field, validated against a list length:
    /// `0 <= index < len`.
    pub fn require_index(&self, key: &str, len: usize) -> Result<usize, OidError> {
        let raw = self
            .0
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| OidError::MissingConfigField(key.to_string()))?;
        if raw < 0 || raw as usize >= len {
            return Err(OidError::InvalidVersionIndex {
                field: key.to_string(),
                index: raw,
                len,
            });
        }
        Ok(raw as usize)
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    pub fn opt_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(|v| v.as_u64())
    }

    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(|v| v.as_bool())
    }

    /// Shallow merge: every top-level key of `overlay` replaces the
    /// corresponding key here. Returns the merged copy; neither input is
    /// mutated.
    pub fn merged_with(&self, overlay: &ConfigMap) -> ConfigMap {
        let mut out = self.0.clone();
        for (k, v) in &overlay.0 {
            out.insert(k.clone(), v.clone());
        }
        ConfigMap(out)
    }
}
