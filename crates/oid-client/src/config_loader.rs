//! Configuration resolution.
//!
//! A configuration can come from three places, in precedence order:
//!
//! 1. an explicitly named config object,
//! 2. the latest config object owned by the user (exact struct-type match
//!    against `<configPackageId>::oid_config::Config`),
//! 3. the network-pinned default object from the injected [`NetworkTable`].
//!
//! The config payload itself lives in the object's byte-array field `json`
//! (see [`oid_types::codec`]).

use std::sync::Arc;

use tracing::debug;

use oid_transport::ledger::LedgerRpc;
use oid_transport::network::NetworkTable;
use oid_types::codec::decode_json_field;
use oid_types::config::{ConfigMap, ConfigSource, LoadedConfig};
use oid_types::OidError;

/// Field of the on-chain config object holding the UTF-8 JSON bytes.
const JSON_FIELD: &str = "json";

pub struct ConfigLoader {
    rpc: Arc<dyn LedgerRpc>,
    networks: NetworkTable,
}

impl ConfigLoader {
    pub fn new(rpc: Arc<dyn LedgerRpc>, networks: NetworkTable) -> Self {
        Self { rpc, networks }
    }

    /// Load the network's pinned default configuration.
    ///
    /// Fatal if the network has no pinned default id, if the object carries
    /// no decodable `json` field, or if the field does not parse as UTF-8
    /// JSON. An empty byte array decodes to `{}`, which is not an error.
    pub fn load_public_config(&self, network: &str) -> Result<LoadedConfig, OidError> {
        let object_id = self
            .networks
            .default_config_object(network)
            .ok_or_else(|| {
                OidError::MissingConfigField(format!("no pinned default config for `{network}`"))
            })?
            .to_string();
        debug!(network, object_id = %object_id, "loading pinned default config");

        let config = self.read_config_object(&object_id)?;
        Ok(LoadedConfig::new(config, ConfigSource::Default, object_id))
    }

    /// Load a configuration from an explicitly named object.
    pub fn load_config_object(&self, object_id: &str) -> Result<LoadedConfig, OidError> {
        let config = self.read_config_object(object_id)?;
        Ok(LoadedConfig::new(config, ConfigSource::Object, object_id))
    }

    /// Find the user's own config object: the highest-version owned object
    /// whose struct type equals exactly `<configPackageId>::oid_config::Config`.
    pub fn find_user_config_object_id(
        &self,
        owner: &str,
        config_package_id: &str,
    ) -> Result<Option<String>, OidError> {
        let wanted = format!("{config_package_id}::oid_config::Config");
        let owned = self.rpc.get_owned_objects_all(owner, Some(&wanted))?;

        // The filter is advisory on some nodes; enforce exact equality here.
        let best = owned
            .into_iter()
            .filter(|obj| obj.object_type.as_deref() == Some(wanted.as_str()))
            .max_by_key(|obj| obj.version);

        Ok(best.map(|obj| obj.object_id))
    }

    /// User config when one exists, else the network's pinned default.
    ///
    /// Fatal if neither a config package id is known for the network nor a
    /// pinned default exists.
    pub fn load_effective_config(
        &self,
        network: &str,
        config_package_ids: &[String],
        owner: &str,
    ) -> Result<LoadedConfig, OidError> {
        for package_id in config_package_ids {
            if let Some(object_id) = self.find_user_config_object_id(owner, package_id)? {
                debug!(owner, object_id = %object_id, "using user config object");
                let config = self.read_config_object(&object_id)?;
                return Ok(LoadedConfig::new(config, ConfigSource::User, object_id));
            }
        }

        if config_package_ids.is_empty() && self.networks.default_config_object(network).is_none()
        {
            return Err(OidError::MissingConfigField(format!(
                "no config package id and no pinned default for `{network}`"
            )));
        }

        self.load_public_config(network)
    }

    fn read_config_object(&self, object_id: &str) -> Result<ConfigMap, OidError> {
        let object = self.rpc.get_object(object_id)?;
        let field = object.fields.get(JSON_FIELD).ok_or_else(|| {
            OidError::Codec(format!("config object {object_id} has no `json` field"))
        })?;
        let value = decode_json_field(field)?;
        Ok(ConfigMap::from_value(value))
    }
}
