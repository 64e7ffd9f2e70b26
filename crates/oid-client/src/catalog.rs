//! Method catalog.
//!
//! Every remote entry point the SDK can invoke is one row in a declarative
//! table. A single generic builder assembles the Move call from a row plus
//! the caller's positional arguments - argument order is fixed per row and
//! matches the contract ABI: caller arguments first, then the policy object
//! reference when the row uses the policy, then the shared clock reference
//! when it uses the clock. The object-creation row additionally extracts
//! the created object's address from the effects on success.

use std::sync::Arc;

use oid_transport::gas_station::{GasStation, GasStationClient};
use oid_transport::ledger::LedgerRpc;
use oid_types::{CallArg, MoveCall, OidError, TransactionData, TxExecResult};

use crate::env::{EnvResolver, Environment};
use crate::executor::{sign_and_execute, ExecOptions, OnExecuted};

/// Which resolved package a row's target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// The versioned object package (`objectPackages[...]`).
    Object,
    /// The versioned document package (`documentPackages[...]`).
    Document,
    /// The ledger framework package (`0x2`), for token operations.
    Framework,
}

/// One remote entry point.
#[derive(Debug, Clone, Copy)]
pub struct OpDescriptor {
    pub name: &'static str,
    pub module: &'static str,
    pub function: &'static str,
    pub package: PackageKind,
    /// Append the discovered policy object as a trailing argument.
    pub uses_policy: bool,
    /// Append the shared clock reference as the final argument.
    pub uses_clock: bool,
    /// Extract the created object id from effects on success.
    pub creates_object: bool,
    /// Type arguments: `true` means the single OID coin type parameter.
    pub credit_typed: bool,
}

const fn op(
    name: &'static str,
    module: &'static str,
    function: &'static str,
    package: PackageKind,
) -> OpDescriptor {
    OpDescriptor {
        name,
        module,
        function,
        package,
        uses_policy: false,
        uses_clock: false,
        creates_object: false,
        credit_typed: false,
    }
}

const fn with_policy(mut d: OpDescriptor) -> OpDescriptor {
    d.uses_policy = true;
    d
}

const fn with_clock(mut d: OpDescriptor) -> OpDescriptor {
    d.uses_clock = true;
    d
}

const fn creates(mut d: OpDescriptor) -> OpDescriptor {
    d.creates_object = true;
    d
}

const fn credit_typed(mut d: OpDescriptor) -> OpDescriptor {
    d.credit_typed = true;
    d
}

/// The fixed catalog. Order within a row's argument list is part of the
/// remote ABI; rows only ever gain entries at the end.
pub const OPERATIONS: &[OpDescriptor] = &[
    // oid_object: lifecycle
    creates(with_clock(with_policy(op(
        "new_oid",
        "oid_object",
        "new_oid",
        PackageKind::Object,
    )))),
    op("delete_oid", "oid_object", "delete_oid", PackageKind::Object),
    with_clock(op("touch_oid", "oid_object", "touch", PackageKind::Object)),
    op("transfer_oid", "oid_object", "transfer", PackageKind::Object),
    op("freeze_oid", "oid_object", "freeze_oid", PackageKind::Object),
    op("unfreeze_oid", "oid_object", "unfreeze_oid", PackageKind::Object),
    with_clock(with_policy(op(
        "rotate_key",
        "oid_object",
        "rotate_key",
        PackageKind::Object,
    ))),
    // oid_object: attributes
    op("set_name", "oid_object", "set_name", PackageKind::Object),
    op(
        "set_description",
        "oid_object",
        "set_description",
        PackageKind::Object,
    ),
    op("set_avatar", "oid_object", "set_avatar", PackageKind::Object),
    op("set_gateway", "oid_object", "set_gateway", PackageKind::Object),
    op(
        "clear_gateway",
        "oid_object",
        "clear_gateway",
        PackageKind::Object,
    ),
    op("add_property", "oid_object", "add_property", PackageKind::Object),
    op(
        "remove_property",
        "oid_object",
        "remove_property",
        PackageKind::Object,
    ),
    op("add_tag", "oid_object", "add_tag", PackageKind::Object),
    op("remove_tag", "oid_object", "remove_tag", PackageKind::Object),
    // oid_object: services and links
    op("add_service", "oid_object", "add_service", PackageKind::Object),
    op(
        "remove_service",
        "oid_object",
        "remove_service",
        PackageKind::Object,
    ),
    with_policy(op(
        "link_document",
        "oid_object",
        "link_document",
        PackageKind::Object,
    )),
    op(
        "unlink_document",
        "oid_object",
        "unlink_document",
        PackageKind::Object,
    ),
    // oid_document
    with_clock(op(
        "new_document",
        "oid_document",
        "new_document",
        PackageKind::Document,
    )),
    op(
        "set_document",
        "oid_document",
        "set_document",
        PackageKind::Document,
    ),
    op(
        "clear_document",
        "oid_document",
        "clear_document",
        PackageKind::Document,
    ),
    op("add_claim", "oid_document", "add_claim", PackageKind::Document),
    op(
        "remove_claim",
        "oid_document",
        "remove_claim",
        PackageKind::Document,
    ),
    with_clock(with_policy(op(
        "attest_claim",
        "oid_document",
        "attest_claim",
        PackageKind::Document,
    ))),
    op(
        "revoke_claim",
        "oid_document",
        "revoke_claim",
        PackageKind::Document,
    ),
    with_clock(op(
        "set_expiry",
        "oid_document",
        "set_expiry",
        PackageKind::Document,
    )),
    // oid_config
    op(
        "publish_config",
        "oid_config",
        "publish_config",
        PackageKind::Object,
    ),
    op(
        "update_config",
        "oid_config",
        "update_config",
        PackageKind::Object,
    ),
    op(
        "delete_config",
        "oid_config",
        "delete_config",
        PackageKind::Object,
    ),
    // token (framework package, OID coin type parameter)
    credit_typed(op("join_credits", "token", "join", PackageKind::Framework)),
    credit_typed(op("split_credits", "token", "split", PackageKind::Framework)),
    credit_typed(op(
        "transfer_credits",
        "token",
        "transfer",
        PackageKind::Framework,
    )),
    credit_typed(with_policy(op(
        "spend_credits",
        "token",
        "spend",
        PackageKind::Framework,
    ))),
];

/// Look up a row by name.
pub fn find_operation(name: &str) -> Result<&'static OpDescriptor, OidError> {
    OPERATIONS
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| OidError::UnknownOperation(name.to_string()))
}

/// Assemble the Move call for a row: caller args, then policy, then clock.
pub fn build_call(op: &OpDescriptor, env: &Environment, mut args: Vec<CallArg>) -> MoveCall {
    if op.uses_policy {
        args.push(CallArg::Object(env.policy.clone()));
    }
    if op.uses_clock {
        args.push(CallArg::Clock);
    }
    let package = match op.package {
        PackageKind::Object => env.package_id.clone(),
        PackageKind::Document => env.document_package_id.clone(),
        PackageKind::Framework => "0x2".to_string(),
    };
    let type_arguments = if op.credit_typed {
        vec![format!("{}::oid::OID", env.credit_package_id)]
    } else {
        vec![]
    };
    MoveCall {
        package,
        module: op.module.to_string(),
        function: op.function.to_string(),
        type_arguments,
        arguments: args,
    }
}

/// The method-catalog API: one resolver, one RPC handle, and a generic
/// execute path every operation goes through.
pub struct OidApi {
    rpc: Arc<dyn LedgerRpc>,
    resolver: EnvResolver,
    /// Injected relays (tests); when absent, HTTP clients are built from
    /// the environment's gas-station config.
    station_override: Option<(Arc<dyn GasStation>, Option<Arc<dyn GasStation>>)>,
}

impl OidApi {
    pub fn new(rpc: Arc<dyn LedgerRpc>, resolver: EnvResolver) -> Self {
        Self {
            rpc,
            resolver,
            station_override: None,
        }
    }

    pub fn with_stations(
        mut self,
        primary: Arc<dyn GasStation>,
        secondary: Option<Arc<dyn GasStation>>,
    ) -> Self {
        self.station_override = Some((primary, secondary));
        self
    }

    pub fn env(&self) -> Result<Arc<Environment>, OidError> {
        self.resolver.resolve()
    }

    /// Execute a catalog operation by name with positional arguments.
    pub fn execute(
        &self,
        name: &str,
        args: Vec<CallArg>,
        on_executed: Option<OnExecuted<'_>>,
    ) -> Result<TxExecResult, OidError> {
        let op = find_operation(name)?;
        let env = self.resolver.resolve()?;

        let tx = TransactionData::new().move_call(build_call(op, &env, args));

        // When the config requests sponsorship but configures no relay, the
        // executor's missing-relay check must fire; never downgrade to a
        // direct self-paid submission.
        let stations = self.stations(&env);
        let opts = ExecOptions {
            gas_budget: env.gas_budget,
            use_gas_station: env.use_gas_station,
            gas_station: stations.as_ref().map(|(p, _)| p.as_ref()),
            gas_station_secondary: stations
                .as_ref()
                .and_then(|(_, s)| s.as_ref().map(|s| s.as_ref())),
            on_executed,
        };

        let mut result = sign_and_execute(self.rpc.as_ref(), env.signer.as_ref(), tx, &opts)?;
        if !op.creates_object {
            result.created_object = None;
        }
        Ok(result)
    }

    #[allow(clippy::type_complexity)]
    fn stations(
        &self,
        env: &Environment,
    ) -> Option<(Arc<dyn GasStation>, Option<Arc<dyn GasStation>>)> {
        if let Some((primary, secondary)) = &self.station_override {
            return Some((primary.clone(), secondary.clone()));
        }
        let primary = env.gas_station.as_ref()?;
        let secondary: Option<Arc<dyn GasStation>> = env
            .gas_station_secondary
            .as_ref()
            .map(|cfg| Arc::new(GasStationClient::new(cfg)) as Arc<dyn GasStation>);
        Some((
            Arc::new(GasStationClient::new(primary)) as Arc<dyn GasStation>,
            secondary,
        ))
    }
}
