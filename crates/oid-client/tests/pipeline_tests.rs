//! Environment resolution and transaction execution.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{base_config, config_map, MockIndexer, MockLedger, MockStation};
use oid_client::env::EnvResolver;
use oid_client::executor::{sign_and_execute, ExecOptions};
use oid_client::signer::Ed25519Signer;
use oid_types::{CallArg, MoveCall, OidError, TransactionData};

fn resolver_with(config: serde_json::Value, indexer: Arc<MockIndexer>) -> EnvResolver {
    EnvResolver::new(config_map(config), "test seed", None).with_indexer(indexer)
}

#[test]
fn resolve_env_yields_versioned_packages_and_policy() {
    // Scenario: pinned config selects 0xA/0xB, policy query returns 0xP.
    let indexer = Arc::new(MockIndexer::with_policy("0xP"));
    let resolver = resolver_with(base_config(), indexer.clone());

    let env = resolver.resolve().unwrap();
    assert_eq!(env.package_id, "0xA");
    assert_eq!(env.document_package_id, "0xB");
    assert_eq!(env.policy, "0xP");
    assert_eq!(env.network, "testnet");
    assert_eq!(env.credit_token_type, "0x2::token::Token<0xcp::oid::OID>");
    assert_eq!(env.credit_package_id, "0xcp");
    assert!(!env.sender.is_empty());
}

#[test]
fn resolve_env_validates_before_any_network_io() {
    for missing in [
        "network",
        "graphqlProvider",
        "objectPackages",
        "documentPackages",
        "objectDefaultPackageVersion",
        "documentDefaultPackageVersion",
    ] {
        let mut config = base_config();
        config.as_object_mut().unwrap().remove(missing);

        let indexer = Arc::new(MockIndexer::with_policy("0xP"));
        let resolver = resolver_with(config, indexer.clone());

        assert!(resolver.resolve().is_err(), "missing `{missing}` must fail");
        assert_eq!(
            indexer.query_count(),
            0,
            "no indexer query may precede validation of `{missing}`"
        );
    }
}

#[test]
fn version_index_bounds_are_exact() {
    let with_index = |v: i64| {
        let mut config = base_config();
        let map = config.as_object_mut().unwrap();
        map.insert("objectPackages".into(), json!(["0xA", "0xA2"]));
        map.insert("objectDefaultPackageVersion".into(), json!(v));
        resolver_with(config, Arc::new(MockIndexer::with_policy("0xP"))).resolve()
    };

    assert!(with_index(0).is_ok());
    assert!(with_index(1).is_ok());
    assert!(matches!(
        with_index(2),
        Err(OidError::InvalidVersionIndex { index: 2, len: 2, .. })
    ));
    assert!(matches!(
        with_index(-1),
        Err(OidError::InvalidVersionIndex { index: -1, .. })
    ));
}

#[test]
fn empty_policy_query_is_fatal() {
    let resolver = resolver_with(base_config(), Arc::new(MockIndexer::empty()));
    assert!(matches!(resolver.resolve(), Err(OidError::PolicyNotFound(_))));
}

#[test]
fn concurrent_resolution_is_single_flight() {
    let indexer = Arc::new(MockIndexer {
        latency: std::time::Duration::from_millis(50),
        ..MockIndexer::with_policy("0xP")
    });
    let resolver = Arc::new(resolver_with(base_config(), indexer.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let resolver = resolver.clone();
            std::thread::spawn(move || resolver.resolve().unwrap().policy.clone())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "0xP");
    }

    // All four callers shared one in-flight resolution.
    assert_eq!(indexer.query_count(), 1);
}

fn sample_tx() -> TransactionData {
    TransactionData::new().move_call(MoveCall {
        package: "0xA".to_string(),
        module: "oid_object".to_string(),
        function: "set_name".to_string(),
        type_arguments: vec![],
        arguments: vec![CallArg::Str("alice".to_string())],
    })
}

#[test]
fn direct_execution_maps_success() {
    let rpc = MockLedger::new();
    let signer = Ed25519Signer::from_seed("seed", None);

    let result =
        sign_and_execute(&rpc, &signer, sample_tx(), &ExecOptions::direct(1_000_000)).unwrap();
    assert!(result.success);
    assert_eq!(result.digest.as_deref(), Some("DIGEST"));
    assert_eq!(rpc.call_count("execute_transaction"), 1);
    assert_eq!(rpc.call_count("wait_for_transaction"), 1);
}

#[test]
fn direct_execution_never_errors() {
    let signer = Ed25519Signer::from_seed("seed", None);

    // Submission rejected outright.
    let rpc = MockLedger {
        fail_execute: true,
        ..MockLedger::new()
    };
    let result =
        sign_and_execute(&rpc, &signer, sample_tx(), &ExecOptions::direct(1_000_000)).unwrap();
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("rejected"));

    // Finality wait fails.
    let rpc = MockLedger {
        fail_wait: true,
        ..MockLedger::new()
    };
    let result =
        sign_and_execute(&rpc, &signer, sample_tx(), &ExecOptions::direct(1_000_000)).unwrap();
    assert!(!result.success);

    // Execution status other than success is a failed result, not an error.
    let rpc = MockLedger::new();
    *rpc.exec_status.lock().unwrap() = Some("MoveAbort(7)".to_string());
    let result =
        sign_and_execute(&rpc, &signer, sample_tx(), &ExecOptions::direct(1_000_000)).unwrap();
    assert!(!result.success);
    assert_eq!(result.status.as_deref(), Some("MoveAbort(7)"));
}

#[test]
fn sponsored_execution_uses_primary() {
    let signer = Ed25519Signer::from_seed("seed", None);
    let rpc = MockLedger::new();
    let primary = MockStation::working("primary");

    let opts = ExecOptions {
        gas_budget: 1_000_000,
        use_gas_station: true,
        gas_station: Some(&primary),
        gas_station_secondary: None,
        on_executed: None,
    };
    let result = sign_and_execute(&rpc, &signer, sample_tx(), &opts).unwrap();
    assert!(result.success);
    assert_eq!(result.digest.as_deref(), Some("D-primary"));
    // The relay submits; the RPC is not involved.
    assert_eq!(rpc.call_count("execute_transaction"), 0);
}

#[test]
fn sponsored_execution_falls_back_to_secondary() {
    let signer = Ed25519Signer::from_seed("seed", None);
    let rpc = MockLedger::new();
    let primary = MockStation::broken("primary");
    let secondary = MockStation::working("secondary");

    let opts = ExecOptions {
        gas_budget: 1_000_000,
        use_gas_station: true,
        gas_station: Some(&primary),
        gas_station_secondary: Some(&secondary),
        on_executed: None,
    };
    let result = sign_and_execute(&rpc, &signer, sample_tx(), &opts).unwrap();
    assert!(result.success);
    assert_eq!(result.digest.as_deref(), Some("D-secondary"));
    assert_eq!(*primary.reserve_calls.lock().unwrap(), 1);
    assert_eq!(*secondary.reserve_calls.lock().unwrap(), 1);
}

#[test]
fn sponsored_execution_propagates_original_error() {
    let signer = Ed25519Signer::from_seed("seed", None);
    let rpc = MockLedger::new();

    // No secondary configured: the primary's error comes straight back.
    let primary = MockStation::broken("primary");
    let opts = ExecOptions {
        gas_budget: 1_000_000,
        use_gas_station: true,
        gas_station: Some(&primary),
        gas_station_secondary: None,
        on_executed: None,
    };
    let err = sign_and_execute(&rpc, &signer, sample_tx(), &opts).unwrap_err();
    assert!(err.to_string().contains("primary reserve failed"));

    // Both fail: still the primary's error.
    let primary = MockStation::broken("primary");
    let secondary = MockStation::broken("secondary");
    let opts = ExecOptions {
        gas_budget: 1_000_000,
        use_gas_station: true,
        gas_station: Some(&primary),
        gas_station_secondary: Some(&secondary),
        on_executed: None,
    };
    let err = sign_and_execute(&rpc, &signer, sample_tx(), &opts).unwrap_err();
    assert!(err.to_string().contains("primary reserve failed"));
    assert_eq!(*secondary.reserve_calls.lock().unwrap(), 1);
}

#[test]
fn requested_sponsorship_without_relay_config_is_fatal() {
    use oid_client::catalog::OidApi;

    // useGasStation set, but no relay endpoint/token configured: the
    // missing-relay error surfaces; no direct self-paid submission happens.
    let mut config = base_config();
    config
        .as_object_mut()
        .unwrap()
        .insert("useGasStation".into(), json!(true));

    let rpc = Arc::new(MockLedger::new());
    let resolver = resolver_with(config, Arc::new(MockIndexer::with_policy("0xP")));
    let api = OidApi::new(rpc.clone(), resolver);

    let err = api
        .execute("set_name", vec![CallArg::Str("alice".to_string())], None)
        .unwrap_err();
    assert!(matches!(err, OidError::MissingConfigField(_)));
    assert_eq!(rpc.call_count("execute_transaction"), 0);
}

#[test]
fn on_executed_sees_final_result_exactly_once() {
    use std::sync::Mutex;

    let signer = Ed25519Signer::from_seed("seed", None);
    let rpc = MockLedger::new();
    let seen: Mutex<Vec<bool>> = Mutex::new(Vec::new());
    let callback = |result: &oid_types::TxExecResult| {
        seen.lock().unwrap().push(result.success);
    };

    let opts = ExecOptions {
        gas_budget: 1_000_000,
        use_gas_station: false,
        gas_station: None,
        gas_station_secondary: None,
        on_executed: Some(&callback),
    };
    let result = sign_and_execute(&rpc, &signer, sample_tx(), &opts).unwrap();
    assert!(result.success);
    assert_eq!(*seen.lock().unwrap(), vec![true]);

    // Failure path: the callback still fires, with the failed result.
    let failing = MockLedger {
        fail_execute: true,
        ..MockLedger::new()
    };
    let result = sign_and_execute(&failing, &signer, sample_tx(), &opts).unwrap();
    assert!(!result.success);
    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

#[test]
fn on_executed_panic_does_not_alter_result() {
    let signer = Ed25519Signer::from_seed("seed", None);
    let rpc = MockLedger::new();
    let callback = |_: &oid_types::TxExecResult| panic!("listener bug");

    let opts = ExecOptions {
        gas_budget: 1_000_000,
        use_gas_station: false,
        gas_station: None,
        gas_station_secondary: None,
        on_executed: Some(&callback),
    };
    let result = sign_and_execute(&rpc, &signer, sample_tx(), &opts).unwrap();
    assert!(result.success);
}
