//! Loading chain configurations from text and running them end to end.

use std::path::Path;

use supplychain_core::config::ConfigError;
use supplychain_core::data_loader::{load_config_file, load_config_str, DataLoadError, Format};
use supplychain_core::engine::Engine;
use supplychain_stats::CycleTimeAnalytics;

const TOML_CHAIN: &str = r#"
num_nodes = 3
initial_inventories = [5, 5, 0]
order_lags = [1, 1, 1]
transit_lags = [1, 2, 2]
production_time = 2
horizon = 15
max_demand = 4
seed = 99
"#;

const RON_CHAIN: &str = r#"(
    num_nodes: 3,
    initial_inventories: [5, 5, 0],
    order_lags: [1, 1, 1],
    transit_lags: [1, 2, 2],
    production_time: 2,
    horizon: 15,
    max_demand: 4,
    seed: Some(99),
)"#;

#[test]
fn toml_and_ron_describe_the_same_run() {
    let from_toml = load_config_str(TOML_CHAIN, Format::Toml).expect("toml config");
    let from_ron = load_config_str(RON_CHAIN, Format::Ron).expect("ron config");
    assert_eq!(from_toml, from_ron);

    let mut a = Engine::new(from_toml).expect("valid");
    let mut b = Engine::new(from_ron).expect("valid");
    assert_eq!(a.run_to_end(), 15);
    assert_eq!(b.run_to_end(), 15);
    assert_eq!(a.state_hash(), b.state_hash());
    assert_eq!(a.demand_history(), b.demand_history());
}

#[test]
fn loaded_chain_feeds_analytics() {
    let config = load_config_str(TOML_CHAIN, Format::Toml).expect("toml config");
    let mut engine = Engine::new(config).expect("valid");
    let mut analytics = CycleTimeAnalytics::for_engine(&engine);
    assert_eq!(analytics.transit_lags(), &[1, 2, 2]);

    while !engine.is_finished() {
        engine.step(None);
        analytics.record(&engine);
    }
    assert_eq!(analytics.history().len(), 15);
}

#[test]
fn partial_config_fills_every_node() {
    let config = load_config_str("num_nodes = 2\nseed = 4", Format::Toml).expect("toml config");
    assert_eq!(config.initial_inventories, vec![50, 50]);
    assert_eq!(config.order_lags, vec![1, 1]);
    assert_eq!(config.transit_lags, vec![3, 3]);

    let mut engine = Engine::new(config).expect("valid");
    assert_eq!(engine.nodes().len(), 2);
    assert_eq!(engine.run_to_end(), 30);
}

#[test]
fn explicit_vector_must_match_node_count() {
    let err = load_config_str("num_nodes = 2\norder_lags = [1, 1, 1]", Format::Toml).unwrap_err();
    assert!(matches!(
        err,
        DataLoadError::Invalid(ConfigError::LengthMismatch { field: "order_lags", expected: 2, actual: 3 })
    ));
}

#[test]
fn json_file_round_trips_through_disk() {
    let dir = std::env::temp_dir().join("supplychain_config_loading_test");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("chain.json");
    std::fs::write(
        &path,
        r#"{
            "num_nodes": 2,
            "initial_inventories": [3, 0],
            "order_lags": [0, 0],
            "transit_lags": [1, 1],
            "production_time": 1,
            "horizon": 5,
            "max_demand": 2,
            "seed": 1
        }"#,
    )
    .expect("write config");

    let config = load_config_file(&path).expect("json config");
    assert_eq!(config.num_nodes, 2);
    assert_eq!(config.backlog_warning, None);
    let mut engine = Engine::new(config).expect("valid");
    engine.run_to_end();
    assert!(engine.is_finished());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_extension_is_rejected() {
    let err = load_config_file(Path::new("chain.yaml")).unwrap_err();
    assert!(matches!(err, DataLoadError::UnsupportedFormat(_)));
}
