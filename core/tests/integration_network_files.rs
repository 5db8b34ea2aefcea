// Integration tests for file-backed inputs
//
// Network, traffic and engine config files written to a temp dir and loaded
// back the way the CLI loads them.

use antroute_core::{
    AcoConfig, AntRouter, ConfigError, NetworkError, NetworkGraph, RoadNetwork, SegmentId,
    SnapshotFrame, TrafficSnapshot,
};
use std::fs;
use tempfile::TempDir;

const NETWORK_JSON: &str = r#"{
    "junctions": [
        { "id": "a", "x": 0.0,   "y": 0.0 },
        { "id": "b", "x": 200.0, "y": 0.0 },
        { "id": "c", "x": 200.0, "y": 150.0 },
        { "id": "d", "x": 400.0, "y": 0.0 }
    ],
    "segments": [
        { "id": "ab", "from": "a", "to": "b" },
        { "id": "bc", "from": "b", "to": "c", "length": 180.0 },
        { "id": "bd", "from": "b", "to": "d" },
        { "id": "cd", "from": "c", "to": "d" }
    ],
    "connections": [["ab", "bc"], ["ab", "bd"], ["bc", "cd"]]
}"#;

const TRAFFIC_JSON: &str = r#"{
    "bc": [
        { "position": { "x": 200.0, "y": 40.0 }, "speed": 8.0, "heading_deg": 0.0 },
        { "position": { "x": 200.0, "y": 90.0 }, "speed": 9.5, "heading_deg": 5.0 }
    ],
    "bd": [
        { "position": { "x": 260.0, "y": 0.0 }, "speed": 20.0, "heading_deg": 90.0 }
    ]
}"#;

fn id(s: &str) -> SegmentId {
    SegmentId::new(s)
}

#[test]
fn test_network_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("network.json");
    fs::write(&path, NETWORK_JSON).unwrap();

    let net = RoadNetwork::from_json_file(&path).unwrap();
    assert_eq!(net.segment_count(), 4);
    assert_eq!(net.length(&id("ab")), Some(200.0));
    assert_eq!(net.length(&id("bc")), Some(180.0));
    assert_eq!(
        net.outgoing_segments(&id("ab")),
        Some(&[id("bc"), id("bd")][..])
    );
    assert_eq!(net.outgoing_segments(&id("bd")), Some(&[][..]));
}

#[test]
fn test_disjoint_connection_rejected() {
    let json = NETWORK_JSON.replace(r#"["bc", "cd"]"#, r#"["bc", "bd"]"#);
    assert!(matches!(
        RoadNetwork::from_json_str(&json),
        Err(NetworkError::DisjointConnection { .. })
    ));
}

#[test]
fn test_missing_network_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        RoadNetwork::from_json_file(dir.path().join("absent.json")),
        Err(NetworkError::Io(_))
    ));
}

#[test]
fn test_traffic_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("traffic.json");
    fs::write(&path, TRAFFIC_JSON).unwrap();

    let frame = SnapshotFrame::from_json_file(&path).unwrap();
    assert_eq!(frame.total_occupants(), 3);
    assert_eq!(frame.occupants(&id("bc")).map(<[_]>::len), Some(2));
    assert_eq!(frame.occupants(&id("cd")).map(<[_]>::len), Some(0));
}

#[test]
fn test_config_file_partial_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aco.json");
    fs::write(&path, r#"{ "q0": 0.5, "hop_cap": 12, "seed": 77 }"#).unwrap();

    let config = AcoConfig::from_json_file(&path).unwrap();
    assert_eq!(config.q0, 0.5);
    assert_eq!(config.hop_cap, 12);
    assert_eq!(config.seed, Some(77));
    assert_eq!(config.alpha, 1.0);
    assert_eq!(config.quality.rssi_threshold, -85.0);
}

#[test]
fn test_config_file_roundtrip_and_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aco.json");

    let config = AcoConfig {
        beta: 3.0,
        seed: Some(5),
        ..AcoConfig::default()
    };
    config.to_json_file(&path).unwrap();
    assert_eq!(AcoConfig::from_json_file(&path).unwrap(), config);

    fs::write(&path, r#"{ "min_pheromone": 6.0 }"#).unwrap();
    assert!(matches!(
        AcoConfig::from_json_file(&path),
        Err(ConfigError::InvalidPheromoneBounds { .. })
    ));
}

#[test]
fn test_route_over_loaded_inputs() {
    let net = RoadNetwork::from_json_str(NETWORK_JSON).unwrap();
    let traffic = SnapshotFrame::from_json_str(TRAFFIC_JSON).unwrap();
    let router = AntRouter::new(
        net,
        AcoConfig {
            seed: Some(21),
            ..AcoConfig::default()
        },
    )
    .unwrap();

    let result = router
        .colony_search(&id("ab"), &id("cd"), &traffic, 8)
        .unwrap();
    assert!(result.best.outcome.is_complete());
    assert_eq!(
        result.best.outcome.route().segments(),
        &[id("ab"), id("bc"), id("cd")]
    );
}
