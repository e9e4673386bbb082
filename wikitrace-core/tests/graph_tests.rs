// Tests for the navigation graph and its stored form

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use wikitrace_core::{Edge, EdgeHistory, NavigationGraph, PageTitle};

fn t(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 24, 14, 55, 0).unwrap() + TimeDelta::milliseconds(ms)
}

fn title(s: &str) -> PageTitle {
    PageTitle::new(s).unwrap()
}

fn children(graph: &NavigationGraph, of: &str) -> Vec<String> {
    graph
        .node(of)
        .unwrap()
        .children()
        .iter()
        .map(|c| c.to_string())
        .collect()
}

// ============================================================================
// Edge Tests
// ============================================================================

#[test]
fn test_add_edge_creates_both_nodes() {
    let mut graph = NavigationGraph::new();
    assert!(graph.add_edge(&title("Dog"), &title("Cat"), t(0)));

    assert_eq!(graph.len(), 2);
    assert!(graph.contains("Dog"));
    assert!(graph.contains("Cat"));
    assert_eq!(children(&graph, "Dog"), vec!["Cat"]);
    assert!(graph.node("Cat").unwrap().children().is_empty());
    assert_eq!(graph.node("Cat").unwrap().first_seen_at(), t(0));
}

#[test]
fn test_add_edge_twice_is_idempotent() {
    let mut graph = NavigationGraph::new();
    assert!(graph.add_edge(&title("Dog"), &title("Cat"), t(0)));
    assert!(!graph.add_edge(&title("Dog"), &title("Cat"), t(5_000)));

    assert_eq!(children(&graph, "Dog"), vec!["Cat"]);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_first_seen_is_not_overwritten() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Cat"), t(0));
    graph.add_edge(&title("Cat"), &title("Bird"), t(9_000));

    assert_eq!(graph.node("Cat").unwrap().first_seen_at(), t(0));
    assert_eq!(graph.node("Bird").unwrap().first_seen_at(), t(9_000));
}

#[test]
fn test_children_keep_insertion_order() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Wolf"), t(0));
    graph.add_edge(&title("Dog"), &title("Cat"), t(1));
    graph.add_edge(&title("Dog"), &title("Bird"), t(2));

    assert_eq!(children(&graph, "Dog"), vec!["Wolf", "Cat", "Bird"]);
}

#[test]
fn test_self_loop_is_kept() {
    let mut graph = NavigationGraph::new();
    let edge = Edge::new(title("Dog"), title("Dog"), t(0));
    assert!(edge.is_self_loop());
    assert!(graph.record(&edge));

    assert_eq!(graph.len(), 1);
    assert!(graph.node("Dog").unwrap().has_child("Dog"));
}

#[test]
fn test_edges_flat_list() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Cat"), t(0));
    graph.add_edge(&title("Cat"), &title("Bird"), t(1));

    let edges: Vec<(String, String)> = graph
        .edges()
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("Cat".to_string(), "Bird".to_string()),
            ("Dog".to_string(), "Cat".to_string()),
        ]
    );
}

#[test]
fn test_snapshot_is_isolated_from_later_changes() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Cat"), t(0));
    let snapshot = graph.snapshot();

    graph.add_edge(&title("Cat"), &title("Bird"), t(1));
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.node("Bird").is_none());
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_clear() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Cat"), t(0));
    graph.clear();
    assert!(graph.is_empty());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_empty_title_rejected() {
    assert!(PageTitle::new("").is_err());
    assert!(PageTitle::try_from("Cat").is_ok());
}

// ============================================================================
// Stored Form Tests
// ============================================================================

#[test]
fn test_serialize_shape() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Cat"), t(0));

    let blob = graph.serialize().unwrap();
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(value["Dog"]["children"], serde_json::json!(["Cat"]));
    assert!(value["Dog"]["firstSeenAt"].is_string());
    assert_eq!(value["Cat"]["children"], serde_json::json!([]));
}

#[test]
fn test_serialize_round_trip() {
    let mut graph = NavigationGraph::new();
    graph.add_edge(&title("Dog"), &title("Cat"), t(0));
    graph.add_edge(&title("Dog"), &title("Wolf"), t(10));
    graph.add_edge(&title("Cat"), &title("Dog"), t(20));

    let restored = NavigationGraph::deserialize(Some(&graph.serialize().unwrap()));
    assert_eq!(restored, graph);
}

#[test]
fn test_deserialize_missing_or_malformed_is_empty() {
    assert!(NavigationGraph::deserialize(None).is_empty());
    assert!(NavigationGraph::deserialize(Some("{{{")).is_empty());
    assert!(NavigationGraph::deserialize(Some("[1, 2, 3]")).is_empty());
}

#[test]
fn test_deserialize_creates_placeholder_children() {
    let blob = r#"{"Dog":{"children":["Cat"],"firstSeenAt":"2024-12-24T14:55:00Z"}}"#;
    let graph = NavigationGraph::deserialize(Some(blob));

    assert_eq!(graph.len(), 2);
    let cat = graph.node("Cat").unwrap();
    assert!(cat.children().is_empty());
    assert_eq!(cat.first_seen_at(), t(0));
}

#[test]
fn test_deserialize_accepts_legacy_timestamp_field() {
    let blob = r#"{"Dog":{"children":[],"timestamp":"2024-12-24T14:55:00Z"}}"#;
    let graph = NavigationGraph::deserialize(Some(blob));
    assert_eq!(graph.node("Dog").unwrap().first_seen_at(), t(0));
}

#[test]
fn test_deserialize_missing_timestamp_defaults_to_epoch() {
    let blob = r#"{"Dog":{"children":["Cat"]}}"#;
    let graph = NavigationGraph::deserialize(Some(blob));
    assert_eq!(graph.node("Dog").unwrap().first_seen_at(), DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(graph.node("Cat").unwrap().first_seen_at(), DateTime::<Utc>::UNIX_EPOCH);
}

#[test]
fn test_deserialize_drops_empty_titles_and_duplicate_children() {
    let blob = r#"{
        "": {"children": ["Cat"]},
        "Dog": {"children": ["Cat", "", "Cat"]}
    }"#;
    let graph = NavigationGraph::deserialize(Some(blob));

    assert_eq!(graph.len(), 2);
    assert_eq!(children(&graph, "Dog"), vec!["Cat"]);
}

// ============================================================================
// History Tests
// ============================================================================

#[test]
fn test_history_keeps_repeats() {
    let mut history = EdgeHistory::new();
    history.push(Edge::new(title("Dog"), title("Cat"), t(0)));
    history.push(Edge::new(title("Dog"), title("Cat"), t(60_000)));

    let restored = EdgeHistory::deserialize(Some(&history.serialize().unwrap()));
    assert_eq!(restored.len(), 2);
    assert_eq!(restored, history);
}

#[test]
fn test_history_malformed_is_empty() {
    assert!(EdgeHistory::deserialize(Some("{}")).is_empty());
    assert!(EdgeHistory::deserialize(None).is_empty());
}

// ============================================================================
// Properties
// ============================================================================

fn edge_list() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..6, 0u8..6), 0..24)
}

fn build(edges: &[(u8, u8)]) -> NavigationGraph {
    let mut graph = NavigationGraph::new();
    for (i, (a, b)) in edges.iter().enumerate() {
        graph.add_edge(
            &title(&format!("Page {}", a)),
            &title(&format!("Page {}", b)),
            t(i as i64 * 1_000),
        );
    }
    graph
}

proptest! {
    #[test]
    fn prop_repeated_edges_are_idempotent(edges in edge_list()) {
        let once = build(&edges);
        let mut twice_edges = edges.clone();
        twice_edges.extend(edges.iter().copied());
        let twice = build(&twice_edges);

        prop_assert_eq!(once.edge_count(), twice.edge_count());
        for node in once.nodes() {
            let other = twice.node(node.title().as_str()).unwrap();
            prop_assert_eq!(node.children(), other.children());
        }
    }

    #[test]
    fn prop_serialize_round_trip(edges in edge_list()) {
        let graph = build(&edges);
        let restored = NavigationGraph::deserialize(Some(&graph.serialize().unwrap()));
        prop_assert_eq!(restored, graph);
    }
}
