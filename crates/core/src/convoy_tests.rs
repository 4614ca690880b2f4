// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn task(id: &str) -> ConvoyNode {
    ConvoyNode::builder().id(id).build()
}

fn task_blocking(id: &str, blocks: &[&str]) -> ConvoyNode {
    ConvoyNode::builder()
        .id(id)
        .blocks(blocks.iter().map(|s| s.to_string()).collect())
        .build()
}

fn wave_tasks(waves: &[Wave]) -> Vec<Vec<&str>> {
    waves
        .iter()
        .map(|w| w.tasks.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn linear_chain_with_branch() {
    // t-0 blocks t-1 blocks t-2; t-0 blocks t-3
    let nodes = vec![
        task_blocking("t-0", &["t-1", "t-3"]),
        task_blocking("t-1", &["t-2"]),
        task("t-2"),
        task("t-3"),
    ];
    let waves = compute_waves(&nodes).unwrap();
    assert_eq!(wave_tasks(&waves), vec![vec!["t-0"], vec!["t-1", "t-3"], vec!["t-2"]]);
    assert_eq!(waves[0].number, 1);
    assert_eq!(waves[2].number, 3);
}

#[test]
fn epic_parent_does_not_change_waves() {
    let mut nodes = vec![
        task_blocking("t-0", &["t-1", "t-3"]),
        task_blocking("t-1", &["t-2"]),
        task("t-2"),
        task("t-3"),
    ];
    let without_epic = compute_waves(&nodes).unwrap();

    let mut epic = ConvoyNode::builder().id("e-1").node_type(NodeType::Epic).build();
    epic.children = vec!["t-0".into(), "t-1".into(), "t-2".into(), "t-3".into()];
    epic.blocks = vec!["t-0".into(), "t-1".into()];
    for n in &mut nodes {
        n.parent = Some("e-1".into());
    }
    nodes.push(epic);

    let with_epic = compute_waves(&nodes).unwrap();
    assert_eq!(without_epic, with_epic);
    for wave in &with_epic {
        assert!(!wave.tasks.contains(&"e-1".to_string()));
    }
}

#[test]
fn blocked_by_normalises_to_forward_edges() {
    let mut t1 = task("t-1");
    t1.blocked_by = vec!["t-0".into()];
    let nodes = vec![task("t-0"), t1];
    let waves = compute_waves(&nodes).unwrap();
    assert_eq!(wave_tasks(&waves), vec![vec!["t-0"], vec!["t-1"]]);
}

#[test]
fn cycle_fails_waves_and_reports_path() {
    let nodes = vec![
        task_blocking("t-0", &["t-1"]),
        task_blocking("t-1", &["t-2"]),
        task_blocking("t-2", &["t-0"]),
    ];
    let err = compute_waves(&nodes).unwrap_err();
    assert!(err.path.len() >= 2);

    let cycle = detect_cycles(&nodes).unwrap();
    // Every consecutive pair must be a blocks edge.
    for pair in cycle.windows(2) {
        let from = nodes.iter().find(|n| n.id == pair[0]).unwrap();
        assert!(from.blocks.contains(&pair[1]), "{} should block {}", pair[0], pair[1]);
    }
    // And the cycle closes.
    let last = nodes.iter().find(|n| n.id == *cycle.last().unwrap()).unwrap();
    assert!(last.blocks.contains(&cycle[0]));
}

#[test]
fn acyclic_graph_has_no_cycle() {
    let nodes = vec![task_blocking("t-0", &["t-1"]), task("t-1")];
    assert_eq!(detect_cycles(&nodes), None);
}

#[test]
fn cycle_through_epic_is_ignored() {
    // Epics are not slingable; an edge cycle passing through one is no cycle.
    let mut epic = ConvoyNode::builder().id("e-0").node_type(NodeType::Epic).build();
    epic.blocks = vec!["t-0".into()];
    let nodes = vec![task_blocking("t-0", &["e-0"]), epic];
    assert_eq!(detect_cycles(&nodes), None);
    assert!(compute_waves(&nodes).is_ok());
}

#[test]
fn edges_to_unknown_ids_are_dropped() {
    let nodes = vec![task_blocking("t-0", &["missing-9"])];
    let waves = compute_waves(&nodes).unwrap();
    assert_eq!(wave_tasks(&waves), vec![vec!["t-0"]]);
}

#[test]
fn deterministic_for_shuffled_input() {
    let forward = vec![
        task_blocking("t-0", &["t-1"]),
        task_blocking("t-1", &["t-2"]),
        task("t-2"),
        task("t-3"),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();
    assert_eq!(compute_waves(&forward).unwrap(), compute_waves(&reversed).unwrap());
}

/// Random DAG: edges only from lower to higher index, so always acyclic.
fn arb_dag() -> impl Strategy<Value = Vec<ConvoyNode>> {
    (2usize..12).prop_flat_map(|n| {
        let edges = proptest::collection::vec((0..n, 0..n), 0..(n * 2));
        edges.prop_map(move |pairs| {
            let mut nodes: Vec<ConvoyNode> =
                (0..n).map(|i| task(&format!("t-{i:02}"))).collect();
            for (a, b) in pairs {
                let (lo, hi) = (a.min(b), a.max(b));
                if lo != hi {
                    let target = format!("t-{hi:02}");
                    if !nodes[lo].blocks.contains(&target) {
                        nodes[lo].blocks.push(target);
                    }
                }
            }
            nodes
        })
    })
}

proptest! {
    #[test]
    fn waves_cover_every_slingable_node_exactly_once(nodes in arb_dag()) {
        let waves = compute_waves(&nodes).unwrap();
        let mut seen = BTreeSet::new();
        for wave in &waves {
            for id in &wave.tasks {
                prop_assert!(seen.insert(id.clone()), "{id} emitted twice");
            }
        }
        prop_assert_eq!(seen.len(), nodes.len());
    }

    #[test]
    fn blockers_always_land_in_earlier_waves(nodes in arb_dag()) {
        let waves = compute_waves(&nodes).unwrap();
        let wave_of = |id: &str| {
            waves
                .iter()
                .find(|w| w.tasks.iter().any(|t| t == id))
                .map(|w| w.number)
                .unwrap_or(0)
        };
        for node in &nodes {
            for blocked in &node.blocks {
                prop_assert!(wave_of(&node.id) < wave_of(blocked));
            }
        }
    }

    #[test]
    fn adding_epics_never_changes_wave_numbers(nodes in arb_dag()) {
        let plain = compute_waves(&nodes).unwrap();
        let mut with_epic = nodes.clone();
        let mut epic = ConvoyNode::builder().id("e-root").node_type(NodeType::Epic).build();
        epic.blocks = nodes.iter().map(|n| n.id.clone()).collect();
        epic.children = nodes.iter().map(|n| n.id.clone()).collect();
        with_epic.push(epic);
        prop_assert_eq!(plain, compute_waves(&with_epic).unwrap());
    }

    #[test]
    fn acyclic_dags_report_no_cycle(nodes in arb_dag()) {
        prop_assert_eq!(detect_cycles(&nodes), None);
    }
}
