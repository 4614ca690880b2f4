// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Convoy dependency planning: wave computation and cycle detection.
//!
//! Both functions are stateless and deterministic: nodes are visited in
//! sorted-id order and ties inside a wave break lexicographically, so a
//! given input always produces the same plan. Only *slingable* nodes (tasks,
//! bugs, features) participate; epics and parent/child edges never affect
//! wave assignment.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Issue type of a convoy DAG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Task,
    Bug,
    Feature,
    Epic,
    Convoy,
    Message,
    Agent,
}

crate::simple_display! {
    NodeType {
        Task => "task",
        Bug => "bug",
        Feature => "feature",
        Epic => "epic",
        Convoy => "convoy",
        Message => "message",
        Agent => "agent",
    }
}

impl NodeType {
    /// Types that can be placed on an agent's hook.
    pub fn is_slingable(&self) -> bool {
        matches!(self, NodeType::Task | NodeType::Bug | NodeType::Feature)
    }
}

/// In-memory view of one bead for planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvoyNode {
    pub id: String,
    pub title: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub rig: String,
    /// Beads this node blocks (forward dependency edges).
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Beads blocking this node (reverse edges; normalised into `blocks`).
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

crate::builder! {
    pub struct ConvoyNodeBuilder => ConvoyNode {
        into {
            id: String = "t-0",
            title: String = "task",
        }
        set {
            node_type: NodeType = NodeType::Task,
            rig: String = String::new(),
            blocks: Vec<String> = Vec::new(),
            blocked_by: Vec<String> = Vec::new(),
            parent: Option<String> = None,
            children: Vec<String> = Vec::new(),
        }
    }
}

/// One dispatch wave: tasks whose blockers all lie in earlier waves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wave {
    pub number: usize,
    pub tasks: Vec<String>,
}

/// A dependency cycle among slingable nodes.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("dependency cycle: {}", path.join(" -> "))]
pub struct CycleError {
    pub path: Vec<String>,
}

/// Forward `blocks` edges restricted to slingable nodes.
///
/// `blocked_by` entries are normalised into forward edges so both listing
/// directions feed the same graph.
fn slingable_edges(nodes: &[ConvoyNode]) -> BTreeMap<&str, BTreeSet<&str>> {
    let ids: BTreeSet<&str> = nodes
        .iter()
        .filter(|n| n.node_type.is_slingable())
        .map(|n| n.id.as_str())
        .collect();

    let mut edges: BTreeMap<&str, BTreeSet<&str>> =
        ids.iter().map(|id| (*id, BTreeSet::new())).collect();
    for node in nodes.iter().filter(|n| n.node_type.is_slingable()) {
        for blocked in &node.blocks {
            if ids.contains(blocked.as_str()) {
                if let Some(out) = edges.get_mut(node.id.as_str()) {
                    out.insert(blocked.as_str());
                }
            }
        }
        for blocker in &node.blocked_by {
            if ids.contains(blocker.as_str()) {
                if let Some(out) = edges.get_mut(blocker.as_str()) {
                    out.insert(node.id.as_str());
                }
            }
        }
    }
    edges
}

/// Compute dispatch waves over the slingable subgraph.
///
/// Wave 1 holds every slingable node with no slingable blockers; wave N+1
/// holds nodes whose blockers all sit in waves ≤ N. Fails with the cycle
/// path if any slingable node can never be emitted.
pub fn compute_waves(nodes: &[ConvoyNode]) -> Result<Vec<Wave>, CycleError> {
    let edges = slingable_edges(nodes);

    // blocker count per node, from the forward edge map
    let mut blockers: BTreeMap<&str, BTreeSet<&str>> =
        edges.keys().map(|id| (*id, BTreeSet::new())).collect();
    for (from, outs) in &edges {
        for to in outs {
            if let Some(b) = blockers.get_mut(to) {
                b.insert(from);
            }
        }
    }

    let mut waves = Vec::new();
    let mut emitted: BTreeSet<&str> = BTreeSet::new();
    let mut remaining: BTreeSet<&str> = edges.keys().copied().collect();

    while !remaining.is_empty() {
        let ready: Vec<&str> = remaining
            .iter()
            .filter(|id| {
                blockers
                    .get(*id)
                    .is_none_or(|b| b.iter().all(|blk| emitted.contains(blk)))
            })
            .copied()
            .collect();

        if ready.is_empty() {
            let path = detect_cycles(nodes)
                .unwrap_or_else(|| remaining.iter().map(|s| s.to_string()).collect());
            return Err(CycleError { path });
        }

        waves.push(Wave {
            number: waves.len() + 1,
            tasks: ready.iter().map(|s| s.to_string()).collect(),
        });
        for id in ready {
            remaining.remove(id);
            emitted.insert(id);
        }
    }

    Ok(waves)
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    White,
    Grey,
    Black,
}

/// Find a dependency cycle among slingable nodes, if any.
///
/// Three-colour depth-first search in sorted-id order; on a back-edge the
/// grey stack slice from the re-entered node is returned. The path has at
/// least two entries and every consecutive pair is a `blocks` edge.
pub fn detect_cycles(nodes: &[ConvoyNode]) -> Option<Vec<String>> {
    let edges = slingable_edges(nodes);
    let mut marks: BTreeMap<&str, Mark> = edges.keys().map(|id| (*id, Mark::White)).collect();
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'a>(
        id: &'a str,
        edges: &BTreeMap<&'a str, BTreeSet<&'a str>>,
        marks: &mut BTreeMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(id, Mark::Grey);
        stack.push(id);
        if let Some(outs) = edges.get(id) {
            for &next in outs {
                match marks.get(next) {
                    Some(Mark::Grey) => {
                        let start = stack.iter().position(|s| *s == next).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[start..].iter().map(|s| s.to_string()).collect();
                        if path.len() < 2 {
                            path.push(next.to_string());
                        }
                        return Some(path);
                    }
                    Some(Mark::White) => {
                        if let Some(path) = visit(next, edges, marks, stack) {
                            return Some(path);
                        }
                    }
                    _ => {}
                }
            }
        }
        stack.pop();
        marks.insert(id, Mark::Black);
        None
    }

    let ids: Vec<&str> = edges.keys().copied().collect();
    for id in ids {
        if marks.get(id) == Some(&Mark::White) {
            if let Some(path) = visit(id, &edges, &mut marks, &mut stack) {
                return Some(path);
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "convoy_tests.rs"]
mod tests;
