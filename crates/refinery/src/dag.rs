// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The branch-stack DAG and its merge cascade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::DagError;
use crate::signal::{MergeSignal, MergeSignaller};

/// Lifecycle of one stacked branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    #[default]
    Clean,
    NeedsRebase,
    Merged,
}

gt_core::simple_display! {
    BranchStatus {
        Clean => "clean",
        NeedsRebase => "needs_rebase",
        Merged => "merged",
    }
}

/// One node in the branch DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNode {
    /// Branch this one stacks on; empty means rooted at the default branch.
    #[serde(default)]
    pub depends_on: String,
    pub status: BranchStatus,
    /// Agent address responsible for the branch.
    pub worker: String,
    #[serde(default)]
    pub source_issue: String,
}

/// Aggregate counts for status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DagStats {
    pub total: usize,
    pub clean: usize,
    pub needs_rebase: usize,
    pub merged: usize,
}

/// Outcome of a merge cascade, for caller feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCascade {
    pub merged: String,
    /// Dependents retargeted to root and flagged for rebase.
    pub retargeted: Vec<String>,
}

/// On-disk shape: `{"nodes": {<branch>: {…}}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DagFile {
    nodes: BTreeMap<String, BranchNode>,
}

/// The per-repo branch DAG.
///
/// Every mutating operation rewrites the backing file atomically before it
/// returns. Single-process access is assumed; callers serialise.
#[derive(Debug)]
pub struct BranchDag {
    nodes: BTreeMap<String, BranchNode>,
    path: PathBuf,
}

impl BranchDag {
    /// File location under a repository root.
    pub fn dag_path(repo_root: &Path) -> PathBuf {
        repo_root.join(".gastown").join("branch-dag.json")
    }

    /// Load the DAG for `repo_root`, empty if the file does not exist.
    pub fn load(repo_root: &Path) -> Result<BranchDag, DagError> {
        let path = Self::dag_path(repo_root);
        let nodes = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<DagFile>(&content)?.nodes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(DagError::Io(e)),
        };
        Ok(BranchDag { nodes, path })
    }

    fn save(&self) -> Result<(), DagError> {
        let file = DagFile { nodes: self.nodes.clone() };
        gt_core::town::write_json_atomic(&self.path, &file)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BranchNode> {
        self.nodes.get(name)
    }

    pub fn branches(&self) -> impl Iterator<Item = (&str, &BranchNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Register a new branch stacked on `depends_on` (empty = root).
    pub fn register_branch(
        &mut self,
        name: &str,
        depends_on: &str,
        source_issue: &str,
        worker: &str,
    ) -> Result<(), DagError> {
        if self.nodes.contains_key(name) {
            return Err(DagError::BranchExists(name.to_string()));
        }
        if !depends_on.is_empty() && !self.nodes.contains_key(depends_on) {
            return Err(DagError::UnknownDependency {
                branch: name.to_string(),
                depends_on: depends_on.to_string(),
            });
        }

        // Walking the dependency chain from depends_on must never reach
        // the new name; with unique names this is the only cycle shape.
        let mut path = vec![name.to_string()];
        let mut cursor = depends_on.to_string();
        while !cursor.is_empty() {
            path.push(cursor.clone());
            if cursor == name {
                return Err(DagError::CycleDetected { branch: name.to_string(), path });
            }
            cursor = self
                .nodes
                .get(&cursor)
                .map(|n| n.depends_on.clone())
                .unwrap_or_default();
        }

        self.nodes.insert(
            name.to_string(),
            BranchNode {
                depends_on: depends_on.to_string(),
                status: BranchStatus::Clean,
                worker: worker.to_string(),
                source_issue: source_issue.to_string(),
            },
        );
        self.save()
    }

    /// Remove a branch nothing depends on.
    pub fn unregister_branch(&mut self, name: &str) -> Result<(), DagError> {
        if !self.nodes.contains_key(name) {
            return Err(DagError::UnknownBranch(name.to_string()));
        }
        let dependents: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.depends_on == name)
            .map(|(dep, _)| dep.clone())
            .collect();
        if !dependents.is_empty() {
            return Err(DagError::HasDependents { branch: name.to_string(), dependents });
        }
        self.nodes.remove(name);
        self.save()
    }

    /// Merge cascade: mark `name` merged, retarget its dependents to root
    /// with `needs_rebase`, and signal every affected worker.
    ///
    /// Signal failures are logged and do not abort the cascade.
    pub async fn handle_branch_merged(
        &mut self,
        name: &str,
        signaller: &dyn MergeSignaller,
    ) -> Result<MergeCascade, DagError> {
        let merged_worker = match self.nodes.get_mut(name) {
            Some(node) => {
                node.status = BranchStatus::Merged;
                node.worker.clone()
            }
            None => return Err(DagError::UnknownBranch(name.to_string())),
        };

        let mut retargeted = Vec::new();
        for (branch, node) in self.nodes.iter_mut() {
            if node.depends_on == name {
                node.depends_on = String::new();
                node.status = BranchStatus::NeedsRebase;
                retargeted.push((branch.clone(), node.worker.clone()));
            }
        }
        self.save()?;

        let mut deliveries: Vec<(String, MergeSignal)> = vec![(
            merged_worker,
            MergeSignal::Merged { branch: name.to_string() },
        )];
        for (branch, worker) in &retargeted {
            deliveries.push((
                worker.clone(),
                MergeSignal::Retargeted { branch: branch.clone(), old_dep: name.to_string() },
            ));
            deliveries.push((
                worker.clone(),
                MergeSignal::RebaseNeeded { branch: branch.clone() },
            ));
        }
        for (worker, signal) in deliveries {
            if let Err(e) = signaller.signal(&worker, signal.clone()).await {
                tracing::warn!(worker, %signal, error = %e, "merge signal delivery failed");
            }
        }

        Ok(MergeCascade {
            merged: name.to_string(),
            retargeted: retargeted.into_iter().map(|(branch, _)| branch).collect(),
        })
    }

    /// Branches needing a rebase, dependencies first.
    pub fn rebase_order(&self) -> Vec<String> {
        let pending: BTreeMap<&str, &BranchNode> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.status == BranchStatus::NeedsRebase)
            .map(|(name, node)| (name.as_str(), node))
            .collect();

        let mut order: Vec<String> = Vec::with_capacity(pending.len());
        let mut emitted: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
        while emitted.len() < pending.len() {
            let mut progressed = false;
            for (name, node) in &pending {
                if emitted.contains(name) {
                    continue;
                }
                let dep = node.depends_on.as_str();
                if dep.is_empty() || !pending.contains_key(dep) || emitted.contains(dep) {
                    order.push(name.to_string());
                    emitted.insert(name);
                    progressed = true;
                }
            }
            // A cycle cannot be registered, so this only guards corrupt input.
            if !progressed {
                break;
            }
        }
        order
    }

    /// A branch is ready to merge when it is clean and either rooted or
    /// stacked on an already-merged branch.
    pub fn ready_branches(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(_, node)| {
                node.status == BranchStatus::Clean
                    && (node.depends_on.is_empty()
                        || self
                            .nodes
                            .get(&node.depends_on)
                            .is_some_and(|dep| dep.status == BranchStatus::Merged))
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Check acyclicity and that every dependency is known and not merged.
    pub fn validate(&self) -> Result<(), DagError> {
        for (name, node) in &self.nodes {
            if node.depends_on.is_empty() {
                continue;
            }
            match self.nodes.get(&node.depends_on) {
                None => {
                    return Err(DagError::UnknownDependency {
                        branch: name.clone(),
                        depends_on: node.depends_on.clone(),
                    })
                }
                Some(dep) if dep.status == BranchStatus::Merged => {
                    return Err(DagError::MergedDependency {
                        branch: name.clone(),
                        depends_on: node.depends_on.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        // Chain walk per node; a cycle shows up as a revisit of the start.
        for start in self.nodes.keys() {
            let mut path = vec![start.clone()];
            let mut cursor = self.nodes[start].depends_on.clone();
            while !cursor.is_empty() {
                if cursor == *start {
                    path.push(cursor);
                    return Err(DagError::CycleDetected { branch: start.clone(), path });
                }
                if path.len() > self.nodes.len() {
                    break;
                }
                path.push(cursor.clone());
                cursor = self
                    .nodes
                    .get(&cursor)
                    .map(|n| n.depends_on.clone())
                    .unwrap_or_default();
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> DagStats {
        let mut stats = DagStats { total: 0, clean: 0, needs_rebase: 0, merged: 0 };
        for node in self.nodes.values() {
            stats.total += 1;
            match node.status {
                BranchStatus::Clean => stats.clean += 1,
                BranchStatus::NeedsRebase => stats.needs_rebase += 1,
                BranchStatus::Merged => stats.merged += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
