//! Dependency graph for a task batch
//!
//! Nodes are positions in the submitted batch. An edge `p -> t` means
//! "p must come before t". Uses petgraph for cycle detection.

use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::task::Task;

/// A task named in an error or explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRef {
    pub index: usize,
    pub title: String,
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.title)
    }
}

/// The batch's dependencies contain at least one cycle
#[derive(Debug, Error, PartialEq)]
#[error("Dependency cycle detected: {}", format_cycles(.cycles))]
pub struct DependencyCycleError {
    /// Participants of each cycle, in input order
    pub cycles: Vec<Vec<TaskRef>>,
}

impl DependencyCycleError {
    /// All distinct titles involved in any cycle
    pub fn titles(&self) -> Vec<&str> {
        self.cycles
            .iter()
            .flatten()
            .map(|t| t.title.as_str())
            .collect()
    }
}

fn format_cycles(cycles: &[Vec<TaskRef>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let names: Vec<_> = cycle.iter().map(|t| t.to_string()).collect();
            format!("{{{}}}", names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A dependency reference that matched nothing in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub index: usize,
    pub reference: String,
}

/// Dependency graph over one batch of tasks
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<usize, ()>,
    unresolved: Vec<UnresolvedReference>,
}

impl DependencyGraph {
    /// Builds the graph for a batch
    ///
    /// A reference resolves to every task whose id equals it; failing that,
    /// to every task whose title matches it. A task never matches its own
    /// reference while some other task also does. References that resolve
    /// to nothing are recorded and otherwise ignored.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());

        // Node indices equal batch positions
        for index in 0..tasks.len() {
            graph.add_node(index);
        }

        let mut unresolved = Vec::new();

        for (index, task) in tasks.iter().enumerate() {
            for reference in &task.dependencies {
                let targets = resolve(tasks, index, reference);

                if targets.is_empty() {
                    debug!(task = %task.title, reference = %reference, "dependency outside batch, treated as satisfied");
                    unresolved.push(UnresolvedReference {
                        index,
                        reference: reference.clone(),
                    });
                    continue;
                }

                for target in targets {
                    graph.update_edge(NodeIndex::new(target), NodeIndex::new(index), ());
                }
            }
        }

        Self { graph, unresolved }
    }

    /// Fails with every cycle in the graph, self-dependencies included
    pub fn check_acyclic(&self, tasks: &[Task]) -> Result<(), DependencyCycleError> {
        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self
                        .graph
                        .find_edge(component[0], component[0])
                        .is_some()
            })
            .map(|component| {
                let mut members: Vec<usize> = component.into_iter().map(|n| n.index()).collect();
                members.sort_unstable();
                members
            })
            .collect();

        if cycles.is_empty() {
            return Ok(());
        }

        cycles.sort_by_key(|members| members[0]);

        Err(DependencyCycleError {
            cycles: cycles
                .into_iter()
                .map(|members| {
                    members
                        .into_iter()
                        .map(|index| TaskRef {
                            index,
                            title: tasks[index].title.clone(),
                        })
                        .collect()
                })
                .collect(),
        })
    }

    /// Batch positions of the direct prerequisites of `index`, ascending
    pub fn prerequisites(&self, index: usize) -> Vec<usize> {
        self.neighbors(index, Direction::Incoming)
    }

    /// Batch positions of the tasks that directly depend on `index`, ascending
    pub fn dependents(&self, index: usize) -> Vec<usize> {
        self.neighbors(index, Direction::Outgoing)
    }

    fn neighbors(&self, index: usize, direction: Direction) -> Vec<usize> {
        if index >= self.graph.node_count() {
            return vec![];
        }

        let mut found: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(index), direction)
            .map(|n| n.index())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// References that matched no task in the batch
    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

fn resolve(tasks: &[Task], from: usize, reference: &str) -> Vec<usize> {
    let mut targets: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.has_id(reference))
        .map(|(i, _)| i)
        .collect();

    if targets.is_empty() {
        targets = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.has_title(reference))
            .map(|(i, _)| i)
            .collect();
    }

    // Only the referencing task itself matched: a genuine self-dependency
    if targets.len() > 1 {
        targets.retain(|&i| i != from);
    }
    targets
}
