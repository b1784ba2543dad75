//! Talent prerequisite graph.
//!
//! Provides the `TalentGraph` type, which represents talent prerequisites
//! as a directed acyclic graph (DAG). Used by the talent tree to reject
//! prerequisite cycles, find a talent's dependents, and order rank
//! removal when a tree is cleared.

use crate::error::SimError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of talent prerequisites.
///
/// Nodes are talent names. An edge runs from a prerequisite to the talent
/// that requires it, so a topological order lists prerequisites first.
///
/// # Examples
///
/// ```rust
/// use combatsim::graph::TalentGraph;
///
/// let mut graph = TalentGraph::new();
/// graph.add_prerequisite("Mortal Strike", "Deep Wounds");
///
/// let order = graph.topological_sort().unwrap();
/// assert_eq!(order, vec!["Deep Wounds".to_string(), "Mortal Strike".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TalentGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl TalentGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a talent if it is not already present and return its node.
    pub fn add_node(&mut self, talent: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(talent) {
            idx
        } else {
            let idx = self.graph.add_node(talent.to_string());
            self.node_map.insert(talent.to_string(), idx);
            idx
        }
    }

    /// Record that `talent` requires `prerequisite`.
    ///
    /// Both nodes are added if missing. Cycles are not rejected here; call
    /// [`TalentGraph::detect_cycles`] once the graph is complete.
    pub fn add_prerequisite(&mut self, talent: &str, prerequisite: &str) {
        let talent_idx = self.add_node(talent);
        let prerequisite_idx = self.add_node(prerequisite);
        self.graph.add_edge(prerequisite_idx, talent_idx, ());
    }

    /// Drop the edge added by [`TalentGraph::add_prerequisite`], if any.
    pub fn remove_prerequisite(&mut self, talent: &str, prerequisite: &str) {
        let (Some(&talent_idx), Some(&prerequisite_idx)) =
            (self.node_map.get(talent), self.node_map.get(prerequisite))
        else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(prerequisite_idx, talent_idx) {
            self.graph.remove_edge(edge);
        }
    }

    /// Detect prerequisite cycles.
    ///
    /// # Errors
    ///
    /// [`SimError::PrerequisiteCycle`] with the closed cycle path, e.g.
    /// `["A", "B", "A"]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use combatsim::graph::TalentGraph;
    ///
    /// let mut graph = TalentGraph::new();
    /// graph.add_prerequisite("B", "A");
    /// assert!(graph.detect_cycles().is_ok());
    ///
    /// graph.add_prerequisite("A", "B");
    /// assert!(graph.detect_cycles().is_err());
    /// ```
    pub fn detect_cycles(&self) -> Result<(), SimError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut cycle_path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut cycle_path)
                {
                    return Err(cycle);
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        cycle_path: &mut Vec<NodeIndex>,
    ) -> Option<SimError> {
        visited.insert(node);
        rec_stack.insert(node);
        cycle_path.push(node);

        for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, cycle_path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                // The cycle is the part of the path from the revisited node on.
                let start = cycle_path
                    .iter()
                    .position(|idx| *idx == neighbor)
                    .unwrap_or(cycle_path.len() - 1);
                let mut path: Vec<String> = cycle_path[start..]
                    .iter()
                    .map(|idx| self.graph[*idx].clone())
                    .collect();
                path.push(self.graph[neighbor].clone());
                return Some(SimError::PrerequisiteCycle { path });
            }
        }

        rec_stack.remove(&node);
        cycle_path.pop();
        None
    }

    /// Every talent, prerequisites before the talents that require them.
    pub fn topological_sort(&self) -> Result<Vec<String>, SimError> {
        self.detect_cycles()?;

        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => Err(SimError::PrerequisiteCycle {
                path: vec![self.graph[cycle.node_id()].clone()],
            }),
        }
    }

    /// Talents that name `talent` as their prerequisite.
    pub fn dependents(&self, talent: &str) -> Vec<String> {
        let Some(&idx) = self.node_map.get(talent) else {
            return Vec::new();
        };
        let mut dependents: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|dep| self.graph[dep].clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// Prerequisites of `talent`.
    pub fn prerequisites(&self, talent: &str) -> Vec<String> {
        let Some(&idx) = self.node_map.get(talent) else {
            return Vec::new();
        };
        let mut prerequisites: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|pre| self.graph[pre].clone())
            .collect();
        prerequisites.sort();
        prerequisites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_nodes() {
        let mut graph = TalentGraph::new();
        let first = graph.add_node("Cruelty");
        let second = graph.add_node("Cruelty");
        assert_eq!(first, second);
        assert_eq!(graph.graph.node_count(), 1);
        assert_eq!(graph.node_map.len(), 1);
    }

    #[test]
    fn test_topological_sort_chain() {
        let mut graph = TalentGraph::new();
        graph.add_prerequisite("Bloodthirst", "Flurry");
        graph.add_prerequisite("Flurry", "Enrage");
        graph.add_node("Cruelty");

        let order = graph.topological_sort().unwrap();
        let pos = |name: &str| order.iter().position(|t| t == name).unwrap();
        assert!(pos("Enrage") < pos("Flurry"));
        assert!(pos("Flurry") < pos("Bloodthirst"));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_dependents_and_prerequisites() {
        let mut graph = TalentGraph::new();
        graph.add_prerequisite("Mortal Strike", "Deep Wounds");
        graph.add_prerequisite("Impale", "Deep Wounds");

        assert_eq!(
            graph.dependents("Deep Wounds"),
            vec!["Impale".to_string(), "Mortal Strike".to_string()]
        );
        assert_eq!(graph.prerequisites("Impale"), vec!["Deep Wounds".to_string()]);
        assert!(graph.dependents("Unknown").is_empty());
    }

    #[test]
    fn test_cycle_path_3_node() {
        let mut graph = TalentGraph::new();
        graph.add_prerequisite("B", "A");
        graph.add_prerequisite("C", "B");
        graph.add_prerequisite("A", "C");

        match graph.detect_cycles() {
            Err(SimError::PrerequisiteCycle { path }) => {
                assert_eq!(path.len(), 4);
                assert_eq!(path[0], path[3]);
                for name in ["A", "B", "C"] {
                    assert!(path.iter().any(|t| t == name));
                }
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert!(graph.topological_sort().is_err());
    }

    #[test]
    fn test_cycle_path_excludes_non_cycle_nodes() {
        let mut graph = TalentGraph::new();
        graph.add_prerequisite("Y", "X");
        graph.add_prerequisite("A", "Y");
        graph.add_prerequisite("B", "A");
        graph.add_prerequisite("A", "B");

        match graph.detect_cycles() {
            Err(SimError::PrerequisiteCycle { path }) => {
                assert!(!path.iter().any(|t| t == "X" || t == "Y"));
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle() {
        let mut graph = TalentGraph::new();
        graph.add_prerequisite("A", "A");
        assert_eq!(
            graph.detect_cycles(),
            Err(SimError::PrerequisiteCycle {
                path: vec!["A".to_string(), "A".to_string()]
            })
        );
    }
}
