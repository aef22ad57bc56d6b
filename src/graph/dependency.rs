//! Dependency analysis with Kahn's algorithm for topological sorting
//!
//! Works on any `ProjectGraph`, generated or hand-edited: cycle detection,
//! a deterministic build order and summary statistics. Ties are always broken
//! by the graph's node order, so the same graph yields the same build order.

use crate::models::{ModuleStatus, ProjectGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Error types for dependency validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyValidationError {
    /// A cycle was detected in the dependency graph
    CycleDetected(Vec<String>),
    /// An edge references a module that is not in the graph
    MissingDependency { from: String, to: String },
    /// Self-referential dependency
    SelfDependency(String),
}

impl std::fmt::Display for DependencyValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyValidationError::CycleDetected(cycle) => {
                write!(f, "Cycle detected: {}", cycle.join(" → "))
            }
            DependencyValidationError::MissingDependency { from, to } => {
                write!(f, "Module '{}' depends on non-existent '{}'", from, to)
            }
            DependencyValidationError::SelfDependency(id) => {
                write!(f, "Module '{}' cannot depend on itself", id)
            }
        }
    }
}

impl std::error::Error for DependencyValidationError {}

/// Adjacency view of a project graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Module ids in graph order
    nodes: Vec<String>,
    /// Maps module ID to the modules it depends on (edge sources)
    depends_on: HashMap<String, Vec<String>>,
    /// Maps module ID to the modules blocked by it (edge targets)
    blocks: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Every module and edge of the graph
    pub fn from_project(graph: &ProjectGraph) -> Self {
        Self::collect(graph, |_| true)
    }

    /// Only modules with status `in`, and edges between them
    pub fn in_scope(graph: &ProjectGraph) -> Self {
        Self::collect(graph, |status| status == ModuleStatus::In)
    }

    fn collect(graph: &ProjectGraph, keep: impl Fn(ModuleStatus) -> bool) -> Self {
        let mut dependency_graph = Self::default();
        let mut kept = HashSet::new();
        for node in graph.nodes.iter().filter(|n| keep(n.status)) {
            dependency_graph.nodes.push(node.id.clone());
            kept.insert(node.id.as_str());
        }
        for edge in &graph.edges {
            // Dangling endpoints are kept so validate() can report them
            let dropped_source = graph.contains_node(&edge.source) && !kept.contains(edge.source.as_str());
            let dropped_target = graph.contains_node(&edge.target) && !kept.contains(edge.target.as_str());
            if dropped_source || dropped_target {
                continue;
            }
            dependency_graph
                .depends_on
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
            dependency_graph
                .blocks
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
        }
        dependency_graph
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Modules that `id` depends on
    pub fn get_dependencies(&self, id: &str) -> Vec<&String> {
        self.depends_on
            .get(id)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Modules blocked by `id`
    pub fn get_blocked_by(&self, id: &str) -> Vec<&String> {
        self.blocks
            .get(id)
            .map(|blocked| blocked.iter().collect())
            .unwrap_or_default()
    }

    /// Structural check followed by DFS cycle detection
    pub fn validate(&self) -> Result<(), DependencyValidationError> {
        let known: HashSet<&String> = self.nodes.iter().collect();
        for node in &self.nodes {
            for dep in self.get_dependencies(node) {
                if dep == node {
                    return Err(DependencyValidationError::SelfDependency(node.clone()));
                }
            }
        }
        for (node, deps) in self.sorted_depends_on() {
            for dep in deps {
                if !known.contains(dep) || !known.contains(node) {
                    return Err(DependencyValidationError::MissingDependency {
                        from: node.clone(),
                        to: dep.clone(),
                    });
                }
            }
        }

        let mut visited: HashSet<&String> = HashSet::new();
        let mut in_path: HashSet<&String> = HashSet::new();
        let mut path: Vec<&String> = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                if let Some(cycle) =
                    self.dfs_cycle_detect(node, &mut visited, &mut in_path, &mut path)
                {
                    return Err(DependencyValidationError::CycleDetected(
                        cycle.into_iter().map(|s| s.to_string()).collect(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Edge map entries in a stable order (node order first, then strays)
    fn sorted_depends_on(&self) -> Vec<(&String, &Vec<String>)> {
        let mut entries: Vec<(&String, &Vec<String>)> = self.depends_on.iter().collect();
        let position: HashMap<&String, usize> =
            self.nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();
        entries.sort_by(|a, b| {
            let pa = position.get(a.0).copied().unwrap_or(usize::MAX);
            let pb = position.get(b.0).copied().unwrap_or(usize::MAX);
            pa.cmp(&pb).then_with(|| a.0.cmp(b.0))
        });
        entries
    }

    fn dfs_cycle_detect<'a>(
        &'a self,
        node: &'a String,
        visited: &mut HashSet<&'a String>,
        in_path: &mut HashSet<&'a String>,
        path: &mut Vec<&'a String>,
    ) -> Option<Vec<&'a String>> {
        visited.insert(node);
        in_path.insert(node);
        path.push(node);

        if let Some(deps) = self.depends_on.get(node) {
            for dep in deps {
                if in_path.contains(dep) {
                    let cycle_start = path.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut cycle: Vec<&String> = path[cycle_start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }

                if !visited.contains(dep) {
                    if let Some(cycle) = self.dfs_cycle_detect(dep, visited, in_path, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        in_path.remove(node);
        path.pop();
        None
    }

    /// Build order using Kahn's algorithm. Ready modules are taken in graph order.
    pub fn execution_order(&self) -> Result<Vec<String>, DependencyValidationError> {
        self.validate()?;

        let mut in_degree: HashMap<&String, usize> = self
            .nodes
            .iter()
            .map(|n| (n, self.depends_on.get(n).map_or(0, |d| d.len())))
            .collect();

        let mut queue: VecDeque<&String> = self
            .nodes
            .iter()
            .filter(|n| in_degree.get(n).copied() == Some(0))
            .collect();

        let mut result: Vec<String> = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            result.push(node.clone());

            if let Some(blocked) = self.blocks.get(node) {
                for blocked_node in blocked {
                    if let Some(degree) = in_degree.get_mut(blocked_node) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(blocked_node);
                        }
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            return Err(DependencyValidationError::CycleDetected(Vec::new()));
        }

        Ok(result)
    }

    pub fn stats(&self) -> DependencyStats {
        let total_dependencies: usize = self.depends_on.values().map(|v| v.len()).sum();

        let root_nodes: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| self.get_dependencies(n).is_empty())
            .cloned()
            .collect();

        let leaf_nodes: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| self.get_blocked_by(n).is_empty())
            .cloned()
            .collect();

        DependencyStats {
            total_nodes: self.nodes.len(),
            total_dependencies,
            max_depth: self.calculate_max_depth(),
            root_nodes,
            leaf_nodes,
        }
    }

    /// Longest dependency chain. Zero when the graph has a cycle.
    fn calculate_max_depth(&self) -> usize {
        if self.validate().is_err() {
            return 0;
        }
        let mut memo: HashMap<&String, usize> = HashMap::new();
        self.nodes
            .iter()
            .map(|node| self.node_depth(node, &mut memo))
            .max()
            .unwrap_or(0)
    }

    fn node_depth<'a>(&'a self, node: &'a String, memo: &mut HashMap<&'a String, usize>) -> usize {
        if let Some(&depth) = memo.get(node) {
            return depth;
        }

        let depth = match self.depends_on.get(node) {
            None => 0,
            Some(deps) if deps.is_empty() => 0,
            Some(deps) => {
                1 + deps
                    .iter()
                    .map(|d| self.node_depth(d, memo))
                    .max()
                    .unwrap_or(0)
            }
        };

        memo.insert(node, depth);
        depth
    }
}

/// Statistics about a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStats {
    pub total_nodes: usize,
    pub total_dependencies: usize,
    /// Longest dependency chain
    pub max_depth: usize,
    /// Modules with no dependencies (can start immediately)
    pub root_nodes: Vec<String>,
    /// Modules nothing depends on
    pub leaf_nodes: Vec<String>,
}
