//! Module dependency graph model
//!
//! A `ProjectGraph` is an ordered list of modules (insertion order is display
//! order) plus directed edges between them. Every mutation keeps the graph
//! referentially intact: edges only ever point at nodes of the same graph.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Lowest and highest layer a module may sit in
pub const MIN_LAYER: u8 = 1;
pub const MAX_LAYER: u8 = 5;

/// Scope decision for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    #[default]
    In,
    Out,
    Maybe,
}

/// Fixed category enumeration for modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleCategory {
    Frontend,
    Backend,
    Database,
    Authentication,
    Security,
    Payment,
    Integration,
    #[serde(rename = "UI/UX")]
    UiUx,
    Analytics,
    #[serde(rename = "AI/ML")]
    AiMl,
    Data,
    Admin,
    Support,
    /// Default bucket for features no rule recognises
    Core,
}

impl ModuleCategory {
    pub const ALL: [ModuleCategory; 14] = [
        ModuleCategory::Frontend,
        ModuleCategory::Backend,
        ModuleCategory::Database,
        ModuleCategory::Authentication,
        ModuleCategory::Security,
        ModuleCategory::Payment,
        ModuleCategory::Integration,
        ModuleCategory::UiUx,
        ModuleCategory::Analytics,
        ModuleCategory::AiMl,
        ModuleCategory::Data,
        ModuleCategory::Admin,
        ModuleCategory::Support,
        ModuleCategory::Core,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleCategory::Frontend => "Frontend",
            ModuleCategory::Backend => "Backend",
            ModuleCategory::Database => "Database",
            ModuleCategory::Authentication => "Authentication",
            ModuleCategory::Security => "Security",
            ModuleCategory::Payment => "Payment",
            ModuleCategory::Integration => "Integration",
            ModuleCategory::UiUx => "UI/UX",
            ModuleCategory::Analytics => "Analytics",
            ModuleCategory::AiMl => "AI/ML",
            ModuleCategory::Data => "Data",
            ModuleCategory::Admin => "Admin",
            ModuleCategory::Support => "Support",
            ModuleCategory::Core => "Core",
        }
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Display position. Never load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A feature-level unit of functionality on the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub status: ModuleStatus,
    pub category: ModuleCategory,
    pub layer: u8,
    pub sequence_in_layer: u32,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

impl ModuleEdge {
    pub fn new(id: &str, source: &str, target: &str, label: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            label: label.map(|l| l.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectGraph {
    pub nodes: Vec<ModuleNode>,
    pub edges: Vec<ModuleEdge>,
}

impl ProjectGraph {
    /// Create an empty graph (the state of a freshly created project)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&ModuleNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Modules currently in scope
    pub fn in_scope(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.iter().filter(|n| n.status == ModuleStatus::In)
    }

    /// Append a module. Fails on a duplicate id or an out-of-range layer.
    pub fn add_node(&mut self, node: ModuleNode) -> PipelineResult<()> {
        if self.contains_node(&node.id) {
            return Err(PipelineError::validation(format!(
                "module id '{}' already exists",
                node.id
            )));
        }
        check_layer(&node)?;
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a module and every edge touching it
    pub fn remove_node(&mut self, id: &str) -> PipelineResult<ModuleNode> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| PipelineError::NotFound {
                kind: "Module",
                id: id.to_string(),
            })?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(self.nodes.remove(index))
    }

    /// Add an edge. Both endpoints must exist; self-loops are rejected.
    pub fn add_edge(&mut self, edge: ModuleEdge) -> PipelineResult<()> {
        self.check_edge(&edge)?;
        if self.edges.iter().any(|e| e.id == edge.id) {
            return Err(PipelineError::validation(format!(
                "edge id '{}' already exists",
                edge.id
            )));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn remove_edge(&mut self, id: &str) -> PipelineResult<ModuleEdge> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| PipelineError::NotFound {
                kind: "Edge",
                id: id.to_string(),
            })?;
        Ok(self.edges.remove(index))
    }

    pub fn set_status(&mut self, id: &str, status: ModuleStatus) -> PipelineResult<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| PipelineError::NotFound {
                kind: "Module",
                id: id.to_string(),
            })?;
        node.status = status;
        Ok(())
    }

    /// Full structural check, used on hand-edited graphs before they are saved
    pub fn check_integrity(&self) -> PipelineResult<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(PipelineError::validation(format!(
                    "duplicate module id '{}'",
                    node.id
                )));
            }
            check_layer(node)?;
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(PipelineError::validation(format!(
                    "duplicate edge id '{}'",
                    edge.id
                )));
            }
            self.check_edge(edge)?;
        }
        Ok(())
    }

    fn check_edge(&self, edge: &ModuleEdge) -> PipelineResult<()> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.contains_node(endpoint) {
                return Err(PipelineError::validation(format!(
                    "edge '{}' references unknown module '{}'",
                    edge.id, endpoint
                )));
            }
        }
        if edge.source == edge.target {
            return Err(PipelineError::validation(format!(
                "edge '{}' is a self-loop on '{}'",
                edge.id, edge.source
            )));
        }
        Ok(())
    }

    /// Serialize for the storage boundary
    pub fn to_json(&self) -> PipelineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::validation(format!("Failed to serialize graph: {}", e)))
    }

    /// Parse a stored graph and check it
    pub fn from_json(content: &str) -> PipelineResult<Self> {
        let graph: ProjectGraph = serde_json::from_str(content)
            .map_err(|e| PipelineError::validation(format!("Malformed graph document: {}", e)))?;
        graph.check_integrity()?;
        Ok(graph)
    }
}

fn check_layer(node: &ModuleNode) -> PipelineResult<()> {
    if !(MIN_LAYER..=MAX_LAYER).contains(&node.layer) {
        return Err(PipelineError::validation(format!(
            "module '{}' has layer {} (must be {}-{})",
            node.id, node.layer, MIN_LAYER, MAX_LAYER
        )));
    }
    Ok(())
}
