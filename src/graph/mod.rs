// Module dependency graph: wholesale derivation and dependency analysis

pub mod builder;
pub mod dependency;

pub use builder::{grid_position, ModuleGraphBuilder};
pub use dependency::{DependencyGraph, DependencyStats, DependencyValidationError};

use crate::error::{PipelineError, PipelineResult};
use crate::models::ProjectGraph;

/// Labels of in-scope modules in build order, for documents that list a
/// suggested implementation sequence
pub fn build_order_labels(graph: &ProjectGraph) -> PipelineResult<Vec<String>> {
    let order = DependencyGraph::in_scope(graph)
        .execution_order()
        .map_err(|e| PipelineError::validation(format!("graph has no build order: {}", e)))?;
    Ok(order
        .iter()
        .filter_map(|id| graph.node(id).map(|n| n.label.clone()))
        .collect())
}
