// Module Graph Builder - derives a ProjectGraph from a requirements feature list

use crate::classifier::rules::prerequisite_for;
use crate::classifier::{CategoryClassifier, Classification};
use crate::models::{
    Feature, ModuleEdge, ModuleNode, ModuleStatus, Position, ProjectGraph, MAX_LAYER,
};

/// Horizontal distance between layer columns in the default layout
pub const COLUMN_WIDTH: f64 = 280.0;
/// Vertical distance between modules of the same layer
pub const ROW_HEIGHT: f64 = 120.0;

/// Display hint for a module at (layer, sequence)
pub fn grid_position(layer: u8, sequence_in_layer: u32) -> Position {
    Position {
        x: f64::from(layer.saturating_sub(1)) * COLUMN_WIDTH,
        y: f64::from(sequence_in_layer.saturating_sub(1)) * ROW_HEIGHT,
    }
}

/// Builds graphs wholesale. Identity is never carried over from a previous
/// graph: the same feature list always yields the same ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleGraphBuilder {
    classifier: CategoryClassifier,
}

impl ModuleGraphBuilder {
    pub fn new(classifier: CategoryClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn build_graph(&self, features: &[Feature]) -> ProjectGraph {
        let mut next_sequence = [0u32; MAX_LAYER as usize + 1];
        let mut nodes = Vec::with_capacity(features.len());

        for (index, feature) in features.iter().enumerate() {
            let Classification { category, layer } = self.classifier.classify_feature(feature);
            let slot = &mut next_sequence[usize::from(layer)];
            *slot += 1;
            let sequence_in_layer = *slot;

            nodes.push(ModuleNode {
                id: format!("module-{}", index + 1),
                label: feature.title.clone(),
                status: ModuleStatus::In,
                category,
                layer,
                sequence_in_layer,
                position: grid_position(layer, sequence_in_layer),
                description: feature.description.clone(),
            });
        }

        let edges = infer_edges(&nodes);
        log::debug!(
            "[GraphBuilder] Built {} modules and {} edges from {} features",
            nodes.len(),
            edges.len(),
            features.len()
        );
        ProjectGraph { nodes, edges }
    }
}

/// Whether `source` sits before `target` in (layer, sequence) order
fn placed_before(source: &ModuleNode, target: &ModuleNode) -> bool {
    (source.layer, source.sequence_in_layer) < (target.layer, target.sequence_in_layer)
}

fn infer_edges(nodes: &[ModuleNode]) -> Vec<ModuleEdge> {
    let mut edges = Vec::new();
    for target in nodes {
        for source in nodes {
            if !placed_before(source, target) {
                continue;
            }
            if let Some(rule) = prerequisite_for(source.category, target.category) {
                edges.push(ModuleEdge::new(
                    &format!("edge-{}-{}", source.id, target.id),
                    &source.id,
                    &target.id,
                    Some(rule.label),
                ));
            }
        }
    }
    edges
}
