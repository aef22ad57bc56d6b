// Integration tests for the module graph, its analysis and flow rendering

#[cfg(test)]
mod graph_integration_tests {
    use specforge_lib::diagrams::{render_flow, sanitize_collisions};
    use specforge_lib::graph::{build_order_labels, DependencyGraph, ModuleGraphBuilder};
    use specforge_lib::models::{
        Feature, ModuleEdge, ModuleNode, ModuleStatus, Position, ProjectGraph,
    };
    use specforge_lib::PipelineError;
    use std::collections::HashSet;

    fn features() -> Vec<Feature> {
        vec![
            Feature::new("Board View", "Drag tasks between columns"),
            Feature::new("Sign Up", "Create an account with email"),
            Feature::new("Billing", "Monthly plans per workspace"),
            Feature::new("Task Comments", "Discuss a task with teammates"),
            Feature::new("Admin Dashboard", "Moderate boards and members"),
            Feature::new("Usage Analytics", "Charts of completed work"),
            Feature::new("Notification Settings", "Choose which emails to receive"),
            Feature::new("Audit Log", "Who changed what and when"),
        ]
    }

    fn node(id: &str, label: &str) -> ModuleNode {
        ModuleNode {
            id: id.to_string(),
            label: label.to_string(),
            status: ModuleStatus::In,
            category: specforge_lib::models::ModuleCategory::Core,
            layer: 2,
            sequence_in_layer: 1,
            position: Position::default(),
            description: String::new(),
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = ModuleGraphBuilder::default();
        let first = builder.build_graph(&features()).to_json().unwrap();
        let second = builder.build_graph(&features()).to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_edges_reference_existing_nodes() {
        let graph = ModuleGraphBuilder::default().build_graph(&features());
        let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), graph.nodes.len());
        assert!(!graph.edges.is_empty());
        for edge in &graph.edges {
            assert!(ids.contains(edge.source.as_str()), "dangling source {}", edge.id);
            assert!(ids.contains(edge.target.as_str()), "dangling target {}", edge.id);
            assert_ne!(edge.source, edge.target);
        }
        graph.check_integrity().unwrap();
    }

    #[test]
    fn test_edges_never_point_to_an_earlier_layer() {
        let graph = ModuleGraphBuilder::default().build_graph(&features());
        for edge in &graph.edges {
            let source = graph.node(&edge.source).unwrap();
            let target = graph.node(&edge.target).unwrap();
            assert!(
                source.layer <= target.layer,
                "{} (layer {}) -> {} (layer {})",
                source.label,
                source.layer,
                target.label,
                target.layer
            );
        }
    }

    #[test]
    fn test_sequences_are_dense_per_layer() {
        let graph = ModuleGraphBuilder::default().build_graph(&features());
        for layer in 1..=5u8 {
            let sequences: Vec<u32> = graph
                .nodes
                .iter()
                .filter(|n| n.layer == layer)
                .map(|n| n.sequence_in_layer)
                .collect();
            let expected: Vec<u32> = (1..=sequences.len() as u32).collect();
            assert_eq!(sequences, expected, "layer {}", layer);
        }
    }

    #[test]
    fn test_generated_graph_has_a_build_order() {
        let graph = ModuleGraphBuilder::default().build_graph(&features());
        let order = build_order_labels(&graph).unwrap();
        assert_eq!(order.len(), graph.nodes.len());

        let position = |label: &str| order.iter().position(|l| l == label).unwrap();
        assert!(position("Sign Up") < position("Board View"));

        let stats = DependencyGraph::in_scope(&graph).stats();
        assert_eq!(stats.total_nodes, graph.nodes.len());
        assert!(stats.max_depth >= 1);
    }

    #[test]
    fn test_out_of_scope_modules_leave_the_build_order() {
        let mut graph = ModuleGraphBuilder::default().build_graph(&features());
        let billing = graph.nodes.iter().find(|n| n.label == "Billing").unwrap().id.clone();
        graph.set_status(&billing, ModuleStatus::Out).unwrap();

        let order = build_order_labels(&graph).unwrap();
        assert_eq!(order.len(), graph.nodes.len() - 1);
        assert!(!order.iter().any(|l| l == "Billing"));
    }

    #[test]
    fn test_hand_made_cycle_has_no_build_order() {
        let mut graph = ProjectGraph::new();
        graph.add_node(node("a", "A")).unwrap();
        graph.add_node(node("b", "B")).unwrap();
        graph.add_edge(ModuleEdge::new("e1", "a", "b", None)).unwrap();
        graph.add_edge(ModuleEdge::new("e2", "b", "a", None)).unwrap();

        graph.check_integrity().unwrap();
        let err = build_order_labels(&graph).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_sanitize_collision_is_reported() {
        let mut graph = ProjectGraph::new();
        graph.add_node(node("a.b", "Dotted")).unwrap();
        graph.add_node(node("a_b", "Underscored")).unwrap();

        let collisions = sanitize_collisions(&graph);
        assert_eq!(
            collisions,
            vec![(
                "a_b".to_string(),
                vec!["a.b".to_string(), "a_b".to_string()]
            )]
        );

        let flow = render_flow(&graph);
        assert_eq!(flow.matches("    a_b[").count(), 2);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let graph = ModuleGraphBuilder::default().build_graph(&features());
        let first = render_flow(&graph);
        assert_eq!(first, render_flow(&graph));

        let reloaded = ProjectGraph::from_json(&graph.to_json().unwrap()).unwrap();
        assert_eq!(first, render_flow(&reloaded));
    }

    #[test]
    fn test_removing_a_node_drops_its_edges() {
        let mut graph = ModuleGraphBuilder::default().build_graph(&features());
        let sign_up = graph.nodes.iter().find(|n| n.label == "Sign Up").unwrap().id.clone();
        assert!(graph.edges.iter().any(|e| e.source == sign_up));

        graph.remove_node(&sign_up).unwrap();
        assert!(graph.edges.iter().all(|e| e.source != sign_up && e.target != sign_up));
        graph.check_integrity().unwrap();
    }
}
