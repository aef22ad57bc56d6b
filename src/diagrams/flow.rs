// Flow diagram rendering (Mermaid flowchart)

use crate::models::{ModuleStatus, ProjectGraph};
use std::collections::BTreeMap;

pub const HEADER: &str = "flowchart TD";

const CLASS_DEFS: [(&str, &str); 3] = [
    ("statusIn", "fill:#d1fae5,stroke:#059669,color:#064e3b"),
    ("statusOut", "fill:#f3f4f6,stroke:#9ca3af,color:#6b7280,stroke-dasharray: 5 5"),
    ("statusMaybe", "fill:#fef3c7,stroke:#d97706,color:#78350f"),
];

fn status_class(status: ModuleStatus) -> &'static str {
    match status {
        ModuleStatus::In => "statusIn",
        ModuleStatus::Out => "statusOut",
        ModuleStatus::Maybe => "statusMaybe",
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// Not injective: `a.b` and `a_b` both become `a_b`, and the two nodes are
/// then drawn as one box. [`sanitize_collisions`] reports such groups.
pub fn sanitize_id(id: &str) -> String {
    if id.is_empty() {
        return "_".to_string();
    }
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Groups of distinct node ids that render to the same identifier
pub fn sanitize_collisions(graph: &ProjectGraph) -> Vec<(String, Vec<String>)> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in &graph.nodes {
        groups
            .entry(sanitize_id(&node.id))
            .or_default()
            .push(node.id.clone());
    }
    groups.into_iter().filter(|(_, ids)| ids.len() > 1).collect()
}

fn escape_label(label: &str) -> String {
    label
        .replace('"', "#quot;")
        .replace(['\n', '\r'], " ")
}

fn escape_edge_label(label: &str) -> String {
    escape_label(label).replace('|', "#124;")
}

/// Render a graph as a Mermaid flowchart.
///
/// Layout: header, the three status classes, then per node a declaration and
/// a class directive (graph order), then one arrow per edge (graph order).
pub fn render_flow(graph: &ProjectGraph) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for (name, style) in CLASS_DEFS {
        out.push_str(&format!("    classDef {} {}\n", name, style));
    }

    for node in &graph.nodes {
        let id = sanitize_id(&node.id);
        out.push_str(&format!("    {}[\"{}\"]\n", id, escape_label(&node.label)));
        out.push_str(&format!("    class {} {}\n", id, status_class(node.status)));
    }

    for edge in &graph.edges {
        let source = sanitize_id(&edge.source);
        let target = sanitize_id(&edge.target);
        match edge.label.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(label) => out.push_str(&format!(
                "    {} -->|{}| {}\n",
                source,
                escape_edge_label(label),
                target
            )),
            None => out.push_str(&format!("    {} --> {}\n", source, target)),
        }
    }

    out
}
