// Entity-relationship diagram rendering (Mermaid erDiagram)

use super::flow::sanitize_id;
use crate::models::{BackendSpec, Cardinality};

pub const HEADER: &str = "erDiagram";

/// Label used when a relation does not name itself
pub const DEFAULT_RELATION_LABEL: &str = "relates to";

fn crow_foot(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::OneToOne => "||--||",
        Cardinality::OneToMany => "||--o{",
        Cardinality::ManyToOne => "}o--||",
        Cardinality::ManyToMany => "}o--o{",
    }
}

fn quote(label: &str) -> String {
    format!("\"{}\"", label.replace('"', "'").replace(['\n', '\r'], " "))
}

/// Render the backend spec's data entities and relations.
///
/// Entities appear in declaration order, each followed by its fields; all
/// relations follow, grouped by owning entity. Relations may name entities
/// the backend spec never declares; Mermaid draws those as empty boxes.
pub fn render_erd(spec: &BackendSpec) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for entity in &spec.entities {
        let name = sanitize_id(&entity.name);
        if entity.fields.is_empty() {
            out.push_str(&format!("    {} {{\n    }}\n", name));
            continue;
        }
        out.push_str(&format!("    {} {{\n", name));
        for field in &entity.fields {
            let mut line = format!(
                "        {} {}",
                sanitize_id(&field.field_type),
                sanitize_id(&field.name)
            );
            if field.primary_key {
                line.push_str(" PK");
            }
            if !field.required {
                line.push_str(" \"optional\"");
            }
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("    }\n");
    }

    for entity in &spec.entities {
        for relation in &entity.relations {
            let label = relation
                .label
                .as_deref()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(DEFAULT_RELATION_LABEL);
            out.push_str(&format!(
                "    {} {} {} : {}\n",
                sanitize_id(&entity.name),
                crow_foot(relation.cardinality),
                sanitize_id(&relation.target),
                quote(label)
            ));
        }
    }

    out
}
