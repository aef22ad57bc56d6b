// Prompt construction for each generation stage

use crate::models::{DocumentKind, Idea, ProjectGraph, RequirementsDoc};
use crate::versioning::SemanticVersion;

/// System prompt shared by every stage, specialised by document kind
pub fn system_prompt(stage: DocumentKind) -> String {
    let role = match stage {
        DocumentKind::RequirementsDoc => {
            "You are a senior product manager writing a product requirements document."
        }
        DocumentKind::BackendSpec => {
            "You are a backend architect designing data entities and an HTTP API."
        }
        DocumentKind::FrontendSpec => {
            "You are a frontend architect planning pages, routes and components."
        }
        DocumentKind::UiSpec => {
            "You are a product designer defining a visual language and screens."
        }
    };
    format!(
        "{}\n\nRespond with a single JSON object that matches the provided JSON Schema. \
         Do not add commentary outside the JSON.",
        role
    )
}

/// Markdown description of the idea
pub fn describe_idea(idea: &Idea) -> String {
    let mut out = format!("# {}\n\n", idea.title);
    if !idea.pitch.is_empty() {
        out.push_str(&format!("{}\n\n", idea.pitch));
    }
    out.push_str(&format!("**Problem:** {}\n\n", idea.problem));
    out.push_str(&format!("**Solution:** {}\n\n", idea.solution));

    let platforms: Vec<&str> = idea
        .effective_platforms()
        .iter()
        .map(|p| p.display_name())
        .collect();
    out.push_str(&format!("**Platforms:** {}\n\n", platforms.join(", ")));

    push_list(&mut out, "Target users", &idea.target_users);
    push_list(&mut out, "Core features", &idea.core_features);
    push_list(&mut out, "Personas", &idea.personas);
    push_list(&mut out, "Competitors", &idea.competitors);
    push_list(&mut out, "Constraints", &idea.constraints);
    push_list(&mut out, "Success metrics", &idea.success_metrics);
    out
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("## {}\n\n", heading));
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
    out.push('\n');
}

/// Stage-1 user prompt
pub fn requirements_prompt(
    idea: &Idea,
    version: SemanticVersion,
    previous: Option<&RequirementsDoc>,
) -> String {
    let mut prompt = String::from("Write the requirements document for this product idea.\n\n");
    prompt.push_str(&describe_idea(idea));
    prompt.push_str(
        "List one feature per core feature of the idea, in the same order, and add any \
         supporting features the product cannot ship without. Each feature needs a short \
         title and a one-paragraph description.\n",
    );
    prompt.push_str(&format!(
        "Set \"version\" to \"{}\" and \"lastUpdated\" to the current UTC time.\n",
        version
    ));
    if let Some(previous) = previous {
        prompt.push_str(
            "\nThis is a regeneration. Keep features that are still relevant and their \
             titles stable. The previous document follows.\n\n",
        );
        prompt.push_str(&previous.to_markdown());
    }
    prompt
}

/// Summary of the in-scope modules of a graph, one line per module
pub fn summarize_graph(graph: &ProjectGraph) -> String {
    let lines: Vec<String> = graph
        .in_scope()
        .map(|node| {
            format!(
                "- {} ({}, layer {})",
                node.label,
                node.category.display_name(),
                node.layer
            )
        })
        .collect();
    if lines.is_empty() {
        "No modules have been planned yet.".to_string()
    } else {
        lines.join("\n")
    }
}

/// Stage-2 user prompt
pub fn spec_prompt(
    stage: DocumentKind,
    idea: &Idea,
    requirements: &RequirementsDoc,
    graph_summary: &str,
    previous: Option<&str>,
) -> String {
    let task = match stage {
        DocumentKind::BackendSpec => {
            "Write the backend specification: data entities with typed fields and \
             relations, and the HTTP endpoints that serve the features."
        }
        DocumentKind::FrontendSpec => {
            "Write the frontend specification: framework, state management, one page per \
             user-facing feature and the components shared between pages."
        }
        DocumentKind::UiSpec => {
            "Write the UI specification: design principles, a color palette with hex \
             values, typography and one screen per page."
        }
        DocumentKind::RequirementsDoc => "Write the requirements document.",
    };

    let mut prompt = format!("{}\n\n", task);
    prompt.push_str(&describe_idea(idea));
    prompt.push_str(&requirements.to_markdown());
    prompt.push_str("## Planned modules\n\n");
    prompt.push_str(graph_summary);
    prompt.push('\n');
    if let Some(previous) = previous {
        prompt.push_str("\nThis is a regeneration. The previous document was:\n\n```json\n");
        prompt.push_str(previous);
        prompt.push_str("\n```\n");
    }
    prompt
}
