// Built-in export pack templates

use crate::models::ExportTarget;

/// Template name registered for a target
pub fn template_name(target: ExportTarget) -> &'static str {
    match target {
        ExportTarget::Cursor => "cursor",
        ExportTarget::Claude => "claude",
        ExportTarget::Copilot => "copilot",
        ExportTarget::Windsurf => "windsurf",
    }
}

/// Built-in template source for a target
pub fn template_source(target: ExportTarget) -> &'static str {
    match target {
        ExportTarget::Cursor => CURSOR_TEMPLATE,
        ExportTarget::Claude => CLAUDE_TEMPLATE,
        ExportTarget::Copilot => COPILOT_TEMPLATE,
        ExportTarget::Windsurf => WINDSURF_TEMPLATE,
    }
}

/// Shown instead of the flow diagram when none was supplied
pub const FLOW_PLACEHOLDER: &str =
    "_Module flow diagram not available. Regenerate the project graph to include it._";
/// Shown instead of the ER diagram when none was supplied
pub const ERD_PLACEHOLDER: &str =
    "_Entity-relationship diagram not available. Regenerate the backend spec to include it._";

const CURSOR_TEMPLATE: &str = r#"# {{ project_title }} - Project Rules

You are helping build {{ project_title }} (requirements v{{ version }}).
Treat the documents below as the source of truth and keep generated code consistent with them.
{% for section in sections %}
## {{ section.heading }}

{{ section.body }}
{% endfor %}{% if build_order | length > 0 %}
## Build order

Implement modules in this order:
{% for module in build_order %}{{ loop.index }}. {{ module }}
{% endfor %}{% endif %}
<!-- specforge schema v{{ schema_version }}, classifier rules v{{ ruleset_version }} -->"#;

const CLAUDE_TEMPLATE: &str = r#"# CLAUDE.md

This file gives guidance when working on **{{ project_title }}** (requirements v{{ version }}).

## Working agreements

- Read the relevant section below before changing code in that area.
- Keep data entities and API endpoints in sync with the backend specification.
- Match screens and components to the UI and frontend specifications.
{% for section in sections %}
## {{ section.heading }}

{{ section.body }}
{% endfor %}{% if build_order | length > 0 %}
## Build order

{% for module in build_order %}{{ loop.index }}. {{ module }}
{% endfor %}{% endif %}
<!-- specforge schema v{{ schema_version }}, classifier rules v{{ ruleset_version }} -->"#;

const COPILOT_TEMPLATE: &str = r#"# Copilot instructions for {{ project_title }}

Requirements version {{ version }}. Use these documents as context for every suggestion.
{% for section in sections %}
## {{ section.heading }}

{{ section.body }}
{% endfor %}{% if build_order | length > 0 %}
## Build order

{% for module in build_order %}{{ loop.index }}. {{ module }}
{% endfor %}{% endif %}
<!-- specforge schema v{{ schema_version }}, classifier rules v{{ ruleset_version }} -->"#;

const WINDSURF_TEMPLATE: &str = r#"# {{ project_title }} - Windsurf Rules

Project context (requirements v{{ version }}). Follow the architecture and data model below.
{% for section in sections %}
## {{ section.heading }}

{{ section.body }}
{% endfor %}{% if build_order | length > 0 %}
## Build order

{% for module in build_order %}{{ loop.index }}. {{ module }}
{% endfor %}{% endif %}
<!-- specforge schema v{{ schema_version }}, classifier rules v{{ ruleset_version }} -->"#;
