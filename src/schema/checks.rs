// Constraints on stage documents that deserialization alone does not enforce

use super::SchemaViolation;
use crate::models::{BackendSpec, FrontendSpec, RequirementsDoc, UiSpec};
use crate::versioning::SemanticVersion;

pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Collects violations with their JSON paths
#[derive(Debug, Default)]
pub struct Checker {
    violations: Vec<SchemaViolation>,
}

impl Checker {
    pub fn into_violations(self) -> Vec<SchemaViolation> {
        self.violations
    }

    pub fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(SchemaViolation {
            path: path.into(),
            message: message.into(),
        });
    }

    fn text(&mut self, path: &str, value: &str) {
        if value.trim().is_empty() {
            self.fail(path, "must not be empty");
        }
    }

    fn list<T>(&mut self, path: &str, items: &[T]) {
        if items.is_empty() {
            self.fail(path, "must contain at least one item");
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn requirements(doc: &RequirementsDoc, c: &mut Checker) {
    c.text("$.title", &doc.title);
    if !SemanticVersion::is_valid(&doc.version) {
        c.fail(
            "$.version",
            format!("'{}' is not a major.minor version", doc.version),
        );
    }
    c.list("$.features", &doc.features);
    for (i, feature) in doc.features.iter().enumerate() {
        c.text(&format!("$.features[{}].title", i), &feature.title);
    }
}

pub fn backend(spec: &BackendSpec, c: &mut Checker) {
    c.text("$.overview", &spec.overview);
    c.list("$.entities", &spec.entities);
    for (i, entity) in spec.entities.iter().enumerate() {
        let path = format!("$.entities[{}]", i);
        c.text(&format!("{}.name", path), &entity.name);
        c.list(&format!("{}.fields", path), &entity.fields);
        for (j, field) in entity.fields.iter().enumerate() {
            c.text(&format!("{}.fields[{}].name", path, j), &field.name);
            c.text(&format!("{}.fields[{}].type", path, j), &field.field_type);
        }
        for (j, relation) in entity.relations.iter().enumerate() {
            c.text(&format!("{}.relations[{}].target", path, j), &relation.target);
        }
    }
    for (i, endpoint) in spec.endpoints.iter().enumerate() {
        if !HTTP_METHODS.contains(&endpoint.method.as_str()) {
            c.fail(
                format!("$.endpoints[{}].method", i),
                format!(
                    "'{}' is not one of [{}]",
                    endpoint.method,
                    HTTP_METHODS.join(", ")
                ),
            );
        }
        c.text(&format!("$.endpoints[{}].path", i), &endpoint.path);
    }
}

pub fn frontend(spec: &FrontendSpec, c: &mut Checker) {
    c.text("$.framework", &spec.framework);
    c.list("$.pages", &spec.pages);
    for (i, page) in spec.pages.iter().enumerate() {
        c.text(&format!("$.pages[{}].name", i), &page.name);
        c.text(&format!("$.pages[{}].route", i), &page.route);
    }
}

pub fn ui(spec: &UiSpec, c: &mut Checker) {
    for (i, color) in spec.color_palette.iter().enumerate() {
        c.text(&format!("$.colorPalette[{}].name", i), &color.name);
        if !is_hex_color(&color.hex) {
            c.fail(
                format!("$.colorPalette[{}].hex", i),
                format!("'{}' is not a hex color", color.hex),
            );
        }
    }
    c.list("$.screens", &spec.screens);
    for (i, screen) in spec.screens.iter().enumerate() {
        c.text(&format!("$.screens[{}].name", i), &screen.name);
    }
}
