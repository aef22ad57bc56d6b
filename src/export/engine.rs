// Template rendering engine using Tera

use anyhow::{anyhow, Result};
use std::sync::Mutex;
use tera::{Context, Tera};

/// Template engine holding the registered export templates
pub struct TemplateEngine {
    /// Tera instance with cached templates
    tera: Mutex<Tera>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            tera: Mutex::new(Tera::default()),
        }
    }

    /// Add (or replace) a template from string
    pub fn add_template(&self, name: &str, template: &str) -> Result<()> {
        let mut tera = self.tera.lock().map_err(|e| anyhow!("Lock error: {}", e))?;
        tera.add_raw_template(name, template)
            .map_err(|e| anyhow!("Failed to add template '{}': {}", name, e))?;
        Ok(())
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        let tera = self.tera.lock().map_err(|e| anyhow!("Lock error: {}", e))?;
        tera.render(template_name, context)
            .map_err(|e| anyhow!("Failed to render template '{}': {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_render() {
        let engine = TemplateEngine::new();
        engine.add_template("hello", "Hello {{ name }}!").unwrap();

        let mut ctx = Context::new();
        ctx.insert("name", "TaskFlow");
        assert_eq!(engine.render("hello", &ctx).unwrap(), "Hello TaskFlow!");
    }

    #[test]
    fn test_invalid_template_rejected() {
        let engine = TemplateEngine::new();
        let err = engine.add_template("broken", "{% for x in %}").unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(engine.render("broken", &Context::new()).is_err());
    }

    #[test]
    fn test_markup_is_not_escaped() {
        let engine = TemplateEngine::new();
        engine.add_template("pack", "{{ body }}").unwrap();
        let mut ctx = Context::new();
        ctx.insert("body", "a --> b & <c>");
        assert_eq!(engine.render("pack", &ctx).unwrap(), "a --> b & <c>");
    }
}
