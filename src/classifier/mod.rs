//! Category Classifier
//!
//! Maps a raw feature (title + description) onto a module category and a flow
//! layer using the keyword table in [`rules`]. Purely input-driven: the same
//! text always yields the same classification.
//!
//! Matching is token based. Text is lowercased and split on anything that is
//! not alphanumeric; a keyword matches when its words appear as consecutive
//! tokens, with an optional plural "s" on the last one. The title is consulted
//! first and the description only when the title matches no rule, so a
//! descriptive sentence cannot override what the feature is called.

pub mod rules;

pub use rules::{CategoryRule, Prerequisite, CATEGORY_RULES, PREREQUISITES, RULESET_VERSION};

use crate::models::{Feature, ModuleCategory};
use serde::{Deserialize, Serialize};

/// Result of classifying one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: ModuleCategory,
    pub layer: u8,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            category: rules::DEFAULT_CATEGORY,
            layer: rules::DEFAULT_LAYER,
        }
    }
}

/// Which text produced a classification, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Title,
    Description,
    Default,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryClassifier {
    rules: &'static [CategoryRule],
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryClassifier {
    /// Classifier over the built-in rule table
    pub fn new() -> Self {
        Self {
            rules: CATEGORY_RULES,
        }
    }

    /// Classifier over a custom rule table (priority = slice order)
    pub fn with_rules(rules: &'static [CategoryRule]) -> Self {
        Self { rules }
    }

    pub fn classify(&self, title: &str, description: &str) -> Classification {
        self.explain(title, description).0
    }

    pub fn classify_feature(&self, feature: &Feature) -> Classification {
        self.classify(&feature.title, &feature.description)
    }

    /// Classification together with where the deciding match came from
    pub fn explain(&self, title: &str, description: &str) -> (Classification, MatchSource) {
        if let Some(rule) = self.first_match(title) {
            return (Classification::from(rule), MatchSource::Title);
        }
        if let Some(rule) = self.first_match(description) {
            return (Classification::from(rule), MatchSource::Description);
        }
        (Classification::default(), MatchSource::Default)
    }

    fn first_match(&self, text: &str) -> Option<&'static CategoryRule> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return None;
        }
        self.rules.iter().find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| contains_phrase(&tokens, &tokenize(keyword)))
        })
    }
}

impl From<&CategoryRule> for Classification {
    fn from(rule: &CategoryRule) -> Self {
        Self {
            category: rule.category,
            layer: rule.layer,
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    let Some((last, leading)) = phrase.split_last() else {
        return false;
    };
    tokens.windows(phrase.len()).any(|window| {
        let (window_last, window_leading) = match window.split_last() {
            Some(parts) => parts,
            None => return false,
        };
        window_leading == leading
            && (window_last == last || window_last.strip_suffix('s') == Some(last.as_str()))
    })
}
