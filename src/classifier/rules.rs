// Versioned rule tables consulted by the classifier and the graph builder
//
// Both tables are plain data. Declaration order of CATEGORY_RULES is the
// priority order: the first rule with a matching keyword wins.

use crate::models::ModuleCategory;

/// Bump whenever either table changes, so regenerated graphs can be told apart
pub const RULESET_VERSION: u32 = 2;

/// Layer for features that no rule recognises
pub const DEFAULT_LAYER: u8 = 2;
pub const DEFAULT_CATEGORY: ModuleCategory = ModuleCategory::Core;

/// Keyword group mapping to a (category, layer) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: ModuleCategory,
    pub layer: u8,
    /// Lowercase words or multi-word phrases. A trailing plural "s" on the
    /// final word of the text also matches.
    pub keywords: &'static [&'static str],
}

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ModuleCategory::Authentication,
        layer: 1,
        keywords: &[
            "login", "logout", "log in", "sign up", "signup", "sign in", "signin", "register",
            "registration", "auth", "authentication", "password", "oauth", "sso", "onboarding",
        ],
    },
    CategoryRule {
        category: ModuleCategory::Payment,
        layer: 3,
        keywords: &[
            "payment", "billing", "checkout", "subscription", "invoice", "pricing", "refund",
        ],
    },
    CategoryRule {
        category: ModuleCategory::Admin,
        layer: 4,
        keywords: &[
            "admin", "administration", "moderation", "moderator", "back office",
            "user management",
        ],
    },
    CategoryRule {
        category: ModuleCategory::Support,
        layer: 5,
        keywords: &[
            "setting", "notification", "help", "faq", "support", "preference", "feedback",
            "contact us",
        ],
    },
    CategoryRule {
        category: ModuleCategory::Security,
        layer: 3,
        keywords: &[
            "security", "encryption", "permission", "access control", "audit log",
            "two factor", "2fa", "mfa",
        ],
    },
    CategoryRule {
        category: ModuleCategory::AiMl,
        layer: 3,
        keywords: &[
            "ai", "ml", "machine learning", "recommendation", "prediction", "chatbot", "llm",
        ],
    },
    CategoryRule {
        category: ModuleCategory::Analytics,
        layer: 3,
        keywords: &["analytics", "report", "metric", "insight", "chart", "statistic"],
    },
    CategoryRule {
        category: ModuleCategory::Integration,
        layer: 3,
        keywords: &["integration", "api", "webhook", "sync", "import", "export", "third party"],
    },
    CategoryRule {
        category: ModuleCategory::Database,
        layer: 2,
        keywords: &["database", "storage", "schema", "migration", "backup"],
    },
    CategoryRule {
        category: ModuleCategory::Data,
        layer: 2,
        keywords: &["data", "dataset", "upload", "file", "attachment"],
    },
    CategoryRule {
        category: ModuleCategory::Backend,
        layer: 2,
        keywords: &["backend", "server", "queue", "background job", "cron"],
    },
    CategoryRule {
        category: ModuleCategory::UiUx,
        layer: 2,
        keywords: &["theme", "dark mode", "accessibility", "design system"],
    },
    CategoryRule {
        category: ModuleCategory::Frontend,
        layer: 2,
        keywords: &["landing page", "homepage", "responsive", "mobile app"],
    },
];

/// A category that conventionally has to exist before others can work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prerequisite {
    pub category: ModuleCategory,
    pub unblocks: &'static [ModuleCategory],
    /// Label put on every edge this entry produces
    pub label: &'static str,
}

pub const PREREQUISITES: &[Prerequisite] = &[
    Prerequisite {
        category: ModuleCategory::Authentication,
        unblocks: &[
            ModuleCategory::Core,
            ModuleCategory::Database,
            ModuleCategory::Backend,
            ModuleCategory::Frontend,
            ModuleCategory::UiUx,
            ModuleCategory::Data,
            ModuleCategory::Payment,
            ModuleCategory::Admin,
            ModuleCategory::AiMl,
            ModuleCategory::Analytics,
            ModuleCategory::Support,
        ],
        label: "requires user",
    },
    Prerequisite {
        category: ModuleCategory::Security,
        unblocks: &[ModuleCategory::Payment, ModuleCategory::Admin],
        label: "secured by",
    },
    Prerequisite {
        category: ModuleCategory::Database,
        unblocks: &[
            ModuleCategory::Backend,
            ModuleCategory::Data,
            ModuleCategory::Analytics,
            ModuleCategory::AiMl,
        ],
        label: "stores data",
    },
    Prerequisite {
        category: ModuleCategory::Backend,
        unblocks: &[
            ModuleCategory::Frontend,
            ModuleCategory::Integration,
            ModuleCategory::Payment,
        ],
        label: "served by",
    },
    Prerequisite {
        category: ModuleCategory::Data,
        unblocks: &[ModuleCategory::Analytics, ModuleCategory::AiMl],
        label: "feeds",
    },
    Prerequisite {
        category: ModuleCategory::Analytics,
        unblocks: &[ModuleCategory::Admin],
        label: "reports to",
    },
];

/// The prerequisite entry for `source` if it unblocks `target`
pub fn prerequisite_for(
    source: ModuleCategory,
    target: ModuleCategory,
) -> Option<&'static Prerequisite> {
    PREREQUISITES
        .iter()
        .find(|p| p.category == source && p.unblocks.contains(&target))
}
