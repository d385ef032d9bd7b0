//! Grammar-extension registry
//!
//! The CST builder accepts a registry of named rules with optional
//! dependencies and priorities. Registration validates that a rule does
//! not collide with the core grammar; the registry is consulted only when
//! a parser is constructed, so runtime re-registration requires building a
//! new [`super::LffParser`].

use serde::{Deserialize, Serialize};

/// Rule names owned by the core grammar; extensions may not shadow them.
pub const CORE_RULES: &[&str] = &[
    "document",
    "directive",
    "node",
    "edge",
    "node_ident",
    "node_ref",
    "type_list",
    "arrow",
    "node_block",
    "property",
    "value",
    "array_literal",
];

/// A named extension rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRule {
    pub name: String,
    /// Higher priority rules are consulted first.
    pub priority: i32,
    /// Names of rules that must be registered before this one is usable.
    pub dependencies: Vec<String>,
}

impl GrammarRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            dependencies: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }
}

/// Errors raised by rule registration and resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// The rule name shadows a core grammar rule.
    CoreRuleCollision(String),
    /// A rule with this name is already registered.
    DuplicateRule(String),
    /// A declared dependency is neither a core rule nor registered.
    UnknownDependency { rule: String, dependency: String },
}

impl std::fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionError::CoreRuleCollision(name) => {
                write!(f, "rule '{}' collides with a core grammar rule", name)
            }
            ExtensionError::DuplicateRule(name) => {
                write!(f, "rule '{}' is already registered", name)
            }
            ExtensionError::UnknownDependency { rule, dependency } => {
                write!(f, "rule '{}' depends on unknown rule '{}'", rule, dependency)
            }
        }
    }
}

impl std::error::Error for ExtensionError {}

/// Registry of extension rules owned by a parser instance.
#[derive(Debug, Clone, Default)]
pub struct GrammarExtensionRegistry {
    rules: Vec<GrammarRule>,
}

impl GrammarExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: GrammarRule) -> Result<(), ExtensionError> {
        if CORE_RULES.contains(&rule.name.as_str()) {
            return Err(ExtensionError::CoreRuleCollision(rule.name));
        }
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(ExtensionError::DuplicateRule(rule.name));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GrammarRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Resolve the registered rules in consultation order: priority
    /// descending, name ascending for stability. Fails if any dependency
    /// is missing. Called once at parser construction.
    pub fn rules_in_order(&self) -> Result<Vec<&GrammarRule>, ExtensionError> {
        for rule in &self.rules {
            for dep in &rule.dependencies {
                let known = CORE_RULES.contains(&dep.as_str())
                    || self.rules.iter().any(|r| &r.name == dep);
                if !known {
                    return Err(ExtensionError::UnknownDependency {
                        rule: rule.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        let mut ordered: Vec<&GrammarRule> = self.rules.iter().collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));
        Ok(ordered)
    }
}
