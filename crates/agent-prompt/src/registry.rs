//! Prompt template registry

use crate::{PromptError, PromptTemplate, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A thread-safe registry of named prompt templates
///
/// ```
/// use agent_prompt::{PromptRegistry, PromptTemplate};
/// use serde_json::json;
///
/// let registry = PromptRegistry::new();
/// registry.register(PromptTemplate::new("task", "Analyze {{ ticker }}").unwrap());
///
/// let prompt = registry.render("task", &json!({ "ticker": "AAPL" })).unwrap();
/// assert_eq!(prompt, "Analyze AAPL");
/// ```
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<PromptTemplate>>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any template with the same name
    pub fn register(&self, template: PromptTemplate) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template.name().to_string(), Arc::new(template));
    }

    /// Register several templates
    pub fn register_all(&self, templates: impl IntoIterator<Item = PromptTemplate>) {
        for template in templates {
            self.register(template);
        }
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<PromptTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Render a registered template
    pub fn render<S: Serialize>(&self, name: &str, vars: &S) -> Result<String> {
        self.get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?
            .render(vars)
    }

    /// Sorted names of all registered templates
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_render() {
        let registry = PromptRegistry::new();
        registry.register(PromptTemplate::new("greeting", "Hello, {{ name }}!").unwrap());

        assert!(registry.contains("greeting"));
        let result = registry.render("greeting", &json!({ "name": "analyst" })).unwrap();
        assert_eq!(result, "Hello, analyst!");
    }

    #[test]
    fn test_render_not_registered() {
        let registry = PromptRegistry::new();
        let result = registry.render("nonexistent", &json!({}));
        assert!(matches!(result, Err(PromptError::TemplateNotRegistered(_))));
    }

    #[test]
    fn test_replace_template() {
        let registry = PromptRegistry::new();
        registry.register(PromptTemplate::new("t", "Version 1").unwrap());
        registry.register(PromptTemplate::new("t", "Version 2").unwrap());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.render("t", &json!({})).unwrap(), "Version 2");
    }

    #[test]
    fn test_names_sorted() {
        let registry = PromptRegistry::new();
        registry.register_all([
            PromptTemplate::new("b", "B").unwrap(),
            PromptTemplate::new("a", "A").unwrap(),
        ]);
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_debug() {
        let registry = PromptRegistry::new();
        registry.register(PromptTemplate::new("persona", "Hello").unwrap());
        let debug = format!("{registry:?}");
        assert!(debug.contains("PromptRegistry"));
        assert!(debug.contains("persona"));
    }
}
