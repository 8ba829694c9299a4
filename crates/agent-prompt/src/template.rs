//! MiniJinja-backed prompt templates

use crate::{PromptError, Result};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// A named prompt template using Jinja2 syntax
///
/// Syntax is checked when the template is created. Rendering is strict: a
/// variable the template uses but the caller did not provide is an error
/// rather than an empty string, so a prompt never silently loses the ticker.
///
/// ```
/// use agent_prompt::PromptTemplate;
/// use serde_json::json;
///
/// let template = PromptTemplate::new("goal", "Analyze {{ ticker | upper }} prices").unwrap();
/// let rendered = template.render(&json!({ "ticker": "aapl" })).unwrap();
/// assert_eq!(rendered, "Analyze AAPL prices");
/// ```
#[derive(Clone)]
pub struct PromptTemplate {
    name: String,
    source: String,
}

impl PromptTemplate {
    /// Create a template, checking its syntax
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        Environment::new()
            .template_from_str(&source)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self { name, source })
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the given variables
    pub fn render<S: Serialize>(&self, vars: &S) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        env.render_str(&self.source, minijinja::Value::from_serialize(vars))
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_simple() {
        let template = PromptTemplate::new("role", "{{ ticker }} Senior Stock Price Analyst").unwrap();
        let result = template.render(&json!({ "ticker": "TSLA" })).unwrap();
        assert_eq!(result, "TSLA Senior Stock Price Analyst");
    }

    #[test]
    fn test_invalid_syntax() {
        let result = PromptTemplate::new("broken", "{{ unclosed");
        assert!(matches!(
            result,
            Err(PromptError::TemplateParseFailed { .. })
        ));
    }

    #[test]
    fn test_missing_variable_is_error() {
        let template = PromptTemplate::new("goal", "Analyze {{ ticker }}").unwrap();
        let result = template.render(&json!({}));
        assert!(matches!(result, Err(PromptError::RenderError { .. })));
    }

    #[test]
    fn test_loop_and_conditional() {
        let template = PromptTemplate::new(
            "assets",
            "{% for asset in assets %}- {{ asset }}\n{% endfor %}{% if date %}as of {{ date }}{% endif %}",
        )
        .unwrap();

        let result = template
            .render(&json!({ "assets": ["AAPL", "BTC"], "date": "2024-10-09" }))
            .unwrap();
        assert!(result.contains("- AAPL\n- BTC\n"));
        assert!(result.ends_with("as of 2024-10-09"));
    }

    #[test]
    fn test_render_struct() {
        #[derive(Serialize)]
        struct Vars<'a> {
            ticker: &'a str,
        }

        let template = PromptTemplate::new("t", "{{ ticker }}").unwrap();
        assert_eq!(template.render(&Vars { ticker: "NVDA" }).unwrap(), "NVDA");
    }
}
