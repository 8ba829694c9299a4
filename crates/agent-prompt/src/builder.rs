//! Fluent prompt builder
//!
//! [`PromptBuilder`] assembles prompts from sections and bullet lists when
//! the shape depends on data, such as the task prompt that lists the outputs
//! of earlier tasks.

/// A fluent builder for constructing prompts
///
/// ```
/// use agent_prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .text("You are a stock analyst.")
///     .section("Assets")
///     .bullet("AAPL")
///     .bullet("BTC")
///     .when(true, "Search each asset individually.")
///     .build();
///
/// assert!(prompt.contains("## Assets"));
/// assert!(prompt.contains("- BTC"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add static text
    ///
    /// ```
    /// use agent_prompt::PromptBuilder;
    ///
    /// let prompt = PromptBuilder::new().text("AAPL, ").text("price UP").build();
    /// assert_eq!(prompt, "AAPL, price UP");
    /// ```
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.parts.push(content.into());
        self
    }

    /// Add a newline
    pub fn newline(self) -> Self {
        self.text("\n")
    }

    /// Add a blank line (two newlines)
    pub fn blank_line(self) -> Self {
        self.text("\n\n")
    }

    /// Add a section header (markdown h2)
    pub fn section(self, title: impl Into<String>) -> Self {
        self.text(format!("\n## {}\n", title.into()))
    }

    /// Add content conditionally
    pub fn when(self, condition: bool, content: impl Into<String>) -> Self {
        if condition { self.text(content) } else { self }
    }

    /// Add a bullet point
    pub fn bullet(self, content: impl Into<String>) -> Self {
        self.text(format!("- {}\n", content.into()))
    }

    /// Add multiple bullet points
    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self = self.bullet(item);
        }
        self
    }

    /// Add a `Key: value` line
    pub fn field(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.text(format!("{}: {}\n", key.into(), value.into()))
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        self.parts.concat()
    }

    /// Build with surrounding whitespace trimmed
    pub fn build_trimmed(self) -> String {
        self.build().trim().to_string()
    }

    /// Check if the builder is empty
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl From<PromptBuilder> for String {
    fn from(builder: PromptBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newlines() {
        let prompt = PromptBuilder::new()
            .text("Line 1")
            .newline()
            .text("Line 2")
            .blank_line()
            .text("Line 3")
            .build();
        assert_eq!(prompt, "Line 1\nLine 2\n\nLine 3");
    }

    #[test]
    fn test_conditional() {
        let prompt = PromptBuilder::new()
            .text("Base")
            .when(true, " - Included")
            .when(false, " - Excluded")
            .build();
        assert_eq!(prompt, "Base - Included");
    }

    #[test]
    fn test_bullets_and_fields() {
        let prompt = PromptBuilder::new()
            .section("Context")
            .bullets(["AAPL, price UP", "BTC score 62"])
            .field("Date", "2024-10-09")
            .build_trimmed();

        assert!(prompt.starts_with("## Context"));
        assert!(prompt.contains("- AAPL, price UP\n"));
        assert!(prompt.ends_with("Date: 2024-10-09"));
    }

    #[test]
    fn test_into_string() {
        let builder = PromptBuilder::new();
        assert!(builder.is_empty());
        let s: String = builder.text("x").into();
        assert_eq!(s, "x");
    }
}
