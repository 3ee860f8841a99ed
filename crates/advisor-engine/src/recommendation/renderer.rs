use advisor_core::error::{AdvisorError, AdvisorResult};
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
});

/// Names of the simple `{{name}}` placeholders in `text`, in order of appearance
pub fn placeholders(text: &str) -> Vec<String> {
    RE_PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Placeholders in the template `text` that `variables` does not supply.
///
/// Checked on the template itself, never on rendered output, since substituted
/// values may legitimately contain `{{...}}`.
pub fn missing_variables(text: &str, variables: &BTreeMap<String, String>) -> Vec<String> {
    placeholders(text)
        .into_iter()
        .filter(|name| !variables.contains_key(name))
        .collect()
}

/// Fills template strings from an extracted variable map
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Output is plain text, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        // A missing variable is a render error instead of an empty string
        handlebars.set_strict_mode(true);
        Self { handlebars }
    }

    pub fn render(&self, template: &str, variables: &BTreeMap<String, String>) -> AdvisorResult<String> {
        let rendered = self
            .handlebars
            .render_template(template, variables)
            .map_err(|e| AdvisorError::internal("template rendering", e.to_string()))?;
        Ok(rendered.trim().to_string())
    }

    pub fn render_all(
        &self,
        templates: &[String],
        variables: &BTreeMap<String, String>,
    ) -> AdvisorResult<Vec<String>> {
        templates
            .iter()
            .map(|t| self.render(t, variables))
            .collect()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}
