//! Matching concrete URIs against URI templates.
//!
//! Only the simplest RFC 6570 form is supported: literal text plus `{name}` placeholders, each
//! matching one or more characters of a single path segment (no `/`). Reserved expansion,
//! multi-segment and query forms (`{+path}`, `{/seg*}`, `{?q}`) are not understood; templates
//! using them just never match.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// The escaped literal text between two placeholders. A brace here belongs to no placeholder.
fn literal(template: &str, start: usize, end: usize) -> Result<String, TemplateError> {
    let text = &template[start..end];
    match text.find(['{', '}']) {
        Some(offset) => Err(TemplateError::UnbalancedBrace(start + offset)),
        None => Ok(regex::escape(text)),
    }
}

/// Variables extracted from a URI, by placeholder name.
pub type UriVariables = HashMap<String, String>;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unbalanced brace at offset {0}")]
    UnbalancedBrace(usize),
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A compiled URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    pattern: Regex,
    variables: Vec<String>,
}

impl UriTemplate {
    /// Compile a template. Everything outside placeholders is matched literally, including
    /// characters that are special in regular expressions.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut pattern = String::with_capacity(template.len() + 16);
        let mut variables = Vec::new();
        let mut literal_start = 0;

        pattern.push('^');
        for captures in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            pattern.push_str(&literal(template, literal_start, whole.start())?);
            pattern.push_str("([^/]+)");
            variables.push(name.as_str().trim().to_string());
            literal_start = whole.end();
        }
        pattern.push_str(&literal(template, literal_start, template.len())?);
        pattern.push('$');

        Ok(Self {
            template: template.to_string(),
            pattern: Regex::new(&pattern)?,
            variables,
        })
    }

    /// Match `uri` against the whole template. Returns the variable bindings on success.
    pub fn matches(&self, uri: &str) -> Option<UriVariables> {
        let captures = self.pattern.captures(uri)?;
        let bindings = self
            .variables
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures
                    .get(i + 1)
                    .map(|value| (name.clone(), value.as_str().to_string()))
            })
            .collect();
        Some(bindings)
    }

    /// Placeholder names, in template order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}
