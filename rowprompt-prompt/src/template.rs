use std::collections::HashMap;

use regex::Regex;
use rowprompt_core::Value;

use crate::PromptError;

// Escaped braces, a named placeholder, or a stray brace (rejected).
const TOKEN_PATTERN: &str = r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}|\{|\}";

/// Rendered form of `null` when nothing else is configured.
pub const DEFAULT_NULL_REPR: &str = "null";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

/// A text template with `{name}` placeholders.
///
/// `{{` and `}}` produce literal braces. Any other brace is rejected when
/// the template is parsed, so a successfully built template always renders
/// or fails only for a missing variable.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        let segments = parse(&template)?;
        Ok(Self { template, segments })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Unique placeholder names, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Placeholder(p) if p == name))
    }

    pub fn render(&self, vars: &HashMap<String, Value>) -> Result<String, PromptError> {
        self.render_with(|name| vars.get(name).map(|value| display_value(value, DEFAULT_NULL_REPR)))
    }

    /// Render, asking `lookup` for the text of each placeholder.
    pub fn render_with<F>(&self, mut lookup: F) -> Result<String, PromptError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        lookup(name).ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

/// Text substituted for `value`: strings verbatim, `null` as `null_repr`,
/// anything else in its JSON form.
pub fn display_value(value: &Value, null_repr: &str) -> String {
    match value {
        Value::Null => null_repr.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, PromptError> {
    let pattern =
        Regex::new(TOKEN_PATTERN).map_err(|e| PromptError::InvalidTemplate(e.to_string()))?;

    let mut segments = Vec::new();
    let mut text = String::new();
    let mut last = 0;

    for caps in pattern.captures_iter(template) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        text.push_str(&template[last..token.start()]);
        last = token.end();

        match (token.as_str(), caps.get(1)) {
            ("{{", _) => text.push('{'),
            ("}}", _) => text.push('}'),
            (_, Some(name)) => {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Placeholder(name.as_str().to_string()));
            }
            (stray, None) => {
                return Err(PromptError::InvalidTemplate(format!(
                    "unmatched '{stray}' at byte {}",
                    token.start()
                )));
            }
        }
    }

    text.push_str(&template[last..]);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
