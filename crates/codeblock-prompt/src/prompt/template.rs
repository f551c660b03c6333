//! Prompt templates.
//!
//! A template is literal text with `{field}` placeholders. `{field|prefix|suffix}` renders
//! `prefix`, the field value and `suffix` only when the field is non-empty, which keeps optional
//! parts such as a git branch from leaving stray punctuation behind.

use crate::prompt::environment::PromptEnvironment;
use codeblock_core::StyledSegment;
use std::collections::BTreeMap;

/// Fields a template may reference.
pub const TEMPLATE_FIELDS: &[&str] = &[
    "user", "host", "path", "db", "branch", "symbol", "zsh_symbol",
];

/// One parsed template piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text.
    Literal(String),
    /// A field placeholder.
    Field {
        /// Field name.
        name: String,
        /// Text rendered before a non-empty value.
        prefix: String,
        /// Text rendered after a non-empty value.
        suffix: String,
    },
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    parts: Vec<TemplatePart>,
}

impl PromptTemplate {
    /// Parse `template`, rejecting unclosed placeholders and unknown fields.
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                format!("unclosed '{{' at byte {}", template.len() - rest.len() + open)
            })?;
            let body = &after[..close];

            let mut pieces = body.splitn(3, '|');
            let name = pieces.next().unwrap_or_default().trim().to_lowercase();
            if !TEMPLATE_FIELDS.contains(&name.as_str()) {
                return Err(format!("unknown field '{name}'"));
            }
            if !literal.is_empty() {
                parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(TemplatePart::Field {
                name,
                prefix: pieces.next().unwrap_or_default().to_string(),
                suffix: pieces.next().unwrap_or_default().to_string(),
            });
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }
        Ok(Self { parts })
    }

    /// Parsed parts.
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Render against `env`.
    ///
    /// Field segments take their class from `classes` (keyed by field name); literal text is
    /// unstyled.
    pub fn render(
        &self,
        env: &PromptEnvironment,
        windows: bool,
        classes: &BTreeMap<String, String>,
    ) -> Vec<StyledSegment> {
        let mut out = Vec::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => out.push(StyledSegment::plain(text.clone())),
                TemplatePart::Field {
                    name,
                    prefix,
                    suffix,
                } => {
                    let value = field_value(env, name, windows);
                    if value.is_empty() {
                        continue;
                    }
                    if !prefix.is_empty() {
                        out.push(StyledSegment::plain(prefix.clone()));
                    }
                    out.push(match classes.get(name) {
                        Some(class) => StyledSegment::styled(value, class.clone()),
                        None => StyledSegment::plain(value),
                    });
                    if !suffix.is_empty() {
                        out.push(StyledSegment::plain(suffix.clone()));
                    }
                }
            }
        }
        out
    }
}

/// Value of template field `name`.
pub fn field_value(env: &PromptEnvironment, name: &str, windows: bool) -> String {
    match name {
        "user" => env.user.clone(),
        "host" => env.host.clone(),
        "path" => env.display_path(windows),
        "db" => env.db.clone(),
        "branch" => env.branch.clone(),
        "symbol" => symbol(env, windows).to_string(),
        "zsh_symbol" => zsh_symbol(env).to_string(),
        _ => String::new(),
    }
}

fn symbol(env: &PromptEnvironment, windows: bool) -> &'static str {
    if windows {
        ">"
    } else if env.is_root() {
        "#"
    } else {
        "$"
    }
}

// zsh's `%#`.
fn zsh_symbol(env: &PromptEnvironment) -> &'static str {
    if env.is_root() { "#" } else { "%" }
}

/// Concatenated text of rendered segments.
pub fn segments_text(segments: &[StyledSegment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}
