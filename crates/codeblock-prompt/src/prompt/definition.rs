use crate::prompt::error::PromptError;
use crate::prompt::template::PromptTemplate;
use codeblock_core::PromptDefinitionPatch;
use regex::Regex;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named shell-prompt grammar.
pub struct PromptDefinition {
    /// Prompt name, as used in `prompt:<name>`.
    pub name: String,
    /// Prompt template, e.g. `{user}@{host}:{path}{symbol} `.
    pub base_prompt: String,
    /// Initial user.
    pub default_user: String,
    /// Initial host.
    pub default_host: String,
    /// Initial working directory (empty = home).
    pub default_dir: String,
    /// Initial database.
    pub default_db: String,
    /// Initial VCS branch.
    pub default_branch: String,
    /// Template field -> CSS class.
    pub highlight_groups: BTreeMap<String, String>,
    /// Regex matching the prompt prefix of a line; named groups update the environment.
    pub parse_prompt_regex: String,
    /// Windows path semantics.
    pub is_windows_shell: bool,
    /// Root users switch to the root class set.
    pub supports_root_styling: bool,
}

impl PromptDefinition {
    /// A copy with every field set in `patch` replaced.
    pub fn apply_patch(&self, patch: &PromptDefinitionPatch) -> Self {
        let mut out = self.clone();
        if let Some(v) = &patch.base_prompt {
            out.base_prompt = v.clone();
        }
        if let Some(v) = &patch.default_user {
            out.default_user = v.clone();
        }
        if let Some(v) = &patch.default_host {
            out.default_host = v.clone();
        }
        if let Some(v) = &patch.default_dir {
            out.default_dir = v.clone();
        }
        if let Some(v) = &patch.default_db {
            out.default_db = v.clone();
        }
        if let Some(v) = &patch.default_branch {
            out.default_branch = v.clone();
        }
        if let Some(groups) = &patch.highlight_groups {
            out.highlight_groups
                .extend(groups.iter().map(|(k, v)| (k.to_lowercase(), v.clone())));
        }
        if let Some(v) = &patch.parse_prompt_regex {
            out.parse_prompt_regex = v.clone();
        }
        if let Some(v) = patch.is_windows_shell {
            out.is_windows_shell = v;
        }
        if let Some(v) = patch.supports_root_styling {
            out.supports_root_styling = v;
        }
        out
    }

    /// A custom definition built from a sparse patch.
    ///
    /// `base_prompt` and `parse_prompt_regex` are required; everything else has a default.
    pub fn from_patch(name: &str, patch: &PromptDefinitionPatch) -> Result<Self, PromptError> {
        if patch.base_prompt.is_none() {
            return Err(PromptError::MissingField {
                name: name.to_string(),
                field: "base_prompt",
            });
        }
        if patch.parse_prompt_regex.is_none() {
            return Err(PromptError::MissingField {
                name: name.to_string(),
                field: "parse_prompt_regex",
            });
        }
        let base = PromptDefinition {
            name: name.to_lowercase(),
            base_prompt: String::new(),
            default_user: "user".to_string(),
            default_host: "localhost".to_string(),
            default_dir: String::new(),
            default_db: String::new(),
            default_branch: String::new(),
            highlight_groups: crate::prompt::builtins::default_highlight_groups(),
            parse_prompt_regex: String::new(),
            is_windows_shell: false,
            supports_root_styling: false,
        };
        Ok(base.apply_patch(patch))
    }
}

#[derive(Debug)]
/// A definition with its compiled regex and parsed template.
pub struct CompiledPrompt {
    /// Source definition.
    pub definition: PromptDefinition,
    /// Compiled prefix regex.
    pub regex: Regex,
    /// Parsed template.
    pub template: PromptTemplate,
}

impl CompiledPrompt {
    /// Compile `definition`.
    pub fn compile(definition: PromptDefinition) -> Result<Self, PromptError> {
        let pattern = &definition.parse_prompt_regex;
        let anchored = if pattern.starts_with('^') {
            pattern.clone()
        } else {
            format!("^(?:{pattern})")
        };
        let regex = Regex::new(&anchored).map_err(|e| PromptError::InvalidRegex {
            name: definition.name.clone(),
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        let template =
            PromptTemplate::parse(&definition.base_prompt).map_err(|message| {
                PromptError::InvalidTemplate {
                    name: definition.name.clone(),
                    template: definition.base_prompt.clone(),
                    message,
                }
            })?;
        Ok(Self {
            definition,
            regex,
            template,
        })
    }

    /// Prompt name.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Byte length of the prompt prefix of `line`, if it is a prompt line.
    pub fn match_prefix(&self, line: &str) -> Option<usize> {
        self.regex.find(line).map(|m| m.end())
    }
}
