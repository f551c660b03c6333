use crate::prompt::builtins::{builtin, builtins};
use crate::prompt::definition::{CompiledPrompt, PromptDefinition};
use crate::prompt::error::PromptError;
use crate::prompt::simulator;
use codeblock_core::{Parameters, PromptDefinitionPatch, PromptSettings};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default)]
/// A collection of compiled prompt definitions keyed by lower-cased name.
pub struct PromptDefinitionSet {
    prompts: HashMap<String, Arc<CompiledPrompt>>,
    root_styling: bool,
    // Names registered from YAML; these are not part of the settings.
    loaded: BTreeSet<String>,
}

impl PromptDefinitionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding every built-in prompt.
    pub fn with_builtins() -> Self {
        let mut set = Self {
            root_styling: true,
            ..Self::default()
        };
        for definition in builtins() {
            if let Err(err) = set.register(definition) {
                tracing::warn!(%err, "built-in prompt failed to compile");
            }
        }
        set
    }

    /// Whether root styling is enabled for prompts that support it.
    pub fn root_styling(&self) -> bool {
        self.root_styling
    }

    /// Enable or disable root styling.
    pub fn set_root_styling(&mut self, enabled: bool) {
        self.root_styling = enabled;
    }

    /// Get a compiled prompt by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<Arc<CompiledPrompt>> {
        self.prompts.get(&name.to_lowercase()).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.prompts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Compile and register `definition`, replacing any prompt of the same name.
    ///
    /// On failure the previously registered prompt of that name stays in effect.
    pub fn register(
        &mut self,
        definition: PromptDefinition,
    ) -> Result<Arc<CompiledPrompt>, PromptError> {
        let name = definition.name.to_lowercase();
        match CompiledPrompt::compile(definition) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                tracing::debug!(prompt = %name, "registered prompt definition");
                self.prompts.insert(name, compiled.clone());
                Ok(compiled)
            }
            Err(err) => {
                tracing::warn!(prompt = %name, %err, "keeping previous prompt definition");
                Err(err)
            }
        }
    }

    /// Layer `patch` over the built-in `name` and register the result.
    ///
    /// Overrides always start from the built-in default, never from an earlier override.
    pub fn apply_override(
        &mut self,
        name: &str,
        patch: &PromptDefinitionPatch,
    ) -> Result<Arc<CompiledPrompt>, PromptError> {
        let base = builtin(name).ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;
        self.register(base.apply_patch(patch))
    }

    /// Register a user-defined prompt.
    pub fn add_custom(
        &mut self,
        name: &str,
        patch: &PromptDefinitionPatch,
    ) -> Result<Arc<CompiledPrompt>, PromptError> {
        let definition = PromptDefinition::from_patch(name, patch)?;
        self.register(definition)
    }

    /// Load custom prompts from a YAML mapping of name to definition fields.
    ///
    /// Every entry is attempted; the returned names are the ones registered.
    pub fn load_from_str(&mut self, yaml: &str) -> Result<Vec<String>, PromptError> {
        let entries: BTreeMap<String, PromptDefinitionPatch> = serde_yaml::from_str(yaml)?;
        let mut loaded = Vec::with_capacity(entries.len());
        let mut first_error = None;
        for (name, patch) in &entries {
            match self.add_custom(name, patch) {
                Ok(compiled) => {
                    self.loaded.insert(name.to_lowercase());
                    loaded.push(compiled.name().to_string());
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) if loaded.is_empty() => Err(err),
            _ => Ok(loaded),
        }
    }

    /// Load custom prompts from a YAML file.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>, PromptError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        self.load_from_str(&yaml)
    }

    /// Replace the settings-derived prompts with those of `settings`.
    ///
    /// The set is rebuilt from the built-ins, so overrides and custom prompts no longer present
    /// in `settings` are gone afterwards. Prompts loaded from YAML are carried over. An entry
    /// that fails keeps the definition it had before the call. Every error is returned.
    pub fn apply_settings(&mut self, settings: &PromptSettings) -> Vec<PromptError> {
        let (next, errors) = self.rebuilt(settings);
        *self = next;
        errors
    }

    fn rebuilt(&self, settings: &PromptSettings) -> (Self, Vec<PromptError>) {
        let mut next = Self::with_builtins();
        next.root_styling = settings.root_styling;
        for name in &self.loaded {
            if let Some(prompt) = self.prompts.get(name) {
                next.prompts.insert(name.clone(), Arc::clone(prompt));
                next.loaded.insert(name.clone());
            }
        }

        let mut errors = Vec::new();
        for (name, patch) in &settings.overrides {
            if let Err(err) = next.apply_override(name, patch) {
                next.keep_previous(self, name);
                errors.push(err);
            }
        }
        for (name, patch) in &settings.custom {
            if let Err(err) = next.add_custom(name, patch) {
                next.keep_previous(self, name);
                errors.push(err);
            }
        }
        (next, errors)
    }

    fn keep_previous(&mut self, previous: &Self, name: &str) {
        let key = name.to_lowercase();
        if let Some(prompt) = previous.prompts.get(&key) {
            self.prompts.insert(key, Arc::clone(prompt));
        }
    }

    /// 1-based numbers of the prompt lines among a block's content `lines`.
    ///
    /// Empty when the block is not a prompt block or names an unknown prompt.
    pub fn compute_prompt_lines<S: AsRef<str>>(
        &self,
        parameters: &Parameters,
        lines: &[S],
    ) -> BTreeSet<usize> {
        let Some(prompt) = parameters.prompt_name.as_deref().and_then(|n| self.get(n)) else {
            return BTreeSet::new();
        };
        simulator::compute_prompt_lines(&prompt, lines)
    }
}
