//! Global settings consumed by the annotation engine.
//!
//! The host owns settings persistence and the settings UI. The engine only ever reads a
//! [`Settings`] value, usually deserialized from the host's JSON settings blob, together with a
//! [`SettingsRevision`] that the host bumps whenever any field changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or validating [`Settings`].
pub enum SettingsError {
    #[error("settings JSON parse error: {0}")]
    /// The settings blob is not valid JSON for [`Settings`].
    Json(#[from] serde_json::Error),

    #[error("invalid separator configuration: {0}")]
    /// Line/text separators are empty, identical, or collide with the segment separator `,`.
    InvalidSeparator(String),
}

/// Monotonic settings revision.
///
/// Front ends cache the revision they last rendered with; a mismatch forces a full recompute of
/// every compiled [`Parameters`](crate::Parameters) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SettingsRevision(pub u64);

impl SettingsRevision {
    /// Revision of freshly loaded settings.
    pub const INITIAL: Self = Self(0);

    /// The revision following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Line and text separators used by the highlight mini-language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparatorSettings {
    /// Separates a line (or range) from a word or text span, e.g. `hlt:3|err`.
    pub line: String,
    /// Separates the `from` and `to` parts of a text span, e.g. `hlt:err:warn`.
    pub text: String,
}

impl Default for SeparatorSettings {
    fn default() -> Self {
        Self {
            line: "|".to_string(),
            text: ":".to_string(),
        }
    }
}

/// Semi-fold ("show the head, fade out, collapse the rest") configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemiFoldSettings {
    /// Whether long blocks fold into the semi-fold layout instead of collapsing completely.
    pub enabled: bool,
    /// Number of content lines shown fully.
    pub visible_lines: usize,
    /// Number of lines rendered with decreasing opacity after the visible lines.
    pub fade_out_line_count: usize,
    /// Whether an extra uncollapse affordance is rendered at the bottom of an expanded block.
    pub show_uncollapse_button: bool,
}

impl Default for SemiFoldSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            visible_lines: 5,
            fade_out_line_count: 4,
            show_uncollapse_button: false,
        }
    }
}

/// Header configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderSettings {
    /// Header text used for folded blocks that carry no `file`/`title`.
    pub collapsed_code_text: String,
    /// Render a header for every block that has a language, even without `file`/`title`/`fold`.
    pub always_display: bool,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            collapsed_code_text: "Collapsed Code".to_string(),
            always_display: false,
        }
    }
}

/// Theme colors, keyed by highlight name.
///
/// Alternate highlight names without an entry here resolve to the default highlight class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    /// Highlight name -> CSS color.
    pub colors: BTreeMap<String, String>,
}

/// A sparse prompt definition.
///
/// Every field is optional: layered over a built-in definition it overrides only the fields it
/// sets; as a custom definition it must at least carry `base_prompt` and `parse_prompt_regex`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptDefinitionPatch {
    /// Prompt template, e.g. `{user}@{host}:{path}{symbol} `.
    pub base_prompt: Option<String>,
    /// Initial user.
    pub default_user: Option<String>,
    /// Initial host.
    pub default_host: Option<String>,
    /// Initial working directory.
    pub default_dir: Option<String>,
    /// Initial database (SQL shells).
    pub default_db: Option<String>,
    /// Initial VCS branch.
    pub default_branch: Option<String>,
    /// Field name -> CSS class.
    pub highlight_groups: Option<BTreeMap<String, String>>,
    /// Regex recognizing a prompt prefix; named groups update the environment.
    pub parse_prompt_regex: Option<String>,
    /// Windows path semantics (`\` separators, drive letters).
    pub is_windows_shell: Option<bool>,
    /// Whether a root user switches to the root class set.
    pub supports_root_styling: Option<bool>,
}

/// Prompt simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Apply root styling when the simulated user is `root`.
    pub root_styling: bool,
    /// Sparse overrides layered over built-in definitions, keyed by prompt name.
    pub overrides: BTreeMap<String, PromptDefinitionPatch>,
    /// User-defined prompt definitions, keyed by prompt name.
    pub custom: BTreeMap<String, PromptDefinitionPatch>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            root_styling: true,
            overrides: BTreeMap::new(),
            custom: BTreeMap::new(),
        }
    }
}

/// Global settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Comma-separated language exclusion list; entries may use `*` wildcards.
    pub exclude_langs: String,
    /// Fold every block unless it says `unfold`.
    pub inverse_fold: bool,
    /// Show line numbers for blocks that do not say otherwise.
    pub enable_line_numbers: bool,
    /// Always show the copy button, not only on the block holding the cursor.
    pub always_show_copy_button: bool,
    /// User-defined alternate highlight names.
    pub alternate_colors: Vec<String>,
    /// Theme colors.
    pub theme: ThemeSettings,
    /// Highlight separators.
    pub separators: SeparatorSettings,
    /// Semi-fold configuration.
    pub semi_fold: SemiFoldSettings,
    /// Header configuration.
    pub header: HeaderSettings,
    /// Language -> border color.
    pub lang_border_colors: BTreeMap<String, String>,
    /// Language id -> display name overrides.
    pub language_display_names: BTreeMap<String, String>,
    /// Prompt simulation settings.
    pub prompts: PromptSettings,
}

impl Settings {
    /// Parse and validate settings from the host's JSON blob.
    ///
    /// Missing sections fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let SeparatorSettings { line, text } = &self.separators;
        if line.is_empty() || text.is_empty() {
            return Err(SettingsError::InvalidSeparator(
                "separators must not be empty".to_string(),
            ));
        }
        if line == text {
            return Err(SettingsError::InvalidSeparator(format!(
                "line and text separators are both '{line}'"
            )));
        }
        if line.contains(',') || text.contains(',') {
            return Err(SettingsError::InvalidSeparator(
                "',' is reserved for separating segments".to_string(),
            ));
        }
        Ok(())
    }

    /// Exclusion patterns from [`Settings::exclude_langs`], trimmed, empty entries dropped.
    pub fn exclude_patterns(&self) -> Vec<&str> {
        self.exclude_langs
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Whether `name` has a color in the current theme.
    pub fn has_theme_color(&self, name: &str) -> bool {
        self.theme
            .colors
            .keys()
            .any(|k| k.eq_ignore_ascii_case(name))
    }
}
