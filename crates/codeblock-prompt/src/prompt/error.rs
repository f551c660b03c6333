use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or compiling prompt definitions.
pub enum PromptError {
    #[error("I/O error: {0}")]
    /// Reading a definition file failed.
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("prompt '{name}' is missing required field '{field}'")]
    /// A custom definition lacks a field that has no default.
    MissingField {
        /// Prompt name.
        name: String,
        /// Missing field.
        field: &'static str,
    },

    #[error("prompt '{name}': regex compile error for pattern '{pattern}': {message}")]
    /// The prompt regex failed to compile.
    InvalidRegex {
        /// Prompt name.
        name: String,
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("prompt '{name}': invalid template '{template}': {message}")]
    /// The prompt template is malformed or names an unknown field.
    InvalidTemplate {
        /// Prompt name.
        name: String,
        /// The template string.
        template: String,
        /// What is wrong with it.
        message: String,
    },

    #[error("unknown prompt '{0}'")]
    /// An override names a prompt that is not built in.
    UnknownPrompt(String),
}
