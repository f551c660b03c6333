//! Display names for code block languages.

use std::collections::BTreeMap;

/// Built-in language id -> display name table.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("bash", "Bash"),
    ("c", "C"),
    ("clojure", "Clojure"),
    ("cmd", "Batch"),
    ("cpp", "C++"),
    ("cs", "C#"),
    ("csharp", "C#"),
    ("css", "CSS"),
    ("dart", "Dart"),
    ("diff", "Diff"),
    ("docker", "Docker"),
    ("dockerfile", "Dockerfile"),
    ("elixir", "Elixir"),
    ("go", "Go"),
    ("golang", "Go"),
    ("graphql", "GraphQL"),
    ("haskell", "Haskell"),
    ("html", "HTML"),
    ("ini", "INI"),
    ("java", "Java"),
    ("javascript", "JavaScript"),
    ("js", "JavaScript"),
    ("json", "JSON"),
    ("jsx", "JSX"),
    ("kotlin", "Kotlin"),
    ("kt", "Kotlin"),
    ("latex", "LaTeX"),
    ("lua", "Lua"),
    ("makefile", "Makefile"),
    ("markdown", "Markdown"),
    ("md", "Markdown"),
    ("nix", "Nix"),
    ("objc", "Objective-C"),
    ("perl", "Perl"),
    ("php", "PHP"),
    ("powershell", "PowerShell"),
    ("prompt", "Prompt"),
    ("ps", "PowerShell"),
    ("ps1", "PowerShell"),
    ("py", "Python"),
    ("python", "Python"),
    ("r", "R"),
    ("rb", "Ruby"),
    ("rs", "Rust"),
    ("ruby", "Ruby"),
    ("rust", "Rust"),
    ("scala", "Scala"),
    ("scss", "SCSS"),
    ("sh", "Shell"),
    ("shell", "Shell"),
    ("sql", "SQL"),
    ("swift", "Swift"),
    ("tex", "TeX"),
    ("toml", "TOML"),
    ("ts", "TypeScript"),
    ("tsx", "TSX"),
    ("typescript", "TypeScript"),
    ("vb", "Visual Basic"),
    ("xml", "XML"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("zig", "Zig"),
    ("zsh", "Zsh"),
];

/// Resolve the display name of a (lower-cased) language id.
///
/// User overrides win over the built-in table; unknown ids are shown with their first letter
/// capitalized.
pub fn display_language(language: &str, overrides: &BTreeMap<String, String>) -> String {
    if language.is_empty() {
        return String::new();
    }
    if let Some(name) = overrides
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(language))
        .map(|(_, v)| v)
    {
        return name.clone();
    }
    if let Ok(idx) = DISPLAY_NAMES.binary_search_by_key(&language, |(id, _)| *id) {
        return DISPLAY_NAMES[idx].1.to_string();
    }
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether the theme assigns a border color to `language`.
pub fn has_lang_border_color(language: &str, border_colors: &BTreeMap<String, String>) -> bool {
    !language.is_empty()
        && border_colors
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case(language) && !v.trim().is_empty())
}
