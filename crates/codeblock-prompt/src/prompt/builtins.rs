//! Built-in prompt definitions.
//!
//! Every built-in accepts two line forms: the short form (only the prompt symbol, e.g. `$ ls`),
//! which renders the full prompt from the simulated environment, and the full form (an explicit
//! prompt, e.g. `user@box:/srv$ ls`), whose named groups update the environment first.

use crate::prompt::definition::PromptDefinition;
use std::collections::BTreeMap;

/// Class prefix for prompt fields; the field name is appended.
pub const PROMPT_CLASS_PREFIX: &str = "codeblock-customizer-prompt-";

/// Suffix appended to every prompt class when root styling applies.
pub const ROOT_CLASS_SUFFIX: &str = "-root";

/// Names of the built-in prompts.
pub const BUILTIN_NAMES: &[&str] = &[
    "bash", "cmd", "docker", "fish", "kali", "postgres", "ps", "zsh",
];

/// Field -> class map shared by the built-ins.
pub fn default_highlight_groups() -> BTreeMap<String, String> {
    ["user", "host", "path", "db", "branch", "symbol"]
        .iter()
        .map(|f| (f.to_string(), format!("{PROMPT_CLASS_PREFIX}{f}")))
        .collect()
}

struct Builtin {
    name: &'static str,
    base_prompt: &'static str,
    user: &'static str,
    host: &'static str,
    dir: &'static str,
    db: &'static str,
    regex: &'static str,
    windows: bool,
    root_styling: bool,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "bash",
        base_prompt: "{user}@{host}:{path}{branch| (|)}{symbol} ",
        user: "user",
        host: "localhost",
        dir: "",
        db: "",
        regex: r"^(?:(?P<user>[\w.-]+)@(?P<host>[\w.-]+):(?P<path>[^\s$#]*?)(?: \((?P<branch>[^)]*)\))?)?[$#](?: |$)",
        windows: false,
        root_styling: true,
    },
    Builtin {
        name: "cmd",
        base_prompt: "{path}>",
        user: "user",
        host: "DESKTOP",
        dir: "",
        db: "",
        regex: r"^(?P<path>[A-Za-z]:[^>]*)?>",
        windows: true,
        root_styling: false,
    },
    Builtin {
        name: "docker",
        base_prompt: "{user}@{host}:{path}{symbol} ",
        user: "root",
        host: "3f4e8b2c1a9d",
        dir: "/",
        db: "",
        regex: r"^(?:(?P<user>[\w.-]+)@(?P<host>[\w.-]+):(?P<path>[^\s$#]*?))?[$#](?: |$)",
        windows: false,
        root_styling: true,
    },
    Builtin {
        name: "fish",
        base_prompt: "{user}@{host} {path}> ",
        user: "user",
        host: "localhost",
        dir: "",
        db: "",
        regex: r"^(?:(?P<user>[\w.-]+)@(?P<host>[\w.-]+) (?P<path>[^\s>]+))?>(?: |$)",
        windows: false,
        root_styling: false,
    },
    Builtin {
        name: "kali",
        base_prompt: "({user}㉿{host})-[{path}]{symbol} ",
        user: "kali",
        host: "kali",
        dir: "",
        db: "",
        regex: r"^(?:(?:┌──)?\((?P<user>[\w.-]+)㉿(?P<host>[\w.-]+)\)-\[(?P<path>[^\]]*)\](?:└─)?)?[$#](?: |$)",
        windows: false,
        root_styling: true,
    },
    Builtin {
        name: "postgres",
        base_prompt: "{db}=# ",
        user: "postgres",
        host: "localhost",
        dir: "",
        db: "postgres",
        regex: r"^(?P<db>[\w-]+)?=[#>](?: |$)",
        windows: false,
        root_styling: false,
    },
    Builtin {
        name: "ps",
        base_prompt: "PS {path}> ",
        user: "user",
        host: "DESKTOP",
        dir: "",
        db: "",
        regex: r"^PS(?: (?P<path>[^>]+))?>(?: |$)",
        windows: true,
        root_styling: false,
    },
    Builtin {
        name: "zsh",
        base_prompt: "{user}@{host} {path} {zsh_symbol} ",
        user: "user",
        host: "localhost",
        dir: "",
        db: "",
        regex: r"^(?:(?P<user>[\w.-]+)@(?P<host>[\w.-]+) (?P<path>\S+) )?[%#](?: |$)",
        windows: false,
        root_styling: true,
    },
];

/// The built-in definition called `name`.
pub fn builtin(name: &str) -> Option<PromptDefinition> {
    let name = name.to_lowercase();
    BUILTINS.iter().find(|b| b.name == name).map(|b| PromptDefinition {
        name: b.name.to_string(),
        base_prompt: b.base_prompt.to_string(),
        default_user: b.user.to_string(),
        default_host: b.host.to_string(),
        default_dir: b.dir.to_string(),
        default_db: b.db.to_string(),
        default_branch: String::new(),
        highlight_groups: default_highlight_groups(),
        parse_prompt_regex: b.regex.to_string(),
        is_windows_shell: b.windows,
        supports_root_styling: b.root_styling,
    })
}

/// Every built-in definition.
pub fn builtins() -> Vec<PromptDefinition> {
    BUILTIN_NAMES.iter().filter_map(|name| builtin(name)).collect()
}
