//! Line-by-line prompt simulation.
//!
//! [`render_prompt_line`] is a pure step: it takes one line, the environment left by the lines
//! before it and the render cache, and returns what to draw plus the next environment and cache.
//! [`simulate`] folds that step over a whole block.

use crate::prompt::builtins::ROOT_CLASS_SUFFIX;
use crate::prompt::definition::CompiledPrompt;
use crate::prompt::environment::PromptEnvironment;
use codeblock_core::StyledSegment;
use regex::Captures;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The prompt a block is rendered with.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Compiled prompt definition.
    pub prompt: &'a CompiledPrompt,
    /// Root styling enabled in the settings.
    pub root_styling: bool,
}

impl<'a> PromptContext<'a> {
    /// Create a context.
    pub fn new(prompt: &'a CompiledPrompt, root_styling: bool) -> Self {
        Self {
            prompt,
            root_styling,
        }
    }

    fn windows(&self) -> bool {
        self.prompt.definition.is_windows_shell
    }

    fn classes_for(&self, env: &PromptEnvironment) -> BTreeMap<String, String> {
        let groups = &self.prompt.definition.highlight_groups;
        if self.root_styling && self.prompt.definition.supports_root_styling && env.is_root() {
            groups
                .iter()
                .map(|(field, class)| (field.clone(), format!("{class}{ROOT_CLASS_SUFFIX}")))
                .collect()
        } else {
            groups.clone()
        }
    }
}

/// Last rendered prompt, keyed by everything that affects its rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCache {
    /// Render key.
    pub key: String,
    /// Rendered prompt.
    pub node: Arc<Vec<StyledSegment>>,
}

/// What a single line of a prompt block renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptData {
    /// A prompt line: the prompt prefix is replaced by `segments`.
    Prompt {
        /// Rendered prompt.
        segments: Arc<Vec<StyledSegment>>,
        /// Byte length of the source prefix the prompt replaces.
        prefix_len: usize,
        /// Command text after the prompt.
        command: String,
        /// Synthesized output lines shown after this line.
        outputs: Vec<String>,
    },
    /// Continuation of the previous command (it ended in `\`).
    Continuation,
    /// Plain output, rendered unstyled.
    Output,
}

impl PromptData {
    /// Whether this is a prompt line.
    pub fn is_prompt(&self) -> bool {
        matches!(self, PromptData::Prompt { .. })
    }
}

/// Result of [`render_prompt_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLineResult {
    /// What the line renders as.
    pub prompt_data: PromptData,
    /// Environment for the next line.
    pub new_env: PromptEnvironment,
    /// Cache for the next line.
    pub new_cache: Option<PromptCache>,
}

/// Render one line of a prompt block.
///
/// Lines the prompt regex does not match are output: they pass the environment and cache
/// through untouched.
pub fn render_prompt_line(
    line: &str,
    env: &PromptEnvironment,
    cache: Option<&PromptCache>,
    ctx: &PromptContext<'_>,
) -> PromptLineResult {
    let Some(caps) = ctx.prompt.regex.captures(line) else {
        return PromptLineResult {
            prompt_data: PromptData::Output,
            new_env: env.clone(),
            new_cache: cache.cloned(),
        };
    };
    let prefix_len = caps.get(0).map_or(0, |m| m.end());
    let windows = ctx.windows();
    let env = apply_captures(env, &caps, windows);

    let key = cache_key(&env, ctx);
    let node = match cache {
        Some(cached) if cached.key == key => cached.node.clone(),
        _ => {
            tracing::trace!(prompt = %ctx.prompt.name(), "prompt cache miss");
            let classes = ctx.classes_for(&env);
            Arc::new(ctx.prompt.template.render(&env, windows, &classes))
        }
    };

    let command = line[prefix_len..].trim().to_string();
    let (new_env, outputs) = run_commands(&env, &command, windows);

    PromptLineResult {
        prompt_data: PromptData::Prompt {
            segments: node.clone(),
            prefix_len,
            command,
            outputs,
        },
        new_env,
        new_cache: Some(PromptCache { key, node }),
    }
}

/// Simulate a whole block, returning what each line renders as and the final environment.
pub fn simulate<S: AsRef<str>>(
    lines: &[S],
    ctx: &PromptContext<'_>,
) -> (Vec<PromptData>, PromptEnvironment) {
    let initial = (
        Vec::with_capacity(lines.len()),
        PromptEnvironment::initial(&ctx.prompt.definition),
        None::<PromptCache>,
        false,
    );
    let (outputs, env, _, _) =
        lines
            .iter()
            .fold(initial, |(mut outputs, env, cache, continued), line| {
                let line = line.as_ref();
                if continued {
                    outputs.push(PromptData::Continuation);
                    return (outputs, env, cache, continues(line));
                }
                let step = render_prompt_line(line, &env, cache.as_ref(), ctx);
                let next_continued = step.prompt_data.is_prompt() && continues(line);
                outputs.push(step.prompt_data);
                (outputs, step.new_env, step.new_cache, next_continued)
            });
    (outputs, env)
}

/// 1-based numbers of the prompt lines among `lines`.
pub fn compute_prompt_lines<S: AsRef<str>>(
    prompt: &CompiledPrompt,
    lines: &[S],
) -> BTreeSet<usize> {
    let mut out = BTreeSet::new();
    let mut continued = false;
    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if continued {
            continued = continues(line);
            continue;
        }
        if prompt.match_prefix(line).is_some() {
            out.insert(i + 1);
            continued = continues(line);
        }
    }
    out
}

fn continues(line: &str) -> bool {
    line.trim_end().ends_with('\\')
}

fn apply_captures(
    env: &PromptEnvironment,
    caps: &Captures<'_>,
    windows: bool,
) -> PromptEnvironment {
    let group = |name: &str| caps.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty());

    let mut env = match group("user") {
        Some(user) if user != env.user => env.with_user(user, windows),
        _ => env.clone(),
    };
    if let Some(host) = group("host") {
        env.host = host.to_string();
    }
    if let Some(db) = group("db") {
        env.db = db.to_string();
    }
    if let Some(branch) = group("branch") {
        env.branch = branch.to_string();
    }
    if let Some(path) = group("path") {
        let path = path.trim();
        if path != env.display_path(windows) {
            env = env.with_displayed_path(path, windows);
        }
    }
    env
}

fn cache_key(env: &PromptEnvironment, ctx: &PromptContext<'_>) -> String {
    let path = env.display_path(ctx.windows());
    let root = ctx.root_styling && env.is_root();
    [
        ctx.prompt.name(),
        env.user.as_str(),
        env.host.as_str(),
        path.as_str(),
        env.db.as_str(),
        env.branch.as_str(),
        if root { "root" } else { "" },
    ]
    .join("\u{1f}")
}

fn run_commands(
    env: &PromptEnvironment,
    command: &str,
    windows: bool,
) -> (PromptEnvironment, Vec<String>) {
    let mut env = env.clone();
    let mut outputs = Vec::new();
    for part in split_chain(command, windows) {
        let words = command_words(part, windows);
        let Some((name, args)) = words.split_first() else {
            continue;
        };
        let arg = args
            .iter()
            .map(String::as_str)
            .find(|a| !(windows && a.eq_ignore_ascii_case("/d")))
            .unwrap_or("");
        match name.to_lowercase().as_str() {
            "cd" | "chdir" | "set-location" | "sl" => {
                if windows && arg.is_empty() && name.eq_ignore_ascii_case("cd") {
                    outputs.push(env.dir.clone());
                }
                env = env.cd(arg, windows);
            }
            "pwd" => outputs.push(env.dir.clone()),
            "whoami" => outputs.push(if windows {
                format!("{}\\{}", env.host, env.user).to_lowercase()
            } else {
                env.user.clone()
            }),
            _ => {}
        }
    }
    (env, outputs)
}

/// Split a command line on `&&` and `;` outside quotes.
fn split_chain(command: &str, windows: bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut escaped = false;
    let mut start = 0;
    let mut chars = command.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') if !windows => escaped = true,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ';') => {
                parts.push(&command[start..i]);
                start = i + 1;
            }
            (None, '&') if chars.peek().is_some_and(|&(_, next)| next == '&') => {
                chars.next();
                parts.push(&command[start..i]);
                start = i + 2;
            }
            _ => {}
        }
    }
    parts.push(&command[start..]);
    parts
}

/// Split one command into words, removing quotes.
///
/// Unix shells follow POSIX quoting. Windows shells only group on quotes, since `\` is a path
/// separator there.
fn command_words(part: &str, windows: bool) -> Vec<String> {
    if windows {
        return windows_words(part);
    }
    shell_words::split(part).unwrap_or_else(|err| {
        tracing::debug!(command = part, %err, "unbalanced quoting, splitting on whitespace");
        part.split_whitespace().map(str::to_string).collect()
    })
}

fn windows_words(part: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote = None;
    for c in part.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => word.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            (None, c) => {
                word.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(word);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::builtins::builtin;
    use crate::prompt::template::segments_text;
    use pretty_assertions::assert_eq;

    fn bash() -> CompiledPrompt {
        CompiledPrompt::compile(builtin("bash").unwrap()).unwrap()
    }

    fn outputs(data: &PromptData) -> Vec<String> {
        match data {
            PromptData::Prompt { outputs, .. } => outputs.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_output_line_passes_env_through() {
        let prompt = bash();
        let ctx = PromptContext::new(&prompt, true);
        let env = PromptEnvironment::initial(&prompt.definition);
        let step = render_prompt_line("drwxr-xr-x 2 user user", &env, None, &ctx);
        assert_eq!(step.prompt_data, PromptData::Output);
        assert_eq!(step.new_env, env);
        assert_eq!(step.new_cache, None);
    }

    #[test]
    fn test_short_form_renders_from_env() {
        let prompt = bash();
        let ctx = PromptContext::new(&prompt, true);
        let env = PromptEnvironment::initial(&prompt.definition);
        let step = render_prompt_line("$ ls", &env, None, &ctx);
        match &step.prompt_data {
            PromptData::Prompt {
                segments,
                prefix_len,
                command,
                ..
            } => {
                assert_eq!(segments_text(segments), "user@localhost:~$ ");
                assert_eq!(*prefix_len, 2);
                assert_eq!(command, "ls");
            }
            other => panic!("expected prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_reuses_identical_prompt() {
        let prompt = bash();
        let ctx = PromptContext::new(&prompt, true);
        let env = PromptEnvironment::initial(&prompt.definition);
        let first = render_prompt_line("$ ls", &env, None, &ctx);
        let second =
            render_prompt_line("$ echo hi", &first.new_env, first.new_cache.as_ref(), &ctx);
        let node = |r: &PromptLineResult| match &r.prompt_data {
            PromptData::Prompt { segments, .. } => segments.clone(),
            _ => unreachable!(),
        };
        assert!(Arc::ptr_eq(&node(&first), &node(&second)));

        let third =
            render_prompt_line("$ cd /tmp", &second.new_env, second.new_cache.as_ref(), &ctx);
        let fourth = render_prompt_line("$ ls", &third.new_env, third.new_cache.as_ref(), &ctx);
        assert!(!Arc::ptr_eq(&node(&third), &node(&fourth)));
        assert_eq!(segments_text(&node(&fourth)), "user@localhost:/tmp$ ");
    }

    #[test]
    fn test_full_form_updates_env_and_root_styling() {
        let prompt = bash();
        let ctx = PromptContext::new(&prompt, true);
        let env = PromptEnvironment::initial(&prompt.definition);
        let step = render_prompt_line("root@web:/etc# whoami", &env, None, &ctx);
        assert_eq!(step.new_env.user, "root");
        assert_eq!(step.new_env.host, "web");
        assert_eq!(step.new_env.dir, "/etc");
        match &step.prompt_data {
            PromptData::Prompt {
                segments, outputs, ..
            } => {
                assert_eq!(segments_text(segments), "root@web:/etc# ");
                assert_eq!(
                    segments[0].class_name.as_deref(),
                    Some("codeblock-customizer-prompt-user-root")
                );
                assert_eq!(outputs, &vec!["root".to_string()]);
            }
            other => panic!("expected prompt, got {other:?}"),
        }

        let plain = PromptContext::new(&prompt, false);
        let step = render_prompt_line("root@web:/etc# ls", &env, None, &plain);
        match &step.prompt_data {
            PromptData::Prompt { segments, .. } => assert_eq!(
                segments[0].class_name.as_deref(),
                Some("codeblock-customizer-prompt-user")
            ),
            other => panic!("expected prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_chained_commands_and_continuations() {
        let prompt = bash();
        let ctx = PromptContext::new(&prompt, true);
        let lines = [
            "$ cd /srv && pwd; cd app",
            "$ ls \\",
            "$ not-a-prompt-line",
            "$ pwd",
        ];
        let (data, env) = simulate(&lines, &ctx);
        assert_eq!(outputs(&data[0]), vec!["/srv".to_string()]);
        assert_eq!(data[2], PromptData::Continuation);
        assert_eq!(outputs(&data[3]), vec!["/srv/app".to_string()]);
        assert_eq!(env.dir, "/srv/app");
        assert_eq!(compute_prompt_lines(&prompt, &lines), BTreeSet::from([1, 2, 4]));
    }

    #[test]
    fn test_quoted_arguments_stay_whole() {
        let prompt = bash();
        let ctx = PromptContext::new(&prompt, true);
        let (data, env) = simulate(&["$ cd \"/srv/a;b\"", "$ pwd"], &ctx);
        assert_eq!(outputs(&data[1]), vec!["/srv/a;b".to_string()]);
        assert_eq!(env.dir, "/srv/a;b");

        let (data, env) = simulate(&["$ cd '/srv/x && y' && pwd", "$ cd My\\ Dir"], &ctx);
        assert_eq!(outputs(&data[0]), vec!["/srv/x && y".to_string()]);
        assert_eq!(env.dir, "/srv/x && y/My Dir");
    }

    #[test]
    fn test_command_splitting() {
        assert_eq!(split_chain("a && b;c", false), vec!["a ", " b", "c"]);
        assert_eq!(split_chain("cd \"x;y\" && pwd", false), vec!["cd \"x;y\" ", " pwd"]);
        assert_eq!(split_chain(r"echo \; pwd", false), vec![r"echo \; pwd"]);
        assert_eq!(
            command_words("cd /d \"C:\\Program Files\"", true),
            vec!["cd", "/d", "C:\\Program Files"]
        );
        assert_eq!(command_words("cd \"unterminated", false), vec!["cd", "\"unterminated"]);
    }

    #[test]
    fn test_windows_whoami_and_bare_cd() {
        let ps = CompiledPrompt::compile(builtin("ps").unwrap()).unwrap();
        let ctx = PromptContext::new(&ps, true);
        let (data, env) = simulate(&["PS> whoami", "PS> cd", "PS> cd .."], &ctx);
        assert_eq!(outputs(&data[0]), vec!["desktop\\user".to_string()]);
        assert_eq!(outputs(&data[1]), vec!["C:\\Users\\user".to_string()]);
        assert_eq!(env.dir, "C:\\Users");

        let (_, env) = simulate(&["PS> cd /d \"D:\\Program Files\""], &ctx);
        assert_eq!(env.dir, "D:\\Program Files");
    }
}
