//! Simulated shell environment.
//!
//! A [`PromptEnvironment`] is a snapshot: every operation returns a new value and leaves the
//! input untouched, so each prompt line of a block sees exactly the state left by the lines
//! before it.

use crate::prompt::definition::PromptDefinition;

/// Simulated shell state carried from line to line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptEnvironment {
    /// Current user.
    pub user: String,
    /// Current host.
    pub host: String,
    /// Absolute working directory.
    pub dir: String,
    /// Directory before the last `cd` (target of `cd -`).
    pub previous_dir: Option<String>,
    /// Current database (SQL shells).
    pub db: String,
    /// Current VCS branch.
    pub branch: String,
    /// Home directory of the current user.
    pub home_dir: String,
    /// Home directory of the user the block started with.
    pub original_home_dir: String,
}

/// Home directory of `user`.
pub fn home_for(user: &str, windows: bool) -> String {
    if windows {
        format!("C:\\Users\\{user}")
    } else if user == "root" {
        "/root".to_string()
    } else {
        format!("/home/{user}")
    }
}

impl PromptEnvironment {
    /// Starting environment of a block using `definition`.
    pub fn initial(definition: &PromptDefinition) -> Self {
        let windows = definition.is_windows_shell;
        let home_dir = home_for(&definition.default_user, windows);
        let mut env = Self {
            user: definition.default_user.clone(),
            host: definition.default_host.clone(),
            dir: home_dir.clone(),
            previous_dir: None,
            db: definition.default_db.clone(),
            branch: definition.default_branch.clone(),
            original_home_dir: home_dir.clone(),
            home_dir,
        };
        if !definition.default_dir.is_empty() {
            env.dir = env.resolve(&definition.default_dir, windows);
        }
        env
    }

    /// Whether the simulated user is root.
    pub fn is_root(&self) -> bool {
        self.user == "root"
    }

    /// The working directory as a prompt shows it (`~` for home on Unix shells).
    pub fn display_path(&self, windows: bool) -> String {
        if windows {
            return self.dir.clone();
        }
        if self.dir == self.home_dir {
            return "~".to_string();
        }
        match self.dir.strip_prefix(&self.home_dir) {
            Some(rest) if rest.starts_with('/') => format!("~{rest}"),
            _ => self.dir.clone(),
        }
    }

    /// A copy with a different user; the home directory follows the user.
    pub fn with_user(&self, user: &str, windows: bool) -> Self {
        Self {
            user: user.to_string(),
            home_dir: home_for(user, windows),
            ..self.clone()
        }
    }

    /// A copy whose working directory is set from a prompt's displayed path.
    pub fn with_displayed_path(&self, path: &str, windows: bool) -> Self {
        Self {
            dir: self.resolve(path, windows),
            ..self.clone()
        }
    }

    /// The environment after `cd <arg>` (`arg` empty for a bare `cd`).
    ///
    /// `arg` is a single word with quoting already removed.
    pub fn cd(&self, arg: &str, windows: bool) -> Self {
        let arg = arg.trim();
        if arg == "-" {
            return match &self.previous_dir {
                Some(previous) => Self {
                    dir: previous.clone(),
                    previous_dir: Some(self.dir.clone()),
                    ..self.clone()
                },
                None => self.clone(),
            };
        }
        if arg.is_empty() && windows {
            // `cd` without arguments prints the directory on Windows shells.
            return self.clone();
        }

        let target = if arg.is_empty() {
            self.home_dir.clone()
        } else {
            self.resolve(arg, windows)
        };
        Self {
            previous_dir: Some(self.dir.clone()),
            dir: target,
            ..self.clone()
        }
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: &str, windows: bool) -> String {
        if windows {
            resolve_windows(&self.dir, &self.home_dir, path)
        } else {
            resolve_unix(&self.dir, &self.home_dir, path)
        }
    }
}

fn resolve_unix(cwd: &str, home: &str, path: &str) -> String {
    let joined = if path == "~" {
        home.to_string()
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{home}/{rest}")
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{cwd}/{path}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in joined.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

fn split_drive(path: &str) -> Option<(&str, &str)> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some((&path[..2], &path[2..]))
    } else {
        None
    }
}

fn resolve_windows(cwd: &str, home: &str, path: &str) -> String {
    let path = path.replace('/', "\\");
    let (cwd_drive, _) = split_drive(cwd).unwrap_or(("C:", cwd));

    let (drive, joined) = if path == "~" {
        return home.to_string();
    } else if let Some(rest) = path.strip_prefix("~\\") {
        let (drive, home_rest) = split_drive(home).unwrap_or((cwd_drive, home));
        (drive.to_string(), format!("{home_rest}\\{rest}"))
    } else if let Some((drive, rest)) = split_drive(&path) {
        (drive.to_uppercase(), rest.to_string())
    } else if path.starts_with('\\') {
        (cwd_drive.to_string(), path.clone())
    } else {
        let cwd_rest = split_drive(cwd).map(|(_, rest)| rest).unwrap_or(cwd);
        (cwd_drive.to_string(), format!("{cwd_rest}\\{path}"))
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in joined.split('\\') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("{drive}\\{}", parts.join("\\"))
}
