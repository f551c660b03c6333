use codeblock_core::{Parameters, PromptDefinitionPatch, Settings};
use codeblock_prompt::{
    PromptContext, PromptData, PromptDefinitionSet, PromptError, segments_text, simulate,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn outputs(data: &PromptData) -> Vec<String> {
    match data {
        PromptData::Prompt { outputs, .. } => outputs.clone(),
        _ => Vec::new(),
    }
}

#[test]
fn test_environment_threads_through_cd_and_pwd() {
    let mut set = PromptDefinitionSet::with_builtins();
    let patch = PromptDefinitionPatch {
        default_host: Some("host".into()),
        ..PromptDefinitionPatch::default()
    };
    let bash = set.apply_override("bash", &patch).unwrap();
    let ctx = PromptContext::new(&bash, true);

    let lines = ["$ cd /var/www", "$ pwd", "$ cd ..", "$ pwd"];
    let (data, env) = simulate(&lines, &ctx);

    match &data[0] {
        PromptData::Prompt { segments, .. } => {
            assert_eq!(segments_text(segments), "user@host:~$ ")
        }
        other => panic!("expected prompt, got {other:?}"),
    }
    assert_eq!(outputs(&data[1]), vec!["/var/www".to_string()]);
    assert_eq!(outputs(&data[3]), vec!["/var".to_string()]);
    assert_eq!(env.dir, "/var");
    assert_eq!(env.previous_dir.as_deref(), Some("/var/www"));
}

#[test]
fn test_transcript_with_output_lines() {
    let set = PromptDefinitionSet::with_builtins();
    let settings = Settings::default();
    let parameters = Parameters::parse("```prompt:bash", &settings);
    let lines = [
        "user@box:~/src (main)$ git status",
        "On branch main",
        "nothing to commit, working tree clean",
        "$ whoami",
    ];

    assert_eq!(
        set.compute_prompt_lines(&parameters, &lines),
        BTreeSet::from([1, 4])
    );

    let bash = set.get("bash").unwrap();
    let (data, env) = simulate(&lines, &PromptContext::new(&bash, set.root_styling()));
    assert_eq!(data[1], PromptData::Output);
    assert_eq!(data[2], PromptData::Output);
    assert_eq!(env.branch, "main");
    assert_eq!(env.host, "box");
    assert_eq!(env.dir, "/home/user/src");
    match &data[3] {
        PromptData::Prompt {
            segments, outputs, ..
        } => {
            assert_eq!(segments_text(segments), "user@box:~/src (main)$ ");
            assert_eq!(outputs, &vec!["user".to_string()]);
        }
        other => panic!("expected prompt, got {other:?}"),
    }
}

#[test]
fn test_non_prompt_block_has_no_prompt_lines() {
    let set = PromptDefinitionSet::with_builtins();
    let parameters = Parameters::parse("```sh", &Settings::default());
    assert!(set.compute_prompt_lines(&parameters, &["$ ls"]).is_empty());

    let unknown = Parameters::parse("```prompt:tcsh", &Settings::default());
    assert!(set.compute_prompt_lines(&unknown, &["$ ls"]).is_empty());
}

#[test]
fn test_load_custom_prompts_from_yaml() {
    let mut set = PromptDefinitionSet::with_builtins();
    let loaded = set.load_from_path(fixture("custom_prompts.yaml")).unwrap();
    assert_eq!(loaded, vec!["mysql".to_string(), "nushell".to_string()]);

    let mysql = set.get("mysql").unwrap();
    assert_eq!(mysql.definition.default_user, "dba");
    let ctx = PromptContext::new(&mysql, true);
    let (data, env) = simulate(&["mysql [shop]> select 1;", "+---+"], &ctx);
    assert!(data[0].is_prompt());
    assert_eq!(data[1], PromptData::Output);
    assert_eq!(env.db, "shop");

    let nu = set.get("nushell").unwrap();
    assert_eq!(
        nu.definition.highlight_groups.get("path").map(String::as_str),
        Some("nu-path")
    );
}

#[test]
fn test_broken_yaml_definition_is_reported() {
    let mut set = PromptDefinitionSet::with_builtins();
    let err = set.load_from_path(fixture("broken_prompt.yaml")).unwrap_err();
    assert!(matches!(err, PromptError::InvalidRegex { ref name, .. } if name == "broken"));
    assert!(set.get("broken").is_none());

    assert!(matches!(
        set.load_from_str("- not\n- a\n- map\n"),
        Err(PromptError::Yaml(_))
    ));
}
