use codeblock_core::{
    CodeBlockIndex, DocumentText, Parameters, Settings, SettingsRevision, classify_line,
    scan_code_blocks,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAGMENTS: &[&str] = &[
    "hl:1", "hl:2-4", "hl:5-3", "hl:err", "hl:3|todo", "hlt:foo", "hlt:a:b", "hlt:2|x:y",
    "hlt::;", "imp:2", "impt:fixme", "warn:1,word", "ln:5", "ln:false", "ln:true", "fold",
    "unfold", "fold:\"Setup steps\"", "file:main.rs", "title='A B'", "exclude", "lsep:;",
    "tsep:~", "HL:7", "x=y", "\"stray", ":", "",
];

const LANGS: &[&str] = &["", "js", "python", "rust", "ad-note", "prompt:bash"];

fn random_info(rng: &mut StdRng) -> String {
    let mut info = "`".repeat(rng.gen_range(3..6));
    info.push_str(LANGS[rng.gen_range(0..LANGS.len())]);
    for _ in 0..rng.gen_range(0..6) {
        info.push(' ');
        info.push_str(FRAGMENTS[rng.gen_range(0..FRAGMENTS.len())]);
    }
    info
}

fn settings() -> Settings {
    Settings {
        alternate_colors: vec!["imp".to_string(), "warn".to_string()],
        exclude_langs: "ad-*".to_string(),
        ..Settings::default()
    }
}

#[test]
fn test_compile_is_idempotent_for_random_info_strings() {
    let settings = settings();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let info = random_info(&mut rng);
        let a = Parameters::parse(&info, &settings);
        let b = Parameters::parse(&info, &settings);
        assert_eq!(a, b, "info string {info:?}");

        let lines = a.default_lines_to_highlight.line_numbers.clone();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(lines, sorted, "line numbers of {info:?} not normalized");

        for n in 1..=6 {
            let text = "let foo = err; // TODO fixme a b x y";
            assert_eq!(classify_line(n, text, &a), classify_line(n, text, &b));
        }
    }
}

#[test]
fn test_index_refresh_is_idempotent() {
    let settings = settings();
    let mut rng = StdRng::seed_from_u64(7);
    let mut text = String::new();
    for i in 0..40 {
        if rng.gen_bool(0.3) {
            text.push_str(&random_info(&mut rng));
            text.push('\n');
            text.push_str(&format!("code line {i}\n"));
            text.push_str("```\n");
        } else {
            text.push_str(&format!("prose {i}\n"));
        }
    }

    let doc = DocumentText::new(&text);
    let mut index = CodeBlockIndex::new();
    let first = index.refresh(&doc, &settings, SettingsRevision::INITIAL).to_vec();
    let second = index.refresh(&doc, &settings, SettingsRevision::INITIAL).to_vec();
    assert_eq!(first, second);
    assert_eq!(first, scan_code_blocks(&doc, &settings));
}
