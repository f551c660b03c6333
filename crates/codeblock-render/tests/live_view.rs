use codeblock_core::{
    Decoration, DecorationKind, DecorationSet, DocumentError, DocumentProcessor, DocumentText,
    FADE_OUT_CLASS_PREFIX, FoldAction, FoldEvent, FoldState, LINE_HIGHLIGHT_CLASS,
    PromptDefinitionPatch, RenderRequest, SemiFoldSettings, Settings, SettingsRevision,
    StyledSegment, TextEdit, ThemeSettings, WidgetKind,
};
use codeblock_render::{LiveView, RenderError};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

fn whole(doc: &DocumentText, revision: SettingsRevision) -> RenderRequest {
    RenderRequest::new(revision, 0..doc.line_count())
}

fn widgets<'a>(set: &'a DecorationSet) -> impl Iterator<Item = (&'a Decoration, &'a WidgetKind)> {
    set.iter().filter_map(|d| match &d.kind {
        DecorationKind::Widget(w) => Some((d, w)),
        _ => None,
    })
}

fn replaced(set: &DecorationSet) -> Vec<(usize, usize)> {
    set.iter()
        .filter(|d| d.kind == DecorationKind::Replace)
        .map(|d| (d.range.start, d.range.end))
        .collect()
}

fn has_fade(set: &DecorationSet) -> bool {
    set.iter().any(|d| match &d.kind {
        DecorationKind::LineAttributes(classes) => {
            classes.iter().any(|c| c.starts_with(FADE_OUT_CLASS_PREFIX))
        }
        _ => false,
    })
}

#[test]
fn test_click_folds_and_notifies() {
    let doc = DocumentText::new("# Notes\n```py\na = 1\nb = 2\n```\n");
    let mut view = LiveView::new(Settings::default());
    let seen = Arc::new(Mutex::new(Vec::<FoldEvent>::new()));
    let sink = seen.clone();
    view.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    assert_eq!(view.toggle_fold_at_line(&doc, 3), Some(FoldState::Collapsed));
    let set = view
        .recompute(&doc, &whole(&doc, SettingsRevision::INITIAL))
        .unwrap()
        .clone();
    assert_eq!(replaced(&set), vec![(doc.line_to_char(2), doc.line_end_char(4))]);
    let header = widgets(&set)
        .find_map(|(_, w)| match w {
            WidgetKind::Header(h) => Some(h.clone()),
            _ => None,
        })
        .unwrap();
    assert!(header.folded);
    assert_eq!(header.text, "Collapsed Code");
    assert_eq!(header.display_language, "Python");

    assert_eq!(view.toggle_fold_at_line(&doc, 1), Some(FoldState::Expanded));
    let set = view
        .recompute(&doc, &whole(&doc, SettingsRevision::INITIAL))
        .unwrap();
    assert!(replaced(set).is_empty());

    // Outside any block.
    assert_eq!(view.toggle_fold_at_line(&doc, 0), None);

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].start_line, 1);
    assert_eq!(events[0].old_state, FoldState::Expanded);
    assert_eq!(events[0].new_state, FoldState::Collapsed);
    assert_eq!(events[0].cause, FoldAction::Click);
}

#[test]
fn test_fold_all_and_unfold_all_leave_no_fades() {
    let settings = Settings {
        semi_fold: SemiFoldSettings {
            enabled: true,
            visible_lines: 2,
            fade_out_line_count: 1,
            show_uncollapse_button: true,
        },
        ..Settings::default()
    };
    let doc = DocumentText::new("```txt\n1\n2\n3\n4\n5\n6\n```\n\n```txt\nshort\n```\n");
    let mut view = LiveView::new(settings);
    let request = whole(&doc, SettingsRevision::INITIAL);

    assert_eq!(view.fold_all(&doc), 2);
    let states: Vec<FoldState> = view.blocks().iter().map(|b| view.fold_state(b)).collect();
    assert_eq!(states, vec![FoldState::Faded, FoldState::Collapsed]);

    let set = view.recompute(&doc, &request).unwrap().clone();
    assert!(has_fade(&set));
    assert!(widgets(&set).any(|(_, w)| *w == WidgetKind::Uncollapse));

    assert_eq!(view.fold_all(&doc), 0);
    assert_eq!(view.unfold_all(&doc), 2);
    let set = view.recompute(&doc, &request).unwrap().clone();
    assert!(!has_fade(&set));
    assert!(replaced(&set).is_empty());
    assert!(!widgets(&set).any(|(_, w)| *w == WidgetKind::Uncollapse));
    // Expanded semi-foldable block offers the collapse button.
    assert_eq!(
        widgets(&set)
            .filter(|(_, w)| **w == WidgetKind::Collapse)
            .count(),
        1
    );

    view.fold_all(&doc);
    assert_eq!(view.uncollapse_at_line(&doc, 2), Some(FoldState::Expanded));
    // Uncollapse does nothing to a fully collapsed block.
    assert_eq!(view.uncollapse_at_line(&doc, 10), Some(FoldState::Collapsed));
}

#[test]
fn test_fold_state_survives_edits() {
    let mut doc = DocumentText::new("intro\n```rust\nfn a() {}\n```\n");
    let mut view = LiveView::new(Settings::default());
    view.toggle_fold_at_line(&doc, 2);

    view.apply_edit(&mut doc, &TextEdit::insert(0, "more text\n"))
        .unwrap();
    view.recompute(&doc, &whole(&doc, SettingsRevision::INITIAL))
        .unwrap();
    assert_eq!(view.blocks()[0].start_line, 2);
    assert_eq!(view.fold_state(&view.blocks()[0]), FoldState::Collapsed);

    let inside = doc.line_to_char(3);
    view.apply_edit(&mut doc, &TextEdit::insert(inside, "// doc\n"))
        .unwrap();
    view.recompute(&doc, &whole(&doc, SettingsRevision::INITIAL))
        .unwrap();
    assert_eq!(view.blocks()[0].total_lines(), 4);
    assert_eq!(view.fold_state(&view.blocks()[0]), FoldState::Collapsed);

    let before = doc.text();
    let err = view
        .apply_edit(&mut doc, &TextEdit::delete(1000, "zz"))
        .unwrap_err();
    assert!(matches!(err, RenderError::Edit(DocumentError::OutOfRange { .. })));
    assert_eq!(doc.text(), before);
}

#[test]
fn test_settings_revision_drives_recompile() {
    let doc = DocumentText::new("```js imp:1\nlet x = 1;\n```\n");
    let mut view = LiveView::new(Settings::default());
    let old = whole(&doc, SettingsRevision::INITIAL);
    let set = view.recompute(&doc, &old).unwrap().clone();
    assert!(!set.iter().any(|d| matches!(d.kind, DecorationKind::LineAttributes(_))));

    let settings = Settings {
        alternate_colors: vec!["imp".into()],
        theme: ThemeSettings {
            colors: [("imp".to_string(), "#ff0000".to_string())]
                .into_iter()
                .collect(),
        },
        ..Settings::default()
    };
    let next = SettingsRevision::INITIAL.next();
    assert!(view.update_settings(settings, next).is_empty());

    assert!(matches!(
        view.recompute(&doc, &old),
        Err(RenderError::RevisionMismatch { .. })
    ));
    let set = view.recompute(&doc, &whole(&doc, next)).unwrap();
    assert!(set.iter().any(|d| d.kind
        == DecorationKind::LineAttributes(vec![format!("{LINE_HIGHLIGHT_CLASS}-imp")])));
}

#[test]
fn test_settings_update_drops_removed_prompts() {
    let mut settings = Settings::default();
    settings.prompts.overrides.insert(
        "bash".into(),
        PromptDefinitionPatch {
            default_user: Some("alice".into()),
            ..PromptDefinitionPatch::default()
        },
    );
    settings.prompts.custom.insert(
        "mine".into(),
        PromptDefinitionPatch {
            base_prompt: Some("{path}> ".into()),
            parse_prompt_regex: Some(r">\s".into()),
            ..PromptDefinitionPatch::default()
        },
    );
    let mut view = LiveView::new(settings);
    assert_eq!(view.prompts().get("bash").unwrap().definition.default_user, "alice");
    assert!(view.prompts().get("mine").is_some());

    let next = SettingsRevision::INITIAL.next();
    assert!(view.update_settings(Settings::default(), next).is_empty());
    assert_eq!(view.prompts().get("bash").unwrap().definition.default_user, "user");
    assert!(view.prompts().get("mine").is_none());
}

#[test]
fn test_prompt_block_decorations() {
    let doc = DocumentText::new("```prompt:bash\n$ cd /var/www\n$ pwd\n```\n");
    let mut view = LiveView::new(Settings::default());
    let set = view
        .process(&doc, &whole(&doc, SettingsRevision::INITIAL))
        .unwrap();

    let first = doc.line_to_char(1);
    assert!(replaced(&set).contains(&(first, first + 2)));
    let prompt = widgets(&set)
        .find_map(|(d, w)| match w {
            WidgetKind::Prompt(segments) if d.range.start == first => Some(segments.clone()),
            _ => None,
        })
        .unwrap();
    let text: String = prompt.iter().map(|s: &StyledSegment| s.text.as_str()).collect();
    assert_eq!(text, "user@localhost:~$ ");

    let output = widgets(&set)
        .find_map(|(d, w)| match w {
            WidgetKind::PromptOutput(o) => Some((d.range.start, o.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(output, (doc.line_end_char(2), "/var/www".to_string()));
}

#[test]
fn test_viewport_limits_line_decorations() {
    let doc = DocumentText::new("```js hl:1-3\na\nb\nc\n```\n");
    let mut view = LiveView::new(Settings::default());
    let request = RenderRequest::new(SettingsRevision::INITIAL, 2..3);
    let set = view.recompute(&doc, &request).unwrap();
    let lines: Vec<usize> = set
        .iter()
        .filter(|d| matches!(d.kind, DecorationKind::LineAttributes(_)))
        .map(|d| d.range.start)
        .collect();
    assert_eq!(lines, vec![doc.line_to_char(2)]);
}

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_failed_pass_is_logged() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .without_time()
        .with_writer(BufferWriter {
            inner: buffer.clone(),
        })
        .finish();

    let doc = DocumentText::new("text\n");
    let mut view = LiveView::new(Settings::default());
    with_default(subscriber, || {
        let request = RenderRequest::new(SettingsRevision::INITIAL, 10..20);
        assert!(view.recompute(&doc, &request).is_err());
    });

    let log = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(log.contains("WARN"));
    assert!(log.contains("keeping previous decorations"));
}
