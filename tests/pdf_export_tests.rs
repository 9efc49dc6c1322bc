use lopdf::content::Content;
use lopdf::Object;

use pleadings_lib::core::types::lines_from_strs;
use pleadings_lib::document::tree::{Alignment, DocumentNode, Mark};
use pleadings_lib::parser::parse_filing;
use pleadings_lib::render::pdf::{export_pdf, layout, StandardFont};
use pleadings_lib::render::rules::{FormattingRules, HeaderRule, LineNumbering};
use pleadings_lib::render::OptionSets;

// ── Test Helpers ──────────────────────────────────────────────────────────────

/// Forty one-line paragraphs: more than one page at the default double spacing.
fn long_tree() -> DocumentNode {
    let content = (1..=40)
        .map(|n| DocumentNode::paragraph(vec![DocumentNode::text(format!("Paragraph {n}."))]))
        .collect();
    DocumentNode::doc(content)
}

fn shown_strings(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = lopdf::Document::load_mem(bytes).expect("load pdf");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let raw = doc.get_page_content(*page_id).expect("page content");
            let content = Content::decode(&raw).expect("decode content");
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

// ── Layout ────────────────────────────────────────────────────────────────────

#[test]
fn header_is_skipped_on_the_first_page_only() {
    let pages = layout(&long_tree(), "Motion to Dismiss", &FormattingRules::default(), &OptionSets::new())
        .expect("layout");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].header, None);
    assert_eq!(pages[1].header.as_deref(), Some("Motion to Dismiss"));
    assert_eq!(pages[0].footer, "1");
    assert_eq!(pages[1].footer, "2");
}

#[test]
fn header_on_every_page_when_configured() {
    let rules = FormattingRules {
        header: Some(HeaderRule {
            text: Some("STATE v. ROE".to_string()),
            skip_first_page: false,
        }),
        ..FormattingRules::default()
    };
    let pages = layout(&long_tree(), "ignored", &rules, &OptionSets::new()).expect("layout");
    assert!(pages.iter().all(|page| page.header.as_deref() == Some("STATE v. ROE")));
}

#[test]
fn line_numbers_restart_on_each_page() {
    let pages = layout(&long_tree(), "t", &FormattingRules::default(), &OptionSets::new())
        .expect("layout");
    let first: Vec<_> = pages[0].lines.iter().map(|line| line.line_number).collect();
    let second: Vec<_> = pages[1].lines.iter().map(|line| line.line_number).collect();
    assert_eq!(first[0], Some(1));
    assert_eq!(second[0], Some(1));
    assert_eq!(first.len() + second.len(), 40);
    assert_eq!(*first.last().expect("lines"), Some(first.len() as u32));
}

#[test]
fn continuous_numbering_carries_across_pages() {
    let rules = FormattingRules {
        line_numbers: LineNumbering {
            enabled: true,
            restart_each_page: false,
        },
        ..FormattingRules::default()
    };
    let pages = layout(&long_tree(), "t", &rules, &OptionSets::new()).expect("layout");
    let carried = pages[0].lines.len() as u32 + 1;
    assert_eq!(pages[1].lines[0].line_number, Some(carried));
}

#[test]
fn lines_stay_inside_the_margins() {
    let rules = FormattingRules::default();
    let long = "The defendant respectfully moves the court to dismiss the charging information. ".repeat(8);
    let tree = DocumentNode::doc(vec![DocumentNode::aligned_paragraph(
        Alignment::Justify,
        vec![DocumentNode::text(long)],
    )]);
    let pages = layout(&tree, "t", &rules, &OptionSets::new()).expect("layout");
    let left = rules.margins.left_in * 72.0;
    let right = rules.page_width_pt() - rules.margins.right_in * 72.0;
    let bottom = rules.margins.bottom_in * 72.0;

    assert!(pages[0].lines.len() > 1, "paragraph should wrap");
    for line in pages.iter().flat_map(|page| &page.lines) {
        assert!(line.y >= bottom);
        for span in &line.spans {
            assert!(span.x >= left - 0.01);
            assert!(span.x + span.width <= right + 0.01, "span overflows: {:?}", span.text);
        }
    }
}

#[test]
fn wide_uppercase_heading_wraps_inside_the_margins() {
    let rules = FormattingRules::default();
    let heading = "MEMORANDUM WITH WIDE WORDS WWWW MMMM WHEREWITHAL ".repeat(4);
    let tree = DocumentNode::doc(vec![DocumentNode::heading(
        1,
        Alignment::Center,
        vec![DocumentNode::styled_text(heading.trim(), [Mark::Bold])],
    )]);
    let pages = layout(&tree, "t", &rules, &OptionSets::new()).expect("layout");
    let left = rules.margins.left_in * 72.0;
    let right = rules.page_width_pt() - rules.margins.right_in * 72.0;

    assert!(pages[0].lines.len() > 1, "heading should wrap");
    for span in pages.iter().flat_map(|page| &page.lines).flat_map(|line| &line.spans) {
        assert_eq!(span.font, StandardFont::TimesBold);
        assert!(span.x >= left - 0.01);
        assert!(span.x + span.width <= right + 0.01, "span overflows: {:?}", span.text);
    }
}

#[test]
fn text_width_uses_published_font_metrics() {
    assert_eq!(StandardFont::TimesRoman.text_width("W", 12.0), 944.0 * 12.0 / 1000.0);
    assert_eq!(StandardFont::TimesBold.text_width("W", 1000.0), 1000.0);
    assert_eq!(StandardFont::HelveticaBold.text_width("Wi", 1000.0), 944.0 + 278.0);
    assert_eq!(StandardFont::CourierBold.text_width("Wi", 10.0), 12.0);
}

#[test]
fn caption_lines_stay_on_one_printed_line_in_courier() {
    let parsed = parse_filing(&lines_from_strs(&[
        "STATE OF INDIANA IN THE MARION SUPERIOR COURT",
        "COUNTY OF MARION CAUSE NO.: 49D01-2301-CR-000123",
        "JOHN DOE,",
        "     Plaintiff,",
        "v.",
        "JANE ROE,",
        "     Defendant.",
        "MOTION TO DISMISS",
    ]));
    let caption_len = parsed.to_document().children().len() - parsed.body.children().len();
    let pages = layout(&parsed.to_document(), "t", &FormattingRules::default(), &OptionSets::new())
        .expect("layout");

    let caption_lines: Vec<_> = pages[0].lines.iter().take(caption_len).collect();
    for line in &caption_lines {
        assert!(line.text().contains(')'), "wrapped caption line: {:?}", line.text());
        for span in &line.spans {
            assert!(span.font.is_monospace());
            assert_eq!(span.font, StandardFont::Courier);
            assert!(span.size <= 12.0);
        }
    }
    let heading = &pages[0].lines[caption_len];
    assert_eq!(heading.text(), "MOTION TO DISMISS");
    assert_eq!(heading.spans[0].font, StandardFont::TimesBold);
}

// ── Encoding ──────────────────────────────────────────────────────────────────

#[test]
fn encoded_pages_match_layout() {
    let rules = FormattingRules::default();
    let bytes = export_pdf(&long_tree(), "Motion to Dismiss", &rules, &OptionSets::new()).expect("pdf");
    assert!(bytes.starts_with(b"%PDF-1.5"));

    let pages = shown_strings(&bytes);
    assert_eq!(pages.len(), 2);
    assert!(pages[0].iter().any(|s| s == "Paragraph 1."));
    assert!(!pages[0].iter().any(|s| s == "Motion to Dismiss"));
    assert!(pages[1].iter().any(|s| s == "Motion to Dismiss"));
    assert!(pages[1].iter().any(|s| s == "Paragraph 40."));
    // Footer page number and the first line number both print as "1".
    assert!(pages[0].iter().filter(|s| *s == "1").count() >= 2);
    assert!(pages[1].iter().any(|s| s == "2"));
}

#[test]
fn info_dictionary_carries_the_title() {
    let bytes = export_pdf(&long_tree(), "Motion to Dismiss", &FormattingRules::default(), &OptionSets::new())
        .expect("pdf");
    let doc = lopdf::Document::load_mem(&bytes).expect("load pdf");
    let info_id = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .expect("info reference");
    let info = doc
        .get_object(info_id)
        .and_then(Object::as_dict)
        .expect("info dictionary");
    match info.get(b"Title").expect("title") {
        Object::String(bytes, _) => assert_eq!(bytes.as_slice(), b"Motion to Dismiss"),
        other => panic!("unexpected title object: {other:?}"),
    }
}

#[test]
fn disabled_line_numbers_print_nothing_in_the_margin() {
    let rules = FormattingRules {
        line_numbers: LineNumbering {
            enabled: false,
            restart_each_page: true,
        },
        header: None,
        ..FormattingRules::default()
    };
    let tree = DocumentNode::doc(vec![DocumentNode::paragraph(vec![DocumentNode::text("Only line.")])]);
    let pages = layout(&tree, "t", &rules, &OptionSets::new()).expect("layout");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].lines[0].line_number, None);

    let shown = shown_strings(&export_pdf(&tree, "t", &rules, &OptionSets::new()).expect("pdf"));
    assert_eq!(shown[0], vec!["Only line.".to_string(), "1".to_string()]);
}
