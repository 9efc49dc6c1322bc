use pleadings_lib::core::types::lines_from_strs;
use pleadings_lib::document::tree::{Alignment, DocumentNode, Mark, NodeKind};
use pleadings_lib::parser::body::BODY_FONT_FAMILY;
use pleadings_lib::parser::{parse_filing, segment_body};

fn heading_parts(node: &DocumentNode) -> (u8, Option<Alignment>, String) {
    match node {
        DocumentNode::Heading { attrs, .. } => (attrs.level, attrs.text_align, node.literal_text()),
        other => panic!("expected heading, got {:?}", other.kind()),
    }
}

fn paragraph_text(node: &DocumentNode) -> String {
    assert_eq!(node.kind(), NodeKind::Paragraph, "expected paragraph");
    node.literal_text()
}

#[test]
fn segments_headings_paragraphs_and_signatures() {
    let lines = lines_from_strs(&[
        "MOTION TO DISMISS",
        "",
        "1   The defendant, by counsel, moves",
        "2   the court to dismiss the charge.",
        "Filed: 1/5/2024 3:15 PM",
        "I. BACKGROUND",
        "The facts are simple.",
        "/s/ Jane Attorney",
        "Jane Attorney, #12345-49",
        "",
        "CERTIFICATE OF SERVICE",
    ]);
    let nodes = segment_body(&lines);

    assert_eq!(nodes.len(), 7, "unexpected nodes: {nodes:#?}");
    assert_eq!(
        heading_parts(&nodes[0]),
        (1, Some(Alignment::Center), "MOTION TO DISMISS".to_string())
    );
    assert_eq!(
        paragraph_text(&nodes[1]),
        "The defendant, by counsel, moves the court to dismiss the charge."
    );
    assert_eq!(
        heading_parts(&nodes[2]),
        (2, Some(Alignment::Center), "I. BACKGROUND".to_string())
    );
    assert_eq!(paragraph_text(&nodes[3]), "The facts are simple.");
    assert_eq!(paragraph_text(&nodes[4]), "/s/ Jane Attorney");
    assert_eq!(paragraph_text(&nodes[5]), "Jane Attorney, #12345-49");
    assert_eq!(heading_parts(&nodes[6]).0, 2);
}

#[test]
fn heading_runs_are_bold_in_body_font() {
    let nodes = segment_body(&lines_from_strs(&["STATEMENT OF FACTS"]));
    let DocumentNode::Heading { content, .. } = &nodes[0] else {
        panic!("expected heading");
    };
    let DocumentNode::Text { marks, .. } = &content[0] else {
        panic!("expected text run");
    };
    assert!(marks.bold());
    assert_eq!(marks.font_family(), Some(BODY_FONT_FAMILY));
    assert!(marks.iter().all(|mark| matches!(mark, Mark::Bold | Mark::FontFamily { .. })));
}

#[test]
fn stamps_never_break_a_paragraph() {
    let nodes = segment_body(&lines_from_strs(&[
        "The hearing was continued",
        "Page 2 of 4",
        "to a later date.",
    ]));
    assert_eq!(nodes.len(), 1);
    assert_eq!(paragraph_text(&nodes[0]), "The hearing was continued to a later date.");
}

#[test]
fn margin_numbered_stamps_are_dropped_too() {
    let nodes = segment_body(&lines_from_strs(&[
        "11  The hearing was continued",
        "12   Page 3",
        "13  Filed: 1/5/2024 3:15 PM",
        "14  to a later date.",
    ]));
    assert_eq!(nodes.len(), 1);
    assert_eq!(paragraph_text(&nodes[0]), "The hearing was continued to a later date.");
}

#[test]
fn blank_and_noise_only_input_yields_one_empty_paragraph() {
    let nodes = segment_body(&lines_from_strs(&["", "Filed: 1/5/2024", "   ", "Page 1"]));
    assert_eq!(nodes, vec![DocumentNode::paragraph(Vec::new())]);
}

#[test]
fn parse_filing_segments_from_body_start() {
    let lines = lines_from_strs(&[
        "STATE OF INDIANA IN THE MARION SUPERIOR COURT",
        "COUNTY OF MARION CAUSE NO.: 49D01-2301-CR-000123",
        "JOHN DOE,",
        "     Plaintiff,",
        "v.",
        "JANE ROE,",
        "     Defendant.",
        "MOTION TO DISMISS",
        "The defendant moves to dismiss.",
    ]);
    let parsed = parse_filing(&lines);

    assert!(parsed.caption.is_some());
    assert_eq!(parsed.body_start, 7);
    assert_eq!(parsed.body.kind(), NodeKind::Doc);
    assert_eq!(parsed.body.children().len(), 2);
    assert_eq!(parsed.body.count_kind(NodeKind::Heading), 1);
    assert_eq!(parsed.source_checksum.len(), 64);

    let full = parsed.to_document();
    assert!(
        full.children().len() > parsed.body.children().len(),
        "caption block should be prepended"
    );
    assert!(full.children()[0].literal_text().starts_with("STATE OF INDIANA"));
}

#[test]
fn parse_filing_without_caption_keeps_every_line() {
    let lines = lines_from_strs(&["The defendant moves to dismiss.", "", "So ordered."]);
    let parsed = parse_filing(&lines);
    assert!(parsed.caption.is_none());
    assert_eq!(parsed.body_start, 0);
    assert_eq!(parsed.body.children().len(), 2);
    assert_eq!(parsed.to_document(), parsed.body);
}

#[test]
fn checksum_depends_only_on_line_text() {
    let a = parse_filing(&lines_from_strs(&["one", "two"]));
    let b = parse_filing(&lines_from_strs(&["one", "two"]));
    let c = parse_filing(&lines_from_strs(&["one", "two", ""]));
    assert_eq!(a.source_checksum, b.source_checksum);
    assert_ne!(a.source_checksum, c.source_checksum);
}
