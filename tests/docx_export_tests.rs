use std::io::{Cursor, Read};

use pleadings_lib::core::types::lines_from_strs;
use pleadings_lib::document::tree::{Alignment, DateFormat, DocumentNode, Mark};
use pleadings_lib::parser::parse_filing;
use pleadings_lib::render::docx::export_docx;
use pleadings_lib::render::rules::{FormattingRules, LineNumbering, PageNumberPlacement};
use pleadings_lib::render::OptionSets;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

// ── Test Helpers ──────────────────────────────────────────────────────────────

fn filing_tree() -> DocumentNode {
    let parsed = parse_filing(&lines_from_strs(&[
        "STATE OF INDIANA IN THE MARION SUPERIOR COURT",
        "COUNTY OF MARION CAUSE NO.: 49D01-2301-CR-000123",
        "JOHN DOE,",
        "     Plaintiff,",
        "v.",
        "JANE ROE,",
        "     Defendant.",
        "MOTION TO DISMISS",
        "The defendant moves to dismiss & requests a hearing.",
    ]));
    let mut content = parsed.to_document().children().to_vec();
    content.push(DocumentNode::paragraph(vec![
        DocumentNode::text("Dated "),
        DocumentNode::date_field("2024-01-05", DateFormat::Long),
    ]));
    content.push(DocumentNode::ordered_list(vec![
        DocumentNode::list_item(vec![DocumentNode::paragraph(vec![DocumentNode::text("First ground.")])]),
        DocumentNode::list_item(vec![DocumentNode::paragraph(vec![DocumentNode::styled_text(
            "Second ground.",
            [Mark::Underline],
        )])]),
    ]));
    content.push(DocumentNode::aligned_paragraph(
        Alignment::Right,
        vec![DocumentNode::text("/s/ Jane Attorney")],
    ));
    DocumentNode::doc(content)
}

fn export(rules: &FormattingRules) -> Vec<u8> {
    export_docx(&filing_tree(), "Motion to Dismiss", rules, &OptionSets::new()).expect("docx export")
}

fn read_part(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip archive");
    let mut file = archive.by_name(name).ok()?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).expect("read part");
    Some(xml)
}

/// Every part whose name starts with `prefix`, such as `word/header`.
fn parts_named(bytes: &[u8], prefix: &str) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip archive");
    let names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(prefix))
        .map(str::to_string)
        .collect();
    names
        .iter()
        .filter_map(|name| read_part(bytes, name))
        .collect()
}

fn paragraph_texts(xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(xml).expect("xml");
    doc.descendants()
        .filter(|node| node.has_tag_name((W_NS, "p")))
        .map(|p| {
            p.descendants()
                .filter(|node| node.has_tag_name((W_NS, "t")))
                .filter_map(|t| t.text())
                .collect::<String>()
        })
        .collect()
}

fn w_attr(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute((W_NS, name)).map(str::to_string)
}

// ── Package ───────────────────────────────────────────────────────────────────

#[test]
fn package_contains_every_part() {
    let bytes = export(&FormattingRules::default());
    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/core.xml",
        "word/document.xml",
        "word/styles.xml",
        "word/_rels/document.xml.rels",
    ] {
        assert!(read_part(&bytes, part).is_some(), "missing part {part}");
    }
    assert!(!parts_named(&bytes, "word/header").is_empty());
    assert!(!parts_named(&bytes, "word/footer").is_empty());
    let core = read_part(&bytes, "docProps/core.xml").expect("core");
    assert_eq!(core.matches("<dc:title>").count(), 1);
    assert!(core.contains("<dc:title>Motion to Dismiss</dc:title>"));
}

#[test]
fn body_carries_caption_heading_fields_and_list() {
    let bytes = export(&FormattingRules::default());
    let xml = read_part(&bytes, "word/document.xml").expect("document");
    let texts = paragraph_texts(&xml);

    assert!(texts[0].starts_with("STATE OF INDIANA"), "caption first: {texts:?}");
    assert!(texts.iter().any(|t| t.trim_end().ends_with(")  IN THE MARION SUPERIOR COURT")));
    assert!(texts.iter().any(|t| t == "MOTION TO DISMISS"));
    assert!(texts
        .iter()
        .any(|t| t == "The defendant moves to dismiss & requests a hearing."));
    assert!(texts.iter().any(|t| t == "Dated January 5, 2024"));
    assert!(texts.iter().any(|t| t == "1. First ground."));
    assert!(texts.iter().any(|t| t == "2. Second ground."));
}

#[test]
fn heading_and_run_formatting() {
    let bytes = export(&FormattingRules::default());
    let xml = read_part(&bytes, "word/document.xml").expect("document");
    let doc = roxmltree::Document::parse(&xml).expect("xml");

    let heading = doc
        .descendants()
        .filter(|node| node.has_tag_name((W_NS, "p")))
        .find(|p| {
            p.descendants()
                .any(|n| n.has_tag_name((W_NS, "t")) && n.text() == Some("MOTION TO DISMISS"))
        })
        .expect("heading paragraph");
    let style = heading
        .descendants()
        .find(|n| n.has_tag_name((W_NS, "pStyle")))
        .and_then(|n| w_attr(n, "val"));
    assert_eq!(style.as_deref(), Some("Heading1"));
    assert!(heading.descendants().any(|n| n.has_tag_name((W_NS, "b"))));
    let jc = heading
        .descendants()
        .find(|n| n.has_tag_name((W_NS, "jc")))
        .and_then(|n| w_attr(n, "val"));
    assert_eq!(jc.as_deref(), Some("center"));

    for spacing in doc.descendants().filter(|n| n.has_tag_name((W_NS, "spacing"))) {
        assert_eq!(w_attr(spacing, "line").as_deref(), Some("480"));
        assert_eq!(w_attr(spacing, "lineRule").as_deref(), Some("auto"));
    }
    for size in doc.descendants().filter(|n| n.has_tag_name((W_NS, "sz"))) {
        assert_eq!(w_attr(size, "val").as_deref(), Some("24"));
    }

    let caption_font = doc
        .descendants()
        .find(|n| n.has_tag_name((W_NS, "rFonts")))
        .and_then(|n| w_attr(n, "ascii"));
    assert_eq!(caption_font.as_deref(), Some("Courier New"));

    assert!(doc
        .descendants()
        .any(|n| n.has_tag_name((W_NS, "u")) && w_attr(n, "val").as_deref() == Some("single")));
}

// ── Section properties ────────────────────────────────────────────────────────

#[test]
fn section_sets_page_geometry_and_line_numbers_once() {
    let bytes = export(&FormattingRules::default());
    let xml = read_part(&bytes, "word/document.xml").expect("document");
    let doc = roxmltree::Document::parse(&xml).expect("xml");

    let sections: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((W_NS, "sectPr")))
        .collect();
    assert_eq!(sections.len(), 1, "section properties appear once");
    let sect = sections[0];

    let child = |name: &str| {
        sect.children()
            .find(|n| n.has_tag_name((W_NS, name)))
            .unwrap_or_else(|| panic!("missing {name}"))
    };
    assert_eq!(w_attr(child("pgSz"), "w").as_deref(), Some("12240"));
    assert_eq!(w_attr(child("pgSz"), "h").as_deref(), Some("15840"));
    assert_eq!(w_attr(child("pgMar"), "top").as_deref(), Some("1440"));
    assert_eq!(w_attr(child("pgMar"), "left").as_deref(), Some("1440"));
    assert_eq!(w_attr(child("lnNumType"), "restart").as_deref(), Some("newPage"));
    assert_eq!(w_attr(child("lnNumType"), "countBy").as_deref(), Some("1"));
    child("titlePg");
    child("headerReference");

    let footers = parts_named(&bytes, "word/footer");
    assert!(footers
        .iter()
        .any(|footer| footer.contains("PAGE") && footer.contains(r#"w:xAlign="center""#)));
    let headers = parts_named(&bytes, "word/header");
    assert!(headers.iter().any(|header| header.contains("Motion to Dismiss")));
    assert!(
        headers.iter().any(|header| !header.contains("Motion to Dismiss")),
        "first page gets its own empty header"
    );
}

#[test]
fn continuous_numbering_without_header() {
    let rules = FormattingRules {
        line_numbers: LineNumbering {
            enabled: true,
            restart_each_page: false,
        },
        header: None,
        ..FormattingRules::default()
    };
    let bytes = export(&rules);
    let xml = read_part(&bytes, "word/document.xml").expect("document");

    assert!(xml.contains(r#"w:restart="continuous""#));
    assert!(!xml.contains("titlePg"));
    assert!(!xml.contains("headerReference"));
    assert!(parts_named(&bytes, "word/header").is_empty());
}

#[test]
fn line_numbers_follow_page_margins_in_section() {
    let xml = read_part(&export(&FormattingRules::default()), "word/document.xml").expect("document");
    let doc = roxmltree::Document::parse(&xml).expect("xml");
    let sect = doc
        .descendants()
        .find(|n| n.has_tag_name((W_NS, "sectPr")))
        .expect("section");
    let order: Vec<&str> = sect
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    let margin = order.iter().position(|name| *name == "pgMar").expect("pgMar");
    assert_eq!(order.get(margin + 1), Some(&"lnNumType"), "{order:?}");
}

#[test]
fn right_page_number_placement_reaches_footer() {
    let rules = FormattingRules {
        page_number: PageNumberPlacement::Right,
        ..FormattingRules::default()
    };
    let footers = parts_named(&export(&rules), "word/footer");
    assert!(footers.iter().all(|footer| footer.contains(r#"w:xAlign="right""#)));
}

#[test]
fn line_numbers_can_be_disabled() {
    let rules = FormattingRules {
        line_numbers: LineNumbering {
            enabled: false,
            restart_each_page: true,
        },
        ..FormattingRules::default()
    };
    let xml = read_part(&export(&rules), "word/document.xml").expect("document");
    assert!(!xml.contains("lnNumType"));
}

#[test]
fn invalid_date_fails_with_path() {
    let tree = DocumentNode::doc(vec![DocumentNode::paragraph(vec![DocumentNode::date_field(
        "next Tuesday",
        DateFormat::Short,
    )])]);
    let err = export_docx(&tree, "x", &FormattingRules::default(), &OptionSets::new())
        .expect_err("bad date");
    assert_eq!(err.code(), "INVALID_DATE");
    assert!(err.to_string().contains("$.content[0].content[0]"));
}
