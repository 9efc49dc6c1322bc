use tracing::trace;

use crate::core::types::RawLine;
use crate::document::tree::{Alignment, DocumentNode, Mark};
use crate::parser::classifier::{
    is_document_title_line, is_filing_stamp_noise, is_heading_line, is_signature_line,
    strip_line_number_margin,
};

/// Font carried by heading runs so they match the surrounding body text.
pub const BODY_FONT_FAMILY: &str = "Times New Roman";

/// Split body lines into headings and paragraphs.
///
/// `lines` is the slice from the caption's body start onward. Never returns an
/// empty list: degenerate input yields one empty paragraph.
pub fn segment_body(lines: &[RawLine]) -> Vec<DocumentNode> {
    let mut nodes = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for line in lines {
        let text = strip_line_number_margin(&line.text).trim();
        if is_filing_stamp_noise(&line.text) || is_filing_stamp_noise(text) {
            trace!(line = line.index, "dropped filing stamp");
            continue;
        }
        if text.is_empty() {
            flush_paragraph(&mut pending, &mut nodes);
            continue;
        }
        if is_heading_line(text) {
            flush_paragraph(&mut pending, &mut nodes);
            nodes.push(heading_node(text));
            continue;
        }
        if is_signature_line(text) {
            flush_paragraph(&mut pending, &mut nodes);
            nodes.push(DocumentNode::paragraph(vec![DocumentNode::text(text)]));
            continue;
        }
        pending.push(text.to_string());
    }
    flush_paragraph(&mut pending, &mut nodes);

    if nodes.is_empty() {
        nodes.push(DocumentNode::paragraph(Vec::new()));
    }
    nodes
}

fn heading_node(text: &str) -> DocumentNode {
    let level = if is_document_title_line(text) { 1 } else { 2 };
    DocumentNode::heading(
        level,
        Alignment::Center,
        vec![DocumentNode::styled_text(
            text,
            [
                Mark::Bold,
                Mark::FontFamily {
                    family: BODY_FONT_FAMILY.to_string(),
                },
            ],
        )],
    )
}

fn flush_paragraph(pending: &mut Vec<String>, nodes: &mut Vec<DocumentNode>) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending).join(" ");
    nodes.push(DocumentNode::paragraph(vec![DocumentNode::text(text)]));
}
