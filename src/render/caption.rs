use crate::core::types::{CaptionData, Party};
use crate::document::tree::{DocumentNode, Mark};

/// Width of the left caption column, up to the `)` marker.
pub const CAPTION_COLUMN_WIDTH: usize = 36;
pub const CAPTION_FONT_FAMILY: &str = "Courier New";

const ROLE_INDENT: &str = "          ";

fn caption_line(left: &str, right: &str) -> String {
    let mut line = format!("{left:<width$})", width = CAPTION_COLUMN_WIDTH);
    if !right.is_empty() {
        line.push_str("  ");
        line.push_str(right);
    }
    line
}

fn centered(text: &str) -> String {
    let pad = CAPTION_COLUMN_WIDTH.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

fn name_line(party: &Party) -> String {
    caption_line(&format!("{},", party.name), "")
}

/// `Plaintiff,` or `Defendants.` under a side's names.
fn role_line(side: &[Party], close: char) -> Option<String> {
    let role = &side.last()?.role;
    let suffix = if side.len() > 1 { "s" } else { "" };
    Some(caption_line(&format!("{ROLE_INDENT}{role}{suffix}{close}"), ""))
}

/// Two-column pleading caption, one string per line.
pub fn render_caption(caption: &CaptionData) -> Vec<String> {
    let mut lines = Vec::new();

    let court = if caption.court.is_empty() {
        String::new()
    } else {
        format!("IN THE {}", caption.court.to_uppercase())
    };
    lines.push(caption_line(&format!("STATE OF {}", caption.state), &court));

    if caption.has_venue_mark {
        let venue = match caption.division.as_deref() {
            Some(division) if !division.is_empty() => format!("SS: {division}"),
            _ => "SS:".to_string(),
        };
        lines.push(caption_line("", &venue));
    }

    let cause = if caption.cause_number.is_empty() {
        String::new()
    } else {
        format!("CAUSE NO.: {}", caption.cause_number)
    };
    lines.push(caption_line(&format!("COUNTY OF {}", caption.county), &cause));
    lines.push(caption_line("", ""));

    let plaintiffs = caption.plaintiffs();
    if let Some(role) = role_line(plaintiffs, ',') {
        lines.extend(plaintiffs.iter().map(name_line));
        lines.push(role);
        lines.push(caption_line("", ""));
        lines.push(caption_line("", ""));
        lines.push(caption_line(&centered("v."), ""));
        lines.push(caption_line("", ""));
    }

    let defendants = caption.defendants();
    lines.extend(defendants.iter().map(name_line));
    lines.extend(role_line(defendants, '.'));

    lines
}

/// Rendered caption as monospaced paragraphs, ready to sit ahead of the body.
pub fn caption_block(caption: &CaptionData) -> Vec<DocumentNode> {
    render_caption(caption)
        .into_iter()
        .map(|line| {
            DocumentNode::paragraph(vec![DocumentNode::styled_text(
                line,
                [Mark::FontFamily {
                    family: CAPTION_FONT_FAMILY.to_string(),
                }],
            )])
        })
        .collect()
}
