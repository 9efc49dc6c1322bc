//! Markdown preview of a filing tree. Same walk and field resolution as the
//! binary exporters; monospaced paragraphs (the caption) go into a fenced code
//! block so their columns stay aligned.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::errors::{AppError, AppResult};
use crate::document::tree::{child_path, validate, DocumentNode, Mark, MarkSet, ROOT_PATH};
use crate::render::fields::{inline_runs, InlineRun, OptionSets};

const FENCE: &str = "```";
const LIST_INDENT: &str = "   ";
const BLOCK_MARKERS: &[char] = &['#', '>', '-', '+', '=', '[', '|'];

static ORDERED_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,9})[.)]").unwrap());

pub fn export_markdown(tree: &DocumentNode, title: &str, options: &OptionSets) -> AppResult<Vec<u8>> {
    validate(tree)?;

    let mut writer = MarkdownWriter {
        options,
        out: String::new(),
        in_code: false,
    };
    if !title.trim().is_empty() {
        writer.out.push_str(&format!("---\ntitle: {}\n---\n\n", title.trim()));
    }
    writer.write_blocks(tree.children(), ROOT_PATH)?;
    writer.close_code();

    let out = writer.out.trim_end().to_string() + "\n";
    debug!(bytes = out.len(), "markdown written");
    Ok(out.into_bytes())
}

struct MarkdownWriter<'a> {
    options: &'a OptionSets,
    out: String,
    in_code: bool,
}

fn is_monospace(marks: &MarkSet) -> bool {
    marks.font_family().is_some_and(|family| {
        let lower = family.to_ascii_lowercase();
        lower.contains("courier") || lower.contains("mono")
    })
}

fn escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a marker at the start of a paragraph so the text stays a paragraph
/// instead of becoming a heading, quote, list or link definition.
fn escape_block_start(text: &str) -> String {
    let body = text.trim_start();
    let lead = &text[..text.len() - body.len()];
    if body.starts_with(BLOCK_MARKERS) {
        return format!("{lead}\\{body}");
    }
    if let Some(digits) = ORDERED_MARKER.captures(body).and_then(|caps| caps.get(1)) {
        let (number, rest) = body.split_at(digits.end());
        return format!("{lead}{number}\\{rest}");
    }
    text.to_string()
}

fn styled(run: &InlineRun) -> String {
    let core = run.text.trim();
    if core.is_empty() {
        return run.text.clone();
    }
    let leading = &run.text[..run.text.len() - run.text.trim_start().len()];
    let trailing = &run.text[run.text.trim_end().len()..];

    let mut body = escape_inline(core);
    if run.marks.underline() {
        body = format!("<u>{body}</u>");
    }
    if run.marks.italic() {
        body = format!("*{body}*");
    }
    if run.marks.bold() {
        body = format!("**{body}**");
    }
    format!("{leading}{body}{trailing}")
}

impl MarkdownWriter<'_> {
    fn close_code(&mut self) {
        if self.in_code {
            self.out.push_str(FENCE);
            self.out.push_str("\n\n");
            self.in_code = false;
        }
    }

    fn write_blocks(&mut self, nodes: &[DocumentNode], path: &str) -> AppResult<()> {
        for (idx, node) in nodes.iter().enumerate() {
            let at = child_path(path, idx);
            match node {
                DocumentNode::Paragraph { content, .. } => {
                    let runs = inline_runs(content, &at, self.options)?;
                    if !runs.is_empty() && runs.iter().all(|run| is_monospace(&run.marks)) {
                        if !self.in_code {
                            self.out.push_str(FENCE);
                            self.out.push('\n');
                            self.in_code = true;
                        }
                        let line: String = runs.iter().map(|run| run.text.as_str()).collect();
                        self.out.push_str(line.trim_end());
                        self.out.push('\n');
                        continue;
                    }
                    self.close_code();
                    let text = escape_block_start(&self.inline(&runs));
                    if !text.trim().is_empty() {
                        self.out.push_str(&text);
                        self.out.push_str("\n\n");
                    }
                }
                DocumentNode::Heading { attrs, content } => {
                    self.close_code();
                    let runs = inline_runs(content, &at, self.options)?;
                    // Headings are bold by style; drop the redundant mark.
                    let plain: Vec<InlineRun> = runs
                        .into_iter()
                        .map(|run| InlineRun {
                            text: run.text,
                            marks: MarkSet::new(
                                run.marks
                                    .iter()
                                    .filter(|mark| **mark != Mark::Bold)
                                    .cloned(),
                            ),
                        })
                        .collect();
                    let text = self.inline(&plain);
                    self.out.push_str(&"#".repeat(usize::from(attrs.level)));
                    self.out.push(' ');
                    self.out.push_str(text.trim());
                    self.out.push_str("\n\n");
                }
                DocumentNode::OrderedList { content } => {
                    self.close_code();
                    self.write_list(content, &at, 0)?;
                    self.out.push('\n');
                }
                DocumentNode::Doc { .. }
                | DocumentNode::ListItem { .. }
                | DocumentNode::Text { .. }
                | DocumentNode::DateField { .. }
                | DocumentNode::ChoiceField { .. } => {
                    return Err(AppError::UnexpectedNode {
                        kind: node.kind().to_string(),
                        path: at,
                    })
                }
            }
        }
        Ok(())
    }

    fn write_list(&mut self, items: &[DocumentNode], path: &str, depth: usize) -> AppResult<()> {
        let indent = LIST_INDENT.repeat(depth);
        for (idx, item) in items.iter().enumerate() {
            let item_path = child_path(path, idx);
            let DocumentNode::ListItem { content } = item else {
                return Err(AppError::UnexpectedNode {
                    kind: item.kind().to_string(),
                    path: item_path,
                });
            };
            let mut first = true;
            for (child_idx, child) in content.iter().enumerate() {
                let child_at = child_path(&item_path, child_idx);
                match child {
                    DocumentNode::Paragraph { content, .. } => {
                        let runs = inline_runs(content, &child_at, self.options)?;
                        let text = escape_block_start(&self.inline(&runs));
                        if first {
                            self.out.push_str(&format!("{indent}{}. {}\n", idx + 1, text.trim()));
                            first = false;
                        } else {
                            self.out.push_str(&format!("{indent}{LIST_INDENT}{}\n", text.trim()));
                        }
                    }
                    DocumentNode::OrderedList { content } => {
                        if first {
                            self.out.push_str(&format!("{indent}{}.\n", idx + 1));
                            first = false;
                        }
                        self.write_list(content, &child_at, depth + 1)?;
                    }
                    other => {
                        return Err(AppError::UnexpectedNode {
                            kind: other.kind().to_string(),
                            path: child_at,
                        })
                    }
                }
            }
            if first {
                self.out.push_str(&format!("{indent}{}.\n", idx + 1));
            }
        }
        Ok(())
    }

    fn inline(&self, runs: &[InlineRun]) -> String {
        runs.iter().map(styled).collect()
    }
}
