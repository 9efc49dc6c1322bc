//! Editable-format exporter built on `docx_rs`.
//!
//! Page geometry, margins, header, footer and title page are set once on the
//! section. Every paragraph carries the configured line spacing. Line
//! numbering and the core title are patched into the packed parts afterwards.

use std::io::{Cursor, Read, Write};

use docx_rs::{
    AlignmentType, Docx, Footer, Header, LineSpacing, LineSpacingType, PageMargin, PageNum,
    Paragraph, Run, RunFonts, Style, StyleType,
};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::errors::{AppError, AppResult};
use crate::document::tree::{child_path, validate, Alignment, DocumentNode, ROOT_PATH};
use crate::render::fields::{inline_runs, InlineRun, OptionSets};
use crate::render::rules::{twips, FormattingRules, LineNumbering, PageNumberPlacement};

const LIST_INDENT_TWIPS: i64 = 720;
const HEADING_LEVELS: u8 = 3;

const DOCUMENT_PART: &str = "word/document.xml";
const CORE_PART: &str = "docProps/core.xml";

pub fn export_docx(
    tree: &DocumentNode,
    title: &str,
    rules: &FormattingRules,
    options: &OptionSets,
) -> AppResult<Vec<u8>> {
    validate(tree)?;
    rules.validate()?;

    let mut body = BodyWriter::new(rules, options);
    body.write_blocks(tree.children(), ROOT_PATH, 0)?;
    debug!(paragraphs = body.paragraphs.len(), "docx body written");

    let header = rules.header_text(title);
    let docx = body
        .paragraphs
        .into_iter()
        .fold(section(rules, header.as_deref()), Docx::add_paragraph);

    let mut packed = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut packed)
        .map_err(|err| AppError::Export(format!("docx package: {err}")))?;
    finish_package(packed.get_ref(), title, rules)
}

// ── Section ───────────────────────────────────────────────────────────────────

fn section(rules: &FormattingRules, header: Option<&str>) -> Docx {
    let m = &rules.margins;
    let mut docx = Docx::new()
        .default_fonts(run_fonts(&rules.font_family))
        .default_size(rules.half_points() as usize)
        .page_size(twips(rules.page_width_in) as _, twips(rules.page_height_in) as _)
        .page_margin(
            PageMargin::new()
                .top(twips(m.top_in) as _)
                .right(twips(m.right_in) as _)
                .bottom(twips(m.bottom_in) as _)
                .left(twips(m.left_in) as _)
                .header(twips(m.top_in / 2.0) as _)
                .footer(twips(m.bottom_in / 2.0) as _),
        )
        .footer(page_number_footer(rules.page_number));

    for level in 1..=HEADING_LEVELS {
        docx = docx.add_style(
            Style::new(format!("Heading{level}"), StyleType::Paragraph)
                .name(format!("heading {level}"))
                .bold(),
        );
    }

    if let Some(text) = header {
        docx = docx.header(Header::new().add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(run(text, None, rules)),
        ));
        if rules.header_skips_first_page() {
            docx = docx
                .first_header(Header::new().add_paragraph(Paragraph::new()))
                .first_footer(page_number_footer(rules.page_number));
        }
    }
    docx
}

fn page_number_footer(placement: PageNumberPlacement) -> Footer {
    let x_align = match placement {
        PageNumberPlacement::Left => "left",
        PageNumberPlacement::Center => "center",
        PageNumberPlacement::Right => "right",
    };
    Footer::new().add_paragraph(
        Paragraph::new()
            .add_page_num(PageNum::new())
            .wrap("none")
            .v_anchor("text")
            .h_anchor("margin")
            .x_align(x_align),
    )
}

fn run_fonts(family: &str) -> RunFonts {
    RunFonts::new().ascii(family).hi_ansi(family).cs(family)
}

fn run(text: &str, marked: Option<&InlineRun>, rules: &FormattingRules) -> Run {
    let family = marked
        .and_then(|run| run.marks.font_family())
        .unwrap_or(rules.font_family.as_str());
    let mut run = Run::new()
        .add_text(text)
        .fonts(run_fonts(family))
        .size(rules.half_points() as usize);
    if let Some(marks) = marked.map(|marked| &marked.marks) {
        if marks.bold() {
            run = run.bold();
        }
        if marks.italic() {
            run = run.italic();
        }
        if marks.underline() {
            run = run.underline("single");
        }
    }
    run
}

// ── Body ──────────────────────────────────────────────────────────────────────

struct BodyWriter<'a> {
    rules: &'a FormattingRules,
    options: &'a OptionSets,
    paragraphs: Vec<Paragraph>,
}

struct ParagraphProps<'p> {
    style: Option<String>,
    align: Option<Alignment>,
    indent: usize,
    prefix: Option<&'p str>,
}

impl<'a> BodyWriter<'a> {
    fn new(rules: &'a FormattingRules, options: &'a OptionSets) -> Self {
        Self {
            rules,
            options,
            paragraphs: Vec::new(),
        }
    }

    fn write_blocks(&mut self, nodes: &[DocumentNode], path: &str, indent: usize) -> AppResult<()> {
        for (idx, node) in nodes.iter().enumerate() {
            self.write_block(node, &child_path(path, idx), indent)?;
        }
        Ok(())
    }

    fn write_block(&mut self, node: &DocumentNode, path: &str, indent: usize) -> AppResult<()> {
        match node {
            DocumentNode::Paragraph { attrs, content } => {
                let props = ParagraphProps {
                    style: None,
                    align: attrs.text_align,
                    indent,
                    prefix: None,
                };
                self.write_paragraph(&props, content, path)
            }
            DocumentNode::Heading { attrs, content } => {
                let props = ParagraphProps {
                    style: Some(format!("Heading{}", attrs.level)),
                    align: attrs.text_align,
                    indent,
                    prefix: None,
                };
                self.write_paragraph(&props, content, path)
            }
            DocumentNode::OrderedList { content } => self.write_list(content, path, indent),
            DocumentNode::Doc { .. }
            | DocumentNode::ListItem { .. }
            | DocumentNode::Text { .. }
            | DocumentNode::DateField { .. }
            | DocumentNode::ChoiceField { .. } => Err(AppError::UnexpectedNode {
                kind: node.kind().to_string(),
                path: path.to_string(),
            }),
        }
    }

    /// One paragraph per item, the first prefixed with its 1-based index.
    fn write_list(&mut self, items: &[DocumentNode], path: &str, indent: usize) -> AppResult<()> {
        for (idx, item) in items.iter().enumerate() {
            let item_path = child_path(path, idx);
            let DocumentNode::ListItem { content } = item else {
                return Err(AppError::UnexpectedNode {
                    kind: item.kind().to_string(),
                    path: item_path,
                });
            };
            let marker = format!("{}. ", idx + 1);
            let mut prefix = Some(marker.as_str());
            for (child_idx, child) in content.iter().enumerate() {
                let child_at = child_path(&item_path, child_idx);
                match child {
                    DocumentNode::Paragraph { attrs, content } => {
                        let props = ParagraphProps {
                            style: None,
                            align: attrs.text_align,
                            indent: indent + 1,
                            prefix: prefix.take(),
                        };
                        self.write_paragraph(&props, content, &child_at)?;
                    }
                    DocumentNode::OrderedList { content } => {
                        if let Some(marker) = prefix.take() {
                            let props = ParagraphProps {
                                style: None,
                                align: None,
                                indent: indent + 1,
                                prefix: Some(marker),
                            };
                            self.write_paragraph(&props, &[], &child_at)?;
                        }
                        self.write_list(content, &child_at, indent + 1)?;
                    }
                    other => {
                        return Err(AppError::UnexpectedNode {
                            kind: other.kind().to_string(),
                            path: child_at,
                        })
                    }
                }
            }
            if let Some(marker) = prefix {
                let props = ParagraphProps {
                    style: None,
                    align: None,
                    indent: indent + 1,
                    prefix: Some(marker),
                };
                self.write_paragraph(&props, &[], &item_path)?;
            }
        }
        Ok(())
    }

    fn write_paragraph(
        &mut self,
        props: &ParagraphProps<'_>,
        content: &[DocumentNode],
        path: &str,
    ) -> AppResult<()> {
        let runs = inline_runs(content, path, self.options)?;

        let line = (240.0 * self.rules.line_spacing).round() as i64;
        let mut paragraph = Paragraph::new().line_spacing(
            LineSpacing::new()
                .before(0)
                .after(0)
                .line(line as _)
                .line_rule(LineSpacingType::Auto),
        );
        if let Some(style) = &props.style {
            paragraph = paragraph.style(style);
        }
        if props.indent > 0 {
            let left = LIST_INDENT_TWIPS * props.indent as i64;
            paragraph = paragraph.indent(Some(left as _), None, None, None);
        }
        if let Some(align) = props.align {
            paragraph = paragraph.align(justification(align));
        }

        if let Some(prefix) = props.prefix {
            paragraph = paragraph.add_run(run(prefix, None, self.rules));
        }
        for marked in &runs {
            paragraph = paragraph.add_run(run(&marked.text, Some(marked), self.rules));
        }
        self.paragraphs.push(paragraph);
        Ok(())
    }
}

fn justification(align: Alignment) -> AlignmentType {
    match align {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Justify => AlignmentType::Both,
    }
}

// ── Package patching ──────────────────────────────────────────────────────────

/// Copy the packed archive, rewriting the document part when line numbering
/// is on and the core properties part to carry the title.
fn finish_package(packed: &[u8], title: &str, rules: &FormattingRules) -> AppResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(packed))?;
    let mut out = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx)?;
        let name = file.name().to_string();
        let patched = match name.as_str() {
            DOCUMENT_PART if rules.line_numbers.enabled => {
                let mut xml = Vec::new();
                file.read_to_end(&mut xml)?;
                Some(with_line_numbering(&xml, &rules.line_numbers)?)
            }
            CORE_PART => {
                let mut xml = Vec::new();
                file.read_to_end(&mut xml)?;
                Some(with_title(&xml, title)?)
            }
            _ => None,
        };
        match patched {
            Some(xml) => {
                out.start_file(name.as_str(), options)?;
                out.write_all(&xml)?;
            }
            None => out.raw_copy_file(file)?,
        }
    }
    Ok(out.finish()?.into_inner())
}

/// Insert `w:lnNumType` directly after `w:pgMar`, where the section schema
/// expects it.
fn with_line_numbering(xml: &[u8], numbering: &LineNumbering) -> AppResult<Vec<u8>> {
    let restart = if numbering.restart_each_page {
        "newPage"
    } else {
        "continuous"
    };
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut inserted = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Empty(margin) if margin.name().as_ref() == b"w:pgMar" => {
                writer.write_event(Event::Empty(margin))?;
                writer.write_event(Event::Empty(
                    BytesStart::new("w:lnNumType")
                        .with_attributes([("w:countBy", "1"), ("w:restart", restart)]),
                ))?;
                inserted = true;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    if !inserted {
        return Err(AppError::Export("docx package: section has no page margins".to_string()));
    }
    Ok(writer.into_inner().into_inner())
}

/// Replace any `dc:title` with the filing title.
fn with_title(xml: &[u8], title: &str) -> AppResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut skipping = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(start) if start.name().as_ref() == b"dc:title" => skipping = true,
            Event::End(end) if end.name().as_ref() == b"dc:title" => skipping = false,
            Event::Empty(empty) if empty.name().as_ref() == b"dc:title" => {}
            _ if skipping => {}
            Event::End(end) if end.name().as_ref() == b"cp:coreProperties" => {
                writer.write_event(Event::Start(BytesStart::new("dc:title")))?;
                writer.write_event(Event::Text(BytesText::new(title)))?;
                writer.write_event(Event::End(BytesEnd::new("dc:title")))?;
                writer.write_event(Event::End(end))?;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    Ok(writer.into_inner().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = r#"<w:document xmlns:w="w"><w:body><w:sectPr><w:pgSz w:w="12240" w:h="15840" /><w:pgMar w:top="1440" /><w:titlePg /></w:sectPr></w:body></w:document>"#;

    #[test]
    fn line_numbering_lands_after_page_margins() {
        let numbering = LineNumbering {
            enabled: true,
            restart_each_page: true,
        };
        let patched = with_line_numbering(SECTION.as_bytes(), &numbering).expect("patched");
        let patched = String::from_utf8(patched).expect("utf8");
        let margin = patched.find("w:pgMar").expect("margins");
        let numbers = patched.find("w:lnNumType").expect("line numbers");
        let title_page = patched.find("w:titlePg").expect("title page");
        assert!(margin < numbers && numbers < title_page, "{patched}");
        assert!(patched.contains(r#"w:restart="newPage""#));
    }

    #[test]
    fn title_replaces_existing_core_title() {
        let core = r#"<cp:coreProperties xmlns:cp="cp" xmlns:dc="dc"><dc:title>old</dc:title><dc:creator>x</dc:creator></cp:coreProperties>"#;
        let patched = with_title(core.as_bytes(), "Brief & Reply").expect("patched");
        let patched = String::from_utf8(patched).expect("utf8");
        assert_eq!(patched.matches("<dc:title>").count(), 1);
        assert!(patched.contains("<dc:title>Brief &amp; Reply</dc:title>"));
        assert!(!patched.contains("old"));
    }
}
