//! Paginated-print exporter.
//!
//! Two passes: [`layout`] flows the tree onto fixed-size pages (word wrap,
//! pagination, line numbers, running header, page-number footer), then the
//! positioned lines are encoded as PDF content streams with `lopdf` using the
//! standard Type1 fonts.

use std::collections::BTreeSet;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tracing::debug;

use crate::core::errors::{AppError, AppResult};
use crate::document::tree::{child_path, validate, Alignment, DocumentNode, ROOT_PATH};
use crate::render::fields::{inline_runs, OptionSets};
use crate::render::metrics::{self, FontMetrics};
use crate::render::rules::{FormattingRules, PageNumberPlacement, POINTS_PER_INCH};

const LIST_INDENT_PT: f32 = 36.0;
const LINE_NUMBER_GAP_PT: f32 = 18.0;
const UNDERLINE_DROP_PT: f32 = 2.0;
const MIN_MONOSPACE_SIZE_PT: f32 = 8.0;

// ── Fonts ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Face {
    Serif,
    Mono,
    Sans,
}

impl StandardFont {
    /// Closest standard font for a requested family name.
    pub fn select(family: &str, bold: bool, italic: bool) -> Self {
        let lower = family.to_ascii_lowercase();
        let face = if lower.contains("courier") || lower.contains("mono") {
            Face::Mono
        } else if lower.contains("arial") || lower.contains("helvetica") || lower.contains("sans") {
            Face::Sans
        } else {
            Face::Serif
        };
        match (face, bold, italic) {
            (Face::Serif, false, false) => Self::TimesRoman,
            (Face::Serif, true, false) => Self::TimesBold,
            (Face::Serif, false, true) => Self::TimesItalic,
            (Face::Serif, true, true) => Self::TimesBoldItalic,
            (Face::Mono, false, false) => Self::Courier,
            (Face::Mono, true, false) => Self::CourierBold,
            (Face::Mono, false, true) => Self::CourierOblique,
            (Face::Mono, true, true) => Self::CourierBoldOblique,
            (Face::Sans, false, false) => Self::Helvetica,
            (Face::Sans, true, false) => Self::HelveticaBold,
            (Face::Sans, false, true) => Self::HelveticaOblique,
            (Face::Sans, true, true) => Self::HelveticaBoldOblique,
        }
    }

    pub fn base_name(&self) -> &'static str {
        match self {
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    fn resource_name(&self) -> String {
        format!("F{}", *self as u8 + 1)
    }

    fn face(&self) -> Face {
        match self {
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => {
                Face::Serif
            }
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                Face::Mono
            }
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => Face::Sans,
        }
    }

    pub fn is_monospace(&self) -> bool {
        self.face() == Face::Mono
    }

    fn metrics(&self) -> &'static FontMetrics {
        match self {
            Self::TimesRoman => &metrics::TIMES_ROMAN,
            Self::TimesBold => &metrics::TIMES_BOLD,
            Self::TimesItalic => &metrics::TIMES_ITALIC,
            Self::TimesBoldItalic => &metrics::TIMES_BOLD_ITALIC,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                &metrics::COURIER
            }
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
        }
    }

    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let metrics = self.metrics();
        let units: u32 = text.chars().map(|c| u32::from(metrics.advance(c))).sum();
        units as f32 * size / 1000.0
    }
}

/// Encode text for a WinAnsiEncoding font. Unmappable characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

// ── Layout model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSpan {
    pub text: String,
    pub x: f32,
    pub width: f32,
    pub size: f32,
    pub font: StandardFont,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Baseline, in points from the bottom of the page.
    pub y: f32,
    pub line_number: Option<u32>,
    pub spans: Vec<PlacedSpan>,
}

impl PlacedLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based.
    pub number: usize,
    pub header: Option<String>,
    pub footer: String,
    pub lines: Vec<PlacedLine>,
}

#[derive(Debug, Clone)]
struct StyledRun {
    text: String,
    font: StandardFont,
    underline: bool,
}

#[derive(Debug)]
struct Block {
    runs: Vec<StyledRun>,
    align: Alignment,
    indent: f32,
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    font: StandardFont,
    underline: bool,
    space: bool,
}

// ── Block collection ──────────────────────────────────────────────────────────

struct BlockCollector<'a> {
    rules: &'a FormattingRules,
    options: &'a OptionSets,
    blocks: Vec<Block>,
}

impl<'a> BlockCollector<'a> {
    fn collect(&mut self, nodes: &[DocumentNode], path: &str, depth: usize) -> AppResult<()> {
        for (idx, node) in nodes.iter().enumerate() {
            let at = child_path(path, idx);
            match node {
                DocumentNode::Paragraph { attrs, content } => {
                    self.push_block(content, &at, attrs.text_align, depth, None, false)?;
                }
                DocumentNode::Heading { attrs, content } => {
                    self.push_block(content, &at, attrs.text_align, depth, None, true)?;
                }
                DocumentNode::OrderedList { content } => self.collect_list(content, &at, depth)?,
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

    fn collect_list(&mut self, items: &[DocumentNode], path: &str, depth: usize) -> AppResult<()> {
        for (idx, item) in items.iter().enumerate() {
            let item_path = child_path(path, idx);
            let DocumentNode::ListItem { content } = item else {
                return Err(AppError::UnexpectedNode {
                    kind: item.kind().to_string(),
                    path: item_path,
                });
            };
            let mut marker = Some(format!("{}. ", idx + 1));
            for (child_idx, child) in content.iter().enumerate() {
                let child_at = child_path(&item_path, child_idx);
                match child {
                    DocumentNode::Paragraph { attrs, content } => {
                        let prefix = marker.take();
                        self.push_block(content, &child_at, attrs.text_align, depth + 1, prefix, false)?;
                    }
                    DocumentNode::OrderedList { content } => {
                        if let Some(prefix) = marker.take() {
                            self.push_block(&[], &child_at, None, depth + 1, Some(prefix), false)?;
                        }
                        self.collect_list(content, &child_at, depth + 1)?;
                    }
                    other => {
                        return Err(AppError::UnexpectedNode {
                            kind: other.kind().to_string(),
                            path: child_at,
                        })
                    }
                }
            }
            if let Some(prefix) = marker {
                self.push_block(&[], &item_path, None, depth + 1, Some(prefix), false)?;
            }
        }
        Ok(())
    }

    fn push_block(
        &mut self,
        content: &[DocumentNode],
        path: &str,
        align: Option<Alignment>,
        depth: usize,
        prefix: Option<String>,
        heading: bool,
    ) -> AppResult<()> {
        let mut runs = Vec::new();
        if let Some(prefix) = prefix {
            runs.push(StyledRun {
                text: prefix,
                font: StandardFont::select(&self.rules.font_family, heading, false),
                underline: false,
            });
        }
        for run in inline_runs(content, path, self.options)? {
            let family = run.marks.font_family().unwrap_or(self.rules.font_family.as_str());
            runs.push(StyledRun {
                font: StandardFont::select(family, heading || run.marks.bold(), run.marks.italic()),
                underline: run.marks.underline(),
                text: run.text,
            });
        }
        self.blocks.push(Block {
            runs,
            align: align.unwrap_or_default(),
            indent: LIST_INDENT_PT * depth as f32,
        });
        Ok(())
    }
}

// ── Line breaking ─────────────────────────────────────────────────────────────

/// Split runs into word and space pieces. Monospaced runs keep their spacing
/// so column layouts survive; proportional runs collapse whitespace.
fn pieces(runs: &[StyledRun]) -> Vec<Piece> {
    let mut out = Vec::new();
    for run in runs {
        let mut current = String::new();
        let mut in_space = false;
        for c in run.text.chars() {
            let space = c.is_whitespace();
            if space != in_space && !current.is_empty() {
                out.push(make_piece(&current, run, in_space));
                current.clear();
            }
            in_space = space;
            current.push(c);
        }
        if !current.is_empty() {
            out.push(make_piece(&current, run, in_space));
        }
    }
    out
}

fn make_piece(text: &str, run: &StyledRun, space: bool) -> Piece {
    let text = if space && !run.font.is_monospace() {
        " ".to_string()
    } else if space {
        " ".repeat(text.chars().count())
    } else {
        text.to_string()
    };
    Piece {
        text,
        font: run.font,
        underline: run.underline,
        space,
    }
}

fn break_lines(pieces: Vec<Piece>, available: f32, size: f32) -> Vec<Vec<Piece>> {
    let mut lines = Vec::new();
    let mut current: Vec<Piece> = Vec::new();
    let mut width = 0.0;
    let mut wrapped = false;

    for piece in pieces {
        let piece_width = piece.font.text_width(&piece.text, size);
        if piece.space {
            if current.is_empty() && wrapped {
                continue;
            }
            width += piece_width;
            current.push(piece);
            continue;
        }
        let has_words = current.iter().any(|p| !p.space);
        if has_words && width + piece_width > available {
            lines.push(finish_line(std::mem::take(&mut current)));
            width = 0.0;
            wrapped = true;
        }
        width += piece_width;
        current.push(piece);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(finish_line(current));
    }
    lines
}

fn finish_line(mut line: Vec<Piece>) -> Vec<Piece> {
    while line.last().is_some_and(|piece| piece.space && !piece.font.is_monospace()) {
        line.pop();
    }
    line
}

fn place_spans(line: Vec<Piece>, left: f32, available: f32, align: Alignment, size: f32) -> Vec<PlacedSpan> {
    let mut spans: Vec<PlacedSpan> = Vec::new();
    for piece in line {
        match spans.last_mut() {
            Some(last) if last.font == piece.font && last.underline == piece.underline => {
                last.text.push_str(&piece.text);
            }
            _ => spans.push(PlacedSpan {
                text: piece.text,
                x: 0.0,
                width: 0.0,
                size,
                font: piece.font,
                underline: piece.underline,
            }),
        }
    }

    let total: f32 = spans
        .iter_mut()
        .map(|span| {
            span.width = span.font.text_width(&span.text, size);
            span.width
        })
        .sum();
    let slack = (available - total).max(0.0);
    let mut x = match align {
        Alignment::Left | Alignment::Justify => left,
        Alignment::Center => left + slack / 2.0,
        Alignment::Right => left + slack,
    };
    for span in &mut spans {
        span.x = x;
        x += span.width;
    }
    spans
}

// ── Pagination ────────────────────────────────────────────────────────────────

/// Flow the tree onto pages without encoding anything.
pub fn layout(
    tree: &DocumentNode,
    title: &str,
    rules: &FormattingRules,
    options: &OptionSets,
) -> AppResult<Vec<PageLayout>> {
    validate(tree)?;
    rules.validate()?;

    let mut collector = BlockCollector {
        rules,
        options,
        blocks: Vec::new(),
    };
    collector.collect(tree.children(), ROOT_PATH, 0)?;

    let size = rules.font_size_pt;
    let left = rules.margins.left_in * POINTS_PER_INCH;
    let top = rules.page_height_pt() - rules.margins.top_in * POINTS_PER_INCH;
    let bottom = rules.margins.bottom_in * POINTS_PER_INCH;
    let line_height = rules.line_height_pt();
    let header = rules.header_text(title);

    let mut pages: Vec<PageLayout> = Vec::new();
    let mut lines: Vec<PlacedLine> = Vec::new();
    let mut y = top - size;
    let mut number: u32 = 0;

    for block in collector.blocks {
        let available = rules.text_width_pt() - block.indent;
        let block_size = fitted_size(&block, available, size);
        for line in break_lines(pieces(&block.runs), available, block_size) {
            if y < bottom {
                pages.push(new_page(pages.len() + 1, std::mem::take(&mut lines), header.as_deref(), rules));
                y = top - size;
                if rules.line_numbers.restart_each_page {
                    number = 0;
                }
            }
            number += 1;
            lines.push(PlacedLine {
                y,
                line_number: rules.line_numbers.enabled.then_some(number),
                spans: place_spans(line, left + block.indent, available, block.align, block_size),
            });
            y -= line_height;
        }
    }
    pages.push(new_page(pages.len() + 1, lines, header.as_deref(), rules));

    debug!(pages = pages.len(), "pdf layout complete");
    Ok(pages)
}

/// Fully monospaced blocks (the caption) shrink so each source line fits on
/// one printed line, down to a floor.
fn fitted_size(block: &Block, available: f32, size: f32) -> f32 {
    if block.runs.is_empty() || !block.runs.iter().all(|run| run.font.is_monospace()) {
        return size;
    }
    let width: f32 = block
        .runs
        .iter()
        .map(|run| run.font.text_width(&run.text, size))
        .sum();
    if width <= available {
        return size;
    }
    (size * available / width).floor().max(MIN_MONOSPACE_SIZE_PT)
}

fn new_page(
    number: usize,
    lines: Vec<PlacedLine>,
    header: Option<&str>,
    rules: &FormattingRules,
) -> PageLayout {
    let header = match header {
        Some(_) if number == 1 && rules.header_skips_first_page() => None,
        other => other.map(str::to_string),
    };
    PageLayout {
        number,
        header,
        footer: number.to_string(),
        lines,
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

fn show_text(ops: &mut Vec<Operation>, font: StandardFont, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![
            Object::Name(font.resource_name().into_bytes()),
            Object::Integer(size.round() as i64),
        ],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x.round() as i64), Object::Integer(y.round() as i64)],
    ));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
    ops.push(Operation::new("ET", vec![]));
}

fn page_operations(page: &PageLayout, rules: &FormattingRules, fonts: &mut BTreeSet<StandardFont>) -> Vec<Operation> {
    let size = rules.font_size_pt;
    let body_font = StandardFont::select(&rules.font_family, false, false);
    let left = rules.margins.left_in * POINTS_PER_INCH;
    let mut ops = Vec::new();
    fonts.insert(body_font);

    for line in &page.lines {
        if let Some(number) = line.line_number {
            let label = number.to_string();
            let x = left - LINE_NUMBER_GAP_PT - body_font.text_width(&label, size);
            show_text(&mut ops, body_font, size, x, line.y, &label);
        }
        for span in &line.spans {
            if span.text.trim().is_empty() {
                continue;
            }
            fonts.insert(span.font);
            show_text(&mut ops, span.font, span.size, span.x, line.y, &span.text);
            if span.underline {
                let y = (line.y - UNDERLINE_DROP_PT).round() as i64;
                ops.push(Operation::new("w", vec![Object::Integer(1)]));
                ops.push(Operation::new(
                    "m",
                    vec![Object::Integer(span.x.round() as i64), Object::Integer(y)],
                ));
                ops.push(Operation::new(
                    "l",
                    vec![Object::Integer((span.x + span.width).round() as i64), Object::Integer(y)],
                ));
                ops.push(Operation::new("S", vec![]));
            }
        }
    }

    if let Some(header) = &page.header {
        let width = body_font.text_width(header, size);
        let x = (rules.page_width_pt() - width) / 2.0;
        let y = rules.page_height_pt() - rules.margins.top_in * POINTS_PER_INCH / 2.0;
        show_text(&mut ops, body_font, size, x, y, header);
    }

    let width = body_font.text_width(&page.footer, size);
    let right = rules.page_width_pt() - rules.margins.right_in * POINTS_PER_INCH;
    let x = match rules.page_number {
        PageNumberPlacement::Left => left,
        PageNumberPlacement::Center => (rules.page_width_pt() - width) / 2.0,
        PageNumberPlacement::Right => right - width,
    };
    let y = rules.margins.bottom_in * POINTS_PER_INCH / 2.0;
    show_text(&mut ops, body_font, size, x, y, &page.footer);

    ops
}

pub fn export_pdf(
    tree: &DocumentNode,
    title: &str,
    rules: &FormattingRules,
    options: &OptionSets,
) -> AppResult<Vec<u8>> {
    let pages = layout(tree, title, rules, options)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut fonts = BTreeSet::new();
    let mut contents = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = Content {
            operations: page_operations(page, rules, &mut fonts),
        };
        contents.push(doc.add_object(Stream::new(dictionary! {}, content.encode()?)));
    }

    let mut font_dict = Dictionary::new();
    for font in &fonts {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_name(),
            "Encoding" => "WinAnsiEncoding",
        });
        font_dict.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => font_dict,
    });

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(rules.page_width_pt().round() as i64),
        Object::Integer(rules.page_height_pt().round() as i64),
    ];
    let kids: Vec<Object> = contents
        .into_iter()
        .map(|content_id| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => media_box.clone(),
            })
            .into()
        })
        .collect();
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(title)),
        "Producer" => Object::string_literal("pleadings"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    debug!(pages = pages.len(), bytes = bytes.len(), "pdf encoded");
    Ok(bytes)
}
