//! Render-time resolution of date and choice fields.
//!
//! Every exporter goes through this module, so the same tree produces the same
//! visible text in DOCX, PDF and markdown.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::{AppError, AppResult};
use crate::document::tree::{
    child_path, ChoiceFieldAttrs, DateFieldAttrs, DateFormat, DocumentNode, MarkSet,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub label: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl OptionSet {
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}

/// Choice tables keyed by field type. Passed into every export call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSets(BTreeMap<String, OptionSet>);

impl OptionSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field_type: impl Into<String>, set: OptionSet) {
        self.0.insert(field_type.into(), set);
    }

    pub fn get(&self, field_type: &str) -> Option<&OptionSet> {
        self.0.get(field_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| AppError::Config(format!("invalid option sets: {err}")))
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AppError::Io(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&raw)
    }
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Calendar date of a stored timestamp. RFC 3339 values keep their own offset.
pub fn parse_date_value(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(stamp.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    match format {
        DateFormat::Long => date.format("%B %-d, %Y").to_string(),
        DateFormat::Short => date.format("%m/%d/%Y").to_string(),
    }
}

pub fn resolve_date(attrs: &DateFieldAttrs, path: &str) -> AppResult<String> {
    let date = parse_date_value(&attrs.value).ok_or_else(|| AppError::InvalidDate {
        value: attrs.value.clone(),
        path: path.to_string(),
    })?;
    Ok(format_date(date, attrs.format))
}

// ── Choices ───────────────────────────────────────────────────────────────────

pub fn placeholder(label: &str) -> String {
    format!("[Select {label}]")
}

/// Label of the selected option, a placeholder when nothing is selected, or
/// the raw value when the tables do not know it.
pub fn resolve_choice(attrs: &ChoiceFieldAttrs, options: &OptionSets) -> String {
    if attrs.selected_value.trim().is_empty() {
        return placeholder(&attrs.label);
    }
    let found = options
        .get(&attrs.field_type)
        .and_then(|set| set.label_for(&attrs.selected_value));
    match found {
        Some(label) => label.to_string(),
        None => {
            warn!(
                field_type = %attrs.field_type,
                value = %attrs.selected_value,
                "choice value not in option sets; rendering raw value"
            );
            attrs.selected_value.clone()
        }
    }
}

// ── Inline runs ───────────────────────────────────────────────────────────────

/// Inline content after field resolution: literal text plus its marks.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineRun {
    pub text: String,
    pub marks: MarkSet,
}

/// Resolve the inline children of a paragraph or heading at `path`.
pub fn inline_runs(
    content: &[DocumentNode],
    path: &str,
    options: &OptionSets,
) -> AppResult<Vec<InlineRun>> {
    content
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let at = child_path(path, idx);
            match node {
                DocumentNode::Text { text, marks } => Ok(InlineRun {
                    text: text.clone(),
                    marks: marks.clone(),
                }),
                DocumentNode::DateField { attrs } => Ok(InlineRun {
                    text: resolve_date(attrs, &at)?,
                    marks: MarkSet::default(),
                }),
                DocumentNode::ChoiceField { attrs } => Ok(InlineRun {
                    text: resolve_choice(attrs, options),
                    marks: MarkSet::default(),
                }),
                DocumentNode::Doc { .. }
                | DocumentNode::Paragraph { .. }
                | DocumentNode::Heading { .. }
                | DocumentNode::OrderedList { .. }
                | DocumentNode::ListItem { .. } => Err(AppError::UnexpectedNode {
                    kind: node.kind().to_string(),
                    path: at,
                }),
            }
        })
        .collect()
}
