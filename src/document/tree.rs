//! Canonical filing content tree.
//!
//! Every renderer consumes this one structure. Children are owned by value, so
//! the tree is acyclic and every node but the root has exactly one parent.
//! The plain-object form is the serde JSON encoding: `{"type": ..., "attrs":
//! ..., "content": [...], "text": ..., "marks": [...]}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{AppError, AppResult};

pub const ROOT_PATH: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    OrderedList,
    ListItem,
    Text,
    DateField,
    ChoiceField,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        Self::Doc,
        Self::Paragraph,
        Self::Heading,
        Self::OrderedList,
        Self::ListItem,
        Self::Text,
        Self::DateField,
        Self::ChoiceField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::OrderedList => "orderedList",
            Self::ListItem => "listItem",
            Self::Text => "text",
            Self::DateField => "dateField",
            Self::ChoiceField => "choiceField",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading | Self::OrderedList)
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Text | Self::DateField | Self::ChoiceField)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<Alignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingAttrs {
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<Alignment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    #[default]
    Long,
    Short,
}

/// Stored as an ISO timestamp; display text is produced only when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFieldAttrs {
    pub value: String,
    #[serde(default)]
    pub format: DateFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceFieldAttrs {
    pub field_type: String,
    pub label: String,
    #[serde(default)]
    pub selected_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    FontFamily { family: String },
}

impl Mark {
    fn rank(&self) -> u8 {
        match self {
            Self::Bold => 0,
            Self::Italic => 1,
            Self::Underline => 2,
            Self::FontFamily { .. } => 3,
        }
    }
}

/// Inline marks as a set: at most one mark per kind, canonical order.
/// A later `FontFamily` replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new(marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut set = Self::default();
        for mark in marks {
            set.insert(mark);
        }
        set
    }

    pub fn insert(&mut self, mark: Mark) {
        match self.0.iter_mut().find(|existing| existing.rank() == mark.rank()) {
            Some(existing) => *existing = mark,
            None => {
                self.0.push(mark);
                self.0.sort_by_key(Mark::rank);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn bold(&self) -> bool {
        self.0.contains(&Mark::Bold)
    }

    pub fn italic(&self) -> bool {
        self.0.contains(&Mark::Italic)
    }

    pub fn underline(&self) -> bool {
        self.0.contains(&Mark::Underline)
    }

    pub fn font_family(&self) -> Option<&str> {
        self.0.iter().find_map(|mark| match mark {
            Mark::FontFamily { family } => Some(family.as_str()),
            _ => None,
        })
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        Self::new(marks)
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DocumentNode {
    Doc {
        #[serde(default)]
        content: Vec<DocumentNode>,
    },
    Paragraph {
        #[serde(default)]
        attrs: ParagraphAttrs,
        #[serde(default)]
        content: Vec<DocumentNode>,
    },
    Heading {
        attrs: HeadingAttrs,
        #[serde(default)]
        content: Vec<DocumentNode>,
    },
    OrderedList {
        #[serde(default)]
        content: Vec<DocumentNode>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<DocumentNode>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
        marks: MarkSet,
    },
    DateField {
        attrs: DateFieldAttrs,
    },
    ChoiceField {
        attrs: ChoiceFieldAttrs,
    },
}

// ── Constructors ──────────────────────────────────────────────────────────────

impl DocumentNode {
    pub fn doc(content: Vec<DocumentNode>) -> Self {
        Self::Doc { content }
    }

    pub fn paragraph(content: Vec<DocumentNode>) -> Self {
        Self::Paragraph {
            attrs: ParagraphAttrs::default(),
            content,
        }
    }

    pub fn aligned_paragraph(align: Alignment, content: Vec<DocumentNode>) -> Self {
        Self::Paragraph {
            attrs: ParagraphAttrs {
                text_align: Some(align),
            },
            content,
        }
    }

    pub fn heading(level: u8, align: Alignment, content: Vec<DocumentNode>) -> Self {
        Self::Heading {
            attrs: HeadingAttrs {
                level,
                text_align: Some(align),
            },
            content,
        }
    }

    pub fn ordered_list(items: Vec<DocumentNode>) -> Self {
        Self::OrderedList { content: items }
    }

    pub fn list_item(content: Vec<DocumentNode>) -> Self {
        Self::ListItem { content }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: MarkSet::default(),
        }
    }

    pub fn styled_text(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self::Text {
            text: text.into(),
            marks: MarkSet::new(marks),
        }
    }

    pub fn date_field(value: impl Into<String>, format: DateFormat) -> Self {
        Self::DateField {
            attrs: DateFieldAttrs {
                value: value.into(),
                format,
            },
        }
    }

    pub fn choice_field(
        field_type: impl Into<String>,
        label: impl Into<String>,
        selected_value: impl Into<String>,
    ) -> Self {
        Self::ChoiceField {
            attrs: ChoiceFieldAttrs {
                field_type: field_type.into(),
                label: label.into(),
                selected_value: selected_value.into(),
            },
        }
    }
}

// ── Inspection ────────────────────────────────────────────────────────────────

impl DocumentNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Doc { .. } => NodeKind::Doc,
            Self::Paragraph { .. } => NodeKind::Paragraph,
            Self::Heading { .. } => NodeKind::Heading,
            Self::OrderedList { .. } => NodeKind::OrderedList,
            Self::ListItem { .. } => NodeKind::ListItem,
            Self::Text { .. } => NodeKind::Text,
            Self::DateField { .. } => NodeKind::DateField,
            Self::ChoiceField { .. } => NodeKind::ChoiceField,
        }
    }

    pub fn children(&self) -> &[DocumentNode] {
        match self {
            Self::Doc { content }
            | Self::Paragraph { content, .. }
            | Self::Heading { content, .. }
            | Self::OrderedList { content }
            | Self::ListItem { content } => content,
            Self::Text { .. } | Self::DateField { .. } | Self::ChoiceField { .. } => &[],
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Self::node_count).sum::<usize>()
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        let own = usize::from(self.kind() == kind);
        own + self
            .children()
            .iter()
            .map(|child| child.count_kind(kind))
            .sum::<usize>()
    }

    /// Concatenated literal text of every text run below this node.
    pub fn literal_text(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            _ => self
                .children()
                .iter()
                .map(Self::literal_text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

pub fn child_path(parent: &str, index: usize) -> String {
    format!("{parent}.content[{index}]")
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Check root kind, block/inline placement and heading levels.
pub fn validate(root: &DocumentNode) -> AppResult<()> {
    if root.kind() != NodeKind::Doc {
        return Err(AppError::UnexpectedNode {
            kind: root.kind().to_string(),
            path: ROOT_PATH.to_string(),
        });
    }
    validate_children(root, ROOT_PATH)
}

fn allowed_child(parent: NodeKind, child: NodeKind) -> bool {
    match parent {
        NodeKind::Doc => child.is_block(),
        NodeKind::Paragraph | NodeKind::Heading => child.is_inline(),
        NodeKind::OrderedList => child == NodeKind::ListItem,
        NodeKind::ListItem => matches!(child, NodeKind::Paragraph | NodeKind::OrderedList),
        NodeKind::Text | NodeKind::DateField | NodeKind::ChoiceField => false,
    }
}

fn validate_children(node: &DocumentNode, path: &str) -> AppResult<()> {
    if let DocumentNode::Heading { attrs, .. } = node {
        if !(1..=3).contains(&attrs.level) {
            return Err(AppError::InvalidInput(format!(
                "heading level {} at {path} is outside 1-3",
                attrs.level
            )));
        }
    }
    for (idx, child) in node.children().iter().enumerate() {
        let child_at = child_path(path, idx);
        if !allowed_child(node.kind(), child.kind()) {
            return Err(AppError::UnexpectedNode {
                kind: child.kind().to_string(),
                path: child_at,
            });
        }
        validate_children(child, &child_at)?;
    }
    Ok(())
}

// ── Plain-object form ─────────────────────────────────────────────────────────

pub fn to_value(root: &DocumentNode) -> AppResult<Value> {
    Ok(serde_json::to_value(root)?)
}

/// Decode the plain-object form. Unknown node kinds are reported with their
/// path before any typed decoding happens.
pub fn from_value(value: &Value) -> AppResult<DocumentNode> {
    check_kinds(value, ROOT_PATH)?;
    let node: DocumentNode = serde_json::from_value(value.clone())
        .map_err(|err| AppError::InvalidInput(format!("malformed document tree: {err}")))?;
    validate(&node)?;
    Ok(node)
}

pub fn from_json_str(raw: &str) -> AppResult<DocumentNode> {
    let value: Value = serde_json::from_str(raw)?;
    from_value(&value)
}

fn check_kinds(value: &Value, path: &str) -> AppResult<()> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::InvalidInput(format!("node at {path} is not an object")))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidInput(format!("node at {path} has no `type`")))?;
    if NodeKind::parse(kind).is_none() {
        return Err(AppError::UnknownNodeKind {
            kind: kind.to_string(),
            path: path.to_string(),
        });
    }
    if let Some(content) = object.get("content") {
        let children = content
            .as_array()
            .ok_or_else(|| AppError::InvalidInput(format!("`content` at {path} is not an array")))?;
        for (idx, child) in children.iter().enumerate() {
            check_kinds(child, &child_path(path, idx))?;
        }
    }
    Ok(())
}
