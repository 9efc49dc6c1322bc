use serde::{Deserialize, Serialize};

use crate::document::tree::DocumentNode;
use crate::render::caption::caption_block;
use crate::render::ExportFormat;

pub const DEFAULT_STATE: &str = "INDIANA";

/// One line of extracted page text with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLine {
    pub index: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Split extracted text into indexed lines. Tolerates `\r\n`.
pub fn lines_from_text(text: &str) -> Vec<RawLine> {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| RawLine::new(index, line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

/// Build indexed lines from already-split strings.
pub fn lines_from_strs<S: AsRef<str>>(lines: &[S]) -> Vec<RawLine> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| RawLine::new(index, line.as_ref()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    pub role: String,
}

impl Party {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionData {
    pub state: String,
    pub county: String,
    pub court: String,
    pub division: Option<String>,
    pub cause_number: String,
    pub has_venue_mark: bool,
    pub parties: Vec<Party>,
}

impl Default for CaptionData {
    fn default() -> Self {
        Self {
            state: DEFAULT_STATE.to_string(),
            county: String::new(),
            court: String::new(),
            division: None,
            cause_number: String::new(),
            has_venue_mark: false,
            parties: Vec::new(),
        }
    }
}

impl CaptionData {
    /// The run of leading parties sharing the first party's role: everyone
    /// above the `v.` line.
    pub fn plaintiffs(&self) -> &[Party] {
        let Some(first) = self.parties.first() else {
            return &[];
        };
        let count = self
            .parties
            .iter()
            .take_while(|party| party.role == first.role)
            .count();
        &self.parties[..count]
    }

    /// Every party after the plaintiff side, in order.
    pub fn defendants(&self) -> &[Party] {
        &self.parties[self.plaintiffs().len()..]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionParse {
    pub caption: Option<CaptionData>,
    pub body_start: usize,
}

impl CaptionParse {
    pub fn no_caption() -> Self {
        Self {
            caption: None,
            body_start: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFiling {
    pub caption: Option<CaptionData>,
    pub body_start: usize,
    pub body: DocumentNode,
    pub source_checksum: String,
}

impl ParsedFiling {
    /// The full filing tree: rendered caption block (if any) followed by the body.
    pub fn to_document(&self) -> DocumentNode {
        let mut content = self
            .caption
            .as_ref()
            .map(caption_block)
            .unwrap_or_default();
        content.extend(self.body.children().iter().cloned());
        DocumentNode::doc(content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFilingResponse {
    pub parsed: ParsedFiling,
    pub node_count: usize,
    pub heading_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFilingResponse {
    pub file_path: String,
    pub bytes_written: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFilingRequest {
    /// Extracted text (`.txt` and anything else) or a plain-object tree (`.json`).
    pub input_path: String,
    pub output_path: String,
    pub format: ExportFormat,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub rules_path: Option<String>,
    #[serde(default)]
    pub options_path: Option<String>,
}
