pub mod caption;
pub mod docx;
pub mod fields;
pub mod markdown;
mod metrics;
pub mod pdf;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::core::errors::{AppError, AppResult};
use crate::document::tree::{self, DocumentNode};

pub use caption::{caption_block, render_caption, CAPTION_COLUMN_WIDTH};
pub use fields::OptionSets;
pub use rules::FormattingRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pdf,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(AppError::InvalidInput(format!("unsupported export format: {other}"))),
        }
    }
}

/// Render a filing tree to bytes in the requested format.
pub fn export(
    format: ExportFormat,
    tree: &DocumentNode,
    title: &str,
    rules: &FormattingRules,
    options: &OptionSets,
) -> AppResult<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Docx => docx::export_docx(tree, title, rules, options)?,
        ExportFormat::Pdf => pdf::export_pdf(tree, title, rules, options)?,
        ExportFormat::Markdown => markdown::export_markdown(tree, title, options)?,
    };
    info!(%format, bytes = bytes.len(), "export complete");
    Ok(bytes)
}

/// Same as [`export`], starting from the plain-object form. Unknown node
/// kinds fail here with their path.
pub fn export_value(
    format: ExportFormat,
    value: &Value,
    title: &str,
    rules: &FormattingRules,
    options: &OptionSets,
) -> AppResult<Vec<u8>> {
    let tree = tree::from_value(value)?;
    export(format, &tree, title, rules, options)
}
