use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{AppError, AppResult};

pub const TWIPS_PER_INCH: f32 = 1440.0;
pub const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Margins {
    pub top_in: f32,
    pub right_in: f32,
    pub bottom_in: f32,
    pub left_in: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top_in: 1.0,
            right_in: 1.0,
            bottom_in: 1.0,
            left_in: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineNumbering {
    pub enabled: bool,
    pub restart_each_page: bool,
}

impl Default for LineNumbering {
    fn default() -> Self {
        Self {
            enabled: true,
            restart_each_page: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageNumberPlacement {
    Left,
    #[default]
    Center,
    Right,
}

/// Running header. `text: None` means "use the document title".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderRule {
    pub text: Option<String>,
    pub skip_first_page: bool,
}

impl Default for HeaderRule {
    fn default() -> Self {
        Self {
            text: None,
            skip_first_page: true,
        }
    }
}

/// Page and typography rules applied by every exporter. Not derived from the
/// tree; loaded once per jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingRules {
    pub font_family: String,
    pub font_size_pt: f32,
    pub page_width_in: f32,
    pub page_height_in: f32,
    pub margins: Margins,
    pub line_spacing: f32,
    pub line_numbers: LineNumbering,
    pub page_number: PageNumberPlacement,
    pub header: Option<HeaderRule>,
}

impl Default for FormattingRules {
    fn default() -> Self {
        Self {
            font_family: "Times New Roman".to_string(),
            font_size_pt: 12.0,
            page_width_in: 8.5,
            page_height_in: 11.0,
            margins: Margins::default(),
            line_spacing: 2.0,
            line_numbers: LineNumbering::default(),
            page_number: PageNumberPlacement::Center,
            header: Some(HeaderRule::default()),
        }
    }
}

impl FormattingRules {
    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        let rules: Self = serde_json::from_str(raw)
            .map_err(|err| AppError::Config(format!("invalid formatting rules: {err}")))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AppError::Io(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.font_family.trim().is_empty() {
            return Err(AppError::Config("fontFamily must not be empty".into()));
        }
        let positive = [
            ("fontSizePt", self.font_size_pt),
            ("pageWidthIn", self.page_width_in),
            ("pageHeightIn", self.page_height_in),
            ("lineSpacing", self.line_spacing),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let m = &self.margins;
        for (name, value) in [
            ("margins.topIn", m.top_in),
            ("margins.rightIn", m.right_in),
            ("margins.bottomIn", m.bottom_in),
            ("margins.leftIn", m.left_in),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::Config(format!("{name} must not be negative, got {value}")));
            }
        }
        if self.text_width_pt() <= 0.0 || self.text_height_pt() < self.line_height_pt() {
            return Err(AppError::Config(
                "margins leave no room for text on the page".into(),
            ));
        }
        Ok(())
    }

    /// Header text for a document, if a header is configured.
    pub fn header_text(&self, title: &str) -> Option<String> {
        let header = self.header.as_ref()?;
        let text = header.text.clone().unwrap_or_else(|| title.to_string());
        (!text.trim().is_empty()).then_some(text)
    }

    pub fn header_skips_first_page(&self) -> bool {
        self.header.as_ref().is_some_and(|header| header.skip_first_page)
    }

    pub fn page_width_pt(&self) -> f32 {
        self.page_width_in * POINTS_PER_INCH
    }

    pub fn page_height_pt(&self) -> f32 {
        self.page_height_in * POINTS_PER_INCH
    }

    pub fn text_width_pt(&self) -> f32 {
        (self.page_width_in - self.margins.left_in - self.margins.right_in) * POINTS_PER_INCH
    }

    pub fn text_height_pt(&self) -> f32 {
        (self.page_height_in - self.margins.top_in - self.margins.bottom_in) * POINTS_PER_INCH
    }

    /// Baseline-to-baseline distance for body lines.
    pub fn line_height_pt(&self) -> f32 {
        self.font_size_pt * self.line_spacing
    }

    /// Font size in the half-point unit WordprocessingML uses.
    pub fn half_points(&self) -> u32 {
        (self.font_size_pt * 2.0).round() as u32
    }
}

pub fn twips(inches: f32) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}
