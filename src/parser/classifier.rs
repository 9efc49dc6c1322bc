//! Single-line predicates shared by the caption parser and the body segmenter.
//!
//! Every function here looks at one line in isolation. None of them keep state.

use once_cell::sync::Lazy;
use regex::Regex;

const HEADING_MIN_LEN: usize = 10;
const HEADING_MAX_LEN: usize = 80;

static FILED_STAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^filed\s*:").unwrap());
static CLERK_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:,\s*clerk|\bclerk\s+of\s+(?:the\s+)?court)\s*$").unwrap());
static PAGE_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^page\s+\d+(?:\s+of\s+\d+)?$").unwrap());
static COUNTY_STAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)county,\s*indiana$").unwrap());

const TITLE_TOKENS: &str =
    "MOTION|ORDER|PETITION|BRIEF|MEMORANDUM|AFFIDAVIT|DEMAND|OBJECTION";

static BARE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(?:{TITLE_TOKENS})\b")).unwrap());
static POSSESSIVE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:STATE|PLAINTIFF|DEFENDANT|PETITIONER|RESPONDENT|APPELLANT|APPELLEE)(?:'S|S'|S)?\s+(?:{TITLE_TOKENS})\b"
    ))
    .unwrap()
});
static MEMORANDUM_OF_LAW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^MEMORANDUM OF LAW").unwrap());

static ROMAN_SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[IVXLC]+\.\s+").unwrap());

static ROLE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(plaintiff|defendant|respondent|petitioner|appellee|appellant)(s)?\s*[,.;:]*$")
        .unwrap()
});
static VERSUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:v\.|vs\.?)$").unwrap());

static LINE_NUMBER_MARGIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d{1,2}\s{2,}").unwrap());
static SIGNATURE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{5,}").unwrap());

/// A role label line such as `Plaintiff,` or `Defendants.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMarker {
    /// Singular, capitalized role (`Defendants,` becomes `Defendant`).
    pub role: String,
    pub plural: bool,
}

pub fn normalize_apostrophes(line: &str) -> String {
    line.replace(&['\u{2019}', '\u{2018}'][..], "'")
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn squash_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clerk stamps, `Filed:` banners, bare page counters and `... County, Indiana`
/// lines. Never part of a caption or body.
pub fn is_filing_stamp_noise(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    FILED_STAMP.is_match(trimmed)
        || CLERK_STAMP.is_match(trimmed)
        || PAGE_STAMP.is_match(trimmed)
        || COUNTY_STAMP.is_match(trimmed)
}

/// Start of a document title such as `MOTION TO DISMISS` or `STATE'S BRIEF`.
/// Marks the end of the caption and the start of a level-1 heading.
pub fn is_document_title_line(line: &str) -> bool {
    let normalized = normalize_apostrophes(line.trim());
    BARE_TITLE.is_match(&normalized)
        || POSSESSIVE_TITLE.is_match(&normalized)
        || MEMORANDUM_OF_LAW.is_match(&normalized)
}

pub fn is_heading_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if is_document_title_line(trimmed) || ROMAN_SECTION.is_match(trimmed) {
        return true;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("certificate of service") || lower.starts_with("respectfully submitted") {
        return true;
    }
    is_uppercase_heading(trimmed)
}

fn is_uppercase_heading(trimmed: &str) -> bool {
    let len = trimmed.chars().count();
    if !(HEADING_MIN_LEN..=HEADING_MAX_LEN).contains(&len) {
        return false;
    }
    if trimmed.contains(':') || trimmed.contains('(') || trimmed.contains(')') {
        return false;
    }
    if !trimmed.chars().any(char::is_alphabetic) {
        return false;
    }
    trimmed == trimmed.to_uppercase() && !looks_like_caption_fragment(trimmed)
}

/// Lines that belong to a caption block even when they float free of one.
pub fn looks_like_caption_fragment(line: &str) -> bool {
    let text = squash_whitespace(&strip_parens(line));
    let upper = text.to_uppercase();
    upper.starts_with("STATE OF")
        || upper.starts_with("COUNTY OF")
        || upper.starts_with("IN THE ")
        || upper.contains("CAUSE NO")
        || upper.starts_with("SS:")
        || upper == "SS"
        || role_marker(&text).is_some()
        || is_versus_line(&text)
}

/// Remove the caption's `)` column markers and trim.
pub fn strip_parens(line: &str) -> String {
    line.replace(')', "").trim().to_string()
}

/// `)`, empty, or a run of `v` left behind by a vertical caption divider.
pub fn is_empty_connector_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed == ")" || trimmed.chars().all(|c| c == 'v')
}

pub fn role_marker(line: &str) -> Option<RoleMarker> {
    let text = squash_whitespace(&strip_parens(line));
    let caps = ROLE_MARKER.captures(&text)?;
    let word = caps.get(1)?.as_str().to_ascii_lowercase();
    let mut role = String::with_capacity(word.len());
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        role.extend(first.to_uppercase());
        role.push_str(chars.as_str());
    }
    Some(RoleMarker {
        role,
        plural: caps.get(2).is_some(),
    })
}

pub fn is_versus_line(line: &str) -> bool {
    VERSUS.is_match(&squash_whitespace(&strip_parens(line)))
}

/// `/s/ Name` e-signatures and `_____` signature rules.
pub fn is_signature_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("/s/") || SIGNATURE_RULE.is_match(trimmed)
}

/// Drop a pleading-paper line number (`12   text`) from the front of a line.
pub fn strip_line_number_margin(line: &str) -> &str {
    match LINE_NUMBER_MARGIN.find(line) {
        Some(found) => &line[found.end()..],
        None => line,
    }
}
