//! Caption block parser.
//!
//! Scans the head of a filing for the `STATE OF` / `COUNTY OF` / party block
//! and returns the structured caption plus the position where the body
//! starts. Each scan step takes `(lines, at)` and returns its result together
//! with the next unconsumed position, so no cursor is shared between steps.
//!
//! Layout handled:
//!
//! ```text
//! STATE OF INDIANA        )  IN THE MARION SUPERIOR COURT
//!                         )  SS:
//! COUNTY OF MARION        )  CAUSE NO.: 49D01-2301-CR-000123
//!                         )
//! JOHN DOE,               )
//!      Plaintiff,         )
//!           v.            )
//! JANE ROE,               )
//!      Defendant.         )
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::types::{CaptionData, CaptionParse, Party, RawLine};
use crate::parser::classifier::{
    is_document_title_line, is_empty_connector_line, is_filing_stamp_noise, is_versus_line,
    role_marker, squash_whitespace, strip_parens,
};

const STATE_SEARCH_WINDOW: usize = 15;
const MAX_HEADER_LINES: usize = 10;
const VENUE_LINE_MAX_LEN: usize = 50;
const PARTY_LINE_MAX_LEN: usize = 80;

const DEFAULT_PLAINTIFF_ROLE: &str = "Plaintiff";
const DEFAULT_DEFENDANT_ROLE: &str = "Defendant";

const US_STATES: &[&str] = &[
    "ALABAMA", "ALASKA", "ARIZONA", "ARKANSAS", "CALIFORNIA", "COLORADO", "CONNECTICUT",
    "DELAWARE", "DISTRICT OF COLUMBIA", "FLORIDA", "GEORGIA", "HAWAII", "IDAHO", "ILLINOIS",
    "INDIANA", "IOWA", "KANSAS", "KENTUCKY", "LOUISIANA", "MAINE", "MARYLAND", "MASSACHUSETTS",
    "MICHIGAN", "MINNESOTA", "MISSISSIPPI", "MISSOURI", "MONTANA", "NEBRASKA", "NEVADA",
    "NEW HAMPSHIRE", "NEW JERSEY", "NEW MEXICO", "NEW YORK", "NORTH CAROLINA", "NORTH DAKOTA",
    "OHIO", "OKLAHOMA", "OREGON", "PENNSYLVANIA", "RHODE ISLAND", "SOUTH CAROLINA",
    "SOUTH DAKOTA", "TENNESSEE", "TEXAS", "UTAH", "VERMONT", "VIRGINIA", "WASHINGTON",
    "WEST VIRGINIA", "WISCONSIN", "WYOMING",
];

static HEADER_STAMP_COURT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z][a-z .'-]*\s+(?:superior|circuit|supreme)\s+court\b[\w .#-]*$").unwrap()
});
static HEADER_STAMP_COUNTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z .'-]*\s+county,\s*indiana$").unwrap());
static COUNTY_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^COUNTY OF\b\s*(?P<county>.*?)(?:\s+(?P<rest>(?:CAUSE\s+N(?:O|UMBER)\b|SS\b|IN THE\b|(?:SUPERIOR|CIRCUIT|SUPREME)\s+COURT\b).*))?$",
    )
    .unwrap()
});
static CAUSE_NO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)CAUSE\s+N(?:O|UMBER)\.?\s*:?\s*(?P<number>.*)$").unwrap()
});
static VENUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^SS(?:\s*:\s*(?P<division>.*)|\s*)$").unwrap());
static COURT_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:SUPERIOR|CIRCUIT|SUPREME)\s+COURT").unwrap());
static BARE_COUNTY_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z .'-]*\s+COUNTY$").unwrap());
static IN_THE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^IN THE\s+").unwrap());
static STATE_OF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^STATE OF\b\s*(?P<after>.*)$").unwrap());
static STATE_THEN_COURT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<state>.+?)\s+(?P<court>IN THE\s+.*)$").unwrap());
static CAUSE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)CAUSE\s+N").unwrap());

/// Parse the caption at the head of `lines`.
///
/// A missing `STATE OF` line is not an error: the result carries
/// `caption: None` and `body_start: 0`, and the whole input is body text.
pub fn parse_caption(lines: &[RawLine]) -> CaptionParse {
    let at = skip_filing_noise(lines, 0);
    let at = skip_header_stamps(lines, at);
    let Some(state_at) = find_state_line(lines, at) else {
        debug!(lines = lines.len(), "no caption block found");
        return CaptionParse::no_caption();
    };

    let (header, at) = collect_header(lines, state_at);
    let mut caption = parse_header(&header);
    let (parties, body_start) = parse_parties(lines, at);
    caption.parties = parties;

    debug!(
        parties = caption.parties.len(),
        body_start, "caption parsed"
    );
    CaptionParse {
        caption: Some(caption),
        body_start,
    }
}

// ── Preamble ──────────────────────────────────────────────────────────────────

fn is_blank(line: &RawLine) -> bool {
    line.text.trim().is_empty()
}

fn skip_filing_noise(lines: &[RawLine], at: usize) -> usize {
    let mut next = at;
    while next < lines.len() && (is_blank(&lines[next]) || is_filing_stamp_noise(&lines[next].text)) {
        next += 1;
    }
    next
}

/// Free-standing `X County, Indiana` / `X Superior Court` banners that some
/// exports print above the real caption.
fn is_header_stamp(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.contains(')') {
        return false;
    }
    let upper = trimmed.to_uppercase();
    if upper.starts_with("STATE OF") || upper.starts_with("IN THE ") {
        return false;
    }
    HEADER_STAMP_COUNTY.is_match(trimmed) || HEADER_STAMP_COURT.is_match(trimmed)
}

fn skip_header_stamps(lines: &[RawLine], at: usize) -> usize {
    let mut next = at;
    while next < lines.len() {
        let line = &lines[next];
        if is_blank(line) || is_filing_stamp_noise(&line.text) || is_header_stamp(&line.text) {
            next += 1;
        } else {
            break;
        }
    }
    next
}

fn find_state_line(lines: &[RawLine], at: usize) -> Option<usize> {
    let end = lines.len().min(at + STATE_SEARCH_WINDOW);
    for (idx, line) in lines.iter().enumerate().take(end).skip(at) {
        let text = squash_whitespace(&strip_parens(&line.text));
        if text.starts_with("STATE OF") {
            return Some(idx);
        }
        if is_empty_connector_line(&text) || is_filing_stamp_noise(&line.text) {
            continue;
        }
        return None;
    }
    None
}

// ── Header block ──────────────────────────────────────────────────────────────

fn is_venue_related(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("CAUSE NO")
        || upper.contains("CAUSE NUMBER")
        || VENUE.is_match(&upper)
        || COURT_TYPE.is_match(&upper)
        || upper.starts_with("IN THE ")
        || upper.contains("DIVISION")
}

/// Collect up to ten header lines starting at the `STATE OF` line. Stops before
/// role markers, `v.` separators and document titles. Once `COUNTY OF` has been
/// seen, a second `STATE OF` or any line unrelated to venue also stops it.
fn collect_header(lines: &[RawLine], at: usize) -> (Vec<String>, usize) {
    let mut buffer = Vec::new();
    let mut seen_county = false;
    let mut next = at;

    while next < lines.len() && buffer.len() < MAX_HEADER_LINES {
        let raw = &lines[next].text;
        let text = squash_whitespace(&strip_parens(raw));
        if is_empty_connector_line(&text) || is_filing_stamp_noise(raw) {
            next += 1;
            continue;
        }
        if role_marker(&text).is_some() || is_versus_line(&text) || is_document_title_line(&text) {
            break;
        }
        let upper = text.to_uppercase();
        if seen_county && (upper.starts_with("STATE OF") || !is_venue_related(&text)) {
            debug!(line = lines[next].index, "header collection stopped at party block");
            break;
        }
        if upper.starts_with("COUNTY OF") {
            seen_county = true;
        }
        buffer.push(text);
        next += 1;
    }

    (buffer, next)
}

/// `<state> IN THE <court>` splits at `IN THE`. Otherwise the longest known
/// state name at the front of `after` wins, else its first word.
fn split_state(after: &str) -> (String, String) {
    if let Some(caps) = STATE_THEN_COURT.captures(after) {
        return (caps["state"].trim().to_string(), caps["court"].trim().to_string());
    }
    let known = US_STATES
        .iter()
        .copied()
        .filter(|state| starts_with_word(after, state))
        .max_by_key(|state| state.len());
    let (state, rest) = match known {
        Some(state) => after.split_at(state.len()),
        None => after.split_once(' ').unwrap_or((after, "")),
    };
    (state.trim().to_string(), rest.trim().to_string())
}

/// Case-insensitive `word` at the front of `text`, followed by a space or the end.
fn starts_with_word(text: &str, word: &str) -> bool {
    let Some(head) = text.get(..word.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(word) && text[word.len()..].chars().next().map_or(true, |c| c == ' ')
}

fn apply_venue(caption: &mut CaptionData, text: &str) -> bool {
    let Some(caps) = VENUE.captures(text) else {
        return false;
    };
    caption.has_venue_mark = true;
    if let Some(division) = caps.name("division") {
        let division = division.as_str().trim();
        if !division.is_empty() {
            caption.division = Some(division.to_string());
        }
    }
    true
}

fn apply_cause_number(caption: &mut CaptionData, text: &str) -> bool {
    let Some(caps) = CAUSE_NO.captures(text) else {
        return false;
    };
    let number = caps.name("number").map(|m| m.as_str().trim()).unwrap_or("");
    if !number.is_empty() {
        caption.cause_number = number.to_string();
    }
    true
}

fn court_from(text: &str) -> String {
    IN_THE.replace(text, "").trim().to_string()
}

fn parse_header(buffer: &[String]) -> CaptionData {
    let mut caption = CaptionData::default();

    for text in buffer {
        if let Some(caps) = STATE_OF.captures(text) {
            let (state, rest) = split_state(caps["after"].trim());
            if !state.is_empty() {
                caption.state = state;
            }
            if IN_THE.is_match(&rest) {
                caption.court = court_from(&rest);
            } else if apply_venue(&mut caption, &rest) {
                // `STATE OF INDIANA  )  SS:` layouts.
            } else if !rest.is_empty() && caption.court.is_empty() {
                caption.court = rest;
            }
            continue;
        }

        if text.len() < VENUE_LINE_MAX_LEN && apply_venue(&mut caption, text) {
            continue;
        }

        if let Some(caps) = COUNTY_OF.captures(text) {
            caption.county = caps
                .name("county")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            if let Some(rest) = caps.name("rest").map(|m| m.as_str().trim()) {
                if apply_cause_number(&mut caption, rest) || apply_venue(&mut caption, rest) {
                    continue;
                }
                if caption.court.is_empty() {
                    caption.court = court_from(rest);
                }
            }
            continue;
        }

        if apply_cause_number(&mut caption, text) {
            continue;
        }

        if caption.court.is_empty() && (COURT_TYPE.is_match(text) || IN_THE.is_match(text)) {
            caption.court = court_from(text);
        }
    }

    reassemble_wrapped_court(&mut caption, buffer);
    caption
}

/// `IN THE MARION COUNTY` on one line and `SUPERIOR COURT NO. 7` on the next
/// is one court name split by the export's line wrapping.
fn reassemble_wrapped_court(caption: &mut CaptionData, buffer: &[String]) {
    if !BARE_COUNTY_FRAGMENT.is_match(&caption.court) || COURT_TYPE.is_match(&caption.court) {
        return;
    }
    for text in buffer {
        let Some(found) = COURT_TYPE.find(text) else {
            continue;
        };
        let mut tail = &text[found.start()..];
        if let Some(cause) = CAUSE_START.find(tail) {
            tail = &tail[..cause.start()];
        }
        caption.court = format!("{} {}", caption.court, tail.trim());
        return;
    }
}

// ── Party block ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct PartyScan {
    pending: Vec<String>,
    last_role: Option<String>,
    seen_separator: bool,
    parties: Vec<Party>,
}

impl PartyScan {
    /// Each buffered name becomes its own party only under a plural role with
    /// more than one name line; otherwise the lines are one wrapped name.
    fn flush(&mut self, role: &str, plural: bool) {
        if self.pending.is_empty() {
            return;
        }
        let names = std::mem::take(&mut self.pending);
        if plural && names.len() > 1 {
            self.parties
                .extend(names.into_iter().map(|name| Party::new(name, role)));
        } else {
            self.parties.push(Party::new(names.join(" "), role));
        }
    }

    fn default_role(&self) -> String {
        self.last_role.clone().unwrap_or_else(|| {
            if self.seen_separator {
                DEFAULT_DEFENDANT_ROLE.to_string()
            } else {
                DEFAULT_PLAINTIFF_ROLE.to_string()
            }
        })
    }

    fn finish(mut self) -> Vec<Party> {
        let role = self.default_role();
        self.flush(&role, false);
        self.parties
    }
}

fn clean_name_fragment(text: &str) -> String {
    text.trim_end_matches([',', ';']).trim().to_string()
}

/// Parties from `at` until a document title, an over-long body line, or the
/// end of input.
fn parse_parties(lines: &[RawLine], at: usize) -> (Vec<Party>, usize) {
    let mut scan = PartyScan::default();
    let mut next = at;

    while next < lines.len() {
        let raw = &lines[next].text;
        let text = squash_whitespace(&strip_parens(raw));

        if is_document_title_line(&text) {
            break;
        }
        if is_filing_stamp_noise(raw) || is_empty_connector_line(&text) {
            next += 1;
            continue;
        }
        if is_versus_line(&text) {
            let role = scan
                .last_role
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAINTIFF_ROLE.to_string());
            scan.flush(&role, false);
            scan.seen_separator = true;
            scan.last_role = None;
            next += 1;
            continue;
        }
        if let Some(marker) = role_marker(&text) {
            scan.flush(&marker.role, marker.plural);
            scan.last_role = Some(marker.role);
            next += 1;
            continue;
        }
        if text.chars().count() >= PARTY_LINE_MAX_LEN {
            break;
        }
        scan.pending.push(clean_name_fragment(&text));
        next += 1;
    }

    (scan.finish(), next)
}
