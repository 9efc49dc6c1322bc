pub mod body;
pub mod caption;
pub mod classifier;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::core::types::{ParsedFiling, RawLine};
use crate::document::tree::{DocumentNode, NodeKind};

pub use body::segment_body;
pub use caption::parse_caption;

fn checksum_lines(lines: &[RawLine]) -> String {
    let mut hasher = Sha256::new();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"\n");
        }
        hasher.update(line.text.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Caption plus segmented body for one extracted filing.
pub fn parse_filing(lines: &[RawLine]) -> ParsedFiling {
    let parsed = parse_caption(lines);
    let body_start = parsed.body_start.min(lines.len());
    let body = DocumentNode::doc(segment_body(&lines[body_start..]));

    info!(
        lines = lines.len(),
        has_caption = parsed.caption.is_some(),
        body_start,
        headings = body.count_kind(NodeKind::Heading),
        "filing parsed"
    );

    ParsedFiling {
        caption: parsed.caption,
        body_start,
        body,
        source_checksum: checksum_lines(lines),
    }
}
