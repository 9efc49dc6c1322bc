use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{lines_from_text, ExportFilingRequest, ExportFilingResponse, IngestFilingResponse},
    },
    document::tree::{self, DocumentNode, NodeKind},
    parser::parse_filing,
    render::{export, FormattingRules, OptionSets},
};

fn read_input(file_path: &str) -> AppResult<(PathBuf, String)> {
    let path = PathBuf::from(file_path);
    if !path.exists() {
        return Err(AppError::InvalidInput(format!("file {file_path} does not exist")));
    }
    let text = std::fs::read_to_string(&path).map_err(|err| AppError::Io(err.to_string()))?;
    Ok((path, text))
}

fn is_tree_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "filing".to_string())
}

/// First level-1 heading, which the segmenter emits for the document title line.
fn title_heading(tree: &DocumentNode) -> Option<String> {
    tree.children().iter().find_map(|node| match node {
        DocumentNode::Heading { attrs, .. } if attrs.level == 1 => {
            let text = node.literal_text();
            (!text.trim().is_empty()).then(|| text.trim().to_string())
        }
        _ => None,
    })
}

pub fn ingest_filing(file_path: &str) -> AppResult<IngestFilingResponse> {
    let (_, text) = read_input(file_path)?;
    let parsed = parse_filing(&lines_from_text(&text));
    let node_count = parsed.body.node_count();
    let heading_count = parsed.body.count_kind(NodeKind::Heading);
    info!(file_path, node_count, heading_count, "filing ingested");
    Ok(IngestFilingResponse {
        parsed,
        node_count,
        heading_count,
    })
}

pub fn export_filing(request: ExportFilingRequest) -> AppResult<ExportFilingResponse> {
    let (input, text) = read_input(&request.input_path)?;
    let tree = if is_tree_file(&input) {
        tree::from_json_str(&text)?
    } else {
        parse_filing(&lines_from_text(&text)).to_document()
    };

    let rules = match request.rules_path.as_deref() {
        Some(path) => FormattingRules::load(Path::new(path))?,
        None => FormattingRules::default(),
    };
    let options = match request.options_path.as_deref() {
        Some(path) => OptionSets::load(Path::new(path))?,
        None => OptionSets::new(),
    };
    let title = request
        .title
        .clone()
        .or_else(|| title_heading(&tree))
        .unwrap_or_else(|| stem(&input));

    let bytes = export(request.format, &tree, &title, &rules, &options)?;

    let mut output = PathBuf::from(&request.output_path);
    if output.extension().is_none() {
        output.set_extension(request.format.extension());
    }
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
    }
    std::fs::write(&output, &bytes).map_err(|err| AppError::Io(err.to_string()))?;

    info!(
        output = %output.display(),
        format = %request.format,
        bytes = bytes.len(),
        "filing exported"
    );
    Ok(ExportFilingResponse {
        file_path: output.to_string_lossy().to_string(),
        bytes_written: bytes.len(),
    })
}
