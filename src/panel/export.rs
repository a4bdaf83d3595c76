//! JSON and CSV exports of a collected tree.
//!
//! | Format | Default file | Content |
//! |--------|--------------|---------|
//! | JSON | [`JSON_FILE_NAME`] | `{ "dom": <tree> }`, pretty-printed |
//! | CSV | [`CSV_FILE_NAME`] | header plus one row per node, pre-order, every field quoted |

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;

use csv_async::{AsyncWriterBuilder, QuoteStyle};
use serde_json::json;
use tracing::debug;

use crate::collector::NodeDescriptor;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default JSON export file name.
pub const JSON_FILE_NAME: &str = "dom-analyzer.json";

/// Default CSV export file name.
pub const CSV_FILE_NAME: &str = "dom-analyzer.csv";

/// CSV header row.
pub const CSV_HEADER: [&str; 9] = [
    "uniqueIndex",
    "nodeType",
    "tagName",
    "nodeName",
    "id",
    "class",
    "descendantsCount",
    "attributesCount",
    "depth",
];

// ============================================================================
// JSON
// ============================================================================

/// Serializes `{ "dom": dom }` with two-space indentation.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn to_json(dom: &NodeDescriptor) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({ "dom": dom }))?)
}

/// Writes the JSON export to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn write_json(dom: &NodeDescriptor, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = to_json(dom)?;
    tokio::fs::write(path, text).await?;

    debug!(path = %path.display(), "JSON export written");
    Ok(())
}

// ============================================================================
// CSV
// ============================================================================

/// Serializes the flattened tree as CSV.
///
/// # Errors
///
/// Returns [`Error::Csv`](crate::Error::Csv) if a record cannot be written.
pub async fn to_csv(dom: &NodeDescriptor) -> Result<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = AsyncWriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .create_writer(&mut buffer);

        writer.write_record(CSV_HEADER).await?;
        for node in dom.flatten() {
            writer.write_record(csv_row(node)).await?;
        }
        writer.flush().await?;
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes the CSV export to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn write_csv(dom: &NodeDescriptor, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = to_csv(dom).await?;
    tokio::fs::write(path, text).await?;

    debug!(path = %path.display(), "CSV export written");
    Ok(())
}

fn csv_row(node: &NodeDescriptor) -> [String; 9] {
    [
        node.unique_index.to_string(),
        node.node_type().to_string(),
        node.tag_name().unwrap_or_default().to_owned(),
        node.node_name().to_owned(),
        node.id().unwrap_or_default().to_owned(),
        dot_whitespace(node.class().unwrap_or_default()),
        node.descendants_count.to_string(),
        node.attributes().len().to_string(),
        node.depth.to_string(),
    ]
}

/// Replaces every run of whitespace with a single `.`.
fn dot_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for ch in value.chars() {
        if is_class_separator(ch) {
            if !in_run {
                out.push('.');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// ECMAScript `\s`: Unicode `White_Space` without U+0085, plus U+FEFF.
fn is_class_separator(ch: char) -> bool {
    ch == '\u{feff}' || (ch.is_whitespace() && ch != '\u{85}')
}

// ============================================================================
// Tests
// ============================================================================
