//! CSV and JSON projections of the request collection

use crate::codec::{RowCodec, CANONICAL_HEADER};
use crate::types::Request;

/// Render records as CSV with the canonical header
#[must_use]
pub fn to_csv(records: &[Request]) -> String {
    let codec = RowCodec::current();
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CANONICAL_HEADER.join(","));
    for record in records {
        let line: Vec<String> = codec
            .encode(record)
            .iter()
            .map(|cell| csv_escape(cell))
            .collect();
        lines.push(line.join(","));
    }
    lines.join("\n")
}

/// Render records as pretty JSON.
///
/// # Errors
/// Returns the serializer error, which only happens on a broken writer.
pub fn to_json(records: &[Request]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Quote a cell if it holds a quote, comma or line break
#[must_use]
pub fn csv_escape(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
