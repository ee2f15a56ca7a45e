//! Tool Adapters
//!
//! Concrete implementations of the engine's adapter contract, one per
//! capability. Each folds its failures into the outcome; nothing here
//! panics or leaks an error type across the contract boundary.

mod classify;
mod extract;
mod parse;
mod remind;
mod respond;
mod scan;
mod store_ops;
mod web;

pub use classify::ClassifyIntentAdapter;
pub use extract::ExtractRecordsAdapter;
pub use parse::ParseDocumentAdapter;
pub use remind::CreateReminderAdapter;
pub use respond::GenerateResponseAdapter;
pub use scan::{ScanMailboxAdapter, ScanMailboxConfig};
pub use store_ops::{
    IndexDocumentAdapter, QueryRecordsAdapter, SaveRecordAdapter, SearchStoreAdapter,
};
pub use web::{WebSearchAdapter, WebSearchConfig};

use serde_json::Value;

/// Pull a JSON object out of model output: a fenced ```json block if
/// present, otherwise the outermost brace span.
pub(crate) fn extract_json(output: &str) -> Option<Value> {
    let trimmed = output.trim();

    let candidate = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        match rest.find("```") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        }
    } else {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end <= start {
            return None;
        }
        &trimmed[start..=end]
    };

    serde_json::from_str(candidate).ok()
}

/// Make text safe for a filename: alphanumerics kept, whitespace runs
/// collapsed to underscores, everything else dropped.
pub(crate) fn sanitize_filename(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}
