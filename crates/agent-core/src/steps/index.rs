//! Store Indexing Step
//!
//! Persists extracted records and indexes the raw document text for later
//! similarity search. Both loops are best-effort: a record that fails to
//! save or a document that fails to index becomes a failure note.

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::state::SharedState;
use crate::step::StepReport;

pub async fn run(state: &mut SharedState, adapters: &AdapterSet) -> StepReport {
    let mut report = StepReport::ok();
    let mut saved_ids = Vec::new();

    for record in state.records.as_deref().unwrap_or_default() {
        let input = ToolInput::new()
            .with("category", json!(record.category))
            .with("fields", json!(&record.fields))
            .with("source", json!(&record.source));
        let outcome = adapters.invoke(names::SAVE_RECORD, input).await;
        if outcome.success {
            if let Some(id) = outcome.str("record_id") {
                saved_ids.push(id.to_string());
            }
        } else {
            report.push(format!(
                "Failed saving record from {}: {}",
                record.source,
                outcome.error_text()
            ));
        }
    }

    for document in state.documents.as_deref().unwrap_or_default() {
        if document.text.trim().is_empty() {
            continue;
        }
        let input = ToolInput::new()
            .with("text", json!(&document.text))
            .with("source", json!(document.path.display().to_string()));
        let outcome = adapters.invoke(names::INDEX_DOCUMENT, input).await;
        if !outcome.success {
            report.push(format!(
                "Failed indexing {}: {}",
                document.path.display(),
                outcome.error_text()
            ));
        }
    }

    tracing::info!(
        request = %state.id(),
        saved = saved_ids.len(),
        "store indexing finished"
    );
    state.saved_record_ids = Some(saved_ids);
    report
}
