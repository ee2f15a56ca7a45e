//! Record Query Step
//!
//! Direct lookup against the record store. A reminder request asks for
//! upcoming due dates; everything else is a keyword/category search.

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::intent::Intent;
use crate::state::{SharedState, StoredRecord};
use crate::step::StepReport;

pub async fn run(state: &mut SharedState, adapters: &AdapterSet) -> StepReport {
    let query_type = if state.intent == Intent::SetReminder {
        "upcoming"
    } else {
        "search"
    };

    let mut input = ToolInput::new()
        .with("query_type", json!(query_type))
        .with("keywords", json!(&state.entities.keywords));
    if let Some(category) = state.entities.category {
        input = input.with("category", json!(category));
    }

    let outcome = adapters.invoke(names::QUERY_RECORDS, input).await;

    if !outcome.success {
        return StepReport::from_error(format!("Query failed: {}", outcome.error_text()));
    }

    let records: Vec<StoredRecord> = outcome.field("records").unwrap_or_default();
    tracing::debug!(
        request = %state.id(),
        query_type,
        matches = records.len(),
        "record query finished"
    );
    state.query_results = Some(records);
    StepReport::ok()
}
