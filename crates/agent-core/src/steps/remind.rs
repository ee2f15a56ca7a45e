//! Reminder Creation Step
//!
//! Creates one reminder per due-dated record the query step found. A
//! record without a due date is skipped silently; a creation failure is a
//! failure note and the loop continues.

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::state::SharedState;
use crate::step::StepReport;

pub async fn run(state: &mut SharedState, adapters: &AdapterSet) -> StepReport {
    let due_records: Vec<(String, String, String)> = state
        .query_results
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|record| {
            record.due_date().map(|due| {
                (
                    record.id.clone(),
                    format!("{} due", record.vendor()),
                    due.to_string(),
                )
            })
        })
        .collect();

    let mut report = StepReport::ok();
    let mut reminder_ids = Vec::new();

    for (record_id, title, due_date) in due_records {
        let input = ToolInput::new()
            .with("title", json!(&title))
            .with("due_date", json!(due_date))
            .with("record_id", json!(record_id));
        let outcome = adapters.invoke(names::CREATE_REMINDER, input).await;
        if outcome.success {
            if let Some(id) = outcome.str("reminder_id") {
                reminder_ids.push(id.to_string());
            }
        } else {
            report.push(format!(
                "Failed creating reminder '{}': {}",
                title,
                outcome.error_text()
            ));
        }
    }

    tracing::info!(
        request = %state.id(),
        created = reminder_ids.len(),
        "reminder creation finished"
    );
    state.reminder_ids = Some(reminder_ids);
    report
}
