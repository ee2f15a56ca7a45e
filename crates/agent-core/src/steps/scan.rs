//! Mailbox Scan Step
//!
//! Computes the scan window from the classified entities and hands the
//! whole fetch to the scan adapter: query construction, relevance
//! filtering, and attachment downloads all happen behind the contract.

use chrono::{Duration, Utc};
use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::engine::EngineConfig;
use crate::state::{ScanOutcome, SharedState};
use crate::step::StepReport;

pub async fn run(
    state: &mut SharedState,
    adapters: &AdapterSet,
    config: &EngineConfig,
) -> StepReport {
    let days = state
        .entities
        .scan_window_days
        .unwrap_or(config.default_scan_window_days);
    let date_to = Utc::now().date_naive();
    let date_from = date_to - Duration::days(i64::from(days));
    let require_attachments = state.entities.require_attachments.unwrap_or(true);

    let mut input = ToolInput::new()
        .with("user_query", json!(state.user_query()))
        .with("date_from", json!(date_from.format("%Y-%m-%d").to_string()))
        .with("date_to", json!(date_to.format("%Y-%m-%d").to_string()))
        .with("max_results", json!(config.max_scan_results))
        .with("require_attachments", json!(require_attachments));
    if let Some(category) = state.entities.category {
        input = input.with("category", json!(category));
    }

    let outcome = adapters.invoke(names::SCAN_MAILBOX, input).await;

    if !outcome.success {
        return StepReport::from_error(format!("Scan failed: {}", outcome.error_text()));
    }

    match outcome.payload_as::<ScanOutcome>() {
        Some(scan) => {
            tracing::info!(
                request = %state.id(),
                found = scan.found,
                kept = scan.kept,
                filtered_out = scan.filtered_out,
                downloaded = scan.downloaded,
                "mailbox scan finished"
            );
            state.scan = Some(scan);
            StepReport::ok()
        }
        None => StepReport::from_error("Scan failed: unreadable scan payload"),
    }
}
