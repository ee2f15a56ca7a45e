//! Store Retrieval Step
//!
//! Similarity search over everything indexed so far, used by the fallback
//! plan when no more specific handling applies.

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::engine::EngineConfig;
use crate::state::{RetrievedDocument, SharedState};
use crate::step::StepReport;

pub async fn run(
    state: &mut SharedState,
    adapters: &AdapterSet,
    config: &EngineConfig,
) -> StepReport {
    let input = ToolInput::new()
        .with("query", json!(state.user_query()))
        .with("limit", json!(config.retrieval_limit));
    let outcome = adapters.invoke(names::SEARCH_STORE, input).await;

    if !outcome.success {
        return StepReport::from_error(format!(
            "Retrieval failed: {}",
            outcome.error_text()
        ));
    }

    let results: Vec<RetrievedDocument> = outcome.field("results").unwrap_or_default();
    tracing::debug!(request = %state.id(), hits = results.len(), "store retrieval finished");
    state.retrieved = Some(results);
    StepReport::ok()
}
