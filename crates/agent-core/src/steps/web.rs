//! Web Search Step

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::engine::EngineConfig;
use crate::state::{SearchHit, SharedState};
use crate::step::StepReport;

pub async fn run(
    state: &mut SharedState,
    adapters: &AdapterSet,
    config: &EngineConfig,
) -> StepReport {
    let input = ToolInput::new()
        .with("query", json!(state.user_query()))
        .with("limit", json!(config.search_result_limit));
    let outcome = adapters.invoke(names::WEB_SEARCH, input).await;

    if !outcome.success {
        return StepReport::from_error(format!(
            "Web search failed: {}",
            outcome.error_text()
        ));
    }

    let hits: Vec<SearchHit> = outcome.field("results").unwrap_or_default();
    tracing::debug!(request = %state.id(), hits = hits.len(), "web search finished");
    state.search_hits = Some(hits);
    StepReport::ok()
}
