//! Intent Classification Step
//!
//! Labels the request and pulls out entities via the classification adapter.
//! Idempotent: re-entry on an already-classified request is a no-op. On
//! failure the intent degrades to unknown, which routes the request to the
//! error terminal instead of the planner.

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::intent::Intent;
use crate::state::{Entities, SharedState};
use crate::step::{Step, StepReport};

pub async fn run(state: &mut SharedState, adapters: &AdapterSet) -> StepReport {
    if state.is_completed(Step::IntentClassification) {
        return StepReport::ok();
    }

    let input = ToolInput::new().with("user_query", json!(state.user_query()));
    let outcome = adapters.invoke(names::CLASSIFY_INTENT, input).await;

    if outcome.success {
        let entities = outcome
            .value("entities")
            .map(Entities::from_value)
            .unwrap_or_default();
        let label = outcome.str("intent").unwrap_or("unknown");
        state.intent = Intent::from_label(label).refined(&entities);
        state.intent_confidence = (outcome.f64("confidence").unwrap_or(0.0) as f32).clamp(0.0, 1.0);
        state.entities = entities;
        state.mark_completed(Step::IntentClassification);
        tracing::info!(
            request = %state.id(),
            intent = %state.intent,
            confidence = state.intent_confidence,
            "intent classified"
        );
        StepReport::ok()
    } else {
        state.intent = Intent::Unknown;
        StepReport::from_error(format!("Intent failed: {}", outcome.error_text()))
    }
}
