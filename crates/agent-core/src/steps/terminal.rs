//! Terminal Steps
//!
//! Response generation consumes whatever result slots are populated and
//! asks the generation adapter for the final answer; the context bundle is
//! bounded so a large scan cannot blow up the prompt. The error terminal
//! skips generation entirely and surfaces the accumulated failure notes.

use serde_json::{json, Value};

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::engine::EngineConfig;
use crate::state::SharedState;
use crate::step::StepReport;

/// Truncate to a character budget, marking the cut
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{}...", clipped)
}

/// Bounded context bundle handed to the generation adapter
fn build_context(state: &SharedState, config: &EngineConfig) -> Value {
    let records: Vec<Value> = state
        .records
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(config.response_record_limit)
        .map(|record| {
            json!({
                "category": record.category,
                "fields": &record.fields,
                "source": &record.source,
            })
        })
        .collect();

    let query_results: Vec<Value> = state
        .query_results
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(config.response_record_limit)
        .map(|record| json!({"category": record.category, "fields": &record.fields}))
        .collect();

    let documents: Vec<Value> = state
        .retrieved
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(config.response_document_limit)
        .map(|doc| {
            json!({
                "text": clip(&doc.text, config.response_snippet_chars),
                "score": doc.score,
                "source": &doc.source,
            })
        })
        .collect();

    let search_hits: Vec<Value> = state
        .search_hits
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(config.search_result_limit)
        .map(|hit| json!({"title": &hit.title, "url": &hit.url, "snippet": &hit.snippet}))
        .collect();

    json!({
        "intent": &state.intent,
        "category": state.entities.category,
        "records": records,
        "query_results": query_results,
        "documents": documents,
        "search_hits": search_hits,
        "reminders_created": state.reminder_ids.as_deref().unwrap_or_default().len(),
        "errors": state.errors(),
    })
}

/// Response-generation terminal
pub async fn respond(
    state: &mut SharedState,
    adapters: &AdapterSet,
    config: &EngineConfig,
) -> StepReport {
    let input = ToolInput::new()
        .with("user_query", json!(state.user_query()))
        .with("context", build_context(state, config));
    let outcome = adapters.invoke(names::GENERATE_RESPONSE, input).await;

    if outcome.success {
        let response = outcome
            .str("response")
            .unwrap_or("I finished, but produced no answer text.")
            .to_string();
        state.final_response = Some(response);
        StepReport::ok()
    } else {
        // Generation failure never escapes: degrade to an apology.
        state.final_response = Some(
            "Sorry, I ran into a problem while putting your answer together. \
             Please try again in a moment."
                .to_string(),
        );
        StepReport::from_error(format!(
            "Response generation failed: {}",
            outcome.error_text()
        ))
    }
}

/// Error terminal: classification came back unknown, so planning and
/// execution are bypassed and the failure notes become the answer.
pub fn error_report(state: &mut SharedState) {
    let detail = if state.errors().is_empty() {
        "no further details were recorded".to_string()
    } else {
        state.errors().join("; ")
    };
    state.final_response = Some(format!(
        "I couldn't work out what you need. Errors encountered: {}",
        detail
    ));
    tracing::warn!(request = %state.id(), "request ended at error terminal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RetrievedDocument;

    #[test]
    fn test_clip_respects_budget() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("0123456789abc", 10), "0123456789...");
    }

    #[test]
    fn test_context_bounds_documents() {
        let mut state = SharedState::new("q");
        state.retrieved = Some(
            (0..20)
                .map(|i| RetrievedDocument {
                    text: "x".repeat(2000),
                    score: 1.0 - (i as f32) * 0.01,
                    source: None,
                })
                .collect(),
        );
        let config = EngineConfig::default();
        let context = build_context(&state, &config);
        let docs = context["documents"].as_array().unwrap();
        assert_eq!(docs.len(), config.response_document_limit);
        let text = docs[0]["text"].as_str().unwrap();
        assert!(text.chars().count() <= config.response_snippet_chars + 3);
    }

    #[test]
    fn test_error_report_surfaces_notes() {
        let mut state = SharedState::new("???");
        state.push_error("Intent failed: timeout");
        error_report(&mut state);
        let response = state.final_response.as_deref().unwrap();
        assert!(response.contains("Intent failed: timeout"));
    }
}
