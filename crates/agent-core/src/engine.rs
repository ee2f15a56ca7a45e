//! Execution Engine
//!
//! The driving loop for one request: classify, route, plan, then walk the
//! plan one scheduling decision at a time until the terminal step. A single
//! logical thread of control owns the state for the whole walk; each step
//! runs to completion before the next decision is made. The engine itself
//! never fails: step handlers fold their failures into the state and the
//! user always gets some final response text.

use std::sync::Arc;

use crate::adapter::AdapterSet;
use crate::planner;
use crate::router::{self, ClassifyRoute};
use crate::scheduler::next_step;
use crate::state::SharedState;
use crate::step::{Step, StepReport};
use crate::steps;

/// Engine bounds and defaults
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Scan window when the classifier did not give one, in days
    pub default_scan_window_days: u32,

    /// Cap on messages fetched per mailbox scan
    pub max_scan_results: u32,

    /// Cap on similarity-search results
    pub retrieval_limit: usize,

    /// Cap on web search results
    pub search_result_limit: usize,

    /// Cap on records included in the response context
    pub response_record_limit: usize,

    /// Cap on retrieved documents included in the response context
    pub response_document_limit: usize,

    /// Per-document character budget in the response context
    pub response_snippet_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_scan_window_days: 30,
            max_scan_results: 50,
            retrieval_limit: 5,
            search_result_limit: 5,
            response_record_limit: 10,
            response_document_limit: 5,
            response_snippet_chars: 600,
        }
    }
}

/// The plan-execution engine
pub struct Engine {
    adapters: Arc<AdapterSet>,
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine over a set of registered adapters
    pub fn new(adapters: Arc<AdapterSet>, config: EngineConfig) -> Self {
        Self { adapters, config }
    }

    /// Create with default bounds
    pub fn with_defaults(adapters: Arc<AdapterSet>) -> Self {
        Self::new(adapters, EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one request from query to terminal and return the final state.
    ///
    /// Control flow: classification, then the post-classification route
    /// (planner or error terminal), then planning, then the post-plan route
    /// (first step or straight to the response terminal), then the
    /// scheduling loop until the plan is exhausted.
    pub async fn handle(&self, user_query: &str) -> SharedState {
        let mut state = SharedState::new(user_query);
        tracing::info!(request = %state.id(), "request accepted");

        let report = steps::classify::run(&mut state, &self.adapters).await;
        self.merge(&mut state, report);

        match router::after_classify(&state.intent) {
            ClassifyRoute::ErrorTerminal => {
                steps::terminal::error_report(&mut state);
                return state;
            }
            ClassifyRoute::Plan => {}
        }

        planner::apply(&mut state);

        if router::after_plan(state.plan()).is_none() {
            let report =
                steps::terminal::respond(&mut state, &self.adapters, &self.config).await;
            self.merge(&mut state, report);
            state.mark_completed(Step::ResponseGeneration);
            return state;
        }

        while self.advance(&mut state).await.is_some() {}

        tracing::info!(
            request = %state.id(),
            steps = state.completed().len(),
            errors = state.errors().len(),
            "request finished"
        );
        state
    }

    /// Make one scheduling decision: execute the next unexecuted plan step
    /// and ledger it. Returns the step executed, or `None` at the terminal.
    ///
    /// Each call either grows the ledger by exactly one entry or observes an
    /// exhausted plan, so driving this in a loop terminates within
    /// `plan.len() + 1` decisions.
    pub async fn advance(&self, state: &mut SharedState) -> Option<Step> {
        let step = next_step(state.plan(), state.completed())?;
        tracing::debug!(request = %state.id(), step = %step, "executing step");

        let report = self.dispatch(step, state).await;
        self.merge(state, report);
        state.mark_completed(step);
        Some(step)
    }

    async fn dispatch(&self, step: Step, state: &mut SharedState) -> StepReport {
        match step {
            // Pre-plan stages; they appear in the ledger but never in plans.
            Step::IntentClassification | Step::Planning => StepReport::ok(),
            Step::MailboxScan => {
                steps::scan::run(state, &self.adapters, &self.config).await
            }
            Step::DocumentParsing => steps::parse::run(state, &self.adapters).await,
            Step::RecordExtraction => steps::extract::run(state, &self.adapters).await,
            Step::StoreIndexing => steps::index::run(state, &self.adapters).await,
            Step::StoreRetrieval => {
                steps::retrieve::run(state, &self.adapters, &self.config).await
            }
            Step::RecordQuery => steps::query::run(state, &self.adapters).await,
            Step::WebSearch => steps::web::run(state, &self.adapters, &self.config).await,
            Step::ReminderCreation => steps::remind::run(state, &self.adapters).await,
            Step::ResponseGeneration => {
                steps::terminal::respond(state, &self.adapters, &self.config).await
            }
        }
    }

    fn merge(&self, state: &mut SharedState, report: StepReport) {
        for error in report.errors {
            tracing::warn!(request = %state.id(), error = %error, "step reported failure");
            state.push_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{names, ToolAdapter, ToolInput, ToolOutcome};
    use crate::intent::Intent;
    use async_trait::async_trait;
    use serde_json::json;

    /// Adapter that always returns the same canned outcome
    struct StubAdapter {
        name: &'static str,
        outcome: ToolOutcome,
    }

    impl StubAdapter {
        fn new(name: &'static str, outcome: ToolOutcome) -> Self {
            Self { name, outcome }
        }
    }

    #[async_trait]
    impl ToolAdapter for StubAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn invoke(&self, _input: ToolInput) -> ToolOutcome {
            self.outcome.clone()
        }
    }

    /// Reminder adapter that rejects one specific title
    struct PickyReminderAdapter;

    #[async_trait]
    impl ToolAdapter for PickyReminderAdapter {
        fn name(&self) -> &str {
            names::CREATE_REMINDER
        }

        async fn invoke(&self, input: ToolInput) -> ToolOutcome {
            let title = input.str("title").unwrap_or_default();
            if title.contains("Acme") {
                ToolOutcome::failure("calendar rejected the entry")
            } else {
                ToolOutcome::ok().with("reminder_id", json!(format!("rem-{}", title.len())))
            }
        }
    }

    fn classify_stub(intent: &str) -> StubAdapter {
        StubAdapter::new(
            names::CLASSIFY_INTENT,
            ToolOutcome::ok()
                .with("intent", json!(intent))
                .with("confidence", json!(0.9))
                .with("entities", json!({})),
        )
    }

    fn generate_stub() -> StubAdapter {
        StubAdapter::new(
            names::GENERATE_RESPONSE,
            ToolOutcome::ok().with("response", json!("Here is what I found.")),
        )
    }

    fn empty_scan_outcome() -> ToolOutcome {
        ToolOutcome::ok()
            .with("messages", json!([]))
            .with("found", json!(0))
            .with("kept", json!(0))
            .with("filtered_out", json!(0))
            .with("downloaded", json!(0))
    }

    #[tokio::test]
    async fn test_scan_request_visits_full_pipeline_in_order() {
        let mut adapters = AdapterSet::new();
        adapters.register(classify_stub("scan_bills"));
        adapters.register(StubAdapter::new(names::SCAN_MAILBOX, empty_scan_outcome()));
        adapters.register(StubAdapter::new(names::PARSE_DOCUMENT, ToolOutcome::ok()));
        adapters.register(StubAdapter::new(names::EXTRACT_RECORDS, ToolOutcome::ok()));
        adapters.register(StubAdapter::new(names::SAVE_RECORD, ToolOutcome::ok()));
        adapters.register(StubAdapter::new(names::INDEX_DOCUMENT, ToolOutcome::ok()));
        adapters.register(generate_stub());

        let engine = Engine::with_defaults(Arc::new(adapters));
        let state = engine.handle("scan my inbox for bills").await;

        assert_eq!(state.intent, Intent::ScanBills);
        assert_eq!(
            state.completed(),
            &[
                Step::IntentClassification,
                Step::Planning,
                Step::MailboxScan,
                Step::DocumentParsing,
                Step::RecordExtraction,
                Step::StoreIndexing,
                Step::ResponseGeneration,
            ]
        );
        assert_eq!(
            state.final_response.as_deref(),
            Some("Here is what I found.")
        );
    }

    #[tokio::test]
    async fn test_classification_failure_short_circuits_to_error_terminal() {
        let mut adapters = AdapterSet::new();
        adapters.register(StubAdapter::new(
            names::CLASSIFY_INTENT,
            ToolOutcome::failure("timeout"),
        ));

        let engine = Engine::with_defaults(Arc::new(adapters));
        let state = engine.handle("???").await;

        assert_eq!(state.intent, Intent::Unknown);
        assert_eq!(state.errors(), &["Intent failed: timeout".to_string()]);
        assert!(state.plan().is_empty());
        let response = state.final_response.as_deref().unwrap();
        assert!(response.contains("Intent failed: timeout"));
    }

    #[tokio::test]
    async fn test_item_failure_does_not_stop_later_steps() {
        let records: Vec<_> = ["Acme", "Hydro", "Telco", "Water", "Rent"]
            .iter()
            .map(|vendor| {
                json!({
                    "id": format!("rec-{}", vendor),
                    "category": "bills",
                    "fields": {"vendor": vendor, "due_date": "2026-09-01"},
                })
            })
            .collect();

        let mut adapters = AdapterSet::new();
        adapters.register(classify_stub("set_reminder"));
        adapters.register(StubAdapter::new(
            names::QUERY_RECORDS,
            ToolOutcome::ok().with("records", json!(records)),
        ));
        adapters.register(PickyReminderAdapter);
        adapters.register(generate_stub());

        let engine = Engine::with_defaults(Arc::new(adapters));
        let state = engine.handle("remind me about upcoming bills").await;

        assert_eq!(
            state.completed(),
            &[
                Step::IntentClassification,
                Step::Planning,
                Step::RecordQuery,
                Step::ReminderCreation,
                Step::ResponseGeneration,
            ]
        );
        // Exactly one of the five reminders failed.
        assert_eq!(state.errors().len(), 1);
        assert!(state.errors()[0].contains("Acme"));
        assert_eq!(state.reminder_ids.as_deref().unwrap().len(), 4);
        assert!(state.final_response.is_some());
    }

    #[tokio::test]
    async fn test_unrecognized_intent_falls_back_to_retrieve_then_respond() {
        let mut adapters = AdapterSet::new();
        adapters.register(classify_stub("weather_report"));
        adapters.register(StubAdapter::new(
            names::SEARCH_STORE,
            ToolOutcome::ok().with("results", json!([])),
        ));
        adapters.register(generate_stub());

        let engine = Engine::with_defaults(Arc::new(adapters));
        let state = engine.handle("will it rain tomorrow?").await;

        assert_eq!(state.plan().len(), 2);
        assert_eq!(
            state.plan(),
            &[Step::StoreRetrieval, Step::ResponseGeneration]
        );
        assert!(state.final_response.is_some());
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_apology() {
        let mut adapters = AdapterSet::new();
        adapters.register(classify_stub("query_history"));
        adapters.register(StubAdapter::new(
            names::QUERY_RECORDS,
            ToolOutcome::ok().with("records", json!([])),
        ));
        adapters.register(StubAdapter::new(
            names::GENERATE_RESPONSE,
            ToolOutcome::failure("model overloaded"),
        ));

        let engine = Engine::with_defaults(Arc::new(adapters));
        let state = engine.handle("what did you find?").await;

        let response = state.final_response.as_deref().unwrap();
        assert!(response.contains("Sorry"));
        assert!(state
            .errors()
            .iter()
            .any(|e| e.contains("model overloaded")));
        assert!(state.is_completed(Step::ResponseGeneration));
    }

    #[tokio::test]
    async fn test_state_survives_serialization_between_decisions() {
        let mut adapters = AdapterSet::new();
        adapters.register(classify_stub("query_history"));
        adapters.register(StubAdapter::new(
            names::QUERY_RECORDS,
            ToolOutcome::ok().with("records", json!([])),
        ));
        adapters.register(generate_stub());
        let engine = Engine::with_defaults(Arc::new(adapters));

        let mut state = SharedState::new("what did you find?");
        let report = steps::classify::run(&mut state, &engine.adapters).await;
        assert!(report.is_clean());
        planner::apply(&mut state);
        engine.advance(&mut state).await;

        // Freeze mid-plan, thaw, keep going.
        let frozen = serde_json::to_string(&state).unwrap();
        let mut thawed: SharedState = serde_json::from_str(&frozen).unwrap();
        assert_eq!(thawed.plan(), state.plan());
        assert_eq!(thawed.completed(), state.completed());
        assert_eq!(thawed.errors(), state.errors());

        while engine.advance(&mut thawed).await.is_some() {}
        assert!(thawed.is_completed(Step::ResponseGeneration));
        assert!(thawed.final_response.is_some());

        // The terminal decision is stable: advancing again changes nothing.
        let ledger_before = thawed.completed().to_vec();
        assert!(engine.advance(&mut thawed).await.is_none());
        assert_eq!(thawed.completed(), ledger_before);
    }
}
