//! Planner
//!
//! Maps an intent to an ordered step sequence. The mapping is a single
//! declarative table: total over the intent enumeration, deterministic, and
//! auditable in one place. Adding a new intent means adding one row here,
//! not new control flow in the steps.

use crate::intent::Intent;
use crate::state::{Entities, SharedState};
use crate::step::Step;

/// Build the execution plan for a classified request.
///
/// Every intent yields a fixed, non-empty sequence; labels outside the
/// closed set fall to the retrieve-then-respond fallback. The only entity
/// consulted is the attachment hint: a scan the classifier marked as not
/// needing attachments skips document parsing and extracts from message
/// bodies instead.
pub fn plan_for(intent: &Intent, entities: &Entities) -> Vec<Step> {
    use Step::*;

    match intent {
        Intent::ScanBills | Intent::ScanMailbox => {
            if entities.require_attachments == Some(false) {
                vec![MailboxScan, RecordExtraction, StoreIndexing, ResponseGeneration]
            } else {
                vec![
                    MailboxScan,
                    DocumentParsing,
                    RecordExtraction,
                    StoreIndexing,
                    ResponseGeneration,
                ]
            }
        }
        Intent::QueryHistory | Intent::AnalyzeSpending => {
            vec![RecordQuery, ResponseGeneration]
        }
        Intent::SetReminder => vec![RecordQuery, ReminderCreation, ResponseGeneration],
        Intent::FindAlternatives => vec![RecordQuery, WebSearch, ResponseGeneration],
        Intent::ManualAdd => vec![RecordExtraction, StoreIndexing, ResponseGeneration],
        Intent::Unknown | Intent::Other(_) => vec![StoreRetrieval, ResponseGeneration],
    }
}

/// Plan the request in place: write the plan once and ledger the step.
pub fn apply(state: &mut SharedState) {
    let plan = plan_for(&state.intent, &state.entities);
    tracing::info!(
        request = %state.id(),
        intent = %state.intent,
        plan = ?plan.iter().map(Step::to_string).collect::<Vec<_>>(),
        "plan created"
    );
    state.set_plan(plan);
    state.mark_completed(Step::Planning);
}
