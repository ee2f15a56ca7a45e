//! Record Extraction Step
//!
//! Turns text into category-shaped records. Parsed attachments are the
//! primary source; when they yield nothing the step falls back to scanned
//! message bodies, and for a manual add (no scan at all) to the query text
//! itself. Documents are independent, so the per-document adapter calls
//! run concurrently; results are published only after every call settles.

use futures::future::join_all;
use serde_json::{json, Map, Value};

use crate::adapter::{names, AdapterSet, ToolInput, ToolOutcome};
use crate::intent::Intent;
use crate::state::{ExtractedRecord, RecordCategory, SharedState};
use crate::step::StepReport;

/// A unit of text to extract from, with a label for error notes
struct SourceText {
    source: String,
    text: String,
}

async fn extract_batch(
    adapters: &AdapterSet,
    category: RecordCategory,
    sources: Vec<SourceText>,
) -> (Vec<ExtractedRecord>, Vec<String>) {
    let calls = sources.into_iter().map(|item| async move {
        let input = ToolInput::new()
            .with("text", json!(item.text))
            .with("category", json!(category));
        let outcome = adapters.invoke(names::EXTRACT_RECORDS, input).await;
        (item.source, outcome)
    });

    let outcomes: Vec<(String, ToolOutcome)> = join_all(calls).await;

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (source, outcome) in outcomes {
        if outcome.success {
            if let Some(fields) = outcome.field::<Map<String, Value>>("record") {
                records.push(ExtractedRecord {
                    category,
                    fields,
                    source,
                });
            }
        } else {
            errors.push(format!(
                "Extraction failed for {}: {}",
                source,
                outcome.error_text()
            ));
        }
    }
    (records, errors)
}

pub async fn run(state: &mut SharedState, adapters: &AdapterSet) -> StepReport {
    let category = state.entities.category.unwrap_or_default();
    let mut report = StepReport::ok();

    let documents: Vec<SourceText> = state
        .documents
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|doc| !doc.text.trim().is_empty())
        .map(|doc| SourceText {
            source: doc.path.display().to_string(),
            text: doc.text.clone(),
        })
        .collect();

    let (mut records, errors) = extract_batch(adapters, category, documents).await;
    report.errors.extend(errors);

    // No attachment text: fall back to the message bodies the scan kept,
    // or, for a manual add, to the query text itself.
    if records.is_empty() {
        if let Some(scan) = &state.scan {
            let bodies: Vec<SourceText> = scan
                .messages
                .iter()
                .filter(|message| !message.body.trim().is_empty())
                .map(|message| SourceText {
                    source: format!("Email: {}", message.subject),
                    text: message.body.clone(),
                })
                .collect();
            let (from_bodies, errors) = extract_batch(adapters, category, bodies).await;
            records.extend(from_bodies);
            report.errors.extend(errors);
        } else if state.intent == Intent::ManualAdd {
            // The user typed the record in.
            let query = vec![SourceText {
                source: "user query".into(),
                text: state.user_query().to_string(),
            }];
            let (from_query, errors) = extract_batch(adapters, category, query).await;
            records.extend(from_query);
            report.errors.extend(errors);
        }
    }

    tracing::info!(
        request = %state.id(),
        extracted = records.len(),
        category = %category,
        "record extraction finished"
    );
    state.records = Some(records);
    report
}
