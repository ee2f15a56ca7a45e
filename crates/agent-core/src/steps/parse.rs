//! Document Parsing Step
//!
//! Extracts text from every attachment the scan downloaded. One adapter
//! call per file; a file that fails to parse becomes a failure note and the
//! loop moves on.

use serde_json::json;

use crate::adapter::{names, AdapterSet, ToolInput};
use crate::state::{AttachmentRef, ParsedDocument, SharedState};
use crate::step::StepReport;

pub async fn run(state: &mut SharedState, adapters: &AdapterSet) -> StepReport {
    let attachments: Vec<AttachmentRef> = state
        .scan
        .as_ref()
        .map(|scan| scan.attachments().cloned().collect())
        .unwrap_or_default();

    let mut report = StepReport::ok();
    let mut documents = Vec::new();

    for attachment in attachments {
        let input =
            ToolInput::new().with("path", json!(attachment.path.display().to_string()));
        let outcome = adapters.invoke(names::PARSE_DOCUMENT, input).await;

        if outcome.success {
            if let Some(text) = outcome.str("text") {
                documents.push(ParsedDocument {
                    path: attachment.path.clone(),
                    text: text.to_string(),
                });
            }
        } else {
            report.push(format!("Failed parsing {}", attachment.filename));
        }
    }

    tracing::info!(
        request = %state.id(),
        parsed = documents.len(),
        failed = report.errors.len(),
        "document parsing finished"
    );
    state.documents = Some(documents);
    report
}
