//! Step Vocabulary
//!
//! The closed set of step names plans are built from, plus the report type
//! step handlers return. A handler's partial failures are data in the
//! report, never control flow: one bad item must not abort the step, and a
//! failed step must not abort the plan.

use serde::{Deserialize, Serialize};

/// A single step in an execution plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Label the request and pull out entities (pre-plan)
    IntentClassification,
    /// Map the intent to an ordered step sequence (pre-plan)
    Planning,
    /// Fetch matching mail and download attachments
    MailboxScan,
    /// Extract text from downloaded attachments
    DocumentParsing,
    /// Turn text into structured records
    RecordExtraction,
    /// Persist records and index raw documents
    StoreIndexing,
    /// Similarity search over the indexed documents
    StoreRetrieval,
    /// Direct lookup against the record store
    RecordQuery,
    /// Search the web for alternatives
    WebSearch,
    /// Create reminders for due-dated records
    ReminderCreation,
    /// Produce the user-visible answer
    ResponseGeneration,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Step::IntentClassification => "intent_classification",
            Step::Planning => "planning",
            Step::MailboxScan => "mailbox_scan",
            Step::DocumentParsing => "document_parsing",
            Step::RecordExtraction => "record_extraction",
            Step::StoreIndexing => "store_indexing",
            Step::StoreRetrieval => "store_retrieval",
            Step::RecordQuery => "record_query",
            Step::WebSearch => "web_search",
            Step::ReminderCreation => "reminder_creation",
            Step::ResponseGeneration => "response_generation",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of one step handler invocation
///
/// `errors` carries item- and call-level failure notes the scheduler folds
/// into the request state; an empty list means the step went clean.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Human-readable failure notes accumulated during the step
    pub errors: Vec<String>,
}

impl StepReport {
    /// A clean report
    pub fn ok() -> Self {
        Self::default()
    }

    /// A report carrying a single failure note
    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
        }
    }

    /// Record a failure note
    pub fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Whether the step finished without recording any failure
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
