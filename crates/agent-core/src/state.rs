//! Shared Request State
//!
//! A single mutable record threaded through every step of one request.
//! Created once per incoming query, owned exclusively by the running
//! execution, discarded at the terminal step. The plan is written once,
//! the completion ledger and the error list only ever grow, and each
//! result slot is written by exactly one step. Downstream steps treat an
//! unset slot as "no data", never as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use uuid::Uuid;

use crate::intent::Intent;
use crate::step::Step;

/// Category of structured record the assistant extracts and stores
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordCategory {
    Bills,
    Promotions,
    Orders,
    #[default]
    General,
}

impl RecordCategory {
    /// Parse a classifier label, tolerating the synonyms different prompt
    /// revisions produced. Unrecognized labels return `None` so callers can
    /// stash them in the entity escape hatch instead of guessing.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "bills" | "bill" | "invoice" | "invoices" => Some(Self::Bills),
            "promotions" | "promos" | "discounts" | "offers" => Some(Self::Promotions),
            "orders" | "receipts" | "shipping" => Some(Self::Orders),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bills => write!(f, "bills"),
            Self::Promotions => write!(f, "promotions"),
            Self::Orders => write!(f, "orders"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Entities the classifier extracted from the query
///
/// Known kinds get typed fields; anything else the classifier emits lands in
/// the flattened `extra` bag untouched, so a chatty model cannot break
/// deserialization.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Entities {
    /// How far back a mailbox scan should reach, in days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_window_days: Option<u32>,

    /// Record category the request is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<RecordCategory>,

    /// Search keywords for history queries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Whether the scan should be restricted to mail with attachments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_attachments: Option<bool>,

    /// Escape hatch for unrecognized classifier output
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entities {
    /// Build entities from a raw classifier payload, mapping the keys known
    /// under any of their historical names and keeping the rest verbatim.
    pub fn from_value(value: &Value) -> Self {
        let mut entities = Self::default();
        let Some(map) = value.as_object() else {
            return entities;
        };

        for (key, val) in map {
            match key.as_str() {
                "scan_window_days" | "scan_days" | "days" => {
                    entities.scan_window_days = val.as_u64().map(|d| d as u32);
                }
                "category" | "email_scan_type" | "scan_type" => {
                    match val.as_str().and_then(RecordCategory::from_label) {
                        Some(category) => entities.category = Some(category),
                        None => {
                            entities.extra.insert(key.clone(), val.clone());
                        }
                    }
                }
                "keywords" | "search_keywords" => {
                    if let Some(items) = val.as_array() {
                        entities.keywords = items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect();
                    } else if let Some(text) = val.as_str() {
                        entities.keywords =
                            text.split_whitespace().map(str::to_string).collect();
                    }
                }
                "require_attachments" | "attachments" => {
                    entities.require_attachments = val.as_bool();
                }
                _ => {
                    entities.extra.insert(key.clone(), val.clone());
                }
            }
        }

        entities
    }
}

/// Reference to an attachment downloaded during a mailbox scan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub path: PathBuf,
}

/// One mail message kept by the scan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannedMessage {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    /// Plain-text body, truncated by the scan adapter
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

/// Everything the mailbox scan produced
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOutcome {
    pub messages: Vec<ScannedMessage>,
    /// Messages matching the mailbox query before relevance filtering
    pub found: usize,
    /// Messages kept after relevance filtering
    pub kept: usize,
    /// Messages dropped by relevance filtering
    pub filtered_out: usize,
    /// Attachments written to disk
    pub downloaded: usize,
}

impl ScanOutcome {
    /// All attachments across the kept messages, in message order
    pub fn attachments(&self) -> impl Iterator<Item = &AttachmentRef> {
        self.messages.iter().flat_map(|m| m.attachments.iter())
    }
}

/// Text extracted from one downloaded attachment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub path: PathBuf,
    pub text: String,
}

/// A structured record pulled out of document or message text
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub category: RecordCategory,
    /// Category-shaped fields, e.g. vendor/amount/due_date for bills
    pub fields: Map<String, Value>,
    /// Where the text came from (file path or message subject)
    pub source: String,
}

/// A record read back from the record store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub category: RecordCategory,
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    /// Due date, when the record carries one
    pub fn due_date(&self) -> Option<&str> {
        self.fields.get("due_date").and_then(Value::as_str)
    }

    /// Vendor or a generic fallback, for reminder titles and summaries
    pub fn vendor(&self) -> &str {
        self.fields
            .get("vendor")
            .and_then(Value::as_str)
            .unwrap_or("unknown vendor")
    }
}

/// A document returned by similarity search
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub text: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One web search result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The single mutable record flowing through one request's execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedState {
    id: Uuid,
    created_at: DateTime<Utc>,
    user_query: String,

    pub intent: Intent,
    pub intent_confidence: f32,
    pub entities: Entities,

    plan: Vec<Step>,
    completed: Vec<Step>,
    errors: Vec<String>,

    // Result slots, each written by exactly one step. `None` means the
    // producing step has not run; `Some(empty)` means it ran and found
    // nothing.
    pub scan: Option<ScanOutcome>,
    pub documents: Option<Vec<ParsedDocument>>,
    pub records: Option<Vec<ExtractedRecord>>,
    pub saved_record_ids: Option<Vec<String>>,
    pub retrieved: Option<Vec<RetrievedDocument>>,
    pub query_results: Option<Vec<StoredRecord>>,
    pub search_hits: Option<Vec<SearchHit>>,
    pub reminder_ids: Option<Vec<String>>,
    pub final_response: Option<String>,
}

impl SharedState {
    /// Create fresh state for an incoming query
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_query: user_query.into(),
            intent: Intent::Unknown,
            intent_confidence: 0.0,
            entities: Entities::default(),
            plan: Vec::new(),
            completed: Vec::new(),
            errors: Vec::new(),
            scan: None,
            documents: None,
            records: None,
            saved_record_ids: None,
            retrieved: None,
            query_results: None,
            search_hits: None,
            reminder_ids: None,
            final_response: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The query as the user typed it
    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    /// The execution plan (empty until planning has run)
    pub fn plan(&self) -> &[Step] {
        &self.plan
    }

    /// Set the plan. The plan is written once; a second attempt is ignored.
    pub fn set_plan(&mut self, plan: Vec<Step>) {
        if self.plan.is_empty() {
            self.plan = plan;
        } else {
            tracing::warn!(request = %self.id, "plan already set, ignoring re-plan");
        }
    }

    /// The completion ledger, in execution order
    pub fn completed(&self) -> &[Step] {
        &self.completed
    }

    /// Whether a step has already run
    pub fn is_completed(&self, step: Step) -> bool {
        self.completed.contains(&step)
    }

    /// Append a step to the ledger. Each step appears at most once.
    pub fn mark_completed(&mut self, step: Step) {
        if !self.completed.contains(&step) {
            self.completed.push(step);
        }
    }

    /// Accumulated failure notes, oldest first
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Record a failure note
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_is_set_once() {
        let mut state = SharedState::new("scan my bills");
        state.set_plan(vec![Step::MailboxScan, Step::ResponseGeneration]);
        state.set_plan(vec![Step::WebSearch]);
        assert_eq!(
            state.plan(),
            &[Step::MailboxScan, Step::ResponseGeneration]
        );
    }

    #[test]
    fn test_ledger_append_only_and_deduped() {
        let mut state = SharedState::new("q");
        state.mark_completed(Step::MailboxScan);
        state.mark_completed(Step::DocumentParsing);
        state.mark_completed(Step::MailboxScan);
        assert_eq!(
            state.completed(),
            &[Step::MailboxScan, Step::DocumentParsing]
        );
    }

    #[test]
    fn test_entities_from_classifier_payload() {
        let payload = json!({
            "scan_days": 14,
            "email_scan_type": "invoices",
            "keywords": ["germany", "university"],
            "mood": "curious"
        });
        let entities = Entities::from_value(&payload);
        assert_eq!(entities.scan_window_days, Some(14));
        assert_eq!(entities.category, Some(RecordCategory::Bills));
        assert_eq!(entities.keywords, vec!["germany", "university"]);
        assert_eq!(entities.extra.get("mood"), Some(&json!("curious")));
    }

    #[test]
    fn test_unrecognized_category_goes_to_extra() {
        let payload = json!({"scan_type": "universities"});
        let entities = Entities::from_value(&payload);
        assert_eq!(entities.category, None);
        assert_eq!(
            entities.extra.get("scan_type"),
            Some(&json!("universities"))
        );
    }

    #[test]
    fn test_state_roundtrip_preserves_ledger_and_errors() {
        let mut state = SharedState::new("what did you find?");
        state.intent = Intent::QueryHistory;
        state.set_plan(vec![Step::RecordQuery, Step::ResponseGeneration]);
        state.mark_completed(Step::IntentClassification);
        state.mark_completed(Step::Planning);
        state.mark_completed(Step::RecordQuery);
        state.push_error("Query failed: store offline");

        let text = serde_json::to_string(&state).unwrap();
        let back: SharedState = serde_json::from_str(&text).unwrap();

        assert_eq!(back.user_query(), state.user_query());
        assert_eq!(back.plan(), state.plan());
        assert_eq!(back.completed(), state.completed());
        assert_eq!(back.errors(), state.errors());
        assert_eq!(back.intent, Intent::QueryHistory);
    }

    #[test]
    fn test_slots_start_unset() {
        let state = SharedState::new("q");
        assert!(state.scan.is_none());
        assert!(state.documents.is_none());
        assert!(state.records.is_none());
        assert!(state.final_response.is_none());
    }
}
