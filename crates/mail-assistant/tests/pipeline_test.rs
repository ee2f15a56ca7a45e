//! End-to-end pipeline tests: engine + toolkit adapters over the mock
//! mailbox and a scripted LLM, no network anywhere.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tempfile::tempdir;

use agent_core::error::Result as CoreResult;
use agent_core::provider::{Completion, EmbeddingProvider, GenerationOptions, LlmProvider};
use agent_core::{AdapterSet, Engine, Intent, Message, Step};

use mail_assistant::store::{
    MemoryRecordStore, MemoryReminderStore, RecordStore, ReminderStore, VectorStore,
};
use mail_assistant::toolkit::{
    ClassifyIntentAdapter, CreateReminderAdapter, ExtractRecordsAdapter, GenerateResponseAdapter,
    IndexDocumentAdapter, ParseDocumentAdapter, QueryRecordsAdapter, SaveRecordAdapter,
    ScanMailboxAdapter, ScanMailboxConfig, SearchStoreAdapter,
};
use mail_assistant::MockMailboxClient;

/// Answers each prompt kind with a fixed, plausible completion, and embeds
/// text deterministically.
struct ScriptedLlm {
    intent: &'static str,
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> CoreResult<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> CoreResult<Completion> {
        let system = messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let content = if system.contains("intent classifier") {
            format!(
                r#"{{"intent": "{}", "scan_type": "bills", "confidence": 0.93, "entities": {{}}}}"#,
                self.intent
            )
        } else if system.contains("relevant") {
            r#"{"is_relevant": true, "relevance_score": 0.9, "reasoning": "looks like a bill"}"#
                .to_string()
        } else if system.starts_with("Extract") {
            r#"{"vendor": "City Hydro", "amount": "84.20", "due_date": "2099-08-09"}"#.to_string()
        } else {
            "You have one bill: City Hydro, $84.20, due 2099-08-09.".to_string()
        };

        Ok(Completion {
            content,
            model: options.model.clone(),
            usage: None,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedLlm {
    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(vec![
            lower.matches("hydro").count() as f32,
            lower.matches("bill").count() as f32,
            text.len() as f32 / 100.0,
        ])
    }
}

/// Shared backends so consecutive requests see each other's writes
struct Backends {
    records: Arc<dyn RecordStore>,
    reminders: Arc<MemoryReminderStore>,
    download_dir: PathBuf,
}

impl Backends {
    fn new(download_dir: PathBuf) -> Self {
        Self {
            records: Arc::new(MemoryRecordStore::new()),
            reminders: Arc::new(MemoryReminderStore::new()),
            download_dir,
        }
    }
}

/// Wire a full engine; `intent` scripts what the classifier will say.
fn build_engine(intent: &'static str, backends: &Backends) -> Engine {
    let llm = Arc::new(ScriptedLlm { intent });
    let options = GenerationOptions::default();
    let vector = Arc::new(VectorStore::new(llm.clone(), 1000));

    let scan_config = ScanMailboxConfig {
        download_dir: backends.download_dir.clone(),
        ..Default::default()
    };

    let scan_llm: Arc<dyn LlmProvider> = llm.clone();
    let mut adapters = AdapterSet::new();
    adapters.register(ClassifyIntentAdapter::new(llm.clone(), options.clone()));
    adapters.register(ScanMailboxAdapter::new(
        Arc::new(MockMailboxClient::new()),
        Some(scan_llm),
        options.clone(),
        scan_config,
    ));
    adapters.register(ParseDocumentAdapter::new());
    adapters.register(ExtractRecordsAdapter::new(llm.clone(), options.clone()));
    adapters.register(SaveRecordAdapter::new(backends.records.clone()));
    adapters.register(IndexDocumentAdapter::new(vector.clone()));
    adapters.register(SearchStoreAdapter::new(vector));
    adapters.register(QueryRecordsAdapter::new(backends.records.clone()));
    adapters.register(CreateReminderAdapter::new(backends.reminders.clone()));
    adapters.register(GenerateResponseAdapter::new(llm, options));

    Engine::with_defaults(Arc::new(adapters))
}

#[tokio::test]
async fn scan_request_extracts_and_stores_a_bill() {
    let dir = tempdir().unwrap();
    let backends = Backends::new(dir.path().to_path_buf());
    let engine = build_engine("scan_bills", &backends);

    let state = engine.handle("scan my inbox for bills from last month").await;

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

    let scan = state.scan.as_ref().unwrap();
    assert_eq!(scan.kept, 1);
    assert_eq!(scan.downloaded, 1);

    let records = state.records.as_deref().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields["vendor"], json!("City Hydro"));

    assert_eq!(state.saved_record_ids.as_deref().unwrap().len(), 1);
    assert_eq!(backends.records.len(), 1);
    assert!(state
        .final_response
        .as_deref()
        .unwrap()
        .contains("City Hydro"));
    assert!(state.errors().is_empty());
}

#[tokio::test]
async fn reminder_request_creates_reminders_from_stored_bills() {
    let dir = tempdir().unwrap();
    let backends = Backends::new(dir.path().to_path_buf());

    // A scan populates the record store...
    let scan_engine = build_engine("scan_bills", &backends);
    let scan_state = scan_engine.handle("scan my inbox for bills").await;
    assert_eq!(backends.records.len(), 1);
    assert!(scan_state.errors().is_empty());

    // ...and a follow-up reminder request finds the stored bill.
    let reminder_engine = build_engine("set_reminder", &backends);
    let state = reminder_engine.handle("remind me before my bills are due").await;

    assert_eq!(state.intent, Intent::SetReminder);
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
    assert_eq!(state.query_results.as_deref().unwrap().len(), 1);
    assert_eq!(state.reminder_ids.as_deref().unwrap().len(), 1);

    let reminders = backends.reminders.list().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(
        reminders[0].due_date,
        NaiveDate::from_ymd_opt(2099, 8, 9)
    );
    assert!(reminders[0].title.contains("City Hydro"));
}

#[tokio::test]
async fn unknown_label_falls_back_to_retrieval() {
    let dir = tempdir().unwrap();
    let backends = Backends::new(dir.path().to_path_buf());
    let engine = build_engine("play_music", &backends);

    let state = engine.handle("play something relaxing").await;

    assert_eq!(state.intent, Intent::Other("play_music".into()));
    assert_eq!(
        state.plan(),
        &[Step::StoreRetrieval, Step::ResponseGeneration]
    );
    assert!(state.final_response.is_some());
}
