//! Store Adapters
//!
//! Thin adapters over the record store and vector store: save, index,
//! similarity search, and direct queries.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use agent_core::{
    adapter::{names, ToolAdapter, ToolInput, ToolOutcome},
    RecordCategory,
};

use crate::model::RecordRow;
use crate::store::{RecordFilter, RecordStore, VectorStore};

/// Default result cap for record queries
const QUERY_LIMIT: usize = 20;

/// Persist one extracted record
pub struct SaveRecordAdapter {
    records: Arc<dyn RecordStore>,
}

impl SaveRecordAdapter {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ToolAdapter for SaveRecordAdapter {
    fn name(&self) -> &str {
        names::SAVE_RECORD
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(fields) = input.field::<Map<String, Value>>("fields") else {
            return ToolOutcome::failure("missing parameter: fields");
        };
        let category = input.field::<RecordCategory>("category").unwrap_or_default();
        let source = input.str("source").unwrap_or("unknown").to_string();

        let row = RecordRow::new(category, fields, source);
        match self.records.save(row) {
            Ok(id) => ToolOutcome::ok().with("record_id", json!(id)),
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

/// Index raw document text for similarity search
pub struct IndexDocumentAdapter {
    vector: Arc<VectorStore>,
}

impl IndexDocumentAdapter {
    pub fn new(vector: Arc<VectorStore>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl ToolAdapter for IndexDocumentAdapter {
    fn name(&self) -> &str {
        names::INDEX_DOCUMENT
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(text) = input.str("text") else {
            return ToolOutcome::failure("missing parameter: text");
        };
        let source = input.str("source").unwrap_or("unknown");

        match self.vector.index(source, text).await {
            Ok(chunks) => ToolOutcome::ok().with("chunks", json!(chunks)),
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

/// Similarity search over indexed documents
pub struct SearchStoreAdapter {
    vector: Arc<VectorStore>,
}

impl SearchStoreAdapter {
    pub fn new(vector: Arc<VectorStore>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl ToolAdapter for SearchStoreAdapter {
    fn name(&self) -> &str {
        names::SEARCH_STORE
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(query) = input.str("query") else {
            return ToolOutcome::failure("missing parameter: query");
        };
        let limit = input.u64("limit").unwrap_or(5) as usize;

        match self.vector.search(query, limit).await {
            Ok(hits) => {
                let results: Vec<Value> = hits
                    .into_iter()
                    .map(|hit| {
                        json!({
                            "text": hit.text,
                            "score": hit.score,
                            "source": hit.source,
                        })
                    })
                    .collect();
                ToolOutcome::ok().with("results", json!(results))
            }
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

/// Direct record-store queries (upcoming due dates or keyword search)
pub struct QueryRecordsAdapter {
    records: Arc<dyn RecordStore>,
}

impl QueryRecordsAdapter {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ToolAdapter for QueryRecordsAdapter {
    fn name(&self) -> &str {
        names::QUERY_RECORDS
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let filter = RecordFilter {
            category: input.field::<RecordCategory>("category"),
            keywords: input.field::<Vec<String>>("keywords").unwrap_or_default(),
            upcoming_only: input.str("query_type") == Some("upcoming"),
        };

        match self.records.query(&filter, QUERY_LIMIT) {
            Ok(rows) => {
                let records: Vec<Value> = rows
                    .into_iter()
                    .map(|row| {
                        json!({
                            "id": row.id,
                            "category": row.category,
                            "fields": row.fields,
                        })
                    })
                    .collect();
                ToolOutcome::ok().with("records", json!(records))
            }
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    #[tokio::test]
    async fn test_save_then_query_roundtrip() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let save = SaveRecordAdapter::new(store.clone());
        let query = QueryRecordsAdapter::new(store);

        let outcome = save
            .invoke(
                ToolInput::new()
                    .with("category", json!("bills"))
                    .with("fields", json!({"vendor": "Telco", "amount": "42.00"}))
                    .with("source", json!("Email: Telco statement")),
            )
            .await;
        assert!(outcome.success);
        assert!(outcome.str("record_id").is_some());

        let outcome = query
            .invoke(
                ToolInput::new()
                    .with("query_type", json!("search"))
                    .with("keywords", json!(["telco"])),
            )
            .await;
        assert!(outcome.success);
        let records = outcome.value("records").unwrap().as_array().unwrap().clone();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["fields"]["vendor"], json!("Telco"));
    }

    #[tokio::test]
    async fn test_save_without_fields_is_failure() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let save = SaveRecordAdapter::new(store);
        let outcome = save.invoke(ToolInput::new()).await;
        assert!(!outcome.success);
    }
}
