//! Record Store
//!
//! Persistence for extracted structured records, with the three query
//! shapes the assistant needs: upcoming due dates, keyword search, and
//! recent-first listing.

use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{NaiveDate, Utc};

use agent_core::RecordCategory;

use crate::error::{AssistantError, Result};
use crate::model::RecordRow;

/// Filter for record queries
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    pub category: Option<RecordCategory>,
    /// Case-insensitive keywords; a record matches if any keyword appears
    /// in its flattened fields
    pub keywords: Vec<String>,
    /// Only records with a due date on or after today, soonest first
    pub upcoming_only: bool,
}

/// Record store trait for persistence
pub trait RecordStore: Send + Sync {
    /// Save a record, returning its id
    fn save(&self, row: RecordRow) -> Result<String>;

    /// Query records matching the filter, bounded by `limit`
    fn query(&self, filter: &RecordFilter, limit: usize) -> Result<Vec<RecordRow>>;

    /// Number of stored records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn apply_filter(rows: &[RecordRow], filter: &RecordFilter, limit: usize) -> Vec<RecordRow> {
    let today = Utc::now().date_naive();
    let keywords: Vec<String> = filter
        .keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let mut matched: Vec<(Option<NaiveDate>, RecordRow)> = rows
        .iter()
        .filter(|row| filter.category.is_none_or(|c| row.category == c))
        .filter(|row| {
            if keywords.is_empty() {
                return true;
            }
            let haystack = row.haystack();
            keywords.iter().any(|k| haystack.contains(k))
        })
        .filter_map(|row| {
            let due = row.due_date();
            if filter.upcoming_only {
                match due {
                    Some(date) if date >= today => Some((Some(date), row.clone())),
                    _ => None,
                }
            } else {
                Some((due, row.clone()))
            }
        })
        .collect();

    if filter.upcoming_only {
        matched.sort_by_key(|(due, _)| *due);
    } else {
        matched.sort_by(|(_, a), (_, b)| b.saved_at.cmp(&a.saved_at));
    }

    matched.into_iter().map(|(_, row)| row).take(limit).collect()
}

/// In-memory record store (for development/testing)
pub struct MemoryRecordStore {
    rows: RwLock<Vec<RecordRow>>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn save(&self, row: RecordRow) -> Result<String> {
        let id = row.id.clone();
        self.rows.write().unwrap().push(row);
        Ok(id)
    }

    fn query(&self, filter: &RecordFilter, limit: usize) -> Result<Vec<RecordRow>> {
        Ok(apply_filter(&self.rows.read().unwrap(), filter, limit))
    }

    fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }
}

/// JSON-file-backed record store
pub struct FileRecordStore {
    path: PathBuf,
    rows: RwLock<Vec<RecordRow>>,
}

impl FileRecordStore {
    /// Open or create a store at the given path
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rows = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rows = self.rows.read().unwrap();
        let text = serde_json::to_string(&*rows)?;
        std::fs::write(&self.path, text).map_err(AssistantError::from)
    }
}

impl RecordStore for FileRecordStore {
    fn save(&self, row: RecordRow) -> Result<String> {
        let id = row.id.clone();
        self.rows.write().unwrap().push(row);
        self.flush()?;
        Ok(id)
    }

    fn query(&self, filter: &RecordFilter, limit: usize) -> Result<Vec<RecordRow>> {
        Ok(apply_filter(&self.rows.read().unwrap(), filter, limit))
    }

    fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::{json, Map};

    fn bill(vendor: &str, due_in_days: i64) -> RecordRow {
        let due = (Utc::now().date_naive() + Duration::days(due_in_days))
            .format("%Y-%m-%d")
            .to_string();
        let mut fields = Map::new();
        fields.insert("vendor".into(), json!(vendor));
        fields.insert("due_date".into(), json!(due));
        RecordRow::new(RecordCategory::Bills, fields, format!("Email: {}", vendor))
    }

    #[test]
    fn test_upcoming_sorted_by_due_date() {
        let store = MemoryRecordStore::new();
        store.save(bill("Telco", 20)).unwrap();
        store.save(bill("Hydro", 5)).unwrap();
        store.save(bill("Old", -3)).unwrap();

        let filter = RecordFilter {
            upcoming_only: true,
            ..Default::default()
        };
        let rows = store.query(&filter, 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields["vendor"], json!("Hydro"));
        assert_eq!(rows[1].fields["vendor"], json!("Telco"));
    }

    #[test]
    fn test_keyword_search_is_case_insensitive() {
        let store = MemoryRecordStore::new();
        store.save(bill("Telco", 20)).unwrap();
        store.save(bill("Hydro", 5)).unwrap();

        let filter = RecordFilter {
            keywords: vec!["TELCO".into()],
            ..Default::default()
        };
        let rows = store.query(&filter, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields["vendor"], json!("Telco"));
    }

    #[test]
    fn test_category_filter() {
        let store = MemoryRecordStore::new();
        store.save(bill("Telco", 20)).unwrap();
        let mut fields = Map::new();
        fields.insert("vendor".into(), json!("FlexFit"));
        store
            .save(RecordRow::new(
                RecordCategory::Promotions,
                fields,
                "Email: FlexFit".into(),
            ))
            .unwrap();

        let filter = RecordFilter {
            category: Some(RecordCategory::Promotions),
            ..Default::default()
        };
        let rows = store.query(&filter, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, RecordCategory::Promotions);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let store = FileRecordStore::open(&path).unwrap();
        store.save(bill("Telco", 20)).unwrap();
        drop(store);

        let reopened = FileRecordStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
    }
}
