//! Vector Store
//!
//! Embeds document chunks and answers top-k cosine-similarity queries.
//! Optionally persists its entries to a JSON file so an index survives
//! restarts. Re-indexing a source replaces its previous chunks.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use agent_core::EmbeddingProvider;

use crate::error::{AssistantError, Result};

/// Target chunk size in characters; chunks break on paragraph boundaries
/// where possible.
const CHUNK_SIZE: usize = 800;

/// One embedded chunk
#[derive(Clone, Debug, Serialize, Deserialize)]
struct IndexedChunk {
    id: String,
    text: String,
    source: String,
    embedding: Vec<f32>,
}

/// A search result
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Embedding-backed document index
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<IndexedChunk>>,
    max_entries: usize,
    persist_path: Option<PathBuf>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, max_entries: usize) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            max_entries,
            persist_path: None,
        }
    }

    /// Persist to (and load existing entries from) a JSON file
    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.exists() {
            match std::fs::read_to_string(&path)
                .map_err(AssistantError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(AssistantError::from))
            {
                Ok(entries) => {
                    *self.entries.write().unwrap() = entries;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "could not load vector index: {}", e);
                }
            }
        }
        self.persist_path = Some(path);
        self
    }

    /// Split text into chunks, breaking on blank lines where possible
    fn chunk(text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if !current.is_empty() && current.len() + paragraph.len() > CHUNK_SIZE {
                chunks.push(std::mem::take(&mut current));
            }
            if paragraph.len() > CHUNK_SIZE {
                // Oversized paragraph: hard-split on char boundaries.
                let chars: Vec<char> = paragraph.chars().collect();
                for piece in chars.chunks(CHUNK_SIZE) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Index a document, replacing any chunks previously stored for the
    /// same source. Returns the number of chunks added.
    pub async fn index(&self, source: &str, text: &str) -> Result<usize> {
        let chunks = Self::chunk(text);
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut embedded = Vec::with_capacity(chunks.len());
        for (i, chunk_text) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&chunk_text).await?;
            if embedding.is_empty() {
                return Err(AssistantError::Store("empty embedding".into()));
            }
            embedded.push(IndexedChunk {
                id: format!("{}#{}", source, i),
                text: chunk_text,
                source: source.to_string(),
                embedding,
            });
        }

        let added = embedded.len();
        {
            let mut entries = self.entries.write().unwrap();
            entries.retain(|entry| entry.source != source);
            entries.extend(embedded);
            let len = entries.len();
            if len > self.max_entries {
                entries.drain(0..len - self.max_entries);
            }
        }
        self.persist()?;
        Ok(added)
    }

    /// Top-k most similar chunks for a query
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        if query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().unwrap();
        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|entry| ScoredChunk {
                text: entry.text.clone(),
                source: entry.source.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let entries = self.entries.read().unwrap();
        let text = serde_json::to_string(&*entries)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::error::Result as CoreResult;
    use async_trait::async_trait;

    /// Deterministic toy embedder: character-class counts
    struct CountingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
            let lower = text.to_lowercase();
            let count = |needle: &str| lower.matches(needle).count() as f32;
            Ok(vec![
                count("bill"),
                count("order"),
                count("promo"),
                text.len() as f32 / 100.0,
            ])
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);
    }

    #[test]
    fn test_chunking_breaks_on_paragraphs() {
        let text = format!("{}\n\n{}", "a".repeat(600), "b".repeat(600));
        let chunks = VectorStore::chunk(&text);
        assert_eq!(chunks.len(), 2);

        let oversized = "x".repeat(2000);
        let chunks = VectorStore::chunk(&oversized);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= CHUNK_SIZE));
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let store = VectorStore::new(Arc::new(CountingEmbedder), 100);
        store
            .index("doc-bill", "bill bill bill from the utility")
            .await
            .unwrap();
        store
            .index("doc-order", "order order shipped yesterday")
            .await
            .unwrap();

        let hits = store.search("where is my bill", 2).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].source, "doc-bill");
    }

    #[tokio::test]
    async fn test_reindex_replaces_source() {
        let store = VectorStore::new(Arc::new(CountingEmbedder), 100);
        store.index("doc", "first version").await.unwrap();
        store.index("doc", "second version").await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let store = VectorStore::new(Arc::new(CountingEmbedder), 100)
            .with_persistence(&path);
        store.index("doc", "a bill to remember").await.unwrap();
        drop(store);

        let reloaded = VectorStore::new(Arc::new(CountingEmbedder), 100)
            .with_persistence(&path);
        assert_eq!(reloaded.len(), 1);
    }
}
