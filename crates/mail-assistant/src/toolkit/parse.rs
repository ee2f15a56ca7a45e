//! Document Parsing Adapter
//!
//! Extracts readable text from a downloaded attachment. Plain-text formats
//! are read directly, HTML goes through html2text. Binary formats are
//! reported as unsupported; the extraction step then falls back to the
//! message bodies, so a scan still produces records.

use std::path::Path;

use async_trait::async_trait;
use serde_json::json;

use agent_core::adapter::{names, ToolAdapter, ToolInput, ToolOutcome};

/// Per-document character budget
const MAX_CHARS: usize = 50_000;

/// Text extraction from downloaded files
#[derive(Default)]
pub struct ParseDocumentAdapter;

impl ParseDocumentAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn read_text(path: &Path) -> Result<String, String> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" | "csv" | "log" | "text" => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("cannot read {}: {}", path.display(), e)),
            "html" | "htm" => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
                html2text::from_read(raw.as_bytes(), 100)
                    .map_err(|e| format!("cannot render {}: {}", path.display(), e))
            }
            other => Err(format!("unsupported document format: .{}", other)),
        }
    }
}

#[async_trait]
impl ToolAdapter for ParseDocumentAdapter {
    fn name(&self) -> &str {
        names::PARSE_DOCUMENT
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(path) = input.str("path") else {
            return ToolOutcome::failure("missing parameter: path");
        };
        let path = Path::new(path);

        match Self::read_text(path).await {
            Ok(text) => {
                let clipped: String = text.chars().take(MAX_CHARS).collect();
                ToolOutcome::ok()
                    .with("text", json!(clipped))
                    .with("path", json!(path.display().to_string()))
            }
            Err(e) => ToolOutcome::failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_plain_text_passthrough() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invoice.txt");
        std::fs::write(&path, "Amount due: $84.20").unwrap();

        let outcome = ParseDocumentAdapter::new()
            .invoke(ToolInput::new().with("path", json!(path.display().to_string())))
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.str("text"), Some("Amount due: $84.20"));
    }

    #[tokio::test]
    async fn test_html_is_rendered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("statement.html");
        std::fs::write(&path, "<html><body><p>Balance: $12</p></body></html>").unwrap();

        let outcome = ParseDocumentAdapter::new()
            .invoke(ToolInput::new().with("path", json!(path.display().to_string())))
            .await;
        assert!(outcome.success);
        assert!(outcome.str("text").unwrap().contains("Balance: $12"));
    }

    #[tokio::test]
    async fn test_binary_format_is_unsupported() {
        let outcome = ParseDocumentAdapter::new()
            .invoke(ToolInput::new().with("path", json!("statement.pdf")))
            .await;
        assert!(!outcome.success);
        assert!(outcome.error_text().contains("unsupported"));
    }
}
