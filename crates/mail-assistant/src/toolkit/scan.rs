//! Mailbox Scan Adapter
//!
//! Drives a mailbox client through one scan: build the query, fetch the
//! matches, filter them for relevance with the LLM, and download the
//! attachments worth keeping. A message that fails to fetch or filter is
//! skipped, never fatal; only a failed search fails the whole call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use agent_core::{
    adapter::{names, ToolAdapter, ToolInput, ToolOutcome},
    provider::{GenerationOptions, LlmProvider},
    state::{AttachmentRef, ScanOutcome, ScannedMessage},
    Message, RecordCategory,
};

use crate::mailbox::{MailQuery, MailboxClient};
use crate::model::EmailMessage;

use super::{extract_json, sanitize_filename};

const RELEVANCE_PROMPT: &str = "Evaluate whether an email (sender, subject, body) is \
relevant to the user's request. Be intelligent about it. Respond with JSON only: \
{\"is_relevant\": true/false, \"relevance_score\": 0.0-1.0, \"reasoning\": \"...\"}";

/// Mailbox-syntax clause narrowing a scan to one record category
fn category_clause(category: RecordCategory) -> Option<&'static str> {
    match category {
        RecordCategory::Bills => Some("invoice OR bill OR statement OR \"amount due\""),
        RecordCategory::Promotions => Some("sale OR discount OR \"% off\" OR promo"),
        RecordCategory::Orders => Some("order OR receipt OR shipped OR delivery"),
        RecordCategory::General => None,
    }
}

/// Scan adapter configuration
#[derive(Clone, Debug)]
pub struct ScanMailboxConfig {
    /// Where downloaded attachments land
    pub download_dir: PathBuf,

    /// Per-message body budget in characters
    pub body_chars: usize,

    /// Run the per-message LLM relevance filter
    pub use_relevance_filter: bool,
}

impl Default for ScanMailboxConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("data/raw/attachments"),
            body_chars: 2000,
            use_relevance_filter: true,
        }
    }
}

struct RelevanceVerdict {
    is_relevant: bool,
    score: f64,
    reason: String,
}

/// Mailbox scan over any [`MailboxClient`]
pub struct ScanMailboxAdapter {
    mailbox: Arc<dyn MailboxClient>,
    llm: Option<Arc<dyn LlmProvider>>,
    options: GenerationOptions,
    config: ScanMailboxConfig,
}

impl ScanMailboxAdapter {
    pub fn new(
        mailbox: Arc<dyn MailboxClient>,
        llm: Option<Arc<dyn LlmProvider>>,
        options: GenerationOptions,
        config: ScanMailboxConfig,
    ) -> Self {
        Self {
            mailbox,
            llm,
            options,
            config,
        }
    }

    /// Ask the LLM whether a message matters for this request. A filter
    /// failure keeps the message: better to over-include than to drop
    /// silently.
    async fn check_relevance(&self, user_query: &str, message: &EmailMessage) -> RelevanceVerdict {
        let keep_by_default = RelevanceVerdict {
            is_relevant: true,
            score: 1.0,
            reason: "filter unavailable, included by default".into(),
        };

        let Some(llm) = &self.llm else {
            return keep_by_default;
        };

        let body_preview: String = message.body.chars().take(1000).collect();
        let document = format!(
            "From: {}\nSubject: {}\n\n{}",
            message.sender, message.subject, body_preview
        );
        let messages = [
            Message::system(RELEVANCE_PROMPT),
            Message::user(format!(
                "Query: {}\n\nDocument: {}\n\nEvaluate:",
                user_query, document
            )),
        ];

        match llm.complete(&messages, &self.options).await {
            Ok(completion) => match extract_json(&completion.content) {
                Some(parsed) => RelevanceVerdict {
                    is_relevant: parsed
                        .get("is_relevant")
                        .and_then(Value::as_bool)
                        .unwrap_or(true),
                    score: parsed
                        .get("relevance_score")
                        .and_then(Value::as_f64)
                        .unwrap_or(1.0),
                    reason: parsed
                        .get("reasoning")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                },
                None => keep_by_default,
            },
            Err(e) => {
                tracing::warn!("relevance check failed, keeping message: {}", e);
                keep_by_default
            }
        }
    }

    /// `YYYYMMDD_sender_subject.ext`, deduplicated against existing files
    fn attachment_path(&self, message: &EmailMessage, original_filename: &str) -> PathBuf {
        let date = DateTime::parse_from_rfc2822(&message.date)
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|_| Utc::now().format("%Y%m%d").to_string());
        let sender_part = message.sender.split('<').next().unwrap_or_default();
        let sender: String = sanitize_filename(sender_part).chars().take(15).collect();
        let subject: String = sanitize_filename(&message.subject).chars().take(30).collect();
        let extension = Path::new(original_filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let base = format!("{}_{}_{}", date, sender, subject);
        let mut path = self.config.download_dir.join(format!("{}{}", base, extension));
        let mut counter = 1;
        while path.exists() {
            path = self
                .config
                .download_dir
                .join(format!("{}_{}{}", base, counter, extension));
            counter += 1;
        }
        path
    }

    async fn download_attachments(&self, message: &EmailMessage) -> (Vec<AttachmentRef>, usize) {
        let mut refs = Vec::new();
        let mut downloaded = 0;

        for attachment in &message.attachments {
            let bytes = match self
                .mailbox
                .fetch_attachment(&message.id, &attachment.id)
                .await
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(
                        message = %message.id,
                        attachment = %attachment.filename,
                        "attachment download failed: {}",
                        e
                    );
                    continue;
                }
            };

            let path = self.attachment_path(message, &attachment.filename);
            if let Err(e) = tokio::fs::write(&path, &bytes).await {
                tracing::warn!(path = %path.display(), "attachment write failed: {}", e);
                continue;
            }

            refs.push(AttachmentRef {
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| attachment.filename.clone()),
                path,
            });
            downloaded += 1;
        }

        (refs, downloaded)
    }
}

#[async_trait]
impl ToolAdapter for ScanMailboxAdapter {
    fn name(&self) -> &str {
        names::SCAN_MAILBOX
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(date_from) = input
            .str("date_from")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            return ToolOutcome::failure("missing or malformed parameter: date_from");
        };
        let Some(date_to) = input
            .str("date_to")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            return ToolOutcome::failure("missing or malformed parameter: date_to");
        };
        let require_attachments = input.bool("require_attachments").unwrap_or(true);
        let max_results = input.u64("max_results").unwrap_or(50) as u32;
        let user_query = input.str("user_query").unwrap_or_default().to_string();
        let category = input.field::<RecordCategory>("category");

        let query = MailQuery {
            date_from,
            date_to,
            require_attachments,
            extra_clause: category
                .and_then(category_clause)
                .map(str::to_string),
            max_results,
        };
        tracing::info!(query = %query.to_query_string(), "scanning mailbox");

        let ids = match self.mailbox.search(&query).await {
            Ok(ids) => ids,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };

        if require_attachments {
            if let Err(e) = tokio::fs::create_dir_all(&self.config.download_dir).await {
                return ToolOutcome::failure(format!(
                    "cannot create download dir {}: {}",
                    self.config.download_dir.display(),
                    e
                ));
            }
        }

        let found = ids.len();
        let mut messages = Vec::new();
        let mut filtered_out = 0;
        let mut downloaded = 0;

        for id in ids {
            let message = match self.mailbox.fetch(&id).await {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(message = %id, "fetch failed, skipping: {}", e);
                    continue;
                }
            };

            if self.config.use_relevance_filter && !user_query.is_empty() {
                let verdict = self.check_relevance(&user_query, &message).await;
                if !verdict.is_relevant {
                    filtered_out += 1;
                    tracing::debug!(
                        subject = %message.subject,
                        score = verdict.score,
                        reason = %verdict.reason,
                        "filtered out"
                    );
                    continue;
                }
            }

            let (attachment_refs, count) = if require_attachments {
                self.download_attachments(&message).await
            } else {
                (Vec::new(), 0)
            };
            downloaded += count;

            messages.push(ScannedMessage {
                id: message.id.clone(),
                subject: message.subject.clone(),
                sender: message.sender.clone(),
                date: message.date.clone(),
                body: message.body.chars().take(self.config.body_chars).collect(),
                attachments: attachment_refs,
            });
        }

        let outcome = ScanOutcome {
            kept: messages.len(),
            messages,
            found,
            filtered_out,
            downloaded,
        };

        match serde_json::to_value(&outcome) {
            Ok(Value::Object(payload)) => ToolOutcome::ok_with_payload(payload),
            _ => ToolOutcome::failure("could not serialize scan outcome"),
        }
    }
}
