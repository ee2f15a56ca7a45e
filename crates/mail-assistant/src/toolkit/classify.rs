//! Intent Classification Adapter
//!
//! Asks the LLM for an intent label, a confidence, and extracted entities.
//! The scan-vs-query distinction matters most: "scan my inbox" fetches new
//! mail, "what did you find" searches what is already stored.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{
    adapter::{names, ToolAdapter, ToolInput, ToolOutcome},
    provider::{GenerationOptions, LlmProvider},
    Message,
};

use super::extract_json;

const SYSTEM_PROMPT: &str = r#"You are an intent classifier for a personal mail assistant.

CRITICAL DISTINCTION:

**scan_emails** = fetch NEW mail from the mailbox
  Triggers: "scan", "check", "get", "fetch", "find", "search my inbox"
  Examples: "Scan for university emails", "Get emails from last week"

**query_history** = search mail the assistant ALREADY stored
  Triggers: "what", "show", "tell me", "do I have", "did you find"
  Examples: "What emails did you find?", "Do I have any Germany emails?"

Other intents: scan_bills, analyze_spending, set_reminder, find_alternatives, manual_add.

For scan intents set scan_type to one of: bills, promotions, orders, general.
For query_history put search keywords into entities.keywords.

Respond with JSON only:
{"intent": "...", "scan_type": "...", "confidence": 0.0, "entities": {}}"#;

/// LLM-backed intent classification
pub struct ClassifyIntentAdapter {
    llm: Arc<dyn LlmProvider>,
    options: GenerationOptions,
}

impl ClassifyIntentAdapter {
    pub fn new(llm: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self { llm, options }
    }
}

#[async_trait]
impl ToolAdapter for ClassifyIntentAdapter {
    fn name(&self) -> &str {
        names::CLASSIFY_INTENT
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(user_query) = input.str("user_query") else {
            return ToolOutcome::failure("missing parameter: user_query");
        };

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("Query: {}\n\nClassify:", user_query)),
        ];

        let completion = match self.llm.complete(&messages, &self.options).await {
            Ok(completion) => completion,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };

        let Some(parsed) = extract_json(&completion.content) else {
            return ToolOutcome::failure("could not parse classifier output");
        };

        let intent = parsed
            .get("intent")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let confidence = parsed
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        // Fold scan_type into the entity bag under its historical key.
        let mut entities = parsed
            .get("entities")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if let Some(scan_type) = parsed.get("scan_type").and_then(Value::as_str) {
            entities.insert("email_scan_type".into(), json!(scan_type));
        }

        ToolOutcome::ok()
            .with("intent", json!(intent))
            .with("confidence", json!(confidence))
            .with("entities", Value::Object(entities))
    }
}
