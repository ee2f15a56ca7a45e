//! Response Generation Adapter
//!
//! Renders the engine's context bundle to JSON and asks the LLM for the
//! final user-visible answer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{
    adapter::{names, ToolAdapter, ToolInput, ToolOutcome},
    provider::{GenerationOptions, LlmProvider},
    Message,
};

const SYSTEM_PROMPT: &str = "You are a helpful email assistant. Summarize mail clearly \
with sender, subject, and date. Report amounts and due dates exactly as given. If the \
context lists errors, briefly mention what went wrong.";

/// LLM-backed final response generation
pub struct GenerateResponseAdapter {
    llm: Arc<dyn LlmProvider>,
    options: GenerationOptions,
}

impl GenerateResponseAdapter {
    pub fn new(llm: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self { llm, options }
    }
}

#[async_trait]
impl ToolAdapter for GenerateResponseAdapter {
    fn name(&self) -> &str {
        names::GENERATE_RESPONSE
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(user_query) = input.str("user_query") else {
            return ToolOutcome::failure("missing parameter: user_query");
        };
        let context = input.value("context").cloned().unwrap_or(Value::Null);
        let context_text =
            serde_json::to_string_pretty(&context).unwrap_or_else(|_| "{}".into());

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "Context:\n{}\n\nQuestion: {}\n\nResponse:",
                context_text, user_query
            )),
        ];

        match self.llm.complete(&messages, &self.options).await {
            Ok(completion) => ToolOutcome::ok().with("response", json!(completion.content)),
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}
