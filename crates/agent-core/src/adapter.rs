//! Tool Adapter Contract
//!
//! Every external capability the engine calls (mailbox scanning, document
//! parsing, extraction, storage, search, generation) sits behind the same
//! shape: a flat map of named parameters in, a `success` flag plus an
//! adapter-specific payload (or an `error` string) out. The engine never
//! interprets error strings; it only records them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Canonical adapter names consumed by the step handlers.
///
/// Registering an adapter under one of these names is what binds a concrete
/// capability to the engine; the handlers reference nothing else.
pub mod names {
    pub const CLASSIFY_INTENT: &str = "classify_intent";
    pub const SCAN_MAILBOX: &str = "scan_mailbox";
    pub const PARSE_DOCUMENT: &str = "parse_document";
    pub const EXTRACT_RECORDS: &str = "extract_records";
    pub const SAVE_RECORD: &str = "save_record";
    pub const INDEX_DOCUMENT: &str = "index_document";
    pub const SEARCH_STORE: &str = "search_store";
    pub const QUERY_RECORDS: &str = "query_records";
    pub const WEB_SEARCH: &str = "web_search";
    pub const CREATE_REMINDER: &str = "create_reminder";
    pub const GENERATE_RESPONSE: &str = "generate_response";
}

/// Flat named-parameter input to an adapter call
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(flatten)]
    params: Map<String, Value>,
}

impl ToolInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named parameter (builder style)
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Raw parameter lookup
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// String parameter lookup
    pub fn str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer parameter lookup
    pub fn u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }

    /// Boolean parameter lookup
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }

    /// Deserialize a parameter into a typed value
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.params
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

/// Result of an adapter call
///
/// The call itself never fails: adapters fold every internal error into
/// `success: false` plus an `error` string, so callers can always make
/// forward progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the call succeeded
    pub success: bool,

    /// Adapter-specific payload keys (empty on failure)
    #[serde(default)]
    payload: Map<String, Value>,

    /// Failure description (set when `success` is false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    /// Successful outcome with an empty payload
    pub fn ok() -> Self {
        Self {
            success: true,
            payload: Map::new(),
            error: None,
        }
    }

    /// Successful outcome carrying a prebuilt payload
    pub fn ok_with_payload(payload: Map<String, Value>) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    /// Failed outcome with a description
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Map::new(),
            error: Some(error.into()),
        }
    }

    /// Add a payload key (builder style)
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Failure description, or a placeholder when the adapter gave none
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("unspecified failure")
    }

    /// String payload lookup
    pub fn str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Float payload lookup
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Unsigned integer payload lookup
    pub fn u64(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }

    /// Raw payload lookup
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Deserialize a payload key into a typed value
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.payload
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Deserialize the whole payload into a typed value
    pub fn payload_as<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(Value::Object(self.payload.clone())).ok()
    }
}

/// Tool adapter trait - implement to expose a capability to the engine
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Adapter identifier (one of [`names`])
    fn name(&self) -> &str;

    /// Invoke the capability. Must not panic; fold failures into the outcome.
    async fn invoke(&self, input: ToolInput) -> ToolOutcome;
}

/// Registry for available adapters
#[derive(Default)]
pub struct AdapterSet {
    adapters: HashMap<String, Arc<dyn ToolAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register a new adapter
    pub fn register<A: ToolAdapter + 'static>(&mut self, adapter: A) {
        self.adapters
            .insert(adapter.name().to_string(), Arc::new(adapter));
    }

    /// Register a shared adapter
    pub fn register_arc(&mut self, adapter: Arc<dyn ToolAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    /// Get an adapter by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters.get(name).cloned()
    }

    /// Invoke an adapter by name
    ///
    /// A missing adapter is reported as a failed outcome, not an error, so
    /// a partially wired engine still walks its plan to the terminal step.
    pub async fn invoke(&self, name: &str, input: ToolInput) -> ToolOutcome {
        match self.get(name) {
            Some(adapter) => adapter.invoke(input).await,
            None => {
                tracing::warn!(adapter = name, "adapter not registered");
                ToolOutcome::failure(format!("adapter not registered: {}", name))
            }
        }
    }

    /// Registered adapter names
    pub fn names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoAdapter;

    #[async_trait]
    impl ToolAdapter for EchoAdapter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, input: ToolInput) -> ToolOutcome {
            match input.str("text") {
                Some(text) => ToolOutcome::ok().with("text", json!(text)),
                None => ToolOutcome::failure("missing text"),
            }
        }
    }

    #[tokio::test]
    async fn test_registry_invoke() {
        let mut set = AdapterSet::new();
        set.register(EchoAdapter);
        assert_eq!(set.len(), 1);

        let out = set
            .invoke("echo", ToolInput::new().with("text", json!("hi")))
            .await;
        assert!(out.success);
        assert_eq!(out.str("text"), Some("hi"));
    }

    #[tokio::test]
    async fn test_missing_adapter_is_failure_outcome() {
        let set = AdapterSet::new();
        let out = set.invoke("nope", ToolInput::new()).await;
        assert!(!out.success);
        assert!(out.error_text().contains("nope"));
    }

    #[test]
    fn test_outcome_roundtrip() {
        let out = ToolOutcome::ok().with("count", json!(3));
        let text = serde_json::to_string(&out).unwrap();
        let back: ToolOutcome = serde_json::from_str(&text).unwrap();
        assert!(back.success);
        assert_eq!(back.u64("count"), Some(3));
    }
}
