//! Wire types for the message endpoint.
//!
//! Field names match the service JSON exactly. Request optionals are omitted when unset;
//! response fields the service leaves out decode to empty defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One message turn sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub input: InputData,
    /// Ask the service for every intent above its threshold, not just the top one.
    #[serde(default, skip_serializing_if = "is_false")]
    pub alternate_intents: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Intent hints; replace the service's own classification when present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<RuntimeIntent>,
    /// Entity hints; replace the service's own extraction when present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<RuntimeEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputData>,
}

impl MessageRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            input: InputData::new(text),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_alternate_intents(mut self, enabled: bool) -> Self {
        self.alternate_intents = enabled;
        self
    }

    pub fn with_intents(mut self, intents: Vec<RuntimeIntent>) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_entities(mut self, entities: Vec<RuntimeEntity>) -> Self {
        self.entities = entities;
        self
    }
}

/// The user utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

impl InputData {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Service reply to one message turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Echo of the input that produced this response.
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: InputData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intents: Vec<RuntimeIntent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<RuntimeEntity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternate_intents: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: Context,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: OutputData,
}

impl MessageResponse {
    /// Highest-confidence intent. The service returns intents sorted by confidence.
    pub fn top_intent(&self) -> Option<&RuntimeIntent> {
        self.intents.first()
    }

    /// Output text lines joined with newlines.
    pub fn text(&self) -> String {
        self.output.text.join("\n")
    }
}

/// A recognized intent and its confidence in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeIntent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub intent: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
}

impl RuntimeIntent {
    pub fn new(intent: impl Into<String>, confidence: f64) -> Self {
        Self {
            intent: intent.into(),
            confidence,
        }
    }
}

/// A recognized entity: label, character span in the input, value, confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEntity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entity: String,
    /// `[start, end)` character offsets into the input text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: Vec<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Conversation state maintained by the service.
///
/// Echo it back unchanged on the next turn to resume the dialogue. `system` is owned by the
/// service and never interpreted here. Dialogue-defined context variables live next to it and
/// are kept in `variables` so the whole object round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, deserialize_with = "null_as_default")]
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub system: Value,
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

/// Dialogue output for a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_messages: Vec<LogMessage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes_visited: Vec<String>,
}

/// Diagnostic entry logged by the dialogue runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
}

/// Absent or `null` both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn is_false(b: &bool) -> bool {
    !*b
}
