//! Inbound and outbound envelopes.
//!
//! ```text
//! device -> dashboard   {"id": "adc1_channel0", "text": 42}
//! dashboard -> device   {"id": 1, "message": "pin_selection_one"}
//! ```
//!
//! Inbound payloads are untyped: whatever sits in the value field is shown
//! verbatim. Outbound commands are not validated before send; the device
//! interprets them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::SignalId;
use crate::error::PanelError;

/// Name of the inbound field holding the displayed value.
pub const DEFAULT_VALUE_FIELD: &str = "text";

/// Device → dashboard update for one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TextUpdate {
    /// Routing key.
    #[schema(value_type = String)]
    pub id: SignalId,
    /// Value to display. Any JSON type.
    #[schema(value_type = Object)]
    pub text: Value,
}

impl TextUpdate {
    /// Creates an update for `id`.
    #[must_use]
    pub fn new(id: impl Into<SignalId>, text: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Serializes the update into a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::MalformedPayload`] if serialization fails.
    pub fn to_json(&self) -> Result<String, PanelError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An inbound frame as seen by the router.
///
/// Extra fields are discarded. An absent or non-string `id` is kept as
/// `None` so the frame can be treated as addressed to nobody.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    id: Option<SignalId>,
    value: Option<Value>,
}

impl InboundEnvelope {
    /// Parses a raw text frame, reading the value from `value_field`.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::MalformedPayload`] if `raw` is not a JSON
    /// object.
    pub fn parse(raw: &str, value_field: &str) -> Result<Self, PanelError> {
        let Value::Object(mut map) = serde_json::from_str::<Value>(raw)? else {
            return Err(PanelError::MalformedPayload(
                "expected a JSON object".to_string(),
            ));
        };
        let id = match map.remove("id") {
            Some(Value::String(id)) => Some(SignalId::from(id)),
            _ => None,
        };
        Ok(Self {
            id,
            value: map.remove(value_field),
        })
    }

    /// Routing key, if the frame carried one.
    #[must_use]
    pub fn id(&self) -> Option<&SignalId> {
        self.id.as_ref()
    }

    /// Displayed value, if the frame carried one.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Command code: either numeric or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CommandId {
    /// Numeric code, e.g. `1`.
    Code(i64),
    /// Named code, e.g. `"reset"`.
    Name(String),
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for CommandId {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<&str> for CommandId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

/// Dashboard → device command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Command {
    /// Action code.
    pub id: CommandId,
    /// Free-form payload.
    pub message: String,
}

impl Command {
    /// Creates a command.
    #[must_use]
    pub fn new(id: impl Into<CommandId>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a command with a numeric code.
    #[must_use]
    pub fn code(code: i64, message: impl Into<String>) -> Self {
        Self::new(CommandId::Code(code), message)
    }

    /// Serializes the command into a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::MalformedPayload`] if serialization fails.
    pub fn to_json(&self) -> Result<String, PanelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a command frame.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::MalformedPayload`] if `raw` is not JSON or
    /// lacks `id` or `message`.
    pub fn parse(raw: &str) -> Result<Self, PanelError> {
        Ok(serde_json::from_str(raw)?)
    }
}
