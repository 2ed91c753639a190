//! Type-safe signal identifier.
//!
//! [`SignalId`] is the routing key carried in the `id` field of every
//! inbound envelope. Matching is exact and case-sensitive; there is no
//! normalization and no wildcard.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of one streamed signal, e.g. `"adc1_channel0"` or `"pin_one"`.
///
/// Fixed for the lifetime of the widget or device channel that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(String);

impl SignalId {
    /// Creates a `SignalId` from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Name of the `channel`-th channel on ADC number `adc`.
    #[must_use]
    pub fn adc_channel(adc: u8, channel: u8) -> Self {
        Self(format!("adc{adc}_channel{channel}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SignalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SignalId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SignalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
