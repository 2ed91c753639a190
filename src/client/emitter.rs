//! Command emitters: user actions turned into outbound commands.

use std::sync::Arc;

use super::connection::SharedConnection;
use crate::wire::Command;

/// What happened to a triggered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport. Not acknowledged by the device.
    Sent,
    /// Dropped because the connection was not open.
    Dropped,
}

/// A button-like source of commands.
///
/// Fire-and-forget: one trigger sends at most one command, never retries
/// and never waits for the device.
#[derive(Debug, Clone)]
pub struct CommandEmitter {
    conn: Arc<SharedConnection>,
    label: String,
    command: Command,
}

impl CommandEmitter {
    /// Creates an emitter that sends `command` when triggered.
    #[must_use]
    pub fn new(conn: Arc<SharedConnection>, label: impl Into<String>, command: Command) -> Self {
        Self {
            conn,
            label: label.into(),
            command,
        }
    }

    /// Button label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The fixed command this emitter sends.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Sends the fixed command.
    pub fn trigger(&self) -> Delivery {
        self.emit(&self.command)
    }

    /// Sends the emitter's command code with an action-specific message.
    pub fn trigger_with(&self, message: impl Into<String>) -> Delivery {
        let command = Command {
            id: self.command.id.clone(),
            message: message.into(),
        };
        self.emit(&command)
    }

    fn emit(&self, command: &Command) -> Delivery {
        match self.conn.send(command) {
            Ok(()) => {
                tracing::debug!(label = %self.label, command = %command.id, "command sent");
                Delivery::Sent
            }
            Err(err) => {
                tracing::warn!(
                    label = %self.label,
                    command = %command.id,
                    error = %err,
                    "command dropped"
                );
                Delivery::Dropped
            }
        }
    }
}
