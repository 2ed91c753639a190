//! Composition root: a layout mounted against one shared connection.
//!
//! The layout is an ordered list. Widgets are created in that order and
//! kept in a `Vec`, so a widget's position (and therefore its identity in
//! any rendering) never changes while the dashboard is mounted.

use std::sync::Arc;

use super::connection::{ConnectionStatus, SharedConnection};
use super::emitter::CommandEmitter;
use super::widget::DisplayWidget;
use crate::domain::io_state::{ADC_NUMBER, INPUT_PINS, OUTPUT_PIN};
use crate::domain::{OutputAction, SignalId};
use crate::wire::Command;

/// Placeholder shown before a widget's first value.
pub const DEFAULT_PLACEHOLDER: &str = "--";

/// One command button in a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    /// Label the user triggers it by.
    pub label: String,
    /// Command sent on trigger.
    pub command: Command,
}

/// Declarative description of a dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardLayout {
    /// Signals to display, in display order. Duplicates are allowed.
    pub signals: Vec<SignalId>,
    /// Command buttons, in display order.
    pub buttons: Vec<ButtonSpec>,
    /// Text shown for widgets without a value.
    pub placeholder: String,
}

impl DashboardLayout {
    /// Layout showing `signals` with no buttons.
    #[must_use]
    pub fn new<I, S>(signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SignalId>,
    {
        Self {
            signals: signals.into_iter().map(Into::into).collect(),
            buttons: Vec::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// The stock IO board layout: every ADC channel, every input pin, the
    /// output pin, and toggle/high/low buttons for the output.
    #[must_use]
    pub fn io_board(adc_channels: u8) -> Self {
        let adc = (0..adc_channels).map(|channel| SignalId::adc_channel(ADC_NUMBER, channel));
        let pins = INPUT_PINS
            .iter()
            .chain(std::iter::once(&OUTPUT_PIN))
            .map(|name| SignalId::from(*name));
        Self::new(adc.chain(pins))
            .with_button("toggle", Command::code(OutputAction::Toggle.code(), OUTPUT_PIN))
            .with_button("high", Command::code(OutputAction::SetHigh.code(), OUTPUT_PIN))
            .with_button("low", Command::code(OutputAction::SetLow.code(), OUTPUT_PIN))
    }

    /// Appends a button.
    #[must_use]
    pub fn with_button(mut self, label: impl Into<String>, command: Command) -> Self {
        self.buttons.push(ButtonSpec {
            label: label.into(),
            command,
        });
        self
    }

    /// Replaces the placeholder text.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

/// A mounted dashboard.
#[derive(Debug)]
pub struct Dashboard {
    connection: Arc<SharedConnection>,
    widgets: Vec<DisplayWidget>,
    buttons: Vec<CommandEmitter>,
    placeholder: String,
}

impl Dashboard {
    /// Mounts every widget and button of `layout` on `connection`.
    #[must_use]
    pub fn mount(connection: &Arc<SharedConnection>, layout: &DashboardLayout) -> Self {
        let widgets = layout
            .signals
            .iter()
            .map(|signal| DisplayWidget::mount(connection, signal.clone()))
            .collect();
        let buttons = layout
            .buttons
            .iter()
            .map(|b| {
                CommandEmitter::new(Arc::clone(connection), b.label.clone(), b.command.clone())
            })
            .collect();
        tracing::debug!(
            widgets = layout.signals.len(),
            buttons = layout.buttons.len(),
            endpoint = %connection.endpoint(),
            "dashboard mounted"
        );
        Self {
            connection: Arc::clone(connection),
            widgets,
            buttons,
            placeholder: layout.placeholder.clone(),
        }
    }

    /// Widgets in layout order.
    #[must_use]
    pub fn widgets(&self) -> &[DisplayWidget] {
        &self.widgets
    }

    /// First widget bound to `signal`.
    #[must_use]
    pub fn widget(&self, signal: &str) -> Option<&DisplayWidget> {
        self.widgets.iter().find(|w| w.signal().as_str() == signal)
    }

    /// Buttons in layout order.
    #[must_use]
    pub fn buttons(&self) -> &[CommandEmitter] {
        &self.buttons
    }

    /// Button with `label`.
    #[must_use]
    pub fn button(&self, label: &str) -> Option<&CommandEmitter> {
        self.buttons.iter().find(|b| b.label() == label)
    }

    /// Status of the shared connection.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// `(signal, rendered value)` pairs in layout order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SignalId, String)> {
        self.widgets
            .iter()
            .map(|w| (w.signal().clone(), w.render(&self.placeholder)))
            .collect()
    }

    /// Renders the dashboard as a two-column text table.
    #[must_use]
    pub fn render(&self) -> String {
        let rows = self.snapshot();
        let width = rows
            .iter()
            .map(|(signal, _)| signal.as_str().len())
            .max()
            .unwrap_or(0)
            .max("signal".len());

        let mut out = format!("connection: {}\n", self.status());
        out.push_str(&format!("{:<width$} | value\n", "signal"));
        out.push_str(&format!("{}-+-{}\n", "-".repeat(width), "-".repeat(5)));
        for (signal, value) in rows {
            out.push_str(&format!("{:<width$} | {value}\n", signal.as_str()));
        }
        if !self.buttons.is_empty() {
            let labels: Vec<&str> = self.buttons.iter().map(CommandEmitter::label).collect();
            out.push_str(&format!("buttons: {}\n", labels.join(", ")));
        }
        out
    }
}
