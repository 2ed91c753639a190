//! Display widgets: one value cell bound to one signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::watch;

use super::connection::SharedConnection;
use super::router::Subscription;
use crate::domain::SignalId;

/// What a widget currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WidgetValue {
    /// Nothing accepted yet.
    #[default]
    Placeholder,
    /// Last accepted value, verbatim.
    Populated(Value),
}

impl WidgetValue {
    /// Returns `true` until the first matching frame arrives.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Text form of the value. Strings are shown without quotes, other JSON
    /// values in their JSON form.
    #[must_use]
    pub fn render(&self, placeholder: &str) -> String {
        match self {
            Self::Placeholder => placeholder.to_string(),
            Self::Populated(Value::String(text)) => text.clone(),
            Self::Populated(value) => value.to_string(),
        }
    }
}

/// A mounted widget.
///
/// Dropping the widget unmounts it: its router registration goes away and
/// its value cell is never written again.
#[derive(Debug)]
pub struct DisplayWidget {
    subscription: Subscription,
    value: Arc<watch::Sender<WidgetValue>>,
    updates: Arc<AtomicU64>,
}

impl DisplayWidget {
    /// Mounts a widget for `signal` on `conn`, starting at the placeholder.
    pub fn mount(conn: &SharedConnection, signal: impl Into<SignalId>) -> Self {
        let (tx, _) = watch::channel(WidgetValue::Placeholder);
        let value = Arc::new(tx);
        let updates = Arc::new(AtomicU64::new(0));

        let cell = Arc::clone(&value);
        let counter = Arc::clone(&updates);
        let subscription = conn.router().register(signal.into(), move |incoming| {
            cell.send_replace(WidgetValue::Populated(incoming.clone()));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            subscription,
            value,
            updates,
        }
    }

    /// Signal this widget is bound to.
    #[must_use]
    pub fn signal(&self) -> &SignalId {
        self.subscription.signal()
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> WidgetValue {
        self.value.borrow().clone()
    }

    /// Observable value for a presentation layer.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<WidgetValue> {
        self.value.subscribe()
    }

    /// Number of accepted frames, duplicates included.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    /// Current value as text.
    #[must_use]
    pub fn render(&self, placeholder: &str) -> String {
        self.value.borrow().render(placeholder)
    }
}
