//! Identifier-keyed dispatch of inbound frames.
//!
//! Every inbound frame is parsed once and handed to the callbacks registered
//! under its `id`. Callbacks for other identifiers never see it. Frames that
//! fail to parse, or that nobody subscribed to, are dropped here and never
//! reach a widget.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;

use crate::domain::SignalId;
use crate::wire::InboundEnvelope;

type Callback = Box<dyn Fn(&Value) + Send + Sync>;

/// Result of routing one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered to this many callbacks (at least one).
    Delivered(usize),
    /// No live subscriber for the frame's identifier, or no identifier.
    Unrouted,
    /// Not an envelope, or an addressed envelope without a value.
    Malformed,
}

#[derive(Default)]
struct Registrations {
    next_key: u64,
    by_signal: HashMap<SignalId, Vec<(u64, Callback)>>,
}

impl Registrations {
    fn remove(&mut self, signal: &SignalId, key: u64) {
        if let Some(entries) = self.by_signal.get_mut(signal) {
            entries.retain(|(k, _)| *k != key);
            if entries.is_empty() {
                self.by_signal.remove(signal);
            }
        }
    }
}

/// Central dispatcher shared by every widget on one connection.
///
/// Callbacks run on the dispatching task while the registration lock is
/// held, in registration order. A callback must not register or drop a
/// [`Subscription`] itself.
#[derive(Clone)]
pub struct Router {
    value_field: Arc<str>,
    registrations: Arc<Mutex<Registrations>>,
}

impl Router {
    /// Creates an empty router reading values from `value_field`.
    #[must_use]
    pub fn new(value_field: &str) -> Self {
        Self {
            value_field: Arc::from(value_field),
            registrations: Arc::new(Mutex::new(Registrations::default())),
        }
    }

    /// Name of the inbound field carrying the value.
    #[must_use]
    pub fn value_field(&self) -> &str {
        &self.value_field
    }

    /// Registers `callback` for frames addressed to `signal`.
    ///
    /// The registration lives until the returned [`Subscription`] is
    /// dropped.
    pub fn register<F>(&self, signal: SignalId, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut regs = self.lock();
        let key = regs.next_key;
        regs.next_key += 1;
        regs.by_signal
            .entry(signal.clone())
            .or_default()
            .push((key, Box::new(callback)));
        tracing::trace!(signal = %signal, key, "subscriber registered");

        Subscription {
            signal,
            key,
            registrations: Arc::downgrade(&self.registrations),
        }
    }

    /// Routes one raw inbound frame.
    pub fn dispatch(&self, raw: &str) -> DispatchOutcome {
        let envelope = match InboundEnvelope::parse(raw, &self.value_field) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::debug!(error = %err, "dropping inbound frame");
                return DispatchOutcome::Malformed;
            }
        };
        let Some(signal) = envelope.id() else {
            return DispatchOutcome::Unrouted;
        };

        let regs = self.lock();
        let Some(entries) = regs.by_signal.get(signal) else {
            tracing::trace!(signal = %signal, "no subscriber");
            return DispatchOutcome::Unrouted;
        };
        let Some(value) = envelope.value() else {
            tracing::debug!(signal = %signal, field = %self.value_field, "frame has no value");
            return DispatchOutcome::Malformed;
        };
        for (_, callback) in entries {
            callback(value);
        }
        DispatchOutcome::Delivered(entries.len())
    }

    /// Number of live registrations across all identifiers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().by_signal.values().map(Vec::len).sum()
    }

    /// Number of live registrations for `signal`.
    #[must_use]
    pub fn subscribers_for(&self, signal: &str) -> usize {
        self.lock().by_signal.get(signal).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Registrations> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("value_field", &self.value_field)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Live registration with a [`Router`]. Dropping it unregisters.
#[derive(Debug)]
pub struct Subscription {
    signal: SignalId,
    key: u64,
    registrations: Weak<Mutex<Registrations>>,
}

impl Subscription {
    /// Identifier this subscription listens to.
    #[must_use]
    pub fn signal(&self) -> &SignalId {
        &self.signal
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registrations) = self.registrations.upgrade() {
            registrations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.signal, self.key);
            tracing::trace!(signal = %self.signal, key = self.key, "subscriber removed");
        }
    }
}
