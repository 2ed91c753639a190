//! IO service: samples the board, applies commands and emits updates.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::domain::{EventBus, IoSnapshot, IoSource, IoState, OutputAction};
use crate::domain::io_state::OUTPUT_PIN;
use crate::error::PanelError;
use crate::wire::{Command, TextUpdate};

/// Shortest sampling period.
const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Orchestration layer for the device.
///
/// Owns the [`IoState`] behind a lock and the [`EventBus`] for emission.
/// Every mutation follows the pattern: acquire lock → update state →
/// collect updates → release lock → publish.
#[derive(Debug, Clone)]
pub struct IoService {
    state: Arc<RwLock<IoState>>,
    event_bus: EventBus,
}

impl IoService {
    /// Creates a new `IoService`.
    #[must_use]
    pub fn new(state: IoState, event_bus: EventBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Reads `source` once, stores the sample and publishes every reading.
    ///
    /// Returns the number of updates published.
    pub async fn sample(&self, source: &mut dyn IoSource) -> usize {
        let sample = source.sample();
        let readings = {
            let mut state = self.state.write().await;
            state.apply_sample(&sample);
            state.readings()
        };
        let count = readings.len();
        for update in readings {
            let _ = self.event_bus.publish(update);
        }
        count
    }

    /// Applies a dashboard command to the output pin and publishes the new
    /// output level.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownCommand`] for codes other than 1–3 and
    /// [`PanelError::UnknownSignal`] when `message` is not the output pin.
    pub async fn apply_command(&self, command: &Command) -> Result<bool, PanelError> {
        let action = OutputAction::from_command_id(&command.id)
            .ok_or_else(|| PanelError::UnknownCommand(command.id.to_string()))?;
        if command.message != OUTPUT_PIN {
            return Err(PanelError::UnknownSignal(command.message.clone()));
        }

        let (level, update) = {
            let mut state = self.state.write().await;
            let level = state.apply_output(action);
            (level, state.output_update())
        };
        tracing::info!(?action, output = OUTPUT_PIN, level, "command applied");
        let _ = self.event_bus.publish(update);
        Ok(level)
    }

    /// Current value of every signal, as updates.
    pub async fn readings(&self) -> Vec<TextUpdate> {
        self.state.read().await.readings()
    }

    /// Serializable copy of the current state.
    pub async fn snapshot(&self) -> IoSnapshot {
        self.state.read().await.snapshot()
    }

    /// Samples `source` every `interval` on a background task. Intervals
    /// below one millisecond are raised to one millisecond.
    #[must_use]
    pub fn spawn_sampler(
        self: Arc<Self>,
        mut source: Box<dyn IoSource>,
        interval: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_SAMPLE_INTERVAL));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let published = self.sample(source.as_mut()).await;
                tracing::trace!(published, "sampled");
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SimulatedIo;
    use serde_json::json;

    fn service() -> IoService {
        IoService::new(IoState::new(2), EventBus::new(64))
    }

    #[tokio::test]
    async fn sample_publishes_every_reading() {
        let svc = service();
        let mut rx = svc.event_bus().subscribe();
        let mut io = SimulatedIo::new(2);

        assert_eq!(svc.sample(&mut io).await, 6);
        let Ok(first) = rx.recv().await else {
            panic!("no update");
        };
        assert_eq!(first.id.as_str(), "adc1_channel0");
        assert!(svc.snapshot().await.sampled_at.is_some());
    }

    #[tokio::test]
    async fn toggle_command_flips_output_and_publishes() {
        let svc = service();
        let mut rx = svc.event_bus().subscribe();

        let result = svc.apply_command(&Command::code(1, OUTPUT_PIN)).await;
        assert_eq!(result, Ok(true));
        let Ok(update) = rx.recv().await else {
            panic!("no update");
        };
        assert_eq!(update, TextUpdate::new(OUTPUT_PIN, "1"));
        assert!(svc.snapshot().await.output);
    }

    #[tokio::test]
    async fn unknown_code_and_signal_are_rejected() {
        let svc = service();
        assert_eq!(
            svc.apply_command(&Command::code(9, OUTPUT_PIN)).await,
            Err(PanelError::UnknownCommand("9".to_string()))
        );
        assert_eq!(
            svc.apply_command(&Command::code(1, "pin_nine")).await,
            Err(PanelError::UnknownSignal("pin_nine".to_string()))
        );
        assert!(!svc.snapshot().await.output);
    }

    #[tokio::test]
    async fn readings_reflect_state() {
        let svc = service();
        let level = tokio_test::assert_ok!(svc.apply_command(&Command::code(2, OUTPUT_PIN)).await);
        assert!(level);
        let readings = svc.readings().await;
        let Some(last) = readings.last() else {
            panic!("no readings");
        };
        assert_eq!(last.text, json!("1"));
    }

    #[tokio::test]
    async fn sampler_runs_on_interval() {
        let svc = Arc::new(service());
        let mut rx = svc.event_bus().subscribe();
        let handle = Arc::clone(&svc)
            .spawn_sampler(Box::new(SimulatedIo::new(2)), Duration::from_millis(10));

        let Ok(update) = rx.recv().await else {
            panic!("sampler published nothing");
        };
        assert_eq!(update.id.as_str(), "adc1_channel0");
        handle.abort();
    }

    #[tokio::test]
    async fn zero_interval_sampler_keeps_running() {
        let svc = Arc::new(service());
        let mut rx = svc.event_bus().subscribe();
        let handle =
            Arc::clone(&svc).spawn_sampler(Box::new(SimulatedIo::new(2)), Duration::ZERO);

        for _ in 0..12 {
            assert!(matches!(
                rx.recv().await,
                Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_))
            ));
        }
        assert!(!handle.is_finished());
        handle.abort();
    }
}
