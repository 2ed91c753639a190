//! Device-side IO state: ADC channels, input pins and the output pin.
//!
//! The state is the single source for everything the device publishes. Each
//! signal maps to one [`TextUpdate`]: ADC readings go out as JSON numbers,
//! pins as `"1"` / `"0"`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::SignalId;
use super::io_source::Sample;
use crate::wire::{CommandId, TextUpdate};

/// ADC number used in channel names (`adc1_channel0`, ...).
pub const ADC_NUMBER: u8 = 1;
/// First digital input.
pub const PIN_ONE: &str = "pin_one";
/// Second digital input.
pub const PIN_TWO: &str = "pin_two";
/// Third digital input.
pub const PIN_THREE: &str = "pin_three";
/// The user-driven output pin.
pub const OUTPUT_PIN: &str = "pin_selection_one";

/// Input pin names in publication order.
pub const INPUT_PINS: [&str; 3] = [PIN_ONE, PIN_TWO, PIN_THREE];

/// Action a command applies to the output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    /// Invert the output. Code `1`.
    Toggle,
    /// Drive the output high. Code `2`.
    SetHigh,
    /// Drive the output low. Code `3`.
    SetLow,
}

impl OutputAction {
    /// Numeric command code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Toggle => 1,
            Self::SetHigh => 2,
            Self::SetLow => 3,
        }
    }

    /// Decodes a command id. Only numeric codes are understood.
    #[must_use]
    pub fn from_command_id(id: &CommandId) -> Option<Self> {
        match id {
            CommandId::Code(1) => Some(Self::Toggle),
            CommandId::Code(2) => Some(Self::SetHigh),
            CommandId::Code(3) => Some(Self::SetLow),
            _ => None,
        }
    }
}

/// Serializable view of [`IoState`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IoSnapshot {
    /// ADC readings indexed by channel.
    pub adc: Vec<u16>,
    /// Input pin levels in [`INPUT_PINS`] order.
    pub inputs: Vec<bool>,
    /// Output pin level.
    pub output: bool,
    /// Time of the last sample, if any.
    pub sampled_at: Option<DateTime<Utc>>,
}

/// Current levels of every device signal.
#[derive(Debug, Clone)]
pub struct IoState {
    adc: Vec<u16>,
    inputs: [bool; 3],
    output: bool,
    sampled_at: Option<DateTime<Utc>>,
}

impl IoState {
    /// Creates a state with `adc_channels` zeroed channels and all pins low.
    #[must_use]
    pub fn new(adc_channels: u8) -> Self {
        Self {
            adc: vec![0; usize::from(adc_channels)],
            inputs: [false; 3],
            output: false,
            sampled_at: None,
        }
    }

    /// Sets input `pin` (0-based) to `value`. Out-of-range pins are ignored.
    pub fn set_input(&mut self, pin: usize, value: bool) {
        if let Some(slot) = self.inputs.get_mut(pin) {
            *slot = value;
        }
    }

    /// Stores a fresh sample. Extra ADC readings beyond the configured
    /// channel count are ignored.
    pub fn apply_sample(&mut self, sample: &Sample) {
        for (slot, reading) in self.adc.iter_mut().zip(&sample.adc) {
            *slot = *reading;
        }
        for (pin, value) in sample.inputs.iter().enumerate() {
            self.set_input(pin, *value);
        }
        self.sampled_at = Some(Utc::now());
    }

    /// Output pin level.
    #[must_use]
    pub fn output(&self) -> bool {
        self.output
    }

    /// Applies `action` to the output pin and returns the new level.
    pub fn apply_output(&mut self, action: OutputAction) -> bool {
        self.output = match action {
            OutputAction::Toggle => !self.output,
            OutputAction::SetHigh => true,
            OutputAction::SetLow => false,
        };
        self.output
    }

    /// Update carrying the output pin level.
    #[must_use]
    pub fn output_update(&self) -> TextUpdate {
        TextUpdate::new(OUTPUT_PIN, pin_text(self.output))
    }

    /// One update per signal: ADC channels, inputs, then the output.
    #[must_use]
    pub fn readings(&self) -> Vec<TextUpdate> {
        let adc = self.adc.iter().enumerate().map(|(channel, reading)| {
            let channel = u8::try_from(channel).unwrap_or(u8::MAX);
            TextUpdate::new(SignalId::adc_channel(ADC_NUMBER, channel), *reading)
        });
        let inputs = INPUT_PINS
            .iter()
            .zip(self.inputs)
            .map(|(name, level)| TextUpdate::new(*name, pin_text(level)));
        adc.chain(inputs)
            .chain(std::iter::once(self.output_update()))
            .collect()
    }

    /// Serializable copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> IoSnapshot {
        IoSnapshot {
            adc: self.adc.clone(),
            inputs: self.inputs.to_vec(),
            output: self.output,
            sampled_at: self.sampled_at,
        }
    }
}

fn pin_text(level: bool) -> &'static str {
    if level { "1" } else { "0" }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn readings_cover_every_signal_in_order() {
        let state = IoState::new(2);
        let ids: Vec<String> = state
            .readings()
            .into_iter()
            .map(|u| u.id.to_string())
            .collect();
        assert_eq!(
            ids,
            [
                "adc1_channel0",
                "adc1_channel1",
                "pin_one",
                "pin_two",
                "pin_three",
                "pin_selection_one"
            ]
        );
    }

    #[test]
    fn sample_updates_adc_and_pins() {
        let mut state = IoState::new(2);
        state.apply_sample(&Sample {
            adc: vec![42, 17, 99],
            inputs: [true, false, true],
        });
        let readings = state.readings();
        let Some(first) = readings.first() else {
            panic!("no readings");
        };
        assert_eq!(first.text, json!(42));
        assert_eq!(state.snapshot().adc, vec![42, 17]);
        assert_eq!(state.snapshot().inputs, vec![true, false, true]);
        assert!(state.snapshot().sampled_at.is_some());
    }

    #[test]
    fn output_actions() {
        let mut state = IoState::new(0);
        assert!(state.apply_output(OutputAction::Toggle));
        assert!(!state.apply_output(OutputAction::Toggle));
        assert!(state.apply_output(OutputAction::SetHigh));
        assert!(state.apply_output(OutputAction::SetHigh));
        assert!(!state.apply_output(OutputAction::SetLow));
        assert_eq!(state.output_update().text, json!("0"));
    }

    #[test]
    fn command_codes_decode() {
        for action in [OutputAction::Toggle, OutputAction::SetHigh, OutputAction::SetLow] {
            assert_eq!(
                OutputAction::from_command_id(&CommandId::Code(action.code())),
                Some(action)
            );
        }
        assert_eq!(OutputAction::from_command_id(&CommandId::Code(9)), None);
        assert_eq!(OutputAction::from_command_id(&CommandId::from("1")), None);
    }

    #[test]
    fn set_input_ignores_unknown_pins() {
        let mut state = IoState::new(0);
        state.set_input(7, true);
        assert_eq!(state.snapshot().inputs, vec![false, false, false]);
    }
}
