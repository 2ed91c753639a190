//! Hardware sampling seam.
//!
//! Real boards implement [`IoSource`] over their GPIO/ADC drivers. The crate
//! ships [`SimulatedIo`], a deterministic stand-in that lets the whole
//! pipeline run on any machine.

/// One reading of every input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// ADC readings by channel.
    pub adc: Vec<u16>,
    /// Input pin levels in `INPUT_PINS` order.
    pub inputs: [bool; 3],
}

/// Something that can be sampled for ADC and pin levels.
pub trait IoSource: Send {
    /// Reads every input once.
    fn sample(&mut self) -> Sample;
}

/// Full-scale value of a 12-bit ADC.
const ADC_FULL_SCALE: u64 = 4096;
/// Sawtooth increment per sample.
const ADC_STEP: u64 = 64;
/// Phase offset between neighbouring channels.
const ADC_PHASE: u64 = 512;

/// Deterministic simulated board.
///
/// ADC channels run a phase-shifted sawtooth; input pins count in binary.
#[derive(Debug, Clone)]
pub struct SimulatedIo {
    channels: u8,
    tick: u64,
}

impl SimulatedIo {
    /// Creates a simulator with `channels` ADC channels.
    #[must_use]
    pub fn new(channels: u8) -> Self {
        Self { channels, tick: 0 }
    }
}

impl IoSource for SimulatedIo {
    fn sample(&mut self) -> Sample {
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let adc = (0..u64::from(self.channels))
            .map(|channel| {
                let raw = tick.wrapping_mul(ADC_STEP).wrapping_add(channel * ADC_PHASE)
                    % ADC_FULL_SCALE;
                u16::try_from(raw).unwrap_or(u16::MAX)
            })
            .collect();
        let inputs = [tick & 1 != 0, tick & 2 != 0, tick & 4 != 0];

        Sample { adc, inputs }
    }
}
