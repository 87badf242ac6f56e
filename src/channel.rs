//! Carrier Channel
//!
//! One oscillator feeding one AM modulator, followed by the enable gate. The
//! oscillator and modulator run on every tick whether or not the channel is
//! enabled, so re-enabling a channel resumes at its free-running phase.

use crate::mixer::GatedSample;
use crate::modulator::AmModulator;
use crate::module::Module;
use crate::oscillator::Oscillator;

/// Number of channels the register map addresses.
pub const MAX_CHANNELS: usize = 12;

/// Per-tick input to a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelInput {
    pub phase_increment: u32,
    /// Selected audio sample, Q1.13.
    pub audio: i16,
    /// Effective channel enable (already combined with master and fault).
    pub enabled: bool,
}

/// Runtime state for one carrier.
#[derive(Default)]
pub struct Channel {
    oscillator: Oscillator,
    modulator: AmModulator,
}

impl Channel {
    pub fn new(modulation_index_q13: i32) -> Self {
        Self {
            oscillator: Oscillator::new(),
            modulator: AmModulator::new(modulation_index_q13),
        }
    }

    pub fn phase(&self) -> u32 {
        self.oscillator.phase()
    }

    pub fn carrier(&self) -> i16 {
        self.oscillator.carrier()
    }

    /// Modulated sample before gating.
    pub fn modulated(&self) -> i16 {
        self.modulator.last()
    }
}

impl Module for Channel {
    type In = ChannelInput;
    type Out = GatedSample;

    #[inline]
    fn tick(&mut self, input: ChannelInput) -> GatedSample {
        let carrier = self.oscillator.tick(input.phase_increment);
        let modulated = self.modulator.tick((input.audio, carrier));
        GatedSample {
            sample: if input.enabled { modulated } else { 0 },
            enabled: input.enabled,
        }
    }

    fn reset(&mut self) {
        self.oscillator.reset();
        self.modulator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUARTER: u32 = 1 << 30;

    #[test]
    fn test_disabled_channel_outputs_zero_but_keeps_running() {
        let mut ch = Channel::default();
        let input = ChannelInput {
            phase_increment: QUARTER,
            audio: 0,
            enabled: false,
        };
        ch.tick(input);
        let out = ch.tick(input);
        assert_eq!(out.sample, 0);
        assert!(!out.enabled);
        // The modulator still saw the quarter-turn carrier.
        assert_eq!(ch.modulated(), 4095);
        assert_eq!(ch.phase(), 2 * QUARTER);
    }

    #[test]
    fn test_enabled_channel_passes_modulated_sample() {
        let mut ch = Channel::default();
        let input = ChannelInput {
            phase_increment: QUARTER,
            audio: 0,
            enabled: true,
        };
        assert_eq!(ch.tick(input).sample, 0);
        let out = ch.tick(input);
        assert_eq!(out.sample, 4095);
        assert!(out.enabled);
    }

    #[test]
    fn test_reset_clears_runtime_state() {
        let mut ch = Channel::default();
        let input = ChannelInput {
            phase_increment: 777,
            audio: 100,
            enabled: true,
        };
        for _ in 0..10 {
            ch.tick(input);
        }
        ch.reset();
        assert_eq!(ch.phase(), 0);
        assert_eq!(ch.carrier(), 0);
        assert_eq!(ch.modulated(), 0);
    }
}
