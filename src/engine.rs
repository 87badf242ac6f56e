//! Channel Composition Engine
//!
//! Drives `N` independent carrier channels from one audio sample and mixes
//! them into the composite output. The engine does not read the register
//! file or the supervisor directly. It receives the phase increments and the
//! already-derived [`Gating`] for the tick, which keeps the fail-safe path a
//! one-way signal.

use crate::channel::{Channel, ChannelInput, MAX_CHANNELS};
use crate::mixer::{GatedSample, Mixer, ScaleTable};
use crate::module::Module;
use crate::registers::Gating;

/// Everything the engine consumes on one tick.
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub increments: &'a [u32],
    pub gating: Gating,
    /// Selected audio sample, Q1.13.
    pub audio: i16,
}

/// Multi-channel oscillator, modulator, and mixer.
pub struct CompositionEngine {
    channels: Vec<Channel>,
    mixer: Mixer,
    gated: [GatedSample; MAX_CHANNELS],
}

impl CompositionEngine {
    /// Create an engine with `channels` carriers (clamped to `1..=MAX_CHANNELS`).
    pub fn new(channels: usize, modulation_index_q13: i32, table: ScaleTable) -> Self {
        let n = channels.clamp(1, MAX_CHANNELS);
        Self {
            channels: (0..n).map(|_| Channel::new(modulation_index_q13)).collect(),
            mixer: Mixer::new(table),
            gated: [GatedSample::default(); MAX_CHANNELS],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Gated per-channel samples from the most recent tick.
    pub fn gated(&self) -> &[GatedSample] {
        &self.gated[..self.channels.len()]
    }

    /// Composite output from the most recent tick.
    pub fn output(&self) -> i16 {
        self.mixer.last_output()
    }

    /// Run every channel, then the mixer, for one tick.
    pub fn tick(&mut self, input: EngineInput<'_>) -> i16 {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            self.gated[i] = channel.tick(ChannelInput {
                phase_increment: input.increments.get(i).copied().unwrap_or(0),
                audio: input.audio,
                enabled: input.gating.channel(i),
            });
        }
        let n = self.channels.len();
        self.mixer.mix(self.gated[..n].iter().copied())
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.mixer.reset();
        self.gated = [GatedSample::default(); MAX_CHANNELS];
    }
}
