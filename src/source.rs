//! Audio Sources
//!
//! The core does not produce audio. Each tick it pulls one Q1.13 sample from
//! whichever collaborator `source_select` names: stored-message playback
//! (`Buffer`) or live capture (`Live`). This module defines that seam and a
//! few stock sources for tests, benchmarks, and hosts without real capture.

use crate::fixed::{q13_from_f64, saturate_i14, Q13_ONE};
use crate::registers::phase_increment;
use crate::sine::SineTable;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Number of selectable messages (`message_select` is 4 bits).
pub const MESSAGE_SLOTS: usize = 16;

/// A stream of Q1.13 audio samples, one per tick.
pub trait AudioSource: Send {
    /// Produce the sample for this tick.
    fn next_sample(&mut self) -> i16;

    /// Restart from the beginning.
    fn reset(&mut self);

    /// React to a change of `message_select`. Most sources ignore it.
    fn select_message(&mut self, _message: u8) {}
}

/// Always zero. Modulators then emit the bare carrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl AudioSource for Silence {
    fn next_sample(&mut self) -> i16 {
        0
    }

    fn reset(&mut self) {}
}

/// Fixed-frequency test tone from the shared sine table.
#[derive(Debug, Clone)]
pub struct ToneSource {
    phase: u32,
    increment: u32,
    amplitude_q13: i32,
    table: &'static SineTable,
}

impl ToneSource {
    /// `amplitude` is clamped to `[0, 1]`.
    pub fn new(freq_hz: f64, sample_rate: u32, amplitude: f64) -> Self {
        Self {
            phase: 0,
            increment: phase_increment(freq_hz, sample_rate),
            amplitude_q13: (amplitude.clamp(0.0, 1.0) * Q13_ONE as f64) as i32,
            table: SineTable::shared(),
        }
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }
}

impl AudioSource for ToneSource {
    fn next_sample(&mut self) -> i16 {
        let s = self.table.lookup(self.phase) as i64 * self.amplitude_q13 as i64;
        self.phase = self.phase.wrapping_add(self.increment);
        saturate_i14(s >> 13)
    }

    fn reset(&mut self) {
        self.phase = 0;
    }
}

/// Uniform white noise from a seeded generator.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: SmallRng,
    seed: u64,
    amplitude: f64,
}

impl NoiseSource {
    pub fn new(seed: u64, amplitude: f64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            seed,
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }
}

impl AudioSource for NoiseSource {
    fn next_sample(&mut self) -> i16 {
        q13_from_f64(self.rng.gen_range(-1.0f64..=1.0) * self.amplitude)
    }

    fn reset(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.seed);
    }
}

/// Stored-message playback.
///
/// Holds up to [`MESSAGE_SLOTS`] clips. The selected clip loops; each sample
/// is held for `hold_ticks` ticks so a low-rate clip can drive a fast core.
/// An empty slot plays silence.
#[derive(Debug, Clone)]
pub struct BufferSource {
    clips: Vec<Vec<i16>>,
    selected: usize,
    position: usize,
    hold_ticks: u32,
    held: u32,
}

impl BufferSource {
    pub fn new() -> Self {
        Self {
            clips: vec![Vec::new(); MESSAGE_SLOTS],
            selected: 0,
            position: 0,
            hold_ticks: 1,
            held: 0,
        }
    }

    /// Repeat every sample for `ticks` ticks (at least one).
    pub fn with_hold(mut self, ticks: u32) -> Self {
        self.hold_ticks = ticks.max(1);
        self
    }

    /// Store a Q1.13 clip in `slot`. Samples outside the 14-bit range
    /// saturate. Slots past the last are ignored and return `false`.
    pub fn load(&mut self, slot: usize, samples: &[i16]) -> bool {
        let Some(clip) = self.clips.get_mut(slot) else {
            return false;
        };
        *clip = samples.iter().map(|&s| saturate_i14(s as i64)).collect();
        if slot == self.selected {
            self.rewind();
        }
        true
    }

    /// Store a full-range 16-bit PCM clip, narrowing it to Q1.13.
    pub fn load_pcm16(&mut self, slot: usize, pcm: &[i16]) -> bool {
        let narrowed: Vec<i16> = pcm.iter().map(|&s| s >> 2).collect();
        self.load(slot, &narrowed)
    }

    pub fn clip(&self, slot: usize) -> Option<&[i16]> {
        self.clips.get(slot).map(Vec::as_slice)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn rewind(&mut self) {
        self.position = 0;
        self.held = 0;
    }
}

impl Default for BufferSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for BufferSource {
    fn next_sample(&mut self) -> i16 {
        let clip = &self.clips[self.selected];
        if clip.is_empty() {
            return 0;
        }
        let sample = clip[self.position];
        self.held += 1;
        if self.held >= self.hold_ticks {
            self.held = 0;
            self.position = (self.position + 1) % clip.len();
        }
        sample
    }

    fn reset(&mut self) {
        self.rewind();
    }

    fn select_message(&mut self, message: u8) {
        let slot = message as usize % MESSAGE_SLOTS;
        if slot != self.selected {
            self.selected = slot;
            self.rewind();
        }
    }
}
