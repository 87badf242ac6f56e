//! Amplitude Modulator
//!
//! Double-sideband, full-carrier AM in fixed point:
//!
//! ```text
//! envelope = 1.0 + m * audio            Q2.13, 8192 encodes 1.0
//! product  = envelope * carrier         Q3.26 in an i64
//! scaled   = product >> 14              one headroom bit for the carrier DC term
//! out      = saturate_i14(scaled)
//! ```
//!
//! With `m <= 1.0` and a full-scale carrier the result stays inside the 14-bit
//! range, but the narrowing still goes through [`saturate_i14`] so an
//! out-of-range index can never wrap.

use crate::fixed::{saturate_i14, DEFAULT_MOD_INDEX_Q13, FRAC_BITS, Q13_ONE};
use crate::module::Module;

/// Right shift applied to the envelope-carrier product.
pub const PRODUCT_SHIFT: u32 = 14;

/// Fixed-index AM modulator.
#[derive(Debug, Clone)]
pub struct AmModulator {
    index_q13: i32,
    last: i16,
}

impl AmModulator {
    /// Create a modulator with modulation index `index_q13 / 8192`.
    pub fn new(index_q13: i32) -> Self {
        Self { index_q13, last: 0 }
    }

    pub fn index_q13(&self) -> i32 {
        self.index_q13
    }

    /// Most recent modulated sample.
    pub fn last(&self) -> i16 {
        self.last
    }

    /// Q2.13 envelope for an audio sample.
    #[inline]
    pub fn envelope(&self, audio: i16) -> i32 {
        Q13_ONE + ((self.index_q13 * audio as i32) >> FRAC_BITS)
    }

    /// Modulate without touching state.
    #[inline]
    pub fn modulate(&self, audio: i16, carrier: i16) -> i16 {
        let product = self.envelope(audio) as i64 * carrier as i64;
        saturate_i14(product >> PRODUCT_SHIFT)
    }
}

impl Default for AmModulator {
    fn default() -> Self {
        Self::new(DEFAULT_MOD_INDEX_Q13)
    }
}

impl Module for AmModulator {
    /// `(audio, carrier)`, both Q1.13.
    type In = (i16, i16);
    /// Modulated sample, Q1.13.
    type Out = i16;

    #[inline]
    fn tick(&mut self, (audio, carrier): (i16, i16)) -> i16 {
        self.last = self.modulate(audio, carrier);
        self.last
    }

    fn reset(&mut self) {
        self.last = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::{SAMPLE_MAX, SAMPLE_MIN};

    #[test]
    fn test_envelope_unity_at_silence() {
        let m = AmModulator::default();
        assert_eq!(m.envelope(0), Q13_ONE);
    }

    #[test]
    fn test_envelope_range_at_point_eight() {
        let m = AmModulator::default();
        // 1 + 0.8 and 1 - 0.8
        assert_eq!(m.envelope(SAMPLE_MAX), 8192 + 6553);
        assert_eq!(m.envelope(SAMPLE_MIN), 8192 - 6554);
    }

    #[test]
    fn test_silent_audio_halves_carrier() {
        // The extra headroom bit halves the unmodulated carrier.
        let m = AmModulator::default();
        assert_eq!(m.modulate(0, SAMPLE_MAX), 4095);
        assert_eq!(m.modulate(0, -SAMPLE_MAX), -4096);
    }

    #[test]
    fn test_full_positive_modulation() {
        let mut m = AmModulator::default();
        let out = m.tick((SAMPLE_MAX, SAMPLE_MAX));
        assert_eq!(out, ((14745i64 * 8191) >> 14) as i16);
        assert_eq!(m.last(), out);
    }

    #[test]
    fn test_overdriven_index_saturates_instead_of_wrapping() {
        // Index of 4.0 drives the product far past the 14-bit range.
        let m = AmModulator::new(4 * Q13_ONE);
        assert_eq!(m.modulate(SAMPLE_MAX, SAMPLE_MAX), SAMPLE_MAX);
        assert_eq!(m.modulate(SAMPLE_MAX, SAMPLE_MIN), SAMPLE_MIN);
    }

    #[test]
    fn test_zero_carrier_is_zero() {
        let m = AmModulator::default();
        for audio in [SAMPLE_MIN, -1, 0, 1, SAMPLE_MAX] {
            assert_eq!(m.modulate(audio, 0), 0);
        }
    }
}
