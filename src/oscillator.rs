//! Phase-Accumulator Oscillator
//!
//! A numerically controlled oscillator: a 32-bit phase register advances by a
//! per-tick increment and wraps modulo 2^32. The carrier is a registered
//! lookup of the phase *before* the update, so the output lags the phase by
//! one tick, as a pipelined table read would.

use crate::module::Module;
use crate::sine::SineTable;

/// Numerically controlled sine oscillator.
pub struct Oscillator {
    phase: u32,
    carrier: i16,
    table: &'static SineTable,
}

impl Oscillator {
    pub fn new() -> Self {
        Self {
            phase: 0,
            carrier: 0,
            table: SineTable::shared(),
        }
    }

    /// Current phase accumulator value.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Last registered carrier sample.
    pub fn carrier(&self) -> i16 {
        self.carrier
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Oscillator {
    /// Phase increment for this tick.
    type In = u32;
    /// Carrier sample (Q1.13).
    type Out = i16;

    #[inline]
    fn tick(&mut self, increment: u32) -> i16 {
        self.carrier = self.table.lookup(self.phase);
        self.phase = self.phase.wrapping_add(increment);
        self.carrier
    }

    fn reset(&mut self) {
        self.phase = 0;
        self.carrier = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::SAMPLE_MAX;

    #[test]
    fn test_phase_wraps_modulo_2_32() {
        let mut osc = Oscillator::new();
        osc.tick(u32::MAX);
        assert_eq!(osc.phase(), u32::MAX);
        osc.tick(2);
        assert_eq!(osc.phase(), 1);
    }

    #[test]
    fn test_carrier_lags_phase_by_one_tick() {
        let mut osc = Oscillator::new();
        let quarter = 1u32 << 30;
        // First tick reads phase 0 even though phase is now a quarter turn.
        assert_eq!(osc.tick(quarter), 0);
        assert_eq!(osc.phase(), quarter);
        // Second tick reads the quarter-turn phase.
        assert_eq!(osc.tick(quarter), SAMPLE_MAX);
    }

    #[test]
    fn test_zero_crossings_match_increment() {
        // Increment of 2^32 / 64 completes a cycle every 64 ticks.
        let mut osc = Oscillator::new();
        let inc = 1u32 << 26;
        let mut crossings = 0;
        let mut last = osc.tick(inc);
        for _ in 0..640 {
            let s = osc.tick(inc);
            if last < 0 && s >= 0 {
                crossings += 1;
            }
            last = s;
        }
        assert_eq!(crossings, 10);
    }

    #[test]
    fn test_reset_zeroes_state() {
        let mut osc = Oscillator::new();
        osc.tick(12345);
        osc.tick(12345);
        osc.reset();
        assert_eq!(osc.phase(), 0);
        assert_eq!(osc.carrier(), 0);
    }
}
