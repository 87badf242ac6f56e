//! Composite Mixer
//!
//! Sums the gated channel samples, divides by a power of two chosen from the
//! number of enabled channels, and saturates to the 14-bit output range.
//!
//! The shift comes from a [`ScaleTable`]. More enabled channels select a
//! larger shift, trading per-channel amplitude for headroom. The default
//! table keeps `n * 8191 >> shift(n)` inside the sample range for every
//! channel count, so clamping only engages with custom tables or overdriven
//! inputs. The final narrowing always saturates.

use crate::channel::MAX_CHANNELS;
use crate::fixed::{saturate_i14, SAMPLE_MAX, SAMPLE_MIN};
use serde::{Deserialize, Serialize};

/// One channel's contribution to the mix for a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatedSample {
    /// Sample after gating (zero when disabled).
    pub sample: i16,
    /// Effective channel enable.
    pub enabled: bool,
}

/// Map from enabled-channel count to right shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleTable {
    shifts: [u8; MAX_CHANNELS + 1],
}

impl ScaleTable {
    /// Build a table from explicit shifts, indexed by enabled count.
    ///
    /// Returns `None` if the shifts are not monotone non-decreasing or any
    /// shift is 16 or more.
    pub fn from_shifts(shifts: [u8; MAX_CHANNELS + 1]) -> Option<Self> {
        let table = Self { shifts };
        table.is_valid().then_some(table)
    }

    /// Monotone non-decreasing, every shift below 16.
    pub fn is_valid(&self) -> bool {
        let monotone = self.shifts.windows(2).all(|w| w[0] <= w[1]);
        monotone && self.shifts.iter().all(|&s| s < 16)
    }

    /// Shift for `enabled_count` channels (counts above the table clamp to its end).
    #[inline]
    pub fn shift(&self, enabled_count: usize) -> u32 {
        self.shifts[enabled_count.min(MAX_CHANNELS)] as u32
    }

    /// Whether a full-scale sum never needs clamping at any channel count.
    pub fn guarantees_headroom(&self) -> bool {
        (0..=MAX_CHANNELS).all(|n| {
            let shift = self.shift(n);
            let hi = (n as i64 * SAMPLE_MAX as i64) >> shift;
            let lo = (n as i64 * SAMPLE_MIN as i64) >> shift;
            hi <= SAMPLE_MAX as i64 && lo >= SAMPLE_MIN as i64
        })
    }

    pub fn shifts(&self) -> &[u8] {
        &self.shifts
    }
}

impl Default for ScaleTable {
    /// 0–1 channels: 0, 2: 1, 3–4: 2, 5–8: 3, 9+: 4.
    fn default() -> Self {
        Self {
            shifts: [0, 0, 1, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4],
        }
    }
}

/// Saturating power-scaled summing mixer.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    table: ScaleTable,
    last_sum: i32,
    last_shift: u32,
    last_enabled: usize,
    last_out: i16,
}

impl Mixer {
    pub fn new(table: ScaleTable) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    /// Mix one tick's worth of gated samples into the composite output.
    pub fn mix<I>(&mut self, samples: I) -> i16
    where
        I: IntoIterator<Item = GatedSample>,
    {
        let mut sum: i32 = 0;
        let mut enabled = 0usize;
        for gs in samples {
            sum += gs.sample as i32;
            enabled += gs.enabled as usize;
        }
        let shift = self.table.shift(enabled);
        // Arithmetic shift keeps the sign.
        let out = saturate_i14((sum >> shift) as i64);

        self.last_sum = sum;
        self.last_shift = shift;
        self.last_enabled = enabled;
        self.last_out = out;
        out
    }

    pub fn table(&self) -> &ScaleTable {
        &self.table
    }

    /// Raw sum from the most recent tick.
    pub fn last_sum(&self) -> i32 {
        self.last_sum
    }

    /// Shift applied on the most recent tick.
    pub fn last_shift(&self) -> u32 {
        self.last_shift
    }

    pub fn last_enabled(&self) -> usize {
        self.last_enabled
    }

    pub fn last_output(&self) -> i16 {
        self.last_out
    }

    pub fn reset(&mut self) {
        self.last_sum = 0;
        self.last_shift = 0;
        self.last_enabled = 0;
        self.last_out = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_scale(n: usize, sample: i16) -> Vec<GatedSample> {
        (0..n)
            .map(|_| GatedSample {
                sample,
                enabled: true,
            })
            .collect()
    }

    #[test]
    fn test_default_table_steps() {
        let t = ScaleTable::default();
        let expected = [0, 0, 1, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
        for (n, &s) in expected.iter().enumerate() {
            assert_eq!(t.shift(n), s, "count {}", n);
        }
        assert_eq!(t.shift(40), 4);
    }

    #[test]
    fn test_default_table_has_headroom() {
        assert!(ScaleTable::default().guarantees_headroom());
    }

    #[test]
    fn test_from_shifts_rejects_non_monotone() {
        let mut shifts = [0u8; MAX_CHANNELS + 1];
        shifts[3] = 2;
        shifts[4] = 1;
        assert!(ScaleTable::from_shifts(shifts).is_none());
        assert!(ScaleTable::from_shifts([16; MAX_CHANNELS + 1]).is_none());
        assert!(ScaleTable::from_shifts([0; MAX_CHANNELS + 1]).is_some());
    }

    #[test]
    fn test_zero_enabled_is_silent() {
        let mut mixer = Mixer::default();
        let out = mixer.mix((0..MAX_CHANNELS).map(|_| GatedSample::default()));
        assert_eq!(out, 0);
        assert_eq!(mixer.last_enabled(), 0);
    }

    #[test]
    fn test_twelve_full_scale_channels_stay_positive() {
        let mut mixer = Mixer::default();
        let out = mixer.mix(full_scale(12, SAMPLE_MAX));
        assert_eq!(mixer.last_shift(), 4);
        assert_eq!(out, ((12 * 8191) >> 4) as i16);
        assert!(out > 0);
    }

    #[test]
    fn test_flat_table_saturates_at_both_rails() {
        let flat = ScaleTable::from_shifts([0; MAX_CHANNELS + 1]).unwrap();
        assert!(!flat.guarantees_headroom());
        let mut mixer = Mixer::new(flat);
        assert_eq!(mixer.mix(full_scale(12, SAMPLE_MAX)), SAMPLE_MAX);
        assert_eq!(mixer.last_sum(), 12 * 8191);
        assert_eq!(mixer.mix(full_scale(12, SAMPLE_MIN)), SAMPLE_MIN);
    }

    #[test]
    fn test_negative_sum_shift_is_arithmetic() {
        let mut mixer = Mixer::default();
        let out = mixer.mix(full_scale(2, -3));
        // -6 >> 1 == -3
        assert_eq!(out, -3);
    }

    #[test]
    fn test_all_counts_and_amplitudes_never_wrap() {
        let mut mixer = Mixer::default();
        for n in 0..=MAX_CHANNELS {
            for amp in [SAMPLE_MIN, -4096, 0, 4096, SAMPLE_MAX] {
                let out = mixer.mix(full_scale(n, amp));
                if amp > 0 {
                    assert!(out >= 0, "wrapped at n={} amp={}", n, amp);
                } else if amp < 0 {
                    assert!(out <= 0, "wrapped at n={} amp={}", n, amp);
                }
            }
        }
    }
}
