//! Carrier Sine Table
//!
//! One full cycle of a sine wave, 4096 entries of signed 14-bit samples,
//! addressed by the top 12 bits of a 32-bit phase accumulator. The table is
//! computed once on first use and then shared immutably by every oscillator.
//! It is generated with `libm` so the contents are identical on every target.

use crate::fixed::SAMPLE_MAX;
use std::sync::OnceLock;

/// Address width of the table.
pub const TABLE_BITS: u32 = 12;

/// Number of entries (one full cycle).
pub const TABLE_LEN: usize = 1 << TABLE_BITS;

/// Right shift that turns a 32-bit phase into a table address.
pub const PHASE_SHIFT: u32 = 32 - TABLE_BITS;

static SHARED: OnceLock<SineTable> = OnceLock::new();

/// Immutable lookup table of one sine cycle.
pub struct SineTable {
    entries: Box<[i16; TABLE_LEN]>,
}

impl SineTable {
    fn generate() -> Self {
        let mut entries = Box::new([0i16; TABLE_LEN]);
        let peak = SAMPLE_MAX as f64;
        for (k, entry) in entries.iter_mut().enumerate() {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / TABLE_LEN as f64;
            *entry = libm::round(peak * libm::sin(angle)) as i16;
        }
        Self { entries }
    }

    /// The process-wide table.
    pub fn shared() -> &'static SineTable {
        SHARED.get_or_init(Self::generate)
    }

    /// Sample at a raw table address (wraps to the table length).
    #[inline]
    pub fn at(&self, index: usize) -> i16 {
        self.entries[index & (TABLE_LEN - 1)]
    }

    /// Sample for a 32-bit phase value.
    #[inline]
    pub fn lookup(&self, phase: u32) -> i16 {
        self.entries[(phase >> PHASE_SHIFT) as usize]
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.entries[..]
    }
}

impl std::fmt::Debug for SineTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SineTable").field("len", &TABLE_LEN).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::SAMPLE_MIN;

    #[test]
    fn test_quadrature_points() {
        let t = SineTable::shared();
        assert_eq!(t.at(0), 0);
        assert_eq!(t.at(TABLE_LEN / 4), SAMPLE_MAX);
        assert_eq!(t.at(TABLE_LEN / 2), 0);
        assert_eq!(t.at(3 * TABLE_LEN / 4), -SAMPLE_MAX);
    }

    #[test]
    fn test_entries_stay_in_14_bit_range() {
        let t = SineTable::shared();
        assert_eq!(t.as_slice().len(), TABLE_LEN);
        assert!(t
            .as_slice()
            .iter()
            .all(|&s| (SAMPLE_MIN..=SAMPLE_MAX).contains(&s)));
    }

    #[test]
    fn test_odd_symmetry() {
        let t = SineTable::shared();
        for k in 1..TABLE_LEN / 2 {
            assert_eq!(t.at(k), -t.at(TABLE_LEN - k), "asymmetry at {}", k);
        }
    }

    #[test]
    fn test_lookup_uses_top_twelve_bits() {
        let t = SineTable::shared();
        assert_eq!(t.lookup(0x4000_0000), SAMPLE_MAX);
        // Low 20 bits never change the address.
        assert_eq!(t.lookup(0x4000_0000 | 0x000F_FFFF), SAMPLE_MAX);
        assert_eq!(t.lookup(0xFFFF_FFFF), t.at(TABLE_LEN - 1));
    }

    #[test]
    fn test_shared_is_singleton() {
        assert!(std::ptr::eq(SineTable::shared(), SineTable::shared()));
    }
}
