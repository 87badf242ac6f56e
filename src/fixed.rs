//! Fixed-Point Conventions
//!
//! All sample arithmetic in the core uses plain integers with an explicit
//! Q-format. The notation `Qm.n` means `m` integer bits (sign included) and
//! `n` fractional bits.
//!
//! | Quantity            | Format | Storage | 1.0 encodes as |
//! |---------------------|--------|---------|----------------|
//! | audio / carrier     | Q1.13  | `i16`   | 8192 (exclusive) |
//! | AM envelope         | Q2.13  | `i32`   | 8192           |
//! | modulation index    | Q0.13  | `i32`   | 8192           |
//!
//! Every narrowing back into the 14-bit sample domain goes through
//! [`saturate_i14`], which is the only place that clamps. Both the per-channel
//! modulator and the final mixer call it, so no stage can wrap.

/// Smallest representable 14-bit signed sample.
pub const SAMPLE_MIN: i16 = -8192;

/// Largest representable 14-bit signed sample.
pub const SAMPLE_MAX: i16 = 8191;

/// Fractional bits of Q1.13 / Q2.13 values.
pub const FRAC_BITS: u32 = 13;

/// 1.0 in Q*.13.
pub const Q13_ONE: i32 = 1 << FRAC_BITS;

/// Default AM modulation index, 0.8 in Q0.13 (`round(0.8 * 8192)`).
pub const DEFAULT_MOD_INDEX_Q13: i32 = 6554;

/// Narrow a wide intermediate to the signed 14-bit range.
///
/// Values outside `[-8192, 8191]` clamp to the nearest boundary.
#[inline]
pub fn saturate_i14(value: i64) -> i16 {
    value.clamp(SAMPLE_MIN as i64, SAMPLE_MAX as i64) as i16
}

/// Convert a float in [-1, 1) to Q1.13, saturating.
#[inline]
pub fn q13_from_f64(value: f64) -> i16 {
    saturate_i14(libm::round(value * Q13_ONE as f64) as i64)
}
