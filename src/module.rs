//! Typed Per-Tick Processors
//!
//! Every stage of the composition path is a [`Module`]: a stateful processor
//! that consumes one typed input and produces one typed output per tick.
//!
//! ```text
//! M : In -> Out
//! ```
//!
//! The associated types make signal flow checkable at compile time. An
//! oscillator takes a phase increment and yields a carrier sample, a modulator
//! takes `(audio, carrier)` and yields a modulated sample, and so on. Because
//! stages are monomorphized, a channel built from them compiles down to the
//! same code as a hand-written per-tick loop.

/// A signal processing stage with typed input and output.
///
/// # Implementing Module
///
/// ```rust,ignore
/// struct Negate;
///
/// impl Module for Negate {
///     type In = i16;
///     type Out = i16;
///
///     fn tick(&mut self, input: i16) -> i16 {
///         input.saturating_neg()
///     }
///
///     fn reset(&mut self) {}
/// }
/// ```
///
/// All modules must be `Send` so a host can drive the core from a dedicated
/// thread.
pub trait Module: Send {
    /// Input signal type
    type In;
    /// Output signal type
    type Out;

    /// Advance internal state by exactly one tick.
    fn tick(&mut self, input: Self::In) -> Self::Out;

    /// Return to the power-on state.
    fn reset(&mut self);
}

