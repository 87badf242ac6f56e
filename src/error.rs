//! Error types
//!
//! Only configuration and register-access problems are errors. A liveness
//! fault is supervisor state, not an error.

use thiserror::Error;

/// A rejected register transaction. Rejection has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("address 0x{addr:04X} is not mapped")]
    Unmapped { addr: u32 },
    #[error("address 0x{addr:04X} is not word aligned")]
    Misaligned { addr: u32 },
    #[error("register at 0x{addr:04X} is read-only")]
    ReadOnly { addr: u32 },
    #[error("channel {channel} out of range (core has {channels} channels)")]
    ChannelOutOfRange { channel: usize, channels: usize },
    #[error("write of 0x{value:08X} to 0x{addr:04X} sets reserved bits 0x{mask:08X}")]
    ReservedBits { addr: u32, value: u32, mask: u32 },
    #[error("a transaction is already outstanding")]
    Busy,
}

/// An invalid [`CoreConfig`](crate::config::CoreConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tick rate must be non-zero")]
    TickRate,
    #[error("watchdog timeout must be at least one second")]
    Timeout,
    #[error("channel count {0} outside 1..=12")]
    ChannelCount(usize),
    #[error("modulation index {0} outside 0..=8192 (Q0.13)")]
    ModulationIndex(i32),
    #[error("scale table must be monotone with shifts below 16")]
    ScaleTable,
    #[cfg(feature = "json")]
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
