//! Audit Log
//!
//! Safety-relevant events collected tick by tick and drained by the host.
//! Steady-state ticks produce nothing; only edges (warning raised, fault
//! latched or cleared, watchdog toggled, writes rejected, resets) are
//! recorded, so the log stays small even at full tick rate.

use crate::supervisor::{ClearCause, Transition};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EventKind {
    WarningRaised,
    FaultLatched,
    FaultCleared { cause: ClearCause },
    WatchdogEnabled,
    WatchdogDisabled,
    /// A register write was refused; nothing changed.
    WriteRejected { addr: u32, value: u32, reason: String },
    Reset,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::WarningRaised => "warning_raised",
            EventKind::FaultLatched => "fault_latched",
            EventKind::FaultCleared { .. } => "fault_cleared",
            EventKind::WatchdogEnabled => "watchdog_enabled",
            EventKind::WatchdogDisabled => "watchdog_disabled",
            EventKind::WriteRejected { .. } => "write_rejected",
            EventKind::Reset => "reset",
        }
    }
}

impl From<Transition> for EventKind {
    fn from(t: Transition) -> Self {
        match t {
            Transition::WarningRaised => EventKind::WarningRaised,
            Transition::FaultLatched => EventKind::FaultLatched,
            Transition::FaultCleared { cause } => EventKind::FaultCleared { cause },
        }
    }
}

/// An event stamped with the tick it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
pub struct CoreEvent {
    pub tick: u64,
    pub kind: EventKind,
}

/// Configuration for the audit log
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Maximum pending events before oldest are dropped (default: 256)
    pub max_pending: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { max_pending: 256 }
    }
}

/// Bounded queue of [`CoreEvent`]s.
#[derive(Debug)]
pub struct AuditLog {
    pending: Vec<CoreEvent>,
    dropped: u64,
    config: AuditConfig,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_config(AuditConfig::default())
    }

    pub fn with_config(config: AuditConfig) -> Self {
        Self {
            pending: Vec::new(),
            dropped: 0,
            config,
        }
    }

    /// Record an event, dropping the oldest past the limit.
    pub fn push(&mut self, tick: u64, kind: EventKind) {
        self.pending.push(CoreEvent { tick, kind });
        let excess = self.pending.len().saturating_sub(self.config.max_pending);
        if excess > 0 {
            self.pending.drain(..excess);
            self.dropped += excess as u64;
        }
    }

    /// Take every pending event.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[CoreEvent] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Events lost to the bound since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
