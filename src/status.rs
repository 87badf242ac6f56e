//! Status Telemetry
//!
//! The STATUS register and the operator-facing report built from it. Status
//! is the only place a liveness fault becomes visible: output simply goes to
//! zero, and these fields say why.
//!
//! STATUS layout:
//!
//! ```text
//!  bits 11:0   channel enable mirror
//!  bits 19:12  watchdog time remaining, seconds
//!  bit 20      watchdog_enable
//!  bit 21      watchdog_warning
//!  bit 22      watchdog_triggered
//!  bit 23      effective master enable
//! ```

use crate::registers::{frequency_hz, SourceSelect};
use crate::supervisor::SupervisorState;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_ENABLE_MASK: u32 = 0xFFF;
pub const STATUS_REMAINING_SHIFT: u32 = 12;
pub const STATUS_REMAINING_MASK: u32 = 0xFF << STATUS_REMAINING_SHIFT;
pub const STATUS_WD_ENABLE: u32 = 1 << 20;
pub const STATUS_WD_WARNING: u32 = 1 << 21;
pub const STATUS_WD_TRIGGERED: u32 = 1 << 22;
pub const STATUS_MASTER: u32 = 1 << 23;

/// Unpacked STATUS register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusWord {
    pub enable_mask: u16,
    pub time_remaining: u8,
    pub watchdog_enable: bool,
    pub warning: bool,
    pub triggered: bool,
    pub master: bool,
}

impl StatusWord {
    pub fn pack(&self) -> u32 {
        let mut bits = self.enable_mask as u32 & STATUS_ENABLE_MASK;
        bits |= (self.time_remaining as u32) << STATUS_REMAINING_SHIFT;
        if self.watchdog_enable {
            bits |= STATUS_WD_ENABLE;
        }
        if self.warning {
            bits |= STATUS_WD_WARNING;
        }
        if self.triggered {
            bits |= STATUS_WD_TRIGGERED;
        }
        if self.master {
            bits |= STATUS_MASTER;
        }
        bits
    }

    pub fn unpack(bits: u32) -> Self {
        Self {
            enable_mask: (bits & STATUS_ENABLE_MASK) as u16,
            time_remaining: ((bits & STATUS_REMAINING_MASK) >> STATUS_REMAINING_SHIFT) as u8,
            watchdog_enable: bits & STATUS_WD_ENABLE != 0,
            warning: bits & STATUS_WD_WARNING != 0,
            triggered: bits & STATUS_WD_TRIGGERED != 0,
            master: bits & STATUS_MASTER != 0,
        }
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        WatchdogState::classify(self.watchdog_enable, self.warning, self.triggered)
    }
}

/// Coarse watchdog condition for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "snake_case")]
pub enum WatchdogState {
    Disabled,
    #[default]
    Ok,
    Warning,
    Triggered,
}

impl WatchdogState {
    pub fn classify(enabled: bool, warning: bool, triggered: bool) -> Self {
        if !enabled {
            WatchdogState::Disabled
        } else if triggered {
            WatchdogState::Triggered
        } else if warning {
            WatchdogState::Warning
        } else {
            WatchdogState::Ok
        }
    }

    pub fn from_supervisor(enabled: bool, state: &SupervisorState) -> Self {
        Self::classify(enabled, state.warning, state.triggered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchdogState::Disabled => "disabled",
            WatchdogState::Ok => "ok",
            WatchdogState::Warning => "warning",
            WatchdogState::Triggered => "triggered",
        }
    }
}

/// One channel's configuration as the operator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
pub struct ChannelStatus {
    /// 1-based channel number.
    pub channel: usize,
    pub phase_increment: u32,
    pub frequency_hz: f64,
    /// Requested enable, before master and fault gating.
    pub enabled: bool,
    /// Channel actually contributing to the output.
    pub on_air: bool,
}

/// Full status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
pub struct StatusReport {
    pub tick: u64,
    /// Effective master enable.
    pub broadcasting: bool,
    pub master_requested: bool,
    pub source: SourceSelect,
    pub message: u8,
    pub watchdog: WatchdogState,
    pub time_remaining: u8,
    pub elapsed_ticks: u64,
    pub output: i16,
    pub channels: Vec<ChannelStatus>,
}

impl StatusReport {
    /// Build per-channel entries from register values.
    pub fn channel_entries(
        increments: &[u32],
        enable_mask: u16,
        broadcasting: bool,
        tick_rate: u32,
    ) -> Vec<ChannelStatus> {
        increments
            .iter()
            .enumerate()
            .map(|(i, &inc)| {
                let enabled = enable_mask & (1 << i) != 0;
                ChannelStatus {
                    channel: i + 1,
                    phase_increment: inc,
                    frequency_hz: frequency_hz(inc, tick_rate),
                    enabled,
                    on_air: enabled && broadcasting,
                }
            })
            .collect()
    }

    pub fn on_air_count(&self) -> usize {
        self.channels.iter().filter(|c| c.on_air).count()
    }
}

impl fmt::Display for StatusReport {
    /// `key=value` pairs separated by `;`, one channel per `chN` key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            SourceSelect::Buffer => "buffer",
            SourceSelect::Live => "live",
        };
        write!(
            f,
            "broadcast={};source={};message={};watchdog={};remaining={}",
            self.broadcasting as u8,
            source,
            self.message,
            self.watchdog.as_str(),
            self.time_remaining
        )?;
        for ch in &self.channels {
            write!(
                f,
                ";ch{}={:.0}Hz:{}",
                ch.channel,
                ch.frequency_hz,
                if ch.enabled { "on" } else { "off" }
            )?;
        }
        Ok(())
    }
}
