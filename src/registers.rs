//! Register File
//!
//! The control-plane surface: a word-addressed bank of 32-bit registers that
//! owns the channel configuration. Every accepted write is a heartbeat for the
//! supervisor. Rejected writes change nothing, heartbeat included.
//!
//! | Offset      | Register              | Access |
//! |-------------|-----------------------|--------|
//! | 0x00        | CTRL                  | R/W    |
//! | 0x04–0x30   | CH1_FREQ .. CH12_FREQ | R/W    |
//! | 0x34        | CH_ENABLE             | R/W    |
//! | 0x38        | STATUS                | R      |
//!
//! CTRL layout:
//!
//! ```text
//!  bit 0      master_enable_requested
//!  bit 3      source_select (0 = buffer, 1 = live)
//!  bit 4      watchdog_enable
//!  bit 5      watchdog_force_reset (pulse, reads back 0)
//!  bits 11:8  message_select
//! ```
//!
//! `message_select` sits in bits 11:8 so it never overlaps the watchdog
//! control bits. Any other bit is reserved and a write that sets one is
//! rejected.

use crate::channel::MAX_CHANNELS;
use crate::error::RegisterError;
use crate::supervisor::SupervisorInput;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const REG_CTRL: u32 = 0x00;
pub const REG_CH1_FREQ: u32 = 0x04;
pub const REG_CH_ENABLE: u32 = 0x34;
pub const REG_STATUS: u32 = 0x38;

/// Last mapped core address.
pub const REG_LAST: u32 = REG_STATUS;

pub const CTRL_MASTER_EN: u32 = 1 << 0;
pub const CTRL_SOURCE_LIVE: u32 = 1 << 3;
pub const CTRL_WATCHDOG_EN: u32 = 1 << 4;
pub const CTRL_WATCHDOG_RESET: u32 = 1 << 5;
pub const CTRL_MSG_SHIFT: u32 = 8;
pub const CTRL_MSG_MASK: u32 = 0xF << CTRL_MSG_SHIFT;

/// Bits a CTRL write may set.
pub const CTRL_WRITABLE: u32 =
    CTRL_MASTER_EN | CTRL_SOURCE_LIVE | CTRL_WATCHDOG_EN | CTRL_WATCHDOG_RESET | CTRL_MSG_MASK;

/// Byte offset of a channel's frequency register (0-based channel index).
pub const fn ch_freq_addr(index: usize) -> u32 {
    REG_CH1_FREQ + 4 * index as u32
}

/// `round(freq_hz * 2^32 / tick_rate)`, wrapped to 32 bits.
pub fn phase_increment(freq_hz: f64, tick_rate: u32) -> u32 {
    let inc = libm::round(freq_hz * 4_294_967_296.0 / tick_rate as f64);
    (inc as i64 as u64 & 0xFFFF_FFFF) as u32
}

/// Frequency a phase increment produces at `tick_rate`.
pub fn frequency_hz(increment: u32, tick_rate: u32) -> f64 {
    increment as f64 * tick_rate as f64 / 4_294_967_296.0
}

/// Which collaborator feeds the modulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "snake_case")]
pub enum SourceSelect {
    /// Stored-message playback.
    #[default]
    Buffer,
    /// Live capture.
    Live,
}

/// Decoded CTRL register (without the reset pulse, which is not stored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub master_enable: bool,
    pub source: SourceSelect,
    pub watchdog_enable: bool,
    pub message: u8,
}

impl Control {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            master_enable: bits & CTRL_MASTER_EN != 0,
            source: if bits & CTRL_SOURCE_LIVE != 0 {
                SourceSelect::Live
            } else {
                SourceSelect::Buffer
            },
            watchdog_enable: bits & CTRL_WATCHDOG_EN != 0,
            message: ((bits & CTRL_MSG_MASK) >> CTRL_MSG_SHIFT) as u8,
        }
    }

    pub fn to_bits(&self) -> u32 {
        let mut bits = 0;
        if self.master_enable {
            bits |= CTRL_MASTER_EN;
        }
        if self.source == SourceSelect::Live {
            bits |= CTRL_SOURCE_LIVE;
        }
        if self.watchdog_enable {
            bits |= CTRL_WATCHDOG_EN;
        }
        bits | ((self.message as u32 & 0xF) << CTRL_MSG_SHIFT)
    }
}

impl Default for Control {
    /// Master off, buffer source, watchdog on, message 0.
    fn default() -> Self {
        Self {
            master_enable: false,
            source: SourceSelect::Buffer,
            watchdog_enable: true,
            message: 0,
        }
    }
}

/// Effective enables for one tick.
///
/// `master` already has the fault folded in; `channel(i)` folds in `master`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gating {
    master: bool,
    mask: u16,
}

impl Gating {
    pub fn new(master: bool, mask: u16) -> Self {
        Self { master, mask }
    }

    /// `master = requested && !triggered`
    pub fn derive(master_requested: bool, mask: u16, triggered: bool) -> Self {
        Self::new(master_requested && !triggered, mask)
    }

    pub fn master(&self) -> bool {
        self.master
    }

    #[inline]
    pub fn channel(&self, index: usize) -> bool {
        self.master && index < 16 && self.mask & (1 << index) != 0
    }

    /// Number of effectively enabled channels among the first `channels`.
    pub fn enabled_count(&self, channels: usize) -> usize {
        (0..channels.min(16)).filter(|&i| self.channel(i)).count()
    }
}

/// Single-tick strobes produced by register writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strobes {
    pub heartbeat: bool,
    pub force_reset: bool,
}

/// Core control and status registers.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    channels: usize,
    control: Control,
    increments: [u32; MAX_CHANNELS],
    enable_mask: u16,
    status: u32,
    defaults: [u32; MAX_CHANNELS],
    strobes: Strobes,
}

impl RegisterFile {
    /// Create a register file for `channels` channels with the given
    /// power-on phase increments.
    pub fn new(channels: usize, defaults: [u32; MAX_CHANNELS]) -> Self {
        Self {
            channels: channels.clamp(1, MAX_CHANNELS),
            control: Control::default(),
            increments: defaults,
            enable_mask: 0,
            status: 0,
            defaults,
            strobes: Strobes::default(),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn increments(&self) -> &[u32] {
        &self.increments[..self.channels]
    }

    pub fn increment(&self, index: usize) -> Option<u32> {
        self.increments().get(index).copied()
    }

    pub fn enable_mask(&self) -> u16 {
        self.enable_mask
    }

    /// Mask of bits that address a configured channel.
    pub fn channel_mask(&self) -> u16 {
        ((1u32 << self.channels) - 1) as u16
    }

    fn check_addr(&self, addr: u32) -> Result<(), RegisterError> {
        if addr % 4 != 0 {
            return Err(RegisterError::Misaligned { addr });
        }
        if addr > REG_LAST {
            return Err(RegisterError::Unmapped { addr });
        }
        Ok(())
    }

    /// Validate and commit a write. On success the write is a heartbeat.
    pub fn write(&mut self, addr: u32, value: u32) -> Result<(), RegisterError> {
        self.check_addr(addr)?;
        match addr {
            REG_CTRL => {
                let reserved = value & !CTRL_WRITABLE;
                if reserved != 0 {
                    return Err(RegisterError::ReservedBits {
                        addr,
                        value,
                        mask: reserved,
                    });
                }
                self.control = Control::from_bits(value);
                if value & CTRL_WATCHDOG_RESET != 0 {
                    self.strobes.force_reset = true;
                }
            }
            REG_CH_ENABLE => {
                let reserved = value & !(self.channel_mask() as u32);
                if reserved != 0 {
                    return Err(RegisterError::ReservedBits {
                        addr,
                        value,
                        mask: reserved,
                    });
                }
                self.enable_mask = value as u16;
            }
            REG_STATUS => return Err(RegisterError::ReadOnly { addr }),
            _ => {
                let index = ((addr - REG_CH1_FREQ) / 4) as usize;
                if index >= self.channels {
                    return Err(RegisterError::ChannelOutOfRange {
                        channel: index + 1,
                        channels: self.channels,
                    });
                }
                self.increments[index] = value;
            }
        }
        trace!(addr, value, "register write committed");
        self.strobes.heartbeat = true;
        Ok(())
    }

    /// Read a register. Reading has no side effects.
    pub fn read(&self, addr: u32) -> Result<u32, RegisterError> {
        self.check_addr(addr)?;
        match addr {
            REG_CTRL => Ok(self.control.to_bits()),
            REG_CH_ENABLE => Ok(self.enable_mask as u32),
            REG_STATUS => Ok(self.status),
            _ => {
                let index = ((addr - REG_CH1_FREQ) / 4) as usize;
                self.increment(index)
                    .ok_or(RegisterError::ChannelOutOfRange {
                        channel: index + 1,
                        channels: self.channels,
                    })
            }
        }
    }

    /// Record a heartbeat from a write that landed outside the core map.
    pub fn note_external_write(&mut self) {
        self.strobes.heartbeat = true;
    }

    /// Consume this tick's strobes and build the supervisor input.
    pub fn take_supervisor_input(&mut self) -> SupervisorInput {
        let strobes = std::mem::take(&mut self.strobes);
        SupervisorInput {
            heartbeat: strobes.heartbeat,
            enabled: self.control.watchdog_enable,
            force_reset: strobes.force_reset,
        }
    }

    /// Pending strobes, without consuming them.
    pub fn strobes(&self) -> Strobes {
        self.strobes
    }

    /// Effective enables given the supervisor's fault state.
    pub fn gating(&self, triggered: bool) -> Gating {
        Gating::derive(self.control.master_enable, self.enable_mask, triggered)
    }

    /// Drive the read-only STATUS register.
    pub fn latch_status(&mut self, status: u32) {
        self.status = status;
    }

    /// Return every register to its power-on value.
    pub fn reset(&mut self) {
        self.control = Control::default();
        self.increments = self.defaults;
        self.enable_mask = 0;
        self.status = 0;
        self.strobes = Strobes::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn regs(channels: usize) -> RegisterFile {
        RegisterFile::new(channels, [0x1000; MAX_CHANNELS])
    }

    #[test]
    fn test_frequency_register_addresses() {
        assert_eq!(ch_freq_addr(0), 0x04);
        assert_eq!(ch_freq_addr(11), 0x30);
        assert_eq!(ch_freq_addr(12), REG_CH_ENABLE);
    }

    #[test]
    fn test_phase_increment_round_trip() {
        let inc = phase_increment(505_000.0, 125_000_000);
        assert_eq!(inc, 17_351_668);
        assert_relative_eq!(frequency_hz(inc, 125_000_000), 505_000.0, epsilon = 0.02);
        assert_eq!(phase_increment(0.0, 125_000_000), 0);
    }

    #[test]
    fn test_ctrl_fields_do_not_overlap() {
        let fields = [
            CTRL_MASTER_EN,
            CTRL_SOURCE_LIVE,
            CTRL_WATCHDOG_EN,
            CTRL_WATCHDOG_RESET,
            CTRL_MSG_MASK,
        ];
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }

    #[test]
    fn test_message_select_leaves_watchdog_alone() {
        let mut r = regs(12);
        let ctrl = Control {
            master_enable: true,
            source: SourceSelect::Buffer,
            watchdog_enable: true,
            message: 0xF,
        };
        r.write(REG_CTRL, ctrl.to_bits()).unwrap();
        let c = r.control();
        assert_eq!(c.message, 0xF);
        assert!(c.watchdog_enable);
        assert!(!r.strobes().force_reset);
    }

    #[test]
    fn test_force_reset_is_a_pulse() {
        let mut r = regs(12);
        r.write(REG_CTRL, CTRL_WATCHDOG_EN | CTRL_WATCHDOG_RESET).unwrap();
        assert_eq!(r.read(REG_CTRL).unwrap(), CTRL_WATCHDOG_EN);
        let input = r.take_supervisor_input();
        assert!(input.force_reset);
        assert!(input.heartbeat);
        let input = r.take_supervisor_input();
        assert!(!input.force_reset);
        assert!(!input.heartbeat);
        assert!(input.enabled);
    }

    #[test]
    fn test_reserved_ctrl_bits_rejected_without_side_effects() {
        let mut r = regs(12);
        let before = r.read(REG_CTRL).unwrap();
        let err = r.write(REG_CTRL, CTRL_MASTER_EN | (1 << 1)).unwrap_err();
        assert_eq!(
            err,
            RegisterError::ReservedBits {
                addr: REG_CTRL,
                value: CTRL_MASTER_EN | 2,
                mask: 2
            }
        );
        assert_eq!(r.read(REG_CTRL).unwrap(), before);
        assert_eq!(r.strobes(), Strobes::default());
    }

    #[test]
    fn test_out_of_range_channel_rejected() {
        let mut r = regs(4);
        assert_eq!(
            r.write(ch_freq_addr(4), 1),
            Err(RegisterError::ChannelOutOfRange {
                channel: 5,
                channels: 4
            })
        );
        assert!(r.write(REG_CH_ENABLE, 0b1_0000).is_err());
        assert!(r.write(REG_CH_ENABLE, 0b1111).is_ok());
        assert!(r.read(ch_freq_addr(4)).is_err());
    }

    #[test]
    fn test_bad_addresses() {
        let mut r = regs(12);
        assert_eq!(r.write(0x02, 0), Err(RegisterError::Misaligned { addr: 2 }));
        assert_eq!(r.write(0x3C, 0), Err(RegisterError::Unmapped { addr: 0x3C }));
        assert_eq!(
            r.write(REG_STATUS, 0),
            Err(RegisterError::ReadOnly { addr: REG_STATUS })
        );
        assert!(!r.strobes().heartbeat);
    }

    #[test]
    fn test_every_accepted_write_is_a_heartbeat() {
        let mut r = regs(12);
        for addr in [REG_CTRL, ch_freq_addr(3), REG_CH_ENABLE] {
            r.take_supervisor_input();
            r.write(addr, 0).unwrap();
            assert!(r.take_supervisor_input().heartbeat, "addr 0x{:02X}", addr);
        }
    }

    #[test]
    fn test_gating_folds_in_fault_and_master() {
        let g = Gating::derive(true, 0b101, false);
        assert!(g.channel(0) && !g.channel(1) && g.channel(2));
        assert_eq!(g.enabled_count(12), 2);
        let g = Gating::derive(true, 0xFFF, true);
        assert!(!g.master());
        assert_eq!(g.enabled_count(12), 0);
        let g = Gating::derive(false, 0xFFF, false);
        assert_eq!(g.enabled_count(12), 0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut r = regs(12);
        r.write(REG_CTRL, CTRL_MASTER_EN).unwrap();
        r.write(ch_freq_addr(0), 42).unwrap();
        r.write(REG_CH_ENABLE, 0xFFF).unwrap();
        r.reset();
        assert_eq!(r.control(), Control::default());
        assert_eq!(r.increment(0), Some(0x1000));
        assert_eq!(r.enable_mask(), 0);
        assert_eq!(r.strobes(), Strobes::default());
    }
}
