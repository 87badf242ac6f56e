//! Core Configuration
//!
//! Build-time parameters of a [`Core`](crate::broadcast::Core): tick rate,
//! watchdog timeout, channel count, latch policy, modulation index, scale
//! table, and the power-on carrier plan. Every field has a default, so a
//! partial JSON document is a valid configuration.
//!
//! ```json
//! { "tick_rate": 125000000, "timeout_seconds": 5, "channels": 12 }
//! ```

use crate::channel::MAX_CHANNELS;
use crate::error::ConfigError;
use crate::fixed::{DEFAULT_MOD_INDEX_Q13, Q13_ONE};
use crate::mixer::ScaleTable;
use crate::registers::phase_increment;
use crate::supervisor::{LatchPolicy, SupervisorConfig};
use serde::{Deserialize, Serialize};

/// Reference tick rate, 125 MHz.
pub const DEFAULT_TICK_RATE: u32 = 125_000_000;

/// Watchdog timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 5;

/// First default carrier, 505 kHz.
pub const DEFAULT_BASE_HZ: u32 = 505_000;

/// Spacing between default carriers, 100 kHz.
pub const DEFAULT_SPACING_HZ: u32 = 100_000;

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    pub timeout_seconds: u32,
    /// Number of carrier channels, `1..=12`.
    pub channels: usize,
    pub latch_policy: LatchPolicy,
    /// AM modulation index in Q0.13, `0..=8192`.
    pub modulation_index_q13: i32,
    pub scale_table: ScaleTable,
    /// Power-on frequency of channel 1.
    pub default_base_hz: u32,
    /// Power-on spacing between adjacent channels.
    pub default_spacing_hz: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            channels: MAX_CHANNELS,
            latch_policy: LatchPolicy::default(),
            modulation_index_q13: DEFAULT_MOD_INDEX_Q13,
            scale_table: ScaleTable::default(),
            default_base_hz: DEFAULT_BASE_HZ,
            default_spacing_hz: DEFAULT_SPACING_HZ,
        }
    }
}

impl CoreConfig {
    /// Defaults with a different tick rate and timeout.
    pub fn with_timing(tick_rate: u32, timeout_seconds: u32) -> Self {
        Self {
            tick_rate,
            timeout_seconds,
            ..Self::default()
        }
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_latch_policy(mut self, policy: LatchPolicy) -> Self {
        self.latch_policy = policy;
        self
    }

    pub fn with_scale_table(mut self, table: ScaleTable) -> Self {
        self.scale_table = table;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::TickRate);
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Timeout);
        }
        if !(1..=MAX_CHANNELS).contains(&self.channels) {
            return Err(ConfigError::ChannelCount(self.channels));
        }
        if !(0..=Q13_ONE).contains(&self.modulation_index_q13) {
            return Err(ConfigError::ModulationIndex(self.modulation_index_q13));
        }
        // Deserialized tables bypass the constructor check.
        if !self.scale_table.is_valid() {
            return Err(ConfigError::ScaleTable);
        }
        Ok(())
    }

    pub fn supervisor(&self) -> SupervisorConfig {
        SupervisorConfig::new(self.tick_rate, self.timeout_seconds)
    }

    /// Power-on frequency of channel `index` (0-based), in Hz.
    pub fn default_frequency_hz(&self, index: usize) -> u64 {
        self.default_base_hz as u64 + index as u64 * self.default_spacing_hz as u64
    }

    /// Power-on frequencies for every register slot, in Hz.
    pub fn default_frequencies(&self) -> [u64; MAX_CHANNELS] {
        std::array::from_fn(|i| self.default_frequency_hz(i))
    }

    /// Power-on phase increments for every register slot.
    pub fn default_increments(&self) -> [u32; MAX_CHANNELS] {
        std::array::from_fn(|i| {
            phase_increment(self.default_frequency_hz(i) as f64, self.tick_rate)
        })
    }

    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_carrier_plan() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.default_frequency_hz(0), 505_000);
        assert_eq!(cfg.default_frequency_hz(11), 1_605_000);
        assert_eq!(cfg.default_frequencies()[5], 1_005_000);
        let inc = cfg.default_increments();
        assert_eq!(inc[0], 17_351_668);
        assert_eq!(inc[11], 55_147_380);
        assert!(inc.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            CoreConfig::with_timing(0, 5).validate(),
            Err(ConfigError::TickRate)
        ));
        assert!(matches!(
            CoreConfig::with_timing(10, 0).validate(),
            Err(ConfigError::Timeout)
        ));
        assert!(matches!(
            CoreConfig::default().with_channels(13).validate(),
            Err(ConfigError::ChannelCount(13))
        ));
        let cfg = CoreConfig {
            modulation_index_q13: 9000,
            ..CoreConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ModulationIndex(9000))));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = CoreConfig::from_json(r#"{ "tick_rate": 10, "timeout_seconds": 2 }"#).unwrap();
        assert_eq!(cfg.tick_rate, 10);
        assert_eq!(cfg.timeout_seconds, 2);
        assert_eq!(cfg.channels, 12);
        assert_eq!(cfg.latch_policy, LatchPolicy::OperatorClear);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_rejects_invalid() {
        assert!(matches!(
            CoreConfig::from_json(r#"{ "channels": 0 }"#),
            Err(ConfigError::ChannelCount(0))
        ));
        assert!(matches!(
            CoreConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
        let bad_table = r#"{ "scale_table": { "shifts": [4,0,0,0,0,0,0,0,0,0,0,0,0] } }"#;
        assert!(matches!(
            CoreConfig::from_json(bad_table),
            Err(ConfigError::ScaleTable)
        ));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_policy_names() {
        let cfg = CoreConfig::default().with_latch_policy(LatchPolicy::HeartbeatClears);
        let json = cfg.to_json().unwrap();
        assert!(json.contains("\"heartbeat_clears\""));
        assert_eq!(CoreConfig::from_json(&json).unwrap(), cfg);
    }
}
