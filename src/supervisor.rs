//! Liveness Supervisor
//!
//! A tick-driven watchdog. It counts ticks since the last heartbeat, raises a
//! non-latching warning at 80% of the timeout and a latching fault at 100%.
//! The fault is plain state that every consumer re-reads on every tick; it is
//! never returned as an error.
//!
//! The transition function is [`SupervisorState::advance`], a pure function
//! of the previous state, the configuration, the latch policy, and the tick's
//! inputs. [`Supervisor`] wraps it with ownership of the state and logging of
//! edges.
//!
//! Invariants, for every reachable state:
//!
//! - `elapsed_ticks <= timeout_ticks`
//! - `elapsed_ticks < timeout_ticks` implies `!triggered`
//! - `triggered` implies `warning`

use crate::module::Module;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Upper bound of the time-remaining telemetry field.
pub const TIME_REMAINING_MAX: u64 = 255;

/// Which inputs may clear a latched fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchPolicy {
    /// Only a force-reset pulse or disabling the watchdog clears the fault.
    /// Heartbeats that arrive while latched are ignored.
    #[default]
    OperatorClear,
    /// Any heartbeat clears the fault, as a plain register write would.
    HeartbeatClears,
}

/// Timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    pub timeout_seconds: u32,
}

impl SupervisorConfig {
    pub fn new(tick_rate: u32, timeout_seconds: u32) -> Self {
        Self {
            tick_rate,
            timeout_seconds,
        }
    }

    /// `tick_rate * timeout_seconds`
    pub fn timeout_ticks(&self) -> u64 {
        self.tick_rate as u64 * self.timeout_seconds as u64
    }

    /// `floor(timeout_ticks * 8 / 10)`
    pub fn warning_ticks(&self) -> u64 {
        self.timeout_ticks() * 8 / 10
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new(125_000_000, 5)
    }
}

/// Inputs sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorInput {
    /// A configuration write committed on this tick.
    pub heartbeat: bool,
    /// Watchdog function enabled.
    pub enabled: bool,
    /// Manual clear pulse.
    pub force_reset: bool,
}

impl SupervisorInput {
    /// Enabled, no heartbeat, no reset.
    pub fn idle() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn heartbeat() -> Self {
        Self {
            heartbeat: true,
            enabled: true,
            force_reset: false,
        }
    }

    pub fn force_reset() -> Self {
        Self {
            heartbeat: false,
            enabled: true,
            force_reset: true,
        }
    }
}

/// Why a latched fault was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "snake_case")]
pub enum ClearCause {
    Heartbeat,
    ForceReset,
    Disabled,
}

/// Edge observed across one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Transition {
    WarningRaised,
    FaultLatched,
    FaultCleared { cause: ClearCause },
}

/// Watchdog state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorState {
    pub elapsed_ticks: u64,
    pub warning: bool,
    pub triggered: bool,
}

impl SupervisorState {
    /// Compute the next state.
    pub fn advance(
        self,
        config: &SupervisorConfig,
        policy: LatchPolicy,
        input: SupervisorInput,
    ) -> SupervisorState {
        let timeout = config.timeout_ticks();

        if !input.enabled || input.force_reset {
            return SupervisorState::default();
        }

        if input.heartbeat {
            let latched = self.triggered && policy == LatchPolicy::OperatorClear;
            if !latched {
                return SupervisorState::default();
            }
        }

        if self.elapsed_ticks >= timeout {
            SupervisorState {
                elapsed_ticks: timeout,
                warning: true,
                triggered: true,
            }
        } else {
            let elapsed_ticks = self.elapsed_ticks + 1;
            SupervisorState {
                elapsed_ticks,
                warning: elapsed_ticks >= config.warning_ticks(),
                triggered: false,
            }
        }
    }

    /// Whole seconds left before the fault latches, clamped to `0..=255`.
    pub fn time_remaining_seconds(&self, config: &SupervisorConfig) -> u8 {
        if config.tick_rate == 0 {
            return 0;
        }
        let left = config.timeout_ticks().saturating_sub(self.elapsed_ticks);
        (left / config.tick_rate as u64).min(TIME_REMAINING_MAX) as u8
    }

    /// Edge between `self` and `next`, if any. A latch outranks a warning.
    pub fn transition_to(
        &self,
        next: &SupervisorState,
        input: SupervisorInput,
    ) -> Option<Transition> {
        if !self.triggered && next.triggered {
            Some(Transition::FaultLatched)
        } else if self.triggered && !next.triggered {
            let cause = if !input.enabled {
                ClearCause::Disabled
            } else if input.force_reset {
                ClearCause::ForceReset
            } else {
                ClearCause::Heartbeat
            };
            Some(Transition::FaultCleared { cause })
        } else if !self.warning && next.warning {
            Some(Transition::WarningRaised)
        } else {
            None
        }
    }
}

/// Owned watchdog.
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: SupervisorConfig,
    policy: LatchPolicy,
    state: SupervisorState,
    last_transition: Option<Transition>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, policy: LatchPolicy) -> Self {
        Self {
            config,
            policy,
            state: SupervisorState::default(),
            last_transition: None,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn policy(&self) -> LatchPolicy {
        self.policy
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn triggered(&self) -> bool {
        self.state.triggered
    }

    pub fn warning(&self) -> bool {
        self.state.warning
    }

    pub fn time_remaining_seconds(&self) -> u8 {
        self.state.time_remaining_seconds(&self.config)
    }

    /// Edge produced by the most recent tick.
    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }
}

impl Module for Supervisor {
    type In = SupervisorInput;
    type Out = SupervisorState;

    fn tick(&mut self, input: SupervisorInput) -> SupervisorState {
        let next = self.state.advance(&self.config, self.policy, input);
        self.last_transition = self.state.transition_to(&next, input);
        match self.last_transition {
            Some(Transition::WarningRaised) => warn!(
                elapsed_ticks = next.elapsed_ticks,
                timeout_ticks = self.config.timeout_ticks(),
                "watchdog warning: heartbeat overdue"
            ),
            Some(Transition::FaultLatched) => warn!(
                timeout_ticks = self.config.timeout_ticks(),
                "watchdog fault latched, output forced off"
            ),
            Some(Transition::FaultCleared { cause }) => {
                info!(?cause, "watchdog fault cleared")
            }
            None => {}
        }
        self.state = next;
        next
    }

    fn reset(&mut self) {
        self.state = SupervisorState::default();
        self.last_transition = None;
    }
}
