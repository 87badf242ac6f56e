//! # Vigil: Fail-Safe Gated Broadcast Core
//!
//! `vigil` is a tick-driven core that composes up to twelve AM carriers into
//! one output sample per tick, and keeps that output on the air only while an
//! external controller keeps proving it is alive.
//!
//! ## Architecture
//!
//! The library is organized in three layers:
//!
//! - **Layer 1: Typed Stages** - [`Module`](module::Module) processors for the
//!   oscillator, AM modulator, and channel, composed into the
//!   [`CompositionEngine`](engine::CompositionEngine) with its saturating mixer
//! - **Layer 2: Control Plane** - the [`RegisterFile`](registers::RegisterFile)
//!   behind a one-transaction [`Bus`](bus::Bus), and the
//!   [`Supervisor`](supervisor::Supervisor) watchdog fed by its heartbeats
//! - **Layer 3: Core** - [`Core`](broadcast::Core) runs every stage in a fixed
//!   order per tick and exposes status telemetry and an audit log
//!
//! All sample arithmetic is integer fixed point (see [`fixed`]). Every
//! narrowing saturates; nothing wraps.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vigil::prelude::*;
//!
//! let mut core = Core::new(CoreConfig::default()).unwrap();
//! let mut buffer = ToneSource::new(1_000.0, 125_000_000, 0.5);
//! let mut live = Silence;
//!
//! // Each write is also a heartbeat.
//! core.write(REG_CTRL, CTRL_MASTER_EN | CTRL_WATCHDOG_EN).unwrap();
//! core.tick(&mut buffer, &mut live);
//! core.write(REG_CH_ENABLE, 0xFFF).unwrap();
//! core.tick(&mut buffer, &mut live);
//!
//! let mut out = vec![0i16; 4096];
//! core.process_block(&mut buffer, &mut live, &mut out);
//! println!("{}", core.status_report());
//! ```

pub mod broadcast;
pub mod bus;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixed;
pub mod mixer;
pub mod modulator;
pub mod module;
pub mod observer;
pub mod oscillator;
pub mod registers;
pub mod sine;
pub mod source;
pub mod status;
pub mod supervisor;

#[cfg(feature = "wasm")]
pub mod wasm;

/// Prelude module for convenient imports
pub mod prelude {
    // Layer 1: Typed Stages
    pub use crate::channel::{Channel, ChannelInput, MAX_CHANNELS};
    pub use crate::engine::{CompositionEngine, EngineInput};
    pub use crate::mixer::{GatedSample, Mixer, ScaleTable};
    pub use crate::modulator::AmModulator;
    pub use crate::module::Module;
    pub use crate::oscillator::Oscillator;
    pub use crate::sine::SineTable;

    // Fixed point
    pub use crate::fixed::{saturate_i14, SAMPLE_MAX, SAMPLE_MIN};

    // Layer 2: Control Plane
    pub use crate::bus::{Ack, Bus, SampleMemory, SampleRam, Transaction};
    pub use crate::registers::{
        ch_freq_addr, frequency_hz, phase_increment, Control, Gating, RegisterFile, SourceSelect,
        CTRL_MASTER_EN, CTRL_MSG_SHIFT, CTRL_SOURCE_LIVE, CTRL_WATCHDOG_EN, CTRL_WATCHDOG_RESET,
        REG_CH_ENABLE, REG_CTRL, REG_STATUS,
    };
    pub use crate::supervisor::{
        LatchPolicy, Supervisor, SupervisorConfig, SupervisorInput, SupervisorState, Transition,
    };

    // Layer 3: Core
    pub use crate::config::CoreConfig;
    pub use crate::broadcast::Core;
    pub use crate::error::{ConfigError, RegisterError, VigilError};
    pub use crate::observer::{AuditLog, CoreEvent, EventKind};
    pub use crate::source::{AudioSource, BufferSource, NoiseSource, Silence, ToneSource};
    pub use crate::status::{StatusReport, StatusWord, WatchdogState};
}

// Re-export key types at crate root for convenience
pub use prelude::*;
