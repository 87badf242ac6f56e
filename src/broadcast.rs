//! The Gated Broadcast Core
//!
//! [`Core`] owns the register file, the bus, the liveness supervisor, the
//! composition engine, and the audit log, and advances all of them in one
//! synchronous [`tick`](Core::tick). Each tick runs fixed stages in order:
//!
//! ```text
//! 1. bus        commit the outstanding transaction (writes become heartbeats)
//! 2. supervisor advance the watchdog on this tick's strobes
//! 3. gating     effective master = requested AND NOT triggered
//! 4. engine     oscillators, modulators, mixer on the selected audio sample
//! 5. status     latch the STATUS register
//! ```
//!
//! Because gating is derived after the supervisor on the same tick, a fault
//! latched on tick `T` silences the output of tick `T` itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil::prelude::*;
//!
//! let mut core = Core::new(CoreConfig::default())?;
//! let (mut buffer, mut live) = (Silence, Silence);
//!
//! core.write(REG_CTRL, CTRL_MASTER_EN | CTRL_WATCHDOG_EN)?;
//! core.tick(&mut buffer, &mut live);
//! core.write(REG_CH_ENABLE, 0b1)?;
//! core.tick(&mut buffer, &mut live);
//!
//! let mut out = vec![0i16; 1024];
//! core.process_block(&mut buffer, &mut live, &mut out);
//! ```

use crate::bus::{Ack, Bus, SampleMemory, SampleRam, Transaction};
use crate::config::CoreConfig;
use crate::engine::{CompositionEngine, EngineInput};
use crate::error::{ConfigError, RegisterError};
use crate::module::Module;
use crate::observer::{AuditConfig, AuditLog, CoreEvent, EventKind};
use crate::registers::{Gating, RegisterFile, SourceSelect};
use crate::source::AudioSource;
use crate::status::{StatusReport, StatusWord, WatchdogState};
use crate::supervisor::{Supervisor, SupervisorState};
use tracing::{debug, info};

/// The complete core.
pub struct Core {
    config: CoreConfig,
    regs: RegisterFile,
    bus: Bus,
    memory: Box<dyn SampleMemory>,
    supervisor: Supervisor,
    engine: CompositionEngine,
    audit: AuditLog,
    ticks: u64,
    gating: Gating,
    last_ack: Option<Ack>,
}

impl Core {
    /// Build a core from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            regs: RegisterFile::new(config.channels, config.default_increments()),
            bus: Bus::new(),
            memory: Box::new(SampleRam::new()),
            supervisor: Supervisor::new(config.supervisor(), config.latch_policy),
            engine: CompositionEngine::new(
                config.channels,
                config.modulation_index_q13,
                config.scale_table.clone(),
            ),
            audit: AuditLog::new(),
            ticks: 0,
            gating: Gating::default(),
            last_ack: None,
            config,
        })
    }

    /// Replace the memory behind the sample window.
    pub fn with_sample_memory(mut self, memory: Box<dyn SampleMemory>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_audit_config(mut self, config: AuditConfig) -> Self {
        self.audit = AuditLog::with_config(config);
        self
    }

    // =========================================================================
    // Control plane
    // =========================================================================

    /// Queue a transaction for the next tick.
    pub fn issue(&mut self, transaction: Transaction) -> Result<(), RegisterError> {
        self.bus.issue(transaction).inspect_err(|e| {
            debug!(addr = transaction.addr(), error = %e, "transaction refused");
        })
    }

    /// Queue a register write. It commits, and counts as a heartbeat, on the
    /// next tick.
    pub fn write(&mut self, addr: u32, value: u32) -> Result<(), RegisterError> {
        self.issue(Transaction::Write { addr, value })
    }

    /// Queue a register read. The value arrives in the next tick's ack.
    pub fn read(&mut self, addr: u32) -> Result<(), RegisterError> {
        self.issue(Transaction::Read { addr })
    }

    /// Take the most recent acknowledgement, if one has not been taken yet.
    pub fn take_ack(&mut self) -> Option<Ack> {
        self.last_ack.take()
    }

    /// Register value as of the end of the last tick, bypassing the bus.
    /// Has no side effects and is not a heartbeat.
    pub fn peek(&self, addr: u32) -> Result<u32, RegisterError> {
        self.regs.read(addr)
    }

    pub fn is_busy(&self) -> bool {
        self.bus.is_busy()
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Advance every component by one tick and return the composite sample.
    ///
    /// `buffer` and `live` are the two audio collaborators; CTRL
    /// `source_select` decides which one is pulled.
    pub fn tick(&mut self, buffer: &mut dyn AudioSource, live: &mut dyn AudioSource) -> i16 {
        // Stage 1: bus.
        let watchdog_before = self.regs.control().watchdog_enable;
        if let Some(ack) = self.bus.tick(&mut self.regs, self.memory.as_mut()) {
            if let (Err(e), Transaction::Write { addr, value }) = (&ack.result, ack.transaction) {
                debug!(addr, value, error = %e, "register write rejected");
                self.audit.push(
                    self.ticks,
                    EventKind::WriteRejected {
                        addr,
                        value,
                        reason: e.to_string(),
                    },
                );
            }
            self.last_ack = Some(ack);
        }
        let control = self.regs.control();
        if control.watchdog_enable != watchdog_before {
            let kind = if control.watchdog_enable {
                EventKind::WatchdogEnabled
            } else {
                EventKind::WatchdogDisabled
            };
            info!(enabled = control.watchdog_enable, "watchdog toggled");
            self.audit.push(self.ticks, kind);
        }

        // Stage 2: supervisor.
        let state = self.supervisor.tick(self.regs.take_supervisor_input());
        if let Some(transition) = self.supervisor.last_transition() {
            self.audit.push(self.ticks, transition.into());
        }

        // Stage 3: gating.
        self.gating = self.regs.gating(state.triggered);

        // Stage 4: composition.
        buffer.select_message(control.message);
        let audio = match control.source {
            SourceSelect::Buffer => buffer.next_sample(),
            SourceSelect::Live => live.next_sample(),
        };
        let out = self.engine.tick(EngineInput {
            increments: self.regs.increments(),
            gating: self.gating,
            audio,
        });

        // Stage 5: status.
        let status = self.status_word().pack();
        self.regs.latch_status(status);

        self.ticks += 1;
        out
    }

    /// Run `out.len()` ticks, writing each composite sample.
    pub fn process_block(
        &mut self,
        buffer: &mut dyn AudioSource,
        live: &mut dyn AudioSource,
        out: &mut [i16],
    ) {
        for sample in out.iter_mut() {
            *sample = self.tick(buffer, live);
        }
    }

    /// Return registers to their defaults, drop any outstanding transaction,
    /// clear sample memory, and zero all supervisor and composition state.
    /// The tick counter keeps running.
    ///
    /// Audio sources belong to the host, which rewinds them itself.
    pub fn reset(&mut self) {
        info!(tick = self.ticks, "core reset");
        self.regs.reset();
        self.bus.reset();
        self.memory.clear();
        self.supervisor.reset();
        self.engine.reset();
        self.gating = Gating::default();
        self.last_ack = None;
        self.audit.push(self.ticks, EventKind::Reset);
    }

    // =========================================================================
    // Telemetry
    // =========================================================================

    pub fn status_word(&self) -> StatusWord {
        let state = self.supervisor.state();
        StatusWord {
            enable_mask: self.regs.enable_mask(),
            time_remaining: self.supervisor.time_remaining_seconds(),
            watchdog_enable: self.regs.control().watchdog_enable,
            warning: state.warning,
            triggered: state.triggered,
            master: self.gating.master(),
        }
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        WatchdogState::from_supervisor(
            self.regs.control().watchdog_enable,
            &self.supervisor.state(),
        )
    }

    pub fn status_report(&self) -> StatusReport {
        let control = self.regs.control();
        let state = self.supervisor.state();
        let broadcasting = self.gating.master();
        StatusReport {
            tick: self.ticks,
            broadcasting,
            master_requested: control.master_enable,
            source: control.source,
            message: control.message,
            watchdog: self.watchdog_state(),
            time_remaining: self.supervisor.time_remaining_seconds(),
            elapsed_ticks: state.elapsed_ticks,
            output: self.engine.output(),
            channels: StatusReport::channel_entries(
                self.regs.increments(),
                self.regs.enable_mask(),
                broadcasting,
                self.config.tick_rate,
            ),
        }
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        self.audit.drain()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn supervisor_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn engine(&self) -> &CompositionEngine {
        &self.engine
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Gating derived on the most recent tick.
    pub fn gating(&self) -> Gating {
        self.gating
    }

    /// Composite output of the most recent tick.
    pub fn output(&self) -> i16 {
        self.engine.output()
    }

    /// Ticks run since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
