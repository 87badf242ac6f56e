//! VigilEngine - Main WASM interface for the Vigil core

use super::error::to_js;
use crate::config::CoreConfig;
use crate::broadcast::Core;
use crate::source::{AudioSource, BufferSource};
use std::collections::VecDeque;
use wasm_bindgen::prelude::*;

/// Live samples pushed from JavaScript, consumed one per tick.
///
/// Underruns play silence.
#[derive(Debug, Default)]
struct LiveQueue {
    samples: VecDeque<i16>,
}

impl LiveQueue {
    /// Upper bound on queued samples; older ones are discarded.
    const CAPACITY: usize = 1 << 16;

    fn push(&mut self, samples: &[i16]) {
        self.samples.extend(samples.iter().copied());
        let excess = self.samples.len().saturating_sub(Self::CAPACITY);
        self.samples.drain(..excess);
    }
}

impl AudioSource for LiveQueue {
    fn next_sample(&mut self) -> i16 {
        self.samples.pop_front().unwrap_or(0)
    }

    fn reset(&mut self) {
        self.samples.clear();
    }
}

/// Main WASM interface for the Vigil core
#[wasm_bindgen]
pub struct VigilEngine {
    core: Core,
    buffer: BufferSource,
    live: LiveQueue,
}

#[wasm_bindgen]
impl VigilEngine {
    /// Create an engine with the default configuration
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<VigilEngine, JsValue> {
        Self::with_config(CoreConfig::default())
    }

    /// Create an engine from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<VigilEngine, JsValue> {
        let config = CoreConfig::from_json(json).map_err(to_js)?;
        Self::with_config(config)
    }

    /// Ticks per second of the configured core
    #[wasm_bindgen(getter)]
    pub fn tick_rate(&self) -> u32 {
        self.core.config().tick_rate
    }

    /// Number of carrier channels
    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> usize {
        self.core.config().channels
    }

    // =========================================================================
    // Register Access
    // =========================================================================

    /// Queue a register write; it commits on the next tick
    pub fn write(&mut self, addr: u32, value: u32) -> Result<(), JsValue> {
        self.core.write(addr, value).map_err(to_js)
    }

    /// Queue a register read; the value arrives via `take_ack`
    pub fn read(&mut self, addr: u32) -> Result<(), JsValue> {
        self.core.read(addr).map_err(to_js)
    }

    /// Result of the last completed transaction, if not yet taken
    ///
    /// Rejected transactions surface as an error.
    pub fn take_ack(&mut self) -> Result<Option<u32>, JsValue> {
        match self.core.take_ack() {
            Some(ack) => ack.result.map(Some).map_err(to_js),
            None => Ok(None),
        }
    }

    /// Current register value without a bus transaction (not a heartbeat)
    pub fn peek(&self, addr: u32) -> Result<u32, JsValue> {
        self.core.peek(addr).map_err(to_js)
    }

    /// Whether a transaction is still outstanding
    pub fn is_busy(&self) -> bool {
        self.core.is_busy()
    }

    // =========================================================================
    // Audio Sources
    // =========================================================================

    /// Store a Q1.13 message clip in `slot` (0..16)
    pub fn load_message(&mut self, slot: usize, samples: &[i16]) -> bool {
        self.buffer.load(slot, samples)
    }

    /// Store a 16-bit PCM message clip in `slot`
    pub fn load_message_pcm16(&mut self, slot: usize, pcm: &[i16]) -> bool {
        self.buffer.load_pcm16(slot, pcm)
    }

    /// Append live-capture samples (Q1.13)
    pub fn push_live(&mut self, samples: &[i16]) {
        self.live.push(samples);
    }

    /// Number of queued live samples
    pub fn live_backlog(&self) -> usize {
        self.live.samples.len()
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Process a single tick and return the composite sample
    pub fn tick(&mut self) -> i16 {
        self.core.tick(&mut self.buffer, &mut self.live)
    }

    /// Process a block of ticks and return the composite samples as Int16Array
    pub fn process_block(&mut self, num_samples: usize) -> js_sys::Int16Array {
        let mut block = vec![0i16; num_samples];
        self.core
            .process_block(&mut self.buffer, &mut self.live, &mut block);
        js_sys::Int16Array::from(&block[..])
    }

    /// Reset the core to power-on state and rewind the sources
    pub fn reset(&mut self) {
        self.core.reset();
        self.buffer.reset();
        self.live.reset();
    }

    // =========================================================================
    // Telemetry
    // =========================================================================

    /// Full status snapshot
    pub fn status(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.core.status_report()).map_err(to_js)
    }

    /// Status as `key=value;...` text
    pub fn status_text(&self) -> String {
        self.core.status_report().to_string()
    }

    /// Raw STATUS register value
    pub fn status_word(&self) -> u32 {
        self.core.status_word().pack()
    }

    /// Drain pending audit events
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        let events = self.core.drain_events();
        serde_wasm_bindgen::to_value(&events).map_err(to_js)
    }
}

impl VigilEngine {
    fn with_config(config: CoreConfig) -> Result<VigilEngine, JsValue> {
        // Initialize panic hook for better error messages
        console_error_panic_hook::set_once();

        Ok(Self {
            core: Core::new(config).map_err(to_js)?,
            buffer: BufferSource::new(),
            live: LiveQueue::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_queue_underrun_is_silence() {
        let mut q = LiveQueue::default();
        q.push(&[5, 6]);
        assert_eq!(q.next_sample(), 5);
        assert_eq!(q.next_sample(), 6);
        assert_eq!(q.next_sample(), 0);
    }

    #[test]
    fn test_live_queue_is_bounded() {
        let mut q = LiveQueue::default();
        let chunk = vec![1i16; LiveQueue::CAPACITY];
        q.push(&chunk);
        q.push(&[2, 3]);
        assert_eq!(q.samples.len(), LiveQueue::CAPACITY);
        assert_eq!(q.samples.back(), Some(&3));
    }
}
