//! WASM bindings for Vigil
//!
//! This module provides the JavaScript-facing API for driving the core from
//! a browser, typically inside an AudioWorklet that pulls blocks of samples.

mod engine;
mod error;

pub use engine::VigilEngine;
pub use error::EngineError;

// Re-export wasm_bindgen for convenience
pub use wasm_bindgen::prelude::*;
