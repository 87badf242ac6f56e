//! Error types for WASM bindings

use crate::error::{ConfigError, RegisterError, VigilError};
use wasm_bindgen::prelude::*;

/// Error type for WASM bindings
#[wasm_bindgen]
pub struct EngineError {
    message: String,
}

#[wasm_bindgen]
impl EngineError {
    /// Get the error message
    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<VigilError> for EngineError {
    fn from(e: VigilError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl From<RegisterError> for EngineError {
    fn from(e: RegisterError) -> Self {
        VigilError::from(e).into()
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        VigilError::from(e).into()
    }
}

impl From<serde_wasm_bindgen::Error> for EngineError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl EngineError {
    /// Convert to JsValue for use as error return
    pub fn into_js(self) -> JsValue {
        JsValue::from_str(&self.message)
    }
}

/// Shorthand for `map_err` at the binding boundary.
pub(crate) fn to_js<E: Into<EngineError>>(e: E) -> JsValue {
    e.into().into_js()
}
