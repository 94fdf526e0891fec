//! WASM engine wrapper
//!
//! Thin abstraction over wasmtime for compiling cartridge modules. One
//! engine is shared by every cartridge loaded in the process.

use anyhow::{Context, Result};
use wasmtime::{Engine, Module};

/// Shared WASM engine (one per host process).
pub struct SandboxEngine {
    engine: Engine,
}

impl SandboxEngine {
    /// Create a new engine with default configuration.
    ///
    /// Fallible: wasmtime engine construction can fail on unsupported
    /// platforms, so there is intentionally no `Default` impl.
    pub fn new() -> Result<Self> {
        let engine = Engine::default();
        Ok(Self { engine })
    }

    /// Get a reference to the underlying wasmtime engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compile a cartridge module from its binary image.
    pub fn load_module(&self, bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, bytes).context("failed to compile cartridge module")
    }
}
