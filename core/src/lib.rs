//! Cinderbox Core - host runtime for sandboxed WASM cartridges
//!
//! Loads a cartridge against a fixed import table, drives it through a
//! timed step loop, reads its RGBA8 framebuffer out of linear memory, and
//! forwards user input into it.
//!
//! # Architecture
//!
//! - [`SandboxEngine`] / [`load_cartridge`] - module compilation and
//!   instantiation against the host import table
//! - [`FrameDriver`] - the callback-driven step/render loop
//! - [`DisplaySurface`] - seam for whatever presents the pixels
//! - [`InputForwarder`] - synchronous keyboard/pointer forwarding

pub mod cartridge;
pub mod config;
pub mod display;
pub mod driver;
pub mod engine;
pub mod error;
pub mod input;
pub mod memory;
#[cfg(test)]
mod integration;
#[cfg(test)]
pub mod test_utils;
pub mod timing;

pub use cartridge::{Cartridge, HostState, MemoryPolicy, WASM_PAGE_SIZE, load_cartridge};
pub use display::{BYTES_PER_PIXEL, DisplayGeometry, DisplaySurface};
pub use driver::{DriverState, FrameDriver, TickOutcome};
pub use engine::SandboxEngine;
pub use error::HostError;
pub use input::{InputEvent, InputForwarder};
pub use timing::FrameTiming;
