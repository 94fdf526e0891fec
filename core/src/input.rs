//! Input forwarding
//!
//! Translates host input events into synchronous calls on the frame driver.
//! Events are applied immediately on arrival, never queued or batched, so
//! their effects are visible from the next tick that executes. Only the
//! designated pause key is meaningful on the keyboard; pointer events carry
//! surface-local coordinates.

use winit::keyboard::KeyCode;

use crate::driver::{DriverState, FrameDriver};
use crate::error::HostError;

/// A single user input event, surface-local where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed anywhere in the host window/document.
    KeyPress(KeyCode),
    /// Pointer moved to `(x, y)` relative to the display surface origin.
    PointerMove { x: i32, y: i32 },
    /// Pointer pressed; no payload.
    PointerClick,
}

/// Forwards input events into the cartridge for the lifetime of the
/// Ready/Running/Paused states.
#[derive(Debug, Clone, Copy)]
pub struct InputForwarder {
    pause_key: KeyCode,
}

impl InputForwarder {
    pub fn new(pause_key: KeyCode) -> Self {
        Self { pause_key }
    }

    /// The designated pause-toggle key.
    pub fn pause_key(&self) -> KeyCode {
        self.pause_key
    }

    /// Forward one event, synchronously.
    ///
    /// The pause key toggles both the cartridge's internal pause state and
    /// the driver's scheduling label; other keys are ignored. Pointer
    /// coordinates pass through unmodified. Events arriving after
    /// termination are dropped.
    pub fn forward(
        &self,
        driver: &mut FrameDriver,
        event: InputEvent,
    ) -> Result<(), HostError> {
        if driver.state() == DriverState::Terminated {
            return Ok(());
        }
        match event {
            InputEvent::KeyPress(code) if code == self.pause_key => driver.toggle_pause(),
            InputEvent::KeyPress(_) => Ok(()),
            InputEvent::PointerMove { x, y } => driver.mouse_move(x, y),
            InputEvent::PointerClick => driver.mouse_click(),
        }
    }
}
