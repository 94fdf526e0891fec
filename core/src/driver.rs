//! Frame driver
//!
//! Owns the step/render loop for one cartridge instance. The loop itself is
//! callback-driven: the host scheduler (a window's redraw pacing, a test
//! harness) invokes [`FrameDriver::tick`] once per refresh interval, and the
//! returned [`TickOutcome`] tells the caller whether to re-arm for another
//! invocation. Cancellation is simply not re-arming.
//!
//! Each tick is run to completion: timing, step call, memory snapshot, and
//! surface present are never interleaved with other work. The shared memory
//! is written only by the cartridge during the step call and read only by
//! the host during the snapshot, so no locking is involved.

use crate::cartridge::Cartridge;
use crate::display::{DisplayGeometry, DisplaySurface};
use crate::error::HostError;
use crate::timing::FrameTiming;

/// Live states of the frame driver.
///
/// There is no unloaded or loading state here: a `FrameDriver` value only
/// exists once loading and the one-time geometry query have succeeded. `Ready` becomes `Running` on the
/// first tick; `Running` and `Paused` flip on the pause toggle; nothing
/// leaves `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Ready,
    Running,
    Paused,
    Terminated,
}

/// Whether the caller should request another tick from its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Re-arm: ask the host scheduler for one more invocation.
    Continue,
    /// The driver is terminated; do not re-arm.
    Stop,
}

/// Drives one cartridge through the timed step loop.
pub struct FrameDriver {
    cartridge: Cartridge,
    geometry: DisplayGeometry,
    timing: FrameTiming,
    state: DriverState,
    ticks: u64,
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("cartridge", &self.cartridge)
            .field("geometry", &self.geometry)
            .field("timing", &self.timing)
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl FrameDriver {
    /// Build a driver for a loaded cartridge.
    ///
    /// Queries the display geometry exactly once; it is cached for the
    /// lifetime of the instance and must never change afterwards. A
    /// cartridge that cannot answer the geometry query cannot enter the
    /// loop, which is a startup failure.
    pub fn new(mut cartridge: Cartridge) -> Result<Self, HostError> {
        let geometry = cartridge.display_geometry().map_err(HostError::Startup)?;
        tracing::info!(
            width = geometry.width,
            height = geometry.height,
            offset = geometry.offset,
            "display geometry cached"
        );
        Ok(Self {
            cartridge,
            geometry,
            timing: FrameTiming::new(),
            state: DriverState::Ready,
            ticks: 0,
        })
    }

    /// Execute one scheduler tick.
    ///
    /// Timing bookkeeping runs on every invocation, paused or not. While
    /// `Running`, the cartridge is stepped with the computed delta, the
    /// display region is snapshotted through the memory bridge, and the
    /// full frame is pushed to `surface` at a fixed origin.
    ///
    /// A step trap or an out-of-bounds display region terminates the
    /// driver; the surface keeps whatever frame it last received. Surface
    /// errors are reported but do not terminate the loop.
    pub fn tick(
        &mut self,
        timestamp_ms: f64,
        surface: &mut dyn DisplaySurface,
    ) -> Result<TickOutcome, HostError> {
        match self.state {
            DriverState::Terminated => return Ok(TickOutcome::Stop),
            DriverState::Ready => self.state = DriverState::Running,
            DriverState::Running | DriverState::Paused => {}
        }

        // Previous-timestamp update is not suspended while paused, so
        // resuming never sees a delta covering the whole pause.
        let delta = self.timing.advance(timestamp_ms);

        if self.state == DriverState::Paused {
            return Ok(TickOutcome::Continue);
        }

        if let Err(source) = self.cartridge.next_frame(delta) {
            self.state = DriverState::Terminated;
            let err = HostError::Step {
                tick: self.ticks,
                source,
            };
            tracing::error!(error = %err, "step failed, terminating loop");
            return Err(err);
        }
        self.ticks += 1;

        let pixels = match self.cartridge.snapshot(
            self.geometry.offset as usize,
            self.geometry.byte_len(),
        ) {
            Ok(pixels) => pixels,
            Err(err) => {
                self.state = DriverState::Terminated;
                tracing::error!(error = %err, "display region out of bounds, terminating loop");
                return Err(err);
            }
        };

        surface
            .present(self.geometry.width, self.geometry.height, &pixels)
            .map_err(HostError::Surface)?;

        Ok(TickOutcome::Continue)
    }

    /// Forward the pause toggle to the cartridge and flip the driver's own
    /// Running/Paused label.
    ///
    /// The cartridge is the authority on simulation pause state; the
    /// driver's label only decides whether the step call is scheduled.
    pub fn toggle_pause(&mut self) -> Result<(), HostError> {
        if self.state == DriverState::Terminated {
            return Ok(());
        }
        if let Err(source) = self.cartridge.toggle_pause() {
            self.state = DriverState::Terminated;
            return Err(HostError::Step {
                tick: self.ticks,
                source,
            });
        }
        self.state = match self.state {
            DriverState::Ready | DriverState::Running => DriverState::Paused,
            DriverState::Paused => DriverState::Running,
            DriverState::Terminated => DriverState::Terminated,
        };
        tracing::debug!(state = ?self.state, "pause toggled");
        Ok(())
    }

    /// Forward a surface-local pointer position into the cartridge.
    pub fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), HostError> {
        if self.state == DriverState::Terminated {
            return Ok(());
        }
        if let Err(source) = self.cartridge.mouse_move(x, y) {
            self.state = DriverState::Terminated;
            return Err(HostError::Step {
                tick: self.ticks,
                source,
            });
        }
        Ok(())
    }

    /// Forward a pointer press into the cartridge.
    pub fn mouse_click(&mut self) -> Result<(), HostError> {
        if self.state == DriverState::Terminated {
            return Ok(());
        }
        if let Err(source) = self.cartridge.mouse_click() {
            self.state = DriverState::Terminated;
            return Err(HostError::Step {
                tick: self.ticks,
                source,
            });
        }
        Ok(())
    }

    /// Current state label.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The cached display geometry.
    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Number of successfully completed step calls.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The cartridge being driven.
    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }
}
