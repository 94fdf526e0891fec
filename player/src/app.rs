//! Player application: winit event loop around the frame driver
//!
//! The loop is redraw-driven: each `RedrawRequested` runs one driver tick,
//! and the driver's outcome decides whether another redraw is requested.
//! Not re-arming is how the loop stops — there is no separate cancellation
//! path.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Fullscreen, Window};

use cinderbox_core::config::Config;
use cinderbox_core::{
    FrameDriver, HostError, InputEvent, InputForwarder, MemoryPolicy, SandboxEngine,
    TickOutcome, load_cartridge,
};

use crate::graphics::FrameGraphics;

/// Default window scale over the cartridge's native resolution.
const WINDOW_SCALE: u32 = 3;

/// Everything that exists once the window is up and the cartridge runs.
struct Session {
    window: Arc<Window>,
    graphics: FrameGraphics,
    driver: FrameDriver,
}

pub struct PlayerApp {
    image: Vec<u8>,
    config: Config,
    forwarder: InputForwarder,
    /// Origin for scheduler timestamps, set when the session starts.
    start: Option<Instant>,
    session: Option<Session>,
}

impl PlayerApp {
    pub fn new(image: Vec<u8>, config: Config) -> Self {
        let forwarder = InputForwarder::new(config.input.pause_key_code());
        Self {
            image,
            config,
            forwarder,
            start: None,
            session: None,
        }
    }

    /// Load the cartridge, size a window to its display geometry, and set
    /// up presentation.
    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let engine = SandboxEngine::new()?;
        let cartridge = load_cartridge(&engine, &self.image, MemoryPolicy::ModuleOwned)
            .context("cartridge startup failed")?;
        let driver = FrameDriver::new(cartridge).context("cartridge startup failed")?;
        let geometry = driver.geometry();

        let mut attributes = Window::default_attributes()
            .with_title("Cinderbox")
            .with_inner_size(LogicalSize::new(
                geometry.width * WINDOW_SCALE,
                geometry.height * WINDOW_SCALE,
            ));
        if self.config.video.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let graphics = FrameGraphics::new(window.clone(), self.config.video.vsync)?;

        self.start = Some(Instant::now());
        self.session = Some(Session {
            window,
            graphics,
            driver,
        });
        Ok(())
    }

    /// Milliseconds since the session started, for the frame driver.
    fn timestamp_ms(&self) -> f64 {
        self.start
            .map(|start| start.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    /// Translate window-space pointer coordinates into the cartridge's
    /// surface-local coordinate space.
    fn surface_coords(session: &Session, x: f64, y: f64) -> (i32, i32) {
        let size = session.window.inner_size();
        let geometry = session.driver.geometry();
        let sx = x / f64::from(size.width.max(1)) * f64::from(geometry.width);
        let sy = y / f64::from(size.height.max(1)) * f64::from(geometry.height);
        (
            (sx as i32).clamp(0, geometry.width as i32 - 1),
            (sy as i32).clamp(0, geometry.height as i32 - 1),
        )
    }

    fn forward(&mut self, event: InputEvent) {
        let Some(session) = &mut self.session else { return };
        if let Err(e) = self.forwarder.forward(&mut session.driver, event) {
            tracing::error!("Input forwarding failed: {}", e);
        }
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        if let Err(e) = self.start_session(event_loop) {
            // Startup failures are reported once and abort: no loop is
            // ever started.
            tracing::error!("Startup failed: {:#}", e);
            event_loop.exit();
            return;
        }
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(session) = &mut self.session {
                    session.graphics.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let timestamp = self.timestamp_ms();
                let Some(session) = &mut self.session else { return };
                match session.driver.tick(timestamp, &mut session.graphics) {
                    Ok(TickOutcome::Continue) => session.window.request_redraw(),
                    Ok(TickOutcome::Stop) => {}
                    Err(HostError::Surface(e)) => {
                        // Presentation hiccup: keep the loop alive.
                        tracing::warn!("Present failed: {:#}", e);
                        session.window.request_redraw();
                    }
                    Err(e) => {
                        // Terminal: the driver already logged it; the
                        // surface freezes on the last rendered frame and
                        // the loop is simply not re-armed.
                        debug_assert!(e.is_terminal());
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.forward(InputEvent::KeyPress(code));
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(session) = &self.session {
                    let (x, y) = Self::surface_coords(session, position.x, position.y);
                    self.forward(InputEvent::PointerMove { x, y });
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.forward(InputEvent::PointerClick);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Ticks are paced by redraw requests; between them we just wait
        // for events.
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

/// Run the player until the window closes or the driver terminates.
pub fn run(image: Vec<u8>, config: Config) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = PlayerApp::new(image, config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
