//! Cartridge loading and instantiation
//!
//! A cartridge is a sandboxed WASM module implementing the fixed export
//! contract (`init`, `get_display*`, `toggle_pause`, `mouse_move`,
//! `mouse_click`, `next_frame`). The loader builds the host import table,
//! instantiates the module, resolves its linear memory and exports, and
//! invokes `init` exactly once before handing the instance to callers. It
//! never starts a loop itself.

use anyhow::{Context, Result};
use wasmtime::{Caller, Instance, Linker, Memory, MemoryType, Store, TypedFunc};
use wasmparser::{Parser, Payload};

use crate::display::DisplayGeometry;
use crate::engine::SandboxEngine;
use crate::error::HostError;
use crate::memory;

/// Size of one WASM linear memory page in bytes.
pub const WASM_PAGE_SIZE: usize = 64 * 1024;

/// Fixed acknowledgment returned by the `env.log` diagnostic import,
/// regardless of input.
pub const DIAG_ACK: f64 = 0.0;

/// Who allocates the cartridge's linear memory.
///
/// Selected at instantiation time. `ModuleOwned` is the interactive
/// deployment (the cartridge exports `memory`); `HostOwned` is the harness
/// deployment (the host pre-allocates `env.memory` and injects it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPolicy {
    /// The cartridge owns and exports its linear memory.
    ModuleOwned,
    /// The host allocates `pages` WASM pages and supplies them as the
    /// `env.memory` import.
    HostOwned { pages: u64 },
}

/// Per-cartridge host state stored in the wasmtime Store.
#[derive(Debug, Default)]
pub struct HostState {
    /// Values received through the `env.log` diagnostic import.
    pub diagnostics: Vec<f64>,
}

/// A loaded, instantiated, and initialized cartridge.
pub struct Cartridge {
    store: Store<HostState>,
    /// Kept alive so exported functions and memory references stay valid.
    #[allow(dead_code)]
    instance: Instance,
    policy: MemoryPolicy,
    memory: Option<Memory>,
    init_fn: Option<TypedFunc<(), ()>>,
    get_display_fn: Option<TypedFunc<(), u32>>,
    get_display_width_fn: Option<TypedFunc<(), u32>>,
    get_display_height_fn: Option<TypedFunc<(), u32>>,
    toggle_pause_fn: Option<TypedFunc<(), ()>>,
    mouse_move_fn: Option<TypedFunc<(i32, i32), ()>>,
    mouse_click_fn: Option<TypedFunc<(), ()>>,
    next_frame_fn: TypedFunc<f32, ()>,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Register the host side of the import contract.
///
/// Every name is offered unconditionally; a cartridge links only what it
/// declares. `env.memory` is added separately under `HostOwned`.
fn register_host_imports(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap("env", "sin", |x: f32| -> f32 { x.sin() })?;
    linker.func_wrap("env", "cos", |x: f32| -> f32 { x.cos() })?;
    linker.func_wrap(
        "env",
        "log",
        |mut caller: Caller<'_, HostState>, value: f64| -> f64 {
            tracing::debug!(value, "cartridge diagnostic");
            caller.data_mut().diagnostics.push(value);
            DIAG_ACK
        },
    )?;
    Ok(())
}

/// List the imports a cartridge image declares, for startup diagnostics.
///
/// Walks the binary without executing it, the same way build-time WASM
/// analysis does. Parse errors simply end the walk; the instantiation
/// error itself carries the authoritative failure.
pub fn declared_imports(image: &[u8]) -> Vec<String> {
    let mut imports = Vec::new();
    for payload in Parser::new(0).parse_all(image) {
        let Ok(payload) = payload else { break };
        if let Payload::ImportSection(reader) = payload {
            for import in reader {
                let Ok(import) = import else { break };
                imports.push(format!("{}.{}", import.module, import.name));
            }
        }
    }
    imports
}

/// Load, instantiate, and initialize a cartridge from its binary image.
///
/// Fatal on any failure: compilation, import mismatch, a missing
/// `next_frame` export, or a trap inside `init`. There is no partial
/// instantiation and no retry.
pub fn load_cartridge(
    engine: &SandboxEngine,
    image: &[u8],
    policy: MemoryPolicy,
) -> Result<Cartridge, HostError> {
    let module = engine.load_module(image).map_err(HostError::Startup)?;

    let mut store = Store::new(engine.engine(), HostState::default());
    let mut linker = Linker::new(engine.engine());
    register_host_imports(&mut linker).map_err(HostError::Startup)?;

    let mut host_memory = None;
    if let MemoryPolicy::HostOwned { pages } = policy {
        let memory = Memory::new(&mut store, MemoryType::new(pages.try_into().unwrap(), None))
            .context("failed to allocate host-owned memory")
            .map_err(HostError::Startup)?;
        linker
            .define(&mut store, "env", "memory", memory)
            .context("failed to define host-owned memory import")
            .map_err(HostError::Startup)?;
        host_memory = Some(memory);
    }

    let instance = linker
        .instantiate(&mut store, &module)
        .with_context(|| {
            format!(
                "failed to instantiate cartridge (declared imports: [{}])",
                declared_imports(image).join(", ")
            )
        })
        .map_err(HostError::Startup)?;

    // Exported memory wins; host-owned memory backs the harness variant.
    let memory = instance.get_memory(&mut store, "memory").or(host_memory);

    let init_fn = instance.get_typed_func::<(), ()>(&mut store, "init").ok();
    let get_display_fn = instance
        .get_typed_func::<(), u32>(&mut store, "get_display")
        .ok();
    let get_display_width_fn = instance
        .get_typed_func::<(), u32>(&mut store, "get_display_width")
        .ok();
    let get_display_height_fn = instance
        .get_typed_func::<(), u32>(&mut store, "get_display_height")
        .ok();
    let toggle_pause_fn = instance
        .get_typed_func::<(), ()>(&mut store, "toggle_pause")
        .ok();
    let mouse_move_fn = instance
        .get_typed_func::<(i32, i32), ()>(&mut store, "mouse_move")
        .ok();
    let mouse_click_fn = instance
        .get_typed_func::<(), ()>(&mut store, "mouse_click")
        .ok();
    let next_frame_fn = instance
        .get_typed_func::<f32, ()>(&mut store, "next_frame")
        .context("cartridge does not export next_frame")
        .map_err(HostError::Startup)?;

    let mut cartridge = Cartridge {
        store,
        instance,
        policy,
        memory,
        init_fn,
        get_display_fn,
        get_display_width_fn,
        get_display_height_fn,
        toggle_pause_fn,
        mouse_move_fn,
        mouse_click_fn,
        next_frame_fn,
    };

    cartridge
        .init()
        .context("cartridge init trapped")
        .map_err(HostError::Startup)?;

    tracing::info!(?policy, "cartridge loaded");
    Ok(cartridge)
}

impl Cartridge {
    /// One-time setup call, invoked by the loader only.
    fn init(&mut self) -> Result<()> {
        if let Some(init) = &self.init_fn {
            init.call(&mut self.store, ())
                .context("failed to call init()")?;
        }
        Ok(())
    }

    /// Query the display geometry from the cartridge's exports.
    ///
    /// The frame driver calls this exactly once and caches the result for
    /// the lifetime of the instance.
    pub fn display_geometry(&mut self) -> Result<DisplayGeometry> {
        let get_display = self
            .get_display_fn
            .clone()
            .context("cartridge does not export get_display")?;
        let get_width = self
            .get_display_width_fn
            .clone()
            .context("cartridge does not export get_display_width")?;
        let get_height = self
            .get_display_height_fn
            .clone()
            .context("cartridge does not export get_display_height")?;

        let offset = get_display
            .call(&mut self.store, ())
            .context("failed to call get_display()")?;
        let width = get_width
            .call(&mut self.store, ())
            .context("failed to call get_display_width()")?;
        let height = get_height
            .call(&mut self.store, ())
            .context("failed to call get_display_height()")?;

        Ok(DisplayGeometry {
            offset,
            width,
            height,
        })
    }

    /// Advance the simulation by `delta` seconds.
    pub fn next_frame(&mut self, delta: f32) -> Result<()> {
        self.next_frame_fn
            .call(&mut self.store, delta)
            .context("failed to call next_frame()")
    }

    /// Flip the cartridge's internal run/pause state. A no-op for
    /// cartridges that do not export `toggle_pause`.
    pub fn toggle_pause(&mut self) -> Result<()> {
        if let Some(toggle) = &self.toggle_pause_fn {
            toggle
                .call(&mut self.store, ())
                .context("failed to call toggle_pause()")?;
        }
        Ok(())
    }

    /// Forward a surface-local pointer position, unmodified.
    pub fn mouse_move(&mut self, x: i32, y: i32) -> Result<()> {
        if let Some(mouse_move) = &self.mouse_move_fn {
            mouse_move
                .call(&mut self.store, (x, y))
                .context("failed to call mouse_move()")?;
        }
        Ok(())
    }

    /// Forward a pointer press notification.
    pub fn mouse_click(&mut self) -> Result<()> {
        if let Some(mouse_click) = &self.mouse_click_fn {
            mouse_click
                .call(&mut self.store, ())
                .context("failed to call mouse_click()")?;
        }
        Ok(())
    }

    /// Take a fresh snapshot of a byte range of the cartridge's linear
    /// memory. Contents are only valid until the next step call.
    pub fn snapshot(&self, offset: usize, length: usize) -> Result<Vec<u8>, HostError> {
        let mem = self.memory.ok_or_else(|| {
            HostError::Addressing {
                offset,
                length,
                memory_size: 0,
            }
        })?;
        memory::snapshot(mem.data(&self.store), offset, length)
    }

    /// Current size of the linear memory in bytes, or 0 if the cartridge
    /// has none.
    pub fn memory_size(&self) -> usize {
        self.memory
            .map(|m| m.data(&self.store).len())
            .unwrap_or(0)
    }

    /// The memory ownership policy this cartridge was instantiated with.
    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Values received through the `env.log` diagnostic import so far.
    pub fn diagnostics(&self) -> &[f64] {
        &self.store.data().diagnostics
    }
}
