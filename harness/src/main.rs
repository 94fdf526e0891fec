//! Cinderbox harness - headless single-step cartridge execution
//!
//! Instantiates a cartridge against host-owned memory, advances it exactly
//! one step with a fixed delta, and reports what the cartridge logged.
//! There is no display and no loop; this exists to exercise cartridges in
//! CI and while porting.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cinderbox_core::{MemoryPolicy, SandboxEngine, WASM_PAGE_SIZE, load_cartridge};

#[derive(Parser)]
#[command(name = "cinderbox-harness", about = "Single-step a Cinderbox cartridge headlessly")]
struct Args {
    /// Path to the cartridge (.wasm)
    cartridge: PathBuf,

    /// Linear memory pages to provide to the cartridge
    #[arg(long, default_value_t = 300)]
    pages: u64,

    /// Delta-time value (seconds) passed to the single step
    #[arg(long, default_value_t = 69.0)]
    delta: f32,
}

fn run(args: &Args) -> Result<()> {
    let image = std::fs::read(&args.cartridge)
        .with_context(|| format!("failed to read {}", args.cartridge.display()))?;
    tracing::info!(
        "Loaded cartridge {} ({} bytes)",
        args.cartridge.display(),
        image.len()
    );

    let engine = SandboxEngine::new()?;
    let mut cartridge = load_cartridge(
        &engine,
        &image,
        MemoryPolicy::HostOwned { pages: args.pages },
    )
    .context("cartridge startup failed")?;
    tracing::info!(
        "Instantiated with {} host-owned pages ({} bytes)",
        args.pages,
        cartridge.memory_size()
    );
    debug_assert_eq!(
        cartridge.memory_size() as u64,
        args.pages * WASM_PAGE_SIZE as u64
    );

    cartridge.next_frame(args.delta)?;
    tracing::info!("Step completed (delta {})", args.delta);

    let diagnostics = cartridge.diagnostics();
    if diagnostics.is_empty() {
        tracing::info!("No diagnostics logged");
    } else {
        for (i, value) in diagnostics.iter().enumerate() {
            tracing::info!("Diagnostic {}: {}", i, value);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        tracing::error!("Harness error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
