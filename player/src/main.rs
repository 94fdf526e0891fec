//! Cinderbox player - interactive cartridge runtime

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod graphics;

#[derive(Parser)]
#[command(name = "cinderbox-player", about = "Run a Cinderbox cartridge")]
struct Args {
    /// Path to the cartridge (.wasm)
    cartridge: PathBuf,

    /// Start fullscreen, overriding the config file
    #[arg(long)]
    fullscreen: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = cinderbox_core::config::load();
    if args.fullscreen {
        config.video.fullscreen = true;
    }

    let image = match std::fs::read(&args.cartridge) {
        Ok(image) => image,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", args.cartridge.display(), e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded cartridge {} ({} bytes)",
        args.cartridge.display(),
        image.len()
    );

    if let Err(e) = app::run(image, config) {
        tracing::error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
