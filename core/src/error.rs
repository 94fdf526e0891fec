//! Error taxonomy for the host runtime
//!
//! Every error class here is terminal for the running cartridge instance:
//! startup failures abort before any loop starts, addressing and step
//! failures stop the loop. There is no transient/permanent distinction and
//! no automatic retry or restart.

use thiserror::Error;

/// Fatal host runtime error.
#[derive(Debug, Error)]
pub enum HostError {
    /// Image fetch, compilation, or instantiation failed. No loop is ever
    /// started after this; the error is reported once.
    #[error("cartridge startup failed")]
    Startup(#[source] anyhow::Error),

    /// The display buffer range handed out by the cartridge exceeds its
    /// linear memory. Host and cartridge disagree on display geometry,
    /// which is a contract violation, not a recoverable condition.
    #[error(
        "display buffer range {offset}+{length} exceeds linear memory size {memory_size}"
    )]
    Addressing {
        offset: usize,
        length: usize,
        memory_size: usize,
    },

    /// A call into the cartridge trapped during a tick. The driver
    /// transitions to `Terminated` and stops requesting ticks.
    #[error("cartridge step failed at tick {tick}")]
    Step {
        tick: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The display surface rejected a frame. Outside the step contract:
    /// the driver does not terminate on these, callers decide.
    #[error("display surface error")]
    Surface(#[source] anyhow::Error),
}

impl HostError {
    /// Whether this error terminates the frame loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HostError::Surface(_))
    }
}
