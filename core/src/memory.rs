//! Memory bridge
//!
//! Byte-addressable snapshots out of a cartridge's linear memory. The
//! cartridge may grow or rewrite its memory on the next step call, so a
//! snapshot is taken fresh every frame; nothing is cached across ticks.

use crate::error::HostError;

/// Copy `length` bytes at `offset` out of `memory`.
///
/// A range that overflows or ends past the current memory size is a fatal
/// addressing error: the host and cartridge disagree on display geometry.
pub fn snapshot(memory: &[u8], offset: usize, length: usize) -> Result<Vec<u8>, HostError> {
    let end = offset.checked_add(length).ok_or(HostError::Addressing {
        offset,
        length,
        memory_size: memory.len(),
    })?;
    if end > memory.len() {
        return Err(HostError::Addressing {
            offset,
            length,
            memory_size: memory.len(),
        });
    }
    Ok(memory[offset..end].to_vec())
}
