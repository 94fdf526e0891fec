//! Display geometry and surface abstraction
//!
//! The cartridge renders into a fixed rectangle of its linear memory,
//! 4 bytes per pixel (packed RGBA, 8 bits per channel). The host pushes one
//! full frame per tick to a [`DisplaySurface`] at a fixed origin; partial
//! updates are not supported.

use anyhow::Result;

/// Bytes per pixel in the display buffer (packed RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// Location and size of the cartridge's display buffer in linear memory.
///
/// Queried from the cartridge exactly once after init and fixed for the
/// lifetime of the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// Byte offset of the display buffer in linear memory.
    pub offset: u32,
    /// Display width in pixels.
    pub width: u32,
    /// Display height in pixels.
    pub height: u32,
}

impl DisplayGeometry {
    /// Bytes consumed per frame: `width × height × 4`.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

/// Target that receives and presents one full RGBA8 frame per tick.
pub trait DisplaySurface {
    /// Present a full frame. `pixels.len()` is always
    /// `width * height * 4`; the frame is blitted at a fixed origin,
    /// overwriting the previous one.
    fn present(&mut self, width: u32, height: u32, pixels: &[u8]) -> Result<()>;
}
