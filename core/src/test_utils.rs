//! Shared test utilities
//!
//! WAT-built cartridge fixtures implementing the full export contract, plus
//! a recording display surface. The fixture's linear memory doubles as its
//! observable state:
//!
//! - `0..4` — last delta received by `next_frame` (f32)
//! - `4..8` — completed step count (i32)
//! - `8..12` / `12..16` — last pointer position (i32 x, y)
//! - `16..20` — click count (i32)
//! - `20..24` — pause flag (i32, xor-toggled)
//! - `1024..1152` — 8x4 RGBA8 display buffer, filled with the step count

use anyhow::{Result, bail};

use crate::cartridge::{Cartridge, MemoryPolicy, load_cartridge};
use crate::display::DisplaySurface;
use crate::driver::FrameDriver;
use crate::engine::SandboxEngine;

const FULL_CARTRIDGE_WAT: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "init")
        (i32.store (i32.const 4) (i32.const 0)))
    (func (export "get_display") (result i32) (i32.const 1024))
    (func (export "get_display_width") (result i32) (i32.const 8))
    (func (export "get_display_height") (result i32) (i32.const 4))
    (func (export "toggle_pause")
        (i32.store (i32.const 20)
            (i32.xor (i32.load (i32.const 20)) (i32.const 1))))
    (func (export "mouse_move") (param $x i32) (param $y i32)
        (i32.store (i32.const 8) (local.get $x))
        (i32.store (i32.const 12) (local.get $y)))
    (func (export "mouse_click")
        (i32.store (i32.const 16)
            (i32.add (i32.load (i32.const 16)) (i32.const 1))))
    (func (export "next_frame") (param $dt f32)
        (local $i i32)
        (f32.store (i32.const 0) (local.get $dt))
        (i32.store (i32.const 4)
            (i32.add (i32.load (i32.const 4)) (i32.const 1)))
        (block $done
            (loop $fill
                (br_if $done (i32.ge_u (local.get $i) (i32.const 128)))
                (i32.store8
                    (i32.add (i32.const 1024) (local.get $i))
                    (i32.load (i32.const 4)))
                (local.set $i (i32.add (local.get $i) (i32.const 1)))
                (br $fill))))
)
"#;

/// Same contract, but the step call traps once the step counter reaches 5.
const TRAPPING_CARTRIDGE_WAT: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "init"))
    (func (export "get_display") (result i32) (i32.const 1024))
    (func (export "get_display_width") (result i32) (i32.const 8))
    (func (export "get_display_height") (result i32) (i32.const 4))
    (func (export "toggle_pause"))
    (func (export "mouse_move") (param i32 i32))
    (func (export "mouse_click"))
    (func (export "next_frame") (param $dt f32)
        (local $i i32)
        (i32.store (i32.const 4)
            (i32.add (i32.load (i32.const 4)) (i32.const 1)))
        (if (i32.eq (i32.load (i32.const 4)) (i32.const 5))
            (then unreachable))
        (block $done
            (loop $fill
                (br_if $done (i32.ge_u (local.get $i) (i32.const 128)))
                (i32.store8
                    (i32.add (i32.const 1024) (local.get $i))
                    (i32.load (i32.const 4)))
                (local.set $i (i32.add (local.get $i) (i32.const 1)))
                (br $fill))))
)
"#;

/// Reports a display region that ends past the one-page linear memory.
const OOB_DISPLAY_CARTRIDGE_WAT: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "init"))
    (func (export "get_display") (result i32) (i32.const 65520))
    (func (export "get_display_width") (result i32) (i32.const 8))
    (func (export "get_display_height") (result i32) (i32.const 4))
    (func (export "next_frame") (param f32))
)
"#;

pub fn full_cartridge_wat() -> Vec<u8> {
    wat::parse_str(FULL_CARTRIDGE_WAT).unwrap()
}

pub fn trapping_cartridge_wat() -> Vec<u8> {
    wat::parse_str(TRAPPING_CARTRIDGE_WAT).unwrap()
}

pub fn oob_display_cartridge_wat() -> Vec<u8> {
    wat::parse_str(OOB_DISPLAY_CARTRIDGE_WAT).unwrap()
}

/// Load a module-owned cartridge from WAT-produced bytes and wrap it in a
/// driver.
pub fn load_driver_from(image: &[u8]) -> FrameDriver {
    let engine = SandboxEngine::new().unwrap();
    let cartridge = load_cartridge(&engine, image, MemoryPolicy::ModuleOwned).unwrap();
    FrameDriver::new(cartridge).unwrap()
}

/// Driver over the standard full-contract fixture.
pub fn load_test_driver() -> FrameDriver {
    load_driver_from(&full_cartridge_wat())
}

/// Last delta the fixture's `next_frame` received, in seconds.
pub fn last_dt(cartridge: &Cartridge) -> f32 {
    let bytes = cartridge.snapshot(0, 4).unwrap();
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Fixture pointer state: (x, y, click count).
pub fn mouse_state(cartridge: &Cartridge) -> (i32, i32, i32) {
    let bytes = cartridge.snapshot(8, 12).unwrap();
    let word = |i: usize| {
        i32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
    };
    (word(0), word(4), word(8))
}

/// Fixture pause flag as set through `toggle_pause`.
pub fn pause_flag(cartridge: &Cartridge) -> bool {
    let bytes = cartridge.snapshot(20, 4).unwrap();
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) != 0
}

/// Recording display surface.
#[derive(Debug, Default)]
pub struct TestSurface {
    pub present_count: u32,
    pub last_frame: Option<(u32, u32, Vec<u8>)>,
    pub fail_next: bool,
}

impl TestSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySurface for TestSurface {
    fn present(&mut self, width: u32, height: u32, pixels: &[u8]) -> Result<()> {
        if self.fail_next {
            self.fail_next = false;
            bail!("surface rejected frame");
        }
        self.present_count += 1;
        self.last_frame = Some((width, height, pixels.to_vec()));
        Ok(())
    }
}
