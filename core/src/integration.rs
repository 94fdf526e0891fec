//! End-to-end scenarios across loader, driver, bridge, and forwarder.

use winit::keyboard::KeyCode;

use crate::cartridge::{MemoryPolicy, WASM_PAGE_SIZE, load_cartridge};
use crate::driver::{DriverState, FrameDriver, TickOutcome};
use crate::engine::SandboxEngine;
use crate::error::HostError;
use crate::input::{InputEvent, InputForwarder};
use crate::test_utils::{
    TestSurface, last_dt, load_driver_from, load_test_driver, oob_display_cartridge_wat,
    pause_flag, trapping_cartridge_wat,
};

#[test]
fn scenario_interactive_tick_sequence() {
    // Variant A: module-owned memory, ticks at [1000, 1016, 1032] ms give
    // deltas [0, 0.016, 0.016] seconds.
    let mut driver = load_test_driver();
    let mut surface = TestSurface::new();

    let mut seen = Vec::new();
    for t in [1000.0, 1016.0, 1032.0] {
        let outcome = driver.tick(t, &mut surface).unwrap();
        assert_eq!(outcome, TickOutcome::Continue);
        seen.push(last_dt(driver.cartridge()));
    }
    assert_eq!(seen[0], 0.0);
    assert!((seen[1] - 0.016).abs() < 1e-6);
    assert!((seen[2] - 0.016).abs() < 1e-6);
    assert_eq!(surface.present_count, 3);
}

#[test]
fn scenario_harness_single_shot() {
    // Variant B: 300-page host-owned memory, one next_frame(69.0), no
    // driver, no geometry query, no surface.
    let engine = SandboxEngine::new().unwrap();
    let wasm = wat::parse_str(
        r#"
        (module
            (import "env" "memory" (memory 300))
            (import "env" "log" (func $log (param f64) (result f64)))
            (func (export "next_frame") (param $dt f32)
                (drop (call $log (f64.promote_f32 (local.get $dt)))))
        )
    "#,
    )
    .unwrap();
    let mut cartridge =
        load_cartridge(&engine, &wasm, MemoryPolicy::HostOwned { pages: 300 }).unwrap();
    assert_eq!(cartridge.memory_size(), 300 * WASM_PAGE_SIZE);

    cartridge.next_frame(69.0).unwrap();
    assert_eq!(cartridge.diagnostics(), &[69.0]);
}

#[test]
fn scenario_missing_import_never_schedules_a_tick() {
    let engine = SandboxEngine::new().unwrap();
    let wasm = wat::parse_str(
        r#"
        (module
            (import "env" "missing_callback" (func))
            (memory (export "memory") 1)
            (func (export "next_frame") (param f32))
        )
    "#,
    )
    .unwrap();
    let err = load_cartridge(&engine, &wasm, MemoryPolicy::ModuleOwned).unwrap_err();
    assert!(matches!(err, HostError::Startup(_)));
    // No cartridge, no driver, no loop: nothing further to assert beyond
    // the fact that startup reported once and returned.
}

#[test]
fn scenario_step_trap_terminates_and_keeps_last_frame() {
    let mut driver = load_driver_from(&trapping_cartridge_wat());
    let mut surface = TestSurface::new();

    // Ticks 1..=4 succeed; the 5th step call traps.
    for i in 0..4 {
        driver.tick(f64::from(i) * 16.0, &mut surface).unwrap();
    }
    let err = driver.tick(64.0, &mut surface).unwrap_err();
    assert!(matches!(err, HostError::Step { tick: 4, .. }));
    assert_eq!(driver.state(), DriverState::Terminated);

    // The surface froze on the frame from the fourth tick.
    assert_eq!(surface.present_count, 4);
    let (_, _, pixels) = surface.last_frame.clone().unwrap();
    assert!(pixels.iter().all(|&b| b == 4));

    // Tick 6 is never requested: the driver answers Stop without touching
    // the cartridge or the surface.
    assert_eq!(driver.tick(80.0, &mut surface).unwrap(), TickOutcome::Stop);
    assert_eq!(surface.present_count, 4);
}

#[test]
fn scenario_display_region_out_of_bounds_is_fatal() {
    let mut driver = load_driver_from(&oob_display_cartridge_wat());
    let mut surface = TestSurface::new();

    let err = driver.tick(0.0, &mut surface).unwrap_err();
    assert!(matches!(err, HostError::Addressing { .. }));
    assert_eq!(driver.state(), DriverState::Terminated);
    assert_eq!(surface.present_count, 0);
}

#[test]
fn scenario_pause_toggle_reaches_cartridge_and_driver() {
    let mut driver = load_test_driver();
    let mut surface = TestSurface::new();
    let forwarder = InputForwarder::new(KeyCode::Space);

    driver.tick(1000.0, &mut surface).unwrap();
    forwarder
        .forward(&mut driver, InputEvent::KeyPress(KeyCode::Space))
        .unwrap();
    assert_eq!(driver.state(), DriverState::Paused);
    assert!(pause_flag(driver.cartridge()));

    // The pair returns both sides to their original state.
    forwarder
        .forward(&mut driver, InputEvent::KeyPress(KeyCode::Space))
        .unwrap();
    assert_eq!(driver.state(), DriverState::Running);
    assert!(!pause_flag(driver.cartridge()));
}

#[test]
fn scenario_input_visible_from_next_tick() {
    let mut driver = load_test_driver();
    let mut surface = TestSurface::new();
    let forwarder = InputForwarder::new(KeyCode::Space);

    driver.tick(0.0, &mut surface).unwrap();
    // The event is applied synchronously, before any further tick runs.
    forwarder
        .forward(&mut driver, InputEvent::PointerMove { x: 5, y: 2 })
        .unwrap();
    let (x, y, _) = crate::test_utils::mouse_state(driver.cartridge());
    assert_eq!((x, y), (5, 2));

    driver.tick(16.0, &mut surface).unwrap();
    assert_eq!(driver.ticks(), 2);
}

#[test]
fn scenario_geometry_constant_across_lifetime() {
    let mut driver = load_test_driver();
    let mut surface = TestSurface::new();
    let geometry = driver.geometry();

    for i in 0..50 {
        driver.tick(f64::from(i) * 16.0, &mut surface).unwrap();
        assert_eq!(driver.geometry(), geometry);
        let (w, h, pixels) = surface.last_frame.clone().unwrap();
        assert_eq!((w, h), (geometry.width, geometry.height));
        assert_eq!(pixels.len(), geometry.byte_len());
    }
}

#[test]
fn scenario_driver_requires_geometry_exports() {
    // A cartridge without the display query exports cannot enter the loop.
    let engine = SandboxEngine::new().unwrap();
    let wasm = wat::parse_str(
        r#"
        (module
            (memory (export "memory") 1)
            (func (export "next_frame") (param f32))
        )
    "#,
    )
    .unwrap();
    let cartridge = load_cartridge(&engine, &wasm, MemoryPolicy::ModuleOwned).unwrap();
    let err = FrameDriver::new(cartridge).unwrap_err();
    assert!(matches!(err, HostError::Startup(_)));
}
