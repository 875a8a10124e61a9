// End-to-end tests driving the host through real Lua execution.

use std::fs;
use std::path::PathBuf;

use ember_vm::{Vm, VmConfig, VmError};

fn vm() -> Vm {
    Vm::new().expect("vm boots")
}

/// Run a chunk directly in the VM's Lua state.
fn eval(vm: &Vm, code: &str) {
    vm.lua().load(code).exec().expect("chunk runs");
}

fn eval_str(vm: &Vm, expr: &str) -> String {
    vm.lua()
        .load(&format!("return {}", expr))
        .eval()
        .expect("expression evaluates")
}

fn eval_f64(vm: &Vm, expr: &str) -> f64 {
    vm.lua()
        .load(&format!("return {}", expr))
        .eval()
        .expect("expression evaluates")
}

fn temp_cart(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("ember-test-{}-{}", std::process::id(), name));
    fs::write(&path, contents).expect("cart written");
    path
}

// ---------------------------------------------------------------------------
// Rendering through the script API
// ---------------------------------------------------------------------------

#[test]
fn test_cls_then_pset_writes_packed_framebuffer() {
    let vm = vm();
    eval(&vm, "cls(0) pset(64,64,7)");
    let con = vm.console().unwrap();
    assert_eq!(con.mem.peek(0x6000 + 0x1020), 0x07);
}

#[test]
fn test_numeric_strings_coerce_to_numbers() {
    let vm = vm();
    eval(&vm, "pset(\"10\", \"5\", \"9\")");
    assert_eq!(eval_f64(&vm, "pget(10, 5)"), 9.0);
}

#[test]
fn test_camera_translated_line() {
    let vm = vm();
    eval(&vm, "camera(10,0) line(10,0,13,0,5) camera()");
    for x in 0..4 {
        assert_eq!(eval_f64(&vm, &format!("pget({},0)", x)), 5.0);
    }
    assert_eq!(eval_f64(&vm, "pget(4,0)"), 0.0);
}

#[test]
fn test_clip_rejects_out_of_window_access() {
    let vm = vm();
    eval(&vm, "clip(20,20,10,10) pset(5,5,3)");
    assert_eq!(eval_f64(&vm, "pget(5,5)"), 0.0);
    assert_eq!(eval_f64(&vm, "pget(25,25)"), 0.0);
}

#[test]
fn test_sprite_flip_reverses_columns() {
    let vm = vm();
    eval(
        &vm,
        "for i=0,7 do sset(8+i, 0, i) end \
         palt(0, false) \
         spr(1, 0, 0, 1, 1, true, false)",
    );
    for i in 0..8 {
        assert_eq!(
            eval_f64(&vm, &format!("pget({},0)", i)),
            (7 - i) as f64,
            "column {}",
            i
        );
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[test]
fn test_poke4_peek4_round_trip_bits() {
    let vm = vm();
    eval(&vm, "poke4(0x4300, 0x1234.5678)");
    let con = vm.console().unwrap();
    assert_eq!(con.mem.peek4(0x4300).bits(), 0x12345678);
    drop(con);
    assert_eq!(eval_str(&vm, "tostr(peek4(0x4300), true)"), "0x1234.5678");
}

#[test]
fn test_poke_out_of_range_is_a_script_error() {
    let vm = vm();
    let err = vm.lua().load("poke(0x8000, 1)").exec().unwrap_err();
    assert!(
        err.to_string().contains("bad memory access"),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_memset_and_peek() {
    let vm = vm();
    eval(&vm, "memset(0x4300, 0xab, 4)");
    assert_eq!(eval_f64(&vm, "peek(0x4303)"), 0xab as f64);
    assert_eq!(eval_f64(&vm, "peek(0x4304)"), 0.0);
}

// ---------------------------------------------------------------------------
// tostr / tonum
// ---------------------------------------------------------------------------

#[test]
fn test_tostr_formats_by_type() {
    let vm = vm();
    assert_eq!(eval_str(&vm, "tostr(1.5)"), "1.5");
    assert_eq!(eval_str(&vm, "tostr(2)"), "2");
    assert_eq!(eval_str(&vm, "tostr()"), "[no value]");
    assert_eq!(eval_str(&vm, "tostr(nil)"), "[nil]");
    assert_eq!(eval_str(&vm, "tostr(\"abc\")"), "abc");
    assert_eq!(eval_str(&vm, "tostr({})"), "[table]");
    assert_eq!(eval_str(&vm, "tostr(tostr)"), "[function]");
    assert_eq!(eval_str(&vm, "tostr(true)"), "true");
    assert_eq!(eval_str(&vm, "tostr(1.5, true)"), "0x0001.8000");
}

#[test]
fn test_tonum_parses_numbers_and_strings() {
    let vm = vm();
    assert_eq!(eval_f64(&vm, "tonum(\"1.5\")"), 1.5);
    assert_eq!(eval_f64(&vm, "tonum(\"0x12\")"), 18.0);
    assert_eq!(eval_f64(&vm, "tonum(7)"), 7.0);
    assert!(eval_str(&vm, "tostr(tonum(\"zebra\"))") == "[nil]");
}

// ---------------------------------------------------------------------------
// Math
// ---------------------------------------------------------------------------

#[test]
fn test_fixed_point_math_surface() {
    let vm = vm();
    assert_eq!(eval_f64(&vm, "flr(-1.5)"), -2.0);
    assert_eq!(eval_f64(&vm, "ceil(-1.5)"), -1.0);
    assert_eq!(eval_f64(&vm, "mid(9, 1, 2)"), 2.0);
    assert_eq!(eval_f64(&vm, "sgn(0)"), 1.0);
    assert_eq!(eval_f64(&vm, "abs(-3.25)"), 3.25);
    assert_eq!(eval_f64(&vm, "band(0x0f, 0x3c)"), 12.0);
    assert_eq!(eval_f64(&vm, "bor(0x01, 0x10)"), 17.0);
    assert_eq!(eval_f64(&vm, "shl(1, 4)"), 16.0);
    assert_eq!(eval_f64(&vm, "shr(16, 4)"), 1.0);
    assert_eq!(eval_f64(&vm, "cos(0)"), 1.0);
    assert_eq!(eval_f64(&vm, "sin(0.25)"), -1.0);
    assert_eq!(eval_f64(&vm, "atan2(1, 0)"), 0.0);
    assert_eq!(eval_f64(&vm, "atan2(0, -1)"), 0.25);
    assert_eq!(eval_f64(&vm, "sqrt(4)"), 2.0);
    assert_eq!(eval_f64(&vm, "sqrt(-1)"), 0.0);
}

#[test]
fn test_rnd_range_and_srand() {
    let vm = vm();
    for _ in 0..20 {
        let v = eval_f64(&vm, "rnd(10)");
        assert!((0.0..10.0).contains(&v));
    }
    eval(&vm, "srand(7) a = rnd(100) srand(7) b = rnd(100)");
    assert_eq!(eval_f64(&vm, "a"), eval_f64(&vm, "b"));
}

// ---------------------------------------------------------------------------
// Cart lifecycle
// ---------------------------------------------------------------------------

const FRAME_CART: &str = "\
pico-8 cartridge // ember test
version 8
__lua__
function _init()
 poke(0x4300, 1)
end
function _update()
 poke(0x4301, peek(0x4301) + 1)
end
function _draw()
 cls(0)
 pset(64, 64, 7)
end
";

#[test]
fn test_load_run_step_drives_frame_loop() {
    let path = temp_cart("frame.p8", FRAME_CART);
    let mut vm = vm();
    vm.load(&path).expect("cart loads");
    vm.run().expect("cart starts");

    vm.step(1.0 / 30.0).expect("first frame");
    {
        let con = vm.console().unwrap();
        assert_eq!(con.mem.peek(0x4300), 1, "_init ran once");
        assert_eq!(con.mem.peek(0x4301), 1, "_update ran once");
        assert_eq!(con.mem.peek(0x6000 + 0x1020), 0x07, "_draw painted");
    }

    vm.step(1.0 / 30.0).expect("second frame");
    let con = vm.console().unwrap();
    assert_eq!(con.mem.peek(0x4300), 1, "_init does not run again");
    assert_eq!(con.mem.peek(0x4301), 2, "_update runs every frame");

    fs::remove_file(path).ok();
}

#[test]
fn test_dialect_sugar_runs_after_fixup() {
    let cart = "\
version 8
__lua__
n = 0
function _update()
 if (btn(0)) n += 1
end
function _draw()
 poke(0x4310, n)
end
";
    let path = temp_cart("sugar.p8", cart);
    let mut vm = vm();
    vm.load(&path).expect("cart loads");
    vm.run().expect("cart starts");

    vm.button(0, true).unwrap();
    vm.step(0.0).unwrap();
    vm.step(0.0).unwrap();
    let con = vm.console().unwrap();
    assert_eq!(con.mem.peek(0x4310), 2, "+= and short if both fixed up");

    fs::remove_file(path).ok();
}

#[test]
fn test_failed_load_keeps_previous_cart() {
    let path = temp_cart("keep.p8", FRAME_CART);
    let mut vm = vm();
    vm.load(&path).expect("cart loads");

    let missing = std::env::temp_dir().join("ember-test-definitely-missing.p8");
    assert!(matches!(vm.load(&missing), Err(VmError::Io(_))));
    assert!(vm.console().unwrap().cart.is_some(), "old cart still loaded");

    fs::remove_file(path).ok();
}

#[test]
fn test_reload_restores_rom_after_sset() {
    let cart = "\
version 8
__lua__
__gfx__
77
";
    let path = temp_cart("reload.p8", cart);
    let mut vm = vm();
    vm.load(&path).unwrap();
    vm.run().unwrap();
    vm.step(0.0).unwrap();

    eval(&vm, "sset(0, 0, 3) reload()");
    assert_eq!(eval_f64(&vm, "sget(0, 0)"), 7.0, "reload restores the sheet");

    fs::remove_file(path).ok();
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[test]
fn test_btn_and_btnp_edges_across_frames() {
    let cart = "\
version 8
__lua__
function _update()
 poke(0x4320, btn(0) and 1 or 0)
 poke(0x4321, btnp(0) and 1 or 0)
end
";
    let path = temp_cart("input.p8", cart);
    let mut vm = vm();
    vm.load(&path).unwrap();
    vm.run().unwrap();

    vm.button(0, true).unwrap();
    vm.step(0.0).unwrap();
    {
        let con = vm.console().unwrap();
        assert_eq!(con.mem.peek(0x4320), 1);
        assert_eq!(con.mem.peek(0x4321), 1, "frame 1 is a fresh press");
    }

    vm.step(0.0).unwrap();
    {
        let con = vm.console().unwrap();
        assert_eq!(con.mem.peek(0x4320), 1, "still held");
        assert_eq!(con.mem.peek(0x4321), 0, "no repeat yet");
    }

    // Frames 3..16: the first auto-repeat lands on frame 16.
    for _ in 0..13 {
        vm.step(0.0).unwrap();
    }
    assert_eq!(vm.console().unwrap().mem.peek(0x4321), 0, "frame 15");
    vm.step(0.0).unwrap();
    assert_eq!(vm.console().unwrap().mem.peek(0x4321), 1, "frame 16 repeats");
    vm.step(0.0).unwrap();
    assert_eq!(vm.console().unwrap().mem.peek(0x4321), 0, "frame 17");

    fs::remove_file(path).ok();
}

#[test]
fn test_btn_bitfield_without_arguments() {
    let vm = vm();
    {
        let mut con = vm.console_mut().unwrap();
        con.buttons.set(0, true);
        con.buttons.set(5, true);
        con.buttons.update();
    }
    assert_eq!(eval_f64(&vm, "btn()"), (1 + 32) as f64);
}

// ---------------------------------------------------------------------------
// stat
// ---------------------------------------------------------------------------

#[test]
fn test_stat_memory_usage_is_positive() {
    let vm = vm();
    assert!(eval_f64(&vm, "stat(0)") > 0.0);
}

#[test]
fn test_stat_channels_report_sfx() {
    let vm = vm();
    assert_eq!(eval_f64(&vm, "stat(16)"), -1.0, "channel 0 idle");
    eval(&vm, "sfx(12, 2)");
    assert_eq!(eval_f64(&vm, "stat(18)"), 12.0);
    eval(&vm, "sfx(-1, 2)");
    assert_eq!(eval_f64(&vm, "stat(18)"), -1.0);
}

#[test]
fn test_stat_mouse_is_gated_by_memory_flag() {
    let mut vm = vm();
    vm.mouse(40, 60, 1).unwrap();
    assert_eq!(eval_f64(&vm, "stat(32)"), 0.0, "devkit flag off");
    eval(&vm, "poke(0x5f2d, 1)");
    assert_eq!(eval_f64(&vm, "stat(32)"), 40.0);
    assert_eq!(eval_f64(&vm, "stat(33)"), 60.0);
    assert_eq!(eval_f64(&vm, "stat(34)"), 1.0);
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[test]
fn test_runaway_update_yields_at_instruction_budget() {
    let cart = "\
version 8
__lua__
function _update()
 while true do end
end
";
    let path = temp_cart("runaway.p8", cart);
    let mut vm = Vm::with_config(VmConfig {
        hook_period: 100,
        instruction_budget: 10_000,
    })
    .expect("vm boots");
    vm.load(&path).unwrap();
    vm.run().unwrap();

    // Each step suspends at the budget instead of hanging.
    vm.step(0.0).expect("first step returns");
    vm.step(0.0).expect("second step returns");

    fs::remove_file(path).ok();
}

#[test]
fn test_script_error_surfaces_from_step() {
    let cart = "\
version 8
__lua__
function _update()
 error(\"boom\")
end
";
    let path = temp_cart("boom.p8", cart);
    let mut vm = vm();
    vm.load(&path).unwrap();
    vm.run().unwrap();
    let err = vm.step(0.0).unwrap_err();
    assert!(err.to_string().contains("boom"), "got: {}", err);

    fs::remove_file(path).ok();
}

// ---------------------------------------------------------------------------
// Screen access
// ---------------------------------------------------------------------------

#[test]
fn test_screen_copy_and_rgba_conversion() {
    let vm = vm();
    eval(&vm, "cls(8)");
    let mut raw = [0u8; 0x2000];
    vm.screen(&mut raw).unwrap();
    assert!(raw.iter().all(|&b| b == 0x88));

    let mut rgba = vec![0u8; 128 * 128 * 4];
    vm.screen_rgba(&mut rgba).unwrap();
    assert_eq!(&rgba[0..4], &[255, 0, 77, 255], "color 8 is red");
}
