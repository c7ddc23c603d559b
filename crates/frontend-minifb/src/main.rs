//! Aletheia front panel v0.2.0.
//!
//! Desktop rendering of the four-instance front panel: each instance shows
//! its decoded character LCD, three status LEDs, the DIP switch state, and
//! its bulk-apply selection. One instance is keyboard-focused at a time.
//!
//! Two execution modes:
//!
//! - **GUI mode** (default): 2×2 instance grid in a minifb window.
//! - **Headless mode** (`--headless`): drive instance 0 for N frames and
//!   print the decoded LCD as half-block ASCII.
//!
//! The binary links the stand-in [`demo::DemoEngine`]; the real simulator
//! engine drops in behind the same `Engine` trait.

mod demo;

use aletheia_core::lcd::{SURFACE_HEIGHT, SURFACE_WIDTH};
use aletheia_core::{
    dips::{ADDR_LEN, DATA_LEN, SYSTEM_DIP_NAMES, SYSTEM_LEN},
    DipGroup, FrontPanel, Mode, INSTANCES, PIXEL_HEIGHT, PIXEL_WIDTH,
};
use demo::DemoEngine;
use minifb::{Key, KeyRepeat, Scale, ScaleMode, Window, WindowOptions};
use std::env;
use std::fs;
use std::time::Instant;

/// Grid geometry
const GRID_COLS: usize = 2;
const GRID_ROWS: usize = 2;
const MARGIN: usize = 10;
/// LED/DIP status bar below the LCD
const BAR_HEIGHT: usize = 12;
const PANEL_WIDTH: usize = SURFACE_WIDTH + 2 * MARGIN;
const PANEL_HEIGHT: usize = MARGIN + SURFACE_HEIGHT + 8 + BAR_HEIGHT + MARGIN;
const WIN_WIDTH: usize = PANEL_WIDTH * GRID_COLS;
const WIN_HEIGHT: usize = PANEL_HEIGHT * GRID_ROWS;

/// Chrome colors
const COLOR_CHROME: u32 = 0x1E2025;
const COLOR_PANEL: u32 = 0x34373E;
const COLOR_PANEL_HIDDEN: u32 = 0x26282D;
const COLOR_FOCUS: u32 = 0xD8B44A;
const COLOR_LED_OFF: u32 = 0x44464C;
const COLOR_LED_RUN: u32 = 0x3FC95C;
const COLOR_LED_WRITE: u32 = 0xE0A63C;
const COLOR_LED_CUSTOM: u32 = 0xE05548;
const COLOR_DIP_ON: u32 = 0xE8E6DE;
const COLOR_DIP_OFF: u32 = 0x55575E;
const COLOR_APPLY_MARK: u32 = 0x6FA8DC;

const SYSTEM_KEYS: [Key; SYSTEM_LEN] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4];
const ADDR_KEYS: [Key; ADDR_LEN] = [
    Key::Q,
    Key::W,
    Key::E,
    Key::R,
    Key::T,
    Key::Y,
    Key::U,
    Key::I,
];
const DATA_KEYS: [Key; DATA_LEN] = [
    Key::A,
    Key::S,
    Key::D,
    Key::F,
    Key::G,
    Key::H,
    Key::J,
    Key::K,
];

fn usage(prog: &str) {
    eprintln!("Aletheia Front Panel v0.2.0 - Rust");
    eprintln!("Usage: {} [options]", prog);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --code <file>        Preload hex byte pairs into the code field and apply");
    eprintln!("  --headless           Run without GUI and print the LCD as ASCII");
    eprintln!("  --frames N           Headless frame count (default 240)");
    eprintln!("  --debug              Show per-run diagnostics");
    eprintln!("  --help               This text");
    eprintln!();
    eprintln!("GUI keys: Tab=Focus next instance  1-4=System DIPs");
    eprintln!("          (system: {})", SYSTEM_DIP_NAMES.join(" / "));
    eprintln!("          Q..I=Address DIPs  A..K=Data DIPs");
    eprintln!("          Z=Off X=RAM write C=CPU run");
    eprintln!("          P=Apply checkbox  V=Show instance  L=Load code  Enter=Apply");
    eprintln!("          F2=Screenshot  Esc=Quit");
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage(&args[0]);
        std::process::exit(1);
    }

    let headless = args.iter().any(|a| a == "--headless");
    let debug = args.iter().any(|a| a == "--debug");
    let frames: usize = args
        .iter()
        .position(|a| a == "--frames")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(240);
    let code_path: Option<&String> = args
        .iter()
        .position(|a| a == "--code")
        .and_then(|i| args.get(i + 1));

    let mut engine = DemoEngine::new(INSTANCES);
    let mut panel = FrontPanel::new(&mut engine, INSTANCES);

    if let Some(path) = code_path {
        let text = fs::read_to_string(path).expect("Failed to read code file");
        if debug {
            println!("Code field: {} ({} bytes of text)", path, text.len());
        }
        panel.controls.code_input = text;
        panel.controls.load_code = true;
        panel.apply_all(&mut engine);
    }

    if headless {
        run_headless(&mut panel, &mut engine, frames, debug);
    } else {
        run_gui(&mut panel, &mut engine, debug);
    }
}

// ─── GUI Mode ───────────────────────────────────────────────────────────────

fn run_gui(panel: &mut FrontPanel, engine: &mut DemoEngine, debug: bool) {
    let mut window = Window::new(
        "Aletheia Front Panel v0.2.0",
        WIN_WIDTH,
        WIN_HEIGHT,
        WindowOptions {
            scale: Scale::X1,
            scale_mode: ScaleMode::AspectRatioStretch,
            resize: true,
            ..Default::default()
        },
    )
    .expect("Failed to create window");
    window.set_target_fps(60);

    let mut focused: usize = 0;
    let mut buf = vec![COLOR_CHROME; WIN_WIDTH * WIN_HEIGHT];
    let mut frame_count: u64 = 0;
    let mut fps_frames: u64 = 0;
    let mut last_fps_time = Instant::now();
    let mut fps = 0.0f64;
    let mut last_title = String::new();
    let mut screenshot_n = 0u32;
    let start_time = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::Tab, KeyRepeat::No) {
            focused = (focused + 1) % panel.instances().len();
        }

        for (pos, key) in SYSTEM_KEYS.iter().enumerate() {
            if window.is_key_pressed(*key, KeyRepeat::No) {
                panel.toggle_dip(focused, DipGroup::System, pos, engine);
            }
        }
        for (pos, key) in ADDR_KEYS.iter().enumerate() {
            if window.is_key_pressed(*key, KeyRepeat::No) {
                panel.toggle_dip(focused, DipGroup::Addr, pos, engine);
            }
        }
        for (pos, key) in DATA_KEYS.iter().enumerate() {
            if window.is_key_pressed(*key, KeyRepeat::No) {
                panel.toggle_dip(focused, DipGroup::Data, pos, engine);
            }
        }

        if window.is_key_pressed(Key::Z, KeyRepeat::No) {
            panel.select_mode(focused, Mode::Off, engine);
        }
        if window.is_key_pressed(Key::X, KeyRepeat::No) {
            panel.select_mode(focused, Mode::RamWrite, engine);
        }
        if window.is_key_pressed(Key::C, KeyRepeat::No) {
            panel.select_mode(focused, Mode::CpuRun, engine);
        }

        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            let selected = panel
                .instance(focused)
                .map(|inst| inst.apply_selected)
                .unwrap_or(false);
            panel.set_apply_selected(focused, !selected);
        }
        if window.is_key_pressed(Key::V, KeyRepeat::No) {
            panel.controls.show_instance = !panel.controls.show_instance;
        }
        if window.is_key_pressed(Key::L, KeyRepeat::No) {
            panel.controls.load_code = !panel.controls.load_code;
        }
        if window.is_key_pressed(Key::Enter, KeyRepeat::No) {
            panel.apply_all(engine);
        }

        panel.run_frame(engine);
        frame_count += 1;
        fps_frames += 1;

        compose(panel, focused, &mut buf);
        window
            .update_with_buffer(&buf, WIN_WIDTH, WIN_HEIGHT)
            .expect("update");

        if window.is_key_pressed(Key::F2, KeyRepeat::No) {
            let name = format!("panel_{:04}.bmp", screenshot_n);
            match save_screenshot(&buf, &name) {
                Ok(()) => {
                    eprintln!("Screenshot: {}", name);
                    screenshot_n += 1;
                }
                Err(e) => eprintln!("Screenshot error: {}", e),
            }
        }

        if last_fps_time.elapsed().as_secs_f64() >= 2.0 {
            fps = fps_frames as f64 / last_fps_time.elapsed().as_secs_f64();
            fps_frames = 0;
            last_fps_time = Instant::now();
        }
        let title = status_title(panel, focused, fps);
        if title != last_title {
            window.set_title(&title);
            last_title = title;
        }
    }

    if debug {
        let e = start_time.elapsed().as_secs_f64();
        println!(
            "{} frames in {:.1}s ({:.1} FPS)",
            frame_count,
            e,
            frame_count as f64 / e
        );
    }
}

fn status_title(panel: &FrontPanel, focused: usize, fps: f64) -> String {
    let inst = match panel.instance(focused) {
        Some(inst) => inst,
        None => return "Aletheia Front Panel".into(),
    };
    let mode = match inst.mode.current() {
        Mode::Off => "off",
        Mode::RamWrite => "ramWrite",
        Mode::CpuRun => "cpuRun",
    };
    format!(
        "Aletheia {} - inst {} [{}] sys={:X} addr={:02X} data={:02X}{}{} - {:.0} FPS",
        env!("CARGO_PKG_VERSION"),
        focused,
        mode,
        inst.dips.encode(DipGroup::System),
        inst.dips.encode(DipGroup::Addr),
        inst.dips.encode(DipGroup::Data),
        if panel.controls.show_instance { "" } else { " [hide]" },
        if panel.controls.load_code { " [load]" } else { "" },
        fps,
    )
}

// ─── Compositing ────────────────────────────────────────────────────────────

fn fill_rect(buf: &mut [u32], x: usize, y: usize, w: usize, h: usize, color: u32) {
    for row in y..(y + h).min(WIN_HEIGHT) {
        let base = row * WIN_WIDTH;
        for col in x..(x + w).min(WIN_WIDTH) {
            buf[base + col] = color;
        }
    }
}

fn frame_rect(buf: &mut [u32], x: usize, y: usize, w: usize, h: usize, color: u32) {
    fill_rect(buf, x, y, w, 2, color);
    fill_rect(buf, x, y + h - 2, w, 2, color);
    fill_rect(buf, x, y, 2, h, color);
    fill_rect(buf, x + w - 2, y, 2, h, color);
}

fn compose(panel: &FrontPanel, focused: usize, buf: &mut [u32]) {
    buf.fill(COLOR_CHROME);

    for inst in panel.instances() {
        let px = (inst.id % GRID_COLS) * PANEL_WIDTH;
        let py = (inst.id / GRID_COLS) * PANEL_HEIGHT;

        let bg = if inst.visible { COLOR_PANEL } else { COLOR_PANEL_HIDDEN };
        fill_rect(buf, px + 2, py + 2, PANEL_WIDTH - 4, PANEL_HEIGHT - 4, bg);

        if inst.visible {
            // LCD surface blit
            for y in 0..SURFACE_HEIGHT {
                let src = y * SURFACE_WIDTH;
                let dst = (py + MARGIN + y) * WIN_WIDTH + px + MARGIN;
                buf[dst..dst + SURFACE_WIDTH]
                    .copy_from_slice(&inst.surface.pixels[src..src + SURFACE_WIDTH]);
            }

            let bar_y = py + MARGIN + SURFACE_HEIGHT + 8;
            let leds = [
                (inst.leds.cpu_run, COLOR_LED_RUN),
                (inst.leds.ram_write, COLOR_LED_WRITE),
                (inst.leds.custom, COLOR_LED_CUSTOM),
            ];
            for (i, (on, color)) in leds.iter().enumerate() {
                let c = if *on { *color } else { COLOR_LED_OFF };
                fill_rect(buf, px + MARGIN + i * 18, bar_y, BAR_HEIGHT, BAR_HEIGHT, c);
            }

            // DIP state, grouped system / address / data
            let mut dip_x = px + MARGIN + 70;
            for (group, len) in [
                (DipGroup::System, SYSTEM_LEN),
                (DipGroup::Addr, ADDR_LEN),
                (DipGroup::Data, DATA_LEN),
            ] {
                for pos in 0..len {
                    let c = if inst.dips.get(group, pos) {
                        COLOR_DIP_ON
                    } else {
                        COLOR_DIP_OFF
                    };
                    fill_rect(buf, dip_x, bar_y + 2, 8, 8, c);
                    dip_x += 10;
                }
                dip_x += 8;
            }

            if inst.apply_selected {
                let mark_x = px + PANEL_WIDTH - MARGIN - BAR_HEIGHT;
                fill_rect(buf, mark_x, bar_y, BAR_HEIGHT, BAR_HEIGHT, COLOR_APPLY_MARK);
            }
        }

        if inst.id == focused {
            frame_rect(buf, px + 2, py + 2, PANEL_WIDTH - 4, PANEL_HEIGHT - 4, COLOR_FOCUS);
        }
    }
}

// ─── Screenshot (BMP) ───────────────────────────────────────────────────────

fn save_screenshot(buf: &[u32], path: &str) -> Result<(), String> {
    let w = WIN_WIDTH as u32;
    let h = WIN_HEIGHT as u32;
    let row_size = (w * 3 + 3) & !3;
    let pixel_data_size = row_size * h;
    let file_size = 54 + pixel_data_size;
    let mut data = Vec::with_capacity(file_size as usize);
    // BMP header
    data.extend_from_slice(b"BM");
    data.extend_from_slice(&file_size.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&54u32.to_le_bytes());
    // DIB header
    data.extend_from_slice(&40u32.to_le_bytes());
    data.extend_from_slice(&w.to_le_bytes());
    data.extend_from_slice(&h.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&24u16.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&pixel_data_size.to_le_bytes());
    data.extend_from_slice(&2835u32.to_le_bytes());
    data.extend_from_slice(&2835u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    // Pixel data (bottom-up BGR)
    for y in (0..h as usize).rev() {
        let mut row_bytes = 0u32;
        for x in 0..w as usize {
            let px = buf[y * WIN_WIDTH + x];
            data.push((px & 0xFF) as u8);
            data.push(((px >> 8) & 0xFF) as u8);
            data.push(((px >> 16) & 0xFF) as u8);
            row_bytes += 3;
        }
        while row_bytes % 4 != 0 {
            data.push(0);
            row_bytes += 1;
        }
    }
    fs::write(path, &data).map_err(|e| format!("{}: {}", path, e))
}

// ─── Headless Mode ──────────────────────────────────────────────────────────

fn run_headless(panel: &mut FrontPanel, engine: &mut DemoEngine, frames: usize, debug: bool) {
    panel.select_mode(0, Mode::CpuRun, engine);
    if debug {
        println!("Running {} frames...", frames);
    }
    for frame in 0..frames {
        panel.run_frame(engine);
        if debug && (frame < 5 || frame == frames - 1) {
            let inst = panel.instance(0).unwrap();
            println!(
                "  Frame {:3}: leds run={} custom={}",
                frame + 1,
                inst.leds.cpu_run,
                inst.leds.custom
            );
        }
    }
    print_display(panel, 0);
}

/// Print one instance's dot matrix as half-block ASCII, two dot rows per line.
fn print_display(panel: &FrontPanel, id: usize) {
    let inst = match panel.instance(id) {
        Some(inst) => inst,
        None => return,
    };
    let lit = (0..PIXEL_HEIGHT)
        .flat_map(|y| (0..PIXEL_WIDTH).map(move |x| (x, y)))
        .filter(|&(x, y)| inst.surface.dot_lit(x, y))
        .count();
    println!("  ({} dots lit)", lit);
    for y in (0..PIXEL_HEIGHT).step_by(2) {
        let mut l = String::with_capacity(PIXEL_WIDTH + 4);
        l.push_str("  |");
        for x in 0..PIXEL_WIDTH {
            let t = inst.surface.dot_lit(x, y);
            let b = y + 1 < PIXEL_HEIGHT && inst.surface.dot_lit(x, y + 1);
            l.push(match (t, b) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                _ => ' ',
            });
        }
        l.push('|');
        println!("{}", l);
    }
}
