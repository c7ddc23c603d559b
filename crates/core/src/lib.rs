//! # aletheia-core
//!
//! Front-panel control core for the Aletheia multi-instance hardware
//! simulator: a bank of DIP switches, a three-position mode selector, status
//! LEDs, and a 20×4 character LCD for each of four independent device
//! instances.
//!
//! Instruction execution, memory, and display-buffer generation are performed
//! by an external engine behind the [`Engine`] trait. This crate translates
//! switch and mode state into the engine's input protocol, drives its loop,
//! and decodes the raw framebuffers it pushes back into pixel surfaces.
//!
//! ## Architecture
//!
//! - [`FrontPanel`] — owns the four instances, multiplexes selection and bulk
//!   apply actions, routes pushed framebuffers
//! - [`dips::DipBank`] — ordered switch groups with MSB-first encoding
//! - [`mode::ModeController`] — per-instance off/ramWrite/cpuRun state
//!   machine; ramWrite is a momentary pulse
//! - [`lcd`] — packed-framebuffer decode with inter-cell gap semantics
//! - [`engine`] — the narrow bridge to the external engine
//! - [`hex`] — free-text code-load input parsing

pub mod dips;
pub mod engine;
pub mod hex;
pub mod lcd;
pub mod mode;

pub use dips::{DipBank, DipGroup};
pub use engine::{Engine, FrameSink};
pub use lcd::Surface;
pub use mode::{Mode, ModeController};

/// Number of device instances, fixed at configuration time
pub const INSTANCES: usize = 4;

/// Character columns on the LCD
pub const LCD_COLS: usize = 20;
/// Character rows on the LCD
pub const LCD_ROWS: usize = 4;
/// Dots per character cell horizontally, including the gap column
pub const CELL_WIDTH: usize = 6;
/// Dots per character cell vertically, including the gap row
pub const CELL_HEIGHT: usize = 9;
/// Pixel grid width; the last gap column is reused as the grid edge
pub const PIXEL_WIDTH: usize = LCD_COLS * CELL_WIDTH - 1;
/// Pixel grid height; the last gap row is reused as the grid edge
pub const PIXEL_HEIGHT: usize = LCD_ROWS * CELL_HEIGHT - 1;
/// Packed bytes per pixel row
pub const ROW_BYTES: usize = (PIXEL_WIDTH + 7) / 8;
/// Packed bytes per full frame (15 × 35 = 525)
pub const FRAME_BYTES: usize = ROW_BYTES * PIXEL_HEIGHT;
/// Fixed target address for the code-load input
pub const LOAD_ADDR: u16 = 0xFF00;

/// Instance identifier, `0..INSTANCES`
pub type InstanceId = usize;

/// Per-instance LED snapshot, refreshed every frame and never cached stale.
/// `custom` is only meaningful while the instance is in CpuRun.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leds {
    pub cpu_run: bool,
    pub ram_write: bool,
    pub custom: bool,
}

/// Global panel controls shared by the bulk apply action. Instances read
/// these as a snapshot at apply time and never mutate them.
pub struct Controls {
    /// The "show instance" checkbox applied to selected instances
    pub show_instance: bool,
    /// The "load code" checkbox, cleared once per apply
    pub load_code: bool,
    /// Free-text hex byte pairs loaded at [`LOAD_ADDR`]
    pub code_input: String,
}

impl Default for Controls {
    fn default() -> Self {
        Controls {
            show_instance: true,
            load_code: false,
            code_input: String::new(),
        }
    }
}

/// One device instance. Created once at startup and never destroyed; state
/// persists while the instance is hidden.
pub struct Instance {
    pub id: InstanceId,
    pub dips: DipBank,
    pub mode: ModeController,
    pub leds: Leds,
    pub surface: Surface,
    pub visible: bool,
    /// The per-instance checkbox selecting it for bulk apply
    pub apply_selected: bool,
}

impl Instance {
    fn new(id: InstanceId) -> Self {
        Instance {
            id,
            dips: DipBank::new(),
            mode: ModeController::new(),
            leds: Leds::default(),
            surface: Surface::new(),
            visible: id == 0,
            apply_selected: id == 0,
        }
    }
}

/// The front panel: all instances plus the global controls.
///
/// Every mutation that the engine needs to know about goes through a method
/// taking the engine, so the "apply to external system" step is explicit
/// rather than a hidden side effect of state writes.
pub struct FrontPanel {
    instances: Vec<Instance>,
    pub controls: Controls,
}

impl FrontPanel {
    /// Initialize the engine and build `count` instances.
    ///
    /// `Engine::setup` runs before any instance exists, so no instance-level
    /// call can ever reach an uninitialized engine.
    pub fn new<E: Engine>(engine: &mut E, count: usize) -> Self {
        engine.setup();
        log::debug!("engine initialized, creating {} instances", count);
        FrontPanel {
            instances: (0..count).map(Instance::new).collect(),
            controls: Controls::default(),
        }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    /// Flip one DIP switch and push the instance's full switch state.
    ///
    /// The engine protocol takes a single atomic update with all three group
    /// values, so every toggle sends system, address, and data together even
    /// though only one group changed.
    pub fn toggle_dip<E: Engine>(
        &mut self,
        id: InstanceId,
        group: DipGroup,
        pos: usize,
        engine: &mut E,
    ) {
        let inst = match self.instances.get_mut(id) {
            Some(inst) => inst,
            None => return,
        };
        inst.dips.toggle(group, pos);
        engine.set_dips(
            id,
            inst.dips.encode(DipGroup::System),
            inst.dips.encode(DipGroup::Addr),
            inst.dips.encode(DipGroup::Data),
        );
    }

    /// Apply a mode selection, performing the transition's engine calls in
    /// order. Each mode change drives its own single loop step.
    pub fn select_mode<E: Engine>(&mut self, id: InstanceId, requested: Mode, engine: &mut E) {
        let ops = match self.instances.get_mut(id) {
            Some(inst) => inst.mode.select(requested),
            None => return,
        };
        for op in ops {
            match op {
                mode::EngineOp::SetMode(code) => engine.set_mode(id, code),
                mode::EngineOp::ClearSurface => {
                    if let Some(inst) = self.instances.get_mut(id) {
                        inst.surface.clear();
                    }
                }
                mode::EngineOp::RunLoop => engine.run_frame(self),
            }
        }
    }

    /// Set an instance's bulk-apply checkbox.
    pub fn set_apply_selected(&mut self, id: InstanceId, selected: bool) {
        if let Some(inst) = self.instances.get_mut(id) {
            inst.apply_selected = selected;
        }
    }

    /// The apply button: broadcast the current controls to every selected
    /// instance.
    ///
    /// The code input is parsed once and every selected instance receives the
    /// identical bytes at [`LOAD_ADDR`]. The load-code checkbox is cleared
    /// exactly once afterwards, whatever the selection count.
    pub fn apply_all<E: Engine>(&mut self, engine: &mut E) {
        let code = if self.controls.load_code {
            Some(hex::parse_bytes(&self.controls.code_input))
        } else {
            None
        };

        for inst in &mut self.instances {
            if !inst.apply_selected {
                continue;
            }
            inst.visible = self.controls.show_instance;
            if let Some(ref bytes) = code {
                engine.load_bytes(inst.id, LOAD_ADDR, bytes);
            }
        }

        self.controls.load_code = false;
    }

    /// One animation frame: a global engine loop step (during which the
    /// engine pushes frames into this panel), then the per-instance LED poll.
    pub fn run_frame<E: Engine>(&mut self, engine: &mut E) {
        engine.run_frame(self);
        self.refresh_leds(engine);
    }

    fn refresh_leds<E: Engine>(&mut self, engine: &E) {
        for inst in &mut self.instances {
            let mode = inst.mode.current();
            inst.leds.cpu_run = mode == Mode::CpuRun;
            inst.leds.ram_write = mode == Mode::RamWrite;
            inst.leds.custom = mode == Mode::CpuRun && engine.custom_led(inst.id);
        }
    }
}

impl FrameSink for FrontPanel {
    fn push_framebuffer(&mut self, id: InstanceId, fb: &[u8]) {
        let inst = match self.instances.get_mut(id) {
            Some(inst) => inst,
            None => {
                // Stale events around reconfiguration are expected
                log::trace!("frame for unknown instance {} dropped", id);
                return;
            }
        };
        if inst.mode.current() != Mode::CpuRun {
            return;
        }
        lcd::decode_and_paint(fb, &mut inst.surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Setup,
        RunFrame,
        SetDips(InstanceId, u8, u8, u8),
        SetMode(InstanceId, u8),
        LoadBytes(InstanceId, u16, Vec<u8>),
    }

    /// Records every protocol call; pushes queued frames on run_frame.
    struct MockEngine {
        calls: Vec<Call>,
        pending_frames: Vec<(InstanceId, Vec<u8>)>,
        led: bool,
        led_queries: Cell<u32>,
    }

    impl MockEngine {
        fn new() -> Self {
            MockEngine {
                calls: Vec::new(),
                pending_frames: Vec::new(),
                led: false,
                led_queries: Cell::new(0),
            }
        }
    }

    impl Engine for MockEngine {
        fn setup(&mut self) {
            self.calls.push(Call::Setup);
        }

        fn run_frame(&mut self, frames: &mut dyn FrameSink) {
            self.calls.push(Call::RunFrame);
            for (id, fb) in self.pending_frames.drain(..) {
                frames.push_framebuffer(id, &fb);
            }
        }

        fn set_dips(&mut self, id: InstanceId, system: u8, addr: u8, data: u8) {
            self.calls.push(Call::SetDips(id, system, addr, data));
        }

        fn set_mode(&mut self, id: InstanceId, code: u8) {
            self.calls.push(Call::SetMode(id, code));
        }

        fn custom_led(&self, _id: InstanceId) -> bool {
            self.led_queries.set(self.led_queries.get() + 1);
            self.led
        }

        fn load_bytes(&mut self, id: InstanceId, addr: u16, bytes: &[u8]) {
            self.calls.push(Call::LoadBytes(id, addr, bytes.to_vec()));
        }
    }

    #[test]
    fn test_setup_runs_before_instances_exist() {
        let mut engine = MockEngine::new();
        let panel = FrontPanel::new(&mut engine, INSTANCES);
        assert_eq!(engine.calls, vec![Call::Setup]);
        assert_eq!(panel.instances().len(), INSTANCES);
    }

    #[test]
    fn test_instance_zero_defaults() {
        let mut engine = MockEngine::new();
        let panel = FrontPanel::new(&mut engine, INSTANCES);
        for inst in panel.instances() {
            assert_eq!(inst.visible, inst.id == 0);
            assert_eq!(inst.apply_selected, inst.id == 0);
            assert_eq!(inst.mode.current(), Mode::Off);
            assert_eq!(inst.leds, Leds::default());
        }
    }

    #[test]
    fn test_toggle_pushes_all_three_groups() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.toggle_dip(1, DipGroup::Addr, 0, &mut engine);
        assert_eq!(engine.calls[1], Call::SetDips(1, 0, 0x80, 0));

        panel.toggle_dip(1, DipGroup::Data, 7, &mut engine);
        assert_eq!(engine.calls[2], Call::SetDips(1, 0, 0x80, 0x01));

        // Other instances untouched
        assert_eq!(panel.instance(0).unwrap().dips.encode(DipGroup::Addr), 0);
    }

    #[test]
    fn test_toggle_unknown_instance_is_noop() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);
        panel.toggle_dip(INSTANCES, DipGroup::Addr, 0, &mut engine);
        assert_eq!(engine.calls, vec![Call::Setup]);
    }

    #[test]
    fn test_ram_write_pulse_protocol() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.select_mode(2, Mode::RamWrite, &mut engine);
        assert_eq!(
            engine.calls,
            vec![
                Call::Setup,
                Call::SetMode(2, engine::MODE_RAM_WRITE),
                Call::RunFrame,
                Call::SetMode(2, engine::MODE_OFF),
            ]
        );
        // The control reads back off once the action completes
        assert_eq!(panel.instance(2).unwrap().mode.current(), Mode::Off);
    }

    #[test]
    fn test_each_mode_change_gets_its_own_loop_step() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.select_mode(0, Mode::CpuRun, &mut engine);
        panel.select_mode(1, Mode::CpuRun, &mut engine);
        let loops = engine.calls.iter().filter(|c| **c == Call::RunFrame).count();
        assert_eq!(loops, 2);
    }

    #[test]
    fn test_frame_decoded_only_in_cpu_run() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        // Instance 0 is off: the frame must not be painted
        engine.pending_frames.push((0, vec![0xFF; FRAME_BYTES]));
        panel.run_frame(&mut engine);
        assert!(!panel.instance(0).unwrap().surface.dot_lit(0, 0));
        assert_eq!(panel.instance(0).unwrap().surface.dot(0, 0), lcd::COLOR_BACKDROP);

        panel.select_mode(0, Mode::CpuRun, &mut engine);
        engine.pending_frames.push((0, vec![0xFF; FRAME_BYTES]));
        panel.run_frame(&mut engine);
        assert!(panel.instance(0).unwrap().surface.dot_lit(0, 0));
    }

    #[test]
    fn test_stale_frame_id_ignored() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);
        engine.pending_frames.push((7, vec![0xFF; FRAME_BYTES]));
        panel.run_frame(&mut engine); // must not panic
    }

    #[test]
    fn test_leaving_cpu_run_clears_surface() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.select_mode(0, Mode::CpuRun, &mut engine);
        engine.pending_frames.push((0, vec![0xFF; FRAME_BYTES]));
        panel.run_frame(&mut engine);
        assert!(panel.instance(0).unwrap().surface.dot_lit(0, 0));

        panel.select_mode(0, Mode::Off, &mut engine);
        assert_eq!(panel.instance(0).unwrap().surface.dot(0, 0), lcd::COLOR_BACKDROP);
    }

    #[test]
    fn test_bulk_apply_loads_each_selected_instance_once() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.set_apply_selected(2, true);
        panel.controls.load_code = true;
        panel.controls.code_input = "AA BB CC".into();
        panel.apply_all(&mut engine);

        let loads: Vec<&Call> = engine
            .calls
            .iter()
            .filter(|c| matches!(c, Call::LoadBytes(..)))
            .collect();
        assert_eq!(
            loads,
            vec![
                &Call::LoadBytes(0, LOAD_ADDR, vec![0xAA, 0xBB, 0xCC]),
                &Call::LoadBytes(2, LOAD_ADDR, vec![0xAA, 0xBB, 0xCC]),
            ]
        );
        assert!(!panel.controls.load_code);
    }

    #[test]
    fn test_load_toggle_cleared_even_with_nothing_selected() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.set_apply_selected(0, false);
        panel.controls.load_code = true;
        panel.apply_all(&mut engine);

        assert!(!engine.calls.iter().any(|c| matches!(c, Call::LoadBytes(..))));
        assert!(!panel.controls.load_code);
    }

    #[test]
    fn test_apply_without_load_only_sets_visibility() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.set_apply_selected(1, true);
        panel.controls.show_instance = false;
        panel.apply_all(&mut engine);

        assert!(!panel.instance(0).unwrap().visible);
        assert!(!panel.instance(1).unwrap().visible);
        // Unselected instances keep their visibility
        assert!(!panel.instance(2).unwrap().visible);
        assert!(!engine.calls.iter().any(|c| matches!(c, Call::LoadBytes(..))));

        panel.controls.show_instance = true;
        panel.apply_all(&mut engine);
        assert!(panel.instance(1).unwrap().visible);
    }

    #[test]
    fn test_empty_code_input_loads_zero_bytes() {
        let mut engine = MockEngine::new();
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.controls.load_code = true;
        panel.controls.code_input = "xyz".into();
        panel.apply_all(&mut engine);

        assert!(engine
            .calls
            .contains(&Call::LoadBytes(0, LOAD_ADDR, Vec::new())));
    }

    #[test]
    fn test_custom_led_polled_only_in_cpu_run() {
        let mut engine = MockEngine::new();
        engine.led = true;
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.run_frame(&mut engine);
        assert_eq!(engine.led_queries.get(), 0);
        assert!(!panel.instance(0).unwrap().leds.custom);

        panel.select_mode(0, Mode::CpuRun, &mut engine);
        panel.run_frame(&mut engine);
        assert_eq!(engine.led_queries.get(), 1);
        let leds = panel.instance(0).unwrap().leds;
        assert!(leds.custom);
        assert!(leds.cpu_run);
        assert!(!leds.ram_write);
    }

    #[test]
    fn test_led_snapshot_not_cached() {
        let mut engine = MockEngine::new();
        engine.led = true;
        let mut panel = FrontPanel::new(&mut engine, INSTANCES);

        panel.select_mode(0, Mode::CpuRun, &mut engine);
        panel.run_frame(&mut engine);
        assert!(panel.instance(0).unwrap().leds.custom);

        engine.led = false;
        panel.run_frame(&mut engine);
        assert!(!panel.instance(0).unwrap().leds.custom);
    }
}
