//! Per-instance mode state machine.
//!
//! The mode selector is a three-position control: off, RAM write, CPU run.
//! RAM write is momentary. Selecting it pulses the engine once and the
//! control snaps back to off within the same action, so no render tick ever
//! observes it as the selected mode.
//!
//! A transition does not talk to the engine directly; it returns the ordered
//! list of [`EngineOp`]s the owner must perform. This keeps the two-call
//! momentary protocol in one place instead of spread across event handlers.

use crate::engine::{MODE_CPU_RUN, MODE_OFF, MODE_RAM_WRITE};

/// Mode selector positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Off,
    RamWrite,
    CpuRun,
}

impl Mode {
    /// Engine wire code for this mode
    pub fn code(self) -> u8 {
        match self {
            Mode::Off => MODE_OFF,
            Mode::RamWrite => MODE_RAM_WRITE,
            Mode::CpuRun => MODE_CPU_RUN,
        }
    }
}

/// One engine-facing step of a mode transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOp {
    /// `set_mode(id, code)`
    SetMode(u8),
    /// Invalidate the instance's display surface
    ClearSurface,
    /// One engine loop step
    RunLoop,
}

/// Mode state for one instance. Off is the initial and resting state.
pub struct ModeController {
    current: Mode,
}

impl ModeController {
    pub fn new() -> Self {
        ModeController { current: Mode::Off }
    }

    /// The mode the UI control currently reads back.
    pub fn current(&self) -> Mode {
        self.current
    }

    /// Apply a user selection and return the engine calls to perform.
    ///
    /// Re-selecting the current mode is a no-op (a radio group only fires on
    /// change). Every accepted transition is one `SetMode` plus one `RunLoop`;
    /// crossing the CpuRun boundary in either direction inserts a
    /// `ClearSurface` ahead of the loop step so the engine resumes painting
    /// onto a blank surface. A RamWrite selection reverts to Off before this
    /// returns and appends the second `SetMode(off)` of the pulse.
    pub fn select(&mut self, requested: Mode) -> Vec<EngineOp> {
        if requested == self.current {
            return Vec::new();
        }

        let crossing_run = self.current == Mode::CpuRun || requested == Mode::CpuRun;
        self.current = requested;

        let mut ops = vec![EngineOp::SetMode(requested.code())];
        if crossing_run {
            ops.push(EngineOp::ClearSurface);
        }
        ops.push(EngineOp::RunLoop);

        if requested == Mode::RamWrite {
            log::debug!("ram-write pulse, reverting to off");
            self.current = Mode::Off;
            ops.push(EngineOp::SetMode(MODE_OFF));
        }

        ops
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_off() {
        let ctl = ModeController::new();
        assert_eq!(ctl.current(), Mode::Off);
    }

    #[test]
    fn test_off_to_cpu_run() {
        let mut ctl = ModeController::new();
        let ops = ctl.select(Mode::CpuRun);
        assert_eq!(
            ops,
            vec![
                EngineOp::SetMode(MODE_CPU_RUN),
                EngineOp::ClearSurface,
                EngineOp::RunLoop,
            ]
        );
        assert_eq!(ctl.current(), Mode::CpuRun);
    }

    #[test]
    fn test_ram_write_is_momentary() {
        let mut ctl = ModeController::new();
        let ops = ctl.select(Mode::RamWrite);
        // Two set_mode calls, ramWrite then off, with one loop in between.
        assert_eq!(
            ops,
            vec![
                EngineOp::SetMode(MODE_RAM_WRITE),
                EngineOp::RunLoop,
                EngineOp::SetMode(MODE_OFF),
            ]
        );
        assert_eq!(ctl.current(), Mode::Off);
    }

    #[test]
    fn test_ram_write_repeats_after_revert() {
        let mut ctl = ModeController::new();
        ctl.select(Mode::RamWrite);
        // The control reads off again, so a second pulse is a fresh change.
        let ops = ctl.select(Mode::RamWrite);
        assert_eq!(ops.len(), 3);
        assert_eq!(ctl.current(), Mode::Off);
    }

    #[test]
    fn test_cpu_run_to_ram_write_clears_surface() {
        let mut ctl = ModeController::new();
        ctl.select(Mode::CpuRun);
        let ops = ctl.select(Mode::RamWrite);
        assert_eq!(
            ops,
            vec![
                EngineOp::SetMode(MODE_RAM_WRITE),
                EngineOp::ClearSurface,
                EngineOp::RunLoop,
                EngineOp::SetMode(MODE_OFF),
            ]
        );
        assert_eq!(ctl.current(), Mode::Off);
    }

    #[test]
    fn test_cpu_run_to_off_clears_surface() {
        let mut ctl = ModeController::new();
        ctl.select(Mode::CpuRun);
        let ops = ctl.select(Mode::Off);
        assert!(ops.contains(&EngineOp::ClearSurface));
        assert_eq!(ctl.current(), Mode::Off);
    }

    #[test]
    fn test_reselect_current_is_noop() {
        let mut ctl = ModeController::new();
        assert!(ctl.select(Mode::Off).is_empty());
        ctl.select(Mode::CpuRun);
        assert!(ctl.select(Mode::CpuRun).is_empty());
    }

    #[test]
    fn test_off_pulse_has_no_clear() {
        let mut ctl = ModeController::new();
        // off -> ramWrite never touches CpuRun, so the surface is kept.
        let ops = ctl.select(Mode::RamWrite);
        assert!(!ops.contains(&EngineOp::ClearSurface));
    }
}
