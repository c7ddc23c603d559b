//! The bridge to the external simulation engine.
//!
//! Instruction execution, memory, and display-buffer generation live outside
//! this crate; the panel only speaks the narrow protocol below. All calls are
//! synchronous and infallible: the engine runs in the same execution context
//! and the worst failure mode is a blank display, never an error.
//!
//! Rendered framebuffers travel the other way: during [`Engine::run_frame`]
//! the engine pushes zero or one frame per running instance into the
//! [`FrameSink`] it is handed. The sink is keyed by instance id and must
//! tolerate ids that no longer match a live instance, since the engine may
//! emit stale events around reconfiguration.

use crate::InstanceId;

/// Mode wire code: off (initial/resting)
pub const MODE_OFF: u8 = 0;
/// Mode wire code: momentary RAM write
pub const MODE_RAM_WRITE: u8 = 1;
/// Mode wire code: continuous CPU run
pub const MODE_CPU_RUN: u8 = 2;

/// Receiver for framebuffers pushed by the engine, keyed by instance id.
pub trait FrameSink {
    /// Accept one rendered frame for `id`. Unknown ids are ignored.
    fn push_framebuffer(&mut self, id: InstanceId, fb: &[u8]);
}

/// The engine's input protocol, as consumed by the panel.
pub trait Engine {
    /// One-time engine initialization. No instance-level call below may be
    /// issued before this returns.
    fn setup(&mut self);

    /// Advance one simulation tick for all instances (the engine's loop()
    /// entry point), pushing any rendered frames into `frames`.
    fn run_frame(&mut self, frames: &mut dyn FrameSink);

    /// Atomic update of all three DIP values for one instance. The protocol
    /// takes every group on each call even when only one changed.
    fn set_dips(&mut self, id: InstanceId, system: u8, addr: u8, data: u8);

    /// Switch an instance's mode; `code` is one of the `MODE_*` constants.
    fn set_mode(&mut self, id: InstanceId, code: u8);

    /// Real-time state of the instance's custom LED line.
    fn custom_led(&self, id: InstanceId) -> bool;

    /// Load `bytes` into instance memory starting at `addr`.
    fn load_bytes(&mut self, id: InstanceId, addr: u16, bytes: &[u8]);
}
