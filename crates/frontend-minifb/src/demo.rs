//! Stand-in engine for running the panel binary without the real simulator.
//!
//! Implements only the observable protocol surface: banked 128 KiB RAM with
//! the RAM-write poke, a framebuffer stream while in CPU-run, and a blinking
//! custom LED. There is no CPU emulation; in CPU-run mode the display simply
//! streams the 0xFF00 code page as raw bit rows, scrolled by a tick counter,
//! which is enough to watch code loads and DIP pokes land in memory.

use aletheia_core::engine::{Engine, FrameSink, MODE_CPU_RUN, MODE_OFF, MODE_RAM_WRITE};
use aletheia_core::{InstanceId, FRAME_BYTES, LOAD_ADDR};

/// 128 KiB per instance, two 64 KiB banks
const RAM_SIZE: usize = 0x20000;
/// System DIP bit selecting the upper bank
const BANK_BIT: u8 = 0b1000;

struct DemoInstance {
    ram: Vec<u8>,
    mode: u8,
    system: u8,
    addr: u8,
    data: u8,
    tick: u64,
}

impl DemoInstance {
    fn new() -> Self {
        DemoInstance {
            ram: vec![0; RAM_SIZE],
            mode: MODE_OFF,
            system: 0,
            addr: 0,
            data: 0,
            tick: 0,
        }
    }

    fn bank(&self) -> usize {
        if self.system & BANK_BIT != 0 {
            0x10000
        } else {
            0
        }
    }

    /// Stream the code page into a frame, scrolled by the tick counter.
    fn render(&self) -> Vec<u8> {
        let page = self.bank() | LOAD_ADDR as usize;
        let scroll = (self.tick / 4) as usize;
        (0..FRAME_BYTES)
            .map(|i| self.ram[page + (i + scroll) % 0x100])
            .collect()
    }
}

pub struct DemoEngine {
    instances: Vec<DemoInstance>,
}

impl DemoEngine {
    pub fn new(count: usize) -> Self {
        DemoEngine {
            instances: (0..count).map(|_| DemoInstance::new()).collect(),
        }
    }
}

impl Engine for DemoEngine {
    fn setup(&mut self) {
        for inst in &mut self.instances {
            *inst = DemoInstance::new();
        }
    }

    fn run_frame(&mut self, frames: &mut dyn FrameSink) {
        for (id, inst) in self.instances.iter_mut().enumerate() {
            match inst.mode {
                MODE_RAM_WRITE => {
                    let addr = inst.bank() | (LOAD_ADDR as usize | inst.addr as usize);
                    inst.ram[addr] = inst.data;
                }
                MODE_CPU_RUN => {
                    inst.tick += 1;
                    frames.push_framebuffer(id, &inst.render());
                }
                _ => {}
            }
        }
    }

    fn set_dips(&mut self, id: InstanceId, system: u8, addr: u8, data: u8) {
        if let Some(inst) = self.instances.get_mut(id) {
            inst.system = system;
            inst.addr = addr;
            inst.data = data;
        }
    }

    fn set_mode(&mut self, id: InstanceId, code: u8) {
        if let Some(inst) = self.instances.get_mut(id) {
            if inst.mode != MODE_CPU_RUN && code == MODE_CPU_RUN {
                inst.tick = 0; // reset, like the real engine resets its CPU
            }
            inst.mode = code;
        }
    }

    fn custom_led(&self, id: InstanceId) -> bool {
        match self.instances.get(id) {
            Some(inst) => inst.mode == MODE_CPU_RUN && (inst.tick >> 5) & 1 != 0,
            None => false,
        }
    }

    fn load_bytes(&mut self, id: InstanceId, addr: u16, bytes: &[u8]) {
        if let Some(inst) = self.instances.get_mut(id) {
            let bank = inst.bank();
            for (i, &b) in bytes.iter().enumerate() {
                inst.ram[bank | (addr as usize + i) & 0xFFFF] = b;
            }
        }
    }
}
