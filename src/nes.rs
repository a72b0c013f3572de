//! Whole-system driver: owns the CPU (which owns the bus) and paces the
//! CPU/PPU interleave frame by frame.
//!
//! The bus stays purely combinational; all clocking lives here. Each frame is
//! 341x261 PPU dots (one fewer on odd frames), and the CPU is stepped
//! whenever it falls behind the region's PPU-per-CPU clock ratio.

use std::path::Path;

use crate::bus::NesBus;
use crate::cartridge::cartridge::{Cartridge, CartridgeError};
use crate::cpu::cpu::CPU;
use crate::ppu::ppu::{DOTS_PER_SCANLINE, Region, SCANLINES_PER_FRAME};

/// A complete NES: CPU, bus, PPU, cartridge, and frame timing.
pub struct Nes {
    pub cpu: CPU<NesBus>,
    pub region: Region,
    ppu_cycles: u64,
    odd_frame: bool,
}

impl Nes {
    /// Power up with a cartridge inserted: the CPU starts from the reset
    /// vector.
    pub fn new(cart: Cartridge, region: Region) -> Self {
        let mut cpu = CPU::new(NesBus::new(cart, region));
        cpu.reset();
        Self {
            cpu,
            region,
            ppu_cycles: 0,
            odd_frame: false,
        }
    }

    /// Load an iNES file from disk and power up.
    pub fn load<P: AsRef<Path>>(path: P, region: Region) -> Result<Self, CartridgeError> {
        Ok(Self::new(Cartridge::load(path)?, region))
    }

    /// Swap in a new cartridge and power-cycle the whole machine.
    pub fn load_rom(&mut self, cart: Cartridge) {
        *self = Nes::new(cart, self.region);
    }

    /// Run one full video frame.
    ///
    /// Iterates the dot grid, ticking the PPU once per dot and catching the
    /// CPU up whenever `cpu_cycles * ratio < ppu_cycles`. A latched PPU NMI
    /// is forwarded to the CPU before the cycle that would consume it.
    pub fn run_frame(&mut self) {
        let mut dots = DOTS_PER_SCANLINE as u64 * SCANLINES_PER_FRAME as u64;
        if self.odd_frame {
            dots -= 1;
        }
        let ratio = self.region.ppu_cycles_per_cpu_cycle();
        for _ in 0..dots {
            self.ppu_cycles += 1;
            let target = (self.ppu_cycles as f64 / ratio) as u64;
            while self.cpu.cycles < target {
                if self.cpu.bus.ppu.take_nmi() {
                    self.cpu.nmi();
                }
                self.cpu.cycle();
            }
            let bus = &mut self.cpu.bus;
            bus.ppu.tick(&mut bus.cart);
        }
        self.odd_frame = !self.odd_frame;
    }

    /// Framebuffer of the last rendered frame, as 6-bit palette indices.
    pub fn frame(&self) -> &[u8] {
        &self.cpu.bus.ppu.frame[..]
    }

    /// Map the framebuffer to 0xRRGGBB for display.
    pub fn render_rgb(&self, out: &mut [u32]) {
        self.cpu.bus.ppu.render_rgb(out);
    }
}
