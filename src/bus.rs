//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, and the cartridge. The bus is
//! purely combinational: it owns no clock, and the CPU/PPU interleave is
//! driven from [`crate::nes::Nes`].

use crate::{
    cartridge::cartridge::Cartridge,
    ppu::ppu::{PPU, Region},
};

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

/// Main NES bus: 2 KiB RAM, PPU, and cartridge.
pub struct NesBus {
    pub ram: [u8; 2048],
    pub cart: Cartridge,
    pub ppu: PPU,
}

impl NesBus {
    /// Create a new bus with the given cartridge.
    pub fn new(cart: Cartridge, region: Region) -> Self {
        Self {
            ram: [0; 2048],
            cart,
            ppu: PPU::new(region),
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let r = addr & 0x2007;
                match r {
                    0x2002 => self.ppu.read_status(),
                    0x2004 => self.ppu.read_oam_data(),
                    0x2007 => self.ppu.read_data(&mut self.cart),
                    _ => 0x40, // open bus for write-only registers
                }
            }
            // APU and I/O region: open bus
            0x4000..=0x401F => 0x40,
            // Expansion: open bus
            0x4020..=0x7FFF => 0x40,
            // Cartridge PRG ROM
            0x8000..=0xFFFF => self.cart.read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            // Internal RAM
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let r = addr & 0x2007;
                match r {
                    0x2000 => self.ppu.write_ctrl(data),
                    0x2001 => self.ppu.write_mask(data),
                    0x2003 => self.ppu.write_oam_addr(data),
                    0x2004 => self.ppu.write_oam_data(data),
                    0x2005 => self.ppu.write_scroll(data),
                    0x2006 => self.ppu.write_addr(data),
                    0x2007 => self.ppu.write_data(&mut self.cart, data),
                    _ => {}
                }
            }
            0x4014 => self.ppu.oam_dma(&self.ram, data),
            // APU and I/O region: no-op
            0x4000..=0x401F => {}
            0x4020..=0x7FFF => {}
            // Cartridge space (PRG ROM is read-only under NROM)
            0x8000..=0xFFFF => self.cart.write(addr, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bus() -> NesBus {
        let mut data = vec![0u8; 16 + 16 * 1024 + 8 * 1024];
        data[..4].copy_from_slice(b"NES\x1A");
        data[4] = 1;
        data[5] = 1;
        // Interrupt vectors land in the mirrored upper PRG bank.
        data[16 + 0x3FFA] = 0x00; // NMI -> $A000
        data[16 + 0x3FFB] = 0xA0;
        data[16 + 0x3FFC] = 0x00; // reset -> $8000
        data[16 + 0x3FFD] = 0x80;
        data[16 + 0x3FFE] = 0x00; // IRQ/BRK -> $9000
        data[16 + 0x3FFF] = 0x90;
        let cart = Cartridge::from_ines(&data).unwrap();
        NesBus::new(cart, Region::Ntsc)
    }

    #[test]
    fn ram_is_mirrored_every_2k() {
        let mut bus = test_bus();
        bus.write(0x0000, 0x11);
        assert_eq!(bus.read(0x0800), 0x11);
        assert_eq!(bus.read(0x1000), 0x11);
        assert_eq!(bus.read(0x1800), 0x11);
        bus.write(0x1FFF, 0x22);
        assert_eq!(bus.read(0x07FF), 0x22);
    }

    #[test]
    fn ppu_registers_mirror_through_0x3fff() {
        let mut bus = test_bus();
        // $3FF6 decodes to PPUADDR, $3FF7 to PPUDATA.
        bus.write(0x3FF6, 0x21);
        bus.write(0x3FF6, 0x08);
        bus.write(0x3FF7, 0x5A);
        bus.write(0x2006, 0x21);
        bus.write(0x2006, 0x08);
        assert_eq!(bus.read(0x2007), 0x5A);
    }

    #[test]
    fn status_reads_mirror_too() {
        let mut bus = test_bus();
        bus.ppu.vblank = true;
        assert_eq!(bus.read(0x200A) & 0x80, 0x80); // $200A decodes to $2002
        assert_eq!(bus.read(0x2002) & 0x80, 0x00); // first read cleared it
    }

    #[test]
    fn interrupt_vectors_come_from_the_cartridge() {
        let mut bus = test_bus();
        assert_eq!(bus.read(0xFFFA), 0x00);
        assert_eq!(bus.read(0xFFFB), 0xA0);
        assert_eq!(bus.read(0xFFFC), 0x00);
        assert_eq!(bus.read(0xFFFD), 0x80);
        assert_eq!(bus.read(0xFFFE), 0x00);
        assert_eq!(bus.read(0xFFFF), 0x90);
    }

    #[test]
    fn oam_dma_copies_the_selected_ram_page() {
        let mut bus = test_bus();
        for i in 0..256u16 {
            bus.write(0x0300 + i, i as u8);
        }
        bus.write(0x4014, 0x03);
        assert_eq!(bus.ppu.oam[0], 0);
        assert_eq!(bus.ppu.oam[255], 255);
    }

    #[test]
    fn unmapped_reads_return_open_bus() {
        let mut bus = test_bus();
        assert_eq!(bus.read(0x2000), 0x40); // write-only register
        assert_eq!(bus.read(0x4000), 0x40);
        assert_eq!(bus.read(0x5000), 0x40);
    }
}
