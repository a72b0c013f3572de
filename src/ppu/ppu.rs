//! NES PPU (Picture Processing Unit): a dot/scanline state machine.
//!
//! Owns nametable VRAM, palette RAM, OAM and the secondary OAM of the eight
//! sprites selected per scanline. Registers $2000-$2007 (mirrored through
//! $3FFF) follow the hardware contract; one dot of the 341x261 grid advances
//! per [`PPU::tick`] call, producing one palette-index pixel per visible dot.

use crate::cartridge::{cartridge::Cartridge, mapper::Mirroring};

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

/// Dots per scanline and scanlines per frame (1..=261; 261 is pre-render).
pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 261;

/// The scanline/dot boundary where vblank is asserted and NMI latched.
pub const VBLANK_SCANLINE: u16 = 241;
pub const VBLANK_DOT: u16 = 1;

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

/// Video region. Fixes the PPU-per-CPU clock ratio and the color-emphasis
/// bit order of PPUMASK (red/green are swapped on PAL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
}

impl Region {
    /// PPU dots per CPU cycle: 3.0 on NTSC, 3.2 on PAL.
    pub fn ppu_cycles_per_cpu_cycle(self) -> f64 {
        match self {
            Region::Ntsc => 3.0,
            Region::Pal => 3.2,
        }
    }
}

/// One entry of the secondary OAM: a sprite selected for the scanline.
/// The sprite height is latched here so a PPUCTRL size change between
/// evaluation and pixel output cannot move a slot out of range.
#[derive(Debug, Clone, Copy, Default)]
struct SpriteSlot {
    oam_index: u8,
    y: u8,
    tile: u8,
    attr: u8,
    x: u8,
    height: u8,
}

/// PPU state: timing counters, registers, VRAM, OAM, and the framebuffer of
/// 6-bit palette indices.
pub struct PPU {
    pub region: Region,
    pub dot: u16,
    pub scanline: u16,
    pub vblank: bool,
    /// Latched NMI request; consumed by the frame driver via `take_nmi`.
    nmi_latch: bool,
    pub ctrl: u8,
    pub mask: u8,
    pub oam_addr: u8,
    addr: u16,
    addr_latch: bool,
    scroll_x: u8,
    scroll_y: u8,
    scroll_latch: bool,
    nametable: [u8; 0x800],
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    palette: [u8; 32],
    /// OAM: 64 sprites x 4 bytes (Y, tile, attr, X).
    pub oam: [u8; 256],
    secondary: [SpriteSlot; 8],
    secondary_count: u8,
    pub sprite_0_hit: bool,
    pub sprite_overflow: bool,
    /// 256x240 palette indices, row-major. Mapped to RGB for display only.
    pub frame: Box<[u8; WIDTH * HEIGHT]>,
}

impl PPU {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            dot: 0,
            scanline: 1,
            vblank: false,
            nmi_latch: false,
            ctrl: 0,
            mask: 0,
            oam_addr: 0,
            addr: 0,
            addr_latch: false,
            scroll_x: 0,
            scroll_y: 0,
            scroll_latch: false,
            nametable: [0; 0x800],
            palette: [0; 32],
            oam: [0; 256],
            secondary: [SpriteSlot::default(); 8],
            secondary_count: 0,
            sprite_0_hit: false,
            sprite_overflow: false,
            frame: Box::new([0; WIDTH * HEIGHT]),
        }
    }

    /// Advance one dot: vblank/pre-render events, sprite evaluation at dot 0,
    /// one pixel per visible dot, then the dot/scanline counters.
    pub fn tick(&mut self, cart: &mut Cartridge) {
        match (self.scanline, self.dot) {
            (VBLANK_SCANLINE, VBLANK_DOT) => {
                self.vblank = true;
                if self.ctrl & 0x80 != 0 {
                    self.nmi_latch = true;
                }
            }
            (SCANLINES_PER_FRAME, 1) => {
                // Pre-render line: vblank and sprite flags clear here.
                self.vblank = false;
                self.sprite_0_hit = false;
                self.sprite_overflow = false;
            }
            _ => {}
        }

        if (1..=HEIGHT as u16).contains(&self.scanline) {
            if self.dot == 0 {
                self.evaluate_sprites(self.scanline - 1);
            } else if (1..=WIDTH as u16).contains(&self.dot) {
                self.render_dot(cart);
            }
        }

        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > SCANLINES_PER_FRAME {
                self.scanline = 1;
            }
        }
    }

    /// Consume the latched NMI request, if any.
    pub fn take_nmi(&mut self) -> bool {
        let nmi = self.nmi_latch;
        self.nmi_latch = false;
        nmi
    }

    /// Scan all 64 OAM entries, keeping the first 8 whose [Y, Y+height)
    /// covers the row. A 9th qualifying sprite sets sprite-overflow
    /// (simplified detection; the hardware's diagonal-scan bug is not
    /// reproduced).
    fn evaluate_sprites(&mut self, row: u16) {
        let height = self.sprite_height();
        self.secondary_count = 0;
        for i in 0..64u8 {
            let base = (i as usize) * 4;
            let y = self.oam[base] as u16;
            if row >= y && row < y + height {
                if self.secondary_count < 8 {
                    self.secondary[self.secondary_count as usize] = SpriteSlot {
                        oam_index: i,
                        y: self.oam[base],
                        tile: self.oam[base + 1],
                        attr: self.oam[base + 2],
                        x: self.oam[base + 3],
                        height: height as u8,
                    };
                    self.secondary_count += 1;
                } else {
                    self.sprite_overflow = true;
                    break;
                }
            }
        }
    }

    fn sprite_height(&self) -> u16 {
        if self.ctrl & 0x20 != 0 { 16 } else { 8 }
    }

    /// Produce one pixel: background fetch, sprite decode, priority
    /// compositing, palette lookup.
    fn render_dot(&mut self, cart: &mut Cartridge) {
        let x = self.dot - 1;
        let y = self.scanline - 1;

        let show_bg = self.mask & 0x08 != 0 && !(x < 8 && self.mask & 0x02 == 0);
        let show_sprites = self.mask & 0x10 != 0 && !(x < 8 && self.mask & 0x04 == 0);

        let (bg_pixel, bg_bank) = if show_bg {
            self.background_pixel(cart, x, y)
        } else {
            (0, 0)
        };

        // Universal backdrop unless a layer wins.
        let mut palette_addr = 0x3F00u16;
        if bg_pixel != 0 {
            palette_addr = 0x3F00 + (bg_bank as u16) * 4 + bg_pixel as u16;
        }

        if show_sprites {
            if let Some((sp_pixel, sp_bank, behind, is_sprite_0)) = self.sprite_pixel(cart, x, y) {
                if is_sprite_0 && bg_pixel != 0 {
                    self.sprite_0_hit = true;
                }
                if !(behind && bg_pixel != 0) {
                    palette_addr = 0x3F10 + (sp_bank as u16) * 4 + sp_pixel as u16;
                }
            }
        }

        let mut color = self.palette[Self::palette_index(palette_addr)] & 0x3F;
        if self.mask & 0x01 != 0 {
            color &= 0x30; // greyscale
        }
        self.frame[(y as usize) * WIDTH + x as usize] = color;
    }

    /// Background 2-bit pixel and palette selector at (x, y), derived from
    /// scroll + PPUCTRL nametable select across up to 4 logical nametables.
    fn background_pixel(&self, cart: &Cartridge, x: u16, y: u16) -> (u8, u8) {
        let fine_x = (self.scroll_x & 7) as u32;
        let fine_y = (self.scroll_y & 7) as u32;
        let coarse_x = (self.scroll_x >> 3) as u32;
        let coarse_y = (self.scroll_y >> 3) as u32;
        let nametable_base = (self.ctrl & 3) as u16;
        let bg_pattern_base = if self.ctrl & 0x10 != 0 { 0x1000u16 } else { 0x0000 };
        let mirroring = cart.mirroring();

        let total_x = (x as u32 + fine_x + coarse_x * 8) % 512;
        let total_y = (y as u32 + fine_y + coarse_y * 8) % 480;
        let tile_x = (total_x / 8) as u16;
        let tile_y = (total_y / 8) as u16;

        let nt_x = tile_x / 32;
        let nt_y = tile_y / 30;
        // Two physical tables: vertical mirroring keys on the horizontal
        // position, horizontal mirroring on the vertical one.
        let nt_physical = match mirroring {
            Mirroring::Vertical => (nametable_base & 1) ^ (nt_x & 1),
            Mirroring::Horizontal => ((nametable_base >> 1) & 1) ^ (nt_y & 1),
        };
        let tile_x_in_nt = tile_x % 32;
        let tile_y_in_nt = tile_y % 30;

        let nt_index = nt_physical * 0x400 + tile_y_in_nt * 32 + tile_x_in_nt;
        let tile_id = self.nametable[nt_index as usize];

        // One attribute byte per 2x2-tile block, 2 bits per quadrant.
        let attr_index = nt_physical * 0x400 + 0x3C0 + (tile_y_in_nt / 4) * 8 + tile_x_in_nt / 4;
        let attr_byte = self.nametable[attr_index as usize];
        let shift = ((tile_y_in_nt & 2) << 1) | (tile_x_in_nt & 2);
        let palette_bank = (attr_byte >> shift) & 3;

        let px = (total_x % 8) as u16;
        let py = (total_y % 8) as u16;
        let tile_addr = bg_pattern_base + (tile_id as u16) * 16;
        let row_lo = cart.read(tile_addr + py);
        let row_hi = cart.read(tile_addr + py + 8);
        let bit = 7 - px;
        let pixel = (((row_hi >> bit) & 1) << 1) | ((row_lo >> bit) & 1);

        (pixel, palette_bank)
    }

    /// First opaque sprite pixel at (x, row) among the selected sprites,
    /// lowest OAM index first. Returns (pixel, palette bank, behind-bg,
    /// is-sprite-0).
    fn sprite_pixel(&self, cart: &Cartridge, x: u16, row: u16) -> Option<(u8, u8, bool, bool)> {
        let sprite_pattern_base = if self.ctrl & 0x08 != 0 { 0x1000u16 } else { 0x0000 };

        for slot in &self.secondary[..self.secondary_count as usize] {
            let sx = x.wrapping_sub(slot.x as u16);
            if sx >= 8 {
                continue;
            }
            let height = slot.height as u16;
            let flip_v = slot.attr & 0x80 != 0;
            let flip_h = slot.attr & 0x40 != 0;

            let mut sprite_row = row.wrapping_sub(slot.y as u16);
            if sprite_row >= height {
                continue;
            }
            if flip_v {
                sprite_row = height - 1 - sprite_row;
            }

            let (tile_addr, row_in_tile) = if height == 8 {
                (sprite_pattern_base + (slot.tile as u16) * 16, sprite_row)
            } else {
                // 8x16: bit 0 of the tile index selects the pattern table.
                let table = (slot.tile & 1) as u16 * 0x1000;
                let tile = (slot.tile & 0xFE) as u16 + (sprite_row >= 8) as u16;
                (table + tile * 16, sprite_row % 8)
            };

            let row_lo = cart.read(tile_addr + row_in_tile);
            let row_hi = cart.read(tile_addr + row_in_tile + 8);
            let bit = if flip_h { sx } else { 7 - sx };
            let pixel = (((row_hi >> bit) & 1) << 1) | ((row_lo >> bit) & 1);
            if pixel == 0 {
                continue;
            }

            return Some((
                pixel,
                slot.attr & 3,
                slot.attr & 0x20 != 0,
                slot.oam_index == 0,
            ));
        }
        None
    }

    /// Read PPUSTATUS ($2002): vblank, sprite-0-hit, sprite-overflow.
    /// Clears vblank and resets both two-write latches.
    pub fn read_status(&mut self) -> u8 {
        let mut status = 0u8;
        if self.vblank {
            status |= 0x80;
        }
        if self.sprite_0_hit {
            status |= 0x40;
        }
        if self.sprite_overflow {
            status |= 0x20;
        }
        self.vblank = false;
        self.addr_latch = false;
        self.scroll_latch = false;
        status
    }

    /// Write PPUCTRL ($2000): nametable select, VRAM increment, pattern
    /// banks, sprite size, NMI enable.
    pub fn write_ctrl(&mut self, data: u8) {
        self.ctrl = data;
    }

    /// Write PPUMASK ($2001): greyscale, left-8 clips, render enables,
    /// emphasis.
    pub fn write_mask(&mut self, data: u8) {
        self.mask = data;
    }

    /// Write OAMADDR ($2003).
    pub fn write_oam_addr(&mut self, data: u8) {
        self.oam_addr = data;
    }

    /// Read OAMDATA ($2004); does not increment OAMADDR.
    pub fn read_oam_data(&mut self) -> u8 {
        self.oam[self.oam_addr as usize]
    }

    /// Write OAMDATA ($2004); OAMADDR auto-increments mod 256.
    pub fn write_oam_data(&mut self, data: u8) {
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Copy a 256-byte RAM page into OAM (OAM DMA via $4014). The source
    /// address is mirrored within the 2 KiB of internal RAM.
    pub fn oam_dma(&mut self, ram: &[u8; 2048], page: u8) {
        let start = ((page as u16) << 8) as usize % 2048;
        for i in 0..256 {
            self.oam[i] = ram[(start + i) % 2048];
        }
    }

    /// Write PPUSCROLL ($2005): fine X scroll, then fine Y on the second
    /// write.
    pub fn write_scroll(&mut self, data: u8) {
        if !self.scroll_latch {
            self.scroll_x = data;
            self.scroll_latch = true;
        } else {
            self.scroll_y = data;
            self.scroll_latch = false;
        }
    }

    /// Write PPUADDR ($2006): high byte then low byte; the completed address
    /// is taken mod 0x4000 and a third write restarts the sequence.
    pub fn write_addr(&mut self, data: u8) {
        if !self.addr_latch {
            self.addr = (data as u16) << 8;
            self.addr_latch = true;
        } else {
            self.addr = ((self.addr & 0xFF00) | data as u16) & 0x3FFF;
            self.addr_latch = false;
        }
    }

    /// Read PPUDATA ($2007); auto-increments the VRAM address by the
    /// PPUCTRL-configured step, wrapping mod 0x4000.
    pub fn read_data(&mut self, cart: &mut Cartridge) -> u8 {
        let addr = self.addr & 0x3FFF;
        let data = match addr {
            0x0000..=0x1FFF => cart.read(addr),
            0x2000..=0x2FFF => self.nametable[Self::map_nametable_addr(addr, cart.mirroring()) as usize],
            0x3000..=0x3EFF => {
                self.nametable[Self::map_nametable_addr(addr - 0x1000, cart.mirroring()) as usize]
            }
            _ => self.palette[Self::palette_index(addr)],
        };
        self.increment_addr();
        data
    }

    /// Write PPUDATA ($2007): CHR RAM, nametables, or palette RAM.
    pub fn write_data(&mut self, cart: &mut Cartridge, data: u8) {
        let addr = self.addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.write(addr, data),
            0x2000..=0x2FFF => {
                self.nametable[Self::map_nametable_addr(addr, cart.mirroring()) as usize] = data;
            }
            0x3000..=0x3EFF => {
                self.nametable[Self::map_nametable_addr(addr - 0x1000, cart.mirroring()) as usize] =
                    data;
            }
            _ => self.palette[Self::palette_index(addr)] = data & 0x3F,
        }
        self.increment_addr();
    }

    fn increment_addr(&mut self) {
        let step = if self.ctrl & 0x04 != 0 { 32 } else { 1 };
        self.addr = self.addr.wrapping_add(step) & 0x3FFF;
    }

    /// Resolve palette address $3F00-$3FFF to a 32-byte index; $3F10/14/18/1C
    /// mirror the background entries.
    fn palette_index(addr: u16) -> usize {
        let i = (addr & 0x1F) as usize;
        if i >= 16 && i % 4 == 0 { i - 16 } else { i }
    }

    /// Map a nametable address ($2000-$2FFF) to the 2 KiB physical VRAM
    /// index per mirroring.
    fn map_nametable_addr(addr: u16, mirroring: Mirroring) -> u16 {
        let addr = (addr - 0x2000) & 0xFFF;
        let table = addr / 0x400;
        let offset = addr & 0x3FF;
        match mirroring {
            Mirroring::Vertical => offset + (table & 1) * 0x400,
            Mirroring::Horizontal => offset + (table / 2) * 0x400,
        }
    }

    /// Map the palette-index framebuffer to 0xRRGGBB pixels, applying the
    /// PPUMASK color-emphasis bits (red/green order swapped on PAL).
    pub fn render_rgb(&self, out: &mut [u32]) {
        let (em_r, em_g, em_b) = self.emphasis();
        for (dst, &idx) in out.iter_mut().zip(self.frame.iter()) {
            let mut rgb = NES_PALETTE_RGB[(idx & 0x3F) as usize];
            if em_r || em_g || em_b {
                rgb = attenuate(rgb, em_r, em_g, em_b);
            }
            *dst = rgb;
        }
    }

    fn emphasis(&self) -> (bool, bool, bool) {
        let (red_bit, green_bit) = match self.region {
            Region::Ntsc => (0x20, 0x40),
            Region::Pal => (0x40, 0x20),
        };
        (
            self.mask & red_bit != 0,
            self.mask & green_bit != 0,
            self.mask & 0x80 != 0,
        )
    }
}

/// Dim the non-emphasized channels to 3/4, approximating the hardware tint.
fn attenuate(rgb: u32, em_r: bool, em_g: bool, em_b: bool) -> u32 {
    let dim = |c: u32, keep: bool| if keep { c } else { c * 3 / 4 };
    let r = dim((rgb >> 16) & 0xFF, em_r);
    let g = dim((rgb >> 8) & 0xFF, em_g);
    let b = dim(rgb & 0xFF, em_b);
    (r << 16) | (g << 8) | b
}
