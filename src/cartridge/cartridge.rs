//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), then PRG ROM,
//! then CHR ROM. CHR may be ROM or RAM depending on the board. [Mapper](https://www.nesdev.org/wiki/Mapper)
//! implements CPU PRG ($8000–$FFFF) and PPU CHR ($0000–$1FFF) address decoding.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::cartridge::mapper::Mirroring;
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;

const INES_MAGIC: [u8; 4] = [b'N', b'E', b'S', 0x1A];
const HEADER_LEN: usize = 16;

/// Why an iNES image failed to load.
#[derive(Debug)]
pub enum CartridgeError {
    Io(io::Error),
    /// Missing or wrong "NES\x1A" magic.
    BadMagic,
    /// Header declares zero PRG banks; there is nothing to execute.
    NoPrgRom,
    /// Image shorter than the header-declared PRG/CHR sizes.
    TooShort { expected: usize, actual: usize },
    UnsupportedMapper(u8),
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::Io(err) => write!(f, "failed to read ROM: {err}"),
            CartridgeError::BadMagic => write!(f, "not an iNES file (bad magic)"),
            CartridgeError::NoPrgRom => write!(f, "iNES header declares no PRG ROM"),
            CartridgeError::TooShort { expected, actual } => {
                write!(f, "truncated iNES file: expected {expected} bytes, got {actual}")
            }
            CartridgeError::UnsupportedMapper(id) => write!(f, "unsupported mapper {id}"),
        }
    }
}

impl Error for CartridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CartridgeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CartridgeError {
    fn from(err: io::Error) -> Self {
        CartridgeError::Io(err)
    }
}

/// Cartridge: holds PRG/CHR and the mapper that implements read/write and nametable mirroring.
/// CPU reads PRG via bus at $8000–$FFFF; PPU reads CHR at $0000–$1FFF (pattern tables).
pub struct Cartridge {
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Load a cartridge from an iNES file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_ines(&data)
    }

    /// Parse an iNES image. Header bytes 4–5 = PRG/CHR size; bytes 6–7 = mapper number
    /// (low nibble of 6 | high nibble of 7). See iNES "File format".
    pub fn from_ines(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::TooShort {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if data[..4] != INES_MAGIC {
            return Err(CartridgeError::BadMagic);
        }
        // A PRG-less image has no reset vector to fetch.
        if data[4] == 0 {
            return Err(CartridgeError::NoPrgRom);
        }

        let prg_rom_size = data[4] as usize * 16 * 1024; // PRG ROM size in 16 KiB units
        let chr_rom_size = data[5] as usize * 8 * 1024; // CHR ROM size in 8 KiB units (0 → 8 KiB RAM)

        let prg_start = HEADER_LEN;
        let prg_end = prg_start + prg_rom_size;
        let chr_end = prg_end + chr_rom_size;
        if data.len() < chr_end {
            return Err(CartridgeError::TooShort {
                expected: chr_end,
                actual: data.len(),
            });
        }

        let prg_rom = data[prg_start..prg_end].to_vec();
        let (chr, chr_writable) = if chr_rom_size > 0 {
            (data[prg_end..chr_end].to_vec(), false)
        } else {
            (vec![0; 8 * 1024], true) // No CHR ROM → 8 KiB CHR RAM
        };

        // Mapper number from header bytes 6–7 (iNES). 0 = NROM.
        let mapper_id = (data[6] >> 4) | (data[7] & 0xF0);
        // Mirroring from iNES byte 6 bit 0: 0 = horizontal, 1 = vertical (board solder pads for NROM).
        let mirroring = if data[6] & 1 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper: Box<dyn Mapper> = match mapper_id {
            0 => Box::new(Mapper0::new(prg_rom, chr, chr_writable, mirroring)),
            _ => return Err(CartridgeError::UnsupportedMapper(mapper_id)),
        };

        Ok(Self { mapper })
    }

    /// Read: PRG space ($8000–$FFFF) or CHR ($0000–$1FFF) depending on addr. Mapper dispatches.
    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    /// Write: CHR RAM (if present). PRG ROM is read-only.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }

    /// Current nametable mirroring for the PPU.
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal iNES image: one 16 KiB PRG bank, one 8 KiB CHR bank.
    fn ines_image(mapper_id: u8, vertical: bool) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN + 16 * 1024 + 8 * 1024];
        data[..4].copy_from_slice(&INES_MAGIC);
        data[4] = 1;
        data[5] = 1;
        data[6] = (mapper_id << 4) | vertical as u8;
        data[7] = mapper_id & 0xF0;
        data
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = ines_image(0, false);
        data[0] = b'X';
        assert!(matches!(
            Cartridge::from_ines(&data),
            Err(CartridgeError::BadMagic)
        ));
    }

    #[test]
    fn rejects_truncated_image() {
        let data = ines_image(0, false);
        assert!(matches!(
            Cartridge::from_ines(&data[..100]),
            Err(CartridgeError::TooShort { expected, actual: 100 })
                if expected == HEADER_LEN + 16 * 1024 + 8 * 1024
        ));
    }

    #[test]
    fn rejects_image_without_prg() {
        // Header + 8 KiB CHR only: the declared layout fits, but there is no
        // PRG bank to serve the reset vector from.
        let mut data = ines_image(0, false);
        data[4] = 0;
        data.truncate(HEADER_LEN + 8 * 1024);
        assert!(matches!(
            Cartridge::from_ines(&data),
            Err(CartridgeError::NoPrgRom)
        ));
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let data = ines_image(4, false);
        assert!(matches!(
            Cartridge::from_ines(&data),
            Err(CartridgeError::UnsupportedMapper(4))
        ));
    }

    #[test]
    fn mirrors_16k_prg() {
        let mut data = ines_image(0, false);
        data[HEADER_LEN] = 0x42; // PRG byte 0
        let cart = Cartridge::from_ines(&data).unwrap();
        assert_eq!(cart.read(0x8000), 0x42);
        assert_eq!(cart.read(0xC000), 0x42);
    }

    #[test]
    fn reads_mirroring_bit() {
        let cart = Cartridge::from_ines(&ines_image(0, true)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        let cart = Cartridge::from_ines(&ines_image(0, false)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn chr_rom_ignores_writes_but_chr_ram_accepts_them() {
        let mut cart = Cartridge::from_ines(&ines_image(0, false)).unwrap();
        cart.write(0x0000, 0x99);
        assert_eq!(cart.read(0x0000), 0x00);

        // CHR size 0 in the header means the board carries CHR RAM.
        let mut data = ines_image(0, false);
        data[5] = 0;
        data.truncate(HEADER_LEN + 16 * 1024);
        let mut cart = Cartridge::from_ines(&data).unwrap();
        cart.write(0x0000, 0x99);
        assert_eq!(cart.read(0x0000), 0x99);
    }
}
