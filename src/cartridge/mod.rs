//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Loads iNES (.nes) files, holds PRG/CHR and mapper.
//! - **mapper**: NROM (0); PRG/CHR address decoding and nametable mirroring.

pub mod cartridge;
pub mod mapper;
