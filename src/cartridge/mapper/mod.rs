//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM) and common types.

/// Nametable mirroring mode for PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
}

pub mod mapper;

pub mod mapper0;
