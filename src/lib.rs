//! Vireo: an NES (Nintendo Entertainment System) emulator core written in Rust.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): cycle-stepped
//! Ricoh 2A03 CPU, 2C02 PPU, NROM cartridges, and the frame-driven CPU/PPU
//! interleave.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU
//!   registers, cartridge; purely combinational, no clock
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0)
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: table-driven, single-cycle
//!   stepping, full + undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI)
//! - **nes** – whole-system owner: frame loop, NTSC/PAL clock ratio, NMI forwarding
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, nametables, 256×240

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod nes;
pub mod ppu;
