//! Cycle-stepped 6502 CPU emulation for the NES.
//!
//! Table-driven: [`table`] holds immutable per-opcode metadata (mnemonic,
//! addressing mode, cycle cost, page-cross flag) for all 256 opcodes;
//! [`cpu`] consumes it for single-cycle stepping, interrupt servicing, and
//! execution. [`disasm`] formats fetched instructions for debugger views.

pub mod cpu;
pub mod disasm;
pub mod flags;
pub mod table;

#[cfg(test)]
mod tests;
