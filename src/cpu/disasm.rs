//! One-line disassembly of a fetched instruction, for debugger display.

use crate::cpu::table::{AddressingMode, instruction};

/// Format an opcode and its raw operand bytes according to addressing mode,
/// e.g. `LDA #$12`, `JMP ($1234)`, `BNE +5`. Pure; no bus access.
pub fn disassemble(opcode: u8, operand: u16) -> String {
    let instr = instruction(opcode);
    let m = instr.mnemonic;
    match instr.mode {
        AddressingMode::Implied => format!("{m}"),
        AddressingMode::Accumulator => format!("{m} A"),
        AddressingMode::Immediate => format!("{m} #${:02X}", operand as u8),
        AddressingMode::ZeroPage => format!("{m} ${:02X}", operand as u8),
        AddressingMode::ZeroPageX => format!("{m} ${:02X},X", operand as u8),
        AddressingMode::ZeroPageY => format!("{m} ${:02X},Y", operand as u8),
        AddressingMode::Absolute => format!("{m} ${operand:04X}"),
        AddressingMode::AbsoluteX => format!("{m} ${operand:04X},X"),
        AddressingMode::AbsoluteY => format!("{m} ${operand:04X},Y"),
        AddressingMode::Indirect => format!("{m} (${operand:04X})"),
        AddressingMode::IndirectX => format!("{m} (${:02X},X)", operand as u8),
        AddressingMode::IndirectY => format!("{m} (${:02X}),Y", operand as u8),
        AddressingMode::Relative => format!("{m} {:+}", operand as u8 as i8),
    }
}
