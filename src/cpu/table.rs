//! Per-opcode instruction metadata for the 6502.
//!
//! One immutable 256-entry table covering every opcode value, official and
//! unofficial. Lookup is total and pure; the table is the sole source of
//! timing truth for the cycle-stepped CPU.

use std::fmt;

/// Instruction mnemonic. Official 6502 set plus the unofficial opcodes the
/// NES's 2A03 decodes (LAX, SAX, DCP, ... and the JAM halts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
    // Unofficial
    AHX, ALR, ANC, ARR, AXS, DCP, ISC, JAM, LAS, LAX, RLA, RRA, SAX, SHX,
    SHY, SLO, SRE, TAS, XAA,
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Addressing mode. Indexed zero-page/absolute modes are split by index
/// register so each table entry fully describes its operand fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// JMP ($hhll), with the 6502 page-wrap quirk on the high byte read.
    Indirect,
    /// ($ll,X): zero-page pointer indexed before dereference.
    IndirectX,
    /// ($ll),Y: zero-page pointer dereferenced, then indexed.
    IndirectY,
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

/// Immutable per-opcode descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Base cycle cost (before page-crossing / branch penalties).
    pub cycles: u8,
    /// True if crossing a page boundary costs one extra cycle. For Relative
    /// mode this marks branch penalty eligibility (+1 taken, +1 page cross).
    pub page_cross: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8, page_cross: bool) -> Instruction {
    Instruction { mnemonic, mode, cycles, page_cross }
}

/// Look up the descriptor for an opcode byte. Total over 0..=255.
pub fn instruction(opcode: u8) -> Instruction {
    INSTRUCTIONS[opcode as usize]
}

use AddressingMode::*;
use Mnemonic::*;

#[rustfmt::skip]
static INSTRUCTIONS: [Instruction; 256] = [
    // 0x00
    op(BRK, Implied, 7, false),   op(ORA, IndirectX, 6, false), op(JAM, Implied, 2, false),   op(SLO, IndirectX, 8, false),
    op(NOP, ZeroPage, 3, false),  op(ORA, ZeroPage, 3, false),  op(ASL, ZeroPage, 5, false),  op(SLO, ZeroPage, 5, false),
    op(PHP, Implied, 3, false),   op(ORA, Immediate, 2, false), op(ASL, Accumulator, 2, false), op(ANC, Immediate, 2, false),
    op(NOP, Absolute, 4, false),  op(ORA, Absolute, 4, false),  op(ASL, Absolute, 6, false),  op(SLO, Absolute, 6, false),
    // 0x10
    op(BPL, Relative, 2, true),   op(ORA, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(SLO, IndirectY, 8, false),
    op(NOP, ZeroPageX, 4, false), op(ORA, ZeroPageX, 4, false), op(ASL, ZeroPageX, 6, false), op(SLO, ZeroPageX, 6, false),
    op(CLC, Implied, 2, false),   op(ORA, AbsoluteY, 4, true),  op(NOP, Implied, 2, false),   op(SLO, AbsoluteY, 7, false),
    op(NOP, AbsoluteX, 4, true),  op(ORA, AbsoluteX, 4, true),  op(ASL, AbsoluteX, 7, false), op(SLO, AbsoluteX, 7, false),
    // 0x20
    op(JSR, Absolute, 6, false),  op(AND, IndirectX, 6, false), op(JAM, Implied, 2, false),   op(RLA, IndirectX, 8, false),
    op(BIT, ZeroPage, 3, false),  op(AND, ZeroPage, 3, false),  op(ROL, ZeroPage, 5, false),  op(RLA, ZeroPage, 5, false),
    op(PLP, Implied, 4, false),   op(AND, Immediate, 2, false), op(ROL, Accumulator, 2, false), op(ANC, Immediate, 2, false),
    op(BIT, Absolute, 4, false),  op(AND, Absolute, 4, false),  op(ROL, Absolute, 6, false),  op(RLA, Absolute, 6, false),
    // 0x30
    op(BMI, Relative, 2, true),   op(AND, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(RLA, IndirectY, 8, false),
    op(NOP, ZeroPageX, 4, false), op(AND, ZeroPageX, 4, false), op(ROL, ZeroPageX, 6, false), op(RLA, ZeroPageX, 6, false),
    op(SEC, Implied, 2, false),   op(AND, AbsoluteY, 4, true),  op(NOP, Implied, 2, false),   op(RLA, AbsoluteY, 7, false),
    op(NOP, AbsoluteX, 4, true),  op(AND, AbsoluteX, 4, true),  op(ROL, AbsoluteX, 7, false), op(RLA, AbsoluteX, 7, false),
    // 0x40
    op(RTI, Implied, 6, false),   op(EOR, IndirectX, 6, false), op(JAM, Implied, 2, false),   op(SRE, IndirectX, 8, false),
    op(NOP, ZeroPage, 3, false),  op(EOR, ZeroPage, 3, false),  op(LSR, ZeroPage, 5, false),  op(SRE, ZeroPage, 5, false),
    op(PHA, Implied, 3, false),   op(EOR, Immediate, 2, false), op(LSR, Accumulator, 2, false), op(ALR, Immediate, 2, false),
    op(JMP, Absolute, 3, false),  op(EOR, Absolute, 4, false),  op(LSR, Absolute, 6, false),  op(SRE, Absolute, 6, false),
    // 0x50
    op(BVC, Relative, 2, true),   op(EOR, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(SRE, IndirectY, 8, false),
    op(NOP, ZeroPageX, 4, false), op(EOR, ZeroPageX, 4, false), op(LSR, ZeroPageX, 6, false), op(SRE, ZeroPageX, 6, false),
    op(CLI, Implied, 2, false),   op(EOR, AbsoluteY, 4, true),  op(NOP, Implied, 2, false),   op(SRE, AbsoluteY, 7, false),
    op(NOP, AbsoluteX, 4, true),  op(EOR, AbsoluteX, 4, true),  op(LSR, AbsoluteX, 7, false), op(SRE, AbsoluteX, 7, false),
    // 0x60
    op(RTS, Implied, 6, false),   op(ADC, IndirectX, 6, false), op(JAM, Implied, 2, false),   op(RRA, IndirectX, 8, false),
    op(NOP, ZeroPage, 3, false),  op(ADC, ZeroPage, 3, false),  op(ROR, ZeroPage, 5, false),  op(RRA, ZeroPage, 5, false),
    op(PLA, Implied, 4, false),   op(ADC, Immediate, 2, false), op(ROR, Accumulator, 2, false), op(ARR, Immediate, 2, false),
    op(JMP, Indirect, 5, false),  op(ADC, Absolute, 4, false),  op(ROR, Absolute, 6, false),  op(RRA, Absolute, 6, false),
    // 0x70
    op(BVS, Relative, 2, true),   op(ADC, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(RRA, IndirectY, 8, false),
    op(NOP, ZeroPageX, 4, false), op(ADC, ZeroPageX, 4, false), op(ROR, ZeroPageX, 6, false), op(RRA, ZeroPageX, 6, false),
    op(SEI, Implied, 2, false),   op(ADC, AbsoluteY, 4, true),  op(NOP, Implied, 2, false),   op(RRA, AbsoluteY, 7, false),
    op(NOP, AbsoluteX, 4, true),  op(ADC, AbsoluteX, 4, true),  op(ROR, AbsoluteX, 7, false), op(RRA, AbsoluteX, 7, false),
    // 0x80
    op(NOP, Immediate, 2, false), op(STA, IndirectX, 6, false), op(NOP, Immediate, 2, false), op(SAX, IndirectX, 6, false),
    op(STY, ZeroPage, 3, false),  op(STA, ZeroPage, 3, false),  op(STX, ZeroPage, 3, false),  op(SAX, ZeroPage, 3, false),
    op(DEY, Implied, 2, false),   op(NOP, Immediate, 2, false), op(TXA, Implied, 2, false),   op(XAA, Immediate, 2, false),
    op(STY, Absolute, 4, false),  op(STA, Absolute, 4, false),  op(STX, Absolute, 4, false),  op(SAX, Absolute, 4, false),
    // 0x90
    op(BCC, Relative, 2, true),   op(STA, IndirectY, 6, false), op(JAM, Implied, 2, false),   op(AHX, IndirectY, 6, false),
    op(STY, ZeroPageX, 4, false), op(STA, ZeroPageX, 4, false), op(STX, ZeroPageY, 4, false), op(SAX, ZeroPageY, 4, false),
    op(TYA, Implied, 2, false),   op(STA, AbsoluteY, 5, false), op(TXS, Implied, 2, false),   op(TAS, AbsoluteY, 5, false),
    op(SHY, AbsoluteX, 5, false), op(STA, AbsoluteX, 5, false), op(SHX, AbsoluteY, 5, false), op(AHX, AbsoluteY, 5, false),
    // 0xA0
    op(LDY, Immediate, 2, false), op(LDA, IndirectX, 6, false), op(LDX, Immediate, 2, false), op(LAX, IndirectX, 6, false),
    op(LDY, ZeroPage, 3, false),  op(LDA, ZeroPage, 3, false),  op(LDX, ZeroPage, 3, false),  op(LAX, ZeroPage, 3, false),
    op(TAY, Implied, 2, false),   op(LDA, Immediate, 2, false), op(TAX, Implied, 2, false),   op(LAX, Immediate, 2, false),
    op(LDY, Absolute, 4, false),  op(LDA, Absolute, 4, false),  op(LDX, Absolute, 4, false),  op(LAX, Absolute, 4, false),
    // 0xB0
    op(BCS, Relative, 2, true),   op(LDA, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(LAX, IndirectY, 5, true),
    op(LDY, ZeroPageX, 4, false), op(LDA, ZeroPageX, 4, false), op(LDX, ZeroPageY, 4, false), op(LAX, ZeroPageY, 4, false),
    op(CLV, Implied, 2, false),   op(LDA, AbsoluteY, 4, true),  op(TSX, Implied, 2, false),   op(LAS, AbsoluteY, 4, true),
    op(LDY, AbsoluteX, 4, true),  op(LDA, AbsoluteX, 4, true),  op(LDX, AbsoluteY, 4, true),  op(LAX, AbsoluteY, 4, true),
    // 0xC0
    op(CPY, Immediate, 2, false), op(CMP, IndirectX, 6, false), op(NOP, Immediate, 2, false), op(DCP, IndirectX, 8, false),
    op(CPY, ZeroPage, 3, false),  op(CMP, ZeroPage, 3, false),  op(DEC, ZeroPage, 5, false),  op(DCP, ZeroPage, 5, false),
    op(INY, Implied, 2, false),   op(CMP, Immediate, 2, false), op(DEX, Implied, 2, false),   op(AXS, Immediate, 2, false),
    op(CPY, Absolute, 4, false),  op(CMP, Absolute, 4, false),  op(DEC, Absolute, 6, false),  op(DCP, Absolute, 6, false),
    // 0xD0
    op(BNE, Relative, 2, true),   op(CMP, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(DCP, IndirectY, 8, false),
    op(NOP, ZeroPageX, 4, false), op(CMP, ZeroPageX, 4, false), op(DEC, ZeroPageX, 6, false), op(DCP, ZeroPageX, 6, false),
    op(CLD, Implied, 2, false),   op(CMP, AbsoluteY, 4, true),  op(NOP, Implied, 2, false),   op(DCP, AbsoluteY, 7, false),
    op(NOP, AbsoluteX, 4, true),  op(CMP, AbsoluteX, 4, true),  op(DEC, AbsoluteX, 7, false), op(DCP, AbsoluteX, 7, false),
    // 0xE0
    op(CPX, Immediate, 2, false), op(SBC, IndirectX, 6, false), op(NOP, Immediate, 2, false), op(ISC, IndirectX, 8, false),
    op(CPX, ZeroPage, 3, false),  op(SBC, ZeroPage, 3, false),  op(INC, ZeroPage, 5, false),  op(ISC, ZeroPage, 5, false),
    op(INX, Implied, 2, false),   op(SBC, Immediate, 2, false), op(NOP, Implied, 2, false),   op(SBC, Immediate, 2, false),
    op(CPX, Absolute, 4, false),  op(SBC, Absolute, 4, false),  op(INC, Absolute, 6, false),  op(ISC, Absolute, 6, false),
    // 0xF0
    op(BEQ, Relative, 2, true),   op(SBC, IndirectY, 5, true),  op(JAM, Implied, 2, false),   op(ISC, IndirectY, 8, false),
    op(NOP, ZeroPageX, 4, false), op(SBC, ZeroPageX, 4, false), op(INC, ZeroPageX, 6, false), op(ISC, ZeroPageX, 6, false),
    op(SED, Implied, 2, false),   op(SBC, AbsoluteY, 4, true),  op(NOP, Implied, 2, false),   op(ISC, AbsoluteY, 7, false),
    op(NOP, AbsoluteX, 4, true),  op(SBC, AbsoluteX, 4, true),  op(INC, AbsoluteX, 7, false), op(ISC, AbsoluteX, 7, false),
];
