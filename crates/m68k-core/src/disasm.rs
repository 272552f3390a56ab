//! Instruction disassembly for the implemented 68000 subset.
//!
//! Output uses lowercase Motorola syntax with `$` hex numbers, for example
//! `move.w  $10(a0),d1` or `bne.s   $1008`. Memory is read through
//! [`HostBus::peek16`], so disassembling never disturbs a pending bus fault.
//! Words outside the subset render as `dc.w $xxxx` and are two bytes long.

use host_bridge::HostBus;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_ADDRESS_MASK;
use crate::decoder::{decode, Condition, Ea, Instruction, Size};
use crate::execute::{sign_extend_byte, sign_extend_word};

/// Opcode of the `ILLEGAL` instruction.
const ILLEGAL_OPCODE: u16 = 0x4AFC;

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// The starting address of this instruction.
    pub addr: u32,
    /// Length in bytes, opcode included.
    pub len_bytes: u32,
    /// Opcode followed by its extension words.
    pub words: Vec<u16>,
    /// The instruction mnemonic with size suffix (e.g. `move.l`, `bra.s`).
    pub mnemonic: String,
    /// The formatted operands (e.g. `(a0)+,d1`).
    pub operands: String,
    /// Whether the opcode is outside the implemented subset.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Mnemonic and operands as one line, operands aligned at column 8.
    #[must_use]
    pub fn text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{:<8}{}", self.mnemonic, self.operands)
        }
    }
}

struct Cursor<'a> {
    bus: &'a mut dyn HostBus,
    start: u32,
    mask: u32,
    words: Vec<u16>,
}

impl Cursor<'_> {
    fn next_word(&mut self) -> u16 {
        let offset = u32::try_from(self.words.len() * 2).unwrap_or(u32::MAX);
        let addr = self.start.wrapping_add(offset) & self.mask;
        let word = self.bus.peek16(addr);
        self.words.push(word);
        word
    }

    fn next_long(&mut self) -> u32 {
        let high = self.next_word();
        let low = self.next_word();
        (u32::from(high) << 16) | u32::from(low)
    }

    /// Address just past the words consumed so far.
    fn pc(&self) -> u32 {
        let offset = u32::try_from(self.words.len() * 2).unwrap_or(u32::MAX);
        self.start.wrapping_add(offset)
    }

    fn operand(&mut self, ea: Ea, size: Size) -> String {
        match ea {
            Ea::DataReg(reg) => format!("d{reg}"),
            Ea::AddrReg(reg) => format!("a{reg}"),
            Ea::Indirect(reg) => format!("(a{reg})"),
            Ea::PostInc(reg) => format!("(a{reg})+"),
            Ea::PreDec(reg) => format!("-(a{reg})"),
            Ea::Disp16(reg) => {
                let disp = self.next_word();
                format!("{}(a{reg})", signed_hex(i16::from_be_bytes(disp.to_be_bytes())))
            }
            Ea::AbsShort => format!("(${:x}).w", self.next_word()),
            Ea::AbsLong => format!("(${:x}).l", self.next_long()),
            Ea::Immediate => match size {
                Size::Byte => format!("#${:x}", self.next_word() & 0xFF),
                Size::Word => format!("#${:x}", self.next_word()),
                Size::Long => format!("#${:x}", self.next_long()),
            },
        }
    }
}

fn signed_hex(value: i16) -> String {
    if value < 0 {
        format!("-${:x}", value.unsigned_abs())
    } else {
        format!("${value:x}")
    }
}

/// Disassembles the instruction at `addr` on a 24-bit bus.
#[must_use]
pub fn disassemble_one(bus: &mut dyn HostBus, addr: u32) -> DisassemblyRow {
    disassemble_one_masked(bus, addr, DEFAULT_ADDRESS_MASK)
}

/// Disassembles the instruction at `addr`, wrapping operand fetches and
/// branch targets with `mask`.
#[must_use]
pub fn disassemble_one_masked(bus: &mut dyn HostBus, addr: u32, mask: u32) -> DisassemblyRow {
    let mut cursor = Cursor {
        bus,
        start: addr,
        mask,
        words: Vec::with_capacity(5),
    };
    let opcode = cursor.next_word();
    let instruction = decode(opcode);

    let (mnemonic, operands) = match instruction {
        Instruction::Nop => ("nop".to_owned(), String::new()),
        Instruction::Rts => ("rts".to_owned(), String::new()),
        Instruction::Rte => ("rte".to_owned(), String::new()),
        Instruction::Stop => {
            let sr = cursor.next_word();
            ("stop".to_owned(), format!("#${sr:x}"))
        }
        Instruction::Trap { vector } => ("trap".to_owned(), format!("#{vector}")),
        Instruction::Moveq { data, reg } => ("moveq".to_owned(), format!("#${data:x},d{reg}")),
        Instruction::Move { size, src, dst } => {
            let src = cursor.operand(src, size);
            let dst = cursor.operand(dst, size);
            (format!("move{}", size.suffix()), format!("{src},{dst}"))
        }
        Instruction::Movea { size, src, reg } => {
            let src = cursor.operand(src, size);
            (format!("movea{}", size.suffix()), format!("{src},a{reg}"))
        }
        Instruction::Branch { cond, disp8 } => branch(&mut cursor, cond, disp8),
        Instruction::Illegal if opcode == ILLEGAL_OPCODE => ("illegal".to_owned(), String::new()),
        Instruction::Illegal | Instruction::LineA | Instruction::LineF => {
            ("dc.w".to_owned(), format!("${opcode:04x}"))
        }
    };

    let is_illegal = matches!(
        instruction,
        Instruction::Illegal | Instruction::LineA | Instruction::LineF
    );
    let len_bytes = u32::try_from(cursor.words.len() * 2).unwrap_or(u32::MAX);
    DisassemblyRow {
        addr,
        len_bytes,
        words: cursor.words,
        mnemonic,
        operands,
        is_illegal,
    }
}

fn branch(cursor: &mut Cursor<'_>, cond: Condition, disp8: u8) -> (String, String) {
    let base = cursor.pc();
    let (suffix, disp) = if disp8 == 0 {
        (".w", sign_extend_word(u32::from(cursor.next_word())))
    } else {
        (".s", sign_extend_byte(disp8))
    };
    let target = base.wrapping_add(disp) & cursor.mask;
    (
        format!("{}{suffix}", cond.branch_mnemonic()),
        format!("${target:x}"),
    )
}

/// Disassembles the instruction at `addr` into `out` and returns its length
/// in bytes.
pub fn disassemble(bus: &mut dyn HostBus, addr: u32, out: &mut String) -> usize {
    disassemble_masked(bus, addr, DEFAULT_ADDRESS_MASK, out)
}

/// Like [`disassemble`], with an explicit address-bus mask.
pub fn disassemble_masked(
    bus: &mut dyn HostBus,
    addr: u32,
    mask: u32,
    out: &mut String,
) -> usize {
    let row = disassemble_one_masked(bus, addr, mask);
    out.clear();
    out.push_str(&row.text());
    row.words.len() * 2
}

/// Disassembles `count` consecutive instructions starting at `addr`.
#[must_use]
pub fn disassemble_window(bus: &mut dyn HostBus, addr: u32, count: usize) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut pc = addr;
    for _ in 0..count {
        let row = disassemble_one(bus, pc);
        pc = pc.wrapping_add(row.len_bytes);
        rows.push(row);
    }
    rows
}
