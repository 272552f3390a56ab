//! Instruction decoder for the implemented 68000 subset.
//!
//! Decoding looks at the opcode word only. Extension words are consumed by
//! the executor and the disassembler, which both size them through
//! [`Ea::extension_words`].

/// Operation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Size {
    /// 8 bits.
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    Long,
}

impl Size {
    /// Decodes the two-bit `MOVE` size field (`01` byte, `11` word, `10` long).
    #[must_use]
    pub const fn from_move_bits(bits: u16) -> Option<Self> {
        match bits {
            0b01 => Some(Self::Byte),
            0b11 => Some(Self::Word),
            0b10 => Some(Self::Long),
            _ => None,
        }
    }

    /// Operand width in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// Mask covering the operand bits.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Long => u32::MAX,
        }
    }

    /// Sign bit of the operand.
    #[must_use]
    pub const fn msb(self) -> u32 {
        match self {
            Self::Byte => 0x80,
            Self::Word => 0x8000,
            Self::Long => 0x8000_0000,
        }
    }

    /// Assembler suffix.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Byte => ".b",
            Self::Word => ".w",
            Self::Long => ".l",
        }
    }
}

/// Effective addressing modes reachable from the implemented instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Ea {
    DataReg(u8),
    AddrReg(u8),
    Indirect(u8),
    PostInc(u8),
    PreDec(u8),
    Disp16(u8),
    AbsShort,
    AbsLong,
    Immediate,
}

impl Ea {
    /// Decodes a 3-bit mode and 3-bit register field pair.
    ///
    /// Returns `None` for mode 6 (indexed) and the PC-relative or reserved
    /// mode 7 forms, which are outside the implemented subset.
    #[must_use]
    pub const fn decode(mode: u16, reg: u16) -> Option<Self> {
        let r = (reg & 7) as u8;
        match (mode & 7, reg & 7) {
            (0, _) => Some(Self::DataReg(r)),
            (1, _) => Some(Self::AddrReg(r)),
            (2, _) => Some(Self::Indirect(r)),
            (3, _) => Some(Self::PostInc(r)),
            (4, _) => Some(Self::PreDec(r)),
            (5, _) => Some(Self::Disp16(r)),
            (7, 0) => Some(Self::AbsShort),
            (7, 1) => Some(Self::AbsLong),
            (7, 4) => Some(Self::Immediate),
            _ => None,
        }
    }

    /// Returns `true` for modes that can be written by `MOVE`.
    #[must_use]
    pub const fn is_data_alterable(self) -> bool {
        !matches!(self, Self::AddrReg(_) | Self::Immediate)
    }

    /// Number of extension words the mode consumes for an operand of `size`.
    #[must_use]
    pub const fn extension_words(self, size: Size) -> u32 {
        match self {
            Self::Disp16(_) | Self::AbsShort => 1,
            Self::AbsLong => 2,
            Self::Immediate => match size {
                Size::Byte | Size::Word => 1,
                Size::Long => 2,
            },
            Self::DataReg(_)
            | Self::AddrReg(_)
            | Self::Indirect(_)
            | Self::PostInc(_)
            | Self::PreDec(_) => 0,
        }
    }
}

/// Branch condition codes in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Condition {
    True,
    False,
    Hi,
    Ls,
    Cc,
    Cs,
    Ne,
    Eq,
    Vc,
    Vs,
    Pl,
    Mi,
    Ge,
    Lt,
    Gt,
    Le,
}

impl Condition {
    /// Ordered list of all conditions; the index is the encoding.
    pub const ALL: [Self; 16] = [
        Self::True,
        Self::False,
        Self::Hi,
        Self::Ls,
        Self::Cc,
        Self::Cs,
        Self::Ne,
        Self::Eq,
        Self::Vc,
        Self::Vs,
        Self::Pl,
        Self::Mi,
        Self::Ge,
        Self::Lt,
        Self::Gt,
        Self::Le,
    ];

    /// Decodes a 4-bit condition field.
    #[must_use]
    pub const fn from_u4(bits: u16) -> Self {
        Self::ALL[(bits & 0x0F) as usize]
    }

    /// Branch mnemonic; the `T` and `F` encodings are `bra` and `bsr`.
    #[must_use]
    pub const fn branch_mnemonic(self) -> &'static str {
        match self {
            Self::True => "bra",
            Self::False => "bsr",
            Self::Hi => "bhi",
            Self::Ls => "bls",
            Self::Cc => "bcc",
            Self::Cs => "bcs",
            Self::Ne => "bne",
            Self::Eq => "beq",
            Self::Vc => "bvc",
            Self::Vs => "bvs",
            Self::Pl => "bpl",
            Self::Mi => "bmi",
            Self::Ge => "bge",
            Self::Lt => "blt",
            Self::Gt => "bgt",
            Self::Le => "ble",
        }
    }
}

/// Decoded opcode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `NOP`.
    Nop,
    /// `MOVEQ #data,Dn`.
    Moveq {
        /// Sign-extended immediate byte.
        data: u8,
        /// Destination data register.
        reg: u8,
    },
    /// `MOVE.size src,dst`.
    Move {
        /// Operand size.
        size: Size,
        /// Source operand.
        src: Ea,
        /// Destination operand.
        dst: Ea,
    },
    /// `MOVEA.size src,An`.
    Movea {
        /// Operand size, word or long.
        size: Size,
        /// Source operand.
        src: Ea,
        /// Destination address register.
        reg: u8,
    },
    /// `Bcc`, `BRA` or `BSR` (condition `False` encodes `BSR`).
    Branch {
        /// Branch condition.
        cond: Condition,
        /// 8-bit displacement; zero selects a word extension.
        disp8: u8,
    },
    /// `RTS`.
    Rts,
    /// `RTE`, privileged.
    Rte,
    /// `STOP #imm`, privileged.
    Stop,
    /// `TRAP #n`.
    Trap {
        /// Trap number `0..=15`.
        vector: u8,
    },
    /// `ILLEGAL` or any opcode outside the implemented subset.
    Illegal,
    /// Unimplemented `$Axxx` opcode.
    LineA,
    /// Unimplemented `$Fxxx` opcode.
    LineF,
}

impl Instruction {
    /// Returns `true` for opcodes that raise a privilege violation in user
    /// mode.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Rte | Self::Stop)
    }
}

/// Decodes an opcode word.
#[must_use]
pub const fn decode(opcode: u16) -> Instruction {
    match opcode >> 12 {
        0x1..=0x3 => decode_move(opcode),
        0x4 => decode_misc(opcode),
        0x6 => Instruction::Branch {
            cond: Condition::from_u4(opcode >> 8),
            disp8: opcode.to_be_bytes()[1],
        },
        0x7 if opcode & 0x0100 == 0 => Instruction::Moveq {
            data: opcode.to_be_bytes()[1],
            reg: ((opcode >> 9) & 7) as u8,
        },
        0xA => Instruction::LineA,
        0xF => Instruction::LineF,
        _ => Instruction::Illegal,
    }
}

const fn decode_move(opcode: u16) -> Instruction {
    let Some(size) = Size::from_move_bits(opcode >> 12) else {
        return Instruction::Illegal;
    };
    let Some(src) = Ea::decode(opcode >> 3, opcode) else {
        return Instruction::Illegal;
    };
    if matches!((size, src), (Size::Byte, Ea::AddrReg(_))) {
        return Instruction::Illegal;
    }
    let Some(dst) = Ea::decode(opcode >> 6, opcode >> 9) else {
        return Instruction::Illegal;
    };
    match dst {
        Ea::AddrReg(reg) => match size {
            Size::Byte => Instruction::Illegal,
            Size::Word | Size::Long => Instruction::Movea { size, src, reg },
        },
        _ if dst.is_data_alterable() => Instruction::Move { size, src, dst },
        _ => Instruction::Illegal,
    }
}

const fn decode_misc(opcode: u16) -> Instruction {
    match opcode {
        0x4E71 => Instruction::Nop,
        0x4E72 => Instruction::Stop,
        0x4E73 => Instruction::Rte,
        0x4E75 => Instruction::Rts,
        0x4E40..=0x4E4F => Instruction::Trap {
            vector: (opcode & 0x0F) as u8,
        },
        _ => Instruction::Illegal,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{decode, Condition, Ea, Instruction, Size};

    #[rstest]
    #[case(0x4E71, Instruction::Nop)]
    #[case(0x4E72, Instruction::Stop)]
    #[case(0x4E73, Instruction::Rte)]
    #[case(0x4E75, Instruction::Rts)]
    #[case(0x4E4F, Instruction::Trap { vector: 15 })]
    #[case(0x4AFC, Instruction::Illegal)]
    #[case(0xA123, Instruction::LineA)]
    #[case(0xF000, Instruction::LineF)]
    #[case(0x70FF, Instruction::Moveq { data: 0xFF, reg: 0 })]
    #[case(0x7E01, Instruction::Moveq { data: 0x01, reg: 7 })]
    fn decodes_fixed_opcodes(#[case] opcode: u16, #[case] expected: Instruction) {
        assert_eq!(decode(opcode), expected);
    }

    #[test]
    fn decodes_move_forms() {
        // move.w (a0),d0
        assert_eq!(
            decode(0x3010),
            Instruction::Move {
                size: Size::Word,
                src: Ea::Indirect(0),
                dst: Ea::DataReg(0),
            }
        );
        // move.l #imm,-(a7)
        assert_eq!(
            decode(0x2F3C),
            Instruction::Move {
                size: Size::Long,
                src: Ea::Immediate,
                dst: Ea::PreDec(7),
            }
        );
        // move.b d1,($1234).w
        assert_eq!(
            decode(0x11C1),
            Instruction::Move {
                size: Size::Byte,
                src: Ea::DataReg(1),
                dst: Ea::AbsShort,
            }
        );
        // movea.l ($12345678).l,a6
        assert_eq!(
            decode(0x2C79),
            Instruction::Movea {
                size: Size::Long,
                src: Ea::AbsLong,
                reg: 6,
            }
        );
    }

    #[rstest]
    #[case(0x1049)] // movea.b a1,a0
    #[case(0x1009)] // move.b a1,d0
    #[case(0x3F80)] // move.w d0,(d8,a7,xn)
    #[case(0x39C0)] // move.w d0,#imm
    #[case(0x303B)] // move.w (d8,pc,xn),d0
    fn rejects_unsupported_move_encodings(#[case] opcode: u16) {
        assert_eq!(decode(opcode), Instruction::Illegal);
    }

    #[test]
    fn branches_carry_condition_and_displacement() {
        assert_eq!(
            decode(0x6000),
            Instruction::Branch {
                cond: Condition::True,
                disp8: 0,
            }
        );
        assert_eq!(
            decode(0x61FE),
            Instruction::Branch {
                cond: Condition::False,
                disp8: 0xFE,
            }
        );
        assert_eq!(
            decode(0x6706),
            Instruction::Branch {
                cond: Condition::Eq,
                disp8: 6,
            }
        );
    }

    #[test]
    fn condition_table_matches_encoding_order() {
        for (bits, cond) in Condition::ALL.iter().enumerate() {
            assert_eq!(Condition::from_u4(bits as u16), *cond);
        }
        assert_eq!(Condition::from_u4(0).branch_mnemonic(), "bra");
        assert_eq!(Condition::from_u4(1).branch_mnemonic(), "bsr");
    }

    #[test]
    fn extension_words_depend_on_mode_and_size() {
        assert_eq!(Ea::DataReg(0).extension_words(Size::Long), 0);
        assert_eq!(Ea::Disp16(3).extension_words(Size::Byte), 1);
        assert_eq!(Ea::AbsLong.extension_words(Size::Word), 2);
        assert_eq!(Ea::Immediate.extension_words(Size::Byte), 1);
        assert_eq!(Ea::Immediate.extension_words(Size::Long), 2);
    }

    #[test]
    fn only_rte_and_stop_are_privileged() {
        assert!(decode(0x4E73).is_privileged());
        assert!(decode(0x4E72).is_privileged());
        assert!(!decode(0x4E75).is_privileged());
        assert!(!decode(0x4E40).is_privileged());
    }

    proptest! {
        #[test]
        fn decoded_moves_never_target_non_alterable_modes(opcode in 0x1000u16..0x4000) {
            match decode(opcode) {
                Instruction::Move { dst, .. } => prop_assert!(dst.is_data_alterable()),
                Instruction::Movea { size, .. } => prop_assert_ne!(size, Size::Byte),
                other => prop_assert_eq!(other, Instruction::Illegal),
            }
        }
    }
}
