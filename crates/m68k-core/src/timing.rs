use crate::decoder::{Ea, Size};

/// Instruction and exception forms with fixed cycle costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// `NOP`.
    Nop,
    /// `MOVEQ`.
    Moveq,
    /// `MOVE`/`MOVEA` before effective address costs.
    MoveBase,
    /// `Bcc`/`BRA` when taken.
    BranchTaken,
    /// `Bcc` with byte displacement when not taken.
    BranchNotTakenShort,
    /// `Bcc` with word displacement when not taken.
    BranchNotTakenWord,
    /// `BSR`.
    Bsr,
    /// `RTS`.
    Rts,
    /// `RTE`.
    Rte,
    /// `STOP`.
    Stop,
    /// One idle slice while halted or stopped.
    Idle,
    /// Reset sequence.
    Reset,
    /// Bus or address error entry.
    Group0Entry,
    /// `TRAP #n` entry.
    TrapEntry,
    /// Illegal instruction and line A/F entry.
    IllegalEntry,
    /// Privilege violation entry.
    PrivilegeEntry,
    /// Interrupt acknowledge and entry.
    InterruptEntry,
}

/// Single source-of-truth cycle-cost table for fixed-cost forms.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u16)] = &[
    (CycleCostKind::Nop, 4),
    (CycleCostKind::Moveq, 4),
    (CycleCostKind::MoveBase, 4),
    (CycleCostKind::BranchTaken, 10),
    (CycleCostKind::BranchNotTakenShort, 8),
    (CycleCostKind::BranchNotTakenWord, 12),
    (CycleCostKind::Bsr, 18),
    (CycleCostKind::Rts, 16),
    (CycleCostKind::Rte, 20),
    (CycleCostKind::Stop, 4),
    (CycleCostKind::Idle, 4),
    (CycleCostKind::Reset, 40),
    (CycleCostKind::Group0Entry, 50),
    (CycleCostKind::TrapEntry, 34),
    (CycleCostKind::IllegalEntry, 34),
    (CycleCostKind::PrivilegeEntry, 34),
    (CycleCostKind::InterruptEntry, 44),
];

/// Looks up the cycle cost for a cycle-cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u16> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

/// Cycle cost as charged to the clock; kinds missing from the table are free.
#[must_use]
pub fn cycles(kind: CycleCostKind) -> u32 {
    cycle_cost(kind).map_or(0, u32::from)
}

/// Effective address calculation cost for an operand of `size`.
///
/// `destination` selects the `MOVE` destination column, where predecrement
/// costs the same as plain indirect.
#[must_use]
pub const fn ea_cycles(ea: Ea, size: Size, destination: bool) -> u32 {
    let long = matches!(size, Size::Long);
    let (word_cost, long_cost) = match ea {
        Ea::DataReg(_) | Ea::AddrReg(_) => (0, 0),
        Ea::Indirect(_) | Ea::PostInc(_) | Ea::Immediate => (4, 8),
        Ea::PreDec(_) if destination => (4, 8),
        Ea::PreDec(_) => (6, 10),
        Ea::Disp16(_) | Ea::AbsShort => (8, 12),
        Ea::AbsLong => (12, 16),
    };
    if long {
        long_cost
    } else {
        word_cost
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::{cycle_cost, cycles, ea_cycles, CycleCostKind, CYCLE_COST_TABLE};
    use crate::decoder::{Ea, Size};

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = CYCLE_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), CYCLE_COST_TABLE.len());
    }

    #[test]
    fn table_values_match_68000_costs() {
        assert_eq!(cycle_cost(CycleCostKind::Nop), Some(4));
        assert_eq!(cycle_cost(CycleCostKind::BranchTaken), Some(10));
        assert_eq!(cycle_cost(CycleCostKind::Reset), Some(40));
        assert_eq!(cycle_cost(CycleCostKind::Group0Entry), Some(50));
        assert_eq!(cycle_cost(CycleCostKind::InterruptEntry), Some(44));
        assert_eq!(cycles(CycleCostKind::Rts), 16);
    }

    #[test]
    fn every_table_entry_resolves_via_lookup() {
        for (kind, expected_cycles) in CYCLE_COST_TABLE {
            assert_eq!(cycle_cost(*kind), Some(*expected_cycles));
        }
    }

    #[rstest]
    #[case(Ea::DataReg(0), Size::Long, false, 0)]
    #[case(Ea::Indirect(0), Size::Word, false, 4)]
    #[case(Ea::Indirect(0), Size::Long, false, 8)]
    #[case(Ea::PreDec(1), Size::Word, false, 6)]
    #[case(Ea::PreDec(1), Size::Word, true, 4)]
    #[case(Ea::Disp16(2), Size::Byte, false, 8)]
    #[case(Ea::AbsLong, Size::Long, true, 16)]
    #[case(Ea::Immediate, Size::Word, false, 4)]
    fn effective_address_costs(
        #[case] ea: Ea,
        #[case] size: Size,
        #[case] destination: bool,
        #[case] expected: u32,
    ) {
        assert_eq!(ea_cycles(ea, size, destination), expected);
    }
}
