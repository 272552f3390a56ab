use crate::cpu::Core;
use crate::decoder::{Condition, Size};
use crate::state::{SR_C, SR_N, SR_V, SR_Z};

impl Condition {
    /// Evaluates the condition against the `CCR` bits of `sr`.
    #[must_use]
    pub const fn test(self, sr: u16) -> bool {
        let c = sr & SR_C != 0;
        let v = sr & SR_V != 0;
        let z = sr & SR_Z != 0;
        let n = sr & SR_N != 0;
        match self {
            Self::True => true,
            Self::False => false,
            Self::Hi => !c && !z,
            Self::Ls => c || z,
            Self::Cc => !c,
            Self::Cs => c,
            Self::Ne => !z,
            Self::Eq => z,
            Self::Vc => !v,
            Self::Vs => v,
            Self::Pl => !n,
            Self::Mi => n,
            Self::Ge => n == v,
            Self::Lt => n != v,
            Self::Gt => !z && n == v,
            Self::Le => z || n != v,
        }
    }
}

impl Core {
    /// `N` and `Z` from the result, `V` and `C` cleared, `X` unchanged.
    pub(crate) fn set_logic_flags(&mut self, size: Size, value: u32) {
        self.regs.set_flag(SR_N, value & size.msb() != 0);
        self.regs.set_flag(SR_Z, value & size.mask() == 0);
        self.regs.set_flag(SR_V, false);
        self.regs.set_flag(SR_C, false);
    }
}
