use host_bridge::CpuView;

/// Number of data registers (`D0..D7`).
pub const DATA_REGISTER_COUNT: usize = 8;
/// Number of address registers (`A0..A7`).
pub const ADDRESS_REGISTER_COUNT: usize = 8;
/// `SR` trace bit.
pub const SR_T: u16 = 1 << 15;
/// `SR` supervisor bit.
pub const SR_S: u16 = 1 << 13;
/// `SR` interrupt mask field.
pub const SR_IPL: u16 = 0x0700;
/// `CCR` extend bit.
pub const SR_X: u16 = 1 << 4;
/// `CCR` negative bit.
pub const SR_N: u16 = 1 << 3;
/// `CCR` zero bit.
pub const SR_Z: u16 = 1 << 2;
/// `CCR` overflow bit.
pub const SR_V: u16 = 1 << 1;
/// `CCR` carry bit.
pub const SR_C: u16 = 1 << 0;
/// Bits of `SR` implemented by the 68000.
pub const SR_MASK: u16 = SR_T | SR_S | SR_IPL | CCR_MASK;
/// Bits of `CCR` implemented by the 68000.
pub const CCR_MASK: u16 = SR_X | SR_N | SR_Z | SR_V | SR_C;
/// `SR` after reset: supervisor mode, all interrupts masked.
pub const SR_RESET: u16 = SR_S | SR_IPL;

/// Programmer-visible 68000 register file.
///
/// `A7` always holds the active stack pointer. The inactive one (`USP` in
/// supervisor mode, `SSP` in user mode) is parked and swapped whenever the
/// `S` bit changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    d: [u32; DATA_REGISTER_COUNT],
    a: [u32; ADDRESS_REGISTER_COUNT],
    inactive_sp: u32,
    pc: u32,
    pc0: u32,
    ird: u16,
    irc: u16,
    sr: u16,
}

impl Registers {
    /// Reads `Dn`.
    #[must_use]
    pub const fn d(&self, n: usize) -> u32 {
        self.d[n]
    }

    /// Writes `Dn`.
    pub const fn set_d(&mut self, n: usize, value: u32) {
        self.d[n] = value;
    }

    /// Reads `An`.
    #[must_use]
    pub const fn a(&self, n: usize) -> u32 {
        self.a[n]
    }

    /// Writes `An`.
    pub const fn set_a(&mut self, n: usize, value: u32) {
        self.a[n] = value;
    }

    /// Active stack pointer (`A7`).
    #[must_use]
    pub const fn sp(&self) -> u32 {
        self.a[7]
    }

    /// Writes the active stack pointer.
    pub const fn set_sp(&mut self, value: u32) {
        self.a[7] = value;
    }

    /// User stack pointer, wherever it currently lives.
    #[must_use]
    pub const fn usp(&self) -> u32 {
        if self.supervisor() {
            self.inactive_sp
        } else {
            self.a[7]
        }
    }

    /// Supervisor stack pointer, wherever it currently lives.
    #[must_use]
    pub const fn ssp(&self) -> u32 {
        if self.supervisor() {
            self.a[7]
        } else {
            self.inactive_sp
        }
    }

    /// Reads `PC`.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes `PC`.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Reads the start-of-instruction `PC` shadow.
    #[must_use]
    pub const fn pc0(&self) -> u32 {
        self.pc0
    }

    /// Writes the start-of-instruction `PC` shadow.
    pub const fn set_pc0(&mut self, value: u32) {
        self.pc0 = value;
    }

    /// Reads `IRD`.
    #[must_use]
    pub const fn ird(&self) -> u16 {
        self.ird
    }

    /// Writes `IRD`.
    pub const fn set_ird(&mut self, value: u16) {
        self.ird = value;
    }

    /// Reads `IRC`.
    #[must_use]
    pub const fn irc(&self) -> u16 {
        self.irc
    }

    /// Writes `IRC`.
    pub const fn set_irc(&mut self, value: u16) {
        self.irc = value;
    }

    /// Reads `SR`.
    #[must_use]
    pub const fn sr(&self) -> u16 {
        self.sr
    }

    /// Writes `SR`, swapping stack pointers when `S` changes.
    pub const fn set_sr(&mut self, value: u16) {
        let was_supervisor = self.supervisor();
        self.sr = value & SR_MASK;
        if was_supervisor != self.supervisor() {
            let parked = self.inactive_sp;
            self.inactive_sp = self.a[7];
            self.a[7] = parked;
        }
    }

    /// Reads `CCR`.
    #[must_use]
    pub const fn ccr(&self) -> u8 {
        (self.sr & CCR_MASK) as u8
    }

    /// Writes `CCR`, leaving the system byte alone.
    pub fn set_ccr(&mut self, value: u8) {
        self.sr = (self.sr & !CCR_MASK) | (u16::from(value) & CCR_MASK);
    }

    /// Returns `true` in supervisor mode.
    #[must_use]
    pub const fn supervisor(&self) -> bool {
        self.sr & SR_S != 0
    }

    /// Enters or leaves supervisor mode.
    pub const fn set_supervisor(&mut self, enabled: bool) {
        if enabled {
            self.set_sr(self.sr | SR_S);
        } else {
            self.set_sr(self.sr & !SR_S);
        }
    }

    /// Interrupt mask level (`0..=7`).
    #[must_use]
    pub const fn interrupt_mask(&self) -> u8 {
        ((self.sr & SR_IPL) >> 8) as u8
    }

    /// Replaces the interrupt mask level.
    pub fn set_interrupt_mask(&mut self, level: u8) {
        self.sr = (self.sr & !SR_IPL) | (u16::from(level & 7) << 8);
    }

    /// Returns `true` when a `CCR` bit is set.
    #[must_use]
    pub const fn flag(&self, flag: u16) -> bool {
        self.sr & flag != 0
    }

    /// Sets or clears a `CCR` bit.
    pub const fn set_flag(&mut self, flag: u16, enabled: bool) {
        if enabled {
            self.sr |= flag & CCR_MASK;
        } else {
            self.sr &= !(flag & CCR_MASK);
        }
    }
}

impl CpuView for Registers {
    fn ird(&self) -> u16 {
        self.ird
    }

    fn sr(&self) -> u16 {
        self.sr
    }

    fn pc(&self) -> u32 {
        self.pc
    }
}
