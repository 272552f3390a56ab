use crate::api::CpuView;
use crate::fault::PendingFault;

/// Snapshot of the CPU state at exception entry.
///
/// `fc` and `ssw` are carried for layout compatibility with the 68000 group-0
/// frame; the bridge never tracks them and always leaves them zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExceptionFrame {
    /// Access-information code (`0x0010` for a faulting read).
    pub code: u16,
    /// Faulting access address.
    pub addr: u32,
    /// Opcode executing when the frame was taken.
    pub ird: u16,
    /// Status register when the frame was taken.
    pub sr: u16,
    /// Program counter when the frame was taken.
    pub pc: u32,
    /// Function code. Always zero.
    pub fc: u16,
    /// Special status word. Always zero.
    pub ssw: u16,
}

impl ExceptionFrame {
    /// Captures `IRD`, `SR` and `PC` from live state; everything else is zero.
    #[must_use]
    pub fn capture(cpu: &dyn CpuView) -> Self {
        Self {
            ird: cpu.ird(),
            sr: cpu.sr(),
            pc: cpu.pc(),
            ..Self::default()
        }
    }

    /// Builds the frame delivered for `fault` at the access described by `cpu`.
    #[must_use]
    pub fn bus_fault(fault: PendingFault, cpu: &dyn CpuView) -> Self {
        Self {
            code: fault.access.code(),
            addr: fault.address,
            ..Self::capture(cpu)
        }
    }
}

/// Plain register triple implementing [`CpuView`].
///
/// Useful for driving a host bus outside an engine, and for engines that
/// want to freeze their view before a multi-access sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuSnapshot {
    /// Executing opcode.
    pub ird: u16,
    /// Status register.
    pub sr: u16,
    /// Program counter.
    pub pc: u32,
}

impl CpuSnapshot {
    /// Copies the registers of any [`CpuView`].
    #[must_use]
    pub fn of(cpu: &dyn CpuView) -> Self {
        Self {
            ird: cpu.ird(),
            sr: cpu.sr(),
            pc: cpu.pc(),
        }
    }
}

impl CpuView for CpuSnapshot {
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
