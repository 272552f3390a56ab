//! Flat C ABI over [`host_bridge::Machine`] driving the [`m68k_core::Core`]
//! reference engine.
//!
//! Every exported function takes the handle returned by [`hb_create`]. A null
//! handle is accepted everywhere and turns the call into a no-op returning
//! zero. Panics never cross the boundary: each call runs under
//! `catch_unwind` and degrades to the same zero/no-op result.

use std::ffi::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use host_bridge::{CallbackContract, ExceptionFrame, Machine};
use m68k_core::Core;
use tracing::{error, warn};

/// Minimum size of every text buffer passed to this library, NUL included.
pub const HB_TEXT_BUFFER_LEN: usize = 128;

pub type HbRead8 = extern "C" fn(user: *mut c_void, addr: u32) -> u8;
pub type HbRead16 = extern "C" fn(user: *mut c_void, addr: u32) -> u16;
pub type HbWrite8 = extern "C" fn(user: *mut c_void, addr: u32, value: u8);
pub type HbWrite16 = extern "C" fn(user: *mut c_void, addr: u32, value: u16);
pub type HbSync = extern "C" fn(user: *mut c_void, cycles: i32);
pub type HbIrqVector = extern "C" fn(user: *mut c_void, level: u8) -> u16;

/// Callback table supplied to [`hb_create`].
///
/// The four memory callbacks are required. `sync` and
/// `read_irq_user_vector` may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HbCallbacks {
    /// Opaque pointer handed back to every callback.
    pub user: *mut c_void,
    pub read8: Option<HbRead8>,
    pub read16: Option<HbRead16>,
    pub write8: Option<HbWrite8>,
    pub write16: Option<HbWrite16>,
    pub sync: Option<HbSync>,
    pub read_irq_user_vector: Option<HbIrqVector>,
}

/// C layout of the 68000 group-0 exception frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HbStackFrame {
    pub code: u16,
    pub addr: u32,
    pub ird: u16,
    pub sr: u16,
    pub pc: u32,
    pub fc: u16,
    pub ssw: u16,
}

impl From<ExceptionFrame> for HbStackFrame {
    fn from(frame: ExceptionFrame) -> Self {
        Self {
            code: frame.code,
            addr: frame.addr,
            ird: frame.ird,
            sr: frame.sr,
            pc: frame.pc,
            fc: frame.fc,
            ssw: frame.ssw,
        }
    }
}

impl From<HbStackFrame> for ExceptionFrame {
    fn from(frame: HbStackFrame) -> Self {
        Self {
            code: frame.code,
            addr: frame.addr,
            ird: frame.ird,
            sr: frame.sr,
            pc: frame.pc,
            fc: frame.fc,
            ssw: frame.ssw,
        }
    }
}

/// Embedder context: the foreign callback table.
#[derive(Debug)]
pub struct ForeignContext {
    callbacks: HbCallbacks,
}

impl ForeignContext {
    /// The embedder's opaque pointer.
    #[must_use]
    pub const fn user(&self) -> *mut c_void {
        self.callbacks.user
    }
}

/// Opaque machine handle.
pub type HbMachine = Machine<Core, ForeignContext>;

fn foreign_read8(context: &mut ForeignContext, addr: u32) -> u8 {
    let user = context.user();
    context.callbacks.read8.map_or(0, |read8| read8(user, addr))
}

fn foreign_read16(context: &mut ForeignContext, addr: u32) -> u16 {
    let user = context.user();
    context.callbacks.read16.map_or(0, |read16| read16(user, addr))
}

fn foreign_write8(context: &mut ForeignContext, addr: u32, value: u8) {
    if let Some(write8) = context.callbacks.write8 {
        write8(context.user(), addr, value);
    }
}

fn foreign_write16(context: &mut ForeignContext, addr: u32, value: u16) {
    if let Some(write16) = context.callbacks.write16 {
        write16(context.user(), addr, value);
    }
}

fn foreign_sync(context: &mut ForeignContext, cycles: i32) {
    if let Some(sync) = context.callbacks.sync {
        sync(context.user(), cycles);
    }
}

fn foreign_irq_vector(context: &mut ForeignContext, level: u8) -> u16 {
    let user = context.user();
    context
        .callbacks
        .read_irq_user_vector
        .map_or(0, |lookup| lookup(user, level))
}

/// Registers a trampoline for every slot the table fills, leaving missing
/// slots for the contract to reject.
fn contract(callbacks: HbCallbacks) -> CallbackContract<ForeignContext> {
    let mut contract = CallbackContract::new(ForeignContext { callbacks });
    if callbacks.read8.is_some() {
        contract = contract.with_read8(foreign_read8);
    }
    if callbacks.read16.is_some() {
        contract = contract.with_read16(foreign_read16);
    }
    if callbacks.write8.is_some() {
        contract = contract.with_write8(foreign_write8);
    }
    if callbacks.write16.is_some() {
        contract = contract.with_write16(foreign_write16);
    }
    if callbacks.sync.is_some() {
        contract = contract.with_sync(foreign_sync);
    }
    if callbacks.read_irq_user_vector.is_some() {
        contract = contract.with_read_irq_user_vector(foreign_irq_vector);
    }
    contract
}

fn guard<T: Default>(operation: &'static str, f: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!(operation, "panic caught at the C boundary");
        T::default()
    })
}

unsafe fn with_machine<T: Default>(
    machine: *mut HbMachine,
    operation: &'static str,
    f: impl FnOnce(&mut HbMachine) -> T,
) -> T {
    match machine.as_mut() {
        Some(machine) => guard(operation, || f(machine)),
        None => T::default(),
    }
}

/// Copies `text` into `out` as a NUL-terminated string, truncated to
/// [`HB_TEXT_BUFFER_LEN`].
unsafe fn write_text(out: *mut c_char, text: &str) {
    if out.is_null() {
        return;
    }
    let len = text.len().min(HB_TEXT_BUFFER_LEN - 1);
    ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), out, len);
    out.add(len).write(0);
}

fn register_index(n: i32) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Creates a machine over `callbacks`. Returns null when the table is null
/// or misses a required callback.
///
/// # Safety
///
/// `callbacks` must be null or point to a readable [`HbCallbacks`]. The
/// callbacks must stay callable, with `user`, until [`hb_destroy`].
#[no_mangle]
#[must_use]
pub unsafe extern "C" fn hb_create(callbacks: *const HbCallbacks) -> *mut HbMachine {
    let Some(callbacks) = callbacks.as_ref().copied() else {
        return ptr::null_mut();
    };
    let machine = guard("hb_create", || {
        match Machine::new(Core::new(), contract(callbacks)) {
            Ok(machine) => Some(Box::new(machine)),
            Err(err) => {
                warn!(%err, "rejected callback table");
                None
            }
        }
    });
    machine.map_or(ptr::null_mut(), Box::into_raw)
}

/// Releases a machine. Null is ignored.
///
/// # Safety
///
/// `machine` must be null or a handle from [`hb_create`] not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn hb_destroy(machine: *mut HbMachine) {
    if machine.is_null() {
        return;
    }
    let machine = Box::from_raw(machine);
    guard("hb_destroy", move || drop(machine));
}

/// Resets the engine, dropping an unconsumed bus fault.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_reset(machine: *mut HbMachine) {
    with_machine(machine, "hb_reset", HbMachine::reset);
}

/// Runs until the engine halts.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_execute(machine: *mut HbMachine) {
    with_machine(machine, "hb_execute", HbMachine::run);
}

/// Executes one instruction.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_step(machine: *mut HbMachine) {
    with_machine(machine, "hb_step", HbMachine::step);
}

/// Runs for at least `cycles` clock cycles.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_execute_cycles(machine: *mut HbMachine, cycles: i64) {
    with_machine(machine, "hb_execute_cycles", |m| m.execute_cycles(cycles));
}

/// Runs until the clock reaches `cycle`.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_execute_until(machine: *mut HbMachine, cycle: i64) {
    with_machine(machine, "hb_execute_until", |m| m.execute_until(cycle));
}

/// Enters or leaves supervisor mode.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_set_supervisor_mode(machine: *mut HbMachine, enabled: bool) {
    with_machine(machine, "hb_set_supervisor_mode", |m| {
        m.set_supervisor_mode(enabled);
    });
}

/// Schedules a bus fault at `addr`, delivered at the engine's next bus
/// access or sync. A second call before delivery replaces the first.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_trigger_bus_error(
    machine: *mut HbMachine,
    addr: u32,
    is_write: bool,
) {
    with_machine(machine, "hb_trigger_bus_error", |m| {
        m.schedule_bus_fault(addr, is_write);
    });
}

/// Reads the clock.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_get_clock(machine: *mut HbMachine) -> i64 {
    with_machine(machine, "hb_get_clock", |m| m.clock())
}

/// Writes the clock.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_set_clock(machine: *mut HbMachine, value: i64) {
    with_machine(machine, "hb_set_clock", |m| m.set_clock(value));
}

/// Reads data register `n`.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_get_d(machine: *mut HbMachine, n: i32) -> u32 {
    with_machine(machine, "hb_get_d", |m| m.d(register_index(n)))
}

/// Writes data register `n`.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_set_d(machine: *mut HbMachine, n: i32, value: u32) {
    with_machine(machine, "hb_set_d", |m| m.set_d(register_index(n), value));
}

/// Reads address register `n`.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_get_a(machine: *mut HbMachine, n: i32) -> u32 {
    with_machine(machine, "hb_get_a", |m| m.a(register_index(n)))
}

/// Writes address register `n`.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`].
#[no_mangle]
pub unsafe extern "C" fn hb_set_a(machine: *mut HbMachine, n: i32, value: u32) {
    with_machine(machine, "hb_set_a", |m| m.set_a(register_index(n), value));
}

macro_rules! register_accessors {
    ($($name:literal: $get:ident / $set:ident -> $ty:ty = $getter:ident / $setter:ident;)*) => {
        $(
            #[doc = concat!("Reads ", $name, ".")]
            ///
            /// # Safety
            ///
            /// `machine` must be null or a live handle from [`hb_create`].
            #[no_mangle]
            pub unsafe extern "C" fn $get(machine: *mut HbMachine) -> $ty {
                with_machine(machine, stringify!($get), |m| m.$getter())
            }

            #[doc = concat!("Writes ", $name, ".")]
            ///
            /// # Safety
            ///
            /// `machine` must be null or a live handle from [`hb_create`].
            #[no_mangle]
            pub unsafe extern "C" fn $set(machine: *mut HbMachine, value: $ty) {
                with_machine(machine, stringify!($set), |m| m.$setter(value));
            }
        )*
    };
}

register_accessors! {
    "PC": hb_get_pc / hb_set_pc -> u32 = pc / set_pc;
    "the start-of-instruction PC": hb_get_pc0 / hb_set_pc0 -> u32 = pc0 / set_pc0;
    "the prefetch register": hb_get_irc / hb_set_irc -> u16 = irc / set_irc;
    "the executing opcode": hb_get_ird / hb_set_ird -> u16 = ird / set_ird;
    "the condition codes": hb_get_ccr / hb_set_ccr -> u8 = ccr / set_ccr;
    "SR": hb_get_sr / hb_set_sr -> u16 = sr / set_sr;
    "the active stack pointer": hb_get_sp / hb_set_sp -> u32 = sp / set_sp;
    "the interrupt priority level input": hb_get_ipl / hb_set_ipl -> u8 = ipl / set_ipl;
}

/// Disassembles the instruction at `addr` into `out` and returns its length
/// in bytes. A pending bus fault is left untouched.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`]; `out` must be
/// null or hold [`HB_TEXT_BUFFER_LEN`] bytes.
#[no_mangle]
pub unsafe extern "C" fn hb_disassemble(
    machine: *mut HbMachine,
    out: *mut c_char,
    addr: u32,
) -> i32 {
    with_machine(machine, "hb_disassemble", |m| {
        let mut text = String::new();
        let len = m.disassemble(addr, &mut text);
        unsafe { write_text(out, &text) };
        i32::try_from(len).unwrap_or(i32::MAX)
    })
}

/// Renders SR as `TSIXNZVC` into `out`.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`]; `out` must be
/// null or hold [`HB_TEXT_BUFFER_LEN`] bytes.
#[no_mangle]
pub unsafe extern "C" fn hb_disassemble_sr(machine: *mut HbMachine, out: *mut c_char) {
    with_machine(machine, "hb_disassemble_sr", |m| {
        let mut text = String::new();
        m.disassemble_sr(&mut text);
        unsafe { write_text(out, &text) };
    });
}

macro_rules! dump_functions {
    ($($name:ident($ty:ty) = $method:ident;)*) => {
        $(
            #[doc = concat!("Renders a `", stringify!($ty), "` value as hex into `out`.")]
            ///
            /// # Safety
            ///
            /// `machine` must be null or a live handle from [`hb_create`];
            /// `out` must be null or hold [`HB_TEXT_BUFFER_LEN`] bytes.
            #[no_mangle]
            pub unsafe extern "C" fn $name(
                machine: *mut HbMachine,
                out: *mut c_char,
                value: $ty,
            ) {
                with_machine(machine, stringify!($name), |m| {
                    let mut text = String::new();
                    m.$method(&mut text, value);
                    unsafe { write_text(out, &text) };
                });
            }
        )*
    };
}

dump_functions! {
    hb_dump8(u8) = dump8;
    hb_dump16(u16) = dump16;
    hb_dump24(u32) = dump24;
    hb_dump32(u32) = dump32;
}

/// Fills `out` with `ird`, `sr` and `pc` from live state; the other fields
/// are zero. Null `out` is ignored.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`]; `out` must be
/// null or writable.
#[no_mangle]
pub unsafe extern "C" fn hb_get_stack_frame(
    machine: *mut HbMachine,
    out: *mut HbStackFrame,
) {
    if out.is_null() {
        return;
    }
    with_machine(machine, "hb_get_stack_frame", |m| {
        let frame = HbStackFrame::from(m.exception_frame());
        unsafe { out.write(frame) };
    });
}

/// Writes `ird`, `sr` and `pc` of `frame` into the engine. Null `frame` is
/// ignored.
///
/// # Safety
///
/// `machine` must be null or a live handle from [`hb_create`]; `frame` must
/// be null or readable.
#[no_mangle]
pub unsafe extern "C" fn hb_set_stack_frame(
    machine: *mut HbMachine,
    frame: *const HbStackFrame,
) {
    let Some(frame) = frame.as_ref().copied() else {
        return;
    };
    with_machine(machine, "hb_set_stack_frame", |m| {
        m.set_exception_frame(&ExceptionFrame::from(frame));
    });
}

#[cfg(test)]
mod tests {
    use std::ffi::{c_char, c_void, CStr};
    use std::ptr;

    use rstest::rstest;

    use super::{
        hb_create, hb_destroy, hb_disassemble, hb_disassemble_sr, hb_dump16, hb_dump24,
        hb_dump32, hb_dump8, hb_execute, hb_execute_cycles, hb_execute_until, hb_get_a,
        hb_get_ccr, hb_get_clock, hb_get_d, hb_get_ipl, hb_get_irc, hb_get_pc, hb_get_pc0,
        hb_get_sp, hb_get_sr, hb_get_stack_frame, hb_reset, hb_set_a, hb_set_ccr, hb_set_clock,
        hb_set_d, hb_set_ipl, hb_set_irc, hb_set_ird, hb_set_pc, hb_set_pc0, hb_set_sp, hb_set_sr,
        hb_set_stack_frame, hb_set_supervisor_mode, hb_step, hb_trigger_bus_error, write_text,
        HbCallbacks, HbMachine, HbStackFrame, HB_TEXT_BUFFER_LEN,
    };

    const SSP: u32 = 0x8000;
    const START: u32 = 0x1000;
    const NOP: u16 = 0x4E71;

    struct Ram {
        bytes: Vec<u8>,
        synced: i64,
    }

    impl Ram {
        fn new(program: &[u16]) -> Box<Self> {
            let mut ram = Box::new(Self {
                bytes: vec![0; 0x1_0000],
                synced: 0,
            });
            ram.poke32(0, SSP);
            ram.poke32(4, START);
            for vector in 2..=255 {
                ram.poke32(vector * 4, 0x4000 + vector * 0x10);
            }
            for addr in (0x4000..0x5000).step_by(2) {
                ram.poke16(addr, NOP);
            }
            for (offset, word) in (0u32..).step_by(2).zip(program) {
                ram.poke16(START + offset, *word);
            }
            ram
        }

        fn peek16(&self, addr: u32) -> u16 {
            let at = (addr & 0xFFFF) as usize;
            u16::from_be_bytes([self.bytes[at], self.bytes[at + 1]])
        }

        fn peek32(&self, addr: u32) -> u32 {
            (u32::from(self.peek16(addr)) << 16) | u32::from(self.peek16(addr + 2))
        }

        fn poke16(&mut self, addr: u32, value: u16) {
            let at = (addr & 0xFFFF) as usize;
            self.bytes[at..at + 2].copy_from_slice(&value.to_be_bytes());
        }

        fn poke32(&mut self, addr: u32, value: u32) {
            let at = (addr & 0xFFFF) as usize;
            self.bytes[at..at + 4].copy_from_slice(&value.to_be_bytes());
        }
    }

    fn ram<'a>(user: *mut c_void) -> &'a mut Ram {
        unsafe { &mut *user.cast::<Ram>() }
    }

    extern "C" fn read8(user: *mut c_void, addr: u32) -> u8 {
        ram(user).bytes[(addr & 0xFFFF) as usize]
    }

    extern "C" fn read16(user: *mut c_void, addr: u32) -> u16 {
        ram(user).peek16(addr)
    }

    extern "C" fn write8(user: *mut c_void, addr: u32, value: u8) {
        ram(user).bytes[(addr & 0xFFFF) as usize] = value;
    }

    extern "C" fn write16(user: *mut c_void, addr: u32, value: u16) {
        ram(user).poke16(addr, value);
    }

    extern "C" fn sync(user: *mut c_void, cycles: i32) {
        ram(user).synced += i64::from(cycles);
    }

    extern "C" fn vector(_user: *mut c_void, level: u8) -> u16 {
        0x40 + u16::from(level)
    }

    fn table(ram: &mut Ram) -> HbCallbacks {
        HbCallbacks {
            user: ptr::from_mut(ram).cast(),
            read8: Some(read8),
            read16: Some(read16),
            write8: Some(write8),
            write16: Some(write16),
            sync: Some(sync),
            read_irq_user_vector: Some(vector),
        }
    }

    fn create(ram: &mut Ram) -> *mut HbMachine {
        let callbacks = table(ram);
        let machine = unsafe { hb_create(&callbacks) };
        assert!(!machine.is_null());
        unsafe { hb_reset(machine) };
        machine
    }

    fn text(buffer: &[c_char; HB_TEXT_BUFFER_LEN]) -> String {
        unsafe { CStr::from_ptr(buffer.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    #[rstest]
    #[case::read8(|t: &mut HbCallbacks| t.read8 = None)]
    #[case::read16(|t: &mut HbCallbacks| t.read16 = None)]
    #[case::write8(|t: &mut HbCallbacks| t.write8 = None)]
    #[case::write16(|t: &mut HbCallbacks| t.write16 = None)]
    fn missing_required_callback_yields_null(#[case] strip: fn(&mut HbCallbacks)) {
        let mut memory = Ram::new(&[NOP]);
        let mut callbacks = table(&mut memory);
        strip(&mut callbacks);
        assert!(unsafe { hb_create(&callbacks) }.is_null());
    }

    #[test]
    fn optional_callbacks_may_be_null() {
        let mut memory = Ram::new(&[NOP]);
        let mut callbacks = table(&mut memory);
        callbacks.sync = None;
        callbacks.read_irq_user_vector = None;
        let machine = unsafe { hb_create(&callbacks) };
        assert!(!machine.is_null());
        unsafe {
            hb_reset(machine);
            hb_step(machine);
            assert_eq!(hb_get_pc(machine), START + 2);
            hb_destroy(machine);
        }
        assert_eq!(memory.synced, 0);
    }

    #[test]
    fn null_handles_are_inert() {
        let mut buffer: [c_char; HB_TEXT_BUFFER_LEN] = [1; HB_TEXT_BUFFER_LEN];
        unsafe {
            assert!(hb_create(ptr::null()).is_null());
            hb_destroy(ptr::null_mut());
            hb_step(ptr::null_mut());
            hb_trigger_bus_error(ptr::null_mut(), 0x100, false);
            assert_eq!(hb_get_clock(ptr::null_mut()), 0);
            assert_eq!(hb_get_pc(ptr::null_mut()), 0);
            assert_eq!(hb_disassemble(ptr::null_mut(), buffer.as_mut_ptr(), 0), 0);
        }
        assert_eq!(buffer[0], 1);
    }

    #[test]
    fn scheduled_read_fault_is_stacked_through_the_abi() {
        let mut memory = Ram::new(&[NOP, NOP]);
        let machine = create(&mut memory);
        unsafe {
            hb_set_pc(machine, 0x1000);
            hb_set_sr(machine, 0x2700);
            hb_set_ird(machine, 0x4E71);
            hb_trigger_bus_error(machine, 0x00AB_CDEF, false);
            hb_step(machine);
            assert_eq!(hb_get_pc(machine), 0x4020);
            assert_eq!(hb_get_sp(machine), SSP - 14);
            hb_destroy(machine);
        }
        assert_eq!(memory.peek16(SSP - 14), 0x0010);
        assert_eq!(memory.peek32(SSP - 12), 0x00AB_CDEF);
        assert_eq!(memory.peek16(SSP - 8), 0x4E71);
        assert_eq!(memory.peek16(SSP - 6), 0x2700);
        assert_eq!(memory.peek32(SSP - 4), 0x1002);
    }

    #[test]
    fn registers_round_trip() {
        let mut memory = Ram::new(&[NOP]);
        let machine = create(&mut memory);
        unsafe {
            hb_set_d(machine, 3, 0xDEAD_BEEF);
            hb_set_a(machine, 2, 0x0001_2345);
            hb_set_pc0(machine, 0x2000);
            hb_set_irc(machine, 0x4AFC);
            hb_set_ccr(machine, 0x1F);
            hb_set_ipl(machine, 3);
            hb_set_clock(machine, 1000);
            assert_eq!(hb_get_d(machine, 3), 0xDEAD_BEEF);
            assert_eq!(hb_get_a(machine, 2), 0x0001_2345);
            assert_eq!(hb_get_pc0(machine), 0x2000);
            assert_eq!(hb_get_irc(machine), 0x4AFC);
            assert_eq!(hb_get_ccr(machine), 0x1F);
            assert_eq!(hb_get_sr(machine), 0x271F);
            assert_eq!(hb_get_ipl(machine), 3);
            assert_eq!(hb_get_clock(machine), 1000);
            hb_destroy(machine);
        }
    }

    #[test]
    fn bad_register_index_is_absorbed() {
        let mut memory = Ram::new(&[NOP]);
        let machine = create(&mut memory);
        unsafe {
            assert_eq!(hb_get_d(machine, 8), 0);
            hb_set_a(machine, -1, 5);
            hb_step(machine);
            assert_eq!(hb_get_pc(machine), START + 2);
            hb_destroy(machine);
        }
    }

    #[test]
    fn supervisor_mode_swaps_stacks() {
        let mut memory = Ram::new(&[NOP]);
        let machine = create(&mut memory);
        unsafe {
            hb_set_supervisor_mode(machine, false);
            assert_eq!(hb_get_sr(machine) & 0x2000, 0);
            hb_set_sp(machine, 0x6000);
            hb_set_supervisor_mode(machine, true);
            assert_eq!(hb_get_sp(machine), SSP);
            hb_destroy(machine);
        }
    }

    #[test]
    fn user_interrupt_vector_comes_from_the_table() {
        let mut memory = Ram::new(&[NOP]);
        let machine = create(&mut memory);
        unsafe {
            hb_set_sr(machine, 0x2000);
            hb_set_ipl(machine, 2);
            hb_step(machine);
            assert_eq!(hb_get_pc(machine), 0x4000 + 0x42 * 0x10);
            hb_destroy(machine);
        }
    }

    #[test]
    fn execution_paces_the_host() {
        let mut memory = Ram::new(&[NOP; 32]);
        let machine = create(&mut memory);
        unsafe {
            hb_execute_until(machine, 80);
            assert_eq!(hb_get_clock(machine), 80);
            hb_execute_cycles(machine, 8);
            assert_eq!(hb_get_clock(machine), 88);
            hb_destroy(machine);
        }
        assert_eq!(memory.synced, 88);
    }

    #[test]
    fn execute_returns_on_halt() {
        let mut memory = Ram::new(&[0x4AFC]);
        memory.poke32(0, SSP + 1);
        let machine = create(&mut memory);
        unsafe {
            hb_execute(machine);
            let pc = hb_get_pc(machine);
            let clock = hb_get_clock(machine);
            hb_step(machine);
            assert_eq!(hb_get_pc(machine), pc);
            assert_eq!(hb_get_clock(machine), clock + 4);
            hb_destroy(machine);
        }
    }

    #[test]
    fn text_is_written_nul_terminated() {
        let mut memory = Ram::new(&[0x7A2A]);
        let machine = create(&mut memory);
        let mut buffer: [c_char; HB_TEXT_BUFFER_LEN] = [0; HB_TEXT_BUFFER_LEN];
        unsafe {
            hb_trigger_bus_error(machine, 0x100, false);
            assert_eq!(hb_disassemble(machine, buffer.as_mut_ptr(), START), 2);
            assert_eq!(text(&buffer), "moveq   #$2a,d5");

            hb_disassemble_sr(machine, buffer.as_mut_ptr());
            assert_eq!(text(&buffer), "-S7-----");

            hb_dump8(machine, buffer.as_mut_ptr(), 0x0A);
            assert_eq!(text(&buffer), "$0a");
            hb_dump16(machine, buffer.as_mut_ptr(), 0x4E71);
            assert_eq!(text(&buffer), "$4e71");
            hb_dump24(machine, buffer.as_mut_ptr(), 0x00AB_CDEF);
            assert_eq!(text(&buffer), "$abcdef");
            hb_dump32(machine, buffer.as_mut_ptr(), 0x00AB_CDEF);
            assert_eq!(text(&buffer), "$00abcdef");

            // The disassembler peeks, so the fault is still pending here.
            hb_step(machine);
            assert_eq!(hb_get_pc(machine), 0x4020);
            hb_destroy(machine);
        }
    }

    #[test]
    fn long_text_is_truncated() {
        let mut buffer: [c_char; HB_TEXT_BUFFER_LEN] = [1; HB_TEXT_BUFFER_LEN];
        let long = "x".repeat(HB_TEXT_BUFFER_LEN * 2);
        unsafe { write_text(buffer.as_mut_ptr(), &long) };
        assert_eq!(text(&buffer).len(), HB_TEXT_BUFFER_LEN - 1);
        assert_eq!(buffer[HB_TEXT_BUFFER_LEN - 1], 0);
    }

    #[test]
    fn stack_frame_marshalling() {
        let mut memory = Ram::new(&[NOP]);
        let machine = create(&mut memory);
        let written = HbStackFrame {
            code: 0x0010,
            addr: 0x00AB_CDEF,
            ird: 0x4AFC,
            sr: 0x2015,
            pc: 0x2000,
            fc: 5,
            ssw: 7,
        };
        let mut read = HbStackFrame {
            code: 0xFFFF,
            ..HbStackFrame::default()
        };
        unsafe {
            hb_set_stack_frame(machine, &written);
            hb_get_stack_frame(machine, &mut read);
            hb_set_stack_frame(machine, ptr::null());
            hb_get_stack_frame(machine, ptr::null_mut());
            hb_destroy(machine);
        }
        assert_eq!(
            read,
            HbStackFrame {
                ird: 0x4AFC,
                sr: 0x2015,
                pc: 0x2000,
                ..HbStackFrame::default()
            }
        );
    }
}
