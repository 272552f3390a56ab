//! Deferred bus-fault delivery through the host adapter's public surface.

use host_bridge::{
    AccessKind, CallbackContract, CallbackSlot, ContractError, CpuSnapshot, FaultState,
    HostAdapter, HostBus,
};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

#[derive(Debug, Default)]
struct Bus {
    memory: Vec<u8>,
    events: Vec<String>,
}

fn contract() -> CallbackContract<Bus> {
    CallbackContract::new(Bus {
        memory: vec![0; 0x100],
        events: Vec::new(),
    })
    .with_read8(|bus, addr| {
        bus.events.push(format!("read8 {addr:#x}"));
        bus.memory[addr as usize & 0xFF]
    })
    .with_read16(|bus, addr| {
        bus.events.push(format!("read16 {addr:#x}"));
        let at = addr as usize & 0xFE;
        u16::from_be_bytes([bus.memory[at], bus.memory[at + 1]])
    })
    .with_write8(|bus, addr, value| {
        bus.events.push(format!("write8 {addr:#x}"));
        bus.memory[addr as usize & 0xFF] = value;
    })
    .with_write16(|bus, addr, value| {
        bus.events.push(format!("write16 {addr:#x}"));
        let at = addr as usize & 0xFE;
        bus.memory[at..at + 2].copy_from_slice(&value.to_be_bytes());
    })
    .with_sync(|bus, cycles| bus.events.push(format!("sync {cycles}")))
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read8,
    Read16,
    Write8,
    Write16,
    Sync,
}

fn perform(host: &mut HostAdapter<Bus>, cpu: &CpuSnapshot, access: Access) -> bool {
    match access {
        Access::Read8 => host.read8(cpu, 0x10).is_err(),
        Access::Read16 => host.read16(cpu, 0x10).is_err(),
        Access::Write8 => host.write8(cpu, 0x10, 1).is_err(),
        Access::Write16 => host.write16(cpu, 0x10, 1).is_err(),
        Access::Sync => host.sync(cpu, 4).is_err(),
    }
}

fn access() -> impl Strategy<Value = Access> {
    prop_oneof![
        Just(Access::Read8),
        Just(Access::Read16),
        Just(Access::Write8),
        Just(Access::Write16),
        Just(Access::Sync),
    ]
}

#[rstest]
#[case(Access::Read8, "read8 0x10")]
#[case(Access::Read16, "read16 0x10")]
#[case(Access::Write8, "write8 0x10")]
#[case(Access::Write16, "write16 0x10")]
fn callbacks_run_before_delivery(#[case] access: Access, #[case] event: &str) {
    let mut host = HostAdapter::new(contract()).expect("complete contract");
    host.schedule_bus_fault(0x40, AccessKind::Read);
    assert!(perform(&mut host, &CpuSnapshot::default(), access));
    assert_eq!(host.context().events, vec![event.to_owned()]);
}

#[test]
fn sync_fault_skips_the_callback() {
    let mut host = HostAdapter::new(contract()).expect("complete contract");
    host.schedule_bus_fault(0x40, AccessKind::Write);
    assert!(perform(&mut host, &CpuSnapshot::default(), Access::Sync));
    assert!(host.context().events.is_empty());
    assert!(!perform(&mut host, &CpuSnapshot::default(), Access::Sync));
    assert_eq!(host.context().events, vec!["sync 4".to_owned()]);
}

#[test]
fn missing_slots_are_named() {
    let error = HostAdapter::new(CallbackContract::new(Bus::default()).with_read8(|_, _| 0))
        .err()
        .expect("incomplete contract");
    assert_eq!(error, ContractError::MissingCallback(CallbackSlot::Read16));
    assert!(error.to_string().contains("read16"));
}

#[test]
fn cleared_fault_is_never_delivered() {
    let mut host = HostAdapter::new(contract()).expect("complete contract");
    host.schedule_bus_fault(0x40, AccessKind::Read);
    let dropped = host.clear_pending_fault().expect("fault was pending");
    assert_eq!(dropped.address, 0x40);
    assert!(!perform(&mut host, &CpuSnapshot::default(), Access::Read16));
    assert_eq!(host.faults().state(), FaultState::Idle);
}

proptest! {
    #[test]
    fn one_delivery_per_schedule_stamped_at_the_access(
        schedules in prop::collection::vec((any::<u32>(), any::<bool>()), 1..6),
        accesses in prop::collection::vec(access(), 1..12),
        pc in any::<u32>(),
        sr in any::<u16>(),
        ird in any::<u16>(),
    ) {
        let mut host = HostAdapter::new(contract()).expect("complete contract");
        for (address, is_write) in &schedules {
            host.schedule_bus_fault(*address, AccessKind::from_is_write(*is_write));
        }
        let (address, is_write) = *schedules.last().expect("non-empty");

        let cpu = CpuSnapshot { ird, sr, pc };
        let first = accesses[0];
        let fault = match first {
            Access::Read8 => host.read8(&cpu, 0x10).err(),
            Access::Read16 => host.read16(&cpu, 0x10).err(),
            Access::Write8 => host.write8(&cpu, 0x10, 1).err(),
            Access::Write16 => host.write16(&cpu, 0x10, 1).err(),
            Access::Sync => host.sync(&cpu, 4).err(),
        }
        .expect("first access delivers");

        prop_assert_eq!(fault.frame.addr, address);
        prop_assert_eq!(fault.frame.code, if is_write { 0x0000 } else { 0x0010 });
        prop_assert_eq!((fault.frame.ird, fault.frame.sr, fault.frame.pc), (ird, sr, pc));
        prop_assert_eq!((fault.frame.fc, fault.frame.ssw), (0, 0));

        for access in &accesses[1..] {
            prop_assert!(!perform(&mut host, &cpu, *access));
        }
    }
}
