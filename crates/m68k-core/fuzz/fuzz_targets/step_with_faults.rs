#![no_main]

use host_bridge::{CallbackContract, CpuView, Engine, Machine};
use libfuzzer_sys::fuzz_target;
use m68k_core::{decode, disassemble_one, Core};

const MEMORY: usize = 0x1_0000;

fn index(addr: u32) -> usize {
    (addr as usize) & (MEMORY - 1)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let _ = decode(u16::from_be_bytes([data[0], data[1]]));

    let mut memory = vec![0u8; MEMORY];
    memory[..4].copy_from_slice(&0x8000u32.to_be_bytes());
    memory[4..8].copy_from_slice(&0x1000u32.to_be_bytes());
    let program = &data[8..];
    let len = program.len().min(MEMORY - 0x1000);
    memory[0x1000..0x1000 + len].copy_from_slice(&program[..len]);

    let contract = CallbackContract::new(memory)
        .with_read8(|memory, addr| memory[index(addr)])
        .with_read16(|memory, addr| {
            u16::from_be_bytes([memory[index(addr)], memory[index(addr.wrapping_add(1))]])
        })
        .with_write8(|memory, addr, value| memory[index(addr)] = value)
        .with_write16(|memory, addr, value| {
            let [high, low] = value.to_be_bytes();
            memory[index(addr)] = high;
            memory[index(addr.wrapping_add(1))] = low;
        });
    let Ok(mut machine) = Machine::new(Core::new(), contract) else {
        return;
    };
    machine.reset();

    let fault_at = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let schedule_every = usize::from(data[4]) + 1;
    for step in 0..256 {
        if step % schedule_every == 0 {
            machine.schedule_bus_fault(fault_at, data[5] & 1 != 0);
        }
        let clock = machine.clock();
        machine.step();
        assert!(machine.clock() >= clock);
        if machine.engine().is_halted() {
            break;
        }
    }

    let (mut engine, mut host) = machine.into_parts();
    let _ = disassemble_one(&mut host, engine.pc());
    engine.reset(&mut host);
});
