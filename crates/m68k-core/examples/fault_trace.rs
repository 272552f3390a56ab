//! Prints a listing and a replay fingerprint for a short loop interrupted by
//! a host-scheduled bus fault.

use host_bridge::{CallbackContract, Machine};
use m68k_core::Core;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const START: u32 = 0x1000;
const HANDLER: u32 = 0x2000;

const PROGRAM: [u16; 6] = [
    0x7005, // moveq   #5,d0
    0x207C, 0x0000, 0x3000, // movea.l #$3000,a0
    0x30C0, // move.w  d0,(a0)+
    0x60FC, // bra.s   $1008
];

fn load(memory: &mut [u8], addr: u32, words: &[u16]) {
    for (offset, word) in (0..).step_by(2).zip(words) {
        let at = addr as usize + offset;
        memory[at..at + 2].copy_from_slice(&word.to_be_bytes());
    }
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn main() {
    let mut memory = vec![0u8; 0x1_0000];
    memory[..4].copy_from_slice(&0x8000u32.to_be_bytes());
    memory[4..8].copy_from_slice(&START.to_be_bytes());
    for vector in 2..64usize {
        memory[vector * 4..vector * 4 + 4].copy_from_slice(&HANDLER.to_be_bytes());
    }
    load(&mut memory, START, &PROGRAM);
    // stop #$2700
    load(&mut memory, HANDLER, &[0x4E72, 0x2700]);

    let contract = CallbackContract::new(memory)
        .with_read8(|memory, addr| memory[addr as usize & 0xFFFF])
        .with_read16(|memory, addr| {
            let at = addr as usize & 0xFFFF;
            u16::from_be_bytes([memory[at], memory[at + 1]])
        })
        .with_write8(|memory, addr, value| memory[addr as usize & 0xFFFF] = value)
        .with_write16(|memory, addr, value| {
            let at = addr as usize & 0xFFFF;
            memory[at..at + 2].copy_from_slice(&value.to_be_bytes());
        });
    let mut machine = Machine::new(Core::new(), contract).expect("contract is complete");
    machine.reset();

    let mut line = String::new();
    let mut pc = START;
    while pc < START + 12 {
        let len = machine.disassemble(pc, &mut line);
        println!("{pc:06x}  {line}");
        pc += u32::try_from(len).expect("instruction length fits");
    }

    machine.execute_cycles(100);
    machine.schedule_bus_fault(0x00AB_CDEF, true);
    machine.execute_cycles(200);

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    hash_bytes(&mut hash, &machine.clock().to_le_bytes());
    hash_bytes(&mut hash, &machine.pc().to_be_bytes());
    hash_bytes(&mut hash, &machine.sr().to_be_bytes());
    hash_bytes(&mut hash, &machine.host().context()[0x7FF0..0x8000]);

    machine.disassemble_sr(&mut line);
    println!("clock={} pc={:06x} sr={line}", machine.clock(), machine.pc());
    println!("fingerprint={hash:016x}");
}
