/*
    test_bus: tests for the Z80CHIPS library.
    Copyright (C) 2020-2023  Rafal Michalski

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! Runs Z80 programs talking to the chips through the I/O bus with interrupts in mode 2.
use core::num::NonZeroU16;
use z80chips::z80emu::{*, host::TsCounter};
use z80chips::ChannelId::{A, B};
use z80chips::ChipSet;
use z80chips::bus::PortMatch;
use z80chips::daisy::{DaisyDevice, IntState};
use z80chips::dart::Z80Dart;
use z80chips::pio::{PioDevice, Z80Pio};

const STACK: u16 = 0x8000;
const RESULT: u16 = 0x9000;
const ISR_DART: u16 = 0x0100;
const ISR_PIO: u16 = 0x0180;

#[derive(Default, Debug)]
struct Keypad {
    key: u8
}

impl PioDevice for Keypad {
    fn read_port_a(&mut self) -> u8 {
        self.key
    }
}

struct Machine {
    mem: Box<[u8]>,
    chips: ChipSet<Keypad, ()>
}

impl Machine {
    fn new(program: &[(u16, &[u8])]) -> Self {
        let mut mem = vec![0u8; 0x10000].into_boxed_slice();
        for &(addr, code) in program.iter() {
            let addr = addr as usize;
            mem[addr..addr + code.len()].copy_from_slice(code);
        }
        let mut chips = ChipSet::new();
        chips.attach(Z80Pio::new(Keypad::default()).into(), PortMatch::new(0x00));
        chips.attach(Z80Dart::new(()).into(), PortMatch::new(0x04));
        Machine { mem, chips }
    }

    fn pio(&mut self) -> &mut Z80Pio<Keypad> {
        self.chips.chain_mut()[0].as_pio_mut().unwrap()
    }

    fn dart(&mut self) -> &mut Z80Dart<()> {
        self.chips.chain_mut()[1].as_dart_mut().unwrap()
    }

    fn run_until_halt<C: Cpu>(&mut self, cpu: &mut C) {
        let mut tsc = TsCounter::<i32>::default();
        match cpu.execute_with_limit(self, &mut tsc, 100_000) {
            Err(BreakCause::Halt) => {}
            Err(_) => panic!("unexpected break"),
            Ok(()) => panic!("the program did not halt")
        }
    }
}

impl Memory for Machine {
    type Timestamp = i32;

    fn read_debug(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn read_mem(&self, addr: u16, _ts: i32) -> u8 {
        self.mem[addr as usize]
    }

    fn read_mem16(&self, addr: u16, _ts: i32) -> u16 {
        let lo = self.mem[addr as usize];
        let hi = self.mem[addr.wrapping_add(1) as usize];
        u16::from_le_bytes([lo, hi])
    }

    fn read_opcode(&mut self, pc: u16, _ir: u16, _ts: i32) -> u8 {
        self.mem[pc as usize]
    }

    fn write_mem(&mut self, addr: u16, value: u8, _ts: i32) {
        self.mem[addr as usize] = value;
    }
}

impl Io for Machine {
    type Timestamp = i32;
    type WrIoBreak = ();
    type RetiBreak = ();

    fn is_irq(&mut self, ts: i32) -> bool {
        self.chips.is_irq(ts)
    }

    fn read_io(&mut self, port: u16, ts: i32) -> (u8, Option<NonZeroU16>) {
        self.chips.read_io(port, ts)
    }

    fn write_io(&mut self, port: u16, data: u8, ts: i32) -> (Option<()>, Option<NonZeroU16>) {
        self.chips.write_io(port, data, ts)
    }

    fn irq_data(&mut self, pc: u16, ts: i32) -> (u8, Option<NonZeroU16>) {
        self.chips.irq_data(pc, ts)
    }

    fn reti(&mut self, addr: u16, ts: i32) -> Option<()> {
        self.chips.reti(addr, ts)
    }
}

#[rustfmt::skip]
const INIT: &[u8] = &[
    0xF3,             // DI
    0x31, 0x00, 0x80, // LD   SP, 0x8000
    0x3E, 0x10,       // LD   A, 0x10
    0xED, 0x47,       // LD   I, A
    0xED, 0x5E,       // IM   2
    // PIO port A: vector, input mode, interrupts enabled
    0x3E, 0x40,       // LD   A, 0x40
    0xD3, 0x02,       // OUT  (0x02), A
    0x3E, 0x4F,       // LD   A, 0x4F
    0xD3, 0x02,       // OUT  (0x02), A
    0x3E, 0x87,       // LD   A, 0x87
    0xD3, 0x02,       // OUT  (0x02), A
    // DART channel B: WR2 vector
    0x3E, 0x02,       // LD   A, 2
    0xD3, 0x07,       // OUT  (0x07), A
    0x3E, 0x20,       // LD   A, 0x20
    0xD3, 0x07,       // OUT  (0x07), A
    // DART channel A: WR1 interrupt on all received characters
    0x3E, 0x01,       // LD   A, 1
    0xD3, 0x06,       // OUT  (0x06), A
    0x3E, 0x18,       // LD   A, 0x18
    0xD3, 0x06,       // OUT  (0x06), A
    0xFB,             // EI
    0x76,             // HALT
    0x18, 0xFD,       // JR   -3
];

#[rustfmt::skip]
const DART_ISR: &[u8] = &[
    0xF5,             // PUSH AF
    0xDB, 0x04,       // IN   A, (0x04)
    0x32, 0x00, 0x90, // LD   (0x9000), A
    0xF1,             // POP  AF
    0xFB,             // EI
    0xED, 0x4D,       // RETI
];

#[rustfmt::skip]
const PIO_ISR: &[u8] = &[
    0xF5,             // PUSH AF
    0xDB, 0x00,       // IN   A, (0x00)
    0x32, 0x01, 0x90, // LD   (0x9001), A
    0xF1,             // POP  AF
    0xFB,             // EI
    0xED, 0x4D,       // RETI
];

fn machine() -> Machine {
    let [dart_lo, dart_hi] = ISR_DART.to_le_bytes();
    let [pio_lo, pio_hi] = ISR_PIO.to_le_bytes();
    Machine::new(&[
        (0x0000, INIT),
        (ISR_DART, DART_ISR),
        (ISR_PIO, PIO_ISR),
        (0x1020, &[dart_lo, dart_hi][..]),
        (0x1040, &[pio_lo, pio_hi][..]),
    ])
}

#[test]
fn cpu_services_dart_interrupt() {
    let mut machine = machine();
    let mut cpu = Z80NMOS::default();
    cpu.reset();
    machine.run_until_halt(&mut cpu);
    assert_eq!(cpu.get_sp(), STACK);
    assert_eq!(machine.pio().port(A).interrupt_vector(), 0x40);
    assert_eq!(machine.dart().channel(B).wr(2), 0x20);

    machine.dart().receive_data(A, b'Q');
    machine.run_until_halt(&mut cpu);
    assert_eq!(machine.mem[RESULT as usize], b'Q');
    assert_eq!(machine.dart().irq_state(), IntState::empty());
    assert!(!machine.dart().int_line());
    assert_eq!(cpu.get_sp(), STACK);
}

#[test]
fn cpu_services_interrupts_by_priority() {
    let mut machine = machine();
    let mut cpu = Z80NMOS::default();
    cpu.reset();
    machine.run_until_halt(&mut cpu);
    machine.dart().receive_data(A, b'D');
    machine.pio().device.key = b'P';
    machine.pio().strobe_a(false);
    machine.pio().strobe_a(true);
    assert!(machine.pio().int_line());
    assert!(machine.dart().int_line());
    // the PIO is serviced first, then the DART
    machine.run_until_halt(&mut cpu);
    assert_eq!(machine.mem[RESULT as usize + 1], b'P');
    assert_eq!(machine.mem[RESULT as usize], b'D');
    assert_eq!(machine.pio().irq_state(), IntState::empty());
    assert_eq!(machine.dart().irq_state(), IntState::empty());
    assert_eq!(cpu.get_sp(), STACK);
}
