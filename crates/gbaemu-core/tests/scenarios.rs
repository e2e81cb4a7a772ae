//! End-to-end scenarios driven through the system bus, the way CPU code
//! would drive the hardware.

use gbaemu_core::{SystemConfig, build_system};
use gbaemu_hw::irq;
use gbaemu_hw::mmio::{lcd, pic};
use gbaemu_hw::specs::display::{DRAW_NS, HBLANK_NS, LINE_NS};

const IE: u32 = pic::BASE + pic::registers::IE;
const IF: u32 = pic::BASE + pic::registers::IF;
const IME: u32 = pic::BASE + pic::registers::IME;
const DISPSTAT: u32 = lcd::BASE + lcd::registers::DISPSTAT;
const VCOUNT: u32 = lcd::BASE + lcd::registers::VCOUNT;

#[test]
fn acknowledge_clears_pending_interrupt() {
    let mut system = build_system(&SystemConfig {
        display_clock: false,
        ..Default::default()
    })
    .unwrap();

    system.write(IME, 2, 0);
    system.write(IE, 2, 0x0004);
    system.io.pic.set_input_line(2, true);

    assert_eq!(system.read(IF, 2), 0x0004);
    assert!(system.irq_asserted());

    system.write(IF, 2, 0x0004);
    assert_eq!(system.read(IF, 2), 0x0000);
    assert!(!system.irq_asserted());
}

#[test]
fn vblank_interrupt_raised_entering_line_160() {
    let mut system = build_system(&SystemConfig::default()).unwrap();
    system.write(DISPSTAT, 2, 0x0008);

    // Firing 2n moves into line n; the first firing happens at time zero
    let entry_time = |line: u64| line * HBLANK_NS + (line - 1) * DRAW_NS;

    system.advance_to(entry_time(160) - 1);
    assert_eq!(system.read(VCOUNT, 2), 159);
    assert_eq!(system.io.pic.level & (1 << irq::VBLANK), 0);

    system.advance_to(entry_time(160));
    assert_eq!(system.read(VCOUNT, 2), 160);
    assert_eq!(system.read(DISPSTAT, 2) & 1, 1);
    assert_ne!(system.io.pic.level & (1 << irq::VBLANK), 0);
}

#[test]
fn vblank_reaches_cpu_only_when_enabled() {
    let mut system = build_system(&SystemConfig::default()).unwrap();
    system.write(DISPSTAT, 2, 0x0008);
    system.write(IE, 2, 1 << irq::VBLANK);

    system.advance_by(LINE_NS * 165);
    assert!(!system.irq_asserted(), "IME still off");

    system.write(IME, 4, 0);
    assert!(system.irq_asserted());

    // Acknowledge with a single word store to IE/IF
    system.write(IE, 4, (1 << irq::VBLANK) << 16 | 1 << irq::VBLANK);
    assert!(!system.irq_asserted());
}

#[test]
fn vcount_interrupt_on_programmed_line() {
    let mut system = build_system(&SystemConfig::default()).unwrap();
    system.write(IME, 2, 0);
    system.write(IE, 2, 1 << irq::VCOUNT);
    system.write(DISPSTAT, 2, 0x0020 | 42 << 8);

    let mut raised_on = Vec::new();
    for _ in 0..228 * 4 {
        system.advance_by(LINE_NS / 4);
        if system.irq_asserted() {
            raised_on.push(system.read(VCOUNT, 2));
            system.write(IF, 2, 1 << irq::VCOUNT);
        }
    }

    assert_eq!(raised_on, vec![42]);
}
