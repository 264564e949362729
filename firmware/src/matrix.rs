//! Key matrix scanning for the ErgoDox EZ.
//!
//! The 6×14 matrix is split across two halves:
//! - Right half: directly wired to Teensy GPIO pins
//! - Left half: connected via MCP23018 I2C I/O expander
//!
//! On the PCB the 7 drive pins (PB0-PB3, PD2, PD3, PC6) connect to physical
//! columns and the 6 read pins (PF0, PF1, PF4-PF7) connect to physical rows.
//! We transpose when storing into the state matrix to get the correct
//! [row][col] layout.

use avr_device::atmega32u4::Peripherals;
use plnu_keymap::{COLS, COLS_PER_HALF, ROWS};

use crate::i2c::Mcp23018;

/// Complete matrix state, `true` = pressed.
pub type MatrixState = [[bool; COLS]; ROWS];

/// Initialize the Teensy GPIO pins for matrix scanning (right half).
///
/// Pin mapping on Teensy 2.0 (ATmega32U4):
///   Drive pins (active-low outputs): PB0, PB1, PB2, PB3, PD2, PD3, PC6
///   Read pins (inputs w/ pull-up):   PF0, PF1, PF4, PF5, PF6, PF7
pub fn init_gpio(dp: &Peripherals) {
    let portb = &dp.PORTB;
    let portc = &dp.PORTC;
    let portd = &dp.PORTD;
    let portf = &dp.PORTF;

    // PB0-PB3: output, drive high
    portb.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | 0x0F) });
    portb.portb.modify(|r, w| unsafe { w.bits(r.bits() | 0x0F) });
    // PD2-PD3: output, drive high
    portd.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | 0x0C) });
    portd.portd.modify(|r, w| unsafe { w.bits(r.bits() | 0x0C) });
    // PC6: output, drive high
    portc.ddrc.modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });
    portc.portc.modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });

    // PF0, PF1, PF4-PF7: input with pull-up
    portf.ddrf.modify(|r, w| unsafe { w.bits(r.bits() & !(0x03 | 0xF0)) });
    portf.portf.modify(|r, w| unsafe { w.bits(r.bits() | 0x03 | 0xF0) });
}

/// Drive a specific pin low. All other drive pins high.
fn drive_pin(dp: &Peripherals, index: usize) {
    release_all(dp);

    let portb = &dp.PORTB;
    let portc = &dp.PORTC;
    let portd = &dp.PORTD;
    match index {
        0 => portb.portb.modify(|r, w| unsafe { w.bits(r.bits() & !0x01) }), // PB0
        1 => portb.portb.modify(|r, w| unsafe { w.bits(r.bits() & !0x02) }), // PB1
        2 => portb.portb.modify(|r, w| unsafe { w.bits(r.bits() & !0x04) }), // PB2
        3 => portb.portb.modify(|r, w| unsafe { w.bits(r.bits() & !0x08) }), // PB3
        4 => portd.portd.modify(|r, w| unsafe { w.bits(r.bits() & !0x04) }), // PD2
        5 => portd.portd.modify(|r, w| unsafe { w.bits(r.bits() & !0x08) }), // PD3
        6 => portc.portc.modify(|r, w| unsafe { w.bits(r.bits() & !0x40) }), // PC6
        _ => {}
    }
}

fn release_all(dp: &Peripherals) {
    dp.PORTB.portb.modify(|r, w| unsafe { w.bits(r.bits() | 0x0F) });
    dp.PORTD.portd.modify(|r, w| unsafe { w.bits(r.bits() | 0x0C) });
    dp.PORTC.portc.modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });
}

/// Read the six row pins. Returns 6 bits, active low.
fn read_pins(dp: &Peripherals) -> u8 {
    let pinf = dp.PORTF.pinf.read().bits();

    // Bits 0-1 = PF0-PF1, bits 2-5 = PF4-PF7
    (pinf & 0x03) | ((pinf >> 2) & 0x3C)
}

/// Scan the entire matrix (right half via GPIO, left half via MCP23018).
pub fn scan(dp: &Peripherals, mcp: &mut Mcp23018) -> MatrixState {
    let twi = &dp.TWI;
    let mut state = [[false; COLS]; ROWS];

    for drive in 0..COLS_PER_HALF {
        drive_pin(dp, drive);
        tiny_delay();
        let right = read_pins(dp);
        let left = mcp.read_row(twi, drive as u8);

        for (row, keys) in state.iter_mut().enumerate() {
            // Transposed: read pin = physical row, drive pin = physical column
            keys[drive] = (left >> row) & 1 == 0;
            keys[COLS_PER_HALF + drive] = (right >> row) & 1 == 0;
        }
    }

    release_all(dp);
    state
}

/// Short delay for pin settling (~5us at 16MHz).
#[inline(always)]
fn tiny_delay() {
    for _ in 0..20u8 {
        unsafe { core::arch::asm!("nop") };
    }
}
