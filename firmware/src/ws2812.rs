//! Bit-banged WS2812 driver for the underglow strip on PD7.
//!
//! Timing is counted in cycles at 16 MHz (62.5 ns each): a 0 bit is high
//! for ~7 cycles, a 1 bit for ~14, and every bit takes ~20.

use avr_device::atmega32u4::Peripherals;
use plnu_keymap::rgblight::Rgb;

const DATA_MASK: u8 = 1 << 7;

pub fn init(dp: &Peripherals) {
    dp.PORTD.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | DATA_MASK) });
    dp.PORTD.portd.modify(|r, w| unsafe { w.bits(r.bits() & !DATA_MASK) });
}

/// Show `color` on the first `count` LEDs of the strip.
pub fn write_all(color: Rgb, count: usize) {
    avr_device::interrupt::free(|_| {
        for _ in 0..count {
            // The strip expects green first.
            send_byte(color.g);
            send_byte(color.r);
            send_byte(color.b);
        }
    });
    // The strip latches after >50 us of low.
    for _ in 0..250u16 {
        unsafe { core::arch::asm!("nop") };
    }
}

#[inline(always)]
fn send_byte(byte: u8) {
    // PORTD is I/O address 0x0B.
    unsafe {
        core::arch::asm!(
            "ldi {count}, 8",
            "1:",
            "sbi 0x0B, 7",
            "nop",
            "nop",
            "sbrs {byte}, 7",
            "cbi 0x0B, 7",
            "lsl {byte}",
            "nop",
            "nop",
            "nop",
            "nop",
            "nop",
            "cbi 0x0B, 7",
            "nop",
            "nop",
            "nop",
            "dec {count}",
            "brne 1b",
            byte = inout(reg) byte => _,
            count = out(reg_upper) _,
        );
    }
}
