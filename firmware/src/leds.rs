//! Indicator LEDs: the Teensy LED on PD6 and the three right-half LEDs on
//! PB5-PB7. All are active high.

use avr_device::atmega32u4::Peripherals;
use plnu_keymap::Indicator;

const BOARD_MASK: u8 = 1 << 6;
const RIGHT_MASK: u8 = 0xE0;

pub fn init(dp: &Peripherals) {
    dp.PORTD.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | BOARD_MASK) });
    dp.PORTB.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | RIGHT_MASK) });
    dp.PORTD.portd.modify(|r, w| unsafe { w.bits(r.bits() & !BOARD_MASK) });
    dp.PORTB.portb.modify(|r, w| unsafe { w.bits(r.bits() & !RIGHT_MASK) });
}

pub fn set(dp: &Peripherals, led: Indicator, on: bool) {
    let update = |bits: u8, mask: u8| if on { bits | mask } else { bits & !mask };
    match led {
        Indicator::Board => dp
            .PORTD
            .portd
            .modify(|r, w| unsafe { w.bits(update(r.bits(), BOARD_MASK)) }),
        Indicator::Right1 => dp
            .PORTB
            .portb
            .modify(|r, w| unsafe { w.bits(update(r.bits(), 1 << 5)) }),
        Indicator::Right2 => dp
            .PORTB
            .portb
            .modify(|r, w| unsafe { w.bits(update(r.bits(), 1 << 6)) }),
        Indicator::Right3 => dp
            .PORTB
            .portb
            .modify(|r, w| unsafe { w.bits(update(r.bits(), 1 << 7)) }),
    }
}
