//! Free-running 16-bit millisecond counter on Timer0.

use core::cell::Cell;

use avr_device::atmega32u4::TC0;
use avr_device::interrupt::Mutex;

/// 16 MHz / 64 / 250 = 1 kHz
const TIMER_COUNTS: u8 = 250;

static MILLIS: Mutex<Cell<u16>> = Mutex::new(Cell::new(0));

/// Start Timer0 in CTC mode. Interrupts must be enabled afterwards.
pub fn init(tc0: &TC0) {
    tc0.tccr0a.write(|w| w.wgm0().ctc());
    tc0.ocr0a.write(|w| unsafe { w.bits(TIMER_COUNTS - 1) });
    tc0.tccr0b.write(|w| w.cs0().prescale_64());
    tc0.timsk0.write(|w| w.ocie0a().set_bit());

    avr_device::interrupt::free(|cs| MILLIS.borrow(cs).set(0));
}

#[avr_device::interrupt(atmega32u4)]
fn TIMER0_COMPA() {
    avr_device::interrupt::free(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    });
}

/// Milliseconds since `init`, wrapping every 65.5 s.
pub fn now() -> u16 {
    avr_device::interrupt::free(|cs| MILLIS.borrow(cs).get())
}
