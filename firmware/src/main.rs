//! ErgoDox EZ firmware for the ATmega32U4 (Teensy 2.0) running the `plnu`
//! layout.
//!
//! - Matrix scanning for both halves (right via GPIO, left via MCP23018 I2C)
//! - Per-key debouncing into timestamped key events
//! - The shared keymap engine: layers, mod-taps, one-shot mods, mouse keys
//! - USB HID keyboard, mouse/consumer and raw HID telemetry
//! - Indicator LEDs, WS2812 underglow and EEPROM-backed settings

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod board;
mod debounce;
mod eeprom;
mod hid;
mod i2c;
mod leds;
mod matrix;
mod timer;
mod ws2812;

use avr_device::atmega32u4::Peripherals;
use plnu_keymap::config::RAW_EPSIZE;
use plnu_keymap::{Keyboard, LedState};

use board::Board;
use debounce::Debouncer;
use hid::UsbDevice;
use i2c::Mcp23018;

/// Panic handler: on AVR we just loop forever.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// Main entry point.
#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Disable clock prescaler (CLKPR), the Teensy fuses run at 16MHz
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) }); // Prescaler = 1

    matrix::init_gpio(&dp);
    timer::init(&dp.TC0);

    // A missing left half is picked up again by the periodic reinit
    let mut mcp = Mcp23018::new();
    let _ = mcp.init(&dp.TWI);

    let mut usb = UsbDevice::new();
    usb.init(&dp);

    let mut board = Board::new(dp, usb);
    let mut debouncer = Debouncer::new();
    let mut keyboard = Keyboard::new();

    unsafe { avr_device::interrupt::enable() };
    keyboard.init(&mut board);

    // Re-init counter for MCP23018 (retry every ~1 second)
    let mut reinit_counter: u16 = 0;
    let mut raw = [0u8; RAW_EPSIZE];

    loop {
        let now = timer::now();

        // Poll USB (handle enumeration, control requests)
        board.usb.poll(&board.dp);
        if let Some(bits) = board.usb.take_led_report() {
            keyboard.set_led_state(LedState(bits), &mut board);
        }
        if board.usb.read_raw(&board.dp, &mut raw) {
            keyboard.raw_hid_receive(&raw, &mut board);
        }

        reinit_counter = reinit_counter.wrapping_add(1);
        if reinit_counter % 1024 == 0 {
            mcp.try_reinit(&board.dp.TWI);
        }

        let raw_state = matrix::scan(&board.dp, &mut mcp);
        debouncer.update(&raw_state, now, |event| keyboard.process(event, &mut board));
        keyboard.tick(now, &mut board);

        while let Some(report) = keyboard.pop_report() {
            board.send(&report);
        }
        if board.type_next() {
            // The typed string left the host with an empty report
            keyboard.resync_keyboard_report();
        }
        board.refresh_underglow(now);
        board.persist();

        // One scan per millisecond tick
        while timer::now() == now {}
    }
}
