//! The ErgoDox EZ as seen by the keymap: USB, indicator LEDs, underglow
//! and the persistent store.

use avr_device::atmega32u4::Peripherals;
use plnu_keymap::ascii::StringTyper;
use plnu_keymap::config::RGBLED_NUM;
use plnu_keymap::hid::HidReport;
use plnu_keymap::rgblight::{Rgb, Rgblight};
use plnu_keymap::{Host, Indicator, RawReport};

use crate::hid::UsbDevice;
use crate::{eeprom, leds, ws2812};

pub struct Board {
    pub dp: Peripherals,
    pub usb: UsbDevice,
    light: Rgblight,
    typer: StringTyper,
    shown: Option<Rgb>,
}

impl Board {
    /// Bring up LEDs and the strip and load the stored underglow config.
    pub fn new(dp: Peripherals, usb: UsbDevice) -> Self {
        leds::init(&dp);
        ws2812::init(&dp);
        let config = eeprom::load_rgblight(&dp.EEPROM);
        Self {
            dp,
            usb,
            light: Rgblight::new(config),
            typer: StringTyper::new(),
            shown: None,
        }
    }

    /// Dropped reports are not retried; the next state change resends.
    pub fn send(&mut self, report: &HidReport) {
        let _ = self.usb.send(&self.dp, report);
    }

    /// Advance a string being typed by one report. Returns `true` once the
    /// last report of the string went out.
    pub fn type_next(&mut self) -> bool {
        match self.typer.next_report() {
            Some(report) => {
                let _ = self.usb.send_keyboard(&self.dp, &report);
                !self.typer.is_busy()
            }
            None => false,
        }
    }

    /// Push the current underglow frame when it differs from what is shown.
    pub fn refresh_underglow(&mut self, now: u16) {
        let frame = self.light.frame(now);
        if self.shown != Some(frame) {
            ws2812::write_all(frame, RGBLED_NUM);
            self.shown = Some(frame);
        }
    }

    /// Write the underglow config to EEPROM after it was changed by a key.
    pub fn persist(&mut self) {
        if let Some(config) = self.light.take_dirty() {
            eeprom::save_rgblight(&self.dp.EEPROM, config);
        }
    }
}

impl Host for Board {
    fn raw_hid_send(&mut self, report: &RawReport) {
        let _ = self.usb.send_raw(&self.dp, report.as_bytes());
    }

    fn eeconfig_init(&mut self) {
        let config = eeprom::reset(&self.dp.EEPROM);
        self.light.reload(config);
    }

    fn send_string(&mut self, text: &'static str) {
        self.typer.start(text);
    }

    fn set_indicator(&mut self, led: Indicator, on: bool) {
        leds::set(&self.dp, led, on);
    }

    fn rgblight(&mut self) -> &mut Rgblight {
        &mut self.light
    }
}
