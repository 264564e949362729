//! Side effects the keymap asks of the board it runs on.

use crate::report::RawReport;
use crate::rgblight::Rgblight;

/// The ErgoDox EZ indicator LEDs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Indicator {
    /// Teensy on-board LED.
    Board,
    Right1,
    Right2,
    Right3,
}

impl Indicator {
    pub const RIGHT: [Indicator; 3] = [Indicator::Right1, Indicator::Right2, Indicator::Right3];
}

/// Implemented by the firmware board and by test doubles.
///
/// All calls are fire-and-forget: failures are the board's to swallow.
pub trait Host {
    /// Transmit one packet on the raw HID channel.
    fn raw_hid_send(&mut self, report: &RawReport);

    /// Reset the persistent configuration to its defaults.
    fn eeconfig_init(&mut self);

    /// Type `text` as if entered on the keyboard.
    fn send_string(&mut self, text: &'static str);

    fn set_indicator(&mut self, led: Indicator, on: bool);

    fn rgblight(&mut self) -> &mut Rgblight;
}
