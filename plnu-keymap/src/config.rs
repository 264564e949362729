//! Compile-time configuration.

use crate::rgblight::Rgb;

/// Size of a raw HID report in either direction.
pub const RAW_EPSIZE: usize = 32;

/// Milliseconds a mod-tap or tap-toggle key may be held and still count as a tap.
pub const TAPPING_TERM: u16 = 200;

/// Taps needed before a tap-toggle key toggles its layer.
pub const TAPPING_TOGGLE: u8 = 1;

/// USB identifiers of the running keyboard.
pub const KEYBOARD_VID: u16 = 0x16C0;
pub const KEYBOARD_PID: u16 = 0x047E;

/// Raw HID interface usage page and usage, as host tools expect them.
pub const RAW_USAGE_PAGE: u16 = 0xFF60;
pub const RAW_USAGE_ID: u8 = 0x61;

/// Interface number of the raw HID channel.
pub const RAW_INTERFACE: u8 = 1;
/// Raw HID endpoint addresses (IN, OUT).
pub const RAW_IN_EP: u8 = 0x82;
pub const RAW_OUT_EP: u8 = 0x03;

/// Typed by the version key.
pub const VERSION_STRING: &str = concat!("ergodox_ez/plnu @ ", env!("CARGO_PKG_VERSION"));

/// Number of WS2812 LEDs in the underglow strip.
pub const RGBLED_NUM: usize = 15;

/// Underglow colour for each layer index.
pub const LAYER_COLORS: [Rgb; 8] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x16, 0x00, 0x00),
    Rgb::new(0x00, 0x16, 0x00),
    Rgb::new(0x00, 0x00, 0x16),
    Rgb::new(0x16, 0x16, 0x00),
    Rgb::new(0x00, 0x16, 0x16),
    Rgb::new(0x16, 0x00, 0x16),
    Rgb::new(0x16, 0x16, 0x16),
];

/// Underglow colour while a one-shot Ctrl is armed.
pub const ONESHOT_CTRL_COLOR: Rgb = Rgb::new(0x00, 0x10, 0x10);

/// Pointer movement per mouse report while a mouse key is held.
pub const MOUSEKEY_DELTA: i8 = 8;
/// Milliseconds between repeated mouse movement reports.
pub const MOUSEKEY_INTERVAL: u16 = 20;

/// Outgoing HID report queue depth.
pub const REPORT_QUEUE_SIZE: usize = 16;
/// Events held back while a tap-hold decision is pending.
pub const TAP_HOLD_BUFFER_SIZE: usize = 8;
