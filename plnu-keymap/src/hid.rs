//! HID input reports produced by the engine.

use crate::config::{RAW_EPSIZE, RAW_USAGE_ID, RAW_USAGE_PAGE};

/// Report ID of the mouse collection on the shared mouse/consumer interface.
pub const REPORT_ID_MOUSE: u8 = 1;
/// Report ID of the consumer control collection.
pub const REPORT_ID_CONSUMER: u8 = 2;

/// Report descriptor of the raw HID interface: vendor-defined 32-byte
/// input and output reports.
pub const RAW_REPORT_DESCRIPTOR: [u8; 34] = [
    0x06, RAW_USAGE_PAGE as u8, (RAW_USAGE_PAGE >> 8) as u8, // Usage Page (Vendor)
    0x09, RAW_USAGE_ID, // Usage
    0xA1, 0x01, // Collection (Application)
    0x09, 0x62, //   Usage (Data In)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, RAW_EPSIZE as u8, // Report Count
    0x75, 0x08, //   Report Size (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x09, 0x63, //   Usage (Data Out)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, RAW_EPSIZE as u8, // Report Count
    0x75, 0x08, //   Report Size (8)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Standard USB HID keyboard report (8 bytes).
/// Byte 0: modifier keys bitmask
/// Byte 1: reserved (0x00)
/// Bytes 2-7: up to 6 simultaneous keycodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub reserved: u8,
    pub keys: [u8; 6],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            reserved: 0,
            keys: [0; 6],
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.modifiers;
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }

    pub fn contains(&self, usage: u8) -> bool {
        usage != 0 && self.keys.contains(&usage)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseReport {
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
}

impl MouseReport {
    pub fn is_moving(&self) -> bool {
        self.x != 0 || self.y != 0
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [REPORT_ID_MOUSE, self.buttons, self.x as u8, self.y as u8]
    }
}

/// One report for the USB layer to transmit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    /// Consumer page usage, 0 when released.
    Consumer(u16),
}

pub fn consumer_bytes(usage: u16) -> [u8; 3] {
    let [lo, hi] = usage.to_le_bytes();
    [REPORT_ID_CONSUMER, lo, hi]
}
