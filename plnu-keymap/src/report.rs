//! Raw HID telemetry packets.
//!
//! Every packet is `RAW_EPSIZE` bytes, zero filled:
//!
//! | byte | content                                        |
//! |------|------------------------------------------------|
//! | 0    | highest active layer                           |
//! | 1    | host LED state bitmask                         |
//! | 2    | event tag: 0 none, 1 keypress, 2 mod-tap timing |
//! | 3    | key id                                         |
//! | 4-5  | timing: elapsed milliseconds (big endian)      |
//! | 6-7  | timing: first key pressed during the hold      |
//! | 8-9  | timing: first key released during the hold     |

use thiserror::Error;

use crate::config::RAW_EPSIZE;
use crate::state::{LayerState, LedState};

pub const EVT_NONE: u8 = 0;
pub const EVT_KEYPRESS: u8 = 1;
pub const EVT_TIMING: u8 = 2;

/// Timing payload of a released mod-tap key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    pub key: u8,
    pub elapsed: u16,
    pub key_down: u16,
    pub key_up: u16,
}

/// One outgoing raw HID packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawReport([u8; RAW_EPSIZE]);

impl RawReport {
    /// State report. `layer_hint` of `None` reports the highest active layer.
    pub fn state(layer_hint: Option<u8>, layers: LayerState, leds: LedState) -> Self {
        let mut packet = [0u8; RAW_EPSIZE];
        packet[0] = layer_hint.unwrap_or_else(|| layers.highest());
        packet[1] = leds.raw();
        RawReport(packet)
    }

    pub fn keypress(key: u8, layers: LayerState, leds: LedState) -> Self {
        let mut report = Self::state(None, layers, leds);
        report.0[2] = EVT_KEYPRESS;
        report.0[3] = key;
        report
    }

    pub fn timing(timing: Timing, layers: LayerState, leds: LedState) -> Self {
        let mut report = Self::state(None, layers, leds);
        let packet = &mut report.0;
        packet[2] = EVT_TIMING;
        packet[3] = timing.key;
        packet[4..6].copy_from_slice(&timing.elapsed.to_be_bytes());
        packet[6..8].copy_from_slice(&timing.key_down.to_be_bytes());
        packet[8..10].copy_from_slice(&timing.key_up.to_be_bytes());
        report
    }

    pub fn as_bytes(&self) -> &[u8; RAW_EPSIZE] {
        &self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("packet too short: {0} bytes")]
    TooShort(usize),
    #[error("unknown event tag {0}")]
    UnknownEvent(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Keypress { key: u8 },
    Timing(Timing),
}

/// A telemetry packet as seen by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub layer: u8,
    pub leds: LedState,
    pub event: Option<Event>,
}

impl Packet {
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 3 {
            return Err(DecodeError::TooShort(data.len()));
        }
        let need = |n: usize| {
            if data.len() < n {
                Err(DecodeError::TooShort(data.len()))
            } else {
                Ok(())
            }
        };
        let be16 = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);

        let event = match data[2] {
            EVT_NONE => None,
            EVT_KEYPRESS => {
                need(4)?;
                Some(Event::Keypress { key: data[3] })
            }
            EVT_TIMING => {
                need(10)?;
                Some(Event::Timing(Timing {
                    key: data[3],
                    elapsed: be16(4),
                    key_down: be16(6),
                    key_up: be16(8),
                }))
            }
            other => return Err(DecodeError::UnknownEvent(other)),
        };

        Ok(Packet {
            layer: data[0],
            leds: LedState(data[1]),
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_report_uses_hint() {
        let report = RawReport::state(Some(2), LayerState(0b1001), LedState(0x02));
        assert_eq!(report.as_bytes()[0], 2);
        assert_eq!(report.as_bytes()[1], 0x02);
        assert!(report.as_bytes()[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_state_report_resolves_highest_layer() {
        let report = RawReport::state(None, LayerState(0b1001), LedState(0));
        assert_eq!(report.as_bytes()[0], 3);
    }

    #[test]
    fn test_keypress_layout() {
        let report = RawReport::keypress(0, LayerState(1), LedState(0x01));
        assert_eq!(&report.as_bytes()[..4], &[0, 0x01, EVT_KEYPRESS, 0]);
        assert!(report.as_bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_timing_layout() {
        let timing = Timing {
            key: 2,
            elapsed: 0x0123,
            key_down: 0x2109,
            key_up: 0x0004,
        };
        let report = RawReport::timing(timing, LayerState(0b10), LedState(0));
        assert_eq!(
            &report.as_bytes()[..10],
            &[1, 0, EVT_TIMING, 2, 0x01, 0x23, 0x21, 0x09, 0x00, 0x04]
        );
        assert!(report.as_bytes()[10..].iter().all(|&b| b == 0));
        assert_eq!(
            Packet::parse(report.as_bytes()).unwrap().event,
            Some(Event::Timing(timing))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Packet::parse(&[0, 0]), Err(DecodeError::TooShort(2)));
        assert_eq!(Packet::parse(&[0, 0, 9, 0]), Err(DecodeError::UnknownEvent(9)));
        assert_eq!(Packet::parse(&[0, 0, EVT_TIMING, 1, 0]), Err(DecodeError::TooShort(5)));
    }

    #[test]
    fn test_parse_state_only() {
        let packet = Packet::parse(&[3, 0x02, 0, 0]).unwrap();
        assert_eq!(packet.layer, 3);
        assert!(packet.leds.caps_lock());
        assert_eq!(packet.event, None);
    }
}
