//! Reactions to keyboard state changes: indicator LEDs, underglow colour
//! and state reports on the raw HID channel.

use crate::config::{LAYER_COLORS, ONESHOT_CTRL_COLOR};
use crate::host::{Host, Indicator};
use crate::keycode::Mods;
use crate::modtap::ModTapStore;
use crate::report::RawReport;
use crate::state::{KeyboardState, LayerState};

/// Right-hand LEDs lit for each layer, bit 0 = right LED 1.
const LAYER_INDICATORS: [u8; 8] = [
    0b000, 0b010, 0b110, 0b100, //
    0b011, 0b101, 0b110, 0b111,
];

/// Runs once at start-up.
pub fn keyboard_init<H: Host>(records: &mut ModTapStore, host: &mut H) {
    records.reset_all();
    host.rgblight().set_rgb(LAYER_COLORS[0]);
    host.set_indicator(Indicator::Right1, false);
}

/// Host LED state changed: caps lock drives right LED 1.
pub fn led_set_user<H: Host>(host: &mut H, state: KeyboardState) {
    host.set_indicator(Indicator::Right1, state.leds.caps_lock());
    host.raw_hid_send(&RawReport::state(None, state.layers, state.leds));
}

/// Layer state changed. Returns the state unchanged.
pub fn layer_state_set_user<H: Host>(host: &mut H, state: KeyboardState) -> LayerState {
    host.set_indicator(Indicator::Board, false);
    host.set_indicator(Indicator::Right2, false);
    host.set_indicator(Indicator::Right3, false);

    let layer = state.layers.highest();
    if let Some(&mask) = LAYER_INDICATORS.get(layer as usize) {
        for (bit, led) in Indicator::RIGHT.into_iter().enumerate() {
            if mask & (1 << bit) != 0 {
                host.set_indicator(led, true);
            }
        }
        host.rgblight().set_rgb(LAYER_COLORS[layer as usize]);
    }
    debug!("layer {} active", layer);

    host.raw_hid_send(&RawReport::state(Some(layer), state.layers, state.leds));
    state.layers
}

pub fn oneshot_mods_changed_user<H: Host>(host: &mut H, mods: Mods) {
    if mods.contains_ctrl() {
        let light = host.rgblight();
        light.enable();
        light.set_rgb(ONESHOT_CTRL_COLOR);
    }
    if mods.is_empty() {
        host.rgblight().disable();
    }
}

/// Any inbound packet is answered with a state report. The payload is ignored.
pub fn raw_hid_receive<H: Host>(host: &mut H, state: KeyboardState, data: &[u8]) {
    trace!("raw hid in, {} bytes", data.len());
    host.raw_hid_send(&RawReport::state(None, state.layers, state.leds));
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::modtap::ModTapKey;
    use crate::report::Packet;
    use crate::rgblight::{Rgb, Rgblight, RgblightConfig};
    use crate::state::LedState;

    #[derive(Default)]
    struct Board {
        leds: [bool; 4],
        sent: Vec<RawReport>,
        light: Option<Rgblight>,
    }

    impl Host for Board {
        fn raw_hid_send(&mut self, report: &RawReport) {
            self.sent.push(*report);
        }
        fn eeconfig_init(&mut self) {}
        fn send_string(&mut self, _text: &'static str) {}
        fn set_indicator(&mut self, led: Indicator, on: bool) {
            self.leds[led as usize] = on;
        }
        fn rgblight(&mut self) -> &mut Rgblight {
            self.light.get_or_insert_with(|| Rgblight::new(RgblightConfig::default()))
        }
    }

    fn state(layers: u32, leds: u8) -> KeyboardState {
        KeyboardState {
            layers: LayerState(layers),
            leds: LedState(leds),
        }
    }

    fn right_leds(board: &Board) -> [bool; 3] {
        [board.leds[1], board.leds[2], board.leds[3]]
    }

    #[test]
    fn test_caps_lock_indicator() {
        let mut board = Board::default();
        led_set_user(&mut board, state(1, LedState::CAPS_LOCK));
        assert!(board.leds[Indicator::Right1 as usize]);
        led_set_user(&mut board, state(1, 0));
        assert!(!board.leds[Indicator::Right1 as usize]);
        assert_eq!(board.sent.len(), 2);
    }

    #[test]
    fn test_led_report_uses_highest_layer() {
        let mut board = Board::default();
        led_set_user(&mut board, state(0b1001, 0x03));
        let packet = Packet::parse(board.sent[0].as_bytes()).unwrap();
        assert_eq!(packet.layer, 3);
        assert_eq!(packet.leds, LedState(0x03));
        assert_eq!(packet.event, None);
    }

    #[test]
    fn test_layer_indicators() {
        let expected = [
            [false, false, false],
            [false, true, false],
            [false, true, true],
            [false, false, true],
            [true, true, false],
            [true, false, true],
            [false, true, true],
            [true, true, true],
        ];
        for (layer, want) in expected.iter().enumerate() {
            let mut board = Board::default();
            board.leds = [true; 4];
            board.leds[1] = false;
            layer_state_set_user(&mut board, state(1 | 1 << layer, 0));
            assert_eq!(&right_leds(&board), want, "layer {}", layer);
            assert!(!board.leds[Indicator::Board as usize]);
            assert_eq!(board.rgblight().color_override(), Some(LAYER_COLORS[layer]));
        }
    }

    #[test]
    fn test_layer_change_leaves_caps_led_alone() {
        let mut board = Board::default();
        board.leds[Indicator::Right1 as usize] = true;
        layer_state_set_user(&mut board, state(0b11, LedState::CAPS_LOCK));
        assert!(board.leds[Indicator::Right1 as usize]);
    }

    #[test]
    fn test_layer_report_carries_new_layer() {
        let mut board = Board::default();
        let returned = layer_state_set_user(&mut board, state(0b101, 0));
        assert_eq!(returned, LayerState(0b101));
        let packet = Packet::parse(board.sent[0].as_bytes()).unwrap();
        assert_eq!(packet.layer, 2);
    }

    #[test]
    fn test_unknown_layer_only_reports() {
        let mut board = Board::default();
        layer_state_set_user(&mut board, state(1 << 9, 0));
        assert_eq!(right_leds(&board), [false; 3]);
        assert_eq!(board.rgblight().color_override(), None);
        assert_eq!(Packet::parse(board.sent[0].as_bytes()).unwrap().layer, 9);
    }

    #[test]
    fn test_oneshot_ctrl_lights_underglow() {
        let mut board = Board::default();
        board.rgblight().disable();
        oneshot_mods_changed_user(&mut board, Mods::LCTRL | Mods::LSHIFT);
        assert!(board.rgblight().is_enabled());
        assert_eq!(board.rgblight().color_override(), Some(Rgb::new(0, 0x10, 0x10)));

        oneshot_mods_changed_user(&mut board, Mods::NONE);
        assert!(!board.rgblight().is_enabled());
    }

    #[test]
    fn test_oneshot_without_ctrl_changes_nothing() {
        let mut board = Board::default();
        oneshot_mods_changed_user(&mut board, Mods::LALT);
        assert!(board.rgblight().is_enabled());
        assert_eq!(board.rgblight().color_override(), None);
    }

    #[test]
    fn test_raw_hid_receive_answers_with_state() {
        let mut board = Board::default();
        raw_hid_receive(&mut board, state(0b11, 0x02), &[0xAA; 32]);
        assert_eq!(board.sent.len(), 1);
        let packet = Packet::parse(board.sent[0].as_bytes()).unwrap();
        assert_eq!((packet.layer, packet.leds), (1, LedState(0x02)));
    }

    #[test]
    fn test_init() {
        let mut records = ModTapStore::new();
        records.on_own_key_event(ModTapKey::LeftAlt, true, 40);
        let mut board = Board::default();
        board.leds[Indicator::Right1 as usize] = true;
        keyboard_init(&mut records, &mut board);
        assert!(!records.record(ModTapKey::LeftAlt).is_open());
        assert!(!board.leds[Indicator::Right1 as usize]);
        assert_eq!(board.rgblight().color_override(), Some(LAYER_COLORS[0]));
    }
}
