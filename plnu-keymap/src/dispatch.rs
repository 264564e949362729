//! Per-event keymap hook, run on every committed key event before the
//! engine's default handling.

use crate::config::VERSION_STRING;
use crate::host::Host;
use crate::layers::{ALT_D, ALT_K, CTL_F, CTL_J};
use crate::action::Action;
use crate::keycode::CustomKey;
use crate::modtap::{ModTapKey, ModTapStore};
use crate::report::RawReport;
use crate::rgblight::MODE_STATIC;
use crate::state::{KeyEvent, KeyboardState};

/// What the dispatcher does for a recognised keycode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Handler {
    /// Erase the persistent configuration on press.
    ResetConfig,
    /// Type the identification string on press.
    VersionString,
    /// Put the underglow into its static mode on press.
    SolidColor,
    /// Emit a keypress report carrying this key id on press.
    Diagnostic(u8),
    /// Track the hold window of a mod-tap key. Default handling still runs.
    ModTapTiming(ModTapKey),
}

const fn custom(key: CustomKey) -> u16 {
    Action::Custom(key).id()
}

/// Keycode to handler table.
pub const HANDLERS: [(u16, Handler); 8] = [
    (custom(CustomKey::Eprm), Handler::ResetConfig),
    (custom(CustomKey::Version), Handler::VersionString),
    (custom(CustomKey::RgbSolid), Handler::SolidColor),
    (custom(CustomKey::HidKey), Handler::Diagnostic(0)),
    (CTL_F.id(), Handler::ModTapTiming(ModTapKey::LeftCtrl)),
    (ALT_D.id(), Handler::ModTapTiming(ModTapKey::LeftAlt)),
    (CTL_J.id(), Handler::ModTapTiming(ModTapKey::RightCtrl)),
    (ALT_K.id(), Handler::ModTapTiming(ModTapKey::RightAlt)),
];

pub fn handler_for(keycode: u16) -> Option<Handler> {
    HANDLERS
        .iter()
        .find(|(id, _)| *id == keycode)
        .map(|&(_, handler)| handler)
}

/// Returns whether default handling should continue for this event.
pub fn process_record_user<H: Host>(
    records: &mut ModTapStore,
    host: &mut H,
    state: KeyboardState,
    keycode: u16,
    event: &KeyEvent,
) -> bool {
    records.on_other_key_event(event.pressed, keycode);

    let Some(handler) = handler_for(keycode) else {
        return true;
    };
    trace!("dispatch {:04X} pressed={} -> {:?}", keycode, event.pressed, handler);

    match handler {
        Handler::ResetConfig => {
            if event.pressed {
                info!("resetting persistent configuration");
                host.eeconfig_init();
            }
            false
        }
        Handler::VersionString => {
            if event.pressed {
                host.send_string(VERSION_STRING);
            }
            false
        }
        Handler::SolidColor => {
            if event.pressed {
                host.rgblight().set_mode(MODE_STATIC);
            }
            false
        }
        Handler::Diagnostic(key) => {
            if event.pressed {
                host.raw_hid_send(&RawReport::keypress(key, state.layers, state.leds));
            }
            false
        }
        Handler::ModTapTiming(key) => {
            if let Some(timing) = records.on_own_key_event(key, event.pressed, event.time) {
                debug!("mod-tap {:?} held {} ms", key, timing.elapsed);
                host.raw_hid_send(&RawReport::timing(timing, state.layers, state.leds));
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::string::String;
    use std::vec::Vec;

    use super::*;
    use crate::host::Indicator;
    use crate::keycode::Keycode;
    use crate::report::{Event, Packet};
    use crate::rgblight::{Rgblight, RgblightConfig, MODE_RAINBOW};
    use crate::state::{KeyPos, LayerState, LedState};

    struct Recorder {
        sent: Vec<RawReport>,
        resets: usize,
        typed: Vec<String>,
        light: Rgblight,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                resets: 0,
                typed: Vec::new(),
                light: Rgblight::new(RgblightConfig::default()),
            }
        }
    }

    impl Host for Recorder {
        fn raw_hid_send(&mut self, report: &RawReport) {
            self.sent.push(*report);
        }
        fn eeconfig_init(&mut self) {
            self.resets += 1;
        }
        fn send_string(&mut self, text: &'static str) {
            self.typed.push(text.into());
        }
        fn set_indicator(&mut self, _led: Indicator, _on: bool) {}
        fn rgblight(&mut self) -> &mut Rgblight {
            &mut self.light
        }
    }

    const POS: KeyPos = KeyPos::new(0, 0);
    const STATE: KeyboardState = KeyboardState {
        layers: LayerState(0b11),
        leds: LedState(0x02),
    };

    fn run(store: &mut ModTapStore, host: &mut Recorder, keycode: u16, pressed: bool, time: u16) -> bool {
        let event = KeyEvent { pos: POS, pressed, time };
        process_record_user(store, host, STATE, keycode, &event)
    }

    #[test]
    fn test_handler_lookup() {
        assert_eq!(handler_for(CTL_J.id()), Some(Handler::ModTapTiming(ModTapKey::RightCtrl)));
        assert_eq!(handler_for(custom(CustomKey::HidKey)), Some(Handler::Diagnostic(0)));
        assert_eq!(handler_for(Keycode::A as u16), None);
    }

    #[test]
    fn test_reset_config_on_press_only() {
        let mut store = ModTapStore::new();
        let mut host = Recorder::new();
        let eprm = custom(CustomKey::Eprm);
        assert!(!run(&mut store, &mut host, eprm, true, 10));
        assert!(!run(&mut store, &mut host, eprm, false, 20));
        assert_eq!(host.resets, 1);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_version_string() {
        let mut store = ModTapStore::new();
        let mut host = Recorder::new();
        assert!(!run(&mut store, &mut host, custom(CustomKey::Version), true, 1));
        assert_eq!(host.typed, [VERSION_STRING]);
    }

    #[test]
    fn test_solid_color() {
        let mut store = ModTapStore::new();
        let mut host = Recorder::new();
        host.light.set_mode(MODE_RAINBOW);
        assert!(!run(&mut store, &mut host, custom(CustomKey::RgbSolid), true, 1));
        assert_eq!(host.light.mode(), MODE_STATIC);
    }

    #[test]
    fn test_diagnostic_keypress_report() {
        let mut store = ModTapStore::new();
        let mut host = Recorder::new();
        assert!(!run(&mut store, &mut host, custom(CustomKey::HidKey), true, 1));
        assert!(!run(&mut store, &mut host, custom(CustomKey::HidKey), false, 2));
        assert_eq!(host.sent.len(), 1);
        let packet = Packet::parse(host.sent[0].as_bytes()).unwrap();
        assert_eq!(packet.layer, 1);
        assert_eq!(packet.leds, LedState(0x02));
        assert_eq!(packet.event, Some(Event::Keypress { key: 0 }));
    }

    #[test]
    fn test_mod_tap_keeps_default_handling() {
        let mut store = ModTapStore::new();
        let mut host = Recorder::new();
        let b = Keycode::B as u16;
        assert!(run(&mut store, &mut host, ALT_D.id(), true, 100));
        assert!(run(&mut store, &mut host, b, true, 120));
        assert!(run(&mut store, &mut host, b, false, 150));
        assert!(run(&mut store, &mut host, ALT_D.id(), false, 190));

        assert_eq!(host.sent.len(), 1);
        let packet = Packet::parse(host.sent[0].as_bytes()).unwrap();
        match packet.event {
            Some(Event::Timing(t)) => {
                assert_eq!(t.key, ModTapKey::LeftAlt as u8);
                assert_eq!(t.elapsed, 90);
                assert_eq!((t.key_down, t.key_up), (b, b));
            }
            other => panic!("expected timing event, got {:?}", other),
        }
    }

    #[test]
    fn test_other_keys_recorded_before_dispatch() {
        // A custom key pressed during a hold still counts as the first key down.
        let mut store = ModTapStore::new();
        let mut host = Recorder::new();
        let hid = custom(CustomKey::HidKey);
        run(&mut store, &mut host, CTL_F.id(), true, 5);
        run(&mut store, &mut host, hid, true, 6);
        assert_eq!(store.record(ModTapKey::LeftCtrl).key_down, hid);
    }
}
