//! Hold-window tracking for the four home-row mod-tap keys.
//!
//! Each record remembers when its key went down and the first other key
//! pressed and released while it was held. Releasing the key yields a
//! [`Timing`] for the telemetry channel and closes the window.

use crate::layers::{ALT_D, ALT_K, CTL_F, CTL_J};
use crate::report::Timing;
use crate::state::timer_diff_16;

/// The tracked mod-tap keys, in record order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModTapKey {
    LeftCtrl = 0,
    LeftAlt = 1,
    RightCtrl = 2,
    RightAlt = 3,
}

impl ModTapKey {
    pub const ALL: [ModTapKey; MT_COUNT] = [
        ModTapKey::LeftCtrl,
        ModTapKey::LeftAlt,
        ModTapKey::RightCtrl,
        ModTapKey::RightAlt,
    ];

    /// Identity of the keymap action this record tracks.
    pub fn keycode(self) -> u16 {
        match self {
            ModTapKey::LeftCtrl => CTL_F.id(),
            ModTapKey::LeftAlt => ALT_D.id(),
            ModTapKey::RightCtrl => CTL_J.id(),
            ModTapKey::RightAlt => ALT_K.id(),
        }
    }
}

pub const MT_COUNT: usize = 4;

/// `0` in any field means "unset".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModTapRecord {
    pub keycode: u16,
    pub start_time: u16,
    pub key_down: u16,
    pub key_up: u16,
}

impl ModTapRecord {
    pub const fn new(keycode: u16) -> Self {
        Self {
            keycode,
            start_time: 0,
            key_down: 0,
            key_up: 0,
        }
    }

    pub fn reset(&mut self) {
        self.start_time = 0;
        self.key_down = 0;
        self.key_up = 0;
    }

    pub fn is_open(&self) -> bool {
        self.start_time != 0
    }
}

pub struct ModTapStore {
    records: [ModTapRecord; MT_COUNT],
}

impl ModTapStore {
    pub fn new() -> Self {
        Self {
            records: ModTapKey::ALL.map(|key| ModTapRecord::new(key.keycode())),
        }
    }

    pub fn record(&self, key: ModTapKey) -> &ModTapRecord {
        &self.records[key as usize]
    }

    pub fn records(&self) -> &[ModTapRecord; MT_COUNT] {
        &self.records
    }

    pub fn reset_all(&mut self) {
        self.records.iter_mut().for_each(ModTapRecord::reset);
    }

    /// Note `keycode` as the first key down/up of every other open window.
    pub fn on_other_key_event(&mut self, pressed: bool, keycode: u16) {
        for rec in self.records.iter_mut() {
            if rec.keycode == keycode || !rec.is_open() {
                continue;
            }
            if pressed {
                if rec.key_down == 0 {
                    rec.key_down = keycode;
                }
            } else if rec.key_up == 0 {
                rec.key_up = keycode;
            }
        }
    }

    /// Press opens (or restarts) the hold window; release of an open window
    /// returns its timing and closes it.
    pub fn on_own_key_event(&mut self, key: ModTapKey, pressed: bool, time: u16) -> Option<Timing> {
        let rec = &mut self.records[key as usize];
        if pressed {
            rec.start_time = time;
            return None;
        }
        if !rec.is_open() {
            return None;
        }

        let timing = Timing {
            key: key as u8,
            elapsed: timer_diff_16(time, rec.start_time),
            key_down: rec.key_down,
            key_up: rec.key_up,
        };
        rec.reset();
        Some(timing)
    }
}

impl Default for ModTapStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::keycode::Keycode;

    const B: u16 = Keycode::B as u16;
    const C: u16 = Keycode::C as u16;

    #[test]
    fn test_plain_tap_has_no_interlopers() {
        for key in ModTapKey::ALL {
            let mut store = ModTapStore::new();
            assert_eq!(store.on_own_key_event(key, true, 100), None);
            let timing = store.on_own_key_event(key, false, 180).unwrap();
            assert_eq!(timing.key, key as u8);
            assert_eq!(timing.elapsed, 80);
            assert_eq!((timing.key_down, timing.key_up), (0, 0));
        }
    }

    #[test]
    fn test_first_writer_wins() {
        let mut store = ModTapStore::new();
        store.on_own_key_event(ModTapKey::LeftCtrl, true, 10);
        store.on_other_key_event(true, B);
        store.on_other_key_event(true, C);
        store.on_other_key_event(false, C);
        store.on_other_key_event(false, B);
        let rec = store.record(ModTapKey::LeftCtrl);
        assert_eq!((rec.key_down, rec.key_up), (B, C));
    }

    #[test]
    fn test_closed_windows_ignore_other_keys() {
        let mut store = ModTapStore::new();
        store.on_other_key_event(true, B);
        assert!(store.records().iter().all(|r| r.key_down == 0));
    }

    #[test]
    fn test_own_keycode_is_not_recorded() {
        let mut store = ModTapStore::new();
        store.on_own_key_event(ModTapKey::RightAlt, true, 5);
        store.on_other_key_event(true, ModTapKey::RightAlt.keycode());
        assert_eq!(store.record(ModTapKey::RightAlt).key_down, 0);
    }

    #[test]
    fn test_concurrent_holds_tracked_independently() {
        let mut store = ModTapStore::new();
        let lctl = ModTapKey::LeftCtrl.keycode();
        store.on_own_key_event(ModTapKey::LeftAlt, true, 1);
        store.on_other_key_event(true, lctl);
        store.on_own_key_event(ModTapKey::LeftCtrl, true, 2);
        store.on_other_key_event(true, B);
        assert_eq!(store.record(ModTapKey::LeftAlt).key_down, lctl);
        assert_eq!(store.record(ModTapKey::LeftCtrl).key_down, B);
    }

    #[test]
    fn test_release_resets_record() {
        let mut store = ModTapStore::new();
        store.on_own_key_event(ModTapKey::RightCtrl, true, 65500);
        store.on_other_key_event(true, B);
        let timing = store.on_own_key_event(ModTapKey::RightCtrl, false, 40).unwrap();
        assert_eq!(timing.elapsed, 76);
        let rec = store.record(ModTapKey::RightCtrl);
        assert_eq!((rec.start_time, rec.key_down, rec.key_up), (0, 0, 0));
        assert_eq!(rec.keycode, ModTapKey::RightCtrl.keycode());
    }

    #[test]
    fn test_release_without_press_is_silent() {
        let mut store = ModTapStore::new();
        assert_eq!(store.on_own_key_event(ModTapKey::LeftAlt, false, 9), None);
        // A press at timestamp 0 leaves the window closed.
        store.on_own_key_event(ModTapKey::LeftAlt, true, 0);
        assert_eq!(store.on_own_key_event(ModTapKey::LeftAlt, false, 9), None);
    }

    #[test]
    fn test_repress_restarts_window() {
        let mut store = ModTapStore::new();
        store.on_own_key_event(ModTapKey::LeftCtrl, true, 10);
        store.on_own_key_event(ModTapKey::LeftCtrl, true, 50);
        let timing = store.on_own_key_event(ModTapKey::LeftCtrl, false, 60).unwrap();
        assert_eq!(timing.elapsed, 10);
    }

    #[test]
    fn test_keycodes_match_keymap() {
        assert_eq!(
            ModTapKey::LeftCtrl.keycode(),
            Action::ModTap(crate::keycode::Mods::LCTRL, Keycode::F).id()
        );
    }
}
