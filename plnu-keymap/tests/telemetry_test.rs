pub mod common;

use plnu_keymap::config::VERSION_STRING;
use plnu_keymap::layers::{ALT_D, CTL_F, SYMB};
use plnu_keymap::modtap::ModTapKey;
use plnu_keymap::{Event, Indicator, Keycode, LedState};

use crate::common::{boot, drain_keyboard, run};

const MOD_TAPS: [((u8, u8), ModTapKey); 4] = [
    ((2, 4), ModTapKey::LeftCtrl),
    ((2, 3), ModTapKey::LeftAlt),
    ((2, 9), ModTapKey::RightCtrl),
    ((2, 10), ModTapKey::RightAlt),
];

const B: (u8, u8) = (3, 5);
const C: (u8, u8) = (3, 3);
const TT_SYMB: (u8, u8) = (4, 4);

#[test]
fn test_plain_tap_reports_no_other_keys() {
    for ((row, col), key) in MOD_TAPS {
        let (mut keyboard, mut host) = boot();
        run(&mut keyboard, &mut host, &[(row, col, true, 100), (row, col, false, 150)]);

        let timings = host.timings();
        assert_eq!(timings.len(), 1, "{:?}", key);
        assert_eq!(timings[0].key, key as u8);
        assert_eq!((timings[0].key_down, timings[0].key_up), (0, 0));
    }
}

#[test]
fn test_key_inside_hold_window() {
    let (mut keyboard, mut host) = boot();
    run(
        &mut keyboard,
        &mut host,
        &[
            (2, 3, true, 1000),
            (B.0, B.1, true, 1010),
            (B.0, B.1, false, 1020),
            (2, 3, false, 1030),
        ],
    );

    let timings = host.timings();
    assert_eq!(timings.len(), 1);
    assert_eq!(timings[0].key, ModTapKey::LeftAlt as u8);
    assert_eq!(timings[0].key_down, Keycode::B as u16);
    assert_eq!(timings[0].key_up, Keycode::B as u16);
    // Held as Alt, so `b` went out with Alt applied.
    assert!(drain_keyboard(&mut keyboard).contains(&(0x04, [0x05, 0, 0, 0, 0, 0])));
}

#[test]
fn test_first_key_down_wins() {
    let (mut keyboard, mut host) = boot();
    run(
        &mut keyboard,
        &mut host,
        &[
            (2, 4, true, 1000),
            (B.0, B.1, true, 1010),
            (C.0, C.1, true, 1020),
            (2, 4, false, 1300),
            (B.0, B.1, false, 1310),
            (C.0, C.1, false, 1320),
        ],
    );

    let timing = host.timings()[0];
    assert_eq!(timing.key_down, Keycode::B as u16);
    assert_eq!(timing.key_up, 0);
    assert_eq!(timing.elapsed, 300);
}

#[test]
fn test_elapsed_wraps_with_timer() {
    let (mut keyboard, mut host) = boot();
    run(&mut keyboard, &mut host, &[(2, 9, true, 65500), (2, 9, false, 100)]);
    assert_eq!(host.timings()[0].elapsed, 100u16.wrapping_sub(65500));
}

#[test]
fn test_state_report_layer_byte() {
    let (mut keyboard, mut host) = boot();
    run(
        &mut keyboard,
        &mut host,
        &[(TT_SYMB.0, TT_SYMB.1, true, 100), (TT_SYMB.0, TT_SYMB.1, false, 120)],
    );
    keyboard.set_led_state(LedState(LedState::CAPS_LOCK), &mut host);

    let packets = host.packets();
    assert_eq!(packets.len(), 2);
    // Layer hook passes the new layer explicitly.
    assert_eq!(packets[0].layer, SYMB);
    // LED hook resolves the highest active layer itself.
    assert_eq!(packets[1].layer, SYMB);
    assert!(packets[1].leds.caps_lock());
    assert!(host.indicator(Indicator::Right1));
    assert!(host.indicator(Indicator::Right2));
}

#[test]
fn test_records_cleared_after_report() {
    let (mut keyboard, mut host) = boot();
    run(
        &mut keyboard,
        &mut host,
        &[
            (2, 4, true, 500),
            (2, 3, true, 510),
            (B.0, B.1, true, 520),
            (B.0, B.1, false, 530),
            (2, 3, false, 540),
            (2, 4, false, 900),
        ],
    );

    assert_eq!(host.timings().len(), 2);
    for key in ModTapKey::ALL {
        let rec = keyboard.records().record(key);
        assert_eq!((rec.start_time, rec.key_down, rec.key_up), (0, 0, 0));
    }
    // The outer hold saw the inner mod-tap first.
    assert_eq!(host.timings()[1].key_down, ALT_D.id());
    assert_eq!(host.timings()[1].key, ModTapKey::LeftCtrl as u8);
    assert_ne!(host.timings()[1].key_down, CTL_F.id());
}

#[test]
fn test_reset_config_end_to_end() {
    let (mut keyboard, mut host) = boot();
    run(
        &mut keyboard,
        &mut host,
        &[(TT_SYMB.0, TT_SYMB.1, true, 100), (TT_SYMB.0, TT_SYMB.1, false, 120)],
    );
    let before = host.raw.len();

    run(&mut keyboard, &mut host, &[(4, 0, true, 200), (4, 0, false, 220)]);
    assert_eq!(host.resets, 1);
    assert_eq!(host.raw.len(), before);
    assert!(drain_keyboard(&mut keyboard).is_empty());

    // The rest of the pipeline still runs: a mod-tap hold is still timed.
    run(&mut keyboard, &mut host, &[(2, 4, true, 300), (2, 4, false, 340)]);
    assert_eq!(host.timings().len(), 1);
}

#[test]
fn test_version_and_diagnostic_keys() {
    let (mut keyboard, mut host) = boot();
    run(&mut keyboard, &mut host, &[(4, 2, true, 50), (4, 2, false, 60)]);
    assert_eq!(host.packets()[0].event, Some(Event::Keypress { key: 0 }));

    run(
        &mut keyboard,
        &mut host,
        &[
            (TT_SYMB.0, TT_SYMB.1, true, 100),
            (0, 0, true, 110),
            (0, 0, false, 120),
            (TT_SYMB.0, TT_SYMB.1, false, 130),
        ],
    );
    assert_eq!(host.typed, [VERSION_STRING]);
}
