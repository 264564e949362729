#![allow(dead_code)]

use plnu_keymap::hid::HidReport;
use plnu_keymap::rgblight::{Rgblight, RgblightConfig};
use plnu_keymap::{Host, Indicator, KeyEvent, KeyPos, Keyboard, Packet, RawReport, Timing};

/// Host double that records every side effect.
pub struct RecordingHost {
    pub raw: Vec<RawReport>,
    pub resets: usize,
    pub typed: Vec<&'static str>,
    pub indicators: [bool; 4],
    pub light: Rgblight,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            raw: Vec::new(),
            resets: 0,
            typed: Vec::new(),
            indicators: [false; 4],
            light: Rgblight::new(RgblightConfig::default()),
        }
    }

    pub fn packets(&self) -> Vec<Packet> {
        self.raw
            .iter()
            .map(|r| Packet::parse(r.as_bytes()).expect("keyboard sent an undecodable packet"))
            .collect()
    }

    pub fn timings(&self) -> Vec<Timing> {
        self.packets()
            .into_iter()
            .filter_map(|p| match p.event {
                Some(plnu_keymap::Event::Timing(t)) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn indicator(&self, led: Indicator) -> bool {
        self.indicators[led as usize]
    }
}

impl Host for RecordingHost {
    fn raw_hid_send(&mut self, report: &RawReport) {
        self.raw.push(*report);
    }

    fn eeconfig_init(&mut self) {
        self.resets += 1;
    }

    fn send_string(&mut self, text: &'static str) {
        self.typed.push(text);
    }

    fn set_indicator(&mut self, led: Indicator, on: bool) {
        self.indicators[led as usize] = on;
    }

    fn rgblight(&mut self) -> &mut Rgblight {
        &mut self.light
    }
}

pub fn boot() -> (Keyboard, RecordingHost) {
    let mut keyboard = Keyboard::new();
    let mut host = RecordingHost::new();
    keyboard.init(&mut host);
    (keyboard, host)
}

/// Feed `(row, col, pressed, time)` events, ticking the clock up to each one.
pub fn run(keyboard: &mut Keyboard, host: &mut RecordingHost, sequence: &[(u8, u8, bool, u16)]) {
    for &(row, col, pressed, time) in sequence {
        keyboard.tick(time, host);
        let pos = KeyPos::new(row, col);
        let event = if pressed {
            KeyEvent::press(pos, time)
        } else {
            KeyEvent::release(pos, time)
        };
        keyboard.process(event, host);
    }
}

pub fn drain_keyboard(keyboard: &mut Keyboard) -> Vec<(u8, [u8; 6])> {
    let mut reports = Vec::new();
    while let Some(report) = keyboard.pop_report() {
        if let HidReport::Keyboard(r) = report {
            reports.push((r.modifiers, r.keys));
        }
    }
    reports
}
