//! Key processing: tap-hold decisions, layer switching, one-shot mods and
//! HID report generation.
//!
//! Every committed key event passes through
//! [`process_record_user`](crate::dispatch::process_record_user) with its
//! original timestamp before the default handling below runs.

use heapless::Deque;

use crate::action::Action;
use crate::config::{
    MOUSEKEY_DELTA, MOUSEKEY_INTERVAL, REPORT_QUEUE_SIZE, TAPPING_TERM, TAPPING_TOGGLE,
    TAP_HOLD_BUFFER_SIZE,
};
use crate::dispatch;
use crate::hid::{HidReport, KeyboardReport, MouseReport};
use crate::host::Host;
use crate::keycode::{Keycode, Mods, MouseKey, RgbKey};
use crate::layers::lookup;
use crate::modtap::ModTapStore;
use crate::reactor;
use crate::state::{timer_diff_16, KeyEvent, KeyPos, KeyboardState, LayerState, LedState};
use crate::{COLS, ROWS};

/// What a pressed key resolved to, so its release undoes the same thing
/// even if the layers changed in between.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Held {
    action: Action,
    /// Tap-hold key resolved as a tap.
    tap: bool,
}

#[derive(Copy, Clone, Debug)]
struct TapToggle {
    pos: KeyPos,
    layer: u8,
    time: u16,
    was_on: bool,
    interrupted: bool,
}

pub struct Keyboard {
    records: ModTapStore,
    layers: LayerState,
    leds: LedState,
    held: [[Option<Held>; COLS]; ROWS],

    /// Tap-hold press waiting for a decision, and the events behind it.
    pending: Option<(KeyEvent, Action)>,
    buffer: Deque<KeyEvent, TAP_HOLD_BUFFER_SIZE>,

    tap_toggle: Option<TapToggle>,
    tap_toggle_taps: u8,

    keys: [u8; 6],
    mods: Mods,
    /// Modifiers sent only together with their key, e.g. Shift for `!`.
    weak_mods: Mods,
    /// Key that set the current weak mods.
    weak_key: Option<KeyPos>,
    oneshot: Mods,
    /// Key the armed one-shot mods were applied to.
    oneshot_key: Option<KeyPos>,
    last_keyboard: KeyboardReport,

    mouse: MouseReport,
    mouse_time: u16,

    reports: Deque<HidReport, REPORT_QUEUE_SIZE>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            records: ModTapStore::new(),
            layers: LayerState::default(),
            leds: LedState::default(),
            held: [[None; COLS]; ROWS],
            pending: None,
            buffer: Deque::new(),
            tap_toggle: None,
            tap_toggle_taps: 0,
            keys: [0; 6],
            mods: Mods::NONE,
            weak_mods: Mods::NONE,
            weak_key: None,
            oneshot: Mods::NONE,
            oneshot_key: None,
            last_keyboard: KeyboardReport::empty(),
            mouse: MouseReport::default(),
            mouse_time: 0,
            reports: Deque::new(),
        }
    }

    /// Start-up hook. Call once before the first event.
    pub fn init<H: Host>(&mut self, host: &mut H) {
        reactor::keyboard_init(&mut self.records, host);
    }

    pub fn state(&self) -> KeyboardState {
        KeyboardState {
            layers: self.layers,
            leds: self.leds,
        }
    }

    pub fn records(&self) -> &ModTapStore {
        &self.records
    }

    /// Next report to transmit, oldest first.
    pub fn pop_report(&mut self) -> Option<HidReport> {
        self.reports.pop_front()
    }

    /// Host sent a new keyboard LED state.
    pub fn set_led_state<H: Host>(&mut self, leds: LedState, host: &mut H) {
        self.leds = leds;
        reactor::led_set_user(host, self.state());
    }

    pub fn raw_hid_receive<H: Host>(&mut self, data: &[u8], host: &mut H) {
        reactor::raw_hid_receive(host, self.state(), data);
    }

    pub fn process<H: Host>(&mut self, event: KeyEvent, host: &mut H) {
        if !event.pos.is_valid() {
            warn!("event for unknown position {:?}", event.pos);
            return;
        }
        if self.pending.is_some() {
            self.buffer_event(event, host);
            return;
        }

        if event.pressed {
            let action = lookup(self.layers, event.pos);
            if let Action::ModTap(..) = action {
                trace!("tap-hold {:?} pending", event.pos);
                self.pending = Some((event, action));
                return;
            }
            self.commit_press(event, action, false, host);
        } else {
            self.commit_release(event, host);
        }
    }

    /// Queue the current keyboard report even if it was already sent.
    ///
    /// Call after something else wrote to the keyboard endpoint, e.g. a
    /// typed string, so the host sees the keys that are still held.
    pub fn resync_keyboard_report(&mut self) {
        self.last_keyboard = self.current_keyboard_report();
        self.push_report(HidReport::Keyboard(self.last_keyboard));
    }

    /// Time-driven work: tap-hold timeouts and mouse key repeat.
    pub fn tick<H: Host>(&mut self, now: u16, host: &mut H) {
        if let Some((press, _)) = self.pending {
            if timer_diff_16(now, press.time) >= TAPPING_TERM {
                self.resolve(false, host);
            }
        }

        if self.mouse.is_moving() && timer_diff_16(now, self.mouse_time) >= MOUSEKEY_INTERVAL {
            self.mouse_time = now;
            self.push_report(HidReport::Mouse(self.mouse));
        }
    }

    fn buffer_event<H: Host>(&mut self, event: KeyEvent, host: &mut H) {
        if self.buffer.push_back(event).is_err() {
            warn!("tap-hold buffer full, resolving as hold");
            self.resolve(false, host);
            self.process(event, host);
            return;
        }

        let Some((press, _)) = self.pending else {
            return;
        };
        if event.pressed {
            return;
        }
        if event.pos == press.pos {
            let tap = timer_diff_16(event.time, press.time) < TAPPING_TERM;
            self.resolve(tap, host);
        } else if self.buffer.iter().any(|e| e.pressed && e.pos == event.pos) {
            // Another key went down and up inside the window.
            self.resolve(false, host);
        }
    }

    /// Commit the pending tap-hold press, then replay what was buffered.
    fn resolve<H: Host>(&mut self, tap: bool, host: &mut H) {
        let Some((press, action)) = self.pending.take() else {
            return;
        };
        debug!("tap-hold {:?} resolved as {}", press.pos, if tap { "tap" } else { "hold" });
        self.commit_press(press, action, tap, host);

        let mut buffered = core::mem::replace(&mut self.buffer, Deque::new());
        while let Some(event) = buffered.pop_front() {
            self.process(event, host);
        }
    }

    fn commit_press<H: Host>(&mut self, event: KeyEvent, action: Action, tap: bool, host: &mut H) {
        if let Some(tt) = self.tap_toggle.as_mut() {
            if tt.pos != event.pos {
                tt.interrupted = true;
            }
        }
        self.held[event.pos.row as usize][event.pos.col as usize] = Some(Held { action, tap });

        let state = self.state();
        if !dispatch::process_record_user(&mut self.records, host, state, action.id(), &event) {
            return;
        }

        // Any press ends the weak mods of the key before it.
        self.weak_mods = Mods::NONE;
        self.weak_key = None;

        match action {
            Action::No | Action::Trans | Action::Custom(_) => {}
            Action::Key(kc) => self.register_key(kc, event.pos),
            Action::Modded(mods, kc) => {
                self.weak_mods = mods;
                self.weak_key = Some(event.pos);
                self.register_key(kc, event.pos);
            }
            Action::ModTap(mods, kc) => {
                if tap {
                    self.register_key(kc, event.pos);
                } else {
                    self.mods = self.mods | mods;
                    self.send_keyboard_report();
                }
            }
            Action::OneShotMod(mods) => {
                self.oneshot = self.oneshot | mods;
                reactor::oneshot_mods_changed_user(host, self.oneshot);
            }
            Action::TapToggle(layer) => {
                self.tap_toggle = Some(TapToggle {
                    pos: event.pos,
                    layer,
                    time: event.time,
                    was_on: self.layers.is_on(layer),
                    interrupted: false,
                });
                self.set_layers(self.layers.with(layer), host);
            }
            Action::Toggle(layer) => {
                let layers = if self.layers.is_on(layer) {
                    self.layers.without(layer)
                } else {
                    self.layers.with(layer)
                };
                self.set_layers(layers, host);
            }
            Action::Media(media) => self.push_report(HidReport::Consumer(media.usage())),
            Action::Mouse(key) => self.mouse_press(key, event.time),
            Action::Rgb(key) => {
                let light = host.rgblight();
                match key {
                    RgbKey::Toggle => light.toggle(),
                    RgbKey::Mode => light.step_mode(),
                    RgbKey::HueUp => light.increase_hue(),
                    RgbKey::HueDown => light.decrease_hue(),
                    RgbKey::ValUp => light.increase_val(),
                    RgbKey::ValDown => light.decrease_val(),
                }
            }
        }
    }

    fn commit_release<H: Host>(&mut self, event: KeyEvent, host: &mut H) {
        let slot = &mut self.held[event.pos.row as usize][event.pos.col as usize];
        let held = slot.take().unwrap_or_else(|| Held {
            action: lookup(self.layers, event.pos),
            tap: false,
        });

        let state = self.state();
        if !dispatch::process_record_user(&mut self.records, host, state, held.action.id(), &event) {
            return;
        }

        let oneshot_done = self.oneshot_key == Some(event.pos);
        if oneshot_done {
            self.oneshot = Mods::NONE;
            self.oneshot_key = None;
        }

        match held.action {
            Action::Key(kc) => self.unregister_key(kc),
            Action::Modded(_, kc) => {
                if self.weak_key == Some(event.pos) {
                    self.weak_mods = Mods::NONE;
                    self.weak_key = None;
                }
                self.unregister_key(kc);
            }
            Action::ModTap(mods, kc) => {
                if held.tap {
                    self.unregister_key(kc);
                } else {
                    self.mods = self.mods.difference(mods);
                    self.send_keyboard_report();
                }
            }
            Action::TapToggle(layer) => self.release_tap_toggle(layer, event, host),
            Action::Media(_) => self.push_report(HidReport::Consumer(0)),
            Action::Mouse(key) => self.mouse_release(key),
            _ => {}
        }

        if oneshot_done {
            self.send_keyboard_report();
            reactor::oneshot_mods_changed_user(host, Mods::NONE);
        }
    }

    fn release_tap_toggle<H: Host>(&mut self, layer: u8, event: KeyEvent, host: &mut H) {
        let record = match self.tap_toggle {
            Some(tt) if tt.pos == event.pos && tt.layer == layer => {
                self.tap_toggle = None;
                Some(tt)
            }
            _ => None,
        };

        let keep_on = match record {
            Some(tt) if !tt.interrupted && timer_diff_16(event.time, tt.time) < TAPPING_TERM => {
                self.tap_toggle_taps += 1;
                if self.tap_toggle_taps >= TAPPING_TOGGLE {
                    self.tap_toggle_taps = 0;
                    !tt.was_on
                } else {
                    tt.was_on
                }
            }
            Some(tt) => {
                self.tap_toggle_taps = 0;
                tt.was_on
            }
            None => false,
        };

        if !keep_on {
            self.set_layers(self.layers.without(layer), host);
        }
    }

    fn set_layers<H: Host>(&mut self, layers: LayerState, host: &mut H) {
        if layers == self.layers {
            return;
        }
        self.layers = layers;
        self.layers = reactor::layer_state_set_user(host, self.state());
    }

    fn register_key(&mut self, kc: Keycode, pos: KeyPos) {
        if kc.is_modifier() {
            self.mods = self.mods | kc.modifier_bit();
        } else {
            if !self.oneshot.is_empty() && self.oneshot_key.is_none() {
                self.oneshot_key = Some(pos);
            }
            let usage = kc as u8;
            if !self.keys.contains(&usage) {
                match self.keys.iter_mut().find(|k| **k == 0) {
                    Some(slot) => *slot = usage,
                    // More than 6 keys: drop silently like the boot protocol does.
                    None => debug!("rollover, dropping {:02X}", usage),
                }
            }
        }
        self.send_keyboard_report();
    }

    fn unregister_key(&mut self, kc: Keycode) {
        if kc.is_modifier() {
            self.mods = self.mods.difference(kc.modifier_bit());
        } else {
            let usage = kc as u8;
            for slot in self.keys.iter_mut().filter(|k| **k == usage) {
                *slot = 0;
            }
        }
        self.send_keyboard_report();
    }

    fn current_keyboard_report(&self) -> KeyboardReport {
        let mut mods = self.mods | self.weak_mods;
        if self.oneshot_key.is_some() {
            mods = mods | self.oneshot;
        }
        KeyboardReport {
            modifiers: mods.0,
            reserved: 0,
            keys: self.keys,
        }
    }

    fn send_keyboard_report(&mut self) {
        let report = self.current_keyboard_report();
        if report != self.last_keyboard {
            self.last_keyboard = report;
            self.push_report(HidReport::Keyboard(report));
        }
    }

    fn mouse_press(&mut self, key: MouseKey, time: u16) {
        match key {
            MouseKey::Up => self.mouse.y = -MOUSEKEY_DELTA,
            MouseKey::Down => self.mouse.y = MOUSEKEY_DELTA,
            MouseKey::Left => self.mouse.x = -MOUSEKEY_DELTA,
            MouseKey::Right => self.mouse.x = MOUSEKEY_DELTA,
            MouseKey::Button1 => self.mouse.buttons |= 0x01,
            MouseKey::Button2 => self.mouse.buttons |= 0x02,
        }
        self.mouse_time = time;
        self.push_report(HidReport::Mouse(self.mouse));
    }

    fn mouse_release(&mut self, key: MouseKey) {
        match key {
            MouseKey::Up | MouseKey::Down => self.mouse.y = 0,
            MouseKey::Left | MouseKey::Right => self.mouse.x = 0,
            MouseKey::Button1 => self.mouse.buttons &= !0x01,
            MouseKey::Button2 => self.mouse.buttons &= !0x02,
        }
        self.push_report(HidReport::Mouse(self.mouse));
    }

    fn push_report(&mut self, report: HidReport) {
        if self.reports.is_full() {
            warn!("report queue full, dropping oldest");
            self.reports.pop_front();
        }
        let _ = self.reports.push_back(report);
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}
