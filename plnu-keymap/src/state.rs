//! Keyboard state shared between the engine and the user hooks.

use crate::{COLS, ROWS};

/// Bitmask of active layers (bit n = layer n).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerState(pub u32);

impl LayerState {
    pub fn is_on(self, layer: u8) -> bool {
        self.0 & (1 << layer) != 0
    }

    pub fn with(self, layer: u8) -> Self {
        LayerState(self.0 | 1 << layer)
    }

    pub fn without(self, layer: u8) -> Self {
        LayerState(self.0 & !(1 << layer))
    }

    /// Topmost active layer; layer 0 when nothing is on.
    pub fn highest(self) -> u8 {
        if self.0 == 0 {
            0
        } else {
            31 - self.0.leading_zeros() as u8
        }
    }
}

/// Host keyboard LED state as received in the HID output report.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LedState(pub u8);

impl LedState {
    pub const NUM_LOCK: u8 = 1 << 0;
    pub const CAPS_LOCK: u8 = 1 << 1;
    pub const SCROLL_LOCK: u8 = 1 << 2;

    pub fn caps_lock(self) -> bool {
        self.0 & Self::CAPS_LOCK != 0
    }

    pub fn raw(self) -> u8 {
        self.0
    }
}

/// The part of the keyboard state every telemetry packet carries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub layers: LayerState,
    pub leds: LedState,
}

/// Matrix position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

impl KeyPos {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn is_valid(self) -> bool {
        (self.row as usize) < ROWS && (self.col as usize) < COLS
    }
}

/// A debounced press or release, stamped with the 16-bit millisecond timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub pos: KeyPos,
    pub pressed: bool,
    pub time: u16,
}

impl KeyEvent {
    pub const fn press(pos: KeyPos, time: u16) -> Self {
        Self { pos, pressed: true, time }
    }

    pub const fn release(pos: KeyPos, time: u16) -> Self {
        Self { pos, pressed: false, time }
    }
}

/// Elapsed milliseconds between two readings of the free-running 16-bit
/// timer. Correct across a single wrap only.
pub fn timer_diff_16(now: u16, start: u16) -> u16 {
    now.wrapping_sub(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_layer() {
        assert_eq!(LayerState(0).highest(), 0);
        assert_eq!(LayerState(0b1).highest(), 0);
        assert_eq!(LayerState(0b1011).highest(), 3);
        assert_eq!(LayerState(1 << 7).highest(), 7);
    }

    #[test]
    fn test_layer_updates() {
        let state = LayerState(1).with(3);
        assert!(state.is_on(3));
        assert!(!state.without(3).is_on(3));
        assert!(state.without(3).is_on(0));
    }

    #[test]
    fn test_timer_wraps() {
        assert_eq!(timer_diff_16(150, 100), 50);
        assert_eq!(timer_diff_16(10, 65530), 16);
    }

    #[test]
    fn test_caps_lock_bit() {
        assert!(LedState(0b010).caps_lock());
        assert!(!LedState(0b101).caps_lock());
    }
}
