//! Per-key debounce logic.
//!
//! Each key has a counter that must reach DEBOUNCE_THRESHOLD consecutive
//! consistent readings before the debounced state changes. Every change is
//! reported as a timestamped [`KeyEvent`].

use plnu_keymap::{KeyEvent, KeyPos, COLS, ROWS};

use crate::matrix::MatrixState;

/// Number of consistent scan cycles required to register a state change.
/// At ~1ms scan rate, this gives ~5ms debounce time.
const DEBOUNCE_THRESHOLD: u8 = 5;

pub struct Debouncer {
    /// Debounced key states: false = released, true = pressed.
    state: MatrixState,
    /// Per-key counters tracking consecutive raw readings that differ from debounced state.
    counters: [[u8; COLS]; ROWS],
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            state: [[false; COLS]; ROWS],
            counters: [[0; COLS]; ROWS],
        }
    }

    /// Feed one raw scan taken at `now` and call `on_change` for every key
    /// whose debounced state flipped, in row-major order.
    pub fn update<F: FnMut(KeyEvent)>(&mut self, raw_state: &MatrixState, now: u16, mut on_change: F) {
        for row in 0..ROWS {
            for col in 0..COLS {
                let pressed = raw_state[row][col];

                if pressed == self.state[row][col] {
                    self.counters[row][col] = 0;
                    continue;
                }

                self.counters[row][col] += 1;
                if self.counters[row][col] >= DEBOUNCE_THRESHOLD {
                    self.state[row][col] = pressed;
                    self.counters[row][col] = 0;

                    let pos = KeyPos::new(row as u8, col as u8);
                    on_change(if pressed {
                        KeyEvent::press(pos, now)
                    } else {
                        KeyEvent::release(pos, now)
                    });
                }
            }
        }
    }
}
