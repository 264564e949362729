//! Shared keymap logic for the ErgoDox EZ `plnu` layout.
//!
//! This crate is `no_std`-compatible so it can be used by both the AVR
//! firmware and the native CLI tool. It holds everything that is pure logic:
//! the layers, the key processing engine, the mod-tap telemetry and the raw
//! HID packet format.

#![no_std]

#[macro_use]
mod fmt;

pub mod action;
pub mod ascii;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod hid;
pub mod host;
pub mod keycode;
pub mod layers;
pub mod modtap;
pub mod reactor;
pub mod report;
pub mod rgblight;
pub mod state;

/// Number of rows in the matrix.
pub const ROWS: usize = 6;
/// Number of columns per half.
pub const COLS_PER_HALF: usize = 7;
/// Total number of columns.
pub const COLS: usize = COLS_PER_HALF * 2;

pub use action::Action;
pub use engine::Keyboard;
pub use host::{Host, Indicator};
pub use keycode::{Keycode, Mods};
pub use report::{DecodeError, Event, Packet, RawReport, Timing};
pub use state::{KeyEvent, KeyPos, LayerState, LedState};
