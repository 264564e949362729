//! US-layout ASCII to key usage mapping, used to type strings.

use crate::hid::KeyboardReport;
use crate::keycode::{Keycode, Mods};

/// Key and shift state that produce `c`, or `None` for characters
/// that have no key on a US layout.
pub fn ascii_to_key(c: u8) -> Option<(Keycode, bool)> {
    use Keycode::*;

    const LETTERS: [Keycode; 26] = [
        A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    ];
    const DIGITS: [Keycode; 10] = [N0, N1, N2, N3, N4, N5, N6, N7, N8, N9];

    let key = match c {
        b'a'..=b'z' => (LETTERS[(c - b'a') as usize], false),
        b'A'..=b'Z' => (LETTERS[(c - b'A') as usize], true),
        b'0'..=b'9' => (DIGITS[(c - b'0') as usize], false),
        b'\n' => (Enter, false),
        b'\t' => (Tab, false),
        b' ' => (Space, false),
        b'!' => (N1, true),
        b'@' => (N2, true),
        b'#' => (N3, true),
        b'$' => (N4, true),
        b'%' => (N5, true),
        b'^' => (N6, true),
        b'&' => (N7, true),
        b'*' => (N8, true),
        b'(' => (N9, true),
        b')' => (N0, true),
        b'-' => (Minus, false),
        b'_' => (Minus, true),
        b'=' => (Equal, false),
        b'+' => (Equal, true),
        b'[' => (LBracket, false),
        b'{' => (LBracket, true),
        b']' => (RBracket, false),
        b'}' => (RBracket, true),
        b'\\' => (Backslash, false),
        b'|' => (Backslash, true),
        b';' => (Semicolon, false),
        b':' => (Semicolon, true),
        b'\'' => (Quote, false),
        b'"' => (Quote, true),
        b'`' => (Grave, false),
        b'~' => (Grave, true),
        b',' => (Comma, false),
        b'<' => (Comma, true),
        b'.' => (Dot, false),
        b'>' => (Dot, true),
        b'/' => (Slash, false),
        b'?' => (Slash, true),
        _ => return None,
    };
    Some(key)
}

/// Types a string as alternating press and release reports.
pub struct StringTyper {
    text: &'static [u8],
    pos: usize,
    key_down: bool,
}

impl StringTyper {
    pub const fn new() -> Self {
        Self {
            text: &[],
            pos: 0,
            key_down: false,
        }
    }

    /// Start typing `text`, dropping whatever was still queued.
    pub fn start(&mut self, text: &'static str) {
        self.text = text.as_bytes();
        self.pos = 0;
        self.key_down = false;
    }

    pub fn is_busy(&self) -> bool {
        self.key_down || self.pos < self.text.len()
    }

    pub fn next_report(&mut self) -> Option<KeyboardReport> {
        if self.key_down {
            self.key_down = false;
            self.pos += 1;
            return Some(KeyboardReport::empty());
        }

        while let Some(&c) = self.text.get(self.pos) {
            let Some((key, shift)) = ascii_to_key(c) else {
                self.pos += 1;
                continue;
            };
            self.key_down = true;
            let mut report = KeyboardReport::empty();
            if shift {
                report.modifiers = Mods::LSHIFT.0;
            }
            report.keys[0] = key as u8;
            return Some(report);
        }
        None
    }
}

impl Default for StringTyper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_shift() {
        assert_eq!(ascii_to_key(b'e'), Some((Keycode::E, false)));
        assert_eq!(ascii_to_key(b'Z'), Some((Keycode::Z, true)));
        assert_eq!(ascii_to_key(b'0'), Some((Keycode::N0, false)));
    }

    #[test]
    fn test_version_string_is_typable() {
        for c in crate::config::VERSION_STRING.bytes() {
            assert!(ascii_to_key(c).is_some(), "{:?} has no key", c as char);
        }
    }

    #[test]
    fn test_typer_alternates_press_and_release() {
        let mut typer = StringTyper::new();
        typer.start("aA\u{7f}b");
        let mut reports = [KeyboardReport::empty(); 6];
        for slot in reports.iter_mut() {
            *slot = typer.next_report().unwrap();
        }
        assert_eq!(typer.next_report(), None);
        assert!(!typer.is_busy());

        assert_eq!(reports[0].keys[0], Keycode::A as u8);
        assert_eq!(reports[0].modifiers, 0);
        assert_eq!(reports[1], KeyboardReport::empty());
        assert_eq!(reports[2].modifiers, Mods::LSHIFT.0);
        assert_eq!(reports[4].keys[0], Keycode::B as u8);
        assert_eq!(reports[5], KeyboardReport::empty());
    }

    #[test]
    fn test_typer_idle_right_after_last_release() {
        let mut typer = StringTyper::new();
        typer.start("ab");
        let mut busy = [false; 4];
        for slot in busy.iter_mut() {
            assert!(typer.next_report().is_some());
            *slot = typer.is_busy();
        }
        assert_eq!(busy, [true, true, true, false]);
        assert_eq!(typer.next_report(), None);
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(ascii_to_key(0x7F), None);
        assert_eq!(ascii_to_key(0xC3), None);
    }
}
