//! What a matrix position does, and the 16-bit identity each action is known
//! by on the telemetry channel.
//!
//! Identity layout:
//!
//! | range           | action                                   |
//! |-----------------|------------------------------------------|
//! | `0x0000`        | no action                                |
//! | `0x0001`        | transparent                              |
//! | `0x0004-0x00FF` | plain key (HID usage)                    |
//! | `0x0100-0x1FFF` | modded key, `compact mods << 8 \| usage` |
//! | `0x2000-0x3FFF` | mod-tap, `0x2000 \| compact mods << 8 \| usage` |
//! | `0x53xx`        | layer toggle                             |
//! | `0x55xx`        | one-shot mods                            |
//! | `0x58xx`        | layer tap-toggle                         |
//! | `0x5Axx`        | media                                    |
//! | `0x5Bxx`        | mouse                                    |
//! | `0x5Cxx`        | underglow                                |
//! | `0x5Dxx`        | keymap custom keys                       |

use crate::keycode::{CustomKey, Keycode, Media, Mods, MouseKey, RgbKey};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Nothing.
    No,
    /// Fall through to the next lower active layer.
    Trans,
    Key(Keycode),
    /// A key sent together with modifiers, e.g. Shift+Insert.
    Modded(Mods, Keycode),
    /// Modifier when held, key when tapped.
    ModTap(Mods, Keycode),
    /// Modifiers applied to the next key press only.
    OneShotMod(Mods),
    /// Momentary layer when held, toggled layer when tapped.
    TapToggle(u8),
    /// Toggle a layer on press.
    Toggle(u8),
    Media(Media),
    Mouse(MouseKey),
    Rgb(RgbKey),
    Custom(CustomKey),
}

impl Action {
    /// Stable 16-bit identity of this action.
    pub const fn id(self) -> u16 {
        match self {
            Action::No => 0x0000,
            Action::Trans => 0x0001,
            Action::Key(kc) => kc as u16,
            Action::Modded(mods, kc) => (mods.compact() as u16) << 8 | kc as u16,
            Action::ModTap(mods, kc) => 0x2000 | (mods.compact() as u16) << 8 | kc as u16,
            Action::Toggle(layer) => 0x5300 | layer as u16,
            Action::OneShotMod(mods) => 0x5500 | mods.compact() as u16,
            Action::TapToggle(layer) => 0x5800 | layer as u16,
            Action::Media(media) => 0x5A00 | media as u16,
            Action::Mouse(key) => 0x5B00 | key as u16,
            Action::Rgb(key) => 0x5C00 | key as u16,
            Action::Custom(key) => 0x5D00 | key as u16,
        }
    }

    pub fn is_transparent(self) -> bool {
        self == Action::Trans
    }

    pub fn is_layer(self) -> bool {
        matches!(self, Action::TapToggle(_) | Action::Toggle(_))
    }

    pub fn is_modifier(self) -> bool {
        match self {
            Action::Key(kc) => kc.is_modifier(),
            Action::OneShotMod(_) => true,
            _ => false,
        }
    }

    /// Label for layout rendering and telemetry output.
    ///
    /// Composite actions use fixed labels so the result stays `&'static str`.
    pub fn display_name(self) -> &'static str {
        match self {
            Action::No | Action::Trans => "",
            Action::Key(kc) => kc.display_name(),
            Action::Modded(mods, kc) if mods == Mods::LSHIFT => shifted_name(kc),
            Action::Modded(_, _) => "Mod+",
            Action::ModTap(mods, kc) => mod_tap_name(mods, kc),
            Action::OneShotMod(mods) => match mods {
                Mods::HYPER => "OS Hypr",
                _ => "OS Mod",
            },
            Action::TapToggle(layer) => match layer {
                1 => "TT1",
                2 => "TT2",
                3 => "TT3",
                _ => "TT",
            },
            Action::Toggle(layer) => match layer {
                1 => "TG1",
                2 => "TG2",
                3 => "TG3",
                _ => "TG",
            },
            Action::Media(media) => media.display_name(),
            Action::Mouse(key) => key.display_name(),
            Action::Rgb(key) => key.display_name(),
            Action::Custom(key) => key.display_name(),
        }
    }
}

/// US-layout glyph produced by Shift + key.
fn shifted_name(kc: Keycode) -> &'static str {
    match kc {
        Keycode::N1 => "!",
        Keycode::N2 => "@",
        Keycode::N3 => "#",
        Keycode::N4 => "$",
        Keycode::N5 => "%",
        Keycode::N6 => "^",
        Keycode::N7 => "&",
        Keycode::N8 => "*",
        Keycode::N9 => "(",
        Keycode::N0 => ")",
        Keycode::Minus => "_",
        Keycode::Equal => "+",
        Keycode::LBracket => "{",
        Keycode::RBracket => "}",
        Keycode::Backslash => "|",
        Keycode::Quote => "\"",
        Keycode::Grave => "~",
        Keycode::NonUsBackslash => "S+\\|",
        Keycode::Insert => "S+Ins",
        _ => "Sft+",
    }
}

fn mod_tap_name(mods: Mods, kc: Keycode) -> &'static str {
    let ctrl = mods.contains_ctrl();
    match (ctrl, kc) {
        (true, Keycode::F) => "F/Ctl",
        (true, Keycode::J) => "J/Ctl",
        (false, Keycode::D) => "D/Alt",
        (false, Keycode::K) => "K/Alt",
        _ => "MT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ids() {
        assert_eq!(Action::No.id(), 0);
        assert_eq!(Action::Trans.id(), 1);
        assert_eq!(Action::Key(Keycode::A).id(), 0x04);
        assert_eq!(Action::Key(Keycode::Enter).id(), 0x28);
    }

    #[test]
    fn test_mod_tap_ids() {
        assert_eq!(Action::ModTap(Mods::LCTRL, Keycode::F).id(), 0x2109);
        assert_eq!(Action::ModTap(Mods::LALT, Keycode::D).id(), 0x2407);
        assert_eq!(Action::ModTap(Mods::LCTRL, Keycode::J).id(), 0x210D);
        assert_eq!(Action::ModTap(Mods::LALT, Keycode::K).id(), 0x240E);
    }

    #[test]
    fn test_special_ids_are_distinct() {
        let actions = [
            Action::Modded(Mods::LSHIFT, Keycode::Insert),
            Action::Toggle(3),
            Action::TapToggle(1),
            Action::OneShotMod(Mods::HYPER),
            Action::Media(Media::PlayPause),
            Action::Mouse(MouseKey::Button1),
            Action::Rgb(RgbKey::Mode),
            Action::Custom(CustomKey::HidKey),
        ];
        for (i, a) in actions.iter().enumerate() {
            assert!(a.id() > 0xFF, "{:?} collides with plain keys", a);
            for b in &actions[i + 1..] {
                assert_ne!(a.id(), b.id());
            }
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Action::Modded(Mods::LSHIFT, Keycode::N1).display_name(), "!");
        assert_eq!(Action::ModTap(Mods::LCTRL, Keycode::F).display_name(), "F/Ctl");
        assert_eq!(Action::Trans.display_name(), "");
    }
}
