//! The four keymap layers and layer-stack lookup.
//!
//! The ErgoDox has a 6×14 matrix (6 rows, 14 columns: 7 left + 7 right).
//! Rows 0-3 are the main block, row 4 the bottom row (5 keys per side) and
//! row 5 the thumb clusters. The inner column has no key on row 2.

use crate::action::Action;
use crate::keycode::{CustomKey, Keycode, Media, Mods, MouseKey, RgbKey};
use crate::state::{KeyPos, LayerState};
use crate::{COLS, ROWS};

pub const BASE: u8 = 0;
pub const SYMB: u8 = 1;
pub const MDIA: u8 = 2;
pub const NUM: u8 = 3;

/// Number of layers.
pub const NUM_LAYERS: usize = 4;

pub fn layer_name(layer: u8) -> &'static str {
    match layer {
        BASE => "Base",
        SYMB => "Symbols",
        MDIA => "Media",
        NUM => "Numpad",
        _ => "?",
    }
}

/// Home-row mod-taps.
pub const CTL_F: Action = Action::ModTap(Mods::LCTRL, Keycode::F);
pub const ALT_D: Action = Action::ModTap(Mods::LALT, Keycode::D);
pub const CTL_J: Action = Action::ModTap(Mods::LCTRL, Keycode::J);
pub const ALT_K: Action = Action::ModTap(Mods::LALT, Keycode::K);

/// Transparent.
const ___: Action = Action::Trans;
/// No key at this matrix position.
const XXX: Action = Action::No;

const fn k(kc: Keycode) -> Action {
    Action::Key(kc)
}

const fn s(kc: Keycode) -> Action {
    Action::Modded(Mods::LSHIFT, kc)
}

const ESC: Action = k(Keycode::Escape);
const TAB: Action = k(Keycode::Tab);
const ENT: Action = k(Keycode::Enter);
const SPC: Action = k(Keycode::Space);
const BSP: Action = k(Keycode::Backspace);
const DEL: Action = k(Keycode::Delete);
const INS: Action = k(Keycode::Insert);
const CAPS: Action = k(Keycode::CapsLock);
const PSCR: Action = k(Keycode::PrintScreen);
const HOME: Action = k(Keycode::Home);
const END: Action = k(Keycode::End);
const PGUP: Action = k(Keycode::PageUp);
const PGDN: Action = k(Keycode::PageDown);
const LEFT: Action = k(Keycode::Left);
const RGHT: Action = k(Keycode::Right);
const UP: Action = k(Keycode::Up);
const DOWN: Action = k(Keycode::Down);
const MINS: Action = k(Keycode::Minus);
const EQL: Action = k(Keycode::Equal);
const LBRC: Action = k(Keycode::LBracket);
const RBRC: Action = k(Keycode::RBracket);
const QUOT: Action = k(Keycode::Quote);
const GRV: Action = k(Keycode::Grave);
const NUHS: Action = k(Keycode::NonUsHash);
const NUBS: Action = k(Keycode::NonUsBackslash);
const SCLN: Action = k(Keycode::Semicolon);
const COMM: Action = k(Keycode::Comma);
const DOT: Action = k(Keycode::Dot);
const SLSH: Action = k(Keycode::Slash);
const APP: Action = k(Keycode::Application);
const LSFT: Action = k(Keycode::LShift);
const RSFT: Action = k(Keycode::RShift);
const LCTL: Action = k(Keycode::LCtrl);
const LALT: Action = k(Keycode::LAlt);
const RGUI: Action = k(Keycode::RGui);

const EXLM: Action = s(Keycode::N1);
const AT: Action = s(Keycode::N2);
const HASH: Action = s(Keycode::N3);
const DLR: Action = s(Keycode::N4);
const PERC: Action = s(Keycode::N5);
const ASTR: Action = s(Keycode::N8);
const LCBR: Action = s(Keycode::LBracket);
const RCBR: Action = s(Keycode::RBracket);
const PIPE: Action = s(Keycode::Backslash);
const PLUS: Action = s(Keycode::Equal);

const TT1: Action = Action::TapToggle(SYMB);
const TG3: Action = Action::Toggle(NUM);
const HYPR: Action = Action::OneShotMod(Mods::HYPER);

const MPLY: Action = Action::Media(Media::PlayPause);
const MPRV: Action = Action::Media(Media::PrevTrack);
const MNXT: Action = Action::Media(Media::NextTrack);
const VOLU: Action = Action::Media(Media::VolumeUp);
const VOLD: Action = Action::Media(Media::VolumeDown);
const MUTE: Action = Action::Media(Media::Mute);
const WBAK: Action = Action::Media(Media::WwwBack);

const MS_U: Action = Action::Mouse(MouseKey::Up);
const MS_L: Action = Action::Mouse(MouseKey::Left);
const BTN1: Action = Action::Mouse(MouseKey::Button1);
const BTN2: Action = Action::Mouse(MouseKey::Button2);

const RTOG: Action = Action::Rgb(RgbKey::Toggle);
const RMOD: Action = Action::Rgb(RgbKey::Mode);
const RHUI: Action = Action::Rgb(RgbKey::HueUp);
const RHUD: Action = Action::Rgb(RgbKey::HueDown);
const RVAI: Action = Action::Rgb(RgbKey::ValUp);
const RVAD: Action = Action::Rgb(RgbKey::ValDown);

const EPRM: Action = Action::Custom(CustomKey::Eprm);
const VRSN: Action = Action::Custom(CustomKey::Version);
const RSLD: Action = Action::Custom(CustomKey::RgbSolid);
const HIDK: Action = Action::Custom(CustomKey::HidKey);

/// Keymap layers.
///
/// Thumb row (row 5), left half: col 0 bottom small, col 1 middle small,
/// col 2 inner tall, col 3 outer tall, col 4 top inner, col 5 top outer.
/// The right half mirrors it: col 8 top outer, col 9 top inner, col 10 outer
/// tall, col 11 inner tall, col 12 middle small, col 13 bottom small.
pub static LAYERS: [[[Action; COLS]; ROWS]; NUM_LAYERS] = [
    // Layer 0: Base
    [
        //  Left: Esc, 1, 2, 3, 4, 5, Caps          Right: PScr, 6, 7, 8, 9, 0, TG(NUM)
        [ESC, k(Keycode::N1), k(Keycode::N2), k(Keycode::N3), k(Keycode::N4), k(Keycode::N5), CAPS,
         PSCR, k(Keycode::N6), k(Keycode::N7), k(Keycode::N8), k(Keycode::N9), k(Keycode::N0), TG3],

        //  Left: Tab, Q, W, E, R, T, S(Ins)        Right: Home, Y, U, I, O, P, Bksp
        [TAB, k(Keycode::Q), k(Keycode::W), k(Keycode::E), k(Keycode::R), k(Keycode::T), s(Keycode::Insert),
         HOME, k(Keycode::Y), k(Keycode::U), k(Keycode::I), k(Keycode::O), k(Keycode::P), BSP],

        //  Left: LShift, A, S, D/Alt, F/Ctl, G     Right: H, J/Ctl, K/Alt, L, ;, RShift
        [LSFT, k(Keycode::A), k(Keycode::S), ALT_D, CTL_F, k(Keycode::G), XXX,
         XXX, k(Keycode::H), CTL_J, ALT_K, k(Keycode::L), SCLN, RSFT],

        //  Left: LCtrl, Z, X, C, V, B, -           Right: End, N, M, ,, ., /, LAlt
        [LCTL, k(Keycode::Z), k(Keycode::X), k(Keycode::C), k(Keycode::V), k(Keycode::B), MINS,
         END, k(Keycode::N), k(Keycode::M), COMM, DOT, SLSH, LALT],

        //  Left: App, OSM(Hyper), HID, #~, TT(SYMB)   Right: TT(SYMB), ←, ↓, ↑, →
        [APP, HYPR, HIDK, NUHS, TT1, XXX, XXX,
         XXX, XXX, TT1, LEFT, DOWN, UP, RGHT],

        //  Left thumb: Prev, Next / Ins / Space, TT(SYMB), Del
        //  Right thumb: Play, RGui / PgUp / PgDn, Bksp, Enter
        [DEL, INS, TT1, SPC, MNXT, MPRV, XXX,
         XXX, RGUI, MPLY, ENT, BSP, PGUP, PGDN],
    ],

    // Layer 1: Symbols
    [
        [VRSN, k(Keycode::F1), k(Keycode::F2), k(Keycode::F3), k(Keycode::F4), k(Keycode::F5), ___,
         ___, k(Keycode::F6), k(Keycode::F7), k(Keycode::F8), k(Keycode::F9), k(Keycode::F10), k(Keycode::F11)],

        [___, EXLM, AT, LCBR, RCBR, PIPE, ___,
         ___, LBRC, RBRC, UP, MINS, EQL, k(Keycode::F12)],

        [___, HASH, DLR, ___, ___, GRV, XXX,
         XXX, LCBR, LEFT, DOWN, RGHT, ___, ___],

        [___, PERC, s(Keycode::Minus), s(Keycode::Equal), NUBS, s(Keycode::NonUsBackslash), ___,
         ___, RCBR, QUOT, NUHS, s(Keycode::Quote), PIPE, ___],

        [EPRM, ___, ___, ___, ___, XXX, XXX,
         XXX, XXX, PGUP, PGDN, ___, ___, ___],

        //  Left thumb: Animate / Bright- / Bright+
        [___, ___, RVAI, RVAD, ___, RMOD, XXX,
         XXX, ___, ___, ___, ___, ___, ___],
    ],

    // Layer 2: Media and mouse
    [
        [___, ___, ___, ___, ___, ___, ___,
         ___, ___, ___, ___, ___, ___, ___],

        [___, ___, ___, MS_U, ___, ___, ___,
         ___, ___, ___, ___, ___, ___, ___],

        [___, ___, MS_L, ___, ___, ___, XXX,
         XXX, ___, ___, ___, ___, ___, MPLY],

        [___, ___, ___, ___, ___, ___, ___,
         ___, ___, ___, MPRV, MNXT, ___, ___],

        [___, ___, ___, BTN1, BTN2, XXX, XXX,
         XXX, XXX, VOLU, VOLD, MUTE, ___, ___],

        //  Right thumb: browser back on the outer tall key
        [___, ___, ___, ___, ___, ___, XXX,
         XXX, ___, ___, WBAK, ___, ___, ___],
    ],

    // Layer 3: Numpad and underglow
    [
        [___, ___, ___, ___, ___, ___, ___,
         ___, ___, ___, SLSH, ASTR, MINS, ___],

        [___, RTOG, RSLD, ___, ___, ___, ___,
         ___, ___, k(Keycode::N7), k(Keycode::N8), k(Keycode::N9), PLUS, ___],

        [___, RHUD, RHUI, ___, ___, ___, XXX,
         XXX, TAB, k(Keycode::N4), k(Keycode::N5), k(Keycode::N6), PLUS, ___],

        [___, RVAD, RVAI, ___, ___, ___, ___,
         ___, ___, k(Keycode::N1), k(Keycode::N2), k(Keycode::N3), ENT, ___],

        [___, RMOD, ___, ___, ___, XXX, XXX,
         XXX, XXX, k(Keycode::N0), k(Keycode::N0), DOT, ___, ___],

        [___, ___, ___, ___, ___, ___, XXX,
         XXX, ___, ___, ___, ___, ___, ___],
    ],
];

/// Look up the action for a matrix position, resolving transparent keys
/// through the active layer stack. The base layer is always active.
pub fn lookup(layers: LayerState, pos: KeyPos) -> Action {
    if !pos.is_valid() {
        return Action::No;
    }
    for layer in (0..NUM_LAYERS).rev() {
        if layer != BASE as usize && !layers.is_on(layer as u8) {
            continue;
        }
        let action = LAYERS[layer][pos.row as usize][pos.col as usize];
        if !action.is_transparent() {
            return action;
        }
    }
    Action::No
}

/// First action in the keymap whose identity is `id`.
pub fn find_action(id: u16) -> Option<Action> {
    LAYERS
        .iter()
        .flat_map(|layer| layer.iter())
        .flat_map(|row| row.iter())
        .copied()
        .find(|action| action.id() == id && *action != Action::No)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_layer_lookup() {
        assert_eq!(lookup(LayerState(1), KeyPos::new(2, 4)), CTL_F);
        assert_eq!(lookup(LayerState(1), KeyPos::new(2, 9)), CTL_J);
        assert_eq!(lookup(LayerState(1), KeyPos::new(4, 2)), HIDK);
    }

    #[test]
    fn test_transparent_falls_through() {
        let symb = LayerState(1).with(SYMB);
        assert_eq!(lookup(symb, KeyPos::new(0, 0)), VRSN);
        // Transparent on SYMB resolves to the base key.
        assert_eq!(lookup(symb, KeyPos::new(2, 4)), CTL_F);
    }

    #[test]
    fn test_higher_layer_wins() {
        let both = LayerState(1).with(SYMB).with(NUM);
        assert_eq!(lookup(both, KeyPos::new(1, 9)), k(Keycode::N7));
        assert_eq!(lookup(both, KeyPos::new(0, 1)), k(Keycode::F1));
    }

    #[test]
    fn test_missing_positions() {
        assert_eq!(lookup(LayerState(1), KeyPos::new(2, 6)), Action::No);
        assert_eq!(lookup(LayerState(1), KeyPos::new(9, 0)), Action::No);
    }

    #[test]
    fn test_find_action() {
        assert_eq!(find_action(CTL_F.id()), Some(CTL_F));
        assert_eq!(find_action(Keycode::A as u16), Some(k(Keycode::A)));
        assert_eq!(find_action(0), None);
        assert_eq!(find_action(0x7FFF), None);
    }

    #[test]
    fn test_every_layer_has_custom_keys_where_expected() {
        assert_eq!(LAYERS[SYMB as usize][4][0], EPRM);
        assert_eq!(LAYERS[NUM as usize][1][2], RSLD);
    }
}
