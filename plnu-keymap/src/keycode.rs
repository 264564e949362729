//! HID usages and the small enums the keymap's special keys are built from.

/// USB HID keycodes.
/// See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Keycode {
    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Numbers
    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LBracket = 0x2F,
    RBracket = 0x30,
    Backslash = 0x31,
    /// Non-US # and ~ (ISO key left of Enter)
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Dot = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    // Function keys
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    /// Non-US \ and | (ISO key left of Z)
    NonUsBackslash = 0x64,
    Application = 0x65,

    // Modifiers (used in the modifier byte, not in keycode array)
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl Keycode {
    /// Check if this keycode is a modifier (LCtrl..RGui).
    pub fn is_modifier(self) -> bool {
        let v = self as u8;
        (0xE0..=0xE7).contains(&v)
    }

    /// Modifier mask for this key, empty for non-modifiers.
    pub fn modifier_bit(self) -> Mods {
        if self.is_modifier() {
            Mods(1 << (self as u8 - 0xE0))
        } else {
            Mods::NONE
        }
    }

    /// Display name for use in layout visualizations and telemetry output.
    pub fn display_name(self) -> &'static str {
        match self {
            Keycode::A => "A",
            Keycode::B => "B",
            Keycode::C => "C",
            Keycode::D => "D",
            Keycode::E => "E",
            Keycode::F => "F",
            Keycode::G => "G",
            Keycode::H => "H",
            Keycode::I => "I",
            Keycode::J => "J",
            Keycode::K => "K",
            Keycode::L => "L",
            Keycode::M => "M",
            Keycode::N => "N",
            Keycode::O => "O",
            Keycode::P => "P",
            Keycode::Q => "Q",
            Keycode::R => "R",
            Keycode::S => "S",
            Keycode::T => "T",
            Keycode::U => "U",
            Keycode::V => "V",
            Keycode::W => "W",
            Keycode::X => "X",
            Keycode::Y => "Y",
            Keycode::Z => "Z",
            Keycode::N1 => "1",
            Keycode::N2 => "2",
            Keycode::N3 => "3",
            Keycode::N4 => "4",
            Keycode::N5 => "5",
            Keycode::N6 => "6",
            Keycode::N7 => "7",
            Keycode::N8 => "8",
            Keycode::N9 => "9",
            Keycode::N0 => "0",
            Keycode::Enter => "Ent",
            Keycode::Escape => "Esc",
            Keycode::Backspace => "Bksp",
            Keycode::Tab => "Tab",
            Keycode::Space => "Spc",
            Keycode::Minus => "-",
            Keycode::Equal => "=",
            Keycode::LBracket => "[",
            Keycode::RBracket => "]",
            Keycode::Backslash => "\\",
            Keycode::NonUsHash => "#~",
            Keycode::Semicolon => ";",
            Keycode::Quote => "'",
            Keycode::Grave => "`",
            Keycode::Comma => ",",
            Keycode::Dot => ".",
            Keycode::Slash => "/",
            Keycode::CapsLock => "Caps",
            Keycode::F1 => "F1",
            Keycode::F2 => "F2",
            Keycode::F3 => "F3",
            Keycode::F4 => "F4",
            Keycode::F5 => "F5",
            Keycode::F6 => "F6",
            Keycode::F7 => "F7",
            Keycode::F8 => "F8",
            Keycode::F9 => "F9",
            Keycode::F10 => "F10",
            Keycode::F11 => "F11",
            Keycode::F12 => "F12",
            Keycode::PrintScreen => "PScr",
            Keycode::ScrollLock => "ScrL",
            Keycode::Pause => "Paus",
            Keycode::Insert => "Ins",
            Keycode::Home => "Home",
            Keycode::PageUp => "PgUp",
            Keycode::Delete => "Del",
            Keycode::End => "End",
            Keycode::PageDown => "PgDn",
            Keycode::Right => "\u{2192}",
            Keycode::Left => "\u{2190}",
            Keycode::Down => "\u{2193}",
            Keycode::Up => "\u{2191}",
            Keycode::NonUsBackslash => "\\|",
            Keycode::Application => "App",
            Keycode::LCtrl => "Ctrl",
            Keycode::LShift => "Shft",
            Keycode::LAlt => "Alt",
            Keycode::LGui => "Gui",
            Keycode::RCtrl => "RCtl",
            Keycode::RShift => "RSft",
            Keycode::RAlt => "RAlt",
            Keycode::RGui => "RGui",
        }
    }
}

/// HID modifier byte (bit 0 = LCtrl, bit 7 = RGui).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Mods(pub u8);

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const LCTRL: Mods = Mods(0x01);
    pub const LSHIFT: Mods = Mods(0x02);
    pub const LALT: Mods = Mods(0x04);
    pub const LGUI: Mods = Mods(0x08);
    pub const RCTRL: Mods = Mods(0x10);
    pub const RSHIFT: Mods = Mods(0x20);
    pub const RALT: Mods = Mods(0x40);
    pub const RGUI: Mods = Mods(0x80);
    /// Ctrl + Shift + Alt + Gui.
    pub const HYPER: Mods = Mods(0x0F);

    pub const fn union(self, other: Mods) -> Mods {
        Mods(self.0 | other.0)
    }

    pub const fn difference(self, other: Mods) -> Mods {
        Mods(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains_ctrl(self) -> bool {
        self.0 & (Self::LCTRL.0 | Self::RCTRL.0) != 0
    }

    /// 5-bit form used in action identities: bits 0-3 are Ctrl/Shift/Alt/Gui,
    /// bit 4 selects the right-hand modifiers.
    pub const fn compact(self) -> u8 {
        let left = self.0 & 0x0F;
        let right = self.0 >> 4;
        if left == 0 && right != 0 {
            0x10 | right
        } else {
            left
        }
    }

    /// Short label such as `C+A` for layout rendering.
    pub fn label(self) -> &'static str {
        match self.compact() & 0x0F {
            0x01 => "Ctl",
            0x02 => "Sft",
            0x04 => "Alt",
            0x08 => "Gui",
            0x06 => "ASft",
            0x0F => "Hypr",
            0x07 => "Meh",
            _ => "Mod",
        }
    }
}

impl core::ops::BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Mods) -> Mods {
        self.union(rhs)
    }
}

/// Consumer page keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Media {
    PlayPause,
    PrevTrack,
    NextTrack,
    VolumeUp,
    VolumeDown,
    Mute,
    WwwBack,
}

impl Media {
    /// HID Consumer page (0x0C) usage.
    pub fn usage(self) -> u16 {
        match self {
            Media::PlayPause => 0x00CD,
            Media::PrevTrack => 0x00B6,
            Media::NextTrack => 0x00B5,
            Media::VolumeUp => 0x00E9,
            Media::VolumeDown => 0x00EA,
            Media::Mute => 0x00E2,
            Media::WwwBack => 0x0224,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Media::PlayPause => "Play",
            Media::PrevTrack => "Prev",
            Media::NextTrack => "Next",
            Media::VolumeUp => "Vol+",
            Media::VolumeDown => "Vol-",
            Media::Mute => "Mute",
            Media::WwwBack => "Back",
        }
    }
}

/// Mouse keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MouseKey {
    Up,
    Down,
    Left,
    Right,
    Button1,
    Button2,
}

impl MouseKey {
    pub fn display_name(self) -> &'static str {
        match self {
            MouseKey::Up => "MsUp",
            MouseKey::Down => "MsDn",
            MouseKey::Left => "MsLt",
            MouseKey::Right => "MsRt",
            MouseKey::Button1 => "Lclk",
            MouseKey::Button2 => "Rclk",
        }
    }
}

/// Underglow control keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RgbKey {
    Toggle,
    Mode,
    HueUp,
    HueDown,
    ValUp,
    ValDown,
}

impl RgbKey {
    pub fn display_name(self) -> &'static str {
        match self {
            RgbKey::Toggle => "RGB",
            RgbKey::Mode => "Anim",
            RgbKey::HueUp => "Hue+",
            RgbKey::HueDown => "Hue-",
            RgbKey::ValUp => "Bri+",
            RgbKey::ValDown => "Bri-",
        }
    }
}

/// Keymap-specific keys handled by the dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CustomKey {
    /// Erase the persistent configuration.
    Eprm,
    /// Type the firmware identification string.
    Version,
    /// Switch the underglow to its static mode.
    RgbSolid,
    /// Emit a diagnostic keypress report on the raw HID channel.
    HidKey,
}

impl CustomKey {
    pub fn display_name(self) -> &'static str {
        match self {
            CustomKey::Eprm => "EPRM",
            CustomKey::Version => "Ver",
            CustomKey::RgbSolid => "Solid",
            CustomKey::HidKey => "HID",
        }
    }
}
