//! Underglow model: persistent configuration, transient colour override and
//! the animation frames the firmware pushes out to the LED strip.

const HUE_STEP: u8 = 8;
const VAL_STEP: u8 = 17;

/// Highest animation mode number; modes are numbered from 1.
pub const MODE_COUNT: u8 = 3;
pub const MODE_STATIC: u8 = 1;
pub const MODE_BREATHING: u8 = 2;
pub const MODE_RAINBOW: u8 = 3;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Integer HSV to RGB conversion with 8-bit hue (0-255 covers the wheel).
pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let (h, s, v) = (hsv.h as u16, hsv.s as u16, hsv.v as u16);
    if s == 0 {
        return Rgb::new(hsv.v, hsv.v, hsv.v);
    }

    let region = h / 43;
    let remainder = (h - region * 43) * 6;

    let p = ((v * (255 - s)) >> 8) as u8;
    let q = ((v * (255 - ((s * remainder) >> 8))) >> 8) as u8;
    let t = ((v * (255 - ((s * (255 - remainder)) >> 8))) >> 8) as u8;
    let v = hsv.v;

    match region {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

/// The part of the underglow state that survives a power cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RgblightConfig {
    pub enabled: bool,
    pub mode: u8,
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

impl RgblightConfig {
    pub const SIZE: usize = 5;

    pub const fn default_config() -> Self {
        Self {
            enabled: true,
            mode: MODE_STATIC,
            hue: 0,
            sat: 255,
            val: 255,
        }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.enabled as u8, self.mode, self.hue, self.sat, self.val]
    }

    /// Parse a stored config. Out-of-range modes fall back to the defaults.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let mode = bytes[1];
        if !(1..=MODE_COUNT).contains(&mode) {
            return Self::default_config();
        }
        Self {
            enabled: bytes[0] != 0,
            mode,
            hue: bytes[2],
            sat: bytes[3],
            val: bytes[4],
        }
    }
}

impl Default for RgblightConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

pub struct Rgblight {
    config: RgblightConfig,
    /// Colour set directly with `set_rgb`, shown until the mode changes.
    color_override: Option<Rgb>,
    dirty: bool,
}

impl Rgblight {
    pub const fn new(config: RgblightConfig) -> Self {
        Self {
            config,
            color_override: None,
            dirty: false,
        }
    }

    pub fn config(&self) -> RgblightConfig {
        self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn mode(&self) -> u8 {
        self.config.mode
    }

    /// Show a fixed colour without touching the stored configuration.
    pub fn set_rgb(&mut self, color: Rgb) {
        self.color_override = Some(color);
    }

    pub fn color_override(&self) -> Option<Rgb> {
        self.color_override
    }

    pub fn set_mode(&mut self, mode: u8) {
        let mode = mode.clamp(1, MODE_COUNT);
        self.color_override = None;
        if self.config.mode != mode {
            self.config.mode = mode;
            self.dirty = true;
        }
    }

    pub fn step_mode(&mut self) {
        let next = if self.config.mode >= MODE_COUNT {
            1
        } else {
            self.config.mode + 1
        };
        self.set_mode(next);
    }

    /// Replace the configuration, e.g. after the persistent store was reset.
    pub fn reload(&mut self, config: RgblightConfig) {
        self.config = config;
        self.color_override = None;
        self.dirty = false;
    }

    pub fn enable(&mut self) {
        if !self.config.enabled {
            self.config.enabled = true;
            self.dirty = true;
        }
    }

    pub fn disable(&mut self) {
        if self.config.enabled {
            self.config.enabled = false;
            self.dirty = true;
        }
    }

    pub fn toggle(&mut self) {
        if self.config.enabled {
            self.disable();
        } else {
            self.enable();
        }
    }

    pub fn increase_hue(&mut self) {
        self.config.hue = self.config.hue.wrapping_add(HUE_STEP);
        self.hsv_changed();
    }

    pub fn decrease_hue(&mut self) {
        self.config.hue = self.config.hue.wrapping_sub(HUE_STEP);
        self.hsv_changed();
    }

    pub fn increase_val(&mut self) {
        self.config.val = self.config.val.saturating_add(VAL_STEP);
        self.hsv_changed();
    }

    pub fn decrease_val(&mut self) {
        self.config.val = self.config.val.saturating_sub(VAL_STEP);
        self.hsv_changed();
    }

    fn hsv_changed(&mut self) {
        self.color_override = None;
        self.dirty = true;
    }

    /// Configuration to persist, if it changed since the last call.
    pub fn take_dirty(&mut self) -> Option<RgblightConfig> {
        if self.dirty {
            self.dirty = false;
            Some(self.config)
        } else {
            None
        }
    }

    /// Colour to show at `now` (milliseconds).
    pub fn frame(&self, now: u16) -> Rgb {
        if !self.config.enabled {
            return Rgb::OFF;
        }
        if let Some(color) = self.color_override {
            return color;
        }

        let c = self.config;
        match c.mode {
            MODE_BREATHING => {
                // 256 steps of 8 ms, rising then falling.
                let phase = (now >> 3) as u8;
                let level = if phase < 128 { phase * 2 } else { (255 - phase) * 2 };
                let v = (c.val as u16 * level as u16 / 255) as u8;
                hsv_to_rgb(Hsv { h: c.hue, s: c.sat, v })
            }
            MODE_RAINBOW => hsv_to_rgb(Hsv {
                h: c.hue.wrapping_add((now >> 4) as u8),
                s: c.sat,
                v: c.val,
            }),
            _ => hsv_to_rgb(Hsv { h: c.hue, s: c.sat, v: c.val }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(Hsv { h: 0, s: 255, v: 255 }), Rgb::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(Hsv { h: 0, s: 0, v: 100 }), Rgb::new(100, 100, 100));
        let green = hsv_to_rgb(Hsv { h: 86, s: 255, v: 255 });
        assert_eq!(green.g, 255);
        assert!(green.r < 10);
    }

    #[test]
    fn test_override_wins_until_mode_change() {
        let mut light = Rgblight::new(RgblightConfig::default());
        light.set_rgb(Rgb::new(1, 2, 3));
        assert_eq!(light.frame(0), Rgb::new(1, 2, 3));
        light.set_mode(MODE_STATIC);
        assert_eq!(light.frame(0), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_disabled_is_dark() {
        let mut light = Rgblight::new(RgblightConfig::default());
        light.set_rgb(Rgb::new(9, 9, 9));
        light.disable();
        assert_eq!(light.frame(1234), Rgb::OFF);
    }

    #[test]
    fn test_step_mode_wraps() {
        let mut light = Rgblight::new(RgblightConfig::default());
        light.step_mode();
        assert_eq!(light.mode(), MODE_BREATHING);
        light.step_mode();
        light.step_mode();
        assert_eq!(light.mode(), MODE_STATIC);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut light = Rgblight::new(RgblightConfig::default());
        assert_eq!(light.take_dirty(), None);
        light.set_rgb(Rgb::new(1, 1, 1));
        assert_eq!(light.take_dirty(), None);
        light.increase_hue();
        assert_eq!(light.take_dirty().map(|c| c.hue), Some(HUE_STEP));
        assert_eq!(light.take_dirty(), None);
    }

    #[test]
    fn test_config_bytes() {
        let config = RgblightConfig {
            enabled: false,
            mode: MODE_RAINBOW,
            hue: 10,
            sat: 20,
            val: 30,
        };
        assert_eq!(RgblightConfig::from_bytes(config.to_bytes()), config);
        assert_eq!(
            RgblightConfig::from_bytes([0xFF; RgblightConfig::SIZE]),
            RgblightConfig::default()
        );
    }
}
