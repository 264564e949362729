//! Persistent configuration in the ATmega32U4 EEPROM.
//!
//! Layout: a two-byte magic at address 0, then the underglow config.
//! A missing magic means the store was never written or was wiped.

use avr_device::atmega32u4::EEPROM;
use plnu_keymap::rgblight::RgblightConfig;

const MAGIC: u16 = 0xED05;
const MAGIC_ADDR: u16 = 0;
const RGBLIGHT_ADDR: u16 = 2;

/// Stored underglow config, resetting the store first if it is not valid.
pub fn load_rgblight(ee: &EEPROM) -> RgblightConfig {
    let magic = u16::from_le_bytes([read_byte(ee, MAGIC_ADDR), read_byte(ee, MAGIC_ADDR + 1)]);
    if magic != MAGIC {
        return reset(ee);
    }

    let mut bytes = [0u8; RgblightConfig::SIZE];
    for (addr, byte) in (RGBLIGHT_ADDR..).zip(bytes.iter_mut()) {
        *byte = read_byte(ee, addr);
    }
    RgblightConfig::from_bytes(bytes)
}

pub fn save_rgblight(ee: &EEPROM, config: RgblightConfig) {
    for (addr, byte) in (RGBLIGHT_ADDR..).zip(config.to_bytes()) {
        update_byte(ee, addr, byte);
    }
}

/// Write the defaults and the magic, returning the defaults.
pub fn reset(ee: &EEPROM) -> RgblightConfig {
    let config = RgblightConfig::default_config();
    save_rgblight(ee, config);
    for (addr, byte) in (MAGIC_ADDR..).zip(MAGIC.to_le_bytes()) {
        update_byte(ee, addr, byte);
    }
    config
}

fn read_byte(ee: &EEPROM, addr: u16) -> u8 {
    while ee.eecr.read().eepe().bit_is_set() {}
    ee.eear.write(|w| unsafe { w.bits(addr) });
    ee.eecr.write(|w| w.eere().set_bit());
    ee.eedr.read().bits()
}

/// Skip the write when the cell already holds `byte`; cells wear out.
fn update_byte(ee: &EEPROM, addr: u16, byte: u8) {
    if read_byte(ee, addr) == byte {
        return;
    }
    avr_device::interrupt::free(|_| {
        ee.eear.write(|w| unsafe { w.bits(addr) });
        ee.eedr.write(|w| unsafe { w.bits(byte) });
        // EEPE must follow EEMPE within four cycles.
        ee.eecr.write(|w| w.eempe().set_bit().eepe().clear_bit());
        ee.eecr.write(|w| w.eempe().set_bit().eepe().set_bit());
    });
}
