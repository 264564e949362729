//! MCP23018 I2C driver for the ErgoDox EZ left half.
//!
//! The left half is a bare MCP23018 I/O expander on the TRRS cable. GPIOA
//! drives the seven column lines low one at a time and GPIOB reads the six
//! row lines back through the expander's pull-ups. The cable can be unplugged at any
//! time, so every transfer reports a [`TwiError`] instead of hanging.

use avr_device::atmega32u4::TWI;

/// MCP23018 I2C address (all address pins grounded).
const MCP23018_ADDR: u8 = 0x20;

// MCP23018 register addresses (IOCON.BANK = 0, default)
const IODIRA: u8 = 0x00; // I/O direction register A (rows)
const IODIRB: u8 = 0x01; // I/O direction register B (columns)
const GPPUB: u8 = 0x0D; // Pull-up resistor register B
const GPIOA: u8 = 0x12; // Port A register
const GPIOB: u8 = 0x13; // Port B register

/// TWI (I2C) clock prescaler and bit rate for ~100kHz at 16MHz CPU.
/// SCL freq = CPU_FREQ / (16 + 2 * TWBR * prescaler)
/// 100kHz = 16MHz / (16 + 2 * 72 * 1) => TWBR = 72
const TWBR_VALUE: u8 = 72;

/// TWI status codes
const TW_START: u8 = 0x08;
const TW_REP_START: u8 = 0x10;
const TW_MT_SLA_ACK: u8 = 0x18;
const TW_MT_DATA_ACK: u8 = 0x28;
const TW_MR_SLA_ACK: u8 = 0x40;
const TW_MR_DATA_NACK: u8 = 0x58;

/// Row bits reported when the expander is absent: nothing pressed.
const ALL_RELEASED: u8 = 0x3F;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TwiError {
    /// START or repeated START was not acknowledged by the bus.
    Start(u8),
    /// Address or data byte was not acknowledged; holds the TWI status.
    Nack(u8),
    /// TWINT never rose, the bus is stuck.
    Timeout,
}

pub struct Mcp23018 {
    initialized: bool,
}

impl Mcp23018 {
    pub const fn new() -> Self {
        Self { initialized: false }
    }

    /// Initialize the TWI hardware and configure the MCP23018.
    pub fn init(&mut self, twi: &TWI) -> Result<(), TwiError> {
        // Set TWI bit rate
        twi.twbr.write(|w| unsafe { w.bits(TWBR_VALUE) });
        // Prescaler = 1 (TWPS = 0)
        twi.twsr.write(|w| w.twps().prescaler_1());
        // Enable TWI
        twi.twcr.write(|w| w.twen().set_bit());

        self.configure(twi)?;
        self.initialized = true;
        Ok(())
    }

    /// Configure MCP23018 I/O direction and pull-ups.
    fn configure(&self, twi: &TWI) -> Result<(), TwiError> {
        // IODIRA = 0x00: all pins output (columns)
        self.write_register(twi, IODIRA, 0x00)?;
        // IODIRB = 0x3F: pins 0-5 input (rows)
        self.write_register(twi, IODIRB, 0x3F)?;
        // GPPUB = 0x3F: enable pull-ups on row inputs
        self.write_register(twi, GPPUB, 0x3F)?;
        // Drive all columns high initially (inactive)
        self.write_register(twi, GPIOA, 0xFF)?;
        Ok(())
    }

    /// Reconfigure the expander after the left half was plugged back in.
    pub fn try_reinit(&mut self, twi: &TWI) {
        if !self.initialized {
            self.initialized = self.configure(twi).is_ok();
        }
    }

    /// Read the left half rows while column `line` is driven low.
    /// Returns 6 active-low bits, all high while the half is missing.
    /// A failed transfer marks the expander as gone until the next reinit.
    pub fn read_row(&mut self, twi: &TWI, line: u8) -> u8 {
        if !self.initialized {
            return ALL_RELEASED;
        }

        match self.select_and_read(twi, line) {
            Ok(val) => val & ALL_RELEASED,
            Err(_) => {
                self.initialized = false;
                ALL_RELEASED
            }
        }
    }

    fn select_and_read(&self, twi: &TWI, line: u8) -> Result<u8, TwiError> {
        let drive = !(1u8 << line) & 0x7F;
        self.write_register(twi, GPIOA, drive)?;
        tiny_delay();
        self.read_register(twi, GPIOB)
    }

    fn write_register(&self, twi: &TWI, reg: u8, value: u8) -> Result<(), TwiError> {
        self.i2c_start(twi)?;
        self.i2c_write(twi, (MCP23018_ADDR << 1) | 0)?; // Write mode
        self.i2c_write(twi, reg)?;
        self.i2c_write(twi, value)?;
        self.i2c_stop(twi);
        Ok(())
    }

    fn read_register(&self, twi: &TWI, reg: u8) -> Result<u8, TwiError> {
        // Write register address
        self.i2c_start(twi)?;
        self.i2c_write(twi, (MCP23018_ADDR << 1) | 0)?;
        self.i2c_write(twi, reg)?;

        // Repeated start for read
        self.i2c_start(twi)?;
        self.i2c_write(twi, (MCP23018_ADDR << 1) | 1)?; // Read mode
        let data = self.i2c_read_nack(twi)?;
        self.i2c_stop(twi);
        Ok(data)
    }

    fn i2c_start(&self, twi: &TWI) -> Result<(), TwiError> {
        twi.twcr
            .write(|w| w.twint().set_bit().twsta().set_bit().twen().set_bit());
        let status = self.wait_twint(twi)?;
        match status {
            TW_START | TW_REP_START => Ok(()),
            _ => Err(TwiError::Start(status)),
        }
    }

    fn i2c_write(&self, twi: &TWI, data: u8) -> Result<(), TwiError> {
        twi.twdr.write(|w| unsafe { w.bits(data) });
        twi.twcr.write(|w| w.twint().set_bit().twen().set_bit());
        let status = self.wait_twint(twi)?;
        match status {
            TW_MT_SLA_ACK | TW_MT_DATA_ACK | TW_MR_SLA_ACK => Ok(()),
            _ => {
                self.i2c_stop(twi);
                Err(TwiError::Nack(status))
            }
        }
    }

    fn i2c_read_nack(&self, twi: &TWI) -> Result<u8, TwiError> {
        // Read one byte with NACK (last byte)
        twi.twcr.write(|w| w.twint().set_bit().twen().set_bit());
        let status = self.wait_twint(twi)?;
        if status != TW_MR_DATA_NACK {
            self.i2c_stop(twi);
            return Err(TwiError::Nack(status));
        }
        Ok(twi.twdr.read().bits())
    }

    fn i2c_stop(&self, twi: &TWI) {
        twi.twcr
            .write(|w| w.twint().set_bit().twsto().set_bit().twen().set_bit());
    }

    /// Wait for the current bus operation and return the TWI status.
    fn wait_twint(&self, twi: &TWI) -> Result<u8, TwiError> {
        let mut timeout: u16 = 0xFFFF;
        while twi.twcr.read().twint().bit_is_clear() {
            timeout = timeout.wrapping_sub(1);
            if timeout == 0 {
                self.i2c_stop(twi);
                return Err(TwiError::Timeout);
            }
        }
        // Status lives in the upper five bits
        Ok(twi.twsr.read().bits() & 0xF8)
    }
}

/// Very short delay (~10us) for I/O settling.
#[inline(always)]
fn tiny_delay() {
    for _ in 0..40u8 {
        unsafe { core::arch::asm!("nop") };
    }
}
