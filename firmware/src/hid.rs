//! USB HID device for the ATmega32U4.
//!
//! Three interfaces: a boot keyboard (EP1 IN), the raw HID telemetry channel
//! (EP2 IN, EP3 OUT) and a shared mouse/consumer interface (EP4 IN, report
//! IDs 1 and 2). Uses direct register access via avr-device and polls the
//! controller flags from the main loop.

use avr_device::atmega32u4::Peripherals;
use plnu_keymap::config::{self, KEYBOARD_PID, KEYBOARD_VID, RAW_EPSIZE, RAW_INTERFACE};
use plnu_keymap::hid::{consumer_bytes, HidReport, KeyboardReport, RAW_REPORT_DESCRIPTOR};

const EP0_SIZE: u8 = 64;
const KEYBOARD_EP: u8 = 1;
const RAW_IN_EP: u8 = config::RAW_IN_EP & 0x0F;
const RAW_OUT_EP: u8 = config::RAW_OUT_EP & 0x0F;
const MOUSE_EP: u8 = 4;

const KEYBOARD_INTERFACE: u8 = 0;
const MOUSE_INTERFACE: u8 = 2;

const KEYBOARD_REPORT_LEN: usize = 64;
const RAW_REPORT_LEN: usize = RAW_REPORT_DESCRIPTOR.len();
const MOUSE_REPORT_LEN: usize = 77;

/// Boot keyboard report descriptor with the LED output report.
static KEYBOARD_REPORT_DESCRIPTOR: [u8; KEYBOARD_REPORT_LEN] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    // Modifier keys (8 bits)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - LCtrl
    0x29, 0xE7, //   Usage Maximum (231) - RGui
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    // LEDs (5 bits)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    // LED padding (3 bits)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    // Keycodes (6 bytes)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// Mouse (report ID 1) and consumer control (report ID 2).
static MOUSE_REPORT_DESCRIPTOR: [u8; MOUSE_REPORT_LEN] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Buttons)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x05, //     Usage Maximum (5)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x05, //     Report Count (5)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x03, //     Report Size (3)
    0x81, 0x01, //     Input (Constant)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    0x15, 0x01, //   Logical Minimum (1)
    0x26, 0x9C, 0x02, // Logical Maximum (0x29C)
    0x19, 0x01, //   Usage Minimum (1)
    0x2A, 0x9C, 0x02, // Usage Maximum (0x29C)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x00, //   Input (Data, Array, Absolute)
    0xC0, // End Collection
];

// USB descriptors
static DEVICE_DESCRIPTOR: [u8; 18] = [
    18,   // bLength
    1,    // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.0)
    0,    // bDeviceClass (defined at interface level)
    0,    // bDeviceSubClass
    0,    // bDeviceProtocol
    EP0_SIZE, // bMaxPacketSize0
    KEYBOARD_VID as u8, (KEYBOARD_VID >> 8) as u8, // idVendor
    KEYBOARD_PID as u8, (KEYBOARD_PID >> 8) as u8, // idProduct
    0x01, 0x00, // bcdDevice (1.0)
    1,    // iManufacturer
    2,    // iProduct
    0,    // iSerialNumber
    1,    // bNumConfigurations
];

const CONFIG_LENGTH: usize = 9 + 25 + 32 + 25;

static CONFIG_DESCRIPTOR: [u8; CONFIG_LENGTH] = [
    // Configuration descriptor
    9,    // bLength
    2,    // bDescriptorType (Configuration)
    CONFIG_LENGTH as u8, 0, // wTotalLength
    3,    // bNumInterfaces
    1,    // bConfigurationValue
    0,    // iConfiguration
    0x80, // bmAttributes (bus powered)
    250,  // bMaxPower (500mA, the underglow draws)
    // Interface 0: boot keyboard
    9, 4, KEYBOARD_INTERFACE, 0, 1, 3, 1, 1, 0,
    9, 0x21, 0x11, 0x01, 0, 1, 0x22, KEYBOARD_REPORT_LEN as u8, 0,
    7, 5, 0x80 | KEYBOARD_EP, 0x03, 8, 0, 10,
    // Interface 1: raw HID
    9, 4, RAW_INTERFACE, 0, 2, 3, 0, 0, 0,
    9, 0x21, 0x11, 0x01, 0, 1, 0x22, RAW_REPORT_LEN as u8, 0,
    7, 5, 0x80 | RAW_IN_EP, 0x03, RAW_EPSIZE as u8, 0, 1,
    7, 5, RAW_OUT_EP, 0x03, RAW_EPSIZE as u8, 0, 1,
    // Interface 2: mouse and consumer control
    9, 4, MOUSE_INTERFACE, 0, 1, 3, 0, 0, 0,
    9, 0x21, 0x11, 0x01, 0, 1, 0x22, MOUSE_REPORT_LEN as u8, 0,
    7, 5, 0x80 | MOUSE_EP, 0x03, 8, 0, 10,
];

/// String descriptor 0 (language ID)
static STRING_DESC_0: [u8; 4] = [4, 3, 0x09, 0x04]; // English (US)

/// String descriptor 1 (manufacturer): "ErgoDox"
static STRING_DESC_1: [u8; 16] = [
    16, 3, // bLength, bDescriptorType
    b'E', 0, b'r', 0, b'g', 0, b'o', 0, b'D', 0, b'o', 0, b'x', 0,
];

/// String descriptor 2 (product): "ErgoDox EZ"
static STRING_DESC_2: [u8; 22] = [
    22, 3, // bLength, bDescriptorType
    b'E', 0, b'r', 0, b'g', 0, b'o', 0, b'D', 0, b'o', 0, b'x', 0, b' ', 0, b'E', 0, b'Z', 0,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UsbError {
    NotConfigured,
    /// The endpoint did not free its bank in time; the report is dropped.
    Timeout,
}

/// USB device state.
pub struct UsbDevice {
    configured: bool,
    led_report: Option<u8>,
}

impl UsbDevice {
    pub const fn new() -> Self {
        Self {
            configured: false,
            led_report: None,
        }
    }

    /// Initialize the ATmega32U4 USB controller.
    pub fn init(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        // Enable USB pad regulator
        usb.uhwcon.write(|w| w.uvrege().set_bit());

        // Enable USB controller and VBUS pad
        usb.usbcon
            .write(|w| w.usbe().set_bit().otgpade().set_bit());

        // Configure PLL for 16MHz crystal -> 96MHz PLL -> 48MHz USB clock
        dp.PLL.pllcsr.write(|w| w.pindiv().set_bit().plle().set_bit());
        while dp.PLL.pllcsr.read().plock().bit_is_clear() {}

        // Enable USB clock
        usb.usbcon.modify(|_, w| w.frzclk().clear_bit());

        // Attach to bus (clear DETACH)
        usb.udcon.modify(|_, w| w.detach().clear_bit());

        // Controller flags are polled; no USB interrupt is enabled.
        self.configured = false;
    }

    /// Handle bus resets and control requests. Call this from the main loop.
    pub fn poll(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        if usb.udint.read().eorsti().bit_is_set() {
            usb.udint.modify(|_, w| w.eorsti().clear_bit());
            self.configure_endpoint(dp, 0, 0b00, false, 0b011);
            self.configured = false;
        }

        self.select_endpoint(dp, 0);
        if usb.ueintx.read().rxstpi().bit_is_set() {
            self.handle_setup(dp);
        }
    }

    /// Keyboard LED state received since the last call.
    pub fn take_led_report(&mut self) -> Option<u8> {
        self.led_report.take()
    }

    pub fn send(&mut self, dp: &Peripherals, report: &HidReport) -> Result<(), UsbError> {
        match report {
            HidReport::Keyboard(r) => self.send_keyboard(dp, r),
            HidReport::Mouse(r) => self.write_endpoint(dp, MOUSE_EP, &r.to_bytes()),
            HidReport::Consumer(usage) => self.write_endpoint(dp, MOUSE_EP, &consumer_bytes(*usage)),
        }
    }

    pub fn send_keyboard(&mut self, dp: &Peripherals, report: &KeyboardReport) -> Result<(), UsbError> {
        self.write_endpoint(dp, KEYBOARD_EP, &report.to_bytes())
    }

    pub fn send_raw(&mut self, dp: &Peripherals, packet: &[u8; RAW_EPSIZE]) -> Result<(), UsbError> {
        self.write_endpoint(dp, RAW_IN_EP, packet)
    }

    /// Copy a pending raw HID packet into `buf`. Returns false when none arrived.
    pub fn read_raw(&mut self, dp: &Peripherals, buf: &mut [u8; RAW_EPSIZE]) -> bool {
        if !self.configured {
            return false;
        }
        let usb = &dp.USB_DEVICE;
        self.select_endpoint(dp, RAW_OUT_EP);
        if usb.ueintx.read().rxouti().bit_is_clear() {
            return false;
        }
        usb.ueintx.modify(|_, w| w.rxouti().clear_bit());

        let count = core::cmp::min(usb.uebclx.read().bits() as usize, RAW_EPSIZE);
        buf.fill(0);
        for byte in buf.iter_mut().take(count) {
            *byte = usb.uedatx.read().bits();
        }
        usb.ueintx.modify(|_, w| w.fifocon().clear_bit());
        true
    }

    fn write_endpoint(&mut self, dp: &Peripherals, ep: u8, data: &[u8]) -> Result<(), UsbError> {
        if !self.configured {
            return Err(UsbError::NotConfigured);
        }

        let usb = &dp.USB_DEVICE;
        self.select_endpoint(dp, ep);

        // Wait for endpoint ready (RWAL set means we can write)
        let mut timeout: u16 = 0xFFFF;
        while usb.ueintx.read().rwal().bit_is_clear() {
            timeout = timeout.wrapping_sub(1);
            if timeout == 0 {
                return Err(UsbError::Timeout);
            }
        }

        for &byte in data {
            usb.uedatx.write(|w| w.bits(byte));
        }

        // Clear FIFOCON and TXINI to send
        usb.ueintx
            .modify(|_, w| w.fifocon().clear_bit().txini().clear_bit());
        Ok(())
    }

    /// `eptype`: 0b00 control, 0b11 interrupt. `size`: 0b000 = 8 bytes,
    /// doubling per step.
    fn configure_endpoint(&self, dp: &Peripherals, ep: u8, eptype: u8, dir_in: bool, size: u8) {
        let usb = &dp.USB_DEVICE;

        self.select_endpoint(dp, ep);
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x
            .write(|w| w.eptype().bits(eptype).epdir().bit(dir_in));
        usb.uecfg1x.write(|w| w.epsize().bits(size).alloc().set_bit());
    }

    fn configure_interfaces(&self, dp: &Peripherals) {
        self.configure_endpoint(dp, KEYBOARD_EP, 0b11, true, 0b000);
        self.configure_endpoint(dp, RAW_IN_EP, 0b11, true, 0b010);
        self.configure_endpoint(dp, RAW_OUT_EP, 0b11, false, 0b010);
        self.configure_endpoint(dp, MOUSE_EP, 0b11, true, 0b000);
    }

    fn select_endpoint(&self, dp: &Peripherals, ep: u8) {
        dp.USB_DEVICE
            .uenum
            .write(|w| w.bits(ep & 0x07));
    }

    fn handle_setup(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        // Read 8-byte SETUP packet
        let bm_request_type = usb.uedatx.read().bits();
        let b_request = usb.uedatx.read().bits();
        let w_value_l = usb.uedatx.read().bits();
        let w_value_h = usb.uedatx.read().bits();
        let w_index_l = usb.uedatx.read().bits();
        let _w_index_h = usb.uedatx.read().bits();
        let w_length_l = usb.uedatx.read().bits();
        let w_length_h = usb.uedatx.read().bits();

        // Acknowledge SETUP
        usb.ueintx.modify(|_, w| w.rxstpi().clear_bit());

        let w_length = (w_length_h as u16) << 8 | w_length_l as u16;

        match (bm_request_type, b_request) {
            // GET_DESCRIPTOR
            (0x80, 0x06) => match (w_value_h, w_value_l) {
                (1, _) => self.send_descriptor(dp, &DEVICE_DESCRIPTOR, w_length),
                (2, _) => self.send_descriptor(dp, &CONFIG_DESCRIPTOR, w_length),
                (3, 0) => self.send_descriptor(dp, &STRING_DESC_0, w_length),
                (3, 1) => self.send_descriptor(dp, &STRING_DESC_1, w_length),
                (3, 2) => self.send_descriptor(dp, &STRING_DESC_2, w_length),
                _ => self.stall(dp),
            },

            // SET_ADDRESS
            (0x00, 0x05) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.udaddr
                    .write(|w| w.uadd().bits(w_value_l & 0x7F).adden().set_bit());
            }

            // SET_CONFIGURATION
            (0x00, 0x09) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                self.configure_interfaces(dp);
                self.configured = true;
            }

            // GET_CONFIGURATION
            (0x80, 0x08) => {
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.uedatx
                    .write(|w| w.bits(if self.configured { 1 } else { 0 }));
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // HID GET_DESCRIPTOR (interface-level)
            (0x81, 0x06) if w_value_h == 0x22 => match w_index_l {
                KEYBOARD_INTERFACE => self.send_descriptor(dp, &KEYBOARD_REPORT_DESCRIPTOR, w_length),
                RAW_INTERFACE => self.send_descriptor(dp, &RAW_REPORT_DESCRIPTOR, w_length),
                MOUSE_INTERFACE => self.send_descriptor(dp, &MOUSE_REPORT_DESCRIPTOR, w_length),
                _ => self.stall(dp),
            },

            // HID SET_REPORT: the keyboard LED byte arrives in the data stage
            (0x21, 0x09) => {
                while usb.ueintx.read().rxouti().bit_is_clear() {}
                let data = usb.uedatx.read().bits();
                usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
                if w_index_l == KEYBOARD_INTERFACE {
                    self.led_report = Some(data);
                }
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // HID SET_IDLE, SET_PROTOCOL
            (0x21, 0x0A) | (0x21, 0x0B) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // Vendor request: jump to bootloader
            (0x40, 0xFF) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                jump_to_bootloader(dp);
            }

            _ => {
                self.stall(dp);
            }
        }
    }

    fn send_descriptor(&self, dp: &Peripherals, desc: &[u8], max_length: u16) {
        let usb = &dp.USB_DEVICE;
        let len = core::cmp::min(desc.len(), max_length as usize);
        let mut sent = 0;

        while sent < len {
            while usb.ueintx.read().txini().bit_is_clear() {}

            let chunk_end = core::cmp::min(sent + EP0_SIZE as usize, len);
            for &byte in &desc[sent..chunk_end] {
                usb.uedatx.write(|w| w.bits(byte));
            }

            usb.ueintx.modify(|_, w| w.txini().clear_bit());
            sent = chunk_end;
        }

        // Wait for status stage (host sends ZLP)
        while usb.ueintx.read().rxouti().bit_is_clear() {}
        usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
    }

    fn stall(&self, dp: &Peripherals) {
        dp.USB_DEVICE
            .ueconx
            .modify(|_, w| w.stallrq().set_bit());
    }
}

/// Disable all peripherals and jump to the HalfKay bootloader at 0x7E00.
fn jump_to_bootloader(dp: &Peripherals) -> ! {
    avr_device::interrupt::disable();

    // Disconnect USB
    dp.USB_DEVICE.udcon.write(|w| w.detach().set_bit());
    dp.USB_DEVICE.usbcon.write(|w| w.frzclk().set_bit());

    // Short delay for host to notice disconnect
    for _ in 0..20000u16 {
        unsafe { core::arch::asm!("nop") };
    }

    // Disable peripherals
    dp.EXINT.eimsk.write(|w| w.bits(0));
    dp.SPI.spcr.write(|w| unsafe { w.bits(0) });
    dp.AC.acsr.write(|w| unsafe { w.bits(0) });
    dp.EEPROM.eecr.write(|w| unsafe { w.bits(0) });
    dp.ADC.adcsra.write(|w| unsafe { w.bits(0) });
    dp.TC0.timsk0.write(|w| unsafe { w.bits(0) });
    dp.TC1.timsk1.write(|w| unsafe { w.bits(0) });
    dp.TC3.timsk3.write(|w| unsafe { w.bits(0) });
    dp.TC4.timsk4.write(|w| unsafe { w.bits(0) });
    dp.USART1.ucsr1b.write(|w| unsafe { w.bits(0) });
    dp.TWI.twcr.write(|w| unsafe { w.bits(0) });

    // Reset all port directions and values
    dp.PORTB.ddrb.write(|w| unsafe { w.bits(0) });
    dp.PORTB.portb.write(|w| unsafe { w.bits(0) });
    dp.PORTC.ddrc.write(|w| unsafe { w.bits(0) });
    dp.PORTC.portc.write(|w| unsafe { w.bits(0) });
    dp.PORTD.ddrd.write(|w| unsafe { w.bits(0) });
    dp.PORTD.portd.write(|w| unsafe { w.bits(0) });
    dp.PORTE.ddre.write(|w| unsafe { w.bits(0) });
    dp.PORTE.porte.write(|w| unsafe { w.bits(0) });
    dp.PORTF.ddrf.write(|w| unsafe { w.bits(0) });
    dp.PORTF.portf.write(|w| unsafe { w.bits(0) });

    unsafe { core::arch::asm!("jmp 0x7E00", options(noreturn)) }
}
