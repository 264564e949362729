//! The keyboard while its firmware is running: the bootloader request and the
//! raw HID telemetry channel.

use std::time::Duration;

use anyhow::{Context, Result};
use plnu_keymap::config::{
    KEYBOARD_PID, KEYBOARD_VID, RAW_EPSIZE, RAW_INTERFACE, RAW_IN_EP, RAW_OUT_EP,
};
use rusb::{Device, DeviceHandle, GlobalContext};

const USB_TIMEOUT: Duration = Duration::from_secs(1);

fn find_keyboard() -> Result<Option<Device<GlobalContext>>> {
    let devices = rusb::devices().context("failed to enumerate USB devices")?;
    for device in devices.iter() {
        let desc = device
            .device_descriptor()
            .context("failed to read device descriptor")?;
        if desc.vendor_id() == KEYBOARD_VID && desc.product_id() == KEYBOARD_PID {
            return Ok(Some(device));
        }
    }
    Ok(None)
}

fn open(device: &Device<GlobalContext>) -> Result<DeviceHandle<GlobalContext>> {
    device
        .open()
        .context("failed to open keyboard (may need root/sudo or udev rules)")
}

/// Ask the running firmware to jump into HalfKay.
/// Returns `false` when no keyboard is connected.
pub fn reboot_to_bootloader() -> Result<bool> {
    let Some(device) = find_keyboard()? else {
        return Ok(false);
    };
    let handle = open(&device)?;

    // The keyboard drops off the bus before it can complete the status stage
    if let Err(err) = handle.write_control(0x40, 0xFF, 0, 0, &[], USB_TIMEOUT) {
        log::debug!("bootloader request ended with {err}");
    }
    Ok(true)
}

/// Claimed raw HID interface of the running keyboard.
pub struct RawHid {
    handle: DeviceHandle<GlobalContext>,
    reattach: bool,
}

impl RawHid {
    pub fn open() -> Result<Self> {
        let device = find_keyboard()?.context("keyboard not found, is the firmware running?")?;
        let handle = open(&device)?;

        // Not supported outside Linux; nothing to detach there
        let reattach = handle.kernel_driver_active(RAW_INTERFACE).unwrap_or(false);
        if reattach {
            handle
                .detach_kernel_driver(RAW_INTERFACE)
                .context("failed to detach the kernel HID driver")?;
        }
        handle
            .claim_interface(RAW_INTERFACE)
            .context("failed to claim the raw HID interface")?;
        log::debug!("claimed interface {RAW_INTERFACE}, reattach={reattach}");

        Ok(Self { handle, reattach })
    }

    /// Next packet as received, or `None` when nothing arrived within `timeout`.
    pub fn read(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; RAW_EPSIZE];
        match self.handle.read_interrupt(RAW_IN_EP, &mut buf, timeout) {
            Ok(len) => Ok(Some(buf[..len].to_vec())),
            Err(rusb::Error::Timeout) => Ok(None),
            Err(err) => Err(err).context("raw HID read failed"),
        }
    }

    pub fn write(&self, packet: &[u8; RAW_EPSIZE]) -> Result<()> {
        self.handle
            .write_interrupt(RAW_OUT_EP, packet, USB_TIMEOUT)
            .context("raw HID write failed")?;
        Ok(())
    }
}

impl Drop for RawHid {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(RAW_INTERFACE);
        if self.reattach {
            let _ = self.handle.attach_kernel_driver(RAW_INTERFACE);
        }
    }
}
