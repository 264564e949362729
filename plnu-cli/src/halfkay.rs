//! Flashing through the Teensy 2.0 HalfKay bootloader.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusb::{Device, DeviceHandle, GlobalContext};
use std::thread;
use std::time::{Duration, Instant};

/// Teensy 2.0 HalfKay bootloader USB identifiers.
const HALFKAY_VID: u16 = 0x16C0;
const HALFKAY_PID: u16 = 0x0478;

/// ATmega32U4 flash page size in bytes.
const PAGE_SIZE: usize = 128;

/// Application flash below the 512-byte HalfKay bootloader at 0x7E00.
const APP_FLASH_SIZE: usize = 0x7E00;

/// USB control transfer timeout.
const USB_TIMEOUT: Duration = Duration::from_secs(2);

/// Delay after each page write to allow flash programming.
const PAGE_WRITE_DELAY: Duration = Duration::from_millis(5);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn find_bootloader() -> Result<Option<Device<GlobalContext>>> {
    let devices = rusb::devices().context("failed to enumerate USB devices")?;
    for device in devices.iter() {
        let desc = device
            .device_descriptor()
            .context("failed to read device descriptor")?;
        if desc.vendor_id() == HALFKAY_VID && desc.product_id() == HALFKAY_PID {
            return Ok(Some(device));
        }
    }
    Ok(None)
}

/// Detect whether a Teensy in HalfKay bootloader mode is connected.
pub fn detect() -> Result<bool> {
    Ok(find_bootloader()?.is_some())
}

/// Poll until the bootloader enumerates or `timeout` passes.
pub fn wait_for_bootloader(timeout: Duration) -> Result<bool> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if detect()? {
            return Ok(true);
        }
        thread::sleep(POLL_INTERVAL);
    }
    Ok(false)
}

fn open_device() -> Result<DeviceHandle<GlobalContext>> {
    let Some(device) = find_bootloader()? else {
        bail!("Teensy bootloader not found. Press the reset button on the Teensy and try again.");
    };
    device
        .open()
        .context("failed to open Teensy bootloader (may need root/sudo or udev rules)")
}

/// Flash firmware data to the Teensy via HalfKay protocol.
///
/// `base_address` is the starting address of the firmware image.
/// `data` is the firmware binary, which will be split into 128-byte pages.
pub fn flash(base_address: u32, data: &[u8]) -> Result<()> {
    let end_address = base_address as usize + data.len();
    if end_address > APP_FLASH_SIZE {
        bail!(
            "firmware too large: {} bytes at offset 0x{:04X} overlaps the bootloader at 0x{:04X}",
            data.len(),
            base_address,
            APP_FLASH_SIZE
        );
    }
    if base_address as usize % PAGE_SIZE != 0 {
        bail!("firmware base 0x{:04X} is not page aligned", base_address);
    }

    let handle = open_device()?;

    let total_pages = data.len().div_ceil(PAGE_SIZE);
    let pb = ProgressBar::new(total_pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} pages")
            .context("invalid progress template")?
            .progress_chars("=> "),
    );
    pb.set_message("Flashing");

    for (page_idx, chunk) in data.chunks(PAGE_SIZE).enumerate() {
        let address = base_address as usize + page_idx * PAGE_SIZE;

        // Blank pages are already erased
        if chunk.iter().all(|&b| b == 0xFF) {
            log::debug!("skipping blank page 0x{address:04X}");
            pb.inc(1);
            continue;
        }

        let page = page_buffer(address as u16, chunk);
        write_page(&handle, &page)
            .with_context(|| format!("failed to write page at address 0x{:04X}", address))?;

        thread::sleep(PAGE_WRITE_DELAY);
        pb.inc(1);
    }

    pb.finish_with_message("Flashed");

    reboot(&handle);
    println!("Teensy rebooted. Firmware should be running.");

    Ok(())
}

/// Page command: little-endian address, then the page padded with 0xFF.
fn page_buffer(address: u16, chunk: &[u8]) -> [u8; 2 + PAGE_SIZE] {
    let mut buf = [0xFFu8; 2 + PAGE_SIZE];
    buf[..2].copy_from_slice(&address.to_le_bytes());
    buf[2..2 + chunk.len()].copy_from_slice(chunk);
    buf
}

/// Write a single page via HalfKay USB control transfer.
fn write_page(handle: &DeviceHandle<GlobalContext>, buf: &[u8]) -> Result<()> {
    // HID SET_REPORT, output report 0, interface 0
    handle
        .write_control(0x21, 0x09, 0x0200, 0, buf, USB_TIMEOUT)
        .context("USB control transfer failed")?;
    Ok(())
}

/// Writing to address 0xFFFF makes HalfKay start the application.
fn reboot(handle: &DeviceHandle<GlobalContext>) {
    let buf = page_buffer(0xFFFF, &[]);
    // The device disconnects immediately
    if let Err(err) = handle.write_control(0x21, 0x09, 0x0200, 0, &buf, USB_TIMEOUT) {
        log::debug!("reboot request ended with {err}");
    }
}
