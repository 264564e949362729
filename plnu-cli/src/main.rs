mod device;
mod halfkay;
mod hex;
mod layout;
mod monitor;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long the keyboard may take to re-enumerate as HalfKay.
const BOOTLOADER_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "plnu-cli")]
#[command(about = "Flash, monitor and render the ErgoDox EZ plnu layout")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Flash a .hex firmware file to Teensy via HalfKay bootloader
    Flash {
        /// Path to the Intel HEX firmware file
        firmware: PathBuf,
    },
    /// Detect if a Teensy is connected in bootloader mode
    Detect,
    /// Print the raw HID telemetry of the running keyboard
    Monitor {
        /// Ask the keyboard for its current state first
        #[arg(long)]
        ping: bool,
        /// Stop after this many packets
        #[arg(long)]
        count: Option<usize>,
    },
    /// Render all layers as an HTML page
    Layout {
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Flash { firmware } => flash(&firmware)?,
        Command::Detect => {
            if halfkay::detect()? {
                println!("Teensy bootloader detected (HalfKay mode).");
            } else {
                println!("Teensy bootloader not detected.");
                println!("Press the reset button on the Teensy to enter bootloader mode.");
            }
        }
        Command::Monitor { ping, count } => monitor::run(ping, count)?,
        Command::Layout { output } => {
            let html = layout::generate_html();
            match output {
                Some(path) => {
                    fs::write(&path, html)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Layout written to {}", path.display());
                }
                None => print!("{html}"),
            }
        }
    }

    Ok(())
}

fn flash(firmware: &Path) -> Result<()> {
    let contents = fs::read_to_string(firmware)
        .with_context(|| format!("reading {}", firmware.display()))?;

    let segments = hex::parse_hex(&contents).context("parsing Intel HEX file")?;
    let (base_address, data) =
        hex::flatten_segments(&segments).context("flattening HEX segments")?;

    println!(
        "Firmware: {} bytes at base address 0x{:04X}",
        data.len(),
        base_address
    );

    if !halfkay::detect()? {
        if !device::reboot_to_bootloader()? {
            bail!("neither the keyboard nor the Teensy bootloader was found; press the reset button on the Teensy and try again");
        }
        println!("Rebooting keyboard into bootloader...");
        if !halfkay::wait_for_bootloader(BOOTLOADER_WAIT)? {
            bail!("Teensy bootloader not detected after reboot; press the reset button on the Teensy and try again");
        }
    }

    halfkay::flash(base_address, &data)
}
