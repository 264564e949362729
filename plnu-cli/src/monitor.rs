//! Print the keyboard's raw HID telemetry as it arrives.

use std::time::Duration;

use anyhow::Result;
use plnu_keymap::config::RAW_EPSIZE;
use plnu_keymap::layers::{find_action, layer_name};
use plnu_keymap::modtap::ModTapKey;
use plnu_keymap::{Event, LedState, Packet};

use crate::device::RawHid;

const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Read packets until `count` were decoded, or forever without a count.
pub fn run(ping: bool, count: Option<usize>) -> Result<()> {
    let raw = RawHid::open()?;
    println!("Listening for telemetry, Ctrl-C to stop.");

    if ping {
        // Any packet makes the keyboard answer with its state
        raw.write(&[0u8; RAW_EPSIZE])?;
    }

    let mut seen = 0;
    while count.map_or(true, |n| seen < n) {
        let Some(data) = raw.read(POLL_TIMEOUT)? else {
            continue;
        };
        if let Some(line) = decode_line(&data) {
            println!("{line}");
            seen += 1;
        }
    }
    Ok(())
}

/// Describe one received packet. Undecodable packets are logged and do not
/// count towards `--count`.
fn decode_line(data: &[u8]) -> Option<String> {
    match Packet::parse(data) {
        Ok(packet) => Some(describe(&packet)),
        Err(err) => {
            log::warn!("dropping packet: {err}");
            None
        }
    }
}

/// One line per packet: layer, host LEDs, then the event if any.
pub fn describe(packet: &Packet) -> String {
    let mut line = format!(
        "layer {} ({}) leds [{}]",
        packet.layer,
        layer_name(packet.layer),
        led_names(packet.leds)
    );

    match packet.event {
        None => {}
        Some(Event::Keypress { key }) => line.push_str(&format!(" keypress {key}")),
        Some(Event::Timing(timing)) => {
            let holder = ModTapKey::ALL
                .get(timing.key as usize)
                .map_or_else(|| format!("#{}", timing.key), |key| key_name(key.keycode()));
            line.push_str(&format!(
                " {holder} held {} ms, pressed {} released {}",
                timing.elapsed,
                key_name(timing.key_down),
                key_name(timing.key_up)
            ));
        }
    }
    line
}

fn led_names(leds: LedState) -> String {
    let names: Vec<&str> = [
        (LedState::NUM_LOCK, "num"),
        (LedState::CAPS_LOCK, "caps"),
        (LedState::SCROLL_LOCK, "scroll"),
    ]
    .into_iter()
    .filter(|(bit, _)| leds.raw() & bit != 0)
    .map(|(_, name)| name)
    .collect();
    names.join(" ")
}

/// Label of the keymap action with identity `id`, `-` for unset.
fn key_name(id: u16) -> String {
    if id == 0 {
        return "-".into();
    }
    match find_action(id).map(|action| action.display_name()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("0x{id:04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plnu_keymap::keycode::Keycode;
    use plnu_keymap::layers::CTL_F;
    use plnu_keymap::{LayerState, RawReport, Timing};

    #[test]
    fn test_describe_state() {
        let report = RawReport::state(None, LayerState(0b101), LedState(LedState::CAPS_LOCK));
        let packet = Packet::parse(report.as_bytes()).unwrap();
        assert_eq!(describe(&packet), "layer 2 (Media) leds [caps]");
    }

    #[test]
    fn test_describe_timing() {
        let timing = Timing {
            key: ModTapKey::LeftCtrl as u8,
            elapsed: 180,
            key_down: Keycode::A as u16,
            key_up: 0,
        };
        let report = RawReport::timing(timing, LayerState(1), LedState(0));
        let packet = Packet::parse(report.as_bytes()).unwrap();
        let line = describe(&packet);
        assert!(line.starts_with("layer 0 (Base) leds []"));
        assert!(line.ends_with("held 180 ms, pressed A released -"), "{line}");
        assert!(line.contains(&key_name(CTL_F.id())));
    }

    #[test]
    fn test_only_decoded_packets_yield_lines() {
        let report = RawReport::state(None, LayerState(1), LedState(0));
        assert_eq!(
            decode_line(report.as_bytes()).as_deref(),
            Some("layer 0 (Base) leds []")
        );
        assert_eq!(decode_line(&[0xEE; RAW_EPSIZE]), None);
        assert_eq!(decode_line(&[]), None);
    }

    #[test]
    fn test_unknown_key_id() {
        assert_eq!(key_name(0x7FFF), "0x7FFF");
    }
}
