//! Intel HEX reader for the avr-objcopy output of the firmware build.

use anyhow::{bail, ensure, Context, Result};

/// A parsed segment of data at a specific address from an Intel HEX file.
#[derive(Debug, Clone)]
pub struct HexSegment {
    pub address: u32,
    pub data: Vec<u8>,
}

/// One decoded line.
#[derive(Debug, PartialEq, Eq)]
enum Record {
    Data { offset: u16, data: Vec<u8> },
    EndOfFile,
    /// Record type 02: base = value << 4.
    SegmentBase(u32),
    /// Record type 04: base = value << 16.
    LinearBase(u32),
    /// Record types 03 and 05, execution start; HalfKay always starts at 0.
    StartAddress,
}

fn parse_record(line: &str) -> Result<Record> {
    let Some(body) = line.strip_prefix(':') else {
        bail!("missing start code ':'");
    };
    let bytes = decode_hex_bytes(body).context("invalid hex data")?;
    ensure!(bytes.len() >= 5, "record too short");

    let byte_count = bytes[0] as usize;
    ensure!(
        bytes.len() == 5 + byte_count,
        "expected {} data bytes, got {}",
        byte_count,
        bytes.len() - 5
    );

    // Sum of all bytes including the checksum is 0 mod 256
    let checksum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    ensure!(checksum == 0, "checksum mismatch");

    let offset = u16::from_be_bytes([bytes[1], bytes[2]]);
    let data = &bytes[4..4 + byte_count];
    let base = |shift: u32| -> Result<u32> {
        ensure!(byte_count == 2, "address record must carry 2 bytes");
        Ok((u16::from_be_bytes([data[0], data[1]]) as u32) << shift)
    };

    Ok(match bytes[3] {
        0x00 => Record::Data {
            offset,
            data: data.to_vec(),
        },
        0x01 => Record::EndOfFile,
        0x02 => Record::SegmentBase(base(4)?),
        0x04 => Record::LinearBase(base(16)?),
        0x03 | 0x05 => Record::StartAddress,
        other => bail!("unsupported record type 0x{:02X}", other),
    })
}

/// Parse an Intel HEX format string into address-data segments.
///
/// Contiguous data records are merged into one segment.
pub fn parse_hex(input: &str) -> Result<Vec<HexSegment>> {
    let mut segments: Vec<HexSegment> = Vec::new();
    let mut base_address: u32 = 0;

    for (line_num, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = parse_record(line).with_context(|| format!("line {}", line_num + 1))?;
        match record {
            Record::Data { offset, data } => {
                let address = base_address + offset as u32;

                if let Some(last) = segments.last_mut() {
                    if address == last.address + last.data.len() as u32 {
                        last.data.extend_from_slice(&data);
                        continue;
                    }
                }
                segments.push(HexSegment { address, data });
            }
            Record::EndOfFile => break,
            Record::SegmentBase(base) | Record::LinearBase(base) => base_address = base,
            Record::StartAddress => log::debug!("line {}: ignoring start address", line_num + 1),
        }
    }

    Ok(segments)
}

/// Flatten parsed HEX segments into a contiguous firmware image.
/// Returns (base_address, data) where gaps are filled with erased flash (0xFF).
pub fn flatten_segments(segments: &[HexSegment]) -> Result<(u32, Vec<u8>)> {
    let (Some(min_addr), Some(max_addr)) = (
        segments.iter().map(|s| s.address).min(),
        segments.iter().map(|s| s.address + s.data.len() as u32).max(),
    ) else {
        bail!("no data segments in HEX file");
    };

    let mut image = vec![0xFFu8; (max_addr - min_addr) as usize];
    for seg in segments {
        let offset = (seg.address - min_addr) as usize;
        image[offset..offset + seg.data.len()].copy_from_slice(&seg.data);
    }

    Ok((min_addr, image))
}

fn decode_hex_bytes(hex: &str) -> Result<Vec<u8>> {
    ensure!(hex.is_ascii(), "non-ASCII characters");
    ensure!(hex.len() % 2 == 0, "odd number of hex characters");
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("invalid hex at position {}", i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_hex() {
        let hex = ":10000000000102030405060708090A0B0C0D0E0F78\n\
                   :00000001FF\n";
        let segments = parse_hex(hex).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].address, 0);
        assert_eq!(
            segments[0].data,
            vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
    }

    #[test]
    fn test_parse_extended_segment() {
        let hex = ":020000020100FB\n\
                   :10000000112233445566778899AABBCCDDEEFF00F8\n\
                   :00000001FF\n";
        let segments = parse_hex(hex).unwrap();
        assert_eq!(segments.len(), 1);
        // Base address = 0x0100 << 4 = 0x1000
        assert_eq!(segments[0].address, 0x1000);
    }

    #[test]
    fn test_parse_extended_linear() {
        let hex = ":020000040001F9\n\
                   :02001000DEAD63\n\
                   :00000001FF\n";
        let segments = parse_hex(hex).unwrap();
        assert_eq!(segments[0].address, 0x10010);
        assert_eq!(segments[0].data, vec![0xDE, 0xAD]);
    }

    #[test]
    fn test_start_address_records_are_skipped() {
        let hex = ":0400000300007E007B\n\
                   :0400000500000000F7\n\
                   :0400000001020304F2\n\
                   :00000001FF\n";
        let segments = parse_hex(hex).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_checksum_error() {
        let hex = ":10000000000102030405060708090A0B0C0D0E0F00\n\
                   :00000001FF\n";
        assert!(parse_hex(hex).is_err());
    }

    #[test]
    fn test_truncated_record_is_an_error() {
        assert!(parse_hex(":10000000000102\n").is_err());
        assert!(parse_hex("10000000\n").is_err());
    }

    #[test]
    fn test_contiguous_merge() {
        let hex = ":04000000AABBCCDDEE\n\
                   :04000400112233444E\n\
                   :00000001FF\n";
        let segments = parse_hex(hex).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].data, vec![0xAA, 0xBB, 0xCC, 0xDD, 0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_gap_starts_new_segment() {
        let hex = ":0400000001020304F2\n\
                   :020100000506F2\n\
                   :00000001FF\n";
        let segments = parse_hex(hex).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].address, 0x100);
    }

    #[test]
    fn test_flatten() {
        let segments = vec![
            HexSegment {
                address: 0x100,
                data: vec![0xAA, 0xBB],
            },
            HexSegment {
                address: 0x110,
                data: vec![0xCC, 0xDD],
            },
        ];
        let (base, image) = flatten_segments(&segments).unwrap();
        assert_eq!(base, 0x100);
        assert_eq!(image.len(), 0x12);
        assert_eq!(image[0], 0xAA);
        assert_eq!(image[1], 0xBB);
        // Gap should be 0xFF
        assert_eq!(image[2], 0xFF);
        assert_eq!(image[0x10], 0xCC);
        assert_eq!(image[0x11], 0xDD);
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten_segments(&[]).is_err());
    }
}
