/*
 * This file is part of Twinbeacon.
 *
 * Copyright (C) 2026 Twinbeacon contributors
 *
 * Twinbeacon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Twinbeacon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Twinbeacon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Advertising frame construction: the plain identifier frame and the
//! XOR-masked variant that carries a live sensor sample in its last
//! identifier byte.

/// Flags segment length in bytes.
pub const FLAGS_LEN: usize = 1;
/// Vendor-data segment length in bytes (header + identifier + tags + power).
pub const VENDOR_DATA_LEN: usize = 25;
/// Identifier length in bytes.
pub const IDENTIFIER_LEN: usize = 16;

/// Advertising flags: BR/EDR not supported (LE beacon only).
pub const ADV_FLAGS: u8 = 0x04;

/// Vendor-data header: company identifier 0x004C, subtype 0x02, subtype length 0x15.
pub const VENDOR_HEADER: [u8; 4] = [0x4C, 0x00, 0x02, 0x15];

/// Plaintext device identifier: ASCII "IAN" padded with zeros to 16 bytes.
pub const IDENTIFIER_TEMPLATE: [u8; IDENTIFIER_LEN] = [
    0x49, 0x41, 0x4E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

/// Fixed mask applied byte-wise to the identifier for the obfuscated frame.
/// Not a security mechanism: the key ships next to the plaintext template and
/// never rotates.
pub const OBFUSCATION_KEY: [u8; IDENTIFIER_LEN] = [
    0xAA, 0xBB, 0xCC, 0xDD, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0x00, 0xFF,
    0xEE,
];

/// Major tag, big-endian on the wire.
pub const MAJOR: u16 = 0xAAAA;
/// Minor tag, big-endian on the wire.
pub const MINOR: u16 = 0xBBBB;
/// Calibrated signal strength at 1 m, two's complement dBm.
pub const MEASURED_POWER: u8 = 0xC8;

/// One ready-to-transmit advertising payload: a 1-byte flags segment plus the
/// 25-byte vendor-data segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingFrame {
    pub flags: [u8; FLAGS_LEN],
    pub vendor_data: [u8; VENDOR_DATA_LEN],
}

impl AdvertisingFrame {
    /// The 16-byte identifier region of the vendor-data segment.
    pub fn identifier(&self) -> &[u8] {
        &self.vendor_data[4..20]
    }
}

/// Build the plain frame. Pure function of compile-time constants; the result
/// never changes, so callers may build it once and reuse it.
pub fn normal_frame() -> AdvertisingFrame {
    assemble(IDENTIFIER_TEMPLATE)
}

/// Build the obfuscated frame for the given sensor sample. Must be rebuilt
/// every cycle: the last identifier byte carries the sample.
pub fn obfuscated_frame(sample: u8) -> AdvertisingFrame {
    let mut identifier = [0u8; IDENTIFIER_LEN];
    for i in 0..IDENTIFIER_LEN {
        identifier[i] = IDENTIFIER_TEMPLATE[i] ^ OBFUSCATION_KEY[i];
    }
    // The sample replaces the key-derived last byte outright; it is not
    // XOR-mixed in.
    identifier[IDENTIFIER_LEN - 1] = sample;
    assemble(identifier)
}

/// Vendor-data layout: [0..4] header, [4..20] identifier, [20..22] major,
/// [22..24] minor, [24] measured power.
fn assemble(identifier: [u8; IDENTIFIER_LEN]) -> AdvertisingFrame {
    let mut vendor = [0u8; VENDOR_DATA_LEN];
    vendor[..4].copy_from_slice(&VENDOR_HEADER);
    vendor[4..20].copy_from_slice(&identifier);
    vendor[20..22].copy_from_slice(&MAJOR.to_be_bytes());
    vendor[22..24].copy_from_slice(&MINOR.to_be_bytes());
    vendor[24] = MEASURED_POWER;
    AdvertisingFrame {
        flags: [ADV_FLAGS],
        vendor_data: vendor,
    }
}

/// Render bytes as lowercase space-separated hex, e.g. "4c 00 02 15".
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02x}", b));
    }
    out
}
