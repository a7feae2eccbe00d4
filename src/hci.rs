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

//! LE advertising over a Linux raw HCI socket: AD-structure assembly, command
//! packet encoding, and the transmitter backend driving one local controller.

use std::io;
use std::os::unix::io::RawFd;

use crate::frame::{AdvertisingFrame, FLAGS_LEN, VENDOR_DATA_LEN};
use crate::rotation::{TransmitError, Transmitter};

// Bluetooth raw-socket plumbing not covered by the libc crate.
const BTPROTO_HCI: libc::c_int = 1;
const HCI_CHANNEL_RAW: u16 = 0;

// HCI command framing.
const HCI_COMMAND_PKT: u8 = 0x01;
const OGF_LE_CTL: u16 = 0x08;
const OCF_LE_SET_ADV_PARAMETERS: u16 = 0x0006;
const OCF_LE_SET_ADV_DATA: u16 = 0x0008;
const OCF_LE_SET_ADV_ENABLE: u16 = 0x000A;

/// Non-connectable undirected advertising.
const ADV_NONCONN_IND: u8 = 0x03;
/// All three advertising channels.
const ADV_CHANNEL_MAP_ALL: u8 = 0x07;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;
/// Advertising data payload budget.
const ADV_DATA_MAX: usize = 31;

#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

fn opcode(ogf: u16, ocf: u16) -> u16 {
    (ogf << 10) | ocf
}

/// Milliseconds to advertising-interval units of 0.625 ms, clamped to the
/// range the controller accepts (0x0020..=0x4000 units).
fn adv_interval_units(ms: u16) -> u16 {
    let units = (ms as u32) * 8 / 5;
    units.clamp(0x0020, 0x4000) as u16
}

fn command_packet(ocf: u16, params: &[u8]) -> Vec<u8> {
    let op = opcode(OGF_LE_CTL, ocf);
    let mut pkt = Vec::with_capacity(4 + params.len());
    pkt.push(HCI_COMMAND_PKT);
    pkt.extend_from_slice(&op.to_le_bytes());
    pkt.push(params.len() as u8);
    pkt.extend_from_slice(params);
    pkt
}

/// Parameter block for LE Set Advertising Parameters: min/max interval,
/// advertising type, own/direct address types, direct address, channel map,
/// filter policy.
fn adv_params(interval_ms: u16) -> [u8; 15] {
    let units = adv_interval_units(interval_ms).to_le_bytes();
    let mut p = [0u8; 15];
    p[0..2].copy_from_slice(&units);
    p[2..4].copy_from_slice(&units);
    p[4] = ADV_NONCONN_IND;
    // Own address type public, no direct address, accept any scanner.
    p[13] = ADV_CHANNEL_MAP_ALL;
    p
}

/// Parameter block for LE Set Advertising Data: a significant-length byte,
/// the Flags AD and the Manufacturer Specific Data AD wrapping the frame's
/// two segments, zero-padded to the fixed 31-byte buffer.
fn adv_data_params(frame: &AdvertisingFrame) -> Result<[u8; 32], TransmitError> {
    let significant = 2 + FLAGS_LEN + 2 + VENDOR_DATA_LEN;
    if significant > ADV_DATA_MAX {
        return Err(TransmitError::DataTooLong(significant));
    }
    let mut p = [0u8; 32];
    p[0] = significant as u8;
    let mut w = 1;
    p[w] = (1 + FLAGS_LEN) as u8;
    w += 1;
    p[w] = AD_TYPE_FLAGS;
    w += 1;
    p[w..w + FLAGS_LEN].copy_from_slice(&frame.flags);
    w += FLAGS_LEN;
    p[w] = (1 + VENDOR_DATA_LEN) as u8;
    w += 1;
    p[w] = AD_TYPE_MANUFACTURER_DATA;
    w += 1;
    p[w..w + VENDOR_DATA_LEN].copy_from_slice(&frame.vendor_data);
    Ok(p)
}

fn map_os_error() -> TransmitError {
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EPERM) | Some(libc::EACCES) => TransmitError::PermissionDenied,
        _ => TransmitError::Io(err),
    }
}

/// Transmitter backed by a raw HCI socket bound to one local controller.
/// Commands are fire-and-forget: completion events are not read, matching the
/// loop's policy of never blocking the cadence on radio feedback.
pub struct HciTransmitter {
    fd: RawFd,
    interval_ms: u16,
}

impl HciTransmitter {
    /// Open a raw HCI socket bound to controller `dev`. The advertising
    /// interval is clamped to the range the controller accepts.
    pub fn open(dev: u16, interval_ms: u16) -> Result<Self, TransmitError> {
        let fd = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                BTPROTO_HCI,
            )
        };
        if fd < 0 {
            return Err(map_os_error());
        }
        let addr = SockaddrHci {
            hci_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev,
            hci_channel: HCI_CHANNEL_RAW,
        };
        let rc = unsafe {
            libc::bind(
                fd,
                &addr as *const SockaddrHci as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            let err = map_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }
        Ok(HciTransmitter { fd, interval_ms })
    }

    fn send_command(&self, ocf: u16, params: &[u8]) -> Result<(), TransmitError> {
        let pkt = command_packet(ocf, params);
        let written =
            unsafe { libc::write(self.fd, pkt.as_ptr() as *const libc::c_void, pkt.len()) };
        if written < 0 {
            return Err(map_os_error());
        }
        if written as usize != pkt.len() {
            return Err(TransmitError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                "short write to HCI socket",
            )));
        }
        Ok(())
    }
}

impl Drop for HciTransmitter {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Transmitter for HciTransmitter {
    /// Program parameters and data, then enable. One start call configures
    /// the whole advertising state for the window.
    fn start_advertising(&mut self, frame: &AdvertisingFrame) -> Result<(), TransmitError> {
        self.send_command(OCF_LE_SET_ADV_PARAMETERS, &adv_params(self.interval_ms))?;
        let data = adv_data_params(frame)?;
        self.send_command(OCF_LE_SET_ADV_DATA, &data)?;
        self.send_command(OCF_LE_SET_ADV_ENABLE, &[0x01])
    }

    fn stop_advertising(&mut self) -> Result<(), TransmitError> {
        self.send_command(OCF_LE_SET_ADV_ENABLE, &[0x00])
    }
}
