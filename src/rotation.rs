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

//! The rotation loop: alternate the plain and obfuscated frames on a fixed
//! dwell cadence, forever. Collaborators (radio, sensor line, clock) sit
//! behind traits so the cycle logic tests without hardware.

use std::io;
use std::thread;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use crate::frame::{self, AdvertisingFrame};
use crate::logger;

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug)]
pub enum TransmitError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Advertising data too long: {0} bytes (limit 31)")]
    DataTooLong(usize),
    #[error("Permission denied - need root to reach the controller")]
    PermissionDenied,
}

/// Radio seam: begin/halt non-connectable broadcast of one frame.
/// `stop_advertising` is safe to call with nothing active.
#[cfg_attr(test, automock)]
pub trait Transmitter {
    fn start_advertising(&mut self, frame: &AdvertisingFrame) -> Result<(), TransmitError>;
    fn stop_advertising(&mut self) -> Result<(), TransmitError>;
}

/// Sensor seam: current level of the configured digital input line.
pub trait DigitalInput {
    fn read_level(&mut self) -> io::Result<u8>;
}

/// Clock seam: blocking suspend for one dwell window.
pub trait Pacer {
    fn dwell(&mut self, period: Duration);
}

/// Production pacer backed by `thread::sleep`.
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn dwell(&mut self, period: Duration) {
        thread::sleep(period);
    }
}

/// Which of the two frame variants a window carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Normal,
    Obfuscated,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Normal => "normal",
            FrameKind::Obfuscated => "obfuscated",
        }
    }
}

/// Drives the two-state advertise cycle: plain frame, then obfuscated frame
/// with a fresh sensor sample, each held for one dwell window, repeating until
/// the process is torn down.
pub struct RotationController<T, I, P> {
    tx: T,
    input: I,
    pacer: P,
    dwell: Duration,
    // The plain frame never changes, so it is built once up front.
    normal: AdvertisingFrame,
}

impl<T: Transmitter, I: DigitalInput, P: Pacer> RotationController<T, I, P> {
    pub fn new(tx: T, input: I, pacer: P, dwell: Duration) -> Self {
        RotationController {
            tx,
            input,
            pacer,
            dwell,
            normal: frame::normal_frame(),
        }
    }

    /// Run the loop forever. Only process teardown ends it.
    pub fn run(&mut self) -> ! {
        loop {
            self.rotate_once();
        }
    }

    /// One full rotation: plain window, then obfuscated window. The sensor is
    /// sampled once, between the two, so every obfuscated frame carries the
    /// level current at its build time.
    pub fn rotate_once(&mut self) {
        let normal = self.normal;
        self.advertise_window(&normal, FrameKind::Normal, None);

        let sample = self.sample_sensor();
        let masked = frame::obfuscated_frame(sample);
        self.advertise_window(&masked, FrameKind::Obfuscated, Some(sample));
    }

    /// Start, hold for the dwell window, stop. A failed start is not retried
    /// and not escalated: the window still runs its full length and only the
    /// success notification is omitted. Cadence over delivery.
    fn advertise_window(&mut self, frame: &AdvertisingFrame, kind: FrameKind, sample: Option<u8>) {
        match self.tx.start_advertising(frame) {
            Ok(()) => {
                let mut data = json!({
                    "frame": kind.as_str(),
                    "identifier": frame::hex_string(frame.identifier()),
                });
                if let Some(level) = sample {
                    data["sample"] = json!(level);
                }
                logger::log_event("advertise", data);
            }
            Err(_) => {}
        }
        self.pacer.dwell(self.dwell);
        let _ = self.tx.stop_advertising();
    }

    /// Read the input line, substituting 0 when the read fails so the
    /// rotation never stalls on a sensor problem.
    fn sample_sensor(&mut self) -> u8 {
        match self.input.read_level() {
            Ok(level) => level,
            Err(e) => {
                logger::log_event("sensor_fallback", json!({ "error": e.to_string() }));
                0
            }
        }
    }
}
