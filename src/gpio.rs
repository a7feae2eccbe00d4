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

//! Digital input backends: a sysfs GPIO line, plus a fixed level for hosts
//! with nothing wired up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::SensorSource;
use crate::rotation::DigitalInput;

const GPIO_ROOT: &str = "/sys/class/gpio";

/// A sysfs GPIO line opened for input. Every read goes back to the value
/// file, so the level is always current.
pub struct SysfsInput {
    value_path: PathBuf,
}

impl SysfsInput {
    /// Export the line if needed, force its direction to `in`, and verify the
    /// value file reads cleanly.
    pub fn open(line: u32) -> io::Result<Self> {
        Self::open_under(Path::new(GPIO_ROOT), line)
    }

    // Rooted variant so tests can run against a scratch directory.
    fn open_under(root: &Path, line: u32) -> io::Result<Self> {
        let gpio_dir = root.join(format!("gpio{}", line));
        if !gpio_dir.exists() {
            fs::write(root.join("export"), line.to_string())?;
        }
        let direction = gpio_dir.join("direction");
        if direction.exists() {
            fs::write(&direction, "in")?;
        }
        let value_path = gpio_dir.join("value");
        read_level_file(&value_path)?;
        Ok(SysfsInput { value_path })
    }
}

impl DigitalInput for SysfsInput {
    fn read_level(&mut self) -> io::Result<u8> {
        read_level_file(&self.value_path)
    }
}

fn read_level_file(path: &Path) -> io::Result<u8> {
    let raw = fs::read_to_string(path)?;
    let trimmed = raw.trim();
    trimmed.parse::<u8>().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unexpected gpio value: {:?}", trimmed),
        )
    })
}

/// The input source picked by configuration.
pub enum SensorInput {
    Sysfs(SysfsInput),
    Fixed(u8),
}

impl SensorInput {
    pub fn open(source: &SensorSource) -> io::Result<Self> {
        match source {
            SensorSource::Gpio { line } => Ok(SensorInput::Sysfs(SysfsInput::open(*line)?)),
            SensorSource::Fixed { level } => Ok(SensorInput::Fixed(*level)),
        }
    }
}

impl DigitalInput for SensorInput {
    fn read_level(&mut self) -> io::Result<u8> {
        match self {
            SensorInput::Sysfs(input) => input.read_level(),
            SensorInput::Fixed(level) => Ok(*level),
        }
    }
}
