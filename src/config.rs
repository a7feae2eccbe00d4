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

use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_dwell_secs() -> u64 {
    3
}

fn default_adv_interval_ms() -> u16 {
    100
}

/// Where the sensor sample comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SensorSource {
    /// A sysfs GPIO line (`/sys/class/gpio/gpioN/value`).
    Gpio { line: u32 },
    /// A constant level, for hosts with no wired input.
    Fixed { level: u8 },
}

impl Default for SensorSource {
    fn default() -> Self {
        SensorSource::Fixed { level: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BeaconConfig {
    /// Seconds each frame variant stays on air before rotating.
    #[serde(default = "default_dwell_secs")]
    pub dwell_secs: u64,
    /// HCI device index (0 for hci0).
    #[serde(default)]
    pub hci_dev: u16,
    /// Advertising interval in milliseconds.
    #[serde(default = "default_adv_interval_ms")]
    pub adv_interval_ms: u16,
    #[serde(default)]
    pub sensor: SensorSource,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        BeaconConfig {
            dwell_secs: default_dwell_secs(),
            hci_dev: 0,
            adv_interval_ms: default_adv_interval_ms(),
            sensor: SensorSource::default(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("twinbeacon").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("twinbeacon")
            .join("config.json");
    }
    PathBuf::from("/etc/twinbeacon/config.json")
}

/// Load the user config, or None when missing or unreadable.
pub fn load_saved_config() -> Option<BeaconConfig> {
    let path = config_path();
    let data = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/twinbeacon/profile.json")
}

pub fn write_system_config(cfg: &BeaconConfig) -> io::Result<()> {
    let path = system_config_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    fs::write(&path, json)?;
    // Best-effort set permissions to 0644
    let perms = fs::Permissions::from_mode(0o644);
    let _ = fs::set_permissions(&path, perms);
    Ok(())
}

pub fn validate_config(cfg: &BeaconConfig) -> Result<(), String> {
    if cfg.dwell_secs == 0 || cfg.dwell_secs > 3600 {
        return Err(format!(
            "dwell_secs out of range (1..3600): {}",
            cfg.dwell_secs
        ));
    }
    // 100 ms is the non-connectable advertising floor on older controllers.
    if cfg.adv_interval_ms < 100 || cfg.adv_interval_ms > 10240 {
        return Err(format!(
            "adv_interval_ms out of range (100..10240): {}",
            cfg.adv_interval_ms
        ));
    }
    if let SensorSource::Gpio { line } = cfg.sensor {
        if line >= 4096 {
            return Err(format!("gpio line out of range (0..4095): {}", line));
        }
    }
    Ok(())
}

pub fn try_load_system_config() -> Result<BeaconConfig, String> {
    let path = system_config_path();
    let data = fs::read_to_string(&path).map_err(|e| e.to_string())?;
    let cfg: BeaconConfig = serde_json::from_str(&data).map_err(|e| format!("parse error: {}", e))?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Resolve the runtime configuration: the system profile wins when present,
/// then the user config, then built-in defaults.
pub fn effective_config() -> Result<BeaconConfig, String> {
    if system_config_path().exists() {
        return try_load_system_config();
    }
    match load_saved_config() {
        Some(cfg) => {
            validate_config(&cfg)?;
            Ok(cfg)
        }
        None => Ok(BeaconConfig::default()),
    }
}
