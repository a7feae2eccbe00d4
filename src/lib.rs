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

//! Twinbeacon - rotating BLE beacon daemon for Linux
//!
//! This library provides the advertising frame builders, the rotation
//! controller that alternates them on a fixed dwell cadence, and the raw-HCI
//! and sysfs-GPIO backends behind its collaborator seams.

pub mod frame;
pub mod rotation;
pub mod hci;
pub mod gpio;
pub mod config;
pub mod logger;

#[cfg(test)]
pub mod test_utils;
