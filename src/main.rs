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

mod config;
mod frame;
mod gpio;
mod hci;
mod logger;
mod rotation;
#[cfg(test)]
mod test_utils;

use std::time::Duration;

use anyhow::{anyhow, Context};

use config::{
    config_path, effective_config, load_saved_config, system_config_path, validate_config,
    write_system_config,
};
use rotation::{RotationController, ThreadPacer};

fn main() -> anyhow::Result<()> {
    // Gather args once
    let args: Vec<String> = std::env::args().collect();

    // Frame dump prints constants only, so it runs unprivileged
    if args.iter().any(|a| a == "--dump-frames") {
        dump_frames();
        return Ok(());
    }

    // Check if running as root
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("Error: twinbeacon requires root privileges to open raw HCI sockets and export GPIO lines.");
        eprintln!(
            "Please run with: sudo {}",
            std::env::args().next().unwrap_or_else(|| "twinbeacon".to_string())
        );
        std::process::exit(1);
    }

    // Optional logging to /etc/twinbeacon/logs.json
    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": args }));
    }

    // Simple CLI handling: `twinbeacon save` promotes the user config to
    // /etc/twinbeacon/profile.json and exits
    if args.get(1).map(|s| s.as_str()) == Some("save") {
        match load_saved_config() {
            Some(cfg) => {
                validate_config(&cfg).map_err(|e| anyhow!("invalid config: {}", e))?;
                write_system_config(&cfg)?;
                logger::log_event("config_saved", serde_json::json!({}));
                println!("Wrote config to {}", system_config_path().display());
                return Ok(());
            }
            None => {
                eprintln!(
                    "No user config found at {}. Write one first, then run: sudo twinbeacon save",
                    config_path().display()
                );
                std::process::exit(1);
            }
        }
    }

    let res = run_beacon();
    if let Err(err) = res {
        eprintln!("error: {err:#}");
        if logging_enabled {
            logger::log_event(
                "fatal_error",
                serde_json::json!({ "error": err.to_string() }),
            );
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_beacon() -> anyhow::Result<()> {
    let cfg = effective_config().map_err(|e| anyhow!("config error: {}", e))?;

    // Both collaborators must come up before the loop; either failure is
    // fatal to the whole process.
    let tx = hci::HciTransmitter::open(cfg.hci_dev, cfg.adv_interval_ms)
        .context("initialize transmitter")?;
    let input = gpio::SensorInput::open(&cfg.sensor).context("initialize sensor input")?;

    eprintln!(
        "twinbeacon: starting rotation (dwell {}s, hci{}, interval {}ms)",
        cfg.dwell_secs, cfg.hci_dev, cfg.adv_interval_ms
    );
    logger::log_event(
        "transmitter_ready",
        serde_json::json!({ "hci_dev": cfg.hci_dev }),
    );

    let mut controller =
        RotationController::new(tx, input, ThreadPacer, Duration::from_secs(cfg.dwell_secs));
    controller.run()
}

fn dump_frames() {
    let normal = frame::normal_frame();
    let masked = frame::obfuscated_frame(0);
    println!("normal:");
    println!("  flags:  {}", frame::hex_string(&normal.flags));
    println!("  vendor: {}", frame::hex_string(&normal.vendor_data));
    println!("obfuscated (sample 0):");
    println!("  flags:  {}", frame::hex_string(&masked.flags));
    println!("  vendor: {}", frame::hex_string(&masked.vendor_data));
}
