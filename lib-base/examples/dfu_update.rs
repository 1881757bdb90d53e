// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Flash a DFU image: `dfu_update <pid-hex> <image.dfu>`

use anyhow::{bail, Context, Result};
use hidpp::{DfuController, DfuFile, HidApiBackend};
use hidpp_base::{init_logging, Config, DevicesManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <pid-hex> <image.dfu>", args[0]);
    }
    let product_id = u16::from_str_radix(args[1].trim_start_matches("0x"), 16)
        .with_context(|| format!("Invalid product id: {}", args[1]))?;
    let image = PathBuf::from(&args[2]);

    let config = Config::load()?;
    init_logging(&config.logging)?;

    let mut manager = DevicesManager::from_config(Arc::new(HidApiBackend::new()), &config);
    manager.discover().await?;
    for line in manager.devices_list_str() {
        println!("{}", line);
    }

    let Some(device) = manager.connect_with_pid(product_id) else {
        bail!("No device with PID {:04X}", product_id);
    };
    device.negotiate_response_length().await;

    let file = DfuFile::open(&image)?;
    file.log_info();
    let result = DfuController::new(&device, file)
        .perform(Duration::from_secs(2), true, |line, total| {
            if line % 100 == 0 || line + 1 == total {
                println!("{}/{}", line + 1, total);
            }
        })
        .await;

    device.disconnect().await;
    result?;
    Ok(())
}
