// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use hidpp::{
    get_interfaces, list_devices, ConnectedDevice, ConnectionOptions, HidApiBackend,
    LOGITECH_VENDOR_ID,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let backend = HidApiBackend::new();
    let interfaces = get_interfaces(&backend, LOGITECH_VENDOR_ID)?;
    let devices = list_devices(&interfaces);
    for device in &devices {
        println!("Found {}", device);
    }

    let Some(info) = devices.into_iter().next() else {
        println!("No HID++ device found");
        return Ok(());
    };

    let device = ConnectedDevice::connect(&backend, info, ConnectionOptions::default())?;
    device.negotiate_response_length().await;
    device.enumerate_all().await;
    device.get_device_info().await;

    if let Some(battery) = device.get_battery_state().await {
        println!("Battery: {:?}", battery);
    }

    // Print every unclaimed notification for a few seconds
    device
        .set_link_callback(|event| println!("Link event: {:?}", event))
        .await;
    for _ in 0..5 {
        if let Some(frame) = device.wait_notification(Duration::from_secs(1)).await {
            println!("Received: {}", frame);
        }
    }

    device.disconnect().await;
    Ok(())
}
