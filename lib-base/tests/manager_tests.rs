// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use hidpp::mock::{MockBackend, SimulatedDevice};
use hidpp::*;
use hidpp_base::*;
use std::sync::Arc;

fn setup(device: SimulatedDevice) -> DevicesManager {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = MockBackend::with_interface(LOGITECH_VENDOR_ID, 0xC547, "USB_Receiver");
    backend.attach(device);
    DevicesManager::new(
        Arc::new(backend),
        LOGITECH_VENDOR_ID,
        ConnectionOptions::default().with_pump_mode(PumpMode::Split),
    )
}

fn mouse() -> SimulatedDevice {
    SimulatedDevice::new().with_response(FEATURE_DEVICE_NAME_TYPE, 2, &[3, 0, 0, 0])
}

#[tokio::test]
async fn test_discover() {
    let mut manager = setup(SimulatedDevice::new());

    assert_eq!(manager.discover().await.unwrap(), 1);
    assert_eq!(manager.devices()[0].name, "USB Receiver");
    assert_eq!(manager.devices_list_str(), vec!["[0] C547 -USB Receiver".to_string()]);
}

#[tokio::test]
async fn test_discover_filters_by_type() {
    let mut manager = setup(mouse()).with_device_type(DeviceKind::Mouse);
    assert_eq!(manager.discover().await.unwrap(), 1);
    assert_eq!(manager.devices()[0].device_type, Some(DeviceKind::Mouse));

    let mut manager = setup(mouse()).with_device_type(DeviceKind::Keyboard);
    assert_eq!(manager.discover().await.unwrap(), 0);
}

#[tokio::test]
async fn test_connect_by_name_and_pid() {
    let mut manager = setup(SimulatedDevice::new());
    manager.discover().await.unwrap();

    let device = manager.connect_with_name("USB Receiver").unwrap();
    assert!(device.is_connected());
    device.disconnect().await;

    assert!(manager.connect_with_name("Other").is_none());

    let device = manager.connect_with_pid(0xC547).unwrap();
    device.disconnect().await;
    assert!(manager.connect_with_pid(0x1234).is_none());
}

#[tokio::test]
async fn test_connect_with_pid_tid() {
    let device = SimulatedDevice::new()
        .with_response(
            FEATURE_DEVICE_INFORMATION,
            0,
            &[1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        )
        .with_response(
            FEATURE_DEVICE_INFORMATION,
            1,
            &[0, b'R', b'B', b'M', 0x12, 0x03, 0x00, 0x42, 0x01, 0xC0, 0x9A],
        );
    let mut manager = setup(device);
    manager.discover().await.unwrap();

    assert!(manager.connect_with_pid_tid(0xC547, 0x1111).await.is_none());

    let connected = manager.connect_with_pid_tid(0xC547, 0xC09A).await.unwrap();
    assert_eq!(connected.device_info().await.transport_id, Some(0xC09A));
    connected.disconnect().await;
}

#[tokio::test]
async fn test_from_config() {
    let backend = MockBackend::with_interface(0x1234, 0x0001, "Other_Vendor");
    let config = Config {
        vendor_id: 0x1234,
        ..Config::default()
    };

    let mut manager = DevicesManager::from_config(Arc::new(backend), &config);
    assert_eq!(manager.discover().await.unwrap(), 1);
    assert_eq!(manager.devices()[0].vendor_id, 0x1234);
}

#[tokio::test]
async fn test_device_is_connected_only_once() {
    let mut manager = setup(SimulatedDevice::new());
    manager.discover().await.unwrap();

    let first = manager.connect_with_pid(0xC547).unwrap();
    assert!(manager.connect_with_pid(0xC547).is_none());
    assert!(manager.connect_with_name("USB Receiver").is_none());

    first.disconnect().await;
    let second = manager.connect_with_name("USB Receiver").unwrap();

    // dropping a connection releases the device too
    drop(second);
    let third = manager.connect_with_pid(0xC547).unwrap();
    third.disconnect().await;
}
