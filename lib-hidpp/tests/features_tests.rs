// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use hidpp::features::{BatteryLevel, CalibrationStatus, ChargingStatus, CALIBRATION_COMPLETE_EVENT};
use hidpp::mock::{MockBackend, SimulatedDevice};
use hidpp::*;

fn connect(device: SimulatedDevice) -> (MockBackend, ConnectedDevice) {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = MockBackend::with_interface(LOGITECH_VENDOR_ID, 0xB023, "Test_Mouse");
    backend.attach(device);
    let info = DeviceInfo::new(
        LOGITECH_VENDOR_ID,
        0xB023,
        backend.interface(),
        "Test Mouse",
        DEVICE_INDEX_DIRECT,
    );
    let connected = ConnectedDevice::connect(
        &backend,
        info,
        ConnectionOptions::default().with_pump_mode(PumpMode::Split),
    )
    .unwrap();
    (backend, connected)
}

#[tokio::test]
async fn test_root_get_feature_flags() {
    let (_backend, device) = connect(SimulatedDevice::new().with_feature(FEATURE_DFU, 2));

    let feature = device.features().root().get_feature(FEATURE_DFU).await.unwrap();
    assert_eq!(feature.id, FEATURE_DFU);
    assert_eq!(feature.index, 1);
    assert_eq!(feature.version, 2);
    assert!(!feature.obsolete);
    assert!(!feature.engineering);

    device.disconnect().await;
}

#[tokio::test]
async fn test_root_ping() {
    let (_backend, device) =
        connect(SimulatedDevice::new().with_response(FEATURE_ROOT, 1, &[4, 2, 0x5A]));

    let pong = device.features().root().ping(0x5A).await;
    assert_eq!(pong, Some((4, 2, 0x5A)));

    device.disconnect().await;
}

#[tokio::test]
async fn test_feature_set() {
    let (_backend, device) = connect(
        SimulatedDevice::new()
            .with_feature(FEATURE_SET, 0)
            .with_feature(FEATURE_BATTERY_VOLTAGE, 3),
    );

    let feature_set = device.features().feature_set();
    assert_eq!(feature_set.get_count().await, Some(2));

    let feature = feature_set.get_feature_id(2).await.unwrap();
    assert_eq!(feature.id, FEATURE_BATTERY_VOLTAGE);
    assert_eq!(feature.index, 2);
    assert_eq!(feature.version, 3);

    device.disconnect().await;
}

#[tokio::test]
async fn test_device_information() {
    let (_backend, device) = connect(
        SimulatedDevice::new()
            .with_response(
                FEATURE_DEVICE_INFORMATION,
                0,
                &[2, 0x12, 0x34, 0x56, 0x78, 0x00, 0x07, 1, 2, 3, 4, 5, 6, 0, 0x0F],
            )
            .with_response(
                FEATURE_DEVICE_INFORMATION,
                1,
                &[0, b'R', b'B', b'M', 0x12, 0x03, 0x00, 0x42, 0x01, 0xC0, 0x9A],
            )
            .with_response(
                FEATURE_DEVICE_INFORMATION,
                1,
                &[1, b'B', b'O', b'T', 0x05, 0x01, 0x00, 0x10, 0x00, 0xAB, 0xCD],
            ),
    );

    assert!(device.get_device_info().await);

    let info = device.device_info().await;
    let details = info.details.as_ref().unwrap();
    assert_eq!(details.entity_count, 2);
    assert_eq!(details.unit_id, 0x1234_5678);
    assert_eq!(details.transport, 0x0007);
    assert_eq!(details.model_id, [1, 2, 3, 4, 5, 6]);
    assert_eq!(details.capabilities, 0x0F);

    let entities = info.entities();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].name, "RBM12");
    assert_eq!(entities[0].revision, 3);
    assert_eq!(entities[0].build, 0x0042);
    assert!(entities[0].active);
    assert_eq!(entities[0].transport_pid, 0xC09A);
    assert_eq!(entities[1].name, "BOT05");
    assert!(!entities[1].active);

    // the active application entity provides the transport id
    assert_eq!(info.transport_id, Some(0xC09A));

    device.disconnect().await;
}

#[tokio::test]
async fn test_serial_number() {
    let (_backend, device) = connect(SimulatedDevice::new().with_response(
        FEATURE_DEVICE_INFORMATION,
        2,
        b"1234567890AB",
    ));

    let serial = device.features().device_information().get_serial_number().await;
    assert_eq!(serial.as_deref(), Some("1234567890AB"));

    device.disconnect().await;
}

#[tokio::test]
async fn test_device_name_and_type() {
    let (_backend, device) = connect(
        SimulatedDevice::new()
            .with_response(FEATURE_DEVICE_NAME_TYPE, 0, &[20])
            .with_response(FEATURE_DEVICE_NAME_TYPE, 1, b"G Pro Wireless M")
            .with_response(FEATURE_DEVICE_NAME_TYPE, 1, b"ouse")
            .with_response(FEATURE_DEVICE_NAME_TYPE, 2, &[3, 0, 0, 0]),
    );

    let name_type = device.features().device_name_type();
    assert_eq!(
        name_type.get_device_name().await.as_deref(),
        Some("G Pro Wireless Mouse")
    );
    assert_eq!(name_type.get_device_type().await, Some(DeviceKind::Mouse));

    device.disconnect().await;
}

#[tokio::test]
async fn test_missing_feature_is_none() {
    let (_backend, device) = connect(SimulatedDevice::new());

    assert!(device.features().device_name_type().get_device_type().await.is_none());
    assert!(!device.get_device_info().await);

    device.disconnect().await;
}

#[tokio::test]
async fn test_battery_unified() {
    let (_backend, device) = connect(
        SimulatedDevice::new()
            .with_feature(FEATURE_UNIFIED_BATTERY, 5)
            .with_response(FEATURE_UNIFIED_BATTERY, 1, &[80, 4, 1, 1, 1, 0]),
    );

    let Some(BatteryState::Unified(status)) = device.get_battery_state().await else {
        panic!("expected unified battery status");
    };
    assert_eq!(status.state_of_charge, 80);
    assert_eq!(status.battery_level, BatteryLevel::Good);
    assert_eq!(status.charging_status, ChargingStatus::Charging);
    assert_eq!(status.fast_charging, Some(1));
    assert_eq!(status.removable_battery_status, Some(0));

    device.disconnect().await;
}

#[tokio::test]
async fn test_battery_falls_back_to_voltage() {
    let (_backend, device) = connect(SimulatedDevice::new().with_response(
        FEATURE_BATTERY_VOLTAGE,
        0,
        &[0x0F, 0xA0, 0b1001_0011],
    ));

    let Some(BatteryState::Voltage(info)) = device.get_battery_state().await else {
        panic!("expected battery voltage");
    };
    assert_eq!(info.voltage, 4000);
    assert!(info.external_power);
    assert!(!info.critical);
    assert!(info.slow_charge);
    assert!(!info.fast_charge);
    assert_eq!(info.charge_status, 3);

    device.disconnect().await;
}

#[tokio::test]
async fn test_battery_falls_back_to_level_status() {
    let (_backend, device) = connect(SimulatedDevice::new().with_response(
        FEATURE_BATTERY_LEVEL_STATUS,
        0,
        &[50, 20, 0],
    ));

    let state = device.get_battery_state().await;
    match state {
        Some(BatteryState::LevelStatus(status)) => {
            assert_eq!(status.discharge_level, 50);
            assert_eq!(status.discharge_next_level, 20);
            assert_eq!(status.status, 0);
        }
        other => panic!("unexpected battery state {:?}", other),
    }

    device.disconnect().await;
}

#[tokio::test]
async fn test_no_battery() {
    let (_backend, device) = connect(SimulatedDevice::new());
    assert!(device.get_battery_state().await.is_none());
    device.disconnect().await;
}

#[tokio::test]
async fn test_start_dfu_is_fire_and_forget() {
    let (backend, device) = connect(SimulatedDevice::new().with_feature(FEATURE_DFU_CONTROL, 0));

    assert!(device.features().dfu_control().start_dfu().await);

    let mut written = backend.written();
    for _ in 0..200 {
        if written.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        written = backend.written();
    }
    let start = &written[1];
    assert_eq!(&start[..4], &[0x11, 0xFF, 0x01, 0x1F]);
    assert_eq!(&start[4..11], &[1, 0, 0, 0, b'D', b'F', b'U']);

    device.disconnect().await;
}

#[tokio::test]
async fn test_calibration_waits_for_completion_event() {
    let (_backend, device) = connect(
        SimulatedDevice::new()
            .with_response(FEATURE_CALIBRATION, 0, &[])
            .with_event(FEATURE_CALIBRATION, 0, CALIBRATION_COMPLETE_EVENT, &[1])
            .with_response(FEATURE_CALIBRATION, 1, &[1]),
    );

    let calibration = device.features().calibration();
    let status = calibration
        .start_calibration(std::time::Duration::from_secs(1))
        .await;
    assert_eq!(status, Some(CalibrationStatus::Success));
    assert_eq!(calibration.is_calibrated().await, Some(true));

    // each run listens on its own channel
    let status = calibration
        .start_calibration(std::time::Duration::from_secs(1))
        .await;
    assert_eq!(status, Some(CalibrationStatus::Success));

    device.disconnect().await;
}

#[tokio::test]
async fn test_calibration_without_event_times_out() {
    let (backend, device) =
        connect(SimulatedDevice::new().with_response(FEATURE_CALIBRATION, 0, &[]));

    let status = device
        .features()
        .calibration()
        .start_calibration(std::time::Duration::from_millis(50))
        .await;
    assert_eq!(status, None);

    // the callback is gone, so a late event lands in the inbound queue
    let mut event = vec![0x11, 0xFF, 0x01, 0x00, 1];
    event.resize(20, 0);
    backend.push_long(event);
    let frame = device
        .wait_notification(std::time::Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(frame.feature_index, 1);

    device.disconnect().await;
}

#[tokio::test]
async fn test_calibration_feature_missing() {
    let (_backend, device) = connect(SimulatedDevice::new());
    let calibration = device.features().calibration();

    assert!(calibration
        .start_calibration(std::time::Duration::from_millis(50))
        .await
        .is_none());
    assert!(calibration.is_calibrated().await.is_none());

    device.disconnect().await;
}
