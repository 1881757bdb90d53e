// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use hidpp::mock::MockBackend;
use hidpp::*;

fn device_info() -> DeviceInfo {
    let backend = MockBackend::with_interface(LOGITECH_VENDOR_ID, 0xC547, "Receiver");
    DeviceInfo::new(LOGITECH_VENDOR_ID, 0xC547, backend.interface(), "Receiver", 0xFF)
}

fn entity(entity_index: u8, entity_type: u8, active: bool, transport_pid: u16) -> FirmwareInfo {
    FirmwareInfo {
        entity_index,
        entity_type,
        name: "RBM12".to_string(),
        revision: 1,
        build: 0x0042,
        transport_pid,
        active,
    }
}

#[test]
fn test_root_present_from_construction() {
    let info = device_info();
    let root = info.feature(FEATURE_ROOT).unwrap();

    assert_eq!(root.index, 0);
    assert_eq!(info.feature_count(), 1);
    assert_eq!(info.enumeration_state(), EnumerationState::Unenumerated);
}

#[test]
fn test_first_index_wins() {
    let mut info = device_info();

    assert!(info.add_feature(FeatureInfo::new(FEATURE_SET, 1, false, false, 0)));
    assert!(!info.add_feature(FeatureInfo::new(FEATURE_SET, 7, false, false, 0)));

    assert_eq!(info.feature_index(FEATURE_SET), Some(1));
    assert_eq!(info.feature_at(1).map(|f| f.id), Some(FEATURE_SET));
    assert_eq!(info.enumeration_state(), EnumerationState::PartiallyEnumerated);

    info.mark_fully_enumerated();
    assert_eq!(info.enumeration_state(), EnumerationState::FullyEnumerated);
}

#[test]
fn test_feature_flags() {
    let feature = FeatureInfo::from_type_flags(0x1E00, 9, 0b1010_0000, 3);

    assert!(feature.obsolete);
    assert!(feature.engineering);
    assert_eq!(feature.version, 3);

    let feature = FeatureInfo::from_type_flags(0x1E00, 9, 0x00, 0);
    assert!(!feature.obsolete && !feature.engineering);
}

#[test]
fn test_transport_id_from_active_application() {
    let mut info = device_info();
    info.set_device_info(DeviceInfoStruct {
        entity_count: 3,
        unit_id: 1,
        transport: 0,
        model_id: [0; 6],
        capabilities: 0,
    });

    info.add_entity_fw_info(entity(0, 1, true, 0x1111));
    info.add_entity_fw_info(entity(1, 0, false, 0x2222));
    assert_eq!(info.transport_id, None);

    info.add_entity_fw_info(entity(2, 0, true, 0x3333));
    assert_eq!(info.transport_id, Some(0x3333));
    assert_eq!(info.entities().len(), 3);

    // a new info block starts a fresh entity list
    info.set_device_info(DeviceInfoStruct {
        entity_count: 1,
        unit_id: 1,
        transport: 0,
        model_id: [0; 6],
        capabilities: 0,
    });
    assert!(info.entities().is_empty());
}

#[test]
fn test_display() {
    let info = device_info().with_device_type(DeviceKind::Receiver);
    assert_eq!(
        info.to_string(),
        "HidppDevice(name=Receiver, vid=046D, pid=C547, sub_idx=255, type=Receiver, link=Unknown)"
    );
}

#[test]
fn test_device_kind_from_code() {
    assert_eq!(DeviceKind::from(3), DeviceKind::Mouse);
    assert_eq!(DeviceKind::from(18), DeviceKind::CarSimPedals);
    assert_eq!(DeviceKind::from(42), DeviceKind::Unknown(42));
    assert_eq!(DeviceKind::SteeringWheel.to_string(), "Steering Wheel");
}
