// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Per-device model: identity, the feature directory and firmware entities.

use crate::constants::FEATURE_ROOT;
use crate::transport::HidppInterface;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A feature supported by the device and where it lives for this connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureInfo {
    pub id: u16,
    pub index: u8,
    pub obsolete: bool,
    pub engineering: bool,
    pub version: u8,
}

impl FeatureInfo {
    pub fn new(id: u16, index: u8, obsolete: bool, engineering: bool, version: u8) -> Self {
        Self {
            id,
            index,
            obsolete,
            engineering,
            version,
        }
    }

    /// Decode the feature type byte returned by the root and feature set features
    pub fn from_type_flags(id: u16, index: u8, flags: u8, version: u8) -> Self {
        Self::new(
            id,
            index,
            (flags >> 7) & 0x01 == 1,
            (flags >> 5) & 0x01 == 1,
            version,
        )
    }

    /// The root feature, always at index 0
    pub fn root() -> Self {
        Self::new(FEATURE_ROOT, 0, false, false, 0)
    }
}

/// Device information block (feature 0x0003, getDeviceInfo)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfoStruct {
    pub entity_count: u8,
    pub unit_id: u32,
    pub transport: u16,
    pub model_id: [u8; 6],
    pub capabilities: u8,
}

/// Firmware entity description (feature 0x0003, getFwInfo)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareInfo {
    pub entity_index: u8,
    pub entity_type: u8,
    pub name: String,
    pub revision: u8,
    pub build: u16,
    pub transport_pid: u16,
    pub active: bool,
}

impl FirmwareInfo {
    /// Entity type of the main application firmware
    pub const MAIN_APPLICATION: u8 = 0;
}

impl fmt::Display for FirmwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entity idx:{} type:{}, fwName:{}, rev:{}, build:{:04X}, trPid:{:04X}, active:{}",
            self.entity_index,
            self.entity_type,
            self.name,
            self.revision,
            self.build,
            self.transport_pid,
            self.active
        )
    }
}

/// Device types reported by feature 0x0005
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    Keyboard,
    RemoteControl,
    Numpad,
    Mouse,
    Trackpad,
    Trackball,
    Presenter,
    Receiver,
    Headset,
    Webcam,
    SteeringWheel,
    Joystick,
    Gamepad,
    Dock,
    Speaker,
    Microphone,
    Light,
    ProgrammableController,
    CarSimPedals,
    Unknown(u32),
}

impl From<u32> for DeviceKind {
    fn from(val: u32) -> Self {
        match val {
            0 => DeviceKind::Keyboard,
            1 => DeviceKind::RemoteControl,
            2 => DeviceKind::Numpad,
            3 => DeviceKind::Mouse,
            4 => DeviceKind::Trackpad,
            5 => DeviceKind::Trackball,
            6 => DeviceKind::Presenter,
            7 => DeviceKind::Receiver,
            8 => DeviceKind::Headset,
            9 => DeviceKind::Webcam,
            10 => DeviceKind::SteeringWheel,
            11 => DeviceKind::Joystick,
            12 => DeviceKind::Gamepad,
            13 => DeviceKind::Dock,
            14 => DeviceKind::Speaker,
            15 => DeviceKind::Microphone,
            16 => DeviceKind::Light,
            17 => DeviceKind::ProgrammableController,
            18 => DeviceKind::CarSimPedals,
            other => DeviceKind::Unknown(other),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Keyboard => write!(f, "Keyboard"),
            DeviceKind::RemoteControl => write!(f, "Remote Control"),
            DeviceKind::Numpad => write!(f, "Numpad"),
            DeviceKind::Mouse => write!(f, "Mouse"),
            DeviceKind::Trackpad => write!(f, "Trackpad"),
            DeviceKind::Trackball => write!(f, "Trackball"),
            DeviceKind::Presenter => write!(f, "Presenter"),
            DeviceKind::Receiver => write!(f, "Receiver"),
            DeviceKind::Headset => write!(f, "Headset"),
            DeviceKind::Webcam => write!(f, "Webcam"),
            DeviceKind::SteeringWheel => write!(f, "Steering Wheel"),
            DeviceKind::Joystick => write!(f, "Joystick"),
            DeviceKind::Gamepad => write!(f, "Gamepad"),
            DeviceKind::Dock => write!(f, "Dock"),
            DeviceKind::Speaker => write!(f, "Speaker"),
            DeviceKind::Microphone => write!(f, "Microphone"),
            DeviceKind::Light => write!(f, "Light"),
            DeviceKind::ProgrammableController => write!(f, "Programmable controller"),
            DeviceKind::CarSimPedals => write!(f, "Car Sim Pedals"),
            DeviceKind::Unknown(val) => write!(f, "Unknown ({})", val),
        }
    }
}

/// How far feature enumeration has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationState {
    /// Only the root feature is known
    Unenumerated,
    /// Some features were looked up individually
    PartiallyEnumerated,
    /// Every feature the device exposes has been walked
    FullyEnumerated,
}

/// A discovered device and everything learnt about it during the connection
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Index of the device behind a receiver, 0xFF when addressed directly
    pub sub_index: u8,
    /// Transport PID of the active application entity, known after querying 0x0003
    pub transport_id: Option<u16>,
    pub device_type: Option<DeviceKind>,
    pub link_established: Option<bool>,
    pub interface: HidppInterface,
    pub details: Option<DeviceInfoStruct>,
    features: BTreeMap<u16, FeatureInfo>,
    entities: Vec<FirmwareInfo>,
    fully_enumerated: bool,
}

impl DeviceInfo {
    pub fn new(
        vendor_id: u16,
        product_id: u16,
        interface: HidppInterface,
        name: impl Into<String>,
        sub_index: u8,
    ) -> Self {
        let mut features = BTreeMap::new();
        features.insert(FEATURE_ROOT, FeatureInfo::root());

        Self {
            name: name.into(),
            vendor_id,
            product_id,
            sub_index,
            transport_id: None,
            device_type: None,
            link_established: None,
            interface,
            details: None,
            features,
            entities: Vec::new(),
            fully_enumerated: false,
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceKind) -> Self {
        self.device_type = Some(device_type);
        self
    }

    /// Add a feature; a feature id already present keeps its first entry.
    ///
    /// Returns whether the feature was inserted.
    pub fn add_feature(&mut self, feature: FeatureInfo) -> bool {
        if self.features.contains_key(&feature.id) {
            return false;
        }
        self.features.insert(feature.id, feature);
        true
    }

    pub fn is_enumerated(&self, feature_id: u16) -> bool {
        self.features.contains_key(&feature_id)
    }

    pub fn feature(&self, feature_id: u16) -> Option<&FeatureInfo> {
        self.features.get(&feature_id)
    }

    pub fn feature_index(&self, feature_id: u16) -> Option<u8> {
        self.feature(feature_id).map(|f| f.index)
    }

    /// Reverse lookup of a runtime index
    pub fn feature_at(&self, index: u8) -> Option<&FeatureInfo> {
        self.features.values().find(|f| f.index == index)
    }

    pub fn features(&self) -> impl Iterator<Item = &FeatureInfo> {
        self.features.values()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn mark_fully_enumerated(&mut self) {
        self.fully_enumerated = true;
    }

    pub fn enumeration_state(&self) -> EnumerationState {
        if self.fully_enumerated {
            EnumerationState::FullyEnumerated
        } else if self.features.len() > 1 {
            EnumerationState::PartiallyEnumerated
        } else {
            EnumerationState::Unenumerated
        }
    }

    /// Store the device information block; firmware entities are re-read after this
    pub fn set_device_info(&mut self, details: DeviceInfoStruct) {
        self.details = Some(details);
        self.entities.clear();
    }

    pub fn add_entity_fw_info(&mut self, entity: FirmwareInfo) {
        if entity.entity_type == FirmwareInfo::MAIN_APPLICATION && entity.active {
            self.transport_id = Some(entity.transport_pid);
        }
        self.entities.push(entity);
    }

    pub fn entities(&self) -> &[FirmwareInfo] {
        &self.entities
    }

    pub fn log_features(&self) {
        for feature in self.features.values() {
            info!(
                "idx:id {}:0x{:04X} - eng:{}, obsolete:{}, version:{}",
                feature.index, feature.id, feature.engineering, feature.obsolete, feature.version
            );
        }
    }

    pub fn log_device_info(&self) {
        info!("Device info:");
        if let Some(details) = &self.details {
            info!("Entity cnt: {}", details.entity_count);
            info!("unitId: {:08X}", details.unit_id);
            info!("transport: {:04X}", details.transport);
            info!("modeId: {:02X?}", details.model_id);
            info!("capabilities: {}", details.capabilities);
        }
        info!(
            "VID: {:04X}, PID: {:04X}, TID: {}",
            self.vendor_id,
            self.product_id,
            self.transport_id
                .map_or_else(|| "unknown".to_string(), |tid| format!("{:04X}", tid))
        );
        for entity in &self.entities {
            info!("{}", entity);
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let device_type = self
            .device_type
            .map_or_else(|| "None".to_string(), |t| t.to_string());
        let link = match self.link_established {
            Some(true) => "ON",
            Some(false) => "OFF",
            None => "Unknown",
        };
        write!(
            f,
            "HidppDevice(name={}, vid={:04X}, pid={:04X}, sub_idx={}, type={}, link={})",
            self.name, self.vendor_id, self.product_id, self.sub_index, device_type, link
        )
    }
}
