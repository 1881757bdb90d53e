// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::connected_device::ConnectedDevice;
use crate::constants::FEATURE_DEVICE_INFORMATION;
use crate::device_info::{DeviceInfoStruct, FirmwareInfo};

/// Device information feature (0x0003)
pub struct DeviceInformation<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> DeviceInformation<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    pub async fn get_device_info(&self) -> Option<DeviceInfoStruct> {
        let response = self
            .device
            .request(FEATURE_DEVICE_INFORMATION, 0, &[0, 0, 0])
            .await?;
        let p = response.params();

        let mut model_id = [0u8; 6];
        model_id.copy_from_slice(&p[7..13]);

        Some(DeviceInfoStruct {
            entity_count: p[0],
            unit_id: u32::from_be_bytes([p[1], p[2], p[3], p[4]]),
            transport: u16::from_be_bytes([p[5], p[6]]),
            model_id,
            capabilities: p[14],
        })
    }

    /// Firmware of entity `entity_index`; the name is three letters and two BCD digits
    pub async fn get_fw_info(&self, entity_index: u8) -> Option<FirmwareInfo> {
        let response = self
            .device
            .request(FEATURE_DEVICE_INFORMATION, 1, &[entity_index, 0, 0])
            .await?;
        let p = response.params();

        let prefix: String = p[1..4].iter().map(|&c| char::from(c)).collect();
        let name = format!("{}{}{}", prefix, p[4] >> 4, p[4] & 0x0F);

        Some(FirmwareInfo {
            entity_index,
            entity_type: p[0],
            name,
            revision: p[5],
            build: u16::from_be_bytes([p[6], p[7]]),
            active: p[8] & 0x01 == 1,
            transport_pid: u16::from_be_bytes([p[9], p[10]]),
        })
    }

    pub async fn get_serial_number(&self) -> Option<String> {
        let response = self
            .device
            .request(FEATURE_DEVICE_INFORMATION, 2, &[0, 0, 0])
            .await?;
        Some(response.params()[..12].iter().map(|&c| char::from(c)).collect())
    }
}
