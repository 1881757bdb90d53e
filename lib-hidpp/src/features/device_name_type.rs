// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::connected_device::ConnectedDevice;
use crate::constants::FEATURE_DEVICE_NAME_TYPE;
use crate::device_info::DeviceKind;

/// Bytes of the name returned per getDeviceName call
const NAME_CHUNK_LEN: usize = 16;

/// Device name and type feature (0x0005)
pub struct DeviceNameType<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> DeviceNameType<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Length of the marketing name in bytes
    pub async fn get_name_count(&self) -> Option<u8> {
        let response = self.device.request(FEATURE_DEVICE_NAME_TYPE, 0, &[]).await?;
        Some(response.params()[0])
    }

    /// Read a name of `count` bytes in 16 byte chunks
    pub async fn get_name(&self, count: u8) -> Option<String> {
        let mut raw = Vec::with_capacity(count as usize + NAME_CHUNK_LEN);
        for chunk in 0..=(count as usize / NAME_CHUNK_LEN) {
            let offset = u8::try_from(chunk * NAME_CHUNK_LEN).ok()?;
            let response = self
                .device
                .request(FEATURE_DEVICE_NAME_TYPE, 1, &[offset, 0, 0])
                .await?;
            raw.extend_from_slice(response.params());
        }

        let name: String = raw.iter().map(|&c| char::from(c)).collect();
        Some(name.trim_end_matches('\0').to_string())
    }

    /// Name count followed by the name itself
    pub async fn get_device_name(&self) -> Option<String> {
        let count = self.get_name_count().await?;
        self.get_name(count).await
    }

    pub async fn get_device_type(&self) -> Option<DeviceKind> {
        let response = self.device.request(FEATURE_DEVICE_NAME_TYPE, 2, &[]).await?;
        let p = response.params();
        Some(DeviceKind::from(u32::from_le_bytes([p[0], p[1], p[2], p[3]])))
    }
}
