// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::connected_device::ConnectedDevice;
use crate::constants::FEATURE_SET;
use crate::device_info::FeatureInfo;

/// Feature set (0x0001): walks the features by index
pub struct FeatureSet<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> FeatureSet<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Number of features, the root excluded
    pub async fn get_count(&self) -> Option<u8> {
        let response = self.device.request(FEATURE_SET, 0, &[0, 0, 0]).await?;
        Some(response.params()[0])
    }

    pub async fn get_feature_id(&self, index: u8) -> Option<FeatureInfo> {
        let response = self.device.request(FEATURE_SET, 1, &[index, 0, 0]).await?;
        let params = response.params();
        let feature_id = u16::from_be_bytes([params[0], params[1]]);
        Some(FeatureInfo::from_type_flags(
            feature_id, index, params[2], params[3],
        ))
    }
}
