// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::connected_device::ConnectedDevice;
use crate::constants::FEATURE_ROOT;
use crate::device_info::FeatureInfo;
use log::warn;

/// Root feature (0x0000), always at index 0
pub struct Root<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> Root<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Look up the runtime index of `feature_id`.
    ///
    /// An index of 0 in the result means the device does not support the feature.
    pub async fn get_feature(&self, feature_id: u16) -> Option<FeatureInfo> {
        let [hi, lo] = feature_id.to_be_bytes();
        // the root is always in the directory, so no enumeration is needed
        let response = self.device.call(FEATURE_ROOT, 0, &[hi, lo, 0]).await?;
        let params = response.params();

        if params[0] == 0 {
            warn!("Feature id 0x{:04X} not found", feature_id);
            return Some(FeatureInfo::new(feature_id, 0, false, false, 0));
        }
        Some(FeatureInfo::from_type_flags(
            feature_id, params[0], params[1], params[2],
        ))
    }

    /// Protocol version request; the device echoes `data`.
    ///
    /// Returns the protocol number, target software and echoed byte.
    pub async fn ping(&self, data: u8) -> Option<(u8, u8, u8)> {
        let response = self.device.call(FEATURE_ROOT, 1, &[0, 0, data]).await?;
        let params = response.params();
        Some((params[0], params[1], params[2]))
    }
}
