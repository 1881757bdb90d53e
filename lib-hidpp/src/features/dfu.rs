// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::connected_device::ConnectedDevice;
use crate::constants::{FEATURE_DFU, FEATURE_DFU_CONTROL};
use crate::request::Response;

/// Entity index addressing the whole device on restart
pub const RESTART_ALL_ENTITIES: u8 = 0xFF;

/// Firmware update feature (0x00D0)
pub struct Dfu<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> Dfu<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Send one image line; `sequence` (0..=3) is the function number
    pub async fn dfu_cmd_data(&self, sequence: u8, data: &[u8]) -> Option<Response> {
        self.device.request(FEATURE_DFU, sequence & 0x03, data).await
    }

    /// Send the image header line
    pub async fn dfu_start(&self, data: &[u8]) -> Option<Response> {
        self.device.request(FEATURE_DFU, 4, data).await
    }

    /// Restart into `entity_index`; the device reboots so no response is awaited
    pub async fn restart(&self, entity_index: u8) -> bool {
        let mut params = [0u8; 16];
        params[0] = entity_index;
        self.device.request_no_reply(FEATURE_DFU, 5, &params).await
    }
}

/// DFU control feature (0x00C2)
pub struct DfuControl<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> DfuControl<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Ask the device to reboot into its bootloader; no response is awaited
    pub async fn start_dfu(&self) -> bool {
        let params = [1, 0, 0, 0, b'D', b'F', b'U'];
        self.device
            .request_no_reply(FEATURE_DFU_CONTROL, 1, &params)
            .await
    }
}
