// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Typed wrappers around individual HID++ 2.0 features.
//!
//! Each wrapper borrows the connection, resolves its feature id through the
//! device's feature directory (enumerating it on first use) and turns
//! responses into typed values. A missing, failed or unanswered call is
//! reported as `None`.

mod battery;
mod calibration;
mod device_information;
mod device_name_type;
mod dfu;
mod feature_set;
mod root;

pub use battery::{
    BatteryLevel, BatteryLevelStatus, BatteryLevelStatusFeature, BatteryState,
    BatteryVoltageFeature, BatteryVoltageInfo, ChargingStatus, UnifiedBatteryFeature,
    UnifiedBatteryStatus,
};
pub use calibration::{Calibration, CalibrationStatus, CALIBRATION_COMPLETE_EVENT};
pub use device_information::DeviceInformation;
pub use device_name_type::DeviceNameType;
pub use dfu::{Dfu, DfuControl, RESTART_ALL_ENTITIES};
pub use feature_set::FeatureSet;
pub use root::Root;

use crate::connected_device::ConnectedDevice;

/// Entry point to the feature wrappers of a connection
#[derive(Clone, Copy)]
pub struct Features<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> Features<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    pub fn root(&self) -> Root<'a> {
        Root::new(self.device)
    }

    pub fn feature_set(&self) -> FeatureSet<'a> {
        FeatureSet::new(self.device)
    }

    pub fn device_information(&self) -> DeviceInformation<'a> {
        DeviceInformation::new(self.device)
    }

    pub fn device_name_type(&self) -> DeviceNameType<'a> {
        DeviceNameType::new(self.device)
    }

    pub fn battery_level_status(&self) -> BatteryLevelStatusFeature<'a> {
        BatteryLevelStatusFeature::new(self.device)
    }

    pub fn battery_voltage(&self) -> BatteryVoltageFeature<'a> {
        BatteryVoltageFeature::new(self.device)
    }

    pub fn unified_battery(&self) -> UnifiedBatteryFeature<'a> {
        UnifiedBatteryFeature::new(self.device)
    }

    pub fn calibration(&self) -> Calibration<'a> {
        Calibration::new(self.device)
    }

    pub fn dfu(&self) -> Dfu<'a> {
        Dfu::new(self.device)
    }

    pub fn dfu_control(&self) -> DfuControl<'a> {
        DfuControl::new(self.device)
    }
}
