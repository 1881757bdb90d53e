// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Battery features: level status (0x1000), voltage (0x1001) and unified
//! battery (0x1004).

use crate::connected_device::ConnectedDevice;
use crate::constants::{
    FEATURE_BATTERY_LEVEL_STATUS, FEATURE_BATTERY_VOLTAGE, FEATURE_UNIFIED_BATTERY,
};
use serde::Serialize;

/// Battery level reported by 0x1000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryLevelStatus {
    pub discharge_level: u8,
    pub discharge_next_level: u8,
    pub status: u8,
}

/// Battery voltage and charger state reported by 0x1001
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryVoltageInfo {
    /// Millivolts
    pub voltage: u16,
    pub external_power: bool,
    pub critical: bool,
    pub slow_charge: bool,
    pub fast_charge: bool,
    pub charge_status: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryLevel {
    Critical,
    Low,
    Good,
    Full,
    Unknown(u8),
}

impl From<u8> for BatteryLevel {
    fn from(val: u8) -> Self {
        match val {
            1 => BatteryLevel::Critical,
            2 => BatteryLevel::Low,
            4 => BatteryLevel::Good,
            8 => BatteryLevel::Full,
            other => BatteryLevel::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChargingStatus {
    Discharging,
    Charging,
    ChargingSlow,
    ChargeComplete,
    ChargeError,
    Unknown(u8),
}

impl From<u8> for ChargingStatus {
    fn from(val: u8) -> Self {
        match val {
            0 => ChargingStatus::Discharging,
            1 => ChargingStatus::Charging,
            2 => ChargingStatus::ChargingSlow,
            3 => ChargingStatus::ChargeComplete,
            4 => ChargingStatus::ChargeError,
            other => ChargingStatus::Unknown(other),
        }
    }
}

/// Status reported by 0x1004; later feature versions add fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnifiedBatteryStatus {
    pub state_of_charge: u8,
    pub battery_level: BatteryLevel,
    pub charging_status: ChargingStatus,
    pub external_power_status: u8,
    /// Version 4 and later
    pub fast_charging: Option<u8>,
    /// Version 5 and later
    pub removable_battery_status: Option<u8>,
}

impl UnifiedBatteryStatus {
    pub fn from_params(params: &[u8], version: u8) -> Self {
        Self {
            state_of_charge: params[0],
            battery_level: BatteryLevel::from(params[1]),
            charging_status: ChargingStatus::from(params[2]),
            external_power_status: params[3],
            fast_charging: (version >= 4).then_some(params[4]),
            removable_battery_status: (version >= 5).then_some(params[5]),
        }
    }
}

/// Result of [`ConnectedDevice::get_battery_state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryState {
    Unified(UnifiedBatteryStatus),
    Voltage(BatteryVoltageInfo),
    LevelStatus(BatteryLevelStatus),
}

pub struct BatteryLevelStatusFeature<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> BatteryLevelStatusFeature<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    pub async fn get_level_status(&self) -> Option<BatteryLevelStatus> {
        let response = self
            .device
            .request(FEATURE_BATTERY_LEVEL_STATUS, 0, &[])
            .await?;
        let p = response.params();
        Some(BatteryLevelStatus {
            discharge_level: p[0],
            discharge_next_level: p[1],
            status: p[2],
        })
    }
}

pub struct BatteryVoltageFeature<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> BatteryVoltageFeature<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    pub async fn get_battery_info(&self) -> Option<BatteryVoltageInfo> {
        let response = self.device.request(FEATURE_BATTERY_VOLTAGE, 0, &[]).await?;
        let p = response.params();
        let flags = p[2];
        Some(BatteryVoltageInfo {
            voltage: u16::from_be_bytes([p[0], p[1]]),
            external_power: (flags >> 7) & 0x01 == 1,
            critical: (flags >> 5) & 0x01 == 1,
            slow_charge: (flags >> 4) & 0x01 == 1,
            fast_charge: (flags >> 3) & 0x01 == 1,
            charge_status: flags & 0b111,
        })
    }
}

pub struct UnifiedBatteryFeature<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> UnifiedBatteryFeature<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Fields are decoded according to the feature version in the directory
    pub async fn get_status(&self) -> Option<UnifiedBatteryStatus> {
        let response = self.device.request(FEATURE_UNIFIED_BATTERY, 1, &[]).await?;
        let version = self
            .device
            .feature(FEATURE_UNIFIED_BATTERY)
            .await
            .map_or(0, |f| f.version);
        Some(UnifiedBatteryStatus::from_params(response.params(), version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_status_by_version() {
        let params = [80, 4, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

        let v3 = UnifiedBatteryStatus::from_params(&params, 3);
        assert_eq!(v3.state_of_charge, 80);
        assert_eq!(v3.battery_level, BatteryLevel::Good);
        assert_eq!(v3.charging_status, ChargingStatus::Charging);
        assert_eq!(v3.fast_charging, None);
        assert_eq!(v3.removable_battery_status, None);

        let v5 = UnifiedBatteryStatus::from_params(&params, 5);
        assert_eq!(v5.fast_charging, Some(1));
        assert_eq!(v5.removable_battery_status, Some(0));
    }

    #[test]
    fn test_unknown_levels_are_kept() {
        assert_eq!(BatteryLevel::from(3), BatteryLevel::Unknown(3));
        assert_eq!(ChargingStatus::from(9), ChargingStatus::Unknown(9));
    }
}
