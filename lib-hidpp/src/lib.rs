// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! # HID++ 2.0 protocol library
//!
//! This library talks to HID++ 2.0 devices, including:
//! - Frame encoding and decoding
//! - Discovery of the HID++ interfaces of a vendor's devices
//! - Async request/response correlation next to notification callbacks
//! - Feature enumeration and typed feature wrappers
//! - Firmware update support

pub mod connected_device;
pub mod constants;
pub mod device_info;
pub mod dfu;
pub mod discovery;
pub mod features;
pub mod mock;
pub mod notification;
pub mod options;
pub mod request;
pub mod transport;

// Re-export commonly used types
pub use connected_device::ConnectedDevice;
pub use constants::*;
pub use device_info::{
    DeviceInfo, DeviceInfoStruct, DeviceKind, EnumerationState, FeatureInfo, FirmwareInfo,
};
pub use dfu::{DfuController, DfuError, DfuFile};
pub use discovery::{get_interfaces, group_interfaces, list_devices};
pub use features::{BatteryState, Features};
pub use notification::{LinkEvent, NotificationKey};
pub use options::{ConnectionOptions, PumpMode};
pub use request::{is_response, FrameError, ReportType, Request, Response};
pub use transport::{EndpointInfo, HidApiBackend, HidBackend, HidError, HidHandle, HidppInterface};
