// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

/// Report ID of a short (7 byte) HID++ frame
pub const SHORT_REPORT_ID: u8 = 0x10;

/// Report ID of a long (20 byte) HID++ frame
pub const LONG_REPORT_ID: u8 = 0x11;

/// Report ID of a very long (64 byte) HID++ frame
pub const VERY_LONG_REPORT_ID: u8 = 0x12;

pub const SHORT_REPORT_LEN: usize = 7;
pub const LONG_REPORT_LEN: usize = 20;
pub const VERY_LONG_REPORT_LEN: usize = 64;

/// Report ID, device index, feature index and function/software id
pub const HEADER_LEN: usize = 4;

/// Device index used to talk to a device directly (not through a receiver)
pub const DEVICE_INDEX_DIRECT: u8 = 0xFF;

/// Feature index carried by error responses
pub const ERROR_FEATURE_INDEX: u8 = 0xFF;

/// Software id stamped on requests unless configured otherwise
pub const DEFAULT_SOFTWARE_ID: u8 = 0x0F;

/// Software id the device uses for unsolicited frames
pub const NOTIFICATION_SOFTWARE_ID: u8 = 0x00;

/// Highest function number that is an event id when sent unsolicited
pub const MAX_EVENT_ID: u8 = 0x0F;

/// Feature index of the receiver's link status notification
pub const LINK_STATUS_FEATURE_INDEX: u8 = 0x41;

/// Bit of params[0] set in a link status notification when the link is lost
pub const LINK_LOST_BIT: u8 = 6;

/// Number of extra waits the correlator allows for notifications racing a response
pub const MAX_CORRELATION_ATTEMPTS: usize = 10;

/// Response timeout for feature calls in milliseconds
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 1000;

/// Response timeout for raw frames in milliseconds
pub const RAW_REQUEST_TIMEOUT_MS: u64 = 200;

/// Sleep between pump iterations in microseconds
pub const POLL_INTERVAL_US: u64 = 200;

pub const LOGITECH_VENDOR_ID: u16 = 0x046D;

/// Vendor usage page of the legacy HID++ collections
pub const USAGE_PAGE_LEGACY: u16 = 0xFF00;

/// Vendor usage page of the HID++ collections advertising their capabilities
pub const USAGE_PAGE_MODERN: u16 = 0xFF43;

pub const FEATURE_ROOT: u16 = 0x0000;
pub const FEATURE_SET: u16 = 0x0001;
pub const FEATURE_DEVICE_INFORMATION: u16 = 0x0003;
pub const FEATURE_DEVICE_NAME_TYPE: u16 = 0x0005;
pub const FEATURE_DFU_CONTROL: u16 = 0x00C2;
pub const FEATURE_DFU: u16 = 0x00D0;
pub const FEATURE_BATTERY_LEVEL_STATUS: u16 = 0x1000;
pub const FEATURE_BATTERY_VOLTAGE: u16 = 0x1001;
pub const FEATURE_UNIFIED_BATTERY: u16 = 0x1004;
pub const FEATURE_CALIBRATION: u16 = 0x8128;

/// Size of one line of a DFU image
pub const DFU_LINE_SIZE: usize = 16;

/// Sleep while polling for a pending DFU response in milliseconds
pub const DFU_WAIT_SLEEP_MS: u64 = 1;

/// Number of times a DFU line is resent before the update is abandoned
pub const DFU_MAX_RESENDS: usize = 5;
