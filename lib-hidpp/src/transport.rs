// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Platform HID access.
//!
//! The rest of the crate only sees [`HidBackend`] and [`HidHandle`]; closing a
//! handle is dropping it.

use hidapi::{HidApi, HidDevice as RawHidDevice};
use log::debug;
use serde::Serialize;
use std::ffi::CString;
use std::fmt;

/// Errors that can occur with HID operations
#[derive(Debug, thiserror::Error)]
pub enum HidError {
    #[error("Failed to open endpoint {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Failed to write to device: {0}")]
    WriteFailed(String),

    #[error("Failed to read from device: {0}")]
    ReadFailed(String),

    #[error("HID API error: {0}")]
    HidApiError(String),
}

/// One enumerated HID collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub usage: u16,
    pub product_string: String,
}

impl fmt::Display for EndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{vid={:04X}, pid={:04X}}}", self.vendor_id, self.product_id)
    }
}

/// The HID++ endpoints of one physical interface.
///
/// BLE devices expose no short endpoint; only some devices expose an
/// extra-long one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HidppInterface {
    pub short: Option<EndpointInfo>,
    pub long: EndpointInfo,
    pub extra_long: Option<EndpointInfo>,
}

impl HidppInterface {
    pub fn new(
        short: Option<EndpointInfo>,
        long: EndpointInfo,
        extra_long: Option<EndpointInfo>,
    ) -> Self {
        Self {
            short,
            long,
            extra_long,
        }
    }

    pub fn has_short(&self) -> bool {
        self.short.is_some()
    }

    pub fn has_extra_long(&self) -> bool {
        self.extra_long.is_some()
    }
}

impl fmt::Display for HidppInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = |endpoint: &Option<EndpointInfo>| match endpoint {
            Some(e) => e.to_string(),
            None => "None".to_string(),
        };
        write!(
            f,
            "HidppInterface(short={}, long={}, xlong={})",
            repr(&self.short),
            self.long,
            repr(&self.extra_long)
        )
    }
}

/// An open HID endpoint
pub trait HidHandle: Send {
    /// Read one report. `Ok(0)` means nothing was available within `timeout_ms`.
    fn read(&mut self, buffer: &mut [u8], timeout_ms: i32) -> Result<usize, HidError>;

    fn write(&mut self, data: &[u8]) -> Result<usize, HidError>;
}

/// Access to the platform HID layer
pub trait HidBackend: Send + Sync {
    /// List the collections exposed by devices of `vendor_id`
    fn enumerate(&self, vendor_id: u16) -> Result<Vec<EndpointInfo>, HidError>;

    fn open(&self, endpoint: &EndpointInfo) -> Result<Box<dyn HidHandle>, HidError>;
}

/// [`HidBackend`] on top of `hidapi`
#[derive(Debug, Default, Clone, Copy)]
pub struct HidApiBackend;

impl HidApiBackend {
    pub fn new() -> Self {
        Self
    }
}

impl HidBackend for HidApiBackend {
    fn enumerate(&self, vendor_id: u16) -> Result<Vec<EndpointInfo>, HidError> {
        let api = HidApi::new().map_err(|e| HidError::HidApiError(e.to_string()))?;

        let endpoints = api
            .device_list()
            .filter(|d| d.vendor_id() == vendor_id)
            .filter(|d| d.usage() != 0 && d.usage_page() != 0 && !d.path().is_empty())
            .map(|d| EndpointInfo {
                path: d.path().to_string_lossy().into_owned(),
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                usage_page: d.usage_page(),
                usage: d.usage(),
                product_string: d.product_string().unwrap_or_default().to_string(),
            })
            .collect::<Vec<_>>();

        debug!("Enumerated {} endpoints for vendor {:04X}", endpoints.len(), vendor_id);
        Ok(endpoints)
    }

    fn open(&self, endpoint: &EndpointInfo) -> Result<Box<dyn HidHandle>, HidError> {
        let open_failed = |reason: String| HidError::OpenFailed {
            path: endpoint.path.clone(),
            reason,
        };

        let api = HidApi::new().map_err(|e| HidError::HidApiError(e.to_string()))?;
        let path = CString::new(endpoint.path.as_str()).map_err(|e| open_failed(e.to_string()))?;
        let device = api
            .open_path(&path)
            .map_err(|e| open_failed(e.to_string()))?;
        device
            .set_blocking_mode(false)
            .map_err(|e| open_failed(e.to_string()))?;

        debug!("Opened endpoint {}", endpoint.path);
        Ok(Box::new(HidApiHandle { device }))
    }
}

struct HidApiHandle {
    device: RawHidDevice,
}

impl HidHandle for HidApiHandle {
    fn read(&mut self, buffer: &mut [u8], timeout_ms: i32) -> Result<usize, HidError> {
        self.device
            .read_timeout(buffer, timeout_ms)
            .map_err(|e| HidError::ReadFailed(e.to_string()))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, HidError> {
        self.device
            .write(data)
            .map_err(|e| HidError::WriteFailed(e.to_string()))
    }
}
