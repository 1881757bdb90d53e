// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::constants::{
    ERROR_FEATURE_INDEX, HEADER_LEN, LONG_REPORT_ID, LONG_REPORT_LEN, MAX_EVENT_ID,
    NOTIFICATION_SOFTWARE_ID, SHORT_REPORT_ID, SHORT_REPORT_LEN, VERY_LONG_REPORT_ID,
    VERY_LONG_REPORT_LEN,
};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// HID++ frame variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportType {
    Short,
    Long,
    VeryLong,
}

impl ReportType {
    pub fn report_id(self) -> u8 {
        match self {
            ReportType::Short => SHORT_REPORT_ID,
            ReportType::Long => LONG_REPORT_ID,
            ReportType::VeryLong => VERY_LONG_REPORT_ID,
        }
    }

    /// Total length of a frame of this type, header included
    pub fn len(self) -> usize {
        match self {
            ReportType::Short => SHORT_REPORT_LEN,
            ReportType::Long => LONG_REPORT_LEN,
            ReportType::VeryLong => VERY_LONG_REPORT_LEN,
        }
    }

    /// Number of parameter bytes a frame of this type carries
    pub fn capacity(self) -> usize {
        self.len() - HEADER_LEN
    }

    /// Smallest report type able to carry `payload_len` parameter bytes
    pub fn for_payload(payload_len: usize) -> Result<Self, FrameError> {
        [ReportType::Short, ReportType::Long, ReportType::VeryLong]
            .into_iter()
            .find(|t| payload_len <= t.capacity())
            .ok_or(FrameError::PayloadTooLong {
                report_type: ReportType::VeryLong,
                len: payload_len,
                capacity: ReportType::VeryLong.capacity(),
            })
    }
}

impl TryFrom<u8> for ReportType {
    type Error = FrameError;

    fn try_from(report_id: u8) -> Result<Self, Self::Error> {
        match report_id {
            SHORT_REPORT_ID => Ok(ReportType::Short),
            LONG_REPORT_ID => Ok(ReportType::Long),
            VERY_LONG_REPORT_ID => Ok(ReportType::VeryLong),
            other => Err(FrameError::UnknownReportType(other)),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Short => write!(f, "SHORT"),
            ReportType::Long => write!(f, "LONG"),
            ReportType::VeryLong => write!(f, "VERY LONG"),
        }
    }
}

/// Errors that can occur when building or parsing a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Empty buffer")]
    Empty,

    #[error("Unknown report type: {0:#04x}")]
    UnknownReportType(u8),

    #[error("Payload of {len} bytes does not fit a {report_type} report (capacity {capacity})")]
    PayloadTooLong {
        report_type: ReportType,
        len: usize,
        capacity: usize,
    },

    #[error("{field} does not fit in a nibble: {value:#x}")]
    NibbleOverflow { field: &'static str, value: u8 },
}

/// A HID++ frame.
///
/// Requests, responses and notifications share the same layout; a frame is
/// only interpreted as one or the other by where it travels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub report_type: ReportType,
    pub device_index: u8,
    pub feature_index: u8,
    pub function: u8,
    pub software_id: u8,
    params: Vec<u8>,
}

/// A frame received from the device
pub type Response = Request;

impl Request {
    /// Build a frame, zero-padding `params` to the capacity of `report_type`
    pub fn new(
        report_type: ReportType,
        device_index: u8,
        feature_index: u8,
        function: u8,
        software_id: u8,
        params: &[u8],
    ) -> Result<Self, FrameError> {
        if function > 0x0F {
            return Err(FrameError::NibbleOverflow {
                field: "function",
                value: function,
            });
        }
        if software_id > 0x0F {
            return Err(FrameError::NibbleOverflow {
                field: "software id",
                value: software_id,
            });
        }
        if params.len() > report_type.capacity() {
            return Err(FrameError::PayloadTooLong {
                report_type,
                len: params.len(),
                capacity: report_type.capacity(),
            });
        }

        let mut padded = params.to_vec();
        padded.resize(report_type.capacity(), 0);

        Ok(Self {
            report_type,
            device_index,
            feature_index,
            function,
            software_id,
            params: padded,
        })
    }

    /// Build a frame using the smallest report type that fits `params`
    pub fn with_payload(
        device_index: u8,
        feature_index: u8,
        function: u8,
        software_id: u8,
        params: &[u8],
    ) -> Result<Self, FrameError> {
        let report_type = ReportType::for_payload(params.len())?;
        Self::new(
            report_type,
            device_index,
            feature_index,
            function,
            software_id,
            params,
        )
    }

    /// Parse a frame; the report type is taken from the first byte.
    ///
    /// Buffers shorter than the report are zero-extended, longer ones are cut.
    pub fn from_buffer(buffer: &[u8]) -> Result<Self, FrameError> {
        let report_id = *buffer.first().ok_or(FrameError::Empty)?;
        let report_type = ReportType::try_from(report_id)?;

        let mut frame = buffer[..buffer.len().min(report_type.len())].to_vec();
        frame.resize(report_type.len(), 0);

        Ok(Self {
            report_type,
            device_index: frame[1],
            feature_index: frame[2],
            function: frame[3] >> 4,
            software_id: frame[3] & 0x0F,
            params: frame[HEADER_LEN..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.report_type.len());
        buffer.put_u8(self.report_type.report_id());
        buffer.put_u8(self.device_index);
        buffer.put_u8(self.feature_index);
        buffer.put_u8((self.function << 4) | self.software_id);
        buffer.put_slice(&self.params);
        buffer.freeze()
    }

    pub fn to_buffer(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    /// Copy of this frame rewritten as a larger report type.
    ///
    /// Promoting to the same or a smaller type returns an unchanged copy.
    pub fn promoted(&self, target: ReportType) -> Self {
        if target <= self.report_type {
            return self.clone();
        }
        let mut params = self.params.clone();
        params.resize(target.capacity(), 0);
        Self {
            report_type: target,
            params,
            ..self.clone()
        }
    }

    pub fn params(&self) -> &[u8] {
        &self.params
    }

    /// Unsolicited frame: reserved software id and a function in the event range
    pub fn is_notification(&self) -> bool {
        self.software_id == NOTIFICATION_SOFTWARE_ID && self.function <= MAX_EVENT_ID
    }

    /// Event id of a notification
    pub fn event_id(&self) -> u8 {
        self.function
    }

    /// Device reported a protocol error for a previous request
    pub fn is_error(&self) -> bool {
        self.feature_index == ERROR_FEATURE_INDEX
    }

    /// Feature index of the request that failed, for error responses
    pub fn error_feature_index(&self) -> Option<u8> {
        self.is_error()
            .then_some((self.function << 4) | self.software_id)
    }

    /// Error code reported by the device, for error responses
    pub fn error_code(&self) -> Option<u8> {
        self.is_error().then(|| self.params[1])
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{ idx: {:#04x}, feature: {:#04x}, fct: {}, sw id: {:#x}, params: {:02x?} }}",
            self.report_type,
            self.device_index,
            self.feature_index,
            self.function,
            self.software_id,
            self.params
        )
    }
}

/// Whether `response` answers `request`.
///
/// Matches on feature index, function and software id. An error response
/// matches when its packed function/software id equals the request's feature
/// index.
pub fn is_response(request: &Request, response: &Response) -> bool {
    if response.error_feature_index() == Some(request.feature_index) {
        return true;
    }

    request.feature_index == response.feature_index
        && request.function == response.function
        && request.software_id == response.software_id
}
