// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Firmware update over feature 0x00D0.
//!
//! The device must already run its bootloader (see
//! [`crate::features::DfuControl::start_dfu`]). The image is sent line by
//! line; every line is acknowledged with a status byte.

use crate::connected_device::ConnectedDevice;
use crate::constants::{DFU_LINE_SIZE, DFU_MAX_RESENDS, DFU_WAIT_SLEEP_MS, FEATURE_DFU};
use crate::features::Dfu;
use crate::request::Response;
use log::{debug, error, info, warn};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

/// Line accepted, send the next one
const STATUS_NEXT: u8 = 1;
/// Device is busy, the status will follow
const STATUS_WAIT: u8 = 3;
/// Update finished successfully
const STATUS_SUCCESS: [u8; 3] = [2, 5, 6];

/// Longest magic string in the image header
const MAGIC_MAX_LEN: usize = 10;

/// Errors during a firmware update
#[derive(Debug, thiserror::Error)]
pub enum DfuError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("DFU image shorter than one line")]
    EmptyFile,

    #[error("DFU feature not available on the device")]
    FeatureUnavailable,

    #[error("Device rejected line {line} with status {status}")]
    Device { line: usize, status: u8 },

    #[error("No acknowledge for line {line}")]
    Timeout { line: usize },
}

/// A DFU image split into 16 byte lines; line 0 is the header
#[derive(Debug, Clone)]
pub struct DfuFile {
    content: Vec<u8>,
    pub entity_index: u8,
    pub encrypt: u8,
    pub magic: String,
    pub flag: u8,
    pub security_level: u8,
}

impl DfuFile {
    pub fn from_bytes(content: Vec<u8>) -> Result<Self, DfuError> {
        if content.len() < DFU_LINE_SIZE {
            return Err(DfuError::EmptyFile);
        }

        let header = &content[..DFU_LINE_SIZE];
        let magic = header[2..2 + MAGIC_MAX_LEN]
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| char::from(c))
            .collect();

        Ok(Self {
            entity_index: header[0],
            encrypt: header[1],
            magic,
            flag: header[12],
            security_level: header[13],
            content,
        })
    }

    pub fn open(path: &Path) -> Result<Self, DfuError> {
        let content = std::fs::read(path)?;
        let file = Self::from_bytes(content)?;
        debug!("Loaded DFU image {} ({} lines)", path.display(), file.line_count());
        Ok(file)
    }

    /// Number of complete lines; trailing bytes are ignored
    pub fn line_count(&self) -> usize {
        self.content.len() / DFU_LINE_SIZE
    }

    pub fn line(&self, index: usize) -> &[u8] {
        &self.content[index * DFU_LINE_SIZE..(index + 1) * DFU_LINE_SIZE]
    }

    pub fn log_info(&self) {
        info!("DFU info:");
        info!("Entity: {}", self.entity_index);
        info!("magicStr: {}", self.magic);
        info!("flag: {}", self.flag);
        info!("securLvl: {}", self.security_level);
        info!("Size: {} bytes", self.line_count() * DFU_LINE_SIZE);
    }
}

fn describe_status(status: u8) -> &'static str {
    match status {
        4 => "generic error",
        16 => "unknown error",
        18 => "unsupported entity",
        20 | 148 => "bad magic string",
        _ => "error",
    }
}

/// Status byte of a DFU response; a missing response counts as wait
fn response_status(response: Option<&Response>) -> u8 {
    response
        .and_then(|r| r.params().get(4).copied())
        .unwrap_or(STATUS_WAIT)
}

/// Sends a [`DfuFile`] to a connected device
pub struct DfuController<'a> {
    device: &'a ConnectedDevice,
    file: DfuFile,
}

impl<'a> DfuController<'a> {
    pub fn new(device: &'a ConnectedDevice, file: DfuFile) -> Self {
        Self { device, file }
    }

    pub fn file(&self) -> &DfuFile {
        &self.file
    }

    async fn send_line(&self, dfu: &Dfu<'_>, line: usize, sequence: u8) -> Option<Response> {
        let data = self.file.line(line);
        if line == 0 {
            dfu.dfu_start(data).await
        } else {
            dfu.dfu_cmd_data(sequence, data).await
        }
    }

    /// Send every line of the image.
    ///
    /// A line without an answer is resent after `resend_timeout`. `progress`
    /// is called with the line just acknowledged and the line count. With
    /// `restart` the updated entity is restarted at the end.
    pub async fn perform<F>(
        &self,
        resend_timeout: Duration,
        restart: bool,
        mut progress: F,
    ) -> Result<(), DfuError>
    where
        F: FnMut(usize, usize),
    {
        if !self.device.enumerate_feature(FEATURE_DFU).await {
            return Err(DfuError::FeatureUnavailable);
        }

        let dfu = self.device.features().dfu();
        let total = self.file.line_count();
        let wait = Duration::from_millis(DFU_WAIT_SLEEP_MS);
        let mut sequence = 0u8;

        info!("Starting DFU of {} lines", total);
        for line in 0..total {
            let mut response = self.send_line(&dfu, line, sequence).await;
            let mut waited = Duration::ZERO;
            let mut resends = 0;

            loop {
                let status = response_status(response.as_ref());
                if status == STATUS_NEXT || STATUS_SUCCESS.contains(&status) {
                    break;
                }
                if status != STATUS_WAIT {
                    error!(
                        "DFU {} on line {}: {:02x?}",
                        describe_status(status),
                        line,
                        response.as_ref().map(|r| r.params())
                    );
                    return Err(DfuError::Device { line, status });
                }

                sleep(wait).await;
                response = self.device.next_inbound().await;
                waited += wait;

                if waited > resend_timeout {
                    resends += 1;
                    if resends > DFU_MAX_RESENDS {
                        return Err(DfuError::Timeout { line });
                    }
                    warn!("Timeout, resending line {}", line);
                    response = self.send_line(&dfu, line, sequence).await;
                    waited = Duration::ZERO;
                }
            }

            progress(line, total);
            sequence = (sequence + 1) % 4;
        }

        if restart {
            dfu.restart(self.file.entity_index).await;
        }
        info!("DFU done");
        Ok(())
    }
}
