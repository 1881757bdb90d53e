// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::connected_device::ConnectedDevice;
use crate::constants::FEATURE_CALIBRATION;
use log::{info, warn};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

/// Notification sent when a calibration run has finished
pub const CALIBRATION_COMPLETE_EVENT: u8 = 0;

/// Outcome reported with [`CALIBRATION_COMPLETE_EVENT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    Fail,
    Success,
    Unknown(u8),
}

impl From<u8> for CalibrationStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => CalibrationStatus::Fail,
            1 => CalibrationStatus::Success,
            other => CalibrationStatus::Unknown(other),
        }
    }
}

/// Calibration feature (0x8128)
pub struct Calibration<'a> {
    device: &'a ConnectedDevice,
}

impl<'a> Calibration<'a> {
    pub fn new(device: &'a ConnectedDevice) -> Self {
        Self { device }
    }

    /// Start a calibration run and wait up to `wait` for its completion event.
    ///
    /// Every call listens on its own channel; the callback is removed again
    /// before returning.
    pub async fn start_calibration(&self, wait: Duration) -> Option<CalibrationStatus> {
        if !self.device.enumerate_feature(FEATURE_CALIBRATION).await {
            return None;
        }

        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let registered = self
            .device
            .register_notification(
                FEATURE_CALIBRATION,
                CALIBRATION_COMPLETE_EVENT,
                move |frame, _timestamp| {
                    let sender = tx.lock().ok().and_then(|mut slot| slot.take());
                    if let Some(sender) = sender {
                        let _ = sender.send(CalibrationStatus::from(frame.params()[0]));
                    }
                },
            )
            .await;
        if !registered {
            return None;
        }

        let status = match self.device.call(FEATURE_CALIBRATION, 0, &[]).await {
            Some(_) => match timeout(wait, rx).await {
                Ok(Ok(status)) => {
                    info!("Calibration finished: {:?}", status);
                    Some(status)
                }
                _ => {
                    warn!("Calibration did not complete within {:?}", wait);
                    None
                }
            },
            None => {
                warn!("Calibration start was not acknowledged");
                None
            }
        };

        self.device
            .unregister_notification(FEATURE_CALIBRATION, CALIBRATION_COMPLETE_EVENT)
            .await;
        status
    }

    pub async fn is_calibrated(&self) -> Option<bool> {
        let response = self.device.request(FEATURE_CALIBRATION, 1, &[]).await?;
        Some(response.params()[0] != 0)
    }
}
