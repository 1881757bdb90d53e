// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::constants::{
    DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_SOFTWARE_ID, MAX_CORRELATION_ATTEMPTS, POLL_INTERVAL_US,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the send and receive loops are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpMode {
    /// One receive task and one send task
    Split,
    /// A single task alternating between sending and receiving on the long endpoint
    Combined,
}

impl Default for PumpMode {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            PumpMode::Combined
        } else {
            PumpMode::Split
        }
    }
}

/// Per-connection tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub software_id: u8,
    pub response_timeout_ms: u64,
    pub poll_interval_us: u64,
    pub max_correlation_attempts: usize,
    pub pump_mode: PumpMode,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            software_id: DEFAULT_SOFTWARE_ID,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            poll_interval_us: POLL_INTERVAL_US,
            max_correlation_attempts: MAX_CORRELATION_ATTEMPTS,
            pump_mode: PumpMode::default(),
        }
    }
}

impl ConnectionOptions {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    pub fn with_pump_mode(mut self, pump_mode: PumpMode) -> Self {
        self.pump_mode = pump_mode;
        self
    }

    pub fn with_response_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.response_timeout_ms = timeout_ms;
        self
    }
}
