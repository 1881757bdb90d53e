// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

mod config;
mod logging;
mod manager;

pub use config::*;
pub use logging::*;
pub use manager::*;
