// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::config::LoggingConfig;
use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;

pub fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("Invalid log level: {}", level))
}

/// Install the process wide logger.
///
/// `RUST_LOG` overrides the configured levels. Returns `false` when a logger
/// was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(parse_level(&config.level)?);
    for (module, level) in &config.submodules {
        builder.filter_module(module, parse_level(level)?);
    }
    builder.parse_default_env();

    if let Some(path) = &config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    Ok(builder.try_init().is_ok())
}
