// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Discovery and connection of HID++ devices of one vendor

use crate::config::Config;
use anyhow::{Context, Result};
use hidpp::{
    get_interfaces, list_devices, ConnectedDevice, ConnectionOptions, DeviceInfo, DeviceKind,
    HidBackend, DEVICE_INDEX_DIRECT,
};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub struct DevicesManager {
    backend: Arc<dyn HidBackend>,
    vendor_id: u16,
    device_type: Option<DeviceKind>,
    options: ConnectionOptions,
    devices: Vec<DeviceInfo>,
    /// Long endpoint paths of the connections handed out and not yet released
    claimed: Arc<Mutex<HashSet<String>>>,
}

impl DevicesManager {
    pub fn new(backend: Arc<dyn HidBackend>, vendor_id: u16, options: ConnectionOptions) -> Self {
        Self {
            backend,
            vendor_id,
            device_type: None,
            options,
            devices: Vec::new(),
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn from_config(backend: Arc<dyn HidBackend>, config: &Config) -> Self {
        let mut manager = Self::new(backend, config.vendor_id, config.connection.clone());
        manager.device_type = config.device_type;
        manager
    }

    /// Keep only devices of this type after discovery
    pub fn with_device_type(mut self, device_type: DeviceKind) -> Self {
        self.device_type = Some(device_type);
        self
    }

    /// Enumerate the backend and rebuild the device list.
    ///
    /// With a type filter, devices without a known type are connected briefly
    /// and asked through feature 0x0005. Returns the number of devices kept.
    pub async fn discover(&mut self) -> Result<usize> {
        let interfaces = get_interfaces(self.backend.as_ref(), self.vendor_id)
            .with_context(|| format!("Failed to enumerate vendor {:04X}", self.vendor_id))?;
        let mut devices = list_devices(&interfaces);
        for device in &devices {
            info!("{}", device);
        }

        if let Some(wanted) = self.device_type {
            let mut matching = Vec::new();
            for mut device in devices {
                if device.device_type.is_none() {
                    device.device_type = self.detect_device_type(&device).await;
                }
                if device.device_type == Some(wanted) {
                    matching.push(device);
                }
            }
            devices = matching;
        }

        self.devices = devices;
        Ok(self.devices.len())
    }

    async fn detect_device_type(&self, device: &DeviceInfo) -> Option<DeviceKind> {
        let connected = self.open(device)?;
        let device_type = connected.features().device_name_type().get_device_type().await;
        connected.disconnect().await;
        device_type
    }

    /// Connect `device` unless another connection of this manager still owns it
    fn open(&self, device: &DeviceInfo) -> Option<ConnectedDevice> {
        let path = device.interface.long.path.clone();
        {
            let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
            if !claimed.insert(path.clone()) {
                warn!("{} is already connected", device.name);
                return None;
            }
        }

        match ConnectedDevice::connect(self.backend.as_ref(), device.clone(), self.options.clone())
        {
            Ok(connected) => {
                let claimed = self.claimed.clone();
                connected.on_release(move || {
                    claimed
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .remove(&path);
                });
                Some(connected)
            }
            Err(e) => {
                warn!("Failed to connect {}: {}", device.name, e);
                self.claimed
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&path);
                None
            }
        }
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn connect_with_name(&self, name: &str) -> Option<ConnectedDevice> {
        let connected = self
            .devices
            .iter()
            .find(|d| d.name == name)
            .and_then(|d| self.open(d));
        if connected.is_none() {
            info!("Device not found");
        }
        connected
    }

    pub fn connect_with_pid(&self, product_id: u16) -> Option<ConnectedDevice> {
        let connected = self
            .devices
            .iter()
            .find(|d| d.product_id == product_id)
            .and_then(|d| self.open(d));
        if connected.is_none() {
            info!("Device not found");
        }
        connected
    }

    /// Connect the device with `product_id` whose active firmware reports `transport_id`
    pub async fn connect_with_pid_tid(
        &self,
        product_id: u16,
        transport_id: u16,
    ) -> Option<ConnectedDevice> {
        for device in self.devices.iter().filter(|d| d.product_id == product_id) {
            let Some(connected) = self.open(device) else {
                continue;
            };
            connected.get_device_info().await;
            if connected.device_info().await.transport_id == Some(transport_id) {
                return Some(connected);
            }
            connected.disconnect().await;
        }
        info!("Device not found");
        None
    }

    /// One line per device: `[n] PID sub-name`
    pub fn devices_list_str(&self) -> Vec<String> {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let sub_index = if d.sub_index != DEVICE_INDEX_DIRECT {
                    d.sub_index.to_string()
                } else {
                    String::new()
                };
                format!("[{}] {:04X} {}-{}", i, d.product_id, sub_index, d.name)
            })
            .collect()
    }
}
