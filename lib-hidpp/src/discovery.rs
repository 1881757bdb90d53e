// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Grouping of raw HID collections into HID++ interfaces.
//!
//! A HID++ device exposes its short, long and extra-long reports as separate
//! top level collections on a vendor usage page. Collections of the legacy
//! page are told apart by usage (1 short, 2 long). On the modern page the low
//! byte of the usage selects the report (1, 2, 4) and the high byte is a
//! bitmap of the reports the interface provides.

use crate::constants::{DEVICE_INDEX_DIRECT, USAGE_PAGE_LEGACY, USAGE_PAGE_MODERN};
use crate::device_info::DeviceInfo;
use crate::transport::{EndpointInfo, HidBackend, HidError, HidppInterface};
use log::{debug, warn};

/// Reports advertised in the high byte of a modern usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub has_short: bool,
    pub has_long: bool,
    pub has_extra_long: bool,
}

impl Capabilities {
    pub fn from_usage(usage: u16) -> Self {
        let bitmap = usage >> 8;
        Self {
            has_short: bitmap & 0b001 != 0,
            has_long: bitmap & 0b010 != 0,
            has_extra_long: bitmap & 0b100 != 0,
        }
    }

    pub fn count(&self) -> usize {
        [self.has_short, self.has_long, self.has_extra_long]
            .into_iter()
            .filter(|&c| c)
            .count()
    }
}

/// Part of a device path shared by all collections of one interface.
///
/// Windows paths look like `\\?\hid#vid_046d&pid_c547&mi_02&col01#7&1234&0&0000#{guid}`;
/// the third `#` field without its last character identifies the interface.
/// Other platforms use the whole path.
pub fn path_stem(path: &str) -> &str {
    match path.split('#').nth(2) {
        Some(field) if !field.is_empty() => {
            let mut chars = field.char_indices();
            chars.next_back();
            match chars.next_back() {
                Some((last, c)) => &field[..last + c.len_utf8()],
                None => "",
            }
        }
        _ => path,
    }
}

fn with_usage<'a>(
    collection: &[&'a EndpointInfo],
    matches: impl Fn(u16) -> bool,
) -> Vec<&'a EndpointInfo> {
    collection
        .iter()
        .copied()
        .filter(|e| matches(e.usage))
        .collect()
}

fn same_interface<'a>(
    candidates: &[&'a EndpointInfo],
    long: &EndpointInfo,
) -> Option<&'a EndpointInfo> {
    let stem = path_stem(&long.path);
    candidates
        .iter()
        .copied()
        .find(|e| path_stem(&e.path) == stem)
}

fn legacy_interfaces(collection: &[&EndpointInfo], interfaces: &mut Vec<HidppInterface>) {
    let short = with_usage(collection, |usage| usage == 1);
    let long = with_usage(collection, |usage| usage == 2);

    if short.len() == 1 && long.len() == 1 {
        interfaces.push(HidppInterface::new(
            Some(short[0].clone()),
            long[0].clone(),
            None,
        ));
        return;
    }

    for endpoint in long {
        if let Some(matching) = same_interface(&short, endpoint) {
            interfaces.push(HidppInterface::new(
                Some(matching.clone()),
                endpoint.clone(),
                None,
            ));
        }
    }
}

fn modern_interfaces(collection: &[&EndpointInfo], interfaces: &mut Vec<HidppInterface>) {
    let short = with_usage(collection, |usage| usage & 0xFF == 1);
    let long = with_usage(collection, |usage| usage & 0xFF == 2);
    let extra_long = with_usage(collection, |usage| usage & 0xFF == 4);

    let capabilities = Capabilities::from_usage(collection[0].usage);

    if capabilities.count() == collection.len() {
        let Some(first_long) = long.first() else {
            warn!("Interface without a long collection: {}", collection[0]);
            return;
        };
        let pick = |wanted: bool, endpoints: &[&EndpointInfo]| {
            if wanted {
                endpoints.first().map(|&e| e.clone())
            } else {
                None
            }
        };
        interfaces.push(HidppInterface::new(
            pick(capabilities.has_short, &short),
            (*first_long).clone(),
            pick(capabilities.has_extra_long, &extra_long),
        ));
        return;
    }

    for endpoint in long {
        interfaces.push(HidppInterface::new(
            same_interface(&short, endpoint).cloned(),
            endpoint.clone(),
            same_interface(&extra_long, endpoint).cloned(),
        ));
    }
}

/// Group the collections of one vendor into HID++ interfaces
pub fn group_interfaces(endpoints: &[EndpointInfo]) -> Vec<HidppInterface> {
    let usable: Vec<&EndpointInfo> = endpoints
        .iter()
        .filter(|e| e.usage != 0 && e.usage_page != 0 && !e.path.is_empty())
        .collect();

    let mut product_ids: Vec<u16> = Vec::new();
    for endpoint in &usable {
        if !product_ids.contains(&endpoint.product_id) {
            product_ids.push(endpoint.product_id);
        }
    }

    let mut interfaces = Vec::new();
    for product_id in product_ids {
        let on_page = |page: u16| -> Vec<&EndpointInfo> {
            usable
                .iter()
                .copied()
                .filter(|e| e.product_id == product_id && e.usage_page == page)
                .collect()
        };

        let legacy = on_page(USAGE_PAGE_LEGACY);
        if !legacy.is_empty() {
            legacy_interfaces(&legacy, &mut interfaces);
        }

        let modern = on_page(USAGE_PAGE_MODERN);
        if !modern.is_empty() {
            modern_interfaces(&modern, &mut interfaces);
        }
    }

    debug!("Found {} HID++ interfaces", interfaces.len());
    interfaces
}

/// Enumerate the collections of `vendor_id` and group them into interfaces
pub fn get_interfaces(
    backend: &dyn HidBackend,
    vendor_id: u16,
) -> Result<Vec<HidppInterface>, HidError> {
    let endpoints = backend.enumerate(vendor_id)?;
    Ok(group_interfaces(&endpoints))
}

/// One directly addressed device per interface
pub fn list_devices(interfaces: &[HidppInterface]) -> Vec<DeviceInfo> {
    interfaces
        .iter()
        .map(|interface| {
            let long = &interface.long;
            DeviceInfo::new(
                long.vendor_id,
                long.product_id,
                interface.clone(),
                long.product_string.replace('_', " "),
                DEVICE_INDEX_DIRECT,
            )
        })
        .collect()
}
