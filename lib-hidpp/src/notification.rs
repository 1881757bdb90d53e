// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::constants::{LINK_LOST_BIT, LINK_STATUS_FEATURE_INDEX};
use crate::request::Request;
use chrono::{DateTime, Local};
use log::{debug, error};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Routing key of a notification: runtime feature index and event id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub feature_index: u8,
    pub event_id: u8,
}

impl NotificationKey {
    pub fn new(feature_index: u8, event_id: u8) -> Self {
        Self {
            feature_index,
            event_id,
        }
    }

    pub fn of(frame: &Request) -> Self {
        Self::new(frame.feature_index, frame.event_id())
    }
}

/// Callback for a notification, called with the frame and its arrival time.
///
/// Runs on the receive task; it must return quickly. A panic is caught and
/// logged, the frame counts as handled.
pub type NotificationCallback = Arc<dyn Fn(&Request, DateTime<Local>) + Send + Sync>;

/// Link status change reported by a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Lost,
    Established,
}

/// Callback for link status changes
pub type LinkCallback = Arc<dyn Fn(LinkEvent) + Send + Sync>;

/// Recognise a link status notification addressed to `device_index`
pub fn parse_link_status(frame: &Request, device_index: u8) -> Option<LinkEvent> {
    if frame.feature_index != LINK_STATUS_FEATURE_INDEX || frame.device_index != device_index {
        return None;
    }
    if (frame.params()[0] >> LINK_LOST_BIT) & 0x01 == 1 {
        Some(LinkEvent::Lost)
    } else {
        Some(LinkEvent::Established)
    }
}

/// Table of notification callbacks shared between callers and the receive task
#[derive(Clone, Default)]
pub struct NotificationRouter {
    callbacks: Arc<RwLock<HashMap<NotificationKey, NotificationCallback>>>,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `key`, replacing any previous one
    pub async fn register(&self, key: NotificationKey, callback: NotificationCallback) {
        self.callbacks.write().await.insert(key, callback);
    }

    /// Remove the callback for `key`; returns whether one was registered
    pub async fn unregister(&self, key: NotificationKey) -> bool {
        self.callbacks.write().await.remove(&key).is_some()
    }

    pub async fn clear(&self) {
        self.callbacks.write().await.clear();
    }

    pub async fn is_registered(&self, key: NotificationKey) -> bool {
        self.callbacks.read().await.contains_key(&key)
    }

    /// Hand `frame` to its callback.
    ///
    /// Returns `true` when the frame was a notification with a registered
    /// callback, i.e. it has been consumed.
    pub async fn dispatch(&self, frame: &Request) -> bool {
        if !frame.is_notification() {
            return false;
        }

        let timestamp = Local::now();
        let callback = self.callbacks.read().await.get(&NotificationKey::of(frame)).cloned();

        match callback {
            Some(callback) => {
                debug!("Notification dispatched: {}", frame);
                let result = catch_unwind(AssertUnwindSafe(|| callback(frame, timestamp)));
                if let Err(panic) = result {
                    error!(
                        "Notification callback panicked on {}: {}",
                        frame,
                        panic_message(panic.as_ref())
                    );
                }
                true
            }
            None => false,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
