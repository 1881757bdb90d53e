// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! A live connection to one HID++ device.
//!
//! Connecting opens the device endpoints and spawns the pumps: a receive task
//! decoding frames from the device and a send task writing queued requests to
//! the long endpoint. Callers talk to the pumps through two queues; the
//! correlator pairs each request with its response while notifications are
//! routed to their registered callbacks.

use crate::constants::{
    FEATURE_BATTERY_LEVEL_STATUS, FEATURE_BATTERY_VOLTAGE, FEATURE_DEVICE_INFORMATION,
    FEATURE_ROOT, FEATURE_SET, FEATURE_UNIFIED_BATTERY, LONG_REPORT_LEN, RAW_REQUEST_TIMEOUT_MS,
    SHORT_REPORT_LEN, VERY_LONG_REPORT_LEN,
};
use crate::device_info::{DeviceInfo, FeatureInfo};
use crate::features::{BatteryState, Features};
use crate::notification::{
    parse_link_status, LinkCallback, LinkEvent, NotificationKey, NotificationRouter,
};
use crate::options::{ConnectionOptions, PumpMode};
use crate::request::{is_response, ReportType, Request, Response};
use crate::transport::{HidBackend, HidError, HidHandle};
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Logs the first read failure of an endpoint and stays quiet until it
/// reads again
struct ReadErrorLatch {
    endpoint: &'static str,
    failing: bool,
}

impl ReadErrorLatch {
    fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            failing: false,
        }
    }

    /// Returns whether the failure was logged
    fn failed(&mut self, error: &HidError) -> bool {
        if self.failing {
            return false;
        }
        self.failing = true;
        warn!("Read error on {} endpoint: {}", self.endpoint, error);
        true
    }

    /// Returns whether the endpoint was failing before
    fn recovered(&mut self) -> bool {
        if !self.failing {
            return false;
        }
        self.failing = false;
        info!("{} endpoint readable again", self.endpoint);
        true
    }
}

/// State shared between the connection and its pumps
struct PumpShared {
    sub_index: u8,
    connected: AtomicBool,
    response_length: AtomicUsize,
    use_very_long: AtomicBool,
    poll_interval: Duration,
    router: NotificationRouter,
    link_callback: RwLock<Option<LinkCallback>>,
    info: Arc<RwLock<DeviceInfo>>,
    inbound: mpsc::UnboundedSender<Response>,
}

impl PumpShared {
    /// Read one frame from a long or extra-long endpoint and route it
    async fn receive(&self, handle: &mut dyn HidHandle, latch: &mut ReadErrorLatch) {
        let mut buffer = vec![0u8; self.response_length.load(Ordering::Acquire)];
        match handle.read(&mut buffer, 0) {
            Ok(len) => {
                latch.recovered();
                if len > 0 {
                    self.handle_frame(&buffer[..len]).await;
                }
            }
            Err(e) => {
                latch.failed(&e);
            }
        }
    }

    async fn handle_frame(&self, data: &[u8]) {
        let frame = match Request::from_buffer(data) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Dropping malformed frame {:02x?}: {}", data, e);
                return;
            }
        };
        debug!("{} R: {:02x?}", frame.report_type, data);

        if self.router.dispatch(&frame).await {
            return;
        }
        if self.inbound.send(frame).is_err() {
            debug!("Inbound queue closed, dropping frame");
        }
    }

    /// Short endpoint: only link status notifications are of interest
    async fn poll_link_status(&self, handle: &mut dyn HidHandle, latch: &mut ReadErrorLatch) {
        let mut buffer = [0u8; SHORT_REPORT_LEN];
        let len = match handle.read(&mut buffer, 0) {
            Ok(len) => {
                latch.recovered();
                if len == 0 {
                    return;
                }
                len
            }
            Err(e) => {
                latch.failed(&e);
                return;
            }
        };
        debug!("SHORT R: {:02x?}", &buffer[..len]);

        match Request::from_buffer(&buffer[..len]) {
            Ok(frame) => {
                if let Some(event) = parse_link_status(&frame, self.sub_index) {
                    self.apply_link_event(event).await;
                }
            }
            Err(e) => error!("Dropping malformed short frame {:02x?}: {}", &buffer[..len], e),
        }
    }

    async fn apply_link_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::Lost => info!("Device link lost"),
            LinkEvent::Established => info!("Device link established"),
        }
        let established = event == LinkEvent::Established;
        self.connected.store(established, Ordering::Release);
        self.info.write().await.link_established = Some(established);

        let callback = self.link_callback.read().await.clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    /// Promote `request` to the framing the device expects and write it
    fn write_request(&self, handle: &mut dyn HidHandle, request: Request) {
        let mut frame = request.promoted(ReportType::Long);
        if self.use_very_long.load(Ordering::Acquire) {
            frame = frame.promoted(ReportType::VeryLong);
        }

        let buffer = frame.to_bytes();
        debug!("{} W: {:02x?}", frame.report_type, &buffer[..]);
        if let Err(e) = handle.write(&buffer) {
            error!("Failed to send {}: {}", frame, e);
        }
    }
}

/// Sleep the poll interval; returns `true` once the stop signal fired
async fn idle(poll_interval: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        changed = stop.changed() => changed.is_err() || *stop.borrow(),
        _ = sleep(poll_interval) => false,
    }
}

async fn listener(
    shared: Arc<PumpShared>,
    mut short: Option<Box<dyn HidHandle>>,
    mut long: Box<dyn HidHandle>,
    mut extra_long: Option<Box<dyn HidHandle>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut short_latch = ReadErrorLatch::new("short");
    let mut long_latch = ReadErrorLatch::new("long");
    let mut extra_long_latch = ReadErrorLatch::new("extra long");

    debug!("Receive pump started");
    loop {
        if *stop.borrow() {
            break;
        }

        if let Some(handle) = short.as_mut() {
            shared.poll_link_status(handle.as_mut(), &mut short_latch).await;
        }
        shared.receive(long.as_mut(), &mut long_latch).await;
        if let Some(handle) = extra_long.as_mut() {
            shared.receive(handle.as_mut(), &mut extra_long_latch).await;
        }

        if idle(shared.poll_interval, &mut stop).await {
            break;
        }
    }
    debug!("Receive pump stopped");
}

async fn commander(
    shared: Arc<PumpShared>,
    mut long: Box<dyn HidHandle>,
    mut outbound: mpsc::UnboundedReceiver<Request>,
    mut stop: watch::Receiver<bool>,
) {
    debug!("Send pump started");
    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            request = outbound.recv() => match request {
                Some(request) => shared.write_request(long.as_mut(), request),
                None => break,
            },
        }

        if idle(shared.poll_interval, &mut stop).await {
            break;
        }
    }
    debug!("Send pump stopped");
}

/// Single task variant: one long handle used for both directions
async fn combined_pump(
    shared: Arc<PumpShared>,
    mut long: Box<dyn HidHandle>,
    mut outbound: mpsc::UnboundedReceiver<Request>,
    mut stop: watch::Receiver<bool>,
) {
    let mut latch = ReadErrorLatch::new("long");

    debug!("Combined pump started");
    loop {
        if *stop.borrow() {
            break;
        }

        if let Ok(request) = outbound.try_recv() {
            shared.write_request(long.as_mut(), request);
        }
        shared.receive(long.as_mut(), &mut latch).await;

        if idle(shared.poll_interval, &mut stop).await {
            break;
        }
    }
    debug!("Combined pump stopped");
}

/// A connected HID++ device
pub struct ConnectedDevice {
    info: Arc<RwLock<DeviceInfo>>,
    options: ConnectionOptions,
    shared: Arc<PumpShared>,
    outbound: mpsc::UnboundedSender<Request>,
    inbound: Mutex<mpsc::UnboundedReceiver<Response>>,
    stop: watch::Sender<bool>,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    on_release: std::sync::Mutex<Option<ReleaseHook>>,
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

impl ConnectedDevice {
    /// Open the endpoints of `info` and start the pumps.
    ///
    /// Must be called from within a Tokio runtime. The connection assumes it
    /// is the only one using the endpoints of `info` until it is disconnected
    /// or dropped; callers connecting more than once, such as
    /// `DevicesManager`, must track that themselves (see
    /// [`ConnectedDevice::on_release`]).
    pub fn connect(
        backend: &dyn HidBackend,
        info: DeviceInfo,
        options: ConnectionOptions,
    ) -> Result<Self, HidError> {
        let interface = info.interface.clone();
        let sub_index = info.sub_index;
        let name = info.name.clone();
        let info = Arc::new(RwLock::new(info));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let shared = Arc::new(PumpShared {
            sub_index,
            connected: AtomicBool::new(true),
            response_length: AtomicUsize::new(LONG_REPORT_LEN),
            use_very_long: AtomicBool::new(false),
            poll_interval: options.poll_interval(),
            router: NotificationRouter::new(),
            link_callback: RwLock::new(None),
            info: info.clone(),
            inbound: inbound_tx,
        });

        let pumps = match options.pump_mode {
            PumpMode::Split => {
                let short = interface
                    .short
                    .as_ref()
                    .map(|endpoint| backend.open(endpoint))
                    .transpose()?;
                let long_in = backend.open(&interface.long)?;
                let extra_long = interface
                    .extra_long
                    .as_ref()
                    .map(|endpoint| backend.open(endpoint))
                    .transpose()?;
                let long_out = backend.open(&interface.long)?;

                vec![
                    tokio::spawn(listener(
                        shared.clone(),
                        short,
                        long_in,
                        extra_long,
                        stop_rx.clone(),
                    )),
                    tokio::spawn(commander(shared.clone(), long_out, outbound_rx, stop_rx)),
                ]
            }
            PumpMode::Combined => {
                let long = backend.open(&interface.long)?;
                vec![tokio::spawn(combined_pump(
                    shared.clone(),
                    long,
                    outbound_rx,
                    stop_rx,
                ))]
            }
        };

        info!("Connected to {} via {}", name, interface);

        Ok(Self {
            info,
            options,
            shared,
            outbound: outbound_tx,
            inbound: Mutex::new(inbound_rx),
            stop: stop_tx,
            pumps: Mutex::new(pumps),
            on_release: std::sync::Mutex::new(None),
        })
    }

    /// Run `hook` once the endpoints are released, on disconnect or drop
    pub fn on_release<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Ok(mut slot) = self.on_release.lock() {
            *slot = Some(Box::new(hook));
        }
    }

    fn release(&self) {
        let hook = match self.on_release.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Stop both pumps and wait for them; their endpoints are closed on exit
    pub async fn disconnect(&self) {
        self.stop.send_replace(true);

        let pumps = std::mem::take(&mut *self.pumps.lock().await);
        if pumps.is_empty() {
            return;
        }
        for pump in pumps {
            if let Err(e) = pump.await {
                error!("Pump task failed: {}", e);
            }
        }

        if self.is_connected() {
            info!("Disconnected from device: {}", self.info.read().await.name);
        }
        self.shared
            .response_length
            .store(LONG_REPORT_LEN, Ordering::Release);
        self.shared.use_very_long.store(false, Ordering::Release);
        self.shared.router.clear().await;
        self.release();
    }

    /// Link state as last reported by the receiver
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn sub_index(&self) -> u8 {
        self.shared.sub_index
    }

    /// Snapshot of the device record
    pub async fn device_info(&self) -> DeviceInfo {
        self.info.read().await.clone()
    }

    /// Directory entry of `feature_id`, if enumerated
    pub async fn feature(&self, feature_id: u16) -> Option<FeatureInfo> {
        self.info.read().await.feature(feature_id).copied()
    }

    pub async fn name(&self) -> String {
        self.info.read().await.name.clone()
    }

    pub fn features(&self) -> Features<'_> {
        Features::new(self)
    }

    /// Number of bytes read per frame from the long endpoints
    pub fn response_length(&self) -> usize {
        self.shared.response_length.load(Ordering::Acquire)
    }

    /// Whether long requests are sent as very long reports
    pub fn is_using_very_long(&self) -> bool {
        self.shared.use_very_long.load(Ordering::Acquire)
    }

    /// Send `request` and wait for its response.
    ///
    /// Frames already waiting in the inbound queue are logged and dropped
    /// first. Frames received before the response are discarded; up to
    /// `max_correlation_attempts` extra waits of `response_timeout` are made
    /// before giving up. Concurrent callers are serialised.
    pub async fn send_request(
        &self,
        request: Request,
        response_timeout: Duration,
    ) -> Option<Response> {
        let mut inbound = self.inbound.lock().await;

        while let Ok(stale) = inbound.try_recv() {
            warn!("Unprocessed inbound frame: {}", stale);
        }

        if self.outbound.send(request.clone()).is_err() {
            warn!("Send pump stopped, dropping {}", request);
            return None;
        }

        let mut unmatched = match timeout(response_timeout, inbound.recv()).await {
            Ok(Some(response)) if is_response(&request, &response) => return Some(response),
            Ok(Some(frame)) => Some(frame),
            Ok(None) => return None,
            Err(_) => {
                debug!("No response within {:?} for {}", response_timeout, request);
                return None;
            }
        };

        for attempt in 1..=self.options.max_correlation_attempts {
            if let Some(frame) = unmatched.take() {
                warn!("Frame received before the response, discarding: {}", frame);
            }

            match timeout(response_timeout, inbound.recv()).await {
                Ok(Some(response)) if is_response(&request, &response) => return Some(response),
                Ok(Some(frame)) => unmatched = Some(frame),
                Ok(None) => return None,
                Err(_) => debug!("Attempt {} timed out for {}", attempt, request),
            }
        }

        if let Some(frame) = unmatched {
            warn!("Frame received before the response, discarding: {}", frame);
        }
        warn!("No matching response for {}", request);
        None
    }

    /// Queue `request` without waiting for a response
    pub fn send_request_no_reply(&self, request: Request) -> bool {
        if self.outbound.send(request).is_err() {
            warn!("Send pump stopped, request dropped");
            return false;
        }
        true
    }

    /// Send a frame given as raw bytes and wait for its response
    pub async fn send_raw(&self, frame: &[u8]) -> Option<Response> {
        let request = Self::parse_raw(frame)?;
        self.send_request(request, Duration::from_millis(RAW_REQUEST_TIMEOUT_MS))
            .await
    }

    pub fn send_raw_no_reply(&self, frame: &[u8]) -> bool {
        match Self::parse_raw(frame) {
            Some(request) => self.send_request_no_reply(request),
            None => false,
        }
    }

    fn parse_raw(frame: &[u8]) -> Option<Request> {
        match Request::from_buffer(frame) {
            Ok(request) => Some(request),
            Err(e) => {
                warn!("Invalid raw frame {:02x?}: {}", frame, e);
                None
            }
        }
    }

    /// Build a request for an enumerated feature
    async fn build_request(&self, feature_id: u16, function: u8, params: &[u8]) -> Option<Request> {
        if !self.is_connected() {
            warn!("Device is not connected");
            return None;
        }

        let Some(feature_index) = self.info.read().await.feature_index(feature_id) else {
            warn!("Feature 0x{:04X} is not enumerated", feature_id);
            return None;
        };

        match Request::with_payload(
            self.shared.sub_index,
            feature_index,
            function,
            self.options.software_id,
            params,
        ) {
            Ok(request) => Some(request),
            Err(e) => {
                error!("Cannot build request for feature 0x{:04X}: {}", feature_id, e);
                None
            }
        }
    }

    /// Call `function` of an enumerated feature.
    ///
    /// The report type is the smallest one able to carry `params`.
    pub async fn send(
        &self,
        feature_id: u16,
        function: u8,
        params: &[u8],
        response_timeout: Duration,
    ) -> Option<Response> {
        let request = self.build_request(feature_id, function, params).await?;
        self.send_request(request, response_timeout).await
    }

    pub async fn send_no_reply(&self, feature_id: u16, function: u8, params: &[u8]) -> bool {
        match self.build_request(feature_id, function, params).await {
            Some(request) => self.send_request_no_reply(request),
            None => false,
        }
    }

    /// [`ConnectedDevice::send`] with the configured timeout; protocol errors
    /// and responses for another device index become `None`
    pub async fn call(&self, feature_id: u16, function: u8, params: &[u8]) -> Option<Response> {
        let response = self
            .send(feature_id, function, params, self.options.response_timeout())
            .await?;

        if let Some(code) = response.error_code() {
            warn!(
                "Feature 0x{:04X} function {} failed with error {:#04x}",
                feature_id, function, code
            );
            return None;
        }
        if response.device_index != self.shared.sub_index {
            warn!(
                "Response for device index {:#04x}, expected {:#04x}",
                response.device_index, self.shared.sub_index
            );
            return None;
        }
        // fixed parameter offsets are valid up to the long report capacity
        Some(response.promoted(ReportType::Long))
    }

    /// Enumerate `feature_id` if needed, then [`ConnectedDevice::call`] it
    pub async fn request(&self, feature_id: u16, function: u8, params: &[u8]) -> Option<Response> {
        if !self.enumerate_feature(feature_id).await {
            return None;
        }
        self.call(feature_id, function, params).await
    }

    pub async fn request_no_reply(&self, feature_id: u16, function: u8, params: &[u8]) -> bool {
        if !self.enumerate_feature(feature_id).await {
            return false;
        }
        self.send_no_reply(feature_id, function, params).await
    }

    /// Wait up to `wait` for a frame that was not claimed by a callback.
    ///
    /// The inbound queue is cleared afterwards.
    pub async fn wait_notification(&self, wait: Duration) -> Option<Response> {
        let mut inbound = self.inbound.lock().await;
        let frame = timeout(wait, inbound.recv()).await.ok().flatten();
        while inbound.try_recv().is_ok() {}
        frame
    }

    /// Pop the next unclaimed frame without waiting
    pub async fn next_inbound(&self) -> Option<Response> {
        self.inbound.lock().await.try_recv().ok()
    }

    pub async fn clear_input_queue(&self) {
        let mut inbound = self.inbound.lock().await;
        while inbound.try_recv().is_ok() {}
    }

    /// Look up `feature_id` on the device and record its index.
    ///
    /// Returns `true` when the feature is (now) in the directory.
    pub async fn enumerate_feature(&self, feature_id: u16) -> bool {
        if !self.is_connected() {
            return false;
        }
        if self.info.read().await.is_enumerated(feature_id) {
            return true;
        }

        match self.features().root().get_feature(feature_id).await {
            Some(feature) if feature.index != 0 => {
                debug!("Feature 0x{:04X} at index {}", feature_id, feature.index);
                self.info.write().await.add_feature(feature);
                true
            }
            Some(_) => {
                warn!("Feature 0x{:04X} not supported by the device", feature_id);
                false
            }
            None => {
                warn!("No response enumerating feature 0x{:04X}", feature_id);
                false
            }
        }
    }

    /// Walk the feature set and record every feature of the device
    pub async fn enumerate_all(&self) -> bool {
        if !self.is_connected() {
            return false;
        }
        if !self.enumerate_feature(FEATURE_SET).await {
            return false;
        }

        let feature_set = self.features().feature_set();
        let Some(count) = feature_set.get_count().await else {
            warn!("Could not read the feature count");
            return false;
        };

        for index in 2..=count {
            match feature_set.get_feature_id(index).await {
                Some(feature) => {
                    self.info.write().await.add_feature(feature);
                }
                None => warn!("No feature id for index {}", index),
            }
        }

        let mut info = self.info.write().await;
        info.mark_fully_enumerated();
        info.log_features();
        true
    }

    /// Register `callback` for notifications `event_id` of an enumerated feature
    pub async fn register_notification<F>(&self, feature_id: u16, event_id: u8, callback: F) -> bool
    where
        F: Fn(&Request, DateTime<Local>) + Send + Sync + 'static,
    {
        let Some(index) = self.info.read().await.feature_index(feature_id) else {
            warn!(
                "Could not register notification: feature 0x{:04X} is not enumerated",
                feature_id
            );
            return false;
        };
        self.shared
            .router
            .register(NotificationKey::new(index, event_id), Arc::new(callback))
            .await;
        true
    }

    pub async fn unregister_notification(&self, feature_id: u16, event_id: u8) {
        let Some(index) = self.info.read().await.feature_index(feature_id) else {
            return;
        };
        self.shared
            .router
            .unregister(NotificationKey::new(index, event_id))
            .await;
    }

    /// Called from the receive task on link lost / established notifications
    pub async fn set_link_callback<F>(&self, callback: F)
    where
        F: Fn(LinkEvent) + Send + Sync + 'static,
    {
        *self.shared.link_callback.write().await = Some(Arc::new(callback));
    }

    /// Detect whether the device answers with very long reports.
    ///
    /// Returns `false` only when the first length query got no response.
    pub async fn negotiate_response_length(&self) -> bool {
        let query_timeout = self.options.response_timeout();
        let Some(first) = self.send(FEATURE_ROOT, 0, &[0, 0, 0], query_timeout).await else {
            warn!("Response for length not received");
            return false;
        };

        match first.report_type {
            ReportType::Long => {}
            ReportType::VeryLong => {
                self.shared
                    .response_length
                    .store(VERY_LONG_REPORT_LEN, Ordering::Release);

                match self.send(FEATURE_ROOT, 0, &[0, 0, 0], query_timeout).await {
                    Some(second) if second.report_type == ReportType::VeryLong => {
                        info!("Changed response length to VERY LONG");
                        self.shared.use_very_long.store(true, Ordering::Release);
                    }
                    _ => warn!("Second length query was not VERY LONG, keeping LONG requests"),
                }
            }
            ReportType::Short => warn!("Response report length is not correct"),
        }
        true
    }

    /// Read the device information block and every firmware entity
    pub async fn get_device_info(&self) -> bool {
        if !self.is_connected() {
            return false;
        }
        if !self.enumerate_feature(FEATURE_DEVICE_INFORMATION).await {
            warn!("No feature 0x0003 when getting device info");
            return false;
        }

        let device_information = self.features().device_information();
        let Some(details) = device_information.get_device_info().await else {
            return false;
        };
        let entity_count = details.entity_count;
        self.info.write().await.set_device_info(details);

        for entity in 0..entity_count {
            match device_information.get_fw_info(entity).await {
                Some(fw_info) => self.info.write().await.add_entity_fw_info(fw_info),
                None => warn!("No firmware info for entity {}", entity),
            }
        }

        self.info.read().await.log_device_info();
        true
    }

    /// Battery state from the first battery feature the device supports
    pub async fn get_battery_state(&self) -> Option<BatteryState> {
        let features = self.features();

        if self.enumerate_feature(FEATURE_UNIFIED_BATTERY).await {
            if let Some(status) = features.unified_battery().get_status().await {
                return Some(BatteryState::Unified(status));
            }
        }
        if self.enumerate_feature(FEATURE_BATTERY_VOLTAGE).await {
            if let Some(info) = features.battery_voltage().get_battery_info().await {
                return Some(BatteryState::Voltage(info));
            }
        }
        if self.enumerate_feature(FEATURE_BATTERY_LEVEL_STATUS).await {
            if let Some(status) = features.battery_level_status().get_level_status().await {
                return Some(BatteryState::LevelStatus(status));
            }
        }
        None
    }
}

impl Drop for ConnectedDevice {
    fn drop(&mut self) {
        self.stop.send_replace(true);
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_logged_once_until_recovery() {
        let mut latch = ReadErrorLatch::new("long");
        let error = HidError::ReadFailed("unplugged".to_string());

        assert!(!latch.recovered());
        assert!(latch.failed(&error));
        assert!(!latch.failed(&error));
        assert!(!latch.failed(&error));

        assert!(latch.recovered());
        assert!(!latch.recovered());
        assert!(latch.failed(&error));
    }
}
