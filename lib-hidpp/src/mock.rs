// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! In-memory HID backend.
//!
//! Frames pushed with [`MockBackend::push_input`] are returned by reads of the
//! matching endpoint; frames written to any endpoint are recorded and handed
//! to the responder, whose replies are queued on the long endpoint.

use crate::constants::{ERROR_FEATURE_INDEX, FEATURE_ROOT, FEATURE_SET, USAGE_PAGE_MODERN};
use crate::request::{ReportType, Request};
use crate::transport::{EndpointInfo, HidBackend, HidError, HidHandle, HidppInterface};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

#[derive(Default)]
struct MockState {
    inputs: HashMap<String, VecDeque<Vec<u8>>>,
    written: Vec<Vec<u8>>,
    responder: Option<Responder>,
    open_handles: usize,
    failing_reads: bool,
}

/// Scriptable [`HidBackend`] for tests
#[derive(Clone)]
pub struct MockBackend {
    endpoints: Vec<EndpointInfo>,
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new(endpoints: Vec<EndpointInfo>) -> Self {
        Self {
            endpoints,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Backend exposing one modern interface with short and long endpoints
    pub fn with_interface(vendor_id: u16, product_id: u16, name: &str) -> Self {
        let endpoint = |usage: u16, suffix: &str| EndpointInfo {
            path: format!("mock/{:04x}/{}", product_id, suffix),
            vendor_id,
            product_id,
            usage_page: USAGE_PAGE_MODERN,
            // capability bitmap in the high byte: short and long
            usage: (0b011 << 8) | usage,
            product_string: name.to_string(),
        };
        Self::new(vec![endpoint(1, "short"), endpoint(2, "long")])
    }

    /// The first interface built from the endpoints, short/long/extra-long by usage
    pub fn interface(&self) -> HidppInterface {
        let by_usage = |usage: u16| {
            self.endpoints
                .iter()
                .find(|e| e.usage & 0xFF == usage)
                .cloned()
        };
        HidppInterface::new(
            by_usage(1),
            by_usage(2).unwrap_or_else(|| self.endpoints[0].clone()),
            by_usage(4),
        )
    }

    /// Queue a frame to be read from the endpoint at `path`
    pub fn push_input(&self, path: &str, frame: Vec<u8>) {
        self.lock()
            .inputs
            .entry(path.to_string())
            .or_default()
            .push_back(frame);
    }

    /// Queue a frame on the long endpoint of [`MockBackend::interface`]
    pub fn push_long(&self, frame: Vec<u8>) {
        let path = self.interface().long.path;
        self.push_input(&path, frame);
    }

    /// Queue a frame on the short endpoint of [`MockBackend::interface`]
    pub fn push_short(&self, frame: Vec<u8>) {
        if let Some(short) = self.interface().short {
            self.push_input(&short.path, frame);
        }
    }

    pub fn on_write<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Answer writes with a [`SimulatedDevice`]
    pub fn attach(&self, mut device: SimulatedDevice) {
        self.on_write(move |frame| device.respond(frame));
    }

    /// Every frame written so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// Number of inputs still waiting to be read on `path`
    pub fn pending_inputs(&self, path: &str) -> usize {
        self.lock().inputs.get(path).map_or(0, VecDeque::len)
    }

    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }

    /// Make every read fail, as an unplugged device would
    pub fn fail_reads(&self, failing: bool) {
        self.lock().failing_reads = failing;
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // a panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HidBackend for MockBackend {
    fn enumerate(&self, vendor_id: u16) -> Result<Vec<EndpointInfo>, HidError> {
        Ok(self
            .endpoints
            .iter()
            .filter(|e| e.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    fn open(&self, endpoint: &EndpointInfo) -> Result<Box<dyn HidHandle>, HidError> {
        if !self.endpoints.iter().any(|e| e.path == endpoint.path) {
            return Err(HidError::OpenFailed {
                path: endpoint.path.clone(),
                reason: "no such mock endpoint".to_string(),
            });
        }
        let mut state = self.lock();
        state.open_handles += 1;
        drop(state);

        Ok(Box::new(MockHandle {
            path: endpoint.path.clone(),
            long_path: self.interface().long.path,
            backend: self.clone(),
        }))
    }
}

struct MockHandle {
    path: String,
    long_path: String,
    backend: MockBackend,
}

impl HidHandle for MockHandle {
    fn read(&mut self, buffer: &mut [u8], _timeout_ms: i32) -> Result<usize, HidError> {
        let mut state = self.backend.lock();
        if state.failing_reads {
            return Err(HidError::ReadFailed("mock read failure".to_string()));
        }
        let Some(frame) = state.inputs.get_mut(&self.path).and_then(VecDeque::pop_front) else {
            return Ok(0);
        };
        let len = frame.len().min(buffer.len());
        buffer[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, HidError> {
        let mut state = self.backend.lock();
        state.written.push(data.to_vec());

        let replies = match state.responder.as_mut() {
            Some(responder) => responder(data),
            None => Vec::new(),
        };
        state
            .inputs
            .entry(self.long_path.clone())
            .or_default()
            .extend(replies);
        Ok(data.len())
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let mut state = self.backend.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}

/// A minimal HID++ 2.0 device answering root and feature set queries.
///
/// Features are placed at runtime index 1, 2, ... in the order they are added.
/// Unknown functions are answered with an error response.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    features: Vec<(u16, u8)>,
    responses: HashMap<(u16, u8), VecDeque<Vec<u8>>>,
    events: HashMap<(u16, u8), (u8, Vec<u8>)>,
    very_long: bool,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, feature_id: u16, version: u8) -> Self {
        if feature_id != FEATURE_ROOT && self.feature_index(feature_id).is_none() {
            self.features.push((feature_id, version));
        }
        self
    }

    /// Reply `params` to the next call of `function` on `feature_id`.
    ///
    /// Several replies for the same function are used in order; the last one
    /// is repeated.
    pub fn with_response(mut self, feature_id: u16, function: u8, params: &[u8]) -> Self {
        self = self.with_feature(feature_id, 0);
        self.responses
            .entry((feature_id, function))
            .or_default()
            .push_back(params.to_vec());
        self
    }

    /// After answering `function` on `feature_id`, send notification
    /// `event_id` of the same feature carrying `params`
    pub fn with_event(
        mut self,
        feature_id: u16,
        function: u8,
        event_id: u8,
        params: &[u8],
    ) -> Self {
        self = self.with_feature(feature_id, 0);
        self.events
            .insert((feature_id, function), (event_id, params.to_vec()));
        self
    }

    /// Answer every request with very long reports
    pub fn with_very_long_reports(mut self) -> Self {
        self.very_long = true;
        self
    }

    pub fn feature_index(&self, feature_id: u16) -> Option<u8> {
        if feature_id == FEATURE_ROOT {
            return Some(0);
        }
        self.features
            .iter()
            .position(|(id, _)| *id == feature_id)
            .map(|p| (p + 1) as u8)
    }

    fn feature_at(&self, index: u8) -> Option<(u16, u8)> {
        if index == 0 {
            return Some((FEATURE_ROOT, 0));
        }
        self.features.get(index as usize - 1).copied()
    }

    pub fn respond(&mut self, frame: &[u8]) -> Vec<Vec<u8>> {
        let Ok(request) = Request::from_buffer(frame) else {
            return Vec::new();
        };

        let params = match self.feature_at(request.feature_index) {
            Some((FEATURE_ROOT, _)) if request.function == 0 => {
                let id = u16::from_be_bytes([request.params()[0], request.params()[1]]);
                match self.feature_index(id) {
                    Some(index) => {
                        let version = self.feature_at(index).map_or(0, |(_, v)| v);
                        Some(vec![index, 0, version])
                    }
                    None => Some(vec![0, 0, 0]),
                }
            }
            Some((FEATURE_SET, _)) if request.function == 0 => {
                Some(vec![self.features.len() as u8])
            }
            Some((FEATURE_SET, _)) if request.function == 1 => self
                .feature_at(request.params()[0])
                .map(|(id, version)| {
                    let [hi, lo] = id.to_be_bytes();
                    vec![hi, lo, 0, version]
                }),
            Some((id, _)) => self.responses.get_mut(&(id, request.function)).and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            }),
            None => None,
        };

        let report_type = if self.very_long {
            ReportType::VeryLong
        } else {
            ReportType::Long
        };

        let mut reply = match params {
            Some(params) => {
                let mut reply = vec![
                    report_type.report_id(),
                    request.device_index,
                    request.feature_index,
                    (request.function << 4) | request.software_id,
                ];
                reply.extend_from_slice(&params);
                reply
            }
            None => vec![
                report_type.report_id(),
                request.device_index,
                ERROR_FEATURE_INDEX,
                request.feature_index,
                (request.function << 4) | request.software_id,
                0x02,
            ],
        };
        reply.resize(report_type.len(), 0);

        let mut frames = vec![reply];
        let event = self
            .feature_at(request.feature_index)
            .and_then(|(id, _)| self.events.get(&(id, request.function)));
        if let Some((event_id, params)) = event {
            let mut notification = vec![
                report_type.report_id(),
                request.device_index,
                request.feature_index,
                event_id << 4,
            ];
            notification.extend_from_slice(params);
            notification.resize(report_type.len(), 0);
            frames.push(notification);
        }
        frames
    }
}
