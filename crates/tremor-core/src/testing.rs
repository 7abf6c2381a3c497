//! Test doubles shared by the unit tests
//!
//! `MockBus` stands in for the I2C peripheral. Clones share state, so a test
//! keeps one handle for scripting registers after moving the other into the
//! driver.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_time::{Instant, Timer};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

use crate::collaborators::{
    AlertPayload, AlertSink, CollaboratorError, IndicatorColor, IndicatorOutput, StatusSource,
    StatusValue,
};

/// Value script for one register pair: queued values first, then the last
/// value forever.
#[derive(Default)]
struct RegisterScript {
    queued: VecDeque<i16>,
    last: i16,
}

impl RegisterScript {
    fn next(&mut self) -> i16 {
        if let Some(value) = self.queued.pop_front() {
            self.last = value;
        }
        self.last
    }
}

#[derive(Default)]
struct BusState {
    devices: Vec<u8>,
    registers: BTreeMap<u8, RegisterScript>,
    pointer: u8,
    writes: Vec<(u8, Vec<u8>)>,
    reads: usize,
    failing: bool,
}

#[derive(Clone, Default)]
pub(crate) struct MockBus {
    state: Rc<RefCell<BusState>>,
}

impl MockBus {
    pub(crate) fn with_device(address: u8) -> Self {
        Self::with_devices(&[address])
    }

    pub(crate) fn with_devices(addresses: &[u8]) -> Self {
        let bus = Self::default();
        bus.state.borrow_mut().devices = addresses.to_vec();
        bus
    }

    /// Another handle onto the same bus state
    pub(crate) fn handle(&self) -> Self {
        self.clone()
    }

    /// Make a register pair read back `value` from now on.
    pub(crate) fn set_register(&self, register: u8, value: i16) {
        let mut state = self.state.borrow_mut();
        let script = state.registers.entry(register).or_default();
        script.queued.clear();
        script.last = value;
    }

    /// Queue values returned by successive reads of a register pair.
    pub(crate) fn queue_register(&self, register: u8, values: &[i16]) {
        let mut state = self.state.borrow_mut();
        let script = state.registers.entry(register).or_default();
        script.queued.extend(values.iter().copied());
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }

    /// Register writes seen so far as (address, bytes)
    pub(crate) fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.state.borrow().writes.clone()
    }

    /// Number of read operations served so far
    pub(crate) fn reads(&self) -> usize {
        self.state.borrow().reads
    }
}

impl ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.failing {
            return Err(ErrorKind::Bus);
        }
        if !state.devices.contains(&address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some(&register) = bytes.first() {
                        state.pointer = register;
                    }
                    if bytes.len() > 1 {
                        state.writes.push((address, bytes.to_vec()));
                    }
                }
                Operation::Read(buf) => {
                    let pointer = state.pointer;
                    state.reads += 1;
                    let value = state.registers.entry(pointer).or_default().next();
                    match buf.len() {
                        1 => buf[0] = value as u8,
                        _ => {
                            let bytes = value.to_be_bytes();
                            for (dst, src) in buf.iter_mut().zip(bytes) {
                                *dst = src;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that returns immediately and remembers how long it was asked to wait
#[derive(Default)]
pub(crate) struct NoDelay {
    pub(crate) total_ns: u64,
    pub(crate) calls: usize,
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}

/// Status source replaying a fixed script; repeats the last entry when empty
pub(crate) struct ScriptedStatus {
    script: VecDeque<Result<&'static str, CollaboratorError>>,
    last: Result<&'static str, CollaboratorError>,
    /// Answer time per poll in ms, the last entry repeats
    latency_ms: Vec<u64>,
    pub(crate) polls: usize,
}

impl ScriptedStatus {
    pub(crate) fn new(script: &[Result<&'static str, CollaboratorError>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            last: Ok(""),
            latency_ms: Vec::new(),
            polls: 0,
        }
    }

    pub(crate) fn with_latency(mut self, latency_ms: &[u64]) -> Self {
        self.latency_ms = latency_ms.to_vec();
        self
    }

    pub(crate) fn always(status: &'static str) -> Self {
        Self::new(&[Ok(status)])
    }
}

impl StatusSource for ScriptedStatus {
    async fn poll(&mut self) -> Result<StatusValue, CollaboratorError> {
        let latency = self
            .latency_ms
            .get(self.polls)
            .or(self.latency_ms.last())
            .copied()
            .unwrap_or(0);
        self.polls += 1;
        if latency > 0 {
            Timer::after_millis(latency).await;
        }
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        let status = self.last?;
        let mut value = StatusValue::new();
        value
            .push_str(status)
            .map_err(|_| CollaboratorError::Unavailable {
                collaborator: "scripted status",
                details: "status too long",
            })?;
        Ok(value)
    }
}

/// Alert sink remembering every payload it was handed, and when
#[derive(Default)]
pub(crate) struct RecordingAlerts {
    pub(crate) sent: Vec<AlertPayload>,
    pub(crate) sent_at: Vec<Instant>,
    pub(crate) failing: bool,
    pub(crate) latency_ms: u64,
}

impl AlertSink for RecordingAlerts {
    async fn send(&mut self, payload: AlertPayload) -> Result<(), CollaboratorError> {
        if self.latency_ms > 0 {
            Timer::after_millis(self.latency_ms).await;
        }
        self.sent.push(payload);
        self.sent_at.push(Instant::now());
        if self.failing {
            return Err(CollaboratorError::Unavailable {
                collaborator: "recording alerts",
                details: "connection refused",
            });
        }
        Ok(())
    }
}

/// Indicator remembering every colour it was set to
#[derive(Default)]
pub(crate) struct RecordingIndicator {
    pub(crate) history: Vec<IndicatorColor>,
}

impl RecordingIndicator {
    pub(crate) fn current(&self) -> Option<IndicatorColor> {
        self.history.last().copied()
    }
}

impl IndicatorOutput for RecordingIndicator {
    fn set(&mut self, color: IndicatorColor) {
        self.history.push(color);
    }
}
