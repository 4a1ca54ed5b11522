//! Scripted fakes for the physical transport and the virtual pad service.

#![allow(dead_code)]

use procon_bridge::platform::FeedbackCallback;
use procon_bridge::{
    BridgeConfig, BridgeError, DeviceDescriptor, Feedback, HidTransport, OutboundReport, Result,
    TargetId, TargetState, TransportOpener, VirtualPadService,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn pro_controller() -> DeviceDescriptor {
    DeviceDescriptor::new("/dev/hidraw7", 0x057E, 0x2009)
}

pub fn fast_config() -> BridgeConfig {
    BridgeConfig {
        min_command_interval_ms: 1,
        read_timeout_ms: 5,
        ..BridgeConfig::default()
    }
}

/// An input frame (non-sentinel header) with the given button and stick bytes.
pub fn frame(right: u8, middle: u8, left: u8, sticks: [u8; 6]) -> Vec<u8> {
    let mut f = vec![0u8; 22];
    f[0] = 0x81;
    f[13] = right;
    f[14] = middle;
    f[15] = left;
    f[16..22].copy_from_slice(&sticks);
    f
}

#[derive(Default)]
struct DeviceScript {
    writes: Vec<(Instant, Vec<u8>)>,
    input_frames: VecDeque<Result<Vec<u8>>>,
    silent: Vec<Vec<u8>>,
    open_transports: usize,
}

/// Test-side handle on a fake controller.
#[derive(Clone, Default)]
pub struct FakeDevice(Arc<Mutex<DeviceScript>>);

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> Box<dyn HidTransport> {
        self.0.lock().unwrap().open_transports += 1;
        Box::new(FakeTransport {
            script: self.0.clone(),
            last_write: vec![],
        })
    }

    /// Queue the reply to the next poll command.
    pub fn push_frame(&self, reply: Result<Vec<u8>>) {
        self.0.lock().unwrap().input_frames.push_back(reply);
    }

    /// Never answer `command`.
    pub fn silence(&self, command: &[u8]) {
        self.0.lock().unwrap().silent.push(command.to_vec());
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().writes.iter().map(|(_, w)| w.clone()).collect()
    }

    pub fn write_times(&self) -> Vec<Instant> {
        self.0.lock().unwrap().writes.iter().map(|(t, _)| *t).collect()
    }

    pub fn count_writes(&self, command: &[u8]) -> usize {
        self.writes().iter().filter(|w| w.as_slice() == command).count()
    }

    pub fn open_transports(&self) -> usize {
        self.0.lock().unwrap().open_transports
    }
}

struct FakeTransport {
    script: Arc<Mutex<DeviceScript>>,
    last_write: Vec<u8>,
}

impl HidTransport for FakeTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.script
            .lock()
            .unwrap()
            .writes
            .push((Instant::now(), data.to_vec()));
        self.last_write = data.to_vec();
        Ok(data.len())
    }

    fn read_timeout(&mut self, _timeout_ms: i32) -> Result<Vec<u8>> {
        let mut script = self.script.lock().unwrap();
        if script.silent.contains(&self.last_write) {
            return Ok(vec![]);
        }
        if self.last_write == [0x1f] {
            return script.input_frames.pop_front().unwrap_or_else(|| Ok(vec![0x30]));
        }
        Ok(vec![0x81, self.last_write.get(1).copied().unwrap_or(0)])
    }
}

impl Drop for FakeTransport {
    fn drop(&mut self) {
        self.script.lock().unwrap().open_transports -= 1;
    }
}

pub struct FakeOpener {
    pub device: FakeDevice,
    opens: AtomicUsize,
}

impl FakeOpener {
    pub fn new(device: FakeDevice) -> Self {
        Self {
            device,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl TransportOpener for FakeOpener {
    fn open(&self, _device: &DeviceDescriptor) -> Result<Box<dyn HidTransport>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.device.transport())
    }
}

#[derive(Default)]
struct PadsInner {
    next: u32,
    plugged: HashSet<TargetId>,
    reports: Vec<(TargetId, OutboundReport)>,
    unplugs: Vec<TargetId>,
    submits_after_unplug: usize,
    reject_plugin: bool,
}

#[derive(Default)]
pub struct FakePads {
    inner: Mutex<PadsInner>,
    callback: Mutex<Option<FeedbackCallback>>,
}

impl FakePads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        let pads = Self::default();
        pads.inner.lock().unwrap().reject_plugin = true;
        pads
    }

    pub fn reports(&self) -> Vec<(TargetId, OutboundReport)> {
        self.inner.lock().unwrap().reports.clone()
    }

    pub fn unplugs(&self) -> Vec<TargetId> {
        self.inner.lock().unwrap().unplugs.clone()
    }

    /// Reports submitted (accepted or not) to a target after it was unplugged.
    pub fn submits_after_unplug(&self) -> usize {
        self.inner.lock().unwrap().submits_after_unplug
    }

    pub fn plugged(&self) -> usize {
        self.inner.lock().unwrap().plugged.len()
    }

    /// Deliver feedback the way the bus would, from the calling thread.
    pub fn fire(&self, target: TargetId, feedback: Feedback) -> bool {
        let cb = self.callback.lock().unwrap().clone();
        match cb {
            Some(cb) => {
                cb(target, feedback);
                true
            }
            None => false,
        }
    }
}

impl VirtualPadService for FakePads {
    fn register_target(&self) -> Result<TargetId> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_plugin {
            return Err(BridgeError::VirtualPad("bus refused target".into()));
        }
        inner.next += 1;
        let id = TargetId(inner.next);
        inner.plugged.insert(id);
        Ok(id)
    }

    fn unplug(&self, target: TargetId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.plugged.remove(&target);
        inner.unplugs.push(target);
        Ok(())
    }

    fn submit_report(&self, target: TargetId, report: &OutboundReport) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unplugs.contains(&target) {
            inner.submits_after_unplug += 1;
        }
        if !inner.plugged.contains(&target) {
            return Err(BridgeError::VirtualPad(format!("{} not plugged", target)));
        }
        inner.reports.push((target, *report));
        Ok(())
    }

    fn target_state(&self, target: TargetId) -> TargetState {
        if self.inner.lock().unwrap().plugged.contains(&target) {
            TargetState::Connected
        } else {
            TargetState::Disconnected
        }
    }

    fn on_feedback(&self, callback: FeedbackCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }
}

/// Spin until `cond` holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
