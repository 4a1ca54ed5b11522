//! hidapi-backed transport for physical controllers.
//!
//! hidapi wraps hidraw (Linux), IOHIDManager (macOS) and the HID class
//! driver (Windows) behind one blocking read/write API.

use crate::device::DeviceDescriptor;
use crate::error::{BridgeError, Result};
use crate::platform::{HidTransport, TransportOpener};
use hidapi::{HidApi, HidDevice};
use std::ffi::CString;
use std::sync::{Mutex, PoisonError};

/// Largest report the controller sends over USB.
const REPORT_BUFFER_LEN: usize = 64;

impl HidTransport for HidDevice {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        HidDevice::write(self, data).map_err(|e| BridgeError::Io(format!("hid write failed: {}", e)))
    }

    fn read_timeout(&mut self, timeout_ms: i32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; REPORT_BUFFER_LEN];
        let n = HidDevice::read_timeout(self, &mut buf, timeout_ms)
            .map_err(|e| BridgeError::Io(format!("hid read failed: {}", e)))?;
        buf.truncate(n);
        Ok(buf)
    }
}

pub struct HidApiOpener {
    api: Mutex<HidApi>,
}

impl HidApiOpener {
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(|e| BridgeError::Io(format!("hidapi init failed: {}", e)))?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

impl TransportOpener for HidApiOpener {
    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn HidTransport>> {
        let path = CString::new(device.path.as_str())
            .map_err(|_| BridgeError::InvalidDevice(format!("bad device path: {:?}", device.path)))?;
        let api = self.api.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = api.open_path(&path).map_err(|e| {
            BridgeError::Io(format!("Unable to open {}: {}", device.path, e))
        })?;
        log::debug!("Opened HID path {}", device.path);
        Ok(Box::new(handle))
    }
}
