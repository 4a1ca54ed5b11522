use crate::device::{DeviceDescriptor, Feedback, OutboundReport, TargetId, TargetState};
use crate::error::Result;
use std::sync::Arc;

/// Exclusive byte-level handle to a physical controller.
pub trait HidTransport: Send {
    fn write(&mut self, data: &[u8]) -> Result<usize>;
    /// Read one report, waiting at most `timeout_ms`. An empty vec means the wait timed out.
    fn read_timeout(&mut self, timeout_ms: i32) -> Result<Vec<u8>>;
}

/// Opens the transport for a device handed in by discovery.
pub trait TransportOpener: Send + Sync {
    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn HidTransport>>;
}

/// Called by the pad service, on any thread, when the host sends rumble/LED state.
pub type FeedbackCallback = Arc<dyn Fn(TargetId, Feedback) + Send + Sync>;

/// Create/destroy virtual Xbox 360 controllers and forward reports to them.
pub trait VirtualPadService: Send + Sync {
    /// Create and plug in a new target.
    fn register_target(&self) -> Result<TargetId>;
    fn unplug(&self, target: TargetId) -> Result<()>;
    fn submit_report(&self, target: TargetId, report: &OutboundReport) -> Result<()>;
    fn target_state(&self, target: TargetId) -> TargetState;
    /// Install the process-wide feedback callback. Replaces any previous one.
    fn on_feedback(&self, callback: FeedbackCallback);
}

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "linux")]
mod linux;

/// Create the platform-appropriate virtual gamepad backend.
pub fn create_pad_service() -> Result<Arc<dyn VirtualPadService>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsPadService::new()?))
    }
    #[cfg(target_os = "macos")]
    {
        Ok(Arc::new(macos::MacOSPadService::new()))
    }
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(linux::LinuxPadService::new()))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Err(crate::error::BridgeError::PlatformNotSupported(
            std::env::consts::OS.into(),
        ))
    }
}
