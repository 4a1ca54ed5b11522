use crate::device::{OutboundReport, TargetId, TargetState};
use crate::error::{BridgeError, Result};
use crate::platform::{FeedbackCallback, VirtualPadService};

/// macOS stub: there is no virtual HID gamepad bus without a DriverKit extension.
pub struct MacOSPadService;

impl MacOSPadService {
    pub fn new() -> Self {
        Self
    }
}

impl VirtualPadService for MacOSPadService {
    fn register_target(&self) -> Result<TargetId> {
        Err(BridgeError::PlatformNotSupported("macOS".into()))
    }

    fn unplug(&self, _target: TargetId) -> Result<()> {
        Err(BridgeError::PlatformNotSupported("macOS".into()))
    }

    fn submit_report(&self, _target: TargetId, _report: &OutboundReport) -> Result<()> {
        Err(BridgeError::PlatformNotSupported("macOS".into()))
    }

    fn target_state(&self, _target: TargetId) -> TargetState {
        TargetState::Unknown
    }

    fn on_feedback(&self, _callback: FeedbackCallback) {
        log::info!("[macOS stub] feedback callback ignored");
    }
}
