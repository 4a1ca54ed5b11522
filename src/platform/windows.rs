use crate::device::{OutboundReport, TargetId, TargetState};
use crate::error::Result;
use crate::platform::{FeedbackCallback, VirtualPadService};
use crate::vigem::imp::ViGEmManager;

/// Windows implementation backed by ViGEmBus.
/// This is the primary production backend.
pub struct WindowsPadService {
    vigem: ViGEmManager,
}

impl WindowsPadService {
    pub fn new() -> Result<Self> {
        Ok(Self {
            vigem: ViGEmManager::new()?,
        })
    }
}

impl VirtualPadService for WindowsPadService {
    fn register_target(&self) -> Result<TargetId> {
        self.vigem.create_x360()
    }

    fn unplug(&self, target: TargetId) -> Result<()> {
        self.vigem.destroy(target)
    }

    fn submit_report(&self, target: TargetId, report: &OutboundReport) -> Result<()> {
        self.vigem.update(target, report)
    }

    fn target_state(&self, target: TargetId) -> TargetState {
        self.vigem.state(target)
    }

    fn on_feedback(&self, callback: FeedbackCallback) {
        self.vigem.set_callback(callback);
    }
}
