use crate::buttons::build_report;
use crate::channel::{CommandChannel, GET_INPUT};
use crate::config::BridgeConfig;
use crate::device::{DeviceDescriptor, Feedback, SessionId, TargetId, TargetState};
use crate::error::{BridgeError, Result};
use crate::platform::{TransportOpener, VirtualPadService};
use crate::registry::{FeedbackSlot, SessionRegistry};
use crate::report::decode_frame;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initializing,
    Active,
    Closed,
}

/// One physical Pro Controller bridged to one virtual Xbox 360 target.
///
/// `poll_once` and `close` may be called from different threads; exchanges with
/// the controller are serialized through the channel lock. Feedback from the
/// pad service only touches the feedback slot.
pub struct DeviceSession {
    id: SessionId,
    device: DeviceDescriptor,
    target: TargetId,
    mac: Option<[u8; 6]>,
    pads: Arc<dyn VirtualPadService>,
    registry: Arc<SessionRegistry>,
    /// `None` once the transport has been released.
    channel: Mutex<Option<CommandChannel>>,
    state: Mutex<SessionState>,
    feedback: Arc<FeedbackSlot>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DeviceSession {
    /// Validate `device`, run the init handshake, plug in a virtual target and
    /// register for feedback. Nothing stays registered if any step fails.
    pub fn open(
        device: &DeviceDescriptor,
        opener: &dyn TransportOpener,
        pads: Arc<dyn VirtualPadService>,
        registry: Arc<SessionRegistry>,
        config: &BridgeConfig,
    ) -> Result<Self> {
        let id = SessionId::new();
        log::debug!("Session {} {:?}", id, SessionState::Created);

        if device.path.is_empty() {
            return Err(BridgeError::InvalidDevice("device path is empty".into()));
        }
        if !device.is_pro_controller() {
            return Err(BridgeError::InvalidDevice(format!(
                "{} is not a Switch Pro Controller",
                device.display_name()
            )));
        }

        log::debug!("Session {} {:?}", id, SessionState::Initializing);

        let mut channel = CommandChannel::new(opener.open(device)?, config);
        let mac = channel.handshake(config)?;

        let target = pads.register_target().map_err(|e| match e {
            BridgeError::PluginFailed(_) => e,
            other => BridgeError::PluginFailed(other.to_string()),
        })?;

        let feedback = Arc::new(FeedbackSlot::new());
        if let Err(e) = registry.insert(target, id, feedback.clone()) {
            if let Err(unplug_err) = pads.unplug(target) {
                log::warn!("Rollback unplug of {} failed: {}", target, unplug_err);
            }
            return Err(e);
        }

        log::info!(
            "Bridged {} ({}) to {} [session {}]",
            device.display_name(),
            mac.map(format_mac).unwrap_or_else(|| "no MAC".into()),
            target,
            id
        );

        Ok(Self {
            id,
            device: device.clone(),
            target,
            mac,
            pads,
            registry,
            channel: Mutex::new(Some(channel)),
            state: Mutex::new(SessionState::Active),
            feedback,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn mac_address(&self) -> Option<[u8; 6]> {
        self.mac
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn is_connected(&self) -> bool {
        self.pads.target_state(self.target) == TargetState::Connected
    }

    /// Cache host feedback. Nothing is forwarded to the controller yet.
    pub fn on_feedback(&self, led_number: u8, large_motor: u8, small_motor: u8) {
        self.feedback.store(Feedback {
            led_number,
            large_motor,
            small_motor,
        });
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback.get()
    }

    /// Fetch one input frame and forward it to the virtual target.
    pub fn poll_once(&self) -> Result<()> {
        if self.state() != SessionState::Active {
            return Ok(());
        }

        let mut guard = lock(&self.channel);
        let Some(channel) = guard.as_mut() else {
            return Ok(());
        };

        let reply = channel
            .send_command(GET_INPUT, &[])
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        let Some(input) = decode_frame(&reply)? else {
            return Ok(());
        };

        let report = build_report(&input);
        // Still under the channel lock so close() cannot unplug mid-submit
        if let Err(e) = self.pads.submit_report(self.target, &report) {
            log::warn!("Report to {} rejected: {}", self.target, e);
        }
        Ok(())
    }

    /// Unplug the virtual target, tell the controller to disconnect and leave
    /// the registry, in that order. Safe to call more than once.
    pub fn close(&self) {
        let mut state = lock(&self.state);
        if *state == SessionState::Closed {
            return;
        }
        *state = SessionState::Closed;

        let mut channel = lock(&self.channel);

        if self.is_connected() {
            if let Err(e) = self.pads.unplug(self.target) {
                log::warn!("Unplugging {} failed: {}", self.target, e);
            }
        }

        if let Some(mut ch) = channel.take() {
            ch.disconnect();
        }

        self.registry.remove(self.target, self.id);
        log::info!("Session {} closed", self.id);
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.close();
    }
}

pub fn format_mac(mac: [u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_formatting() {
        assert_eq!(
            format_mac([0x98, 0xB6, 0xE9, 0x01, 0x02, 0xAB]),
            "98:B6:E9:01:02:AB"
        );
    }
}
