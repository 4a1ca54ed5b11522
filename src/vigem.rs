/// ViGEmBus wrapper (Windows-only).
///
/// ViGEmBus is a virtual gamepad bus driver by Nefarius (Benjamin Höglinger-Stelzer)
/// that allows creating virtual Xbox 360 / DualShock 4 controllers.
///
/// Each bridged Pro Controller gets its own wired X360 target. The bus reports
/// rumble and player-LED changes through a per-target notification request,
/// which is drained on its own thread and handed to the global feedback callback.
///
/// Reference: https://github.com/nefarius/ViGEmBus
/// Rust crate: https://github.com/CasualX/vigem-client

#[cfg(target_os = "windows")]
pub mod imp {
    use crate::device::{Feedback, OutboundReport, TargetId, TargetState};
    use crate::error::{BridgeError, Result};
    use crate::platform::FeedbackCallback;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    type X360Target = vigem_client::Xbox360Wired<Arc<vigem_client::Client>>;

    pub struct ViGEmManager {
        client: Arc<vigem_client::Client>,
        targets: Mutex<HashMap<u32, X360Target>>,
        next_id: AtomicU32,
        callback: Arc<Mutex<Option<FeedbackCallback>>>,
    }

    impl ViGEmManager {
        pub fn new() -> Result<Self> {
            let client = vigem_client::Client::connect()
                .map_err(|e| BridgeError::VirtualPad(format!("ViGEmBus not reachable: {:?}", e)))?;
            Ok(Self {
                client: Arc::new(client),
                targets: Mutex::new(HashMap::new()),
                next_id: AtomicU32::new(1),
                callback: Arc::new(Mutex::new(None)),
            })
        }

        pub fn set_callback(&self, callback: FeedbackCallback) {
            *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
        }

        /// Create and plug in a virtual Xbox 360 controller.
        pub fn create_x360(&self) -> Result<TargetId> {
            let mut target = vigem_client::Xbox360Wired::new(
                self.client.clone(),
                vigem_client::TargetId::XBOX360_WIRED,
            );
            target
                .plugin()
                .map_err(|e| BridgeError::PluginFailed(format!("{:?}", e)))?;
            target
                .wait_ready()
                .map_err(|e| BridgeError::PluginFailed(format!("{:?}", e)))?;

            let id = TargetId(self.next_id.fetch_add(1, Ordering::SeqCst));

            match target.request_notification() {
                Ok(request) => {
                    let callback = self.callback.clone();
                    request.spawn_thread(move |_, n| {
                        let cb = callback
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .clone();
                        if let Some(cb) = cb {
                            cb(
                                id,
                                Feedback {
                                    led_number: n.led_number,
                                    large_motor: n.large_motor,
                                    small_motor: n.small_motor,
                                },
                            );
                        }
                    });
                }
                Err(e) => log::warn!("No feedback notifications for {}: {:?}", id, e),
            }

            self.targets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id.0, target);
            Ok(id)
        }

        pub fn destroy(&self, id: TargetId) -> Result<()> {
            let target = self
                .targets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id.0);
            match target {
                Some(mut target) => target
                    .unplug()
                    .map_err(|e| BridgeError::VirtualPad(format!("unplug {}: {:?}", id, e))),
                None => Ok(()),
            }
        }

        pub fn update(&self, id: TargetId, report: &OutboundReport) -> Result<()> {
            let mut targets = self.targets.lock().unwrap_or_else(PoisonError::into_inner);
            let target = targets
                .get_mut(&id.0)
                .ok_or_else(|| BridgeError::VirtualPad(format!("{} is not plugged in", id)))?;
            let gamepad = vigem_client::XGamepad {
                buttons: vigem_client::XButtons { raw: report.buttons },
                left_trigger: report.left_trigger,
                right_trigger: report.right_trigger,
                thumb_lx: report.thumb_lx,
                thumb_ly: report.thumb_ly,
                thumb_rx: report.thumb_rx,
                thumb_ry: report.thumb_ry,
            };
            target
                .update(&gamepad)
                .map_err(|e| BridgeError::VirtualPad(format!("update {}: {:?}", id, e)))
        }

        pub fn state(&self, id: TargetId) -> TargetState {
            match self
                .targets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&id.0)
            {
                Some(target) if target.is_attached() => TargetState::Connected,
                Some(_) => TargetState::Disconnected,
                None => TargetState::Disconnected,
            }
        }
    }
}
