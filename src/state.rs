use crate::config::BridgeConfig;
use crate::device::{DeviceDescriptor, SessionId};
use crate::error::Result;
use crate::input_loop::PollLoop;
use crate::platform::{TransportOpener, VirtualPadService};
use crate::registry::SessionRegistry;
use crate::session::DeviceSession;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Attached {
    session: Arc<DeviceSession>,
    poll: PollLoop,
}

/// Application root: owns the session registry and every bridged controller.
pub struct Bridge {
    sessions: Mutex<HashMap<SessionId, Attached>>,
    registry: Arc<SessionRegistry>,
    pads: Arc<dyn VirtualPadService>,
    opener: Arc<dyn TransportOpener>,
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(
        pads: Arc<dyn VirtualPadService>,
        opener: Arc<dyn TransportOpener>,
        config: BridgeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(SessionRegistry::new());
        pads.on_feedback(registry.feedback_callback());
        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            registry,
            pads,
            opener,
            config,
        })
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Attached>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Drop entries whose poll loop has exited (error budget spent or the
    /// session closed directly). Joins and closes outside the map lock.
    fn prune_finished(&self) {
        let finished: Vec<Attached> = {
            let mut sessions = self.lock_sessions();
            let ids: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, a)| !a.poll.is_running())
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };
        for mut attached in finished {
            log::debug!("Pruning finished session {}", attached.session.id());
            attached.poll.stop();
            attached.session.close();
        }
    }

    /// Open `device` and start forwarding its input.
    pub fn attach(&self, device: &DeviceDescriptor) -> Result<Arc<DeviceSession>> {
        self.prune_finished();
        // Handshake runs without holding the session map
        let session = Arc::new(DeviceSession::open(
            device,
            &*self.opener,
            self.pads.clone(),
            self.registry.clone(),
            &self.config,
        )?);

        let poll = PollLoop::start(
            session.clone(),
            self.config.poll_interval(),
            self.config.max_consecutive_errors,
        )?;

        self.lock_sessions().insert(
            session.id(),
            Attached {
                session: session.clone(),
                poll,
            },
        );
        Ok(session)
    }

    /// Stop polling `id` and close it. Returns false for unknown sessions.
    pub fn detach(&self, id: SessionId) -> bool {
        let attached = self.lock_sessions().remove(&id);
        match attached {
            Some(mut attached) => {
                attached.poll.stop();
                attached.session.close();
                true
            }
            None => false,
        }
    }

    pub fn detach_all(&self) {
        let drained: Vec<Attached> = self.lock_sessions().drain().map(|(_, a)| a).collect();
        if !drained.is_empty() {
            log::info!("Detaching {} controller(s)", drained.len());
        }
        for mut attached in drained {
            attached.poll.stop();
            attached.session.close();
        }
    }

    /// Sessions that are still being forwarded.
    pub fn sessions(&self) -> Vec<Arc<DeviceSession>> {
        self.prune_finished();
        self.lock_sessions()
            .values()
            .map(|a| a.session.clone())
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.prune_finished();
        self.lock_sessions().len()
    }

    /// Whether the poll loop of `id` is still forwarding.
    pub fn is_forwarding(&self, id: SessionId) -> bool {
        self.lock_sessions()
            .get(&id)
            .map(|a| a.poll.is_running())
            .unwrap_or(false)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.detach_all();
    }
}
