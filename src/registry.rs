use crate::device::{Feedback, SessionId, TargetId};
use crate::error::{BridgeError, Result};
use crate::platform::FeedbackCallback;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Last rumble/LED values for one session. Shared between the session and the registry.
#[derive(Debug, Default)]
pub struct FeedbackSlot {
    feedback: Mutex<Feedback>,
}

impl FeedbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, feedback: Feedback) {
        *self.feedback.lock().unwrap_or_else(PoisonError::into_inner) = feedback;
    }

    pub fn get(&self) -> Feedback {
        *self.feedback.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Entry {
    session: SessionId,
    slot: Arc<FeedbackSlot>,
}

/// Routes feedback from virtual targets back to the sessions that own them.
///
/// The lock is held only for the map operation itself, never across device I/O.
#[derive(Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<TargetId, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TargetId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, target: TargetId, session: SessionId, slot: Arc<FeedbackSlot>) -> Result<()> {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(&target) {
            return Err(BridgeError::VirtualPad(format!(
                "{} already routed to session {}",
                target, existing.session
            )));
        }
        entries.insert(target, Entry { session, slot });
        Ok(())
    }

    /// Remove `target` if it still belongs to `session`. Returns whether an entry was removed.
    pub fn remove(&self, target: TargetId, session: SessionId) -> bool {
        let mut entries = self.lock();
        match entries.get(&target) {
            Some(entry) if entry.session == session => {
                entries.remove(&target);
                true
            }
            _ => false,
        }
    }

    /// Cache `feedback` on the session owning `target`. Returns false for unknown targets.
    pub fn dispatch(&self, target: TargetId, feedback: Feedback) -> bool {
        let slot = match self.lock().get(&target) {
            Some(entry) => entry.slot.clone(),
            None => {
                log::debug!("Feedback for unknown {} dropped", target);
                return false;
            }
        };
        log::trace!("{} feedback {:?}", target, feedback);
        slot.store(feedback);
        true
    }

    pub fn session_for(&self, target: TargetId) -> Option<SessionId> {
        self.lock().get(&target).map(|entry| entry.session)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Callback suitable for `VirtualPadService::on_feedback`.
    pub fn feedback_callback(self: &Arc<Self>) -> FeedbackCallback {
        let registry = Arc::clone(self);
        Arc::new(move |target, feedback| {
            registry.dispatch(target, feedback);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_owning_slot() {
        let registry = Arc::new(SessionRegistry::new());
        let slot = Arc::new(FeedbackSlot::new());
        registry.insert(TargetId(1), SessionId::new(), slot.clone()).unwrap();

        let fb = Feedback {
            led_number: 2,
            large_motor: 200,
            small_motor: 10,
        };
        (registry.feedback_callback())(TargetId(1), fb);
        assert_eq!(slot.get(), fb);
        assert!(!registry.dispatch(TargetId(9), fb));
    }

    #[test]
    fn remove_requires_matching_owner() {
        let registry = SessionRegistry::new();
        let owner = SessionId::new();
        registry.insert(TargetId(3), owner, Arc::new(FeedbackSlot::new())).unwrap();

        assert!(!registry.remove(TargetId(3), SessionId::new()));
        assert_eq!(registry.session_for(TargetId(3)), Some(owner));
        assert!(registry.remove(TargetId(3), owner));
        assert!(!registry.remove(TargetId(3), owner));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_target_is_rejected() {
        let registry = SessionRegistry::new();
        registry.insert(TargetId(4), SessionId::new(), Arc::new(FeedbackSlot::new())).unwrap();
        assert!(registry
            .insert(TargetId(4), SessionId::new(), Arc::new(FeedbackSlot::new()))
            .is_err());
        assert_eq!(registry.len(), 1);
    }
}
