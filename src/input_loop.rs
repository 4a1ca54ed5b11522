use crate::session::{DeviceSession, SessionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Repeatedly polls one session on a dedicated `std::thread`.
///
/// Each poll blocks for one controller round trip, so the loop needs no sleep of
/// its own unless `poll_interval` is set. After `max_consecutive_errors` failed
/// polls in a row the session is closed and the loop exits. The loop also exits
/// once the session is closed from elsewhere.
pub struct PollLoop {
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl PollLoop {
    pub fn start(
        session: Arc<DeviceSession>,
        poll_interval: Duration,
        max_consecutive_errors: u32,
    ) -> crate::error::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = std::thread::Builder::new()
            .name(format!("procon-poll-{}", session.target().0))
            .spawn(move || {
                log::info!("Poll loop for session {} started", session.id());
                let mut failures = 0u32;

                while flag.load(Ordering::SeqCst) {
                    if session.state() == SessionState::Closed {
                        break;
                    }
                    match session.poll_once() {
                        Ok(()) => failures = 0,
                        Err(e) => {
                            failures += 1;
                            log::warn!(
                                "Poll failed ({}/{}): {}",
                                failures,
                                max_consecutive_errors,
                                e
                            );
                            if failures >= max_consecutive_errors {
                                log::error!("Giving up on session {}", session.id());
                                session.close();
                                break;
                            }
                        }
                    }

                    if !poll_interval.is_zero() {
                        std::thread::sleep(poll_interval);
                    }
                }

                flag.store(false, Ordering::SeqCst);
                log::info!("Poll loop for session {} stopped", session.id());
            })?;

        Ok(Self {
            running,
            thread_handle: Some(handle),
        })
    }

    /// Stop the loop and wait for the in-flight poll to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
