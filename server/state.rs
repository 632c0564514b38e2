use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use ferrite_mlp::Session;

/// Default time a request waits for the session before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// The one session every request works on. Requests are serialized through
/// the mutex; a request that cannot get it in time is answered with 503.
pub struct ServerState {
    session: Mutex<Session>,
    lock_timeout: Duration,
}

/// Shared state type: an `Arc<ServerState>` passed to every handler.
pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(session: Session, lock_timeout: Duration) -> SharedState {
        Arc::new(ServerState { session: Mutex::new(session), lock_timeout })
    }

    /// Waits at most `lock_timeout` for the session.
    ///
    /// A poisoned lock is recovered and the session reused.
    pub fn lock_session(&self) -> Option<MutexGuard<'_, Session>> {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match self.session.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => {
                    log::warn!("recovering session lock after a panicked request");
                    return Some(poisoned.into_inner());
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_mlp::AppParameters;

    #[test]
    fn busy_session_times_out() {
        let state = ServerState::new(Session::new(AppParameters::default()), Duration::from_millis(30));
        let held = state.lock_session().unwrap();
        let other = Arc::clone(&state);
        let started = Instant::now();
        let waited = thread::spawn(move || other.lock_session().is_none()).join().unwrap();
        assert!(waited);
        assert!(started.elapsed() >= Duration::from_millis(30));
        drop(held);
        assert!(state.lock_session().is_some());
    }
}
