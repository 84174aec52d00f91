//! Shutdown watcher and the cancellation token it listens on.
//!
//! Each session owns a [`ShutdownToken`]. The process interrupt handler
//! (installed once, through `ctrlc`) triggers the token of every subscribed
//! session; the host can trigger a token itself with
//! [`ShutdownToken::request`]. The watcher thread waits on the token and runs
//! the session's shutdown callback. Whether the process then exits is the
//! callback's decision, not the watcher's.

use crate::error::{Error, Result};
use nix::sys::signal::{self, SigHandler, Signal};
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The process received an interrupt signal
    Interrupt,
    /// The host asked for the session to stop
    Requested,
    /// The session stopped through its normal path; nothing left to do
    SessionStopped,
}

#[derive(Debug, Default)]
struct TokenState {
    reason: Mutex<Option<ShutdownReason>>,
    triggered: Condvar,
}

/// One-shot cancellation token. The first trigger wins.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    state: Arc<TokenState>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn reason_slot(&self) -> MutexGuard<'_, Option<ShutdownReason>> {
        self.state
            .reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Trigger the token; returns false if it was already triggered
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let mut slot = self.reason_slot();
        if slot.is_some() {
            return false;
        }
        *slot = Some(reason);
        self.state.triggered.notify_all();
        true
    }

    /// Ask the owning session to stop, as an interrupt would, without exiting
    pub fn request(&self) -> bool {
        self.trigger(ShutdownReason::Requested)
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.reason_slot()
    }

    pub fn is_triggered(&self) -> bool {
        self.reason().is_some()
    }

    /// Block until the token is triggered
    pub fn wait(&self) -> ShutdownReason {
        let mut slot = self.reason_slot();
        loop {
            if let Some(reason) = *slot {
                return reason;
            }
            slot = self
                .state
                .triggered
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the token is triggered or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ShutdownReason> {
        let slot = self.reason_slot();
        let (slot, _) = self
            .state
            .triggered
            .wait_timeout_while(slot, timeout, |reason| reason.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        *slot
    }

    fn same_as(&self, other: &ShutdownToken) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// Exit status of a process killed by SIGINT, as shells report it
const INTERRUPTED_EXIT_CODE: i32 = 130;

static HOOK: OnceLock<std::result::Result<(), String>> = OnceLock::new();
static SUBSCRIBERS: Mutex<Vec<ShutdownToken>> = Mutex::new(Vec::new());

fn subscribers() -> MutexGuard<'static, Vec<ShutdownToken>> {
    SUBSCRIBERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install the process interrupt handler. Only the first call installs it;
/// later calls report the outcome of that first attempt.
///
/// While at least one token is subscribed an interrupt triggers them. With no
/// subscriber left the process gets the default interrupt behavior back.
pub fn install_interrupt_hook() -> Result<()> {
    HOOK.get_or_init(|| ctrlc::set_handler(on_interrupt).map_err(|e| e.to_string()))
        .clone()
        .map_err(Error::InterruptHook)
}

fn on_interrupt() {
    if broadcast_interrupt() == 0 {
        default_interrupt();
    }
}

/// Trigger every subscribed token with [`ShutdownReason::Interrupt`],
/// returning how many were triggered. Each token is notified once.
pub(crate) fn broadcast_interrupt() -> usize {
    let tokens: Vec<ShutdownToken> = subscribers().drain(..).collect();
    for token in &tokens {
        token.trigger(ShutdownReason::Interrupt);
    }
    tokens.len()
}

/// Terminate the way an unhandled SIGINT would
fn default_interrupt() -> ! {
    debug!("interrupt with no session watching, restoring default handler");
    // SAFETY: SIG_DFL installs no Rust code as a handler.
    let restored = unsafe { signal::signal(Signal::SIGINT, SigHandler::SigDfl) };
    if restored.is_ok() {
        let _ = signal::raise(Signal::SIGINT);
    }
    std::process::exit(INTERRUPTED_EXIT_CODE)
}

#[cfg(test)]
pub(crate) fn subscriber_count() -> usize {
    subscribers().len()
}

pub fn subscribe(token: &ShutdownToken) {
    let mut subs = subscribers();
    if !subs.iter().any(|t| t.same_as(token)) {
        subs.push(token.clone());
    }
}

pub fn unsubscribe(token: &ShutdownToken) {
    subscribers().retain(|t| !t.same_as(token));
}

/// Background thread that waits on a token and runs `on_shutdown` unless the
/// token was triggered by the session stopping on its own.
pub struct ShutdownWatcher;

impl ShutdownWatcher {
    pub fn spawn<F>(token: ShutdownToken, on_shutdown: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce(ShutdownReason) + Send + 'static,
    {
        thread::Builder::new()
            .name("profsession-shutdown".to_string())
            .spawn(move || match token.wait() {
                ShutdownReason::SessionStopped => debug!("shutdown watcher released"),
                reason => on_shutdown(reason),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::facilities_lock;
    use std::sync::mpsc;

    #[test]
    fn test_first_trigger_wins() {
        let token = ShutdownToken::new();
        assert!(!token.is_triggered());
        assert!(token.request());
        assert!(!token.trigger(ShutdownReason::SessionStopped));
        assert_eq!(token.wait(), ShutdownReason::Requested);
    }

    #[test]
    fn test_wait_timeout() {
        let token = ShutdownToken::new();
        assert_eq!(token.wait_timeout(Duration::from_millis(10)), None);
        token.trigger(ShutdownReason::Interrupt);
        assert_eq!(
            token.wait_timeout(Duration::from_millis(10)),
            Some(ShutdownReason::Interrupt)
        );
    }

    #[test]
    fn test_watcher_runs_callback() {
        let token = ShutdownToken::new();
        let (tx, rx) = mpsc::channel();
        let handle = ShutdownWatcher::spawn(token.clone(), move |reason| {
            tx.send(reason).unwrap();
        })
        .unwrap();

        token.request();
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap(), ShutdownReason::Requested);
    }

    #[test]
    fn test_watcher_ignores_session_stop() {
        let token = ShutdownToken::new();
        let (tx, rx) = mpsc::channel::<ShutdownReason>();
        let handle = ShutdownWatcher::spawn(token.clone(), move |reason| {
            tx.send(reason).unwrap();
        })
        .unwrap();

        token.trigger(ShutdownReason::SessionStopped);
        handle.join().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_reaches_subscribers_once() {
        let _guard = facilities_lock();
        let subscribed = ShutdownToken::new();
        let other = ShutdownToken::new();
        subscribe(&subscribed);
        subscribe(&subscribed);

        assert!(broadcast_interrupt() >= 1);
        assert_eq!(subscribed.reason(), Some(ShutdownReason::Interrupt));
        assert!(!other.is_triggered());

        unsubscribe(&subscribed);
        assert!(!subscribers().iter().any(|t| t.same_as(&subscribed)));
    }

    #[test]
    fn test_broadcast_drains_subscribers() {
        let _guard = facilities_lock();
        let token = ShutdownToken::new();
        subscribe(&token);
        let before = subscriber_count();

        assert!(broadcast_interrupt() >= 1);
        assert_eq!(subscriber_count(), 0);
        assert!(before >= 1);
        // A second interrupt finds nobody and falls back to the default behavior
        assert_eq!(broadcast_interrupt(), 0);
    }
}
