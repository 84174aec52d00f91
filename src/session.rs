//! Profiling sessions.
//!
//! A [`Profiler`] runs its instruments between [`Profiler::start`] and
//! [`Profiler::stop`]. Sessions sharing a [`SessionRegistry`] exclude each
//! other: only one of them can be running at a time. The process-wide
//! registry returned by [`SessionRegistry::global`] is the default.

use crate::config::{RawConfig, SessionConfig};
use crate::error::{Error, Result};
use crate::kind::InstrumentKind;
use crate::registry::{InstrumentDefinition, InstrumentSettings, definitions_for};
use crate::shutdown::{self, ShutdownReason, ShutdownToken, ShutdownWatcher};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

static GLOBAL_REGISTRY: OnceLock<Arc<SessionRegistry>> = OnceLock::new();

/// Guard that allows one running session at a time
#[derive(Debug, Default)]
pub struct SessionRegistry {
    running: AtomicBool,
}

impl SessionRegistry {
    pub const fn new() -> Self {
        SessionRegistry {
            running: AtomicBool::new(false),
        }
    }

    /// The registry shared by every session in this process
    pub fn global() -> Arc<SessionRegistry> {
        Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(SessionRegistry::new())))
    }

    /// Claim the guard. Exactly one of any number of concurrent callers succeeds.
    pub fn try_acquire(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Outcome of [`Profiler::stop`]
#[derive(Debug, Default)]
pub struct StopReport {
    /// Instruments whose stop behavior completed, in stop order
    pub stopped: Vec<InstrumentKind>,
    /// Output files of the instruments in `stopped`
    pub outputs: Vec<PathBuf>,
    /// Per-instrument failures; they never prevent the remaining instruments from stopping
    pub failures: Vec<Error>,
    performed: bool,
}

impl StopReport {
    /// False when the call was a no-op because the session was not running
    pub fn performed(&self) -> bool {
        self.performed
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// The output files, or the first failure if any instrument failed
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        match self.failures.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.outputs),
        }
    }
}

struct ActiveInstrument {
    definition: InstrumentDefinition,
    sink: File,
    path: PathBuf,
}

struct Inner {
    state: SessionState,
    pending: Vec<InstrumentDefinition>,
    active: Vec<ActiveInstrument>,
    watcher: Option<JoinHandle<()>>,
}

struct Session {
    config: SessionConfig,
    kinds: Vec<InstrumentKind>,
    registry: Arc<SessionRegistry>,
    token: ShutdownToken,
    inner: Mutex<Inner>,
}

impl Session {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(self: &Arc<Self>) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != SessionState::Idle {
            return Err(Error::InvalidState {
                expected: SessionState::Idle,
                actual: inner.state,
            });
        }
        if !self.registry.try_acquire() {
            return Err(Error::SessionAlreadyRunning);
        }
        inner.state = SessionState::Running;

        // A failure below leaves the instruments started so far running;
        // the caller unwinds them with stop().
        for mut definition in std::mem::take(&mut inner.pending) {
            let path = self.config.output_dir.join(definition.output_file_name());
            let mut sink = File::create(&path).map_err(|source| Error::OutputCreate {
                path: path.clone(),
                source,
            })?;
            definition.start(&mut sink)?;

            if !self.config.quiet {
                info!(kind = %definition.kind(), path = %path.display(), "will dump profile");
            }
            inner.active.push(ActiveInstrument {
                definition,
                sink,
                path,
            });
        }

        if self.config.auto_shutdown_on_interrupt {
            inner.watcher = self.launch_watcher();
        }
        Ok(())
    }

    fn launch_watcher(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        match shutdown::install_interrupt_hook() {
            Ok(()) => shutdown::subscribe(&self.token),
            Err(e) => warn!("interrupt hook unavailable, stop on interrupt disabled: {e}"),
        }

        let session: Weak<Session> = Arc::downgrade(self);
        let exit_on_interrupt = self.config.exit_on_interrupt;
        let quiet = self.config.quiet;
        let spawned = ShutdownWatcher::spawn(self.token.clone(), move |reason| {
            if !quiet {
                info!(?reason, "caught shutdown request, stopping");
            }
            if let Some(session) = session.upgrade() {
                let report = session.stop();
                for failure in &report.failures {
                    warn!("{failure}");
                }
            }
            if reason == ShutdownReason::Interrupt && exit_on_interrupt {
                std::process::exit(crate::error::exit_code::SUCCESS);
            }
        });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("could not start shutdown watcher: {e}");
                shutdown::unsubscribe(&self.token);
                None
            }
        }
    }

    fn stop(&self) -> StopReport {
        let (report, watcher) = {
            let mut inner = self.lock();
            if inner.state != SessionState::Running {
                return StopReport::default();
            }

            let mut report = StopReport {
                performed: true,
                ..StopReport::default()
            };
            for ActiveInstrument {
                mut definition,
                mut sink,
                path,
            } in inner.active.drain(..)
            {
                if !self.config.quiet {
                    info!(path = %path.display(), "finishing profile");
                }
                match definition.stop(&mut sink) {
                    Ok(()) => {
                        report.stopped.push(definition.kind());
                        report.outputs.push(path);
                    }
                    Err(e) => {
                        warn!("{e}");
                        report.failures.push(e);
                    }
                }
                // sink closes here
            }

            inner.pending.clear();
            inner.state = SessionState::Stopped;
            self.registry.release();
            (report, inner.watcher.take())
        };

        shutdown::unsubscribe(&self.token);
        self.token.trigger(ShutdownReason::SessionStopped);
        if let Some(handle) = watcher
            && handle.thread().id() != thread::current().id()
        {
            let _ = handle.join();
        }

        report
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let report = self.stop();
        for failure in &report.failures {
            warn!("{failure}");
        }
    }
}

/// One profiling run: Idle, then Running after [`start`](Profiler::start),
/// then Stopped for good after [`stop`](Profiler::stop).
///
/// Dropping a running profiler stops it.
pub struct Profiler {
    session: Arc<Session>,
}

impl Profiler {
    /// A session guarded by the process-wide registry
    pub fn new(config: SessionConfig) -> Self {
        Self::with_registry(config, SessionRegistry::global())
    }

    pub fn with_registry(config: SessionConfig, registry: Arc<SessionRegistry>) -> Self {
        let pending = definitions_for(&config.kinds, &InstrumentSettings::from(&config));
        let kinds = pending.iter().map(InstrumentDefinition::kind).collect();

        Profiler {
            session: Arc::new(Session {
                config,
                kinds,
                registry,
                token: ShutdownToken::new(),
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    pending,
                    active: Vec::new(),
                    watcher: None,
                }),
            }),
        }
    }

    /// Resolve raw options and build a session on the process-wide registry
    pub fn from_raw(raw: &RawConfig) -> Result<Self> {
        Ok(Self::new(SessionConfig::resolve(raw)?))
    }

    /// Open every output file and start the instruments in order.
    ///
    /// Fails with [`Error::SessionAlreadyRunning`] if another session holds
    /// the registry. If an instrument fails to start, the ones before it keep
    /// running and the session counts as running; call [`stop`](Self::stop)
    /// to unwind them.
    pub fn start(&self) -> Result<()> {
        self.session.start()
    }

    /// Stop every running instrument in start order and release the registry.
    ///
    /// Only the first call on a running session does anything; later or
    /// concurrent calls return a report with `performed() == false`.
    pub fn stop(&self) -> StopReport {
        self.session.stop()
    }

    pub fn state(&self) -> SessionState {
        self.session.lock().state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.session.config
    }

    /// Instrument kinds of this session, deduplicated, in start order
    pub fn kinds(&self) -> &[InstrumentKind] {
        &self.session.kinds
    }

    /// Token the shutdown watcher listens on. Triggering it with
    /// [`ShutdownToken::request`] stops a session that watches for interrupts.
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.session.token.clone()
    }
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("kinds", &self.session.kinds)
            .field("output_dir", &self.session.config.output_dir)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::facilities_lock;
    use crate::{blocking, contention, heap, trace};
    use std::path::Path;
    use std::sync::Barrier;
    use std::time::{Duration, Instant};

    fn config(kinds: &[InstrumentKind], dir: &Path) -> SessionConfig {
        SessionConfig::for_kinds(kinds, dir).unwrap()
    }

    fn private(kinds: &[InstrumentKind], dir: &Path) -> (Profiler, Arc<SessionRegistry>) {
        let registry = Arc::new(SessionRegistry::new());
        let profiler = Profiler::with_registry(config(kinds, dir), Arc::clone(&registry));
        (profiler, registry)
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn wait_for_state(profiler: &Profiler, state: SessionState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if profiler.state() == state {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_registry_exclusive() {
        let registry = SessionRegistry::new();
        assert!(registry.try_acquire());
        assert!(!registry.try_acquire());
        registry.release();
        assert!(registry.try_acquire());
    }

    #[test]
    fn test_one_file_per_kind() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let kinds = [
            InstrumentKind::LockContention,
            InstrumentKind::BlockingWait,
            InstrumentKind::ThreadCreation,
            InstrumentKind::GoroutineSnapshot,
            InstrumentKind::ExecutionTrace,
            InstrumentKind::HeapAllocation,
        ];
        let (profiler, registry) = private(&kinds, dir.path());

        profiler.start().unwrap();
        assert_eq!(profiler.state(), SessionState::Running);
        assert!(registry.is_held());

        let report = profiler.stop();
        assert!(report.performed());
        assert!(report.is_clean());
        assert_eq!(report.stopped, kinds.to_vec());
        assert_eq!(profiler.state(), SessionState::Stopped);
        assert!(!registry.is_held());

        let mut expected: Vec<String> = kinds
            .iter()
            .map(|k| k.output_file_name().to_string())
            .collect();
        expected.sort();
        assert_eq!(file_names(dir.path()), expected);
    }

    #[test]
    fn test_duplicate_kinds_start_once() {
        let dir = tempfile::tempdir().unwrap();
        let (profiler, _) = private(
            &[
                InstrumentKind::GoroutineSnapshot,
                InstrumentKind::ThreadCreation,
                InstrumentKind::GoroutineSnapshot,
            ],
            dir.path(),
        );
        assert_eq!(
            profiler.kinds(),
            &[InstrumentKind::GoroutineSnapshot, InstrumentKind::ThreadCreation]
        );
        profiler.start().unwrap();
        let outputs = profiler.stop().into_result().unwrap();
        assert_eq!(
            outputs,
            vec![
                dir.path().join("goroutine.pprof"),
                dir.path().join("threadcreate.pprof"),
            ]
        );
    }

    #[test]
    fn test_concurrent_start_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SessionRegistry::new());
        let kinds = [InstrumentKind::ThreadCreation];
        let a = Profiler::with_registry(config(&kinds, dir.path()), Arc::clone(&registry));
        let b = Profiler::with_registry(config(&kinds, dir.path()), Arc::clone(&registry));
        let barrier = Barrier::new(2);

        let (ra, rb) = thread::scope(|s| {
            let ha = s.spawn(|| {
                barrier.wait();
                a.start()
            });
            let hb = s.spawn(|| {
                barrier.wait();
                b.start()
            });
            (ha.join().unwrap(), hb.join().unwrap())
        });

        assert_ne!(ra.is_ok(), rb.is_ok(), "expected exactly one winner: {ra:?} {rb:?}");
        let (winner, loser_result) = if ra.is_ok() { (&a, rb) } else { (&b, ra) };
        assert!(matches!(loser_result, Err(Error::SessionAlreadyRunning)));

        winner.stop();
        let third = Profiler::with_registry(config(&kinds, dir.path()), Arc::clone(&registry));
        third.start().unwrap();
        third.stop();
    }

    #[test]
    fn test_losing_session_stays_idle() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SessionRegistry::new());
        let first = Profiler::with_registry(config(&[], dir.path()), Arc::clone(&registry));
        let second = Profiler::with_registry(config(&[], dir.path()), Arc::clone(&registry));

        first.start().unwrap();
        assert!(matches!(second.start(), Err(Error::SessionAlreadyRunning)));
        assert_eq!(second.state(), SessionState::Idle);

        first.stop();
        second.start().unwrap();
        second.stop();
    }

    #[test]
    fn test_second_trace_session_fails_on_guard() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SessionRegistry::new());
        let kinds = [InstrumentKind::ExecutionTrace];
        let first = Profiler::with_registry(config(&kinds, dir.path()), Arc::clone(&registry));
        let second = Profiler::with_registry(config(&kinds, dir.path()), Arc::clone(&registry));

        first.start().unwrap();
        assert!(matches!(second.start(), Err(Error::SessionAlreadyRunning)));
        first.stop();
    }

    #[test]
    fn test_stop_twice_is_noop() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let (profiler, registry) = private(&[InstrumentKind::LockContention], dir.path());
        profiler.start().unwrap();

        let first = profiler.stop();
        assert!(first.performed());
        assert_eq!(first.stopped, vec![InstrumentKind::LockContention]);

        // Another session takes the registry; a stray second stop must not release it
        assert!(registry.try_acquire());
        let second = profiler.stop();
        assert!(!second.performed());
        assert!(second.stopped.is_empty());
        assert!(registry.is_held());
        registry.release();
    }

    #[test]
    fn test_concurrent_stop_runs_once() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let (profiler, _) = private(
            &[InstrumentKind::BlockingWait, InstrumentKind::ThreadCreation],
            dir.path(),
        );
        profiler.start().unwrap();

        let reports: Vec<StopReport> = thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| profiler.stop())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(reports.iter().filter(|r| r.performed()).count(), 1);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let (profiler, _) = private(&[InstrumentKind::ThreadCreation], dir.path());
        assert!(!profiler.stop().performed());
        assert_eq!(profiler.state(), SessionState::Idle);
        profiler.start().unwrap();
        assert!(profiler.stop().performed());
    }

    #[test]
    fn test_stopped_session_not_reusable() {
        let dir = tempfile::tempdir().unwrap();
        let (profiler, _) = private(&[], dir.path());
        profiler.start().unwrap();
        profiler.stop();
        assert!(matches!(
            profiler.start(),
            Err(Error::InvalidState {
                expected: SessionState::Idle,
                actual: SessionState::Stopped,
            })
        ));
    }

    #[test]
    fn test_partial_start_unwound_by_stop() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let blocker = File::create(dir.path().join("elsewhere.out")).unwrap();
        trace::start(&blocker).unwrap();

        let (profiler, registry) = private(
            &[
                InstrumentKind::LockContention,
                InstrumentKind::ExecutionTrace,
                InstrumentKind::GoroutineSnapshot,
            ],
            dir.path(),
        );
        let err = profiler.start().unwrap_err();
        assert!(matches!(
            err,
            Error::InstrumentStart {
                kind: InstrumentKind::ExecutionTrace,
                ..
            }
        ));
        assert_eq!(profiler.state(), SessionState::Running);
        assert!(registry.is_held());
        assert_eq!(contention::fraction(), 1);

        let report = profiler.stop();
        assert_eq!(report.stopped, vec![InstrumentKind::LockContention]);
        assert_eq!(contention::fraction(), 0);
        assert!(!registry.is_held());
        assert!(!dir.path().join("goroutine.pprof").exists());

        trace::stop().unwrap();
    }

    #[test]
    fn test_global_counters_restored() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let before = heap::set_sample_rate(12345);
        let raw = RawConfig {
            modes: vec!["mem,mutex,block".into()],
            dir_path: dir.path().to_string_lossy().into_owned(),
            mem_profile_rate: 1,
            ..RawConfig::default()
        };
        let profiler = Profiler::with_registry(
            SessionConfig::resolve(&raw).unwrap(),
            Arc::new(SessionRegistry::new()),
        );

        profiler.start().unwrap();
        assert_eq!(heap::sample_rate(), 1);
        profiler.stop();

        assert_eq!(heap::sample_rate(), 12345);
        assert_eq!(contention::fraction(), 0);
        assert_eq!(blocking::rate(), 0);
        heap::set_sample_rate(before);
    }

    #[test]
    fn test_drop_stops_running_session() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SessionRegistry::new());
        {
            let profiler = Profiler::with_registry(
                config(&[InstrumentKind::ThreadCreation], dir.path()),
                Arc::clone(&registry),
            );
            profiler.start().unwrap();
            assert!(registry.is_held());
        }
        assert!(!registry.is_held());
    }

    #[test]
    fn test_output_create_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the output file should go makes File::create fail
        std::fs::create_dir(dir.path().join("threadcreate.pprof")).unwrap();
        let (profiler, registry) = private(&[InstrumentKind::ThreadCreation], dir.path());

        assert!(matches!(profiler.start(), Err(Error::OutputCreate { .. })));
        profiler.stop();
        assert!(!registry.is_held());
    }

    #[test]
    fn test_requested_shutdown_stops_session() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&[InstrumentKind::ThreadCreation], dir.path());
        cfg.auto_shutdown_on_interrupt = true;
        let registry = Arc::new(SessionRegistry::new());
        let profiler = Profiler::with_registry(cfg, Arc::clone(&registry));

        profiler.start().unwrap();
        assert!(profiler.shutdown_token().request());
        assert!(wait_for_state(&profiler, SessionState::Stopped));
        assert!(!registry.is_held());
        assert!(!profiler.stop().performed());
    }

    #[test]
    fn test_interrupt_stops_session_without_exit() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&[InstrumentKind::GoroutineSnapshot], dir.path());
        cfg.auto_shutdown_on_interrupt = true;
        cfg.exit_on_interrupt = false;
        let profiler = Profiler::with_registry(cfg, Arc::new(SessionRegistry::new()));

        profiler.start().unwrap();
        shutdown::broadcast_interrupt();
        assert!(wait_for_state(&profiler, SessionState::Stopped));
        assert_eq!(
            profiler.shutdown_token().reason(),
            Some(ShutdownReason::Interrupt)
        );
        assert!(dir.path().join("goroutine.pprof").exists());
    }

    #[cfg(feature = "cpu")]
    #[test]
    fn test_cpu_and_heap_scenario() {
        let _guard = facilities_lock();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("prof");
        let (profiler, _) = private(
            &[InstrumentKind::ExecutionTime, InstrumentKind::HeapAllocation],
            &out,
        );

        profiler.start().unwrap();
        let mut acc = 0u64;
        for i in 0..200_000u64 {
            acc = acc.wrapping_mul(31).wrapping_add(i);
        }
        assert_ne!(acc, 1);
        let outputs = profiler.stop().into_result().unwrap();

        assert_eq!(outputs, vec![out.join("cpu.pprof"), out.join("mem.pprof")]);
        assert_eq!(file_names(&out), vec!["cpu.pprof", "mem.pprof"]);
        #[cfg(target_os = "linux")]
        assert_eq!(open_handles_under(&out.canonicalize().unwrap()), 0);
    }

    /// File descriptors of this process that point into `dir`
    #[cfg(target_os = "linux")]
    fn open_handles_under(dir: &Path) -> usize {
        std::fs::read_dir("/proc/self/fd")
            .unwrap()
            .filter_map(|e| std::fs::read_link(e.ok()?.path()).ok())
            .filter(|target| target.starts_with(dir))
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_handles_open_until_stop() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().canonicalize().unwrap();
        let (profiler, _) = private(
            &[InstrumentKind::ThreadCreation, InstrumentKind::GoroutineSnapshot],
            &out,
        );

        profiler.start().unwrap();
        assert_eq!(open_handles_under(&out), 2);
        profiler.stop();
        assert_eq!(open_handles_under(&out), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_does_not_block_later_instruments() {
        let _guard = facilities_lock();
        if !Path::new("/dev/full").exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        // Every write to the contention output fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", dir.path().join("mutex.pprof")).unwrap();
        let (profiler, registry) = private(
            &[InstrumentKind::LockContention, InstrumentKind::ThreadCreation],
            dir.path(),
        );

        profiler.start().unwrap();
        let report = profiler.stop();

        assert!(report.performed());
        assert_eq!(report.stopped, vec![InstrumentKind::ThreadCreation]);
        assert_eq!(report.outputs, vec![dir.path().join("threadcreate.pprof")]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            Error::OutputWrite {
                kind: InstrumentKind::LockContention,
                ..
            }
        ));
        assert_eq!(contention::fraction(), 0);
        assert!(!registry.is_held());
        assert_eq!(profiler.state(), SessionState::Stopped);
        assert!(matches!(
            report.into_result(),
            Err(Error::OutputWrite { .. })
        ));
    }
}
