use crate::blocking;
use crate::config::RawConfig;
use crate::contention::ProfiledMutex;
use crate::error::Result;
use crate::session::Profiler;
use crate::shutdown::{self, ShutdownToken};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

const RETAINED_BUFFERS: usize = 64;

/// What the workload got through before it stopped
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub iterations: u64,
    pub allocated_bytes: u64,
    pub interrupted: bool,
}

struct Shared {
    counter: ProfiledMutex<u64>,
    retained: ProfiledMutex<Vec<Vec<u8>>>,
    iterations: AtomicU64,
    allocated: AtomicU64,
}

/// Run the workload on `workers` threads until `duration` elapses or `token`
/// is triggered.
pub fn run_workload(workers: usize, duration: Duration, token: &ShutdownToken) -> WorkloadSummary {
    let shared = Shared {
        counter: ProfiledMutex::new(0),
        retained: ProfiledMutex::new(Vec::with_capacity(RETAINED_BUFFERS)),
        iterations: AtomicU64::new(0),
        allocated: AtomicU64::new(0),
    };
    let deadline = Instant::now() + duration;

    thread::scope(|s| {
        for id in 0..workers {
            let shared = &shared;
            let spawned = thread::Builder::new()
                .name(format!("demo-worker-{id}"))
                .spawn_scoped(s, move || worker(id, shared, deadline, token));
            if let Err(e) = spawned {
                warn!("could not spawn worker {id}: {e}");
            }
        }
    });

    WorkloadSummary {
        iterations: shared.iterations.load(Ordering::Relaxed),
        allocated_bytes: shared.allocated.load(Ordering::Relaxed),
        interrupted: token.is_triggered(),
    }
}

fn worker(id: usize, shared: &Shared, deadline: Instant, token: &ShutdownToken) {
    let mut round: u64 = 0;
    while Instant::now() < deadline && !token.is_triggered() {
        let _span = info_span!("demo_round", worker = id, round).entered();

        // Allocation churn across several size classes
        let size = 64usize << (round % 12);
        let buffer = black_box(vec![id as u8; size]);
        shared.allocated.fetch_add(size as u64, Ordering::Relaxed);
        if let Ok(mut retained) = shared.retained.lock() {
            if retained.len() >= RETAINED_BUFFERS {
                retained.swap_remove((round as usize) % RETAINED_BUFFERS);
            }
            retained.push(buffer);
        }

        // Contended critical section
        if let Ok(mut counter) = shared.counter.lock() {
            *counter = black_box(counter.wrapping_add(spin(2_000)));
            thread::sleep(Duration::from_micros(200));
        }

        // Blocking wait outside any lock
        blocking::observe(|| thread::sleep(Duration::from_micros(500)));

        shared.iterations.fetch_add(1, Ordering::Relaxed);
        round += 1;
    }
}

fn spin(n: u64) -> u64 {
    (0..n).fold(0u64, |acc, i| acc.wrapping_mul(31).wrapping_add(black_box(i)))
}

/// Run the demo command
pub fn run(profile: &RawConfig, duration: Duration, workers: usize) -> Result<WorkloadSummary> {
    let profiler = Profiler::from_raw(profile)?;
    let token = profiler.shutdown_token();
    profiler.start()?;

    // The demo stops early on Ctrl-C even without the session's own watcher
    match shutdown::install_interrupt_hook() {
        Ok(()) => shutdown::subscribe(&token),
        Err(e) => warn!("Ctrl-C will not stop the demo early: {e}"),
    }
    info!(
        kinds = ?profiler.kinds(),
        dir = %profiler.config().output_dir.display(),
        "profiling demo workload for {}",
        humantime::format_duration(duration)
    );

    let summary = run_workload(workers, duration, &token);
    let outputs = profiler.stop().into_result()?;

    eprintln!(
        "Ran {} iterations ({} allocated){}",
        summary.iterations,
        summary.allocated_bytes,
        if summary.interrupted { ", interrupted" } else { "" }
    );
    for path in outputs {
        println!("{}", path.display());
    }
    Ok(summary)
}
