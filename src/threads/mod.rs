//! Thread snapshots read from `/proc/<pid>/task`.
//!
//! Used by the thread-creation and goroutine-snapshot instruments. On systems
//! without procfs [`list`] returns `None` and those instruments write nothing.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One live thread of the current process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub tid: i32,
    pub name: String,
    pub state: char,
    pub wchan: String,
}

impl ThreadInfo {
    pub fn state_description(&self) -> &'static str {
        match self.state {
            'R' => "running",
            'S' => "sleeping",
            'D' => "uninterruptible wait",
            'T' => "stopped",
            't' => "tracing stop",
            'Z' => "zombie",
            'X' => "dead",
            'I' => "idle",
            _ => "unknown",
        }
    }
}

fn task_dir() -> PathBuf {
    PathBuf::from(format!("/proc/{}/task", nix::unistd::getpid()))
}

/// List the live threads of this process, ordered by tid
pub fn list() -> Option<Vec<ThreadInfo>> {
    list_in(&task_dir())
}

fn list_in(task_dir: &Path) -> Option<Vec<ThreadInfo>> {
    let entries = fs::read_dir(task_dir).ok()?;

    let mut threads: Vec<ThreadInfo> = entries
        .flatten()
        .filter_map(|entry| {
            let tid: i32 = entry.file_name().to_str()?.parse().ok()?;
            // Threads can exit between read_dir and the reads below
            read_thread(&entry.path(), tid)
        })
        .collect();

    threads.sort_by_key(|t| t.tid);
    Some(threads)
}

fn read_thread(dir: &Path, tid: i32) -> Option<ThreadInfo> {
    let stat = fs::read_to_string(dir.join("stat")).ok()?;
    let state = parse_stat_state(&stat)?;
    let name = fs::read_to_string(dir.join("comm"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let wchan = fs::read_to_string(dir.join("wchan"))
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty() && s != "0")
        .unwrap_or_else(|| "-".to_string());

    Some(ThreadInfo {
        tid,
        name,
        state,
        wchan,
    })
}

/// State letter from a `stat` line. The command name may itself contain
/// spaces and parentheses, so the field after the last ')' is used.
fn parse_stat_state(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().next()?.chars().next()
}

pub fn write_threadcreate<W: Write>(threads: &[ThreadInfo], out: &mut W) -> io::Result<()> {
    writeln!(out, "threadcreate profile: total {}", threads.len())?;
    for t in threads {
        writeln!(out, "1 @ {} {}", t.tid, t.name)?;
    }
    out.flush()
}

pub fn write_goroutine<W: Write>(threads: &[ThreadInfo], out: &mut W) -> io::Result<()> {
    writeln!(out, "goroutine profile: total {}", threads.len())?;
    for t in threads {
        writeln!(
            out,
            "thread {} [{}]: {}",
            t.tid,
            t.state_description(),
            t.name
        )?;
        writeln!(out, "\twchan: {}", t.wchan)?;
    }
    out.flush()
}
