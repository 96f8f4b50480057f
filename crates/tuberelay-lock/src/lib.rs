// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-instance process lock backed by a PID file.
//!
//! At startup the bot acquires [`LockGuard`], which records its PID and
//! creation time in a small JSON file. A competing start either reclaims a
//! stale record (older than the configured timeout, owner dead, or
//! unreadable), or asks the live owner to exit: graceful terminate first,
//! forced kill after a bounded grace period. If the owner survives both, the
//! acquire fails with [`TuberelayError::LockContention`] and startup must
//! abort -- proceeding would risk two owners.
//!
//! The guard releases the record on drop, so every exit path (normal return,
//! signal-initiated shutdown, unwind) deletes the file.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tracing::{debug, info, warn};

use tuberelay_config::model::LockConfig;
use tuberelay_core::TuberelayError;

/// How often the terminate path re-checks whether the owner exited.
const TERMINATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra wait after a forced kill before giving up.
const FORCED_EXIT_GRACE: Duration = Duration::from_millis(500);

/// Upper bound on reclaim-and-retry rounds during acquire.
const ACQUIRE_MAX_ATTEMPTS: u32 = 3;

/// The on-disk lock record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub owner_pid: u32,
    pub created_at: DateTime<Utc>,
}

/// Observed state of a lock file, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lock record exists.
    Unlocked,
    /// The record names the current process.
    HeldBySelf,
    /// The record names another process that is alive and within the
    /// staleness window.
    HeldByOtherFresh,
    /// The record is reclaimable: too old, owner dead, or unreadable.
    HeldByOtherStale,
}

/// Scoped owner of the single-instance lock file.
///
/// Dropping the guard releases the lock.
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Acquire the lock at `path`, displacing stale or unresponsive owners.
    ///
    /// Re-acquiring in the same process is a no-op that returns a second
    /// guard over the same record.
    pub fn acquire(path: PathBuf, config: &LockConfig) -> Result<Self, TuberelayError> {
        let grace = Duration::from_secs(config.terminate_grace_secs);
        let own_pid = std::process::id();

        for attempt in 0..ACQUIRE_MAX_ATTEMPTS {
            match read_record(&path) {
                None => {
                    write_record(&path, own_pid)?;
                    info!(path = %path.display(), pid = own_pid, "lock acquired");
                    return Ok(Self {
                        path,
                        released: false,
                    });
                }
                Some(record) if record.owner_pid == own_pid => {
                    debug!(path = %path.display(), "lock already held by this process");
                    return Ok(Self {
                        path,
                        released: false,
                    });
                }
                Some(record) => {
                    if record_is_stale(&record, config.stale_timeout_secs) {
                        warn!(
                            owner_pid = record.owner_pid,
                            created_at = %record.created_at,
                            "reclaiming stale lock record"
                        );
                        remove_lock_file(&path);
                        continue;
                    }

                    info!(
                        owner_pid = record.owner_pid,
                        attempt,
                        "lock held by a live instance, requesting termination"
                    );
                    terminate_process(record.owner_pid, grace)
                        .map_err(TuberelayError::LockContention)?;
                    remove_lock_file(&path);
                }
            }
        }

        Err(TuberelayError::LockContention(format!(
            "gave up after {ACQUIRE_MAX_ATTEMPTS} attempts at {}",
            path.display()
        )))
    }

    /// Inspect the lock file without acquiring it.
    pub fn inspect(path: &Path, config: &LockConfig) -> LockState {
        match read_record(path) {
            None => {
                if path.exists() {
                    // Present but unreadable: reclaimable.
                    LockState::HeldByOtherStale
                } else {
                    LockState::Unlocked
                }
            }
            Some(record) if record.owner_pid == std::process::id() => LockState::HeldBySelf,
            Some(record) => {
                if record_is_stale(&record, config.stale_timeout_secs) {
                    LockState::HeldByOtherStale
                } else {
                    LockState::HeldByOtherFresh
                }
            }
        }
    }

    /// Release the lock. Idempotent; deletes the record only if this
    /// process still owns it.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match read_record(&self.path) {
            Some(record) if record.owner_pid == std::process::id() => {
                remove_lock_file(&self.path);
                debug!(path = %self.path.display(), "lock released");
            }
            Some(record) => {
                warn!(
                    owner_pid = record.owner_pid,
                    "lock record no longer ours, leaving it in place"
                );
            }
            None => {}
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Whether a record is reclaimable: older than the timeout, or its owner
/// process no longer exists.
fn record_is_stale(record: &LockRecord, stale_timeout_secs: u64) -> bool {
    let age = Utc::now().signed_duration_since(record.created_at);
    if age.num_seconds() >= 0 && age.num_seconds() as u64 > stale_timeout_secs {
        return true;
    }
    !process_alive(record.owner_pid)
}

/// Read and parse the lock record. An unreadable or corrupt file yields
/// `None` and is treated as stale by callers.
fn read_record(path: &Path) -> Option<LockRecord> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt lock record");
            None
        }
    }
}

fn write_record(path: &Path, pid: u32) -> Result<(), TuberelayError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| TuberelayError::Storage {
            message: format!("failed to create lock directory {}", parent.display()),
            source: Some(Box::new(e)),
        })?;
    }
    let record = LockRecord {
        owner_pid: pid,
        created_at: Utc::now(),
    };
    let contents = serde_json::to_string(&record)
        .map_err(|e| TuberelayError::Internal(format!("failed to serialize lock record: {e}")))?;
    std::fs::write(path, contents).map_err(|e| TuberelayError::Storage {
        message: format!("failed to write lock file {}", path.display()),
        source: Some(Box::new(e)),
    })
}

fn remove_lock_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove lock file");
    }
}

fn process_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).is_some()
}

/// Ask `pid` to exit: graceful terminate, bounded wait, forced kill,
/// bounded wait again. `Err` means the process survived both.
fn terminate_process(pid_u32: u32, grace: Duration) -> Result<(), String> {
    let pid = Pid::from_u32(pid_u32);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    let Some(process) = sys.process(pid) else {
        return Ok(()); // Already gone.
    };

    if process.kill_with(Signal::Term).is_none() {
        // Platform without a graceful signal; go straight to a forced kill.
        process.kill();
    }

    if wait_for_exit(pid, grace) {
        return Ok(());
    }

    warn!(pid = pid_u32, "graceful terminate timed out, escalating");
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    if let Some(process) = sys.process(pid) {
        process.kill();
    }

    if wait_for_exit(pid, FORCED_EXIT_GRACE) {
        Ok(())
    } else {
        Err(format!("process {pid_u32} survived forced termination"))
    }
}

fn wait_for_exit(pid: Pid, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    loop {
        if !process_alive(pid.as_u32()) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(TERMINATE_POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config() -> LockConfig {
        LockConfig {
            enabled: true,
            path: None,
            stale_timeout_secs: 600,
            terminate_grace_secs: 2,
        }
    }

    fn write_raw_record(path: &Path, pid: u32, created_at: DateTime<Utc>) {
        let record = LockRecord {
            owner_pid: pid,
            created_at,
        };
        std::fs::write(path, serde_json::to_string(&record).unwrap()).unwrap();
    }

    /// A PID that almost certainly names no live process.
    const DEAD_PID: u32 = 3_999_999;

    #[test]
    fn acquire_when_absent_writes_own_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");

        let _guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();

        let record = read_record(&path).expect("record should exist");
        assert_eq!(record.owner_pid, std::process::id());
    }

    #[test]
    fn acquire_twice_in_same_process_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");
        let config = test_config();

        let _first = LockGuard::acquire(path.clone(), &config).unwrap();
        let first_record = read_record(&path).unwrap();

        let _second = LockGuard::acquire(path.clone(), &config).unwrap();
        let second_record = read_record(&path).unwrap();

        assert_eq!(first_record.owner_pid, second_record.owner_pid);
        assert_eq!(first_record.created_at, second_record.created_at);
    }

    #[cfg(unix)]
    #[test]
    fn stale_by_age_is_reclaimed_even_with_live_owner() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");

        // A live process (spawned child), but a record far past the timeout.
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        write_raw_record(
            &path,
            child.id(),
            Utc::now() - chrono::Duration::seconds(3600),
        );

        let guard = LockGuard::acquire(path.clone(), &test_config());
        assert!(guard.is_ok(), "aged-out record must be reclaimable");
        assert_eq!(read_record(&path).unwrap().owner_pid, std::process::id());

        let _ = child.kill();
        let _ = child.wait();
    }

    #[test]
    fn stale_by_dead_owner_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");
        write_raw_record(&path, DEAD_PID, Utc::now());

        let _guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();
        assert_eq!(read_record(&path).unwrap().owner_pid, std::process::id());
    }

    #[test]
    fn corrupt_record_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");
        std::fs::write(&path, "not json at all").unwrap();

        let _guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();
        assert_eq!(read_record(&path).unwrap().owner_pid, std::process::id());
    }

    #[cfg(unix)]
    #[test]
    fn fresh_live_owner_is_terminated_and_displaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");

        let child = std::process::Command::new("sleep")
            .arg("60")
            .spawn()
            .expect("spawn sleep");
        let child_pid = child.id();
        write_raw_record(&path, child_pid, Utc::now());

        let _guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();
        assert_eq!(read_record(&path).unwrap().owner_pid, std::process::id());
        assert!(
            !process_alive(child_pid),
            "previous owner should have been terminated"
        );
    }

    #[test]
    fn release_is_idempotent_and_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");

        let mut guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();
        guard.release();
        assert!(!path.exists());
        guard.release(); // No-op.
        assert!(!path.exists());
    }

    #[test]
    fn drop_releases_the_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");

        {
            let _guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn release_leaves_foreign_records_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");

        let mut guard = LockGuard::acquire(path.clone(), &test_config()).unwrap();
        // Simulate another process having replaced the record.
        write_raw_record(&path, DEAD_PID, Utc::now());

        guard.release();
        assert!(path.exists(), "foreign record must not be deleted");
        assert_eq!(read_record(&path).unwrap().owner_pid, DEAD_PID);
    }

    #[test]
    fn inspect_reports_states() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bot.lock");
        let config = test_config();

        assert_eq!(LockGuard::inspect(&path, &config), LockState::Unlocked);

        write_raw_record(&path, DEAD_PID, Utc::now());
        assert_eq!(
            LockGuard::inspect(&path, &config),
            LockState::HeldByOtherStale
        );

        write_raw_record(&path, std::process::id(), Utc::now());
        assert_eq!(LockGuard::inspect(&path, &config), LockState::HeldBySelf);
    }
}
