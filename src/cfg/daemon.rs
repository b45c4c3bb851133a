// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `start`/`terminate` process management: forking into a daemon, writing
//! the PID file, and signaling a running instance to stop (§6 "CLI and
//! operational surface"). Grounded directly on the original hub's
//! `startServer`/`terminateServer` helpers — double-fork + `setsid()` to
//! detach, `kill(pid, SIGKILL)` plus a PID-file reset to terminate.

use std::{
    fs::{self, File},
    path::Path,
};

use anyhow::{Context, Result};
use daemonize::Daemonize;
use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};
use tracing::info;

/// Fork into the background, redirecting stdout/stderr to `log_path` and
/// writing the child's PID to `pid_path`. Returns once the parent process
/// has handed off; code that needs to run only in the detached child should
/// call this before starting the async runtime.
pub fn daemonize(pid_path: &Path, log_path: &Path) -> Result<()> {
    if let Some(dir) = pid_path.parent() {
        fs::create_dir_all(dir).context("failed to create pid file directory")?;
    }
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir).context("failed to create log file directory")?;
    }

    let stdout = File::create(log_path)
        .with_context(|| format!("failed to create log file {log_path:?}"))?;
    let stderr = stdout
        .try_clone()
        .context("failed to duplicate log file handle for stderr")?;

    Daemonize::new()
        .pid_file(pid_path)
        .chown_pid_file(true)
        .working_directory(".")
        .stdout(stdout)
        .stderr(stderr)
        .start()
        .context("failed to daemonize")?;

    Ok(())
}

/// Read the PID file, tolerating a missing file as "no server running"
/// (`-1`), matching the original's graceful handling of a not-yet-created
/// PID file.
pub fn read_pid(pid_path: &Path) -> i32 {
    fs::read_to_string(pid_path)
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(-1)
}

/// `true` if `pid` names a live process, probed with signal `0` — the
/// standard "does this pid exist" check, sending nothing and never
/// affecting the target process.
fn is_running(pid: i32) -> bool {
    signal::kill(Pid::from_raw(pid), None).is_ok()
}

/// Read the PID file and report whether it names a still-running hub,
/// mirroring `startServer.cpp`'s pre-fork check: a stale PID file left by a
/// process that has since died is treated the same as "no server running".
pub fn running_pid(pid_path: &Path) -> Option<i32> {
    let pid = read_pid(pid_path);
    (pid > 0 && is_running(pid)).then_some(pid)
}

pub fn write_pid(pid_path: &Path, pid: i32) -> Result<()> {
    if let Some(dir) = pid_path.parent() {
        fs::create_dir_all(dir).context("failed to create pid file directory")?;
    }
    fs::write(pid_path, pid.to_string()).with_context(|| format!("failed to write {pid_path:?}"))
}

/// Signal the running hub to stop and reset the PID file to `-1`. A missing
/// PID file or a `-1` entry is treated as "already stopped" and is not an
/// error.
pub fn terminate(pid_path: &Path) -> Result<()> {
    let pid = read_pid(pid_path);
    if pid <= 0 {
        info!(%pid, "no running hub to terminate");
        return Ok(());
    }

    signal::kill(Pid::from_raw(pid), Signal::SIGKILL)
        .with_context(|| format!("failed to send SIGKILL to pid {pid}"))?;
    write_pid(pid_path, -1)?;
    info!(%pid, "hub terminated");
    Ok(())
}
