//! Unix process management with safe spawn/terminate using process groups
//!
//! Dev servers routinely fork their own children (bundlers, file watchers,
//! worker pools). To stop one reliably we place every spawned process in its
//! own process group via `setsid()` and signal the whole group. `setsid()`:
//!
//! - creates a new session with the child as session leader
//! - creates a new process group with the child as group leader
//! - detaches from the controlling terminal
//!
//! Termination resolves the group id of the child and signals the whole
//! group; if resolution fails the child alone is signaled, and descendants
//! it spawned may be orphaned on that path.

// Allow unsafe code for this module since process management requires libc::setsid() calls
#![allow(unsafe_code)]

use crate::{CoreError, Result};
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::{getpgid, Pid};
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, error};

/// A child process running as the leader of its own process group
#[derive(Debug)]
pub struct ChildProcess {
    pid: Pid,
    child: Child,
}

impl ChildProcess {
    /// Get the process ID (also the process group ID, since the child is a
    /// session leader)
    pub fn pid(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    /// Wait for the process to exit and return its exit status
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        self.child.wait().await.map_err(|e| {
            CoreError::ProcessWait(format!("Failed to wait for process {}: {}", self.pid, e))
        })
    }

    /// Take the stdout handle for async reading, if not already taken
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the stderr handle for async reading, if not already taken
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }
}

/// Spawn a new process in its own process group
///
/// stdout and stderr are piped so the capture tasks can read them. The
/// `pre_exec` closure calls `libc::setsid()` in the child before `exec()`;
/// `setsid()` is async-signal-safe, which is what makes it legal there.
pub fn spawn(cmd: &str, args: &[String], cwd: &Path) -> Result<ChildProcess> {
    debug!("Spawning process: {} {:?} in {:?}", cmd, args, cwd);

    let mut command = Command::new(cmd);
    command.args(args);
    command.current_dir(cwd);
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    #[deny(unsafe_op_in_unsafe_fn)]
    unsafe {
        command.pre_exec(|| {
            // Create a new session and process group
            let result = libc::setsid();
            if result == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = command.spawn().map_err(|e| {
        error!("Failed to spawn process '{}': {}", cmd, e);
        CoreError::ProcessSpawn(format!("Failed to spawn '{}': {}", cmd, e))
    })?;

    let raw_pid = child
        .id()
        .ok_or_else(|| CoreError::ProcessSpawn("Spawned child did not have a PID".to_string()))?;
    let pid = Pid::from_raw(raw_pid as i32);
    debug!("Successfully spawned process {} in new process group", pid);

    Ok(ChildProcess { pid, child })
}

/// Send SIGTERM to the process group leading at `pid`, falling back to the
/// child alone when the group id cannot be resolved
///
/// `ESRCH` (no such process) and `EPERM` are treated as success: the desired
/// end state (not running) already holds, or is about to. The actual state
/// transition is owned by the exit observer, never by the signaling path.
pub fn terminate_group_or_child(pid: u32) -> Result<()> {
    let pid = Pid::from_raw(pid as i32);

    match getpgid(Some(pid)) {
        Ok(pgid) => {
            debug!("Sending SIGTERM to process group {}", pgid);
            swallow_gone(killpg(pgid, Signal::SIGTERM), pid)
        }
        Err(e) => {
            // Group resolution failed; signal the child directly. Descendants
            // it spawned may be orphaned on this path.
            debug!(
                "Failed to resolve process group of {} ({}), signaling child directly",
                pid, e
            );
            swallow_gone(kill(pid, Signal::SIGTERM), pid)
        }
    }
}

fn swallow_gone(result: nix::Result<()>, pid: Pid) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => {
            debug!("Process {} already exited", pid);
            Ok(())
        }
        Err(nix::errno::Errno::EPERM) => {
            debug!(
                "Permission denied signaling {} (likely already exited)",
                pid
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to send SIGTERM to {}: {}", pid, e);
            Err(CoreError::ProcessSignal(format!(
                "Failed to send SIGTERM to {}: {}",
                pid, e
            )))
        }
    }
}
