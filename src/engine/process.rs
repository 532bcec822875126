//! Child process plumbing for CLI-backed engines.

use std::collections::HashSet;
use std::io;
use std::process::{Child, Command};
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// PIDs of generation subprocesses currently owned by this process.
pub struct ProcessRegistry {
    pids: Mutex<HashSet<u32>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            pids: Mutex::new(HashSet::new()),
        }
    }

    pub fn register(&self, pid: u32) {
        self.pids.lock().unwrap_or_else(|e| e.into_inner()).insert(pid);
    }

    pub fn unregister(&self, pid: u32) {
        self.pids.lock().unwrap_or_else(|e| e.into_inner()).remove(&pid);
    }

    /// Snapshot of registered PIDs.
    pub fn pids(&self) -> Vec<u32> {
        self.pids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }

    /// Kill every registered process tree.
    pub fn kill_all(&self) {
        for pid in self.pids() {
            kill_process_tree(pid);
        }
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry consulted by the Ctrl+C handler.
pub static PROCESS_REGISTRY: Lazy<ProcessRegistry> = Lazy::new(ProcessRegistry::new);

/// Spawn `cmd` as the leader of a fresh process group.
#[cfg(unix)]
pub fn spawn_in_new_process_group(cmd: &mut Command) -> io::Result<Child> {
    use std::os::unix::process::CommandExt;

    unsafe {
        cmd.pre_exec(|| {
            libc::setpgid(0, 0);
            Ok(())
        });
    }
    cmd.spawn()
}

#[cfg(windows)]
pub fn spawn_in_new_process_group(cmd: &mut Command) -> io::Result<Child> {
    cmd.spawn()
}

/// Terminate a process group: SIGTERM, short grace period, then SIGKILL.
#[cfg(unix)]
pub fn kill_process_tree(pid: u32) {
    use std::thread;
    use std::time::Duration;

    let pgid = -(pid as i32);
    unsafe {
        libc::kill(pgid, libc::SIGTERM);
    }
    thread::sleep(Duration::from_millis(100));
    unsafe {
        libc::kill(pgid, libc::SIGKILL);
    }
}

#[cfg(windows)]
pub fn kill_process_tree(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .status();
}

/// Resolve a binary on PATH via `which`.
pub fn resolve_cli_path(name: &str) -> Option<String> {
    let output = Command::new("which").arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
