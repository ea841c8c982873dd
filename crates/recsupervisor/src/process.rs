//! Process-group spawning and signaling.
//!
//! Every supervised child is started in its own session (`setsid`) so that
//! stopping it can signal the whole process group (`killpg`) rather than
//! just the immediate child, avoiding orphaned grandchildren.

use std::collections::HashMap;
use std::os::unix::process::CommandExt;
use std::path::Path;
use tokio::process::{Child, Command};

use recconfig::ServiceRecord;

/// Spawn a service's command as the leader of a new process group.
pub fn spawn(record: &ServiceRecord) -> std::io::Result<Child> {
    let mut cmd = Command::new(&record.command);
    cmd.args(&record.args);
    cmd.current_dir(Path::new(&record.cwd));
    cmd.envs(env_map(&record.env));
    cmd.kill_on_drop(false);

    // SAFETY: setsid(2) only affects the child process after fork, before
    // exec; it takes no arguments derived from user input and cannot fail
    // in a way that corrupts parent state.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    cmd.spawn()
}

fn env_map(env: &HashMap<String, String>) -> impl Iterator<Item = (&str, &str)> {
    env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

/// Signal an entire process group. `pid` must be the group leader's pid
/// (true for every process spawned via [`spawn`], since `setsid` makes the
/// child its own group leader).
pub fn signal_group(pid: i32, signal: i32) -> std::io::Result<()> {
    // killpg expects a positive pgid.
    let result = unsafe { libc::killpg(pid, signal) };
    if result == -1 {
        let err = std::io::Error::last_os_error();
        // ESRCH: the group is already gone, which is the desired end state.
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

/// True if a pid still refers to a live process (signal 0 probe).
pub fn is_alive(pid: i32) -> bool {
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_nonexistent_group_is_not_an_error() {
        // A pid this high is virtually certain not to exist.
        let result = signal_group(i32::MAX - 1, libc::SIGTERM);
        assert!(result.is_ok());
    }

    #[test]
    fn test_is_alive_for_self() {
        let pid = std::process::id() as i32;
        assert!(is_alive(pid));
    }
}
