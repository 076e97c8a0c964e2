//! External process execution shared by the tool adapters.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Captured output of a finished process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// Run `program args...` in `dir` and capture its output.
///
/// A non-zero exit status is not an error here; linters use it to signal
/// findings. On unix the child leads its own process group, and the whole
/// group is killed if the returned future is dropped before the child exits.
pub async fn run(program: &str, args: &[String], dir: &Path) -> std::io::Result<ProcessOutput> {
    debug!(program, ?args, dir = %dir.display(), "spawning");

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn()?;
    let group = ProcessGroup::new(child.id());
    let output = child.wait_with_output().await?;
    group.disarm();

    Ok(ProcessOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Kills a spawned process group on drop unless disarmed.
///
/// `kill_on_drop` only reaches the direct child; helpers it started
/// (go vet's analysis driver, golangci-lint's workers) share its group.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    /// The child exited on its own; leave the group alone.
    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        let Some(pgid) = self.pgid else {
            return;
        };
        debug!(pgid, "killing process group");
        #[cfg(unix)]
        {
            // SAFETY: killpg only sends a signal; the group was created for
            // this child by process_group(0).
            unsafe {
                libc::killpg(pgid as libc::pid_t, libc::SIGKILL);
            }
        }
    }
}

/// Resolve an executable name against `PATH`.
///
/// Names containing a path separator are checked directly.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| executable_names(name).map(move |n| dir.join(n)))
        .find(|p| is_executable(p))
}

#[cfg(windows)]
fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    ["", ".exe", ".cmd", ".bat"]
        .into_iter()
        .map(move |ext| format!("{}{}", name, ext))
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(name.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
