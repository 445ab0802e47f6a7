//! Subprocess execution wrapper.
//!
//! Every invocation gets its own directory:
//!
//! ```text
//! <base>/<tool_id>-<uuid>/
//!     output.log      stdout and stderr of the tool
//!     output/         working directory; result files land here
//! ```
//!
//! The wall-clock limit is enforced here by polling the child and killing
//! its whole process group, so workers started by wrapper scripts die with
//! it. CPU time and memory limits are delegated to `prlimit(1)` when a limit
//! is configured and the executable is on `PATH`; otherwise they are logged
//! and ignored. A tool the kernel kills for exceeding its CPU time counts as
//! timed out, like one that runs out of wall time.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    tool::{ResourceLimits, ToolRequest, ToolRun},
};
use coveriteam_core::traits::ToolRunner;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs tools as child processes below a base directory.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    base_dir: PathBuf,
    poll_interval: Duration,
}

impl ProcessRunner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn command(&self, argv: &[String], limits: &ResourceLimits) -> Command {
        let program = absolute_program(&argv[0]);
        let prlimit_args = prlimit_args(limits);

        if !prlimit_args.is_empty() {
            if let Some(prlimit) = find_on_path("prlimit") {
                let mut cmd = Command::new(prlimit);
                cmd.args(prlimit_args).arg("--").arg(program).args(&argv[1..]);
                return cmd;
            }
            warn!(program = %argv[0], "prlimit not found; cpu and memory limits are not enforced");
        }

        let mut cmd = Command::new(program);
        cmd.args(&argv[1..]);
        cmd
    }

    /// Wait for `child`, killing it once `limit` has elapsed.
    fn wait(&self, child: &mut Child, limit: Option<Duration>, started: Instant) -> std::io::Result<(ExitStatus, bool)> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok((status, false));
            }
            if limit.is_some_and(|l| started.elapsed() >= l) {
                // The child may exit between the check and the kill.
                let _ = kill_process_group(child);
                return Ok((child.wait()?, true));
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, request: &ToolRequest) -> CoveriResult<ToolRun> {
        let failure = |reason: String| CoveriError::ToolInvocation {
            tool: request.tool_id.clone(),
            reason,
        };
        if request.argv.is_empty() {
            return Err(failure("empty argument vector".to_string()));
        }

        // Result paths are handed to later tools, which run in other directories.
        let base_dir = if self.base_dir.is_relative() {
            std::env::current_dir()
                .map_err(|e| failure(format!("cannot resolve the working directory: {e}")))?
                .join(&self.base_dir)
        } else {
            self.base_dir.clone()
        };
        let run_dir = base_dir.join(format!("{}-{}", request.tool_id, Uuid::new_v4()));
        let output_dir = run_dir.join("output");
        let log_path = run_dir.join("output.log");
        fs::create_dir_all(&output_dir)
            .map_err(|e| failure(format!("cannot create '{}': {e}", output_dir.display())))?;

        let log = File::create(&log_path).map_err(|e| failure(format!("cannot create log: {e}")))?;
        let log_err = log.try_clone().map_err(|e| failure(format!("cannot share log: {e}")))?;

        let mut cmd = self.command(&request.argv, &request.limits);
        cmd.current_dir(&output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        debug!(tool_id = %request.tool_id, dir = %run_dir.display(), argv = ?request.argv, "spawning tool");

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| failure(format!("cannot start '{}': {e}", request.argv[0])))?;
        let (status, wall_timeout) = self
            .wait(&mut child, request.limits.wall_time(), started)
            .map_err(|e| failure(format!("waiting for the tool failed: {e}")))?;
        let runtime = started.elapsed();

        let exit_code = status.code();
        let cpu_timeout = exit_code.is_none() && !wall_timeout && hit_cpu_limit(&status, &request.limits);
        if exit_code.is_none() && !wall_timeout && !cpu_timeout {
            warn!(tool_id = %request.tool_id, status = %status, "tool terminated by a signal");
            return Err(failure(format!("terminated abnormally ({status})")));
        }
        if wall_timeout {
            warn!(tool_id = %request.tool_id, runtime_ms = runtime.as_millis() as u64, "wall-time limit exceeded");
        }
        if cpu_timeout {
            warn!(tool_id = %request.tool_id, status = %status, "cpu-time limit exceeded");
        }
        let timed_out = wall_timeout || cpu_timeout;

        let log_lines: Vec<String> = fs::read(&log_path)
            .map(|bytes| String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect())
            .map_err(|e| failure(format!("cannot read log: {e}")))?;
        let result_files = collect_files(&output_dir);

        info!(
            tool_id = %request.tool_id,
            exit_code = ?exit_code,
            timed_out,
            files = result_files.len(),
            "tool run collected"
        );

        Ok(ToolRun {
            tool_id: request.tool_id.clone(),
            exit_code,
            runtime,
            timed_out,
            log_path,
            log_lines,
            output_dir,
            result_files,
        })
    }
}

/// The child leads its own process group, so its pid is the group id.
#[cfg(unix)]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return child.kill();
    };
    // SAFETY: killpg only sends a signal; a stale group id yields ESRCH.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        Ok(())
    } else {
        child.kill()
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

/// The kernel sends SIGXCPU at the soft CPU limit and SIGKILL at the hard one.
#[cfg(unix)]
fn hit_cpu_limit(status: &ExitStatus, limits: &ResourceLimits) -> bool {
    use std::os::unix::process::ExitStatusExt;
    limits.cpu_time_secs.is_some() && matches!(status.signal(), Some(libc::SIGXCPU | libc::SIGKILL))
}

#[cfg(not(unix))]
fn hit_cpu_limit(_status: &ExitStatus, _limits: &ResourceLimits) -> bool {
    false
}

fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn prlimit_args(limits: &ResourceLimits) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(secs) = limits.cpu_time_secs {
        args.push(format!("--cpu={secs}"));
    }
    if let Some(mb) = limits.memory_mb {
        args.push(format!("--as={}", mb.saturating_mul(1024 * 1024)));
    }
    args
}

/// A relative program path with a directory part would otherwise be
/// resolved against the tool's working directory.
fn absolute_program(program: &str) -> PathBuf {
    let path = PathBuf::from(program);
    if path.is_relative() && path.components().count() > 1 {
        if let Ok(cwd) = std::env::current_dir() {
            return cwd.join(path);
        }
    }
    path
}

pub(crate) fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
