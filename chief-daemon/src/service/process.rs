//! Step process execution
//!
//! Runs one pipeline step as a child process and captures its combined output.
//! Stdout and stderr are read concurrently and merged line by line in arrival
//! order.

use chief_core::domain::pipeline::Step;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Outcome of a step that was launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    /// Combined stdout/stderr, one line per captured line
    pub output: String,
    /// Exit code, `None` when the process was killed by a signal
    pub exit_status: Option<i32>,
    pub success: bool,
}

impl StepOutput {
    /// Log entry recorded for this step
    pub fn log_entry(&self, step: &Step) -> String {
        if self.output.is_empty() {
            format!("$ {}", step)
        } else {
            format!("$ {}\n{}", step, self.output)
        }
    }
}

/// Runs `step` with `cwd` as working directory and waits for it to exit
///
/// The child is killed if the returned future is dropped before completion.
///
/// Output is decoded lossily, so bytes that are not UTF-8 never fail a step.
///
/// # Errors
/// Returns the spawn error if the executable could not be launched, or the
/// wait error if the child's exit status could not be collected.
pub async fn run_step(step: &Step, cwd: &Path) -> io::Result<StepOutput> {
    debug!("Executing step `{}` in {}", step, cwd.display());

    let mut child = Command::new(&step.command)
        .args(&step.arguments)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut lines = Vec::new();

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    if let (Some(stdout), Some(stderr)) = (stdout, stderr) {
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut stdout_buf), if stdout_open => {
                    stdout_open = collect_line(read, &mut stdout_buf, &mut lines, step);
                },
                read = stderr.read_until(b'\n', &mut stderr_buf), if stderr_open => {
                    stderr_open = collect_line(read, &mut stderr_buf, &mut lines, step);
                },
            }
        }
    }

    let status = child.wait().await?;

    debug!("Step `{}` exited with {}", step, status);

    Ok(StepOutput {
        output: lines.join("\n"),
        exit_status: status.code(),
        success: status.success(),
    })
}

/// Moves one completed line from `buf` into `lines`
///
/// Returns whether the stream is still open. A read error closes the stream;
/// the step keeps running and its exit status still decides the outcome.
fn collect_line(
    read: io::Result<usize>,
    buf: &mut Vec<u8>,
    lines: &mut Vec<String>,
    step: &Step,
) -> bool {
    let open = match read {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) => {
            warn!("Stopped reading output of `{}`: {}", step, e);
            false
        }
    };

    if !buf.is_empty() {
        let line = String::from_utf8_lossy(buf);
        lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        buf.clear();
    }

    open
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwd() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[tokio::test]
    async fn test_successful_step_captures_output() {
        let dir = cwd();
        let step = Step::new("echo", ["hello", "world"]);

        let result = run_step(&step, dir.path()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.exit_status, Some(0));
        assert_eq!(result.output, "hello world");
        assert_eq!(result.log_entry(&step), "$ echo hello world\nhello world");
    }

    #[tokio::test]
    async fn test_step_captures_stderr() {
        let dir = cwd();
        let step = Step::new("sh", ["-c", "echo out; echo err 1>&2"]);

        let result = run_step(&step, dir.path()).await.unwrap();
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[tokio::test]
    async fn test_failing_step_reports_exit_status() {
        let dir = cwd();
        let step = Step::new("sh", ["-c", "exit 3"]);

        let result = run_step(&step, dir.path()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_status, Some(3));
        assert_eq!(result.log_entry(&step), "$ sh -c exit 3");
    }

    #[tokio::test]
    async fn test_step_runs_in_working_directory() {
        let dir = cwd();
        std::fs::write(dir.path().join("marker.txt"), "present").unwrap();
        let step = Step::new("cat", ["marker.txt"]);

        let result = run_step(&step, dir.path()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "present");
    }

    #[tokio::test]
    async fn test_missing_executable_is_a_launch_error() {
        let dir = cwd();
        let step = Step::new("chief-definitely-not-a-real-binary", ["--help"]);

        assert!(run_step(&step, dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_non_utf8_output_is_decoded_lossily() {
        let dir = cwd();
        let step = Step::new("sh", ["-c", "printf 'caf\\351\\n'; printf 'tail'"]);

        let result = run_step(&step, dir.path()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "caf\u{FFFD}\ntail");
    }
}
