//! Child-process plumbing for command-backed oracles.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of one oracle process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Last non-empty stderr line, for compact error messages.
    pub fn stderr_tail(&self) -> String {
        String::from_utf8_lossy(&self.stderr)
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Run `argv` with `input` on stdin, a timeout, and a cap on captured output.
///
/// stdin is fed and stdout/stderr are drained on separate threads, so the
/// timeout holds even when the child never reads its input or floods a pipe.
/// A child that exits without reading all of stdin is not an error.
#[instrument(
    skip_all,
    fields(
        program = %argv.first().map(String::as_str).unwrap_or(""),
        timeout_secs = timeout.as_secs(),
    )
)]
pub fn run_with_input(
    argv: &[String],
    input: &[u8],
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<ProcessOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("oracle command must be non-empty"))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning oracle process");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(err = %e, "failed to spawn oracle process");
            return Err(e).with_context(|| format!("spawn {program}"));
        }
    };

    let (Some(stdin), Some(stdout), Some(stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        reap(&mut child);
        return Err(anyhow!("oracle stdio was not piped"));
    };

    let stdout_handle = thread::spawn(move || read_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_limited(stderr, output_limit_bytes));
    let input = input.to_vec();
    let stdin_handle = thread::spawn(move || write_input(stdin, &input));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            warn!(timeout_secs = timeout.as_secs(), "oracle timed out, killing");
            timed_out = true;
            child.kill().context("kill oracle")?;
            child.wait().context("wait oracle after kill")?
        }
        Err(e) => {
            reap(&mut child);
            return Err(e).context("wait for oracle");
        }
    };

    match stdin_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(err = %err, "failed to write prompt to oracle"),
        Err(_) => warn!("stdin writer thread panicked"),
    }
    let (stdout, stdout_truncated) = join_reader(stdout_handle).context("join stdout")?;
    let (stderr, _) = join_reader(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 {
        warn!(stdout_truncated, "oracle output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "oracle process finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        timed_out,
    })
}

/// Kill and wait a child on an early-return path; errors are only logged.
fn reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!(err = %err, "kill oracle");
    }
    if let Err(err) = child.wait() {
        debug!(err = %err, "wait oracle");
    }
}

/// Write the prompt and close stdin. A closed pipe means the child stopped reading.
fn write_input(mut stdin: ChildStdin, input: &[u8]) -> Result<()> {
    match stdin.write_all(input) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("oracle closed stdin before reading the whole prompt");
            Ok(())
        }
        Err(e) => Err(e).context("write prompt to stdin"),
    }
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        let keep = n.min(remaining);
        buf.extend_from_slice(&chunk[..keep]);
        truncated += n - keep;
    }

    Ok((buf, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn echoes_stdin_back() {
        let output = run_with_input(&sh("cat"), b"hello", Duration::from_secs(5), 1024)
            .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_text(), "hello");
        assert!(!output.timed_out);
    }

    #[test]
    fn truncates_stdout_beyond_limit() {
        let output = run_with_input(&sh("printf 'abcdef'"), b"", Duration::from_secs(5), 4)
            .expect("run");
        assert_eq!(output.stdout_text(), "abcd");
        assert_eq!(output.stdout_truncated, 2);
    }

    #[test]
    fn kills_on_timeout() {
        let output = run_with_input(&sh("sleep 5"), b"", Duration::from_millis(100), 1024)
            .expect("run");
        assert!(output.timed_out);
    }

    /// A prompt larger than the pipe buffer must not block past the timeout.
    #[test]
    fn timeout_holds_when_child_ignores_large_input() {
        let input = vec![b'x'; 1024 * 1024];
        let output = run_with_input(&sh("sleep 3"), &input, Duration::from_millis(200), 1024)
            .expect("run");
        assert!(output.timed_out);
    }

    #[test]
    fn keeps_output_when_child_skips_stdin() {
        let input = vec![b'x'; 1024 * 1024];
        let output = run_with_input(
            &sh(r#"printf '{"hook":"h","body":"b","cta":"c"}'"#),
            &input,
            Duration::from_secs(5),
            1024,
        )
        .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_text(), r#"{"hook":"h","body":"b","cta":"c"}"#);
    }

    #[test]
    fn reports_stderr_tail() {
        let output = run_with_input(
            &sh("echo first >&2; echo 'rate limited' >&2; exit 3"),
            b"",
            Duration::from_secs(5),
            1024,
        )
        .expect("run");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr_tail(), "rate limited");
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = run_with_input(&[], b"", Duration::from_secs(1), 16).expect_err("empty");
        assert!(err.to_string().contains("non-empty"));
    }
}
