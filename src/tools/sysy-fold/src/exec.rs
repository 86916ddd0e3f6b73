// exec.rs
//! Subprocess execution with piped stdin and a wall-clock deadline.
//!
//! Every child is started in its own process group so that a timeout can
//! kill the whole tree (an emulator and whatever it spawned) with one
//! `killpg`.

use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        stdout: String,
        stderr: String,
    },
    Failed {
        code: Option<i32>,
        signal: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// Killed after exceeding the deadline.
    TimedOut,
}

impl Outcome {
    /// Captured stderr; empty for a killed process.
    pub fn stderr(&self) -> &str {
        match self {
            Outcome::Success { stderr, .. } | Outcome::Failed { stderr, .. } => stderr,
            Outcome::TimedOut => "",
        }
    }
}

#[derive(Debug)]
pub struct Execution {
    pub outcome: Outcome,
    pub duration: Duration,
}

/// Run `command` to completion, feeding it `stdin` and collecting its output.
///
/// With a deadline, a watcher thread kills the child's process group once the
/// deadline passes. Spawn and collection failures are returned as `Err`.
pub fn run(
    command: &mut Command,
    stdin: Option<&[u8]>,
    deadline: Option<Duration>,
) -> io::Result<Execution> {
    let start = Instant::now();

    let mut child = command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .spawn()?;

    let child_pid = child.id();

    let watcher = deadline.map(|timeout| {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            if rx.recv_timeout(timeout).is_err() {
                kill_process_group(child_pid);
                true
            } else {
                false
            }
        });
        (tx, handle)
    });

    let mut write_error = None;
    if let Some(input) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        // A child that exits without reading its input closes the pipe early.
        if let Err(e) = pipe.write_all(input)
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            kill_process_group(child_pid);
            write_error = Some(e);
        }
    }

    let output = child.wait_with_output();
    let killed = match watcher {
        Some((tx, handle)) => {
            let _ = tx.send(());
            handle.join().unwrap_or(false)
        }
        None => false,
    };
    if let Some(e) = write_error {
        return Err(e);
    }
    let output = output?;
    let duration = start.elapsed();

    if timed_out(killed, output.status) {
        return Ok(Execution {
            outcome: Outcome::TimedOut,
            duration,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let outcome = if output.status.success() {
        Outcome::Success { stdout, stderr }
    } else {
        Outcome::Failed {
            code: output.status.code(),
            signal: output.status.signal(),
            stdout,
            stderr,
        }
    };
    Ok(Execution { outcome, duration })
}

/// A deadline kill only counts when the child actually died of it. The
/// watcher can fire just after a child has exited on its own, in which case
/// the signal lands on a zombie and the real exit status survives.
fn timed_out(killed: bool, status: ExitStatus) -> bool {
    killed && status.signal() == Some(libc::SIGKILL)
}

/// Kill an entire process group by PGID.
fn kill_process_group(pid: u32) {
    // SAFETY: killpg only sends a signal. The child was spawned with
    // process_group(0), so its PID is also its PGID.
    unsafe {
        libc::killpg(pid as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[test]
    fn captures_stdout_of_successful_command() {
        let execution = run(&mut sh("echo hello"), None, None).unwrap();
        match execution.outcome {
            Outcome::Success { stdout, .. } => assert_eq!(stdout, "hello\n"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn feeds_stdin() {
        let execution = run(
            &mut sh("read x; echo $((x + 1))"),
            Some(b"41\n"),
            Some(Duration::from_secs(10)),
        )
        .unwrap();
        assert_eq!(
            execution.outcome,
            Outcome::Success {
                stdout: "42\n".into(),
                stderr: String::new(),
            }
        );
    }

    #[test]
    fn reports_exit_code_and_stderr() {
        let execution = run(&mut sh("echo oops >&2; exit 3"), None, None).unwrap();
        match execution.outcome {
            Outcome::Failed {
                code, stderr, ..
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn kills_command_past_deadline() {
        let execution = run(
            &mut sh("sleep 30"),
            None,
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        assert_eq!(execution.outcome, Outcome::TimedOut);
        assert!(execution.duration < Duration::from_secs(10));
    }

    #[test]
    fn timeout_reaches_grandchildren() {
        // The background sleep holds stdout open; only a group kill ends it.
        let execution = run(
            &mut sh("sleep 30 & wait"),
            None,
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        assert_eq!(execution.outcome, Outcome::TimedOut);
        assert!(execution.duration < Duration::from_secs(10));
    }

    #[test]
    fn late_kill_keeps_real_exit_status() {
        // Raw wait statuses: 0 is `exit 0`, 9 is death by SIGKILL.
        assert!(!timed_out(true, ExitStatus::from_raw(0)));
        assert!(!timed_out(true, ExitStatus::from_raw(3 << 8)));
        assert!(timed_out(true, ExitStatus::from_raw(libc::SIGKILL)));
        assert!(!timed_out(false, ExitStatus::from_raw(libc::SIGKILL)));
    }

    #[test]
    fn unread_stdin_is_not_an_error() {
        let execution = run(&mut sh("exit 0"), Some(b"5\n"), None).unwrap();
        assert!(matches!(execution.outcome, Outcome::Success { .. }));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let mut command = Command::new("/nonexistent/sysy-fold-test-binary");
        assert!(run(&mut command, None, None).is_err());
    }
}
