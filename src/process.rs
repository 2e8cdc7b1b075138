//! Bounded child-process execution shared by the gateway client and the
//! helper build.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// Longest stderr excerpt carried into error messages.
const EXCERPT_CHARS: usize = 2_000;

/// Captured result of a finished child process.
#[derive(Debug)]
pub(crate) struct Finished {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// How a bounded run ended.
#[derive(Debug)]
pub(crate) enum Outcome {
    Finished(Finished),
    /// The deadline passed; the child was killed.
    TimedOut,
}

/// Spawn `cmd` with piped output and wait at most `timeout` for it.
///
/// Output is drained on background threads while the child runs, so a
/// child writing more than a pipe buffer never stalls.
pub(crate) fn run_bounded(mut cmd: Command, timeout: Duration) -> std::io::Result<Outcome> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(Outcome::Finished(Finished {
                    status,
                    stdout: collect(stdout),
                    stderr: collect(stderr),
                }));
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    kill(&mut child);
                    // Reader threads are left detached: a grandchild may
                    // still hold the pipes open.
                    return Ok(Outcome::TimedOut);
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill(&mut child);
                return Err(e);
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Trimmed tail of `stderr` suitable for an error message.
pub(crate) fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= EXCERPT_CHARS {
        return trimmed.to_owned();
    }
    let tail: String = trimmed.chars().skip(count - EXCERPT_CHARS).collect();
    format!("...{tail}")
}

#[cfg(all(test, unix))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams() {
        let outcome = run_bounded(sh("echo out; echo err >&2; exit 3"), Duration::from_secs(5))
            .unwrap();
        let Outcome::Finished(done) = outcome else {
            panic!("expected the process to finish");
        };
        assert_eq!(done.status.code(), Some(3));
        assert_eq!(done.stdout.trim(), "out");
        assert_eq!(done.stderr.trim(), "err");
    }

    #[test]
    fn large_output_does_not_stall() {
        let outcome = run_bounded(
            sh("i=0; while [ $i -lt 20000 ]; do echo 0123456789abcdef; i=$((i+1)); done"),
            Duration::from_secs(20),
        )
        .unwrap();
        let Outcome::Finished(done) = outcome else {
            panic!("expected the process to finish");
        };
        assert_eq!(done.stdout.lines().count(), 20_000);
    }

    #[test]
    fn deadline_kills_the_child() {
        let start = Instant::now();
        let outcome = run_bounded(sh("sleep 10"), Duration::from_millis(200)).unwrap();
        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn excerpt_keeps_the_tail() {
        let long = "x".repeat(EXCERPT_CHARS + 10) + "END";
        let cut = excerpt(&long);
        assert!(cut.starts_with("..."));
        assert!(cut.ends_with("END"));
    }
}
