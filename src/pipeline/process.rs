//! Subprocess plumbing shared by every external-tool adapter.
//!
//! `pdftoppm`, `ollama` and `pandoc` are all driven the same way: build a
//! [`Command`], optionally feed a prompt on stdin, capture the output and
//! look at the exit status. Children are spawned with `kill_on_drop(true)`,
//! so when `tokio::time::timeout` drops the future the process dies with it.

use std::io;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Run `cmd` to completion, writing `stdin` (if any) to its standard input.
///
/// A child that exits before reading its input is not an error here: the
/// resulting broken pipe is ignored and the exit status tells the story.
pub async fn run_captured(mut cmd: Command, stdin: Option<&str>) -> io::Result<Output> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    debug!("Spawning {:?}", cmd.as_std());
    let mut child = cmd.spawn()?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let written = pipe.write_all(input.as_bytes()).await;
        match written {
            Ok(()) => pipe.shutdown().await.or_else(ignore_broken_pipe)?,
            Err(e) => ignore_broken_pipe(e)?,
        }
        // Dropping the handle closes stdin so the child sees EOF.
        drop(pipe);
    }

    child.wait_with_output().await
}

fn ignore_broken_pipe(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        debug!("Child closed stdin early");
        Ok(())
    } else {
        Err(e)
    }
}

/// Describe a failed invocation: exit status plus trimmed stderr.
pub fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {}", output.status, stderr)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_from_stdin() {
        let output = run_captured(Command::new("cat"), Some("hello\n"))
            .await
            .expect("cat should run");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
    }

    #[tokio::test]
    async fn failure_detail_includes_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo boom >&2; exit 3");
        let output = run_captured(cmd, None).await.expect("sh should run");
        assert!(!output.status.success());
        let detail = failure_detail(&output);
        assert!(detail.contains('3'), "got: {detail}");
        assert!(detail.ends_with("boom"), "got: {detail}");
    }

    #[tokio::test]
    async fn early_exit_is_not_a_pipe_error() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exit 1");
        let big = "x".repeat(1 << 20);
        let output = run_captured(cmd, Some(&big)).await.expect("no broken pipe error");
        assert!(!output.status.success());
    }

    #[tokio::test]
    async fn missing_binary_is_an_io_error() {
        let err = run_captured(Command::new("definitely-not-a-real-binary-ocr2md"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
