use std::process::Stdio;
use std::time::Duration;

use plancraft_core::api::ExecutionError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Spawn `program args..`, feed `stdin`, and wait up to `timeout_ms` (0 = forever).
///
/// A timed-out child is killed.
pub async fn run_program(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
    timeout_ms: u64,
) -> Result<ProcessOutput, ExecutionError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecutionError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if let Some(mut pipe) = child.stdin.take() {
        if let Some(input) = stdin {
            // The child may exit without reading; a broken pipe is not our failure.
            if let Err(err) = pipe.write_all(input.as_bytes()).await {
                tracing::debug!(program, error = %err, "child closed stdin early");
            }
        }
        drop(pipe);
    }

    let wait = child.wait_with_output();
    let output = if timeout_ms == 0 {
        wait.await?
    } else {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), wait).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(program, timeout_ms, "child process timed out");
                return Err(ExecutionError::Timeout(timeout_ms));
            }
        }
    };

    Ok(ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `command_line` through the platform shell.
pub async fn run_shell(
    command_line: &str,
    stdin: Option<&str>,
    timeout_ms: u64,
) -> Result<ProcessOutput, ExecutionError> {
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    tracing::debug!(command_line, "running shell command");
    run_program(shell, &[flag.to_string(), command_line.to_string()], stdin, timeout_ms).await
}

/// Turn a finished process into executor output, or an error carrying stderr.
pub fn into_result(program: &str, out: ProcessOutput) -> Result<String, ExecutionError> {
    if out.success() {
        return Ok(out.stdout.trim_end().to_string());
    }
    let stderr = match out.stderr.trim() {
        "" => out.stdout.trim().to_string(),
        s => s.to_string(),
    };
    Err(ExecutionError::ExitStatus {
        program: program.to_string(),
        code: out.code,
        stderr,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stdin_reaches_child() {
        let out = run_program("cat", &[], Some("hello"), 5_000).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let out = run_shell("echo 'service unavailable' >&2; exit 3", None, 5_000)
            .await
            .unwrap();
        let err = into_result("sh", out).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("service unavailable"), "{msg}");
        assert!(msg.contains("Some(3)"), "{msg}");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let err = run_shell("sleep 5", None, 50).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout(50)));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_program("plancraft-no-such-binary", &[], None, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }
}
