//! Bounded execution of external diagnostic utilities.
//!
//! Every command a probe shells out to goes through [`run_bounded`]: the
//! child is killed when the timeout expires and the caller gets
//! [`ProbeError::Timeout`] instead of hanging.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::ProbeError;

/// Maximum stdout or stderr size captured per stream (4 MiB).
const MAX_OUTPUT_BYTES: u64 = 4 * 1024 * 1024;

/// Default bound applied to each shelled-out command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Check whether `program` can be found on the `PATH`
pub fn is_installed(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Run `program` with `args`, capturing its output, bounded by `timeout`.
///
/// A non-zero exit is not an error here; callers decide what an exit code
/// means for their tool.
pub async fn run_bounded(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ProbeError> {
    log::debug!("Running {} {:?} (timeout {:?})", program, args, timeout);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ProbeError::NotInstalled(program.to_string())
        } else {
            ProbeError::Spawn {
                program: program.to_string(),
                source,
            }
        }
    })?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    // On timeout `child` is dropped here, which kills it via kill_on_drop.
    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(source)) => {
            return Err(ProbeError::Spawn {
                program: program.to_string(),
                source,
            })
        }
        Err(_elapsed) => {
            log::warn!("{} did not finish within {:?}", program, timeout);
            stdout_task.abort();
            stderr_task.abort();
            return Err(ProbeError::Timeout);
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(CommandOutput {
        code: status.code(),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

/// Like [`run_bounded`], but a non-zero exit becomes [`ProbeError::NonZeroExit`]
pub async fn run_checked(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ProbeError> {
    let output = run_bounded(program, args, timeout).await?;
    if output.success() {
        Ok(output)
    } else {
        Err(non_zero_exit(program, &output))
    }
}

/// Error for a failed exit. The message is stderr, or the first stdout line
/// for tools that report errors there.
pub fn non_zero_exit(program: &str, output: &CommandOutput) -> ProbeError {
    let stderr = output.stderr.trim();
    let message = if stderr.is_empty() {
        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    } else {
        stderr
    };

    ProbeError::NonZeroExit {
        program: program.to_string(),
        code: output.code.unwrap_or(-1),
        message: message.to_string(),
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}
