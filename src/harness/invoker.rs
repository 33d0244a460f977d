use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

const SPAWN_ATTEMPTS: u32 = 4;

#[cfg(unix)]
const ETXTBSY: i32 = 26;

#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub stdout: Vec<u8>,
    pub exit_code: i32,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("emulator did not exit within {}ms", limit.as_millis())]
    Timeout { limit: Duration, elapsed: Duration },
    #[error("emulator exited with {}", describe_exit(*code))]
    Crash {
        code: Option<i32>,
        stderr: String,
        elapsed: Duration,
    },
    #[error("failed to launch {}: {source}", binary.display())]
    Launch { binary: PathBuf, source: io::Error },
    #[error("failed to collect emulator output: {0}")]
    Io(#[from] io::Error),
}

impl InvokeError {
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Timeout { elapsed, .. } | Self::Crash { elapsed, .. } => *elapsed,
            Self::Launch { .. } | Self::Io(_) => Duration::ZERO,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_owned(),
    }
}

#[derive(Debug, Clone)]
pub struct EmulatorInvoker {
    binary: PathBuf,
    timeout: Duration,
}

impl EmulatorInvoker {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn invoke(
        &self,
        rom_path: &Path,
        instruction_budget: u64,
    ) -> Result<InvocationResult, InvokeError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(rom_path)
            .arg(instruction_budget.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let mut child = self.spawn(&mut command).await?;
        let pid = child.id();
        let mut stdout = collect(child.stdout.take());
        let mut stderr = collect(child.stderr.take());

        // Helpers left behind by the emulator can hold the pipes open after it exits, so the
        // deadline covers output collection as well.
        let finished = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await?;
            let stdout = join_output(&mut stdout).await?;
            let stderr = join_output(&mut stderr).await?;
            Ok::<_, InvokeError>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(collected) => collected?,
            Err(_) => {
                terminate(&mut child, pid).await;
                stdout.abort();
                stderr.abort();
                return Err(InvokeError::Timeout {
                    limit: self.timeout,
                    elapsed: started.elapsed(),
                });
            }
        };

        let elapsed = started.elapsed();
        log::trace!(
            "{} exited with {status} after {}ms",
            rom_path.display(),
            elapsed.as_millis()
        );

        match successful_exit(status) {
            Some(exit_code) => Ok(InvocationResult {
                stdout,
                exit_code,
                elapsed,
            }),
            None => Err(InvokeError::Crash {
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_owned(),
                elapsed,
            }),
        }
    }

    async fn spawn(&self, command: &mut Command) -> Result<Child, InvokeError> {
        let mut attempts = 0u32;
        loop {
            match command.spawn() {
                Ok(child) => return Ok(child),
                Err(err) => {
                    // A freshly written executable can still be open for writing in another
                    // forked process.
                    #[cfg(unix)]
                    let should_retry = err.raw_os_error() == Some(ETXTBSY);
                    #[cfg(not(unix))]
                    let should_retry = false;

                    attempts += 1;
                    if should_retry && attempts < SPAWN_ATTEMPTS {
                        log::debug!("{} busy, retrying spawn", self.binary.display());
                        tokio::time::sleep(Duration::from_millis(10 * attempts as u64)).await;
                        continue;
                    }

                    return Err(InvokeError::Launch {
                        binary: self.binary.clone(),
                        source: err,
                    });
                }
            }
        }
    }
}

fn successful_exit(status: ExitStatus) -> Option<i32> {
    if status.success() {
        status.code()
    } else {
        None
    }
}

/// Kills the emulator's whole process group, then reaps the emulator itself.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) {
        // SAFETY: `kill` has no memory-safety preconditions. The group id is the emulator's
        // pid because it was spawned with `process_group(0)`.
        if unsafe { libc::kill(-pid, libc::SIGKILL) } != 0 {
            log::debug!(
                "failed to kill process group {pid}: {}",
                io::Error::last_os_error()
            );
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(err) = child.kill().await {
        log::debug!("emulator already gone after timeout: {err}");
    }
}

fn collect<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buffer).await?;
        }
        Ok(buffer)
    })
}

async fn join_output(handle: &mut JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, InvokeError> {
    match handle.await {
        Ok(result) => Ok(result?),
        Err(err) => Err(InvokeError::Io(io::Error::new(io::ErrorKind::Other, err))),
    }
}
