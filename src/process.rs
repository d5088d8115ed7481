//! Child process execution with independent stdout/stderr capture.
//!
//! A run spawns exactly one child, drains both pipes on their own tasks into
//! buffers owned by that run, and resolves once after the child has been
//! reaped and both pipes have reached EOF. The child inherits the current
//! environment unchanged.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Size of a single pipe read.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A program plus its argument vector. Arguments are passed as argv entries,
/// never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    /// Executable name or path handed to the OS.
    pub program: String,
    /// Name used in error messages. Defaults to `program`.
    pub name: String,
    pub args: Vec<String>,
}

impl ProcessInvocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args: Vec::new(),
        }
    }

    /// Report errors under `name` instead of the executable path.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Everything observed from one finished child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, or `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Bytes dropped from stdout by the capture limit.
    pub stdout_truncated: usize,
    /// Bytes dropped from stderr by the capture limit.
    pub stderr_truncated: usize,
}

impl ProcessOutcome {
    /// Whether the child exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Convert into the trimmed stdout text, or an exit failure.
    ///
    /// The failure message carries stderr, falling back to stdout when
    /// stderr is empty.
    pub fn into_stdout(self, program: &str) -> Result<String, ProcessError> {
        if self.success() {
            return Ok(with_truncation_note(
                self.stdout.trim().to_string(),
                self.stdout_truncated,
            ));
        }

        let output = if self.stderr.is_empty() {
            with_truncation_note(self.stdout, self.stdout_truncated)
        } else {
            with_truncation_note(self.stderr, self.stderr_truncated)
        };

        Err(ProcessError::NonZeroExit {
            program: program.to_string(),
            exit_code: self.exit_code,
            output,
        })
    }
}

/// Errors from running a child process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The executable could not be started at all.
    #[error("Failed to start {program}: {source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child ran and exited unsuccessfully.
    #[error("{program} exited with code {}: {output}", display_exit_code(.exit_code))]
    NonZeroExit {
        program: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The opt-in deadline passed; the child was killed.
    #[error("{program} did not finish within {timeout:?} and was killed")]
    TimedOut { program: String, timeout: Duration },

    /// Waiting on the child failed at the OS level.
    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "null".to_string(),
    }
}

fn with_truncation_note(text: String, truncated: usize) -> String {
    if truncated == 0 {
        text
    } else {
        format!("{}\n\n... [truncated {} bytes]", text, truncated)
    }
}

/// Runs child processes to completion.
///
/// A runner holds only limits; every call gets its own child and buffers, so
/// one runner can serve any number of concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
    max_output_bytes: Option<usize>,
}

impl ProcessRunner {
    /// Runner with no deadline and unbounded capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep at most `limit` bytes per stream. The rest is still drained so
    /// the child never blocks on a full pipe.
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    /// Run the invocation and wait for the child to exit.
    ///
    /// Returns the outcome for any exit status; only launch, wait and
    /// deadline problems are errors here. Use
    /// [`ProcessOutcome::into_stdout`] to apply the exit-code policy.
    pub async fn run(
        &self,
        invocation: &ProcessInvocation,
    ) -> Result<ProcessOutcome, ProcessError> {
        let program = invocation.name.as_str();

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| ProcessError::LaunchFailure {
            program: program.to_string(),
            source,
        })?;

        tracing::debug!(
            pid = child.id(),
            program = %invocation.program,
            args = ?invocation.args,
            "spawned child process"
        );

        let limit = self.max_output_bytes;
        let mut stdout_task = child
            .stdout
            .take()
            .map(|pipe| tokio::spawn(capture(pipe, limit, "stdout")));
        let mut stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(capture(pipe, limit, "stderr")));

        // The deadline covers draining too: a grandchild holding the pipes
        // open keeps the run alive after the direct child exits.
        let finished = async {
            let status = child.wait().await?;
            let stdout = join_capture(&mut stdout_task).await;
            let stderr = join_capture(&mut stderr_task).await;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, finished).await.ok(),
            None => Some(finished.await),
        };

        let Some(waited) = result else {
            let _ = child.kill().await;
            abort_capture(&stdout_task);
            abort_capture(&stderr_task);
            let timeout = self.timeout.unwrap_or_default();
            tracing::warn!(program, ?timeout, "child process killed after deadline");
            return Err(ProcessError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        };

        let (status, stdout, stderr) = match waited {
            Ok(done) => done,
            Err(source) => {
                abort_capture(&stdout_task);
                abort_capture(&stderr_task);
                return Err(ProcessError::Wait {
                    program: program.to_string(),
                    source,
                });
            }
        };

        let outcome = ProcessOutcome {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
            stdout_truncated: stdout.dropped,
            stderr_truncated: stderr.dropped,
        };

        tracing::debug!(
            program,
            exit_code = ?outcome.exit_code,
            stdout_bytes = outcome.stdout.len(),
            stderr_bytes = outcome.stderr.len(),
            "child process exited"
        );

        Ok(outcome)
    }
}

/// Bytes read from one pipe.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    dropped: usize,
}

impl Captured {
    fn push(&mut self, chunk: &[u8], limit: Option<usize>) {
        let room = match limit {
            Some(limit) => limit.saturating_sub(self.bytes.len()),
            None => chunk.len(),
        };
        let kept = room.min(chunk.len());
        self.bytes.extend_from_slice(&chunk[..kept]);
        self.dropped += chunk.len() - kept;
    }
}

/// Drain a pipe to EOF, appending chunks in arrival order.
async fn capture<R>(mut pipe: R, limit: Option<usize>, stream: &'static str) -> Captured
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured::default();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => captured.push(&chunk[..n], limit),
            Err(e) => {
                tracing::warn!(
                    stream,
                    error = %e,
                    "failed reading child output, keeping partial capture"
                );
                break;
            }
        }
    }
    captured
}

async fn join_capture(task: &mut Option<JoinHandle<Captured>>) -> Captured {
    match task {
        Some(handle) => handle.await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "output capture task failed");
            Captured::default()
        }),
        None => Captured::default(),
    }
}

fn abort_capture(task: &Option<JoinHandle<Captured>>) {
    if let Some(handle) = task {
        handle.abort();
    }
}
