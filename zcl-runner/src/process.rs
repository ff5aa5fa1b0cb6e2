// zcl-runner/src/process.rs
// ============================================================================
// Module: Process-Mode Runner Supervision
// Description: Spawns a process-mode runner command, tees stdout/stderr to
//              the operator and to bounded tail buffers, and periodically
//              flushes those buffers to disk (§4.G step 3).
// Dependencies: tokio (process, io-util, sync, time), zcl-evidence
// ============================================================================

//! ## Overview
//! Stdout/stderr are duplicated to two destinations: a mutex-protected
//! passthrough writer (the operator's terminal, never redacted) and a
//! bounded in-memory tail buffer. A 250 ms ticker snapshots the tail buffers
//! to `runner.stdout.log` / `runner.stderr.log` via an atomic write, with one
//! final flush once the child exits. Flush failures are surfaced as `io`
//! errors, never silently dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use std::time::Instant;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use zcl_evidence::EvidenceRoot;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Tail Buffer
// ============================================================================

/// Per-stream bound on the in-memory tail buffer tee'd to disk.
const TAIL_BUFFER_CAP_BYTES: usize = 1024 * 1024;

/// A bounded FIFO byte buffer; pushes past the cap drop the oldest bytes.
#[derive(Default)]
struct TailBuffer {
    bytes: VecDeque<u8>,
    total_bytes: u64,
}

impl TailBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.total_bytes += chunk.len() as u64;
        self.bytes.extend(chunk.iter().copied());
        while self.bytes.len() > TAIL_BUFFER_CAP_BYTES {
            self.bytes.pop_front();
        }
    }

    fn snapshot(&self) -> Vec<u8> {
        self.bytes.iter().copied().collect()
    }
}

// ============================================================================
// SECTION: Process Outcome
// ============================================================================

/// The observable result of a process-mode attempt.
pub struct ProcessOutcome {
    /// Exit status code, when the process actually ran.
    pub exit_code: Option<i32>,
    /// Spawn-time error, when the process never ran at all (§4.G
    /// start-failure discrimination).
    pub spawn_error: Option<String>,
    /// Final stdout tail bytes, after redaction is applied by the caller.
    pub stdout_tail: Vec<u8>,
    /// Final stderr tail bytes, after redaction is applied by the caller.
    pub stderr_tail: Vec<u8>,
    /// Total stdout bytes observed, including bytes evicted from the tail.
    pub stdout_total_bytes: u64,
    /// Total stderr bytes observed, including bytes evicted from the tail.
    pub stderr_total_bytes: u64,
    /// Wall-clock duration of the spawned process.
    pub duration_ms: u64,
}

impl ProcessOutcome {
    /// A process-mode attempt is treated as a harness (spawn) failure only
    /// when the process never ran at all; a nonzero exit is expected to be
    /// reported through the runner's own feedback payload.
    #[must_use]
    pub const fn is_spawn_failure(&self) -> bool {
        self.spawn_error.is_some()
    }
}

// ============================================================================
// SECTION: Operator Passthrough
// ============================================================================

/// Mutex-guarded sink the operator's stdout/stderr are funneled through, so
/// concurrent attempts never interleave mid-line.
pub type OperatorWriter = Arc<StdMutex<dyn Write + Send>>;

// ============================================================================
// SECTION: Spawn & Supervise
// ============================================================================

/// Spawns `command` with `env` merged into the inherited environment,
/// running under `cwd`, tees its stdout/stderr to `operator_out`/
/// `operator_err` and to bounded tail buffers flushed to
/// `runner.stdout.log` / `runner.stderr.log` under `attempt_dir` every
/// 250 ms and once more on exit.
///
/// # Errors
///
/// Returns [`RunnerError::Evidence`] if a flush write fails. A process that
/// fails to spawn is reported through `Ok(ProcessOutcome::spawn_error)`,
/// not as an `Err`, matching the §4.G start-failure discrimination (spawn
/// failure vs. nonzero exit are different failure modes, but neither
/// prevents the caller from proceeding to finalization).
pub async fn run(
    attempt_dir: &Path,
    command: &[String],
    env: &[(&str, &str)],
    extra_env: &std::collections::BTreeMap<String, String>,
    cwd: &str,
    operator_out: OperatorWriter,
    operator_err: OperatorWriter,
) -> Result<ProcessOutcome, RunnerError> {
    let root = EvidenceRoot::open_or_create(attempt_dir)?;
    root.write_file_atomic(Path::new("runner.command.txt"), command.join(" ").as_bytes())?;

    let Some((program, args)) = command.split_first() else {
        return Ok(ProcessOutcome {
            exit_code: None,
            spawn_error: Some("runner command is empty".to_string()),
            stdout_tail: Vec::new(),
            stderr_tail: Vec::new(),
            stdout_total_bytes: 0,
            stderr_total_bytes: 0,
            duration_ms: 0,
        });
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .envs(extra_env)
        .envs(env.iter().map(|(k, v)| (*k, *v)))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return Ok(ProcessOutcome {
                exit_code: None,
                spawn_error: Some(err.to_string()),
                stdout_tail: Vec::new(),
                stderr_tail: Vec::new(),
                stdout_total_bytes: 0,
                stderr_total_bytes: 0,
                duration_ms: 0,
            });
        }
    };

    let stdout_buf = Arc::new(StdMutex::new(TailBuffer::default()));
    let stderr_buf = Arc::new(StdMutex::new(TailBuffer::default()));

    let stdout_reader = child.stdout.take().map(|stream| {
        tee_task(stream, Arc::clone(&stdout_buf), operator_out)
    });
    let stderr_reader = child.stderr.take().map(|stream| {
        tee_task(stream, Arc::clone(&stderr_buf), operator_err)
    });

    let flusher = spawn_flush_ticker(
        root,
        Arc::clone(&stdout_buf),
        Arc::clone(&stderr_buf),
        Duration::from_millis(250),
    );

    let status = child.wait().await.map_err(|err| RunnerError::Spawn(err.to_string()))?;
    if let Some(task) = stdout_reader {
        let _ignored = task.await;
    }
    if let Some(task) = stderr_reader {
        let _ignored = task.await;
    }
    flusher.stop().await?;

    let stdout_guard = stdout_buf.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let stderr_guard = stderr_buf.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    Ok(ProcessOutcome {
        exit_code: status.code(),
        spawn_error: None,
        stdout_tail: stdout_guard.snapshot(),
        stderr_tail: stderr_guard.snapshot(),
        stdout_total_bytes: stdout_guard.total_bytes,
        stderr_total_bytes: stderr_guard.total_bytes,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

/// Reads `stream` to EOF, appending every chunk to `buffer` and to
/// `operator`, so the operator sees output as it arrives rather than only
/// on the next flush tick.
fn tee_task<R>(
    mut stream: R,
    buffer: Arc<StdMutex<TailBuffer>>,
    operator: OperatorWriter,
) -> tokio::task::JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0_u8; 8192];
        loop {
            let read = match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => read,
            };
            buffer.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(&chunk[..read]);
            if let Ok(mut writer) = operator.lock() {
                let _ignored = writer.write_all(&chunk[..read]);
            }
        }
    })
}

/// Handle to the background flush-ticker task.
struct FlushTicker {
    stop_tx: tokio::sync::oneshot::Sender<()>,
    task: tokio::task::JoinHandle<Result<(), RunnerError>>,
}

impl FlushTicker {
    /// Signals the ticker to stop, waits for its final flush, and
    /// propagates any flush failure.
    async fn stop(self) -> Result<(), RunnerError> {
        let _ignored = self.stop_tx.send(());
        match self.task.await {
            Ok(result) => result,
            Err(_join_error) => Ok(()),
        }
    }
}

fn spawn_flush_ticker(
    root: EvidenceRoot,
    stdout_buf: Arc<StdMutex<TailBuffer>>,
    stderr_buf: Arc<StdMutex<TailBuffer>>,
    period: Duration,
) -> FlushTicker {
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    flush_once(&root, &stdout_buf, &stderr_buf)?;
                }
                _ = &mut stop_rx => {
                    flush_once(&root, &stdout_buf, &stderr_buf)?;
                    return Ok(());
                }
            }
        }
    });
    FlushTicker { stop_tx, task }
}

fn flush_once(
    root: &EvidenceRoot,
    stdout_buf: &Arc<StdMutex<TailBuffer>>,
    stderr_buf: &Arc<StdMutex<TailBuffer>>,
) -> Result<(), RunnerError> {
    let stdout_snapshot =
        stdout_buf.lock().unwrap_or_else(std::sync::PoisonError::into_inner).snapshot();
    let stderr_snapshot =
        stderr_buf.lock().unwrap_or_else(std::sync::PoisonError::into_inner).snapshot();
    root.write_file_atomic(Path::new("runner.stdout.log"), &stdout_snapshot)?;
    root.write_file_atomic(Path::new("runner.stderr.log"), &stderr_snapshot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::Mutex;

    use tempfile::tempdir;

    use super::run;

    fn sink() -> super::OperatorWriter {
        Arc::new(Mutex::new(Cursor::new(Vec::new())))
    }

    #[tokio::test]
    async fn a_successful_process_produces_logs_and_exit_code() {
        let dir = tempdir().unwrap();
        let command =
            vec!["sh".to_string(), "-c".to_string(), "echo hello; echo world 1>&2".to_string()];
        let outcome =
            run(dir.path(), &command, &[], &Default::default(), ".", sink(), sink()).await.unwrap();
        assert_eq!(outcome.exit_code, Some(0));
        assert!(!outcome.is_spawn_failure());
        assert!(String::from_utf8_lossy(&outcome.stdout_tail).contains("hello"));
        assert!(String::from_utf8_lossy(&outcome.stderr_tail).contains("world"));
        assert!(dir.path().join("runner.command.txt").exists());
        assert!(dir.path().join("runner.stdout.log").exists());
    }

    #[tokio::test]
    async fn a_nonexistent_program_is_a_spawn_failure_not_an_error() {
        let dir = tempdir().unwrap();
        let command = vec!["/does/not/exist/binary".to_string()];
        let outcome =
            run(dir.path(), &command, &[], &Default::default(), ".", sink(), sink()).await.unwrap();
        assert!(outcome.is_spawn_failure());
        assert_eq!(outcome.exit_code, None);
    }

    #[tokio::test]
    async fn a_nonzero_exit_is_not_a_spawn_failure() {
        let dir = tempdir().unwrap();
        let command = vec!["sh".to_string(), "-c".to_string(), "exit 7".to_string()];
        let outcome =
            run(dir.path(), &command, &[], &Default::default(), ".", sink(), sink()).await.unwrap();
        assert!(!outcome.is_spawn_failure());
        assert_eq!(outcome.exit_code, Some(7));
    }
}
