use crate::trace::TraceWriter;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The duration to wait after sending SIGINT before escalating to SIGTERM.
const SIGINT_TIMEOUT: Duration = Duration::from_millis(7500);
/// The duration to wait after sending SIGTERM before escalating to SIGKILL.
const SIGTERM_TIMEOUT: Duration = Duration::from_millis(2500);
/// How long a cancelled process's output may keep draining before the
/// readers are dropped.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The cancellation token fired before the process exited on its own.
#[derive(Debug, thiserror::Error)]
#[error("Process '{file_name}' was cancelled (exit code {exit_code}).")]
pub struct ProcessCancelledError {
    pub exit_code: i32,
    pub file_name: String,
}

/// Which stream a line of child output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of child output.
#[derive(Debug, Clone)]
pub struct ProcessOutputLine {
    pub stream: OutputStream,
    pub data: String,
}

/// Spawns a child process, streams its stdout/stderr line by line through a
/// channel, and on cancellation walks the SIGINT → SIGTERM → SIGKILL ladder.
///
/// On Unix the child leads its own process group and every signal goes to
/// the whole group, so grandchildren started by wrapper scripts stop too.
pub struct ProcessInvoker {
    trace: Arc<dyn TraceWriter>,
    output_tx: mpsc::UnboundedSender<ProcessOutputLine>,
    output_rx: Option<mpsc::UnboundedReceiver<ProcessOutputLine>>,
}

impl ProcessInvoker {
    pub fn new(trace: Arc<dyn TraceWriter>) -> Self {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        Self {
            trace,
            output_tx,
            output_rx: Some(output_rx),
        }
    }

    /// Take the output receiver. Only the first call returns `Some`.
    ///
    /// The channel closes once the invoker is dropped and both stream readers
    /// have finished.
    pub fn take_output_receiver(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<ProcessOutputLine>> {
        self.output_rx.take()
    }

    /// Run `file_name` with `arguments` and wait for it to exit.
    ///
    /// Arguments are passed verbatim, one per argv slot. Returns the exit
    /// code; a process killed by a signal reports `128 + signal` on Unix.
    /// Fails with [`ProcessCancelledError`] when `cancellation_token` fires
    /// first.
    pub async fn execute(
        &self,
        working_directory: &Path,
        file_name: &str,
        arguments: &[String],
        cancellation_token: CancellationToken,
    ) -> Result<i32> {
        self.trace.info("Starting process:");
        self.trace.info(&format!("  File name: '{file_name}'"));
        self.trace
            .info(&format!("  Arguments: '{}'", arguments.join(" ")));
        self.trace.info(&format!(
            "  Working directory: '{}'",
            working_directory.display()
        ));

        let mut cmd = Command::new(file_name);
        cmd.args(arguments);

        if working_directory.is_dir() {
            cmd.current_dir(working_directory);
        }

        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.stdin(std::process::Stdio::null());

        #[cfg(unix)]
        cmd.process_group(0);

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start process '{file_name}'"))?;

        let pid = child.id().unwrap_or(0);
        self.trace.info(&format!(
            "Process started with process id {pid}, waiting for process exit."
        ));

        let stdout_task = child
            .stdout
            .take()
            .map(|stdout| self.spawn_reader(stdout, OutputStream::Stdout));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| self.spawn_reader(stderr, OutputStream::Stderr));

        let (exit_code, was_cancelled) = tokio::select! {
            status = child.wait() => {
                let status = status.context("Failed to wait for process")?;
                (exit_code_of(&status), false)
            }
            _ = cancellation_token.cancelled() => {
                self.trace.info("Cancellation requested.");
                (self.cancel_and_kill_process(&mut child, pid).await, true)
            }
        };

        let readers = [stdout_task, stderr_task];
        if was_cancelled {
            self.drain_after_cancel(readers, pid).await;
        } else {
            for task in readers.into_iter().flatten() {
                let _ = task.await;
            }
        }

        self.trace.info(&format!(
            "Finished process {pid} with exit code {exit_code}, and elapsed time {:.2?}.",
            start.elapsed()
        ));

        if was_cancelled {
            return Err(ProcessCancelledError {
                exit_code,
                file_name: file_name.to_string(),
            }
            .into());
        }

        Ok(exit_code)
    }

    fn spawn_reader<R>(&self, reader: R, stream: OutputStream) -> JoinHandle<()>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let tx = self.output_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx.send(ProcessOutputLine { stream, data: line });
            }
        })
    }

    /// A descendant that outlived the ladder may still hold the pipes open.
    /// Give the readers a bounded window, then kill what is left of the group
    /// and drop them.
    async fn drain_after_cancel(&self, readers: [Option<JoinHandle<()>>; 2], pid: u32) {
        for mut task in readers.into_iter().flatten() {
            if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut task)
                .await
                .is_err()
            {
                self.trace.info(&format!(
                    "Output of process group {pid} still open after cancellation, killing the group."
                ));
                kill_group(pid);
                task.abort();
            }
        }
    }

    async fn cancel_and_kill_process(&self, child: &mut tokio::process::Child, pid: u32) -> i32 {
        if self
            .send_signal_and_wait(child, pid, Signal::Int, SIGINT_TIMEOUT)
            .await
        {
            self.trace.info("Process cancelled successfully through SIGINT.");
            return wait_exit_code(child).await;
        }

        if self
            .send_signal_and_wait(child, pid, Signal::Term, SIGTERM_TIMEOUT)
            .await
        {
            self.trace
                .info("Process terminated successfully through SIGTERM.");
            return wait_exit_code(child).await;
        }

        self.trace
            .info("Killing process since both cancel and terminate signals have been ignored.");
        kill_group(pid);
        let _ = child.kill().await;
        wait_exit_code(child).await
    }

    /// Returns `true` if the process exited within `timeout`.
    #[cfg(unix)]
    async fn send_signal_and_wait(
        &self,
        child: &mut tokio::process::Child,
        pid: u32,
        signal: Signal,
        timeout: Duration,
    ) -> bool {
        if child.id().is_none() {
            return true;
        }

        let sig = match signal {
            Signal::Int => nix::sys::signal::Signal::SIGINT,
            Signal::Term => nix::sys::signal::Signal::SIGTERM,
        };

        self.trace
            .info(&format!("Sending {sig:?} to process group {pid}."));

        if nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pid as i32), sig).is_err() {
            self.trace.info(&format!(
                "{sig:?} signal failed to send to process group {pid}."
            ));
            return false;
        }

        tokio::select! {
            result = child.wait() => result.is_ok(),
            _ = tokio::time::sleep(timeout) => {
                self.trace.info(&format!(
                    "Process did not honor {sig:?} within {:.1}s.",
                    timeout.as_secs_f64()
                ));
                false
            }
        }
    }

    #[cfg(not(unix))]
    async fn send_signal_and_wait(
        &self,
        child: &mut tokio::process::Child,
        _pid: u32,
        _signal: Signal,
        timeout: Duration,
    ) -> bool {
        tokio::select! {
            result = child.wait() => result.is_ok(),
            _ = tokio::time::sleep(timeout) => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Int,
    Term,
}

/// SIGKILL every process left in the group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: u32) {
    if pid == 0 {
        return;
    }
    let _ = nix::sys::signal::killpg(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGKILL,
    );
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

async fn wait_exit_code(child: &mut tokio::process::Child) -> i32 {
    child
        .wait()
        .await
        .map(|s| exit_code_of(&s))
        .unwrap_or(-1)
}

#[cfg(unix)]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
