//! Boot launcher driving the external `rpiboot` helper
//!
//! A launch spawns `<helper> -d <image>` with both output streams piped.
//! Every line the helper prints counts as one progress step; the number of
//! regular files in the image folder plus a fixed number of boot stages is
//! used as the expected step count. The helper runs on its own and reports
//! through [`LaunchEvent`]s delivered to the [`BootJobHandle`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::DEFAULT_HELPER_PROGRAM;
use crate::errors::{Result, UsbBootError};
use crate::models::boot::{BootJob, BootOutcome};
use crate::models::events::LaunchEvent;

/// Boot stages that do not correspond to a file in the image folder
pub const FIXED_BOOT_STAGES: usize = 7;

/// Helper argument that precedes the image folder
pub const HELPER_IMAGE_FLAG: &str = "-d";

/// How long to wait for buffered output after the helper exited
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a cancelled helper gets to release the device after SIGTERM
const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Rough number of progress steps a helper run against `image_path` takes.
///
/// An unreadable folder counts as empty; the result is never below
/// [`FIXED_BOOT_STAGES`].
pub fn estimate_step_count(image_path: &Path) -> usize {
    count_regular_files(image_path) + FIXED_BOOT_STAGES
}

fn count_regular_files(path: &Path) -> usize {
    match fs::read_dir(path) {
        Ok(entries) => entries
            .flatten()
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .count(),
        Err(e) => {
            log::debug!("Cannot read image folder {}: {}", path.display(), e);
            0
        }
    }
}

/// Spawns the helper process for a chosen image
#[derive(Debug, Clone)]
pub struct BootLauncher {
    program: String,
}

impl BootLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the helper can be found in PATH (or exists, for a path)
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// Command line for display purposes
    pub fn command_line(&self, image_path: &Path) -> String {
        format!(
            "{} {} {}",
            self.program,
            HELPER_IMAGE_FLAG,
            image_path.display()
        )
    }

    /// Start the helper against `image_path`.
    ///
    /// The image folder is expected to have been validated already. Returns
    /// [`UsbBootError::Launch`] when the helper cannot be started.
    pub fn launch(&self, image_path: &Path) -> Result<BootJobHandle> {
        let expected_steps = estimate_step_count(image_path);

        let mut cmd = Command::new(&self.program);
        cmd.arg(HELPER_IMAGE_FLAG)
            .arg(image_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a terminal Ctrl+C reaches only us and the
        // helper is stopped through the cancel path
        #[cfg(unix)]
        cmd.process_group(0);

        log::info!("Executing: {}", self.command_line(image_path));
        let mut child = cmd.spawn().map_err(|source| UsbBootError::Launch {
            program: self.program.clone(),
            source,
        })?;

        let pid = child.id();
        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.start_kill();
                return Err(UsbBootError::Launch {
                    program: self.program.clone(),
                    source: std::io::Error::other("helper output streams were not captured"),
                });
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let readers = vec![
            spawn_line_reader(stdout, tx.clone()),
            spawn_line_reader(stderr, tx.clone()),
        ];
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(child, readers, cancel_rx, tx));

        Ok(BootJobHandle {
            job: BootJob::new(image_path.to_path_buf(), expected_steps),
            events: rx,
            cancel: Some(cancel_tx),
            supervisor,
            pid,
        })
    }
}

impl Default for BootLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_HELPER_PROGRAM)
    }
}

fn spawn_line_reader<R>(stream: R, tx: mpsc::UnboundedSender<LaunchEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buffer = Vec::new();

        while reader.read_until(b'\n', &mut buffer).await.unwrap_or(0) > 0 {
            let line = String::from_utf8_lossy(&buffer).trim_end().to_string();
            buffer.clear();
            if tx.send(LaunchEvent::Output(line)).is_err() {
                break;
            }
        }
    })
}

/// Wait for the helper to exit (or kill it on cancellation), reap it, and
/// report the outcome after all output has been forwarded.
async fn supervise(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    cancel_rx: oneshot::Receiver<()>,
    tx: mpsc::UnboundedSender<LaunchEvent>,
) {
    let mut cancelled = false;
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = cancel_rx => {
            cancelled = true;
            log::info!("Cancelling helper process");
            terminate(&mut child).await
        }
    };

    for mut reader in readers {
        if cancelled {
            reader.abort();
        } else if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut reader)
            .await
            .is_err()
        {
            log::debug!("Helper output still open after exit, closing it");
            reader.abort();
        }
    }

    let (outcome, exit_code) = match status {
        Ok(status) if cancelled => (BootOutcome::Cancelled, status.code()),
        Ok(status) if status.success() => (BootOutcome::Success, status.code()),
        Ok(status) => (BootOutcome::Failure, status.code()),
        Err(e) => {
            log::error!("Failed to wait for helper process: {}", e);
            let outcome = if cancelled {
                BootOutcome::Cancelled
            } else {
                BootOutcome::Failure
            };
            (outcome, None)
        }
    };

    log::debug!("Helper finished: {} (exit code {:?})", outcome, exit_code);
    let _ = tx.send(LaunchEvent::Finished { outcome, exit_code });
}

/// Send SIGTERM so the helper can release the USB device, and kill it if it
/// is still running after [`TERMINATE_GRACE_PERIOD`].
async fn terminate(child: &mut Child) -> std::io::Result<ExitStatus> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let signalled = Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match signalled {
            Ok(status) if status.success() => {
                match tokio::time::timeout(TERMINATE_GRACE_PERIOD, child.wait()).await {
                    Ok(status) => return status,
                    Err(_) => log::warn!("Helper ignored SIGTERM, killing it"),
                }
            }
            Ok(status) => log::debug!("kill -TERM {} failed: {}", pid, status),
            Err(e) => log::debug!("Failed to run kill: {}", e),
        }
    }

    if let Err(e) = child.start_kill() {
        log::warn!("Failed to signal helper process: {}", e);
    }
    child.wait().await
}

/// Handle to a running helper process.
///
/// Events are applied to the job record as they are received. Dropping the
/// handle before the job finished cancels it.
pub struct BootJobHandle {
    job: BootJob,
    events: mpsc::UnboundedReceiver<LaunchEvent>,
    cancel: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<()>,
    pid: Option<u32>,
}

impl BootJobHandle {
    pub fn job(&self) -> &BootJob {
        &self.job
    }

    pub fn image_path(&self) -> &PathBuf {
        &self.job.image_path
    }

    /// Process id of the helper, if it was still known at spawn time
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the helper to terminate. The outcome becomes `Cancelled` once the
    /// process has been reaped, unless it had already exited.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_none()
    }

    /// Next event of the job, or `None` once it has finished
    pub async fn next_event(&mut self) -> Option<LaunchEvent> {
        if self.job.outcome.is_terminal() {
            return None;
        }

        let event = match self.events.recv().await {
            Some(event) => event,
            None => {
                // Supervisor went away without reporting
                let outcome = if self.is_cancel_requested() {
                    BootOutcome::Cancelled
                } else {
                    BootOutcome::Failure
                };
                LaunchEvent::Finished {
                    outcome,
                    exit_code: None,
                }
            }
        };

        match &event {
            LaunchEvent::Output(line) => self.job.record_line(line.clone()),
            LaunchEvent::Finished { outcome, exit_code } => self.job.finish(*outcome, *exit_code),
        }
        Some(event)
    }

    /// Drive the job to its end and return the final record
    pub async fn wait(mut self) -> BootJob {
        while self.next_event().await.is_some() {}
        if let Err(e) = (&mut self.supervisor).await {
            log::warn!("Helper supervisor task failed: {}", e);
        }
        self.job.clone()
    }
}

impl Drop for BootJobHandle {
    fn drop(&mut self) {
        if !self.job.outcome.is_terminal() {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_files(dir: &Path, count: usize) {
        for i in 0..count {
            fs::write(dir.join(format!("file{}.bin", i)), b"x").unwrap();
        }
    }

    #[test]
    fn test_ten_files_give_seventeen_steps() {
        let temp_dir = TempDir::new().unwrap();
        create_files(temp_dir.path(), 10);
        assert_eq!(estimate_step_count(temp_dir.path()), 17);
    }

    #[test]
    fn test_unreadable_folder_gives_fixed_stages() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");
        assert_eq!(estimate_step_count(&missing), FIXED_BOOT_STAGES);
    }

    #[test]
    fn test_subdirectories_are_not_counted() {
        let temp_dir = TempDir::new().unwrap();
        create_files(temp_dir.path(), 2);
        fs::create_dir(temp_dir.path().join("overlays")).unwrap();
        assert_eq!(estimate_step_count(temp_dir.path()), 9);
    }

    #[test]
    fn test_step_count_grows_with_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut previous = estimate_step_count(temp_dir.path());
        assert_eq!(previous, FIXED_BOOT_STAGES);

        for i in 0..5 {
            fs::write(temp_dir.path().join(format!("extra{}", i)), b"").unwrap();
            let current = estimate_step_count(temp_dir.path());
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, FIXED_BOOT_STAGES + 5);
    }

    #[test]
    fn test_command_line() {
        let launcher = BootLauncher::default();
        assert_eq!(
            launcher.command_line(Path::new("/usr/share/rpiboot/msd")),
            "rpiboot -d /usr/share/rpiboot/msd"
        );
    }

    #[tokio::test]
    async fn test_missing_helper_is_launch_error() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = BootLauncher::new("/nonexistent/usbboot-helper");
        assert!(!launcher.is_available());

        match launcher.launch(temp_dir.path()) {
            Err(UsbBootError::Launch { program, .. }) => {
                assert_eq!(program, "/nonexistent/usbboot-helper")
            }
            Err(other) => panic!("Expected launch error, got {}", other),
            Ok(_) => panic!("Expected launch error"),
        }
    }
}
