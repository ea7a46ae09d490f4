//! Detect/launch control loop
//!
//! ```text
//! Idle -> Detecting -> NoDevice
//!                   -> AwaitingImageSelection -> Launching -> Completed -> Detecting ...
//!                                                          -> Cancelled | Failed
//! ```
//!
//! Interactive passes run the loop back to back until no device is left.
//! Watch mode repeats passes on a fixed tick. A user cancellation ends
//! everything, including watch mode.

use std::path::Path;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::errors::{Result, UsbBootError};
use crate::models::boot::{BootJob, BootOutcome, LaunchOutcome};
use crate::models::events::{AppEvent, ControllerState, LaunchEvent};
use crate::services::boot_launcher::BootLauncher;
use crate::services::device_watcher::DeviceWatcher;
use crate::services::image_selection::ImageSelector;

/// How a detection pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// No recognized device is attached (anymore)
    NoDevice,
    /// The user declined to pick an image or cancelled a launch
    Cancelled,
    /// The helper could not be started or reported an error
    Failed,
    /// An interactive pass stopped because the user chose to remember an image
    Remembered,
}

/// Control loop tying the device watcher, image selection and boot launcher together
pub struct BootController<S> {
    watcher: DeviceWatcher,
    launcher: BootLauncher,
    selector: S,
    events: Option<mpsc::UnboundedSender<AppEvent>>,
    cancel: Option<watch::Receiver<bool>>,
    state: ControllerState,
    helper_checked: bool,
}

impl<S: ImageSelector> BootController<S> {
    pub fn new(watcher: DeviceWatcher, launcher: BootLauncher, selector: S) -> Self {
        Self {
            watcher,
            launcher,
            selector,
            events: None,
            cancel: None,
            state: ControllerState::Idle,
            helper_checked: false,
        }
    }

    /// Report progress on `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Treat the receiver turning `true` as a user cancellation
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn selector(&self) -> &S {
        &self.selector
    }

    fn emit(&self, event: AppEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn transition(&mut self, state: ControllerState) {
        if self.state != state {
            log::debug!("Controller state: {:?} -> {:?}", self.state, state);
            self.state = state;
            self.emit(AppEvent::StateChanged(state));
        }
    }

    /// Warn once when the helper cannot be found
    fn check_helper(&mut self) {
        if std::mem::replace(&mut self.helper_checked, true) || self.launcher.is_available() {
            return;
        }
        let message = format!(
            "{} not found in PATH, install usbboot or pass --helper",
            self.launcher.program()
        );
        log::warn!("{}", message);
        self.emit(AppEvent::Warning(message));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|cancel| *cancel.borrow())
    }

    /// Resolves once cancellation has been requested. Never resolves when
    /// there is no cancellation source or it went away.
    async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
        match cancel {
            Some(rx) => {
                let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                if closed {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Push `image` to the attached device and wait for the helper to finish
    pub async fn launch(&mut self, image: &Path) -> LaunchOutcome {
        self.transition(ControllerState::Launching);

        let mut handle = match self.launcher.launch(image) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("{}", e);
                self.emit(AppEvent::Error(format!("Could not start helper: {}", e)));
                self.transition(ControllerState::Failed);
                return LaunchOutcome::Failed;
            }
        };

        self.emit(AppEvent::LaunchStarted {
            image: image.to_path_buf(),
            expected_steps: handle.job().expected_step_count,
        });

        let mut cancel = self.cancel.clone();
        loop {
            tokio::select! {
                event = handle.next_event() => match event {
                    Some(LaunchEvent::Output(line)) => {
                        log::debug!("helper: {}", line);
                        self.emit(AppEvent::LaunchProgress {
                            fraction: handle.job().fraction(),
                            line,
                        });
                    }
                    Some(LaunchEvent::Finished { .. }) | None => break,
                },
                _ = Self::cancelled(&mut cancel), if !handle.is_cancel_requested() => {
                    log::info!("Launch cancelled by user");
                    handle.cancel();
                }
            }
        }

        let mut job = handle.wait().await;
        if job.outcome == BootOutcome::Failure && job.exit_code.is_none() && self.is_cancelled() {
            // Killed by a signal while the user was cancelling
            log::info!("Helper was interrupted by the user");
            job.outcome = BootOutcome::Cancelled;
        }
        self.finish_launch(job)
    }

    fn finish_launch(&mut self, job: BootJob) -> LaunchOutcome {
        let outcome = LaunchOutcome::from(job.outcome);
        match outcome {
            LaunchOutcome::Completed => {
                log::info!("Helper finished for {}", job.image_path.display());
                self.transition(ControllerState::Completed);
            }
            LaunchOutcome::Cancelled => self.transition(ControllerState::Cancelled),
            LaunchOutcome::Failed => {
                let error = UsbBootError::Helper(job.exit_code);
                log::error!("{}", error);
                self.emit(AppEvent::Error(error.to_string()));
                self.transition(ControllerState::Failed);
            }
        }
        self.emit(AppEvent::LaunchFinished(job));
        outcome
    }

    /// Run detect/select/launch until no device is left or something stops the loop.
    ///
    /// With `stop_after_remember` the pass also ends after a launch whose image
    /// the user asked to remember. Errors from the image selector are returned.
    pub async fn run_pass(&mut self, stop_after_remember: bool) -> Result<PassOutcome> {
        self.check_helper();
        loop {
            if self.is_cancelled() {
                self.transition(ControllerState::Cancelled);
                return Ok(PassOutcome::Cancelled);
            }

            self.transition(ControllerState::Detecting);
            let Some(variant) = self.watcher.detect_variant() else {
                self.transition(ControllerState::NoDevice);
                return Ok(PassOutcome::NoDevice);
            };
            self.emit(AppEvent::DeviceDetected(variant));

            self.transition(ControllerState::AwaitingImageSelection(variant));
            let mut cancel = self.cancel.clone();
            let selected = tokio::select! {
                selected = self.selector.select_image(variant) => selected,
                _ = Self::cancelled(&mut cancel) => Ok(None),
            };
            let selection = match selected {
                Ok(Some(selection)) => selection,
                Ok(None) => {
                    log::info!("No image selected");
                    self.transition(ControllerState::Cancelled);
                    return Ok(PassOutcome::Cancelled);
                }
                Err(e) => {
                    self.transition(ControllerState::Failed);
                    return Err(e);
                }
            };
            self.emit(AppEvent::ImageSelected(selection.path.clone()));

            let outcome = self.launch(&selection.path).await;
            if outcome == LaunchOutcome::Completed && selection.remember {
                self.emit(AppEvent::Info(format!(
                    "Next devices will be booted with {} without asking",
                    selection.path.display()
                )));
            }
            match outcome {
                LaunchOutcome::Completed if stop_after_remember && selection.remember => {
                    return Ok(PassOutcome::Remembered);
                }
                LaunchOutcome::Completed => continue,
                LaunchOutcome::Cancelled => return Ok(PassOutcome::Cancelled),
                LaunchOutcome::Failed => return Ok(PassOutcome::Failed),
            }
        }
    }

    /// One interactive pass: keep serving devices back to back without delay
    pub async fn run_interactive(&mut self) -> Result<PassOutcome> {
        self.run_pass(true).await
    }

    /// Poll every `interval` until the user cancels.
    ///
    /// Failed passes are reported and polling continues on the next tick.
    pub async fn run_watch(&mut self, interval: Duration) -> Result<PassOutcome> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancel = self.cancel.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = Self::cancelled(&mut cancel) => {
                    self.transition(ControllerState::Cancelled);
                    return Ok(PassOutcome::Cancelled);
                }
            }

            match self.run_pass(false).await {
                Ok(PassOutcome::Cancelled) => return Ok(PassOutcome::Cancelled),
                Ok(outcome) => log::trace!("Watch pass ended: {:?}", outcome),
                Err(e) => {
                    log::error!("{}", e);
                    self.emit(AppEvent::Error(e.to_string()));
                }
            }
        }
    }
}
