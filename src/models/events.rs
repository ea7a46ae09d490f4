//! Events exchanged between the helper supervisor, the control loop and the CLI

use std::path::PathBuf;

use crate::models::boot::{BootJob, BootOutcome};
use crate::models::device::DeviceVariant;

/// Notifications produced by a running helper process.
///
/// `Output` events of one stream arrive in the order the helper wrote them,
/// and `Finished` is always the last event of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Output(String),
    Finished {
        outcome: BootOutcome,
        exit_code: Option<i32>,
    },
}

/// States of the detect/launch control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Detecting,
    NoDevice,
    AwaitingImageSelection(DeviceVariant),
    Launching,
    Completed,
    Cancelled,
    Failed,
}

/// Application events for reporting control loop progress
#[derive(Debug, Clone)]
pub enum AppEvent {
    StateChanged(ControllerState),
    DeviceDetected(DeviceVariant),
    ImageSelected(PathBuf),
    LaunchStarted {
        image: PathBuf,
        expected_steps: usize,
    },
    LaunchProgress {
        line: String,
        fraction: f64,
    },
    LaunchFinished(BootJob),

    // User feedback
    Error(String),
    Warning(String),
    Info(String),
}
