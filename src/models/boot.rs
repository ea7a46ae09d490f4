//! Boot job bookkeeping for a single helper run

use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;

/// Terminal (or pending) state of a boot job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Pending,
    Success,
    Failure,
    Cancelled,
}

impl BootOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BootOutcome::Pending)
    }
}

impl fmt::Display for BootOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BootOutcome::Pending => "pending",
            BootOutcome::Success => "success",
            BootOutcome::Failure => "failure",
            BootOutcome::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// In-memory record of one launch of the helper process
#[derive(Debug, Clone)]
pub struct BootJob {
    pub image_path: PathBuf,
    pub expected_step_count: usize,
    pub completed_steps: usize,
    /// Most recent line printed by the helper
    pub last_line: Option<String>,
    pub exit_code: Option<i32>,
    pub outcome: BootOutcome,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl BootJob {
    pub fn new(image_path: PathBuf, expected_step_count: usize) -> Self {
        Self {
            image_path,
            expected_step_count,
            completed_steps: 0,
            last_line: None,
            exit_code: None,
            outcome: BootOutcome::Pending,
            started_at: Local::now(),
            finished_at: None,
        }
    }

    /// Count one line of helper output as one unit of progress
    pub fn record_line(&mut self, line: String) {
        if self.outcome.is_terminal() {
            return;
        }
        self.completed_steps += 1;
        self.last_line = Some(line);
    }

    /// Progress fraction, always within `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.expected_step_count == 0 {
            return if self.completed_steps > 0 { 1.0 } else { 0.0 };
        }
        (self.completed_steps as f64 / self.expected_step_count as f64).min(1.0)
    }

    /// Record the terminal outcome. Only the first call has an effect.
    pub fn finish(&mut self, outcome: BootOutcome, exit_code: Option<i32>) {
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return;
        }
        self.outcome = outcome;
        self.exit_code = exit_code;
        self.finished_at = Some(Local::now());
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }
}

/// What a single launch attempt meant for the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Helper exited with status 0
    Completed,
    /// User cancelled the launch; the loop must stop entirely
    Cancelled,
    /// Helper could not be started or exited with a non-zero status
    Failed,
}

impl From<BootOutcome> for LaunchOutcome {
    fn from(outcome: BootOutcome) -> Self {
        match outcome {
            BootOutcome::Success => LaunchOutcome::Completed,
            BootOutcome::Cancelled => LaunchOutcome::Cancelled,
            BootOutcome::Failure | BootOutcome::Pending => LaunchOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_is_clamped() {
        let mut job = BootJob::new(PathBuf::from("/tmp/img"), 3);
        for i in 0..10 {
            job.record_line(format!("line {}", i));
            assert!((0.0..=1.0).contains(&job.fraction()));
        }
        assert_eq!(job.completed_steps, 10);
        assert_eq!(job.fraction(), 1.0);
        assert_eq!(job.last_line.as_deref(), Some("line 9"));
    }

    #[test]
    fn test_fraction_matches_step_ratio() {
        let mut job = BootJob::new(PathBuf::from("/tmp/img"), 17);
        for _ in 0..5 {
            job.record_line("step".to_string());
        }
        assert!((job.fraction() - 5.0 / 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_expected_steps() {
        let mut job = BootJob::new(PathBuf::from("/tmp/img"), 0);
        assert_eq!(job.fraction(), 0.0);
        job.record_line("x".to_string());
        assert_eq!(job.fraction(), 1.0);
    }

    #[test]
    fn test_first_outcome_wins() {
        let mut job = BootJob::new(PathBuf::from("/tmp/img"), 7);
        job.finish(BootOutcome::Pending, None);
        assert_eq!(job.outcome, BootOutcome::Pending);

        job.finish(BootOutcome::Cancelled, None);
        job.finish(BootOutcome::Success, Some(0));
        assert_eq!(job.outcome, BootOutcome::Cancelled);
        assert!(job.duration_ms().is_some());

        // Output after the exit is not counted
        job.record_line("late".to_string());
        assert_eq!(job.completed_steps, 0);
    }

    #[test]
    fn test_launch_outcome_mapping() {
        assert_eq!(
            LaunchOutcome::from(BootOutcome::Success),
            LaunchOutcome::Completed
        );
        assert_eq!(
            LaunchOutcome::from(BootOutcome::Failure),
            LaunchOutcome::Failed
        );
        assert_eq!(
            LaunchOutcome::from(BootOutcome::Cancelled),
            LaunchOutcome::Cancelled
        );
    }
}
