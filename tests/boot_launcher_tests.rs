//! Boot launcher tests against scripted helper processes

#![cfg(unix)]


use std::time::Duration;

use tempfile::TempDir;
use test_fixtures::{HelperFixtures, ImageFixtures, process_exists, serial_guard};
use usbboot_launcher::models::{BootOutcome, LaunchEvent};
use usbboot_launcher::services::{BootJobHandle, BootLauncher, FIXED_BOOT_STAGES};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn collect_events(handle: &mut BootJobHandle) -> Vec<LaunchEvent> {
    let mut events = Vec::new();
    tokio::time::timeout(TEST_TIMEOUT, async {
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
    })
    .await
    .expect("Helper did not finish in time");
    events
}

#[tokio::test]
async fn test_successful_helper_reports_progress() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 10).unwrap();
    let helper = HelperFixtures::printing_helper(temp_dir.path(), 5, 0).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let mut handle = launcher.launch(&image).expect("Helper should start");
    assert_eq!(handle.job().expected_step_count, 17);

    let events = collect_events(&mut handle).await;
    let outputs = events
        .iter()
        .filter(|event| matches!(event, LaunchEvent::Output(_)))
        .count();
    assert_eq!(outputs, 5);
    assert_eq!(
        events.last(),
        Some(&LaunchEvent::Finished {
            outcome: BootOutcome::Success,
            exit_code: Some(0),
        })
    );
    assert_eq!(events[0], LaunchEvent::Output("Sending stage 1".to_string()));

    let job = handle.wait().await;
    assert_eq!(job.outcome, BootOutcome::Success);
    assert_eq!(job.completed_steps, 5);
    assert!((job.fraction() - 5.0 / 17.0).abs() < 1e-9);
    assert_eq!(job.last_line.as_deref(), Some("Sending stage 5"));
}

#[tokio::test]
async fn test_nonzero_exit_is_failure() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 1).unwrap();
    let helper = HelperFixtures::printing_helper(temp_dir.path(), 2, 3).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let handle = launcher.launch(&image).expect("Helper should start");
    let job = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Helper did not finish in time");

    assert_eq!(job.outcome, BootOutcome::Failure);
    assert_eq!(job.exit_code, Some(3));
    assert_eq!(job.completed_steps, 2);
}

#[tokio::test]
async fn test_helper_receives_image_flag() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "gpioexpand", 3).unwrap();
    let helper = HelperFixtures::args_echo_helper(temp_dir.path()).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let mut handle = launcher.launch(&image).expect("Helper should start");
    let events = collect_events(&mut handle).await;

    assert_eq!(events[0], LaunchEvent::Output("-d".to_string()));
    assert_eq!(
        events[1],
        LaunchEvent::Output(image.to_string_lossy().to_string())
    );
}

#[tokio::test]
async fn test_stderr_lines_count_as_progress() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 1).unwrap();
    let helper = HelperFixtures::create_helper(
        temp_dir.path(),
        "mixed-helper",
        "echo out\necho err >&2\necho out2\necho err2 >&2",
    )
    .unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let handle = launcher.launch(&image).expect("Helper should start");
    let job = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Helper did not finish in time");

    assert_eq!(job.outcome, BootOutcome::Success);
    assert_eq!(job.completed_steps, 4);
}

#[tokio::test]
async fn test_excess_output_clamps_fraction() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = temp_dir.path().join("empty-image");
    std::fs::create_dir(&image).unwrap();
    let helper = HelperFixtures::printing_helper(temp_dir.path(), 30, 0).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let mut handle = launcher.launch(&image).expect("Helper should start");
    assert_eq!(handle.job().expected_step_count, FIXED_BOOT_STAGES);

    let mut fractions = Vec::new();
    tokio::time::timeout(TEST_TIMEOUT, async {
        while handle.next_event().await.is_some() {
            fractions.push(handle.job().fraction());
        }
    })
    .await
    .expect("Helper did not finish in time");

    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(handle.job().fraction(), 1.0);
}

#[tokio::test]
async fn test_cancel_after_two_lines() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 4).unwrap();
    let helper = HelperFixtures::hanging_helper(temp_dir.path(), 2).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let mut handle = launcher.launch(&image).expect("Helper should start");
    let pid = handle.pid().expect("Helper should have a pid");

    tokio::time::timeout(TEST_TIMEOUT, async {
        while handle.job().completed_steps < 2 {
            if handle.next_event().await.is_none() {
                break;
            }
        }
    })
    .await
    .expect("Helper output did not arrive in time");
    assert_eq!(handle.job().completed_steps, 2);
    assert_eq!(handle.job().outcome, BootOutcome::Pending);

    handle.cancel();
    assert!(handle.is_cancel_requested());

    let job = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Cancelled helper was not reaped in time");
    assert_eq!(job.outcome, BootOutcome::Cancelled);
    assert_eq!(job.completed_steps, 2);
    assert!(!process_exists(pid), "Helper process should be gone");
}

#[tokio::test]
async fn test_cancel_lets_helper_exit_on_sigterm() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 1).unwrap();
    let marker = temp_dir.path().join("released");
    let helper = HelperFixtures::terminating_helper(temp_dir.path(), &marker).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let mut handle = launcher.launch(&image).expect("Helper should start");
    tokio::time::timeout(TEST_TIMEOUT, handle.next_event())
        .await
        .expect("Helper output did not arrive in time");

    handle.cancel();
    let job = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Cancelled helper was not reaped in time");

    assert_eq!(job.outcome, BootOutcome::Cancelled);
    assert!(marker.exists(), "Helper should have handled SIGTERM");
}

#[tokio::test]
async fn test_dropping_handle_kills_helper() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 1).unwrap();
    let helper = HelperFixtures::hanging_helper(temp_dir.path(), 1).unwrap();

    let launcher = BootLauncher::new(helper.to_string_lossy());
    let mut handle = launcher.launch(&image).expect("Helper should start");
    let pid = handle.pid().expect("Helper should have a pid");

    tokio::time::timeout(TEST_TIMEOUT, handle.next_event())
        .await
        .expect("Helper output did not arrive in time");
    drop(handle);

    let gone = tokio::time::timeout(TEST_TIMEOUT, async {
        while process_exists(pid) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(gone.is_ok(), "Helper process survived its handle");
}

#[tokio::test]
async fn test_missing_helper_does_not_start() {
    let _guard = serial_guard();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let image = ImageFixtures::create_image_dir(temp_dir.path(), "msd", 1).unwrap();

    let launcher = BootLauncher::new(temp_dir.path().join("no-such-rpiboot").to_string_lossy());
    let error = launcher.launch(&image).err().expect("Launch should fail");
    assert!(error.to_string().starts_with("Error starting"));
}
