//! Unit tests for the liveness marker.

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;
use thiccpaper::marker::LivenessMarker;
use thiccpaper::AppError;

#[test]
fn create_then_exists() {
    let dir = TempDir::new().expect("tempdir");
    let marker = LivenessMarker::new(dir.path().join("server.lock"));

    assert!(!marker.exists());
    marker.create().expect("create");
    assert!(marker.exists());
    assert_eq!(std::fs::metadata(marker.path()).unwrap().len(), 0);
}

#[test]
fn second_create_is_already_running() {
    let dir = TempDir::new().expect("tempdir");
    let marker = LivenessMarker::new(dir.path().join("server.lock"));

    marker.create().expect("first create");
    let err = marker.create().unwrap_err();

    assert!(matches!(err, AppError::AlreadyRunning(_)), "got {err:?}");
    assert!(marker.exists(), "failed create must leave the marker alone");
}

#[test]
fn remove_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let marker = LivenessMarker::new(dir.path().join("server.lock"));

    marker.create().expect("create");
    assert!(marker.remove().expect("first remove"));
    assert!(!marker.remove().expect("second remove"));
    assert!(!marker.exists());
}

#[test]
fn create_makes_parent_directories() {
    let dir = TempDir::new().expect("tempdir");
    let marker = LivenessMarker::new(dir.path().join("run").join("server.lock"));

    marker.create().expect("create");
    assert!(marker.exists());
}

#[test]
fn concurrent_creates_admit_exactly_one() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("server.lock");
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let marker = LivenessMarker::new(path.clone());
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                marker.create()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::AlreadyRunning(_))))
        .count();

    assert_eq!(created, 1);
    assert_eq!(refused, 7);
}
