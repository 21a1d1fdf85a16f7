use ach_fs::{atomic_read, atomic_write, replace_dir, AtomicWriteOptions, MergeLock, ReplaceDirOptions, Workspace};
use tempfile::tempdir;

#[test]
fn atomic_write_basic_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("20260728-091400606-1.ach");

    atomic_write(&path, b"101 091400606...", AtomicWriteOptions::new()).unwrap();

    assert!(path.exists());
    assert_eq!(atomic_read(&path).unwrap(), b"101 091400606...");
}

#[test]
fn atomic_write_replaces_content_without_a_torn_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.ach");
    std::fs::write(&path, "original batch").unwrap();

    atomic_write(&path, b"merged batch", AtomicWriteOptions::new()).unwrap();

    assert_eq!(atomic_read(&path).unwrap(), b"merged batch");
}

#[test]
fn replace_dir_swaps_scratch_into_merged() {
    let dir = tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    let merged = dir.path().join("merged");
    std::fs::create_dir_all(&scratch).unwrap();
    std::fs::write(scratch.join("20260728-091400606-1.ach"), "entries").unwrap();

    replace_dir(&scratch, &merged, ReplaceDirOptions::new()).unwrap();

    assert!(merged.join("20260728-091400606-1.ach").exists());
    assert!(!scratch.exists());
}

#[test]
fn workspace_stages_then_commits_atomically() {
    let dir = tempdir().unwrap();
    let workspace = Workspace::new(dir.path().join("staging")).unwrap();
    workspace
        .write(std::path::Path::new("20260728-091400606-1.ach"), b"entries")
        .unwrap();

    let dest = dir.path().join("merged");
    workspace.commit(&dest).unwrap();

    assert!(dest.join("20260728-091400606-1.ach").exists());
}

#[test]
fn merge_lock_serializes_writers_to_the_same_destination() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("20260728-091400606-1.ach.lock");

    let first = MergeLock::acquire(&lock_path).unwrap();
    assert!(MergeLock::try_acquire(&lock_path).unwrap().is_none());

    drop(first);
    assert!(MergeLock::try_acquire(&lock_path).unwrap().is_some());
}
