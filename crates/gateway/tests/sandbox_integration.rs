//! Integration tests for the sandboxed file manager.
//!
//! These tests exercise the public API end to end:
//! - Boundary enforcement for every operation
//! - Symlink escapes
//! - Concurrent readers and writers
//! - Listing semantics

use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

use gateway::{ErrorKind, FileManager, FileManagerImpl};
use tempfile::TempDir;

/// Create a sandbox directory inside a fresh temp dir.
///
/// Returns the temp dir guard, the sandbox path and a manager for it.
fn create_sandbox() -> (TempDir, PathBuf, Arc<FileManagerImpl>) {
    let temp_dir = TempDir::new().unwrap();
    let sandbox = temp_dir.path().join("sandbox");
    fs::create_dir_all(&sandbox).unwrap();
    let manager = Arc::new(FileManagerImpl::new(&sandbox));
    (temp_dir, sandbox, manager)
}

// =============================================================================
// Boundary Tests
// =============================================================================

#[test]
fn test_sandbox_scenario() {
    let (temp_dir, sandbox, manager) = create_sandbox();

    manager.write("a/b.txt", "hi").unwrap();
    let written = sandbox.join("a/b.txt");
    assert_eq!(fs::read_to_string(&written).unwrap(), "hi");
    assert_eq!(
        fs::metadata(&written).unwrap().permissions().mode() & 0o777,
        0o600
    );
    assert_eq!(manager.read("a/b.txt").unwrap(), "hi");

    let err = manager.write("../outside.txt", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);
    assert!(!temp_dir.path().join("outside.txt").exists());
}

#[test]
fn test_outside_paths_never_mutate() {
    let (temp_dir, _sandbox, manager) = create_sandbox();
    let victim = temp_dir.path().join("victim.txt");
    fs::write(&victim, "original").unwrap();
    let victim_str = victim.to_string_lossy().to_string();

    let attempts = [
        "../victim.txt".to_string(),
        "a/../../victim.txt".to_string(),
        victim_str.clone(),
        format!("{}/./", victim_str),
    ];

    for path in &attempts {
        assert_eq!(manager.write(path, "pwned").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(manager.delete(path).unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(manager.read(path).unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(
            manager.create_directory(path).unwrap_err().kind(),
            ErrorKind::InvalidPath
        );
    }

    assert_eq!(fs::read_to_string(&victim).unwrap(), "original");
}

#[test]
fn test_dangerous_characters_rejected_even_inside() {
    let (_temp_dir, sandbox, manager) = create_sandbox();
    fs::write(sandbox.join("plain.txt"), "x").unwrap();

    for c in ['|', ';', '$', '&', '<', '>', '`', '\0'] {
        let path = format!("plain{c}.txt");
        assert_eq!(manager.exists(&path).unwrap_err().kind(), ErrorKind::InvalidPath);
    }
}

#[test]
fn test_absolute_path_inside_is_accepted() {
    let (_temp_dir, sandbox, manager) = create_sandbox();

    let path = sandbox.join("abs.txt").to_string_lossy().to_string();
    manager.write(&path, "absolute").unwrap();
    assert_eq!(manager.read("abs.txt").unwrap(), "absolute");
}

#[test]
fn test_symlink_escape_rejected() {
    let (temp_dir, sandbox, manager) = create_sandbox();
    let outside = temp_dir.path().join("outside");
    fs::create_dir_all(&outside).unwrap();
    fs::write(outside.join("secret.txt"), "secret").unwrap();

    symlink(&outside, sandbox.join("door")).unwrap();
    symlink(outside.join("secret.txt"), sandbox.join("secret-link")).unwrap();

    assert_eq!(manager.read("door/secret.txt").unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_eq!(manager.read("secret-link").unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_eq!(
        manager.write("door/planted.txt", "x").unwrap_err().kind(),
        ErrorKind::InvalidPath
    );
    assert_eq!(manager.list("door", true).unwrap_err().kind(), ErrorKind::InvalidPath);
    assert!(!outside.join("planted.txt").exists());
}

// =============================================================================
// Operation Semantics Tests
// =============================================================================

#[test]
fn test_round_trip_preserves_content() {
    let (_temp_dir, _sandbox, manager) = create_sandbox();

    let content = "line one\nline two\n\tunicode: héllo 世界\n";
    manager.write("docs/notes.md", content).unwrap();
    assert_eq!(manager.read("docs/notes.md").unwrap(), content);

    manager.write("empty.txt", "").unwrap();
    assert_eq!(manager.read("empty.txt").unwrap(), "");
}

#[test]
fn test_create_directory_twice() {
    let (_temp_dir, sandbox, manager) = create_sandbox();

    manager.create_directory("nested/dir").unwrap();
    manager.create_directory("nested/dir").unwrap();
    let mode = fs::metadata(sandbox.join("nested/dir")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
fn test_list_children_and_descendants() {
    let (_temp_dir, _sandbox, manager) = create_sandbox();
    manager.write("root.txt", "r").unwrap();
    manager.write("src/main.rs", "m").unwrap();
    manager.write("src/util/mod.rs", "u").unwrap();
    manager.create_directory("empty").unwrap();

    let children = manager.list(".", false).unwrap();
    assert_eq!(children, vec!["empty", "root.txt", "src"]);

    let descendants = manager.list(".", true).unwrap();
    let unique: HashSet<String> = descendants.iter().cloned().collect();
    assert_eq!(unique.len(), descendants.len());

    let expected: HashSet<String> = [
        "empty",
        "root.txt",
        "src",
        "src/main.rs",
        "src/util",
        "src/util/mod.rs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(unique, expected);
}

#[test]
fn test_stat_reports_caller_path() {
    let (_temp_dir, _sandbox, manager) = create_sandbox();
    manager.write("./data/../data/report.csv", "a,b,c").unwrap();

    let info = manager.stat("./data/../data/report.csv").unwrap();
    assert_eq!(info.path, "./data/../data/report.csv");
    assert_eq!(info.name, "report.csv");
    assert_eq!(info.size, 5);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_reads() {
    let (_temp_dir, _sandbox, manager) = create_sandbox();
    let content = "x".repeat(64 * 1024);
    manager.write("shared.txt", &content).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let expected = content.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    assert_eq!(manager.read("shared.txt").unwrap(), expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_reads_never_observe_partial_writes() {
    let (_temp_dir, _sandbox, manager) = create_sandbox();
    let before = "a".repeat(256 * 1024);
    let after = "b".repeat(256 * 1024);
    manager.write("data.bin", &before).unwrap();

    let barrier = Arc::new(Barrier::new(9));

    let writer = {
        let manager = Arc::clone(&manager);
        let barrier = Arc::clone(&barrier);
        let (before, after) = (before.clone(), after.clone());
        thread::spawn(move || {
            barrier.wait();
            for i in 0..20 {
                let next = if i % 2 == 0 { &after } else { &before };
                manager.write("data.bin", next).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            let (before, after) = (before.clone(), after.clone());
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    let seen = manager.read("data.bin").unwrap();
                    assert!(seen == before || seen == after, "observed a partial write");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_independent_managers() {
    let (_temp_a, sandbox_a, manager_a) = create_sandbox();
    let (_temp_b, sandbox_b, manager_b) = create_sandbox();

    manager_a.write("only-a.txt", "a").unwrap();
    assert!(!manager_b.exists("only-a.txt").unwrap());

    let into_a = sandbox_a.join("only-a.txt").to_string_lossy().to_string();
    assert_eq!(manager_b.read(&into_a).unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_ne!(sandbox_a, sandbox_b);
}
