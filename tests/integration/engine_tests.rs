use super::common::*;
use dupscan::engine::{EngineConfig, WorkerState};
use dupscan::observer::ScanEvent;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_scan_empty_directory() {
    let (_dir, root) = temp_root();

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert_eq!(
        events.first(),
        Some(&ScanEvent::DirectoryEntered { path: root.clone() })
    );
    assert!(duplicates(&events).is_empty());
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.total_directories, 1);
    assert_eq!(stats.directories_pending, 0);
}

#[test]
fn test_two_identical_one_different() {
    let (_dir, root) = temp_root();
    write_file(&root.join("A.txt"), b"hello");
    write_file(&root.join("B.txt"), b"hello");
    write_file(&root.join("C.txt"), b"world");

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert_eq!(
        duplicates(&events),
        vec![root.join("A.txt"), root.join("B.txt")]
    );
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.total_duplicates, 2);
    assert_eq!(stats.total_false_duplicates, 0);
}

#[test]
fn test_both_duplicate_events_share_hash() {
    let (_dir, root) = temp_root();
    write_file(&root.join("a"), b"payload");
    write_file(&root.join("b"), b"payload");

    let (events, _) = scan(&[&root], EngineConfig::default());

    let hashes: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::DuplicateFound { hash, .. } => Some(hash),
            _ => None,
        })
        .collect();
    assert_eq!(hashes.len(), 2);
    assert_eq!(hashes[0], hashes[1]);
    assert_eq!(hashes[0].len(), 64);
}

#[test]
fn test_duplicates_across_nested_directories() {
    let (_dir, root) = temp_root();
    write_file(&root.join("top.bin"), b"shared content");
    write_file(&root.join("x/y/deep.bin"), b"shared content");
    write_file(&root.join("x/other.bin"), b"something else");

    let (events, stats) = scan(&[&root], EngineConfig::default());

    let mut found = duplicates(&events);
    found.sort();
    assert_eq!(found, vec![root.join("top.bin"), root.join("x/y/deep.bin")]);
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.total_directories, 3);
}

#[test]
fn test_third_member_announced_alone() {
    let (_dir, root) = temp_root();
    write_file(&root.join("1"), b"triplet");
    write_file(&root.join("2"), b"triplet");
    write_file(&root.join("3"), b"triplet");

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert_eq!(
        duplicates(&events),
        vec![root.join("1"), root.join("2"), root.join("3")]
    );
    assert_eq!(stats.total_duplicates, 3);
}

#[test]
fn test_shared_prefix_is_false_duplicate() {
    let (_dir, root) = temp_root();
    let mut first = vec![7u8; 5000];
    let mut second = vec![7u8; 5000];
    first[4999] = 1;
    second[4999] = 2;
    write_file(&root.join("first"), &first);
    write_file(&root.join("second"), &second);

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert!(duplicates(&events).is_empty());
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_false_duplicates, 2);
}

#[test]
fn test_same_prefix_different_sizes_never_collide() {
    let (_dir, root) = temp_root();
    write_file(&root.join("short"), &[1u8; 100]);
    write_file(&root.join("long"), &[1u8; 101]);

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert!(duplicates(&events).is_empty());
    assert_eq!(stats.total_false_duplicates, 0);
}

#[test]
fn test_multiple_roots() {
    let (_a, root_a) = temp_root();
    let (_b, root_b) = temp_root();
    write_file(&root_a.join("photo.jpg"), b"jpeg bytes");
    write_file(&root_b.join("copy.jpg"), b"jpeg bytes");

    let (events, stats) = scan(&[&root_a, &root_b], EngineConfig::default());

    let mut found = duplicates(&events);
    found.sort();
    let mut expected = vec![root_a.join("photo.jpg"), root_b.join("copy.jpg")];
    expected.sort();
    assert_eq!(found, expected);
    assert_eq!(stats.total_directories, 2);
}

#[test]
fn test_overlapping_roots_scanned_once() {
    let (_dir, root) = temp_root();
    write_file(&root.join("sub/file"), b"only one copy");

    // The child is queued as a root first, then found again under the parent
    let (events, stats) = scan(&[&root.join("sub"), &root], EngineConfig::default());

    assert!(duplicates(&events).is_empty());
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.total_directories, 2);
    let entered = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::DirectoryEntered { .. }))
        .count();
    assert_eq!(entered, 2);
}

#[test]
fn test_directory_entered_before_its_files() {
    let (_dir, root) = temp_root();
    for sub in ["a", "b", "c"] {
        write_file(&root.join(sub).join("same.dat"), b"identical");
    }

    let (events, _) = scan(&[&root], EngineConfig::default());

    let mut entered: Vec<PathBuf> = Vec::new();
    for event in &events {
        match event {
            ScanEvent::DirectoryEntered { path } => entered.push(path.clone()),
            ScanEvent::DuplicateFound { path, .. } => {
                let parent = path.parent().unwrap().to_path_buf();
                assert!(entered.contains(&parent), "{} before its directory", path.display());
            }
            _ => {}
        }
    }
    assert_eq!(duplicates(&events).len(), 3);
}

#[test]
fn test_progress_counters_never_decrease() {
    let (_dir, root) = temp_root();
    for i in 0..20 {
        write_file(&root.join(format!("d{}/f{}", i % 4, i)), format!("{}", i % 5).as_bytes());
    }

    let (events, stats) = scan(&[&root], EngineConfig::default());

    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress(stats) => Some(*stats),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    for pair in progress.windows(2) {
        assert!(pair[1].total_files >= pair[0].total_files);
        assert!(pair[1].total_duplicates >= pair[0].total_duplicates);
        assert!(pair[1].total_directories >= pair[0].total_directories);
    }
    assert_eq!(stats.total_files, 20);
    // Five contents, four copies each
    assert_eq!(stats.total_duplicates, 20);
}

#[test]
fn test_empty_files_skipped_by_default() {
    let (_dir, root) = temp_root();
    write_file(&root.join("empty1"), b"");
    write_file(&root.join("empty2"), b"");

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert!(duplicates(&events).is_empty());
    assert_eq!(stats.total_files, 2);
}

#[test]
fn test_empty_files_grouped_when_enabled() {
    let (_dir, root) = temp_root();
    write_file(&root.join("empty1"), b"");
    write_file(&root.join("empty2"), b"");

    let (events, stats) = scan(&[&root], EngineConfig::default().with_skip_empty_files(false));

    assert_eq!(duplicates(&events).len(), 2);
    assert_eq!(stats.total_duplicates, 2);
}

#[test]
fn test_small_prehash_size_still_confirms_duplicates() {
    let (_dir, root) = temp_root();
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    write_file(&root.join("a"), &content);
    write_file(&root.join("b"), &content);

    let (events, stats) = scan(&[&root], EngineConfig::default().with_prehash_size(16));

    assert_eq!(duplicates(&events).len(), 2);
    assert_eq!(stats.total_false_duplicates, 0);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let (_dir, root) = temp_root();
    write_file(&root.join("real/file"), b"linked content");
    std::os::unix::fs::symlink(root.join("real/file"), root.join("file_link")).unwrap();
    std::os::unix::fs::symlink(root.join("real"), root.join("dir_link")).unwrap();

    let (events, stats) = scan(&[&root], EngineConfig::default());

    assert!(duplicates(&events).is_empty());
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.total_directories, 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_reported_and_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, root) = temp_root();
    let locked = root.join("locked");
    write_file(&locked.join("inner"), b"hidden");
    write_file(&root.join("visible"), b"shown");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        // Running with privileges that ignore permissions
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let (events, stats) = scan(&[&root], EngineConfig::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Permission denied"));
    assert_eq!(stats.total_files, 1);
}

#[test]
fn test_worker_idle_after_drain_and_terminated_after_shutdown() {
    let (_dir, root) = temp_root();
    let (engine, events) = start_engine(EngineConfig::default());
    engine.controller().enqueue_root(&root).unwrap();

    until_drained(&events);
    let controller = engine.controller().clone();
    // The drained event is sent before the worker loops back to wait
    let deadline = std::time::Instant::now() + EVENT_TIMEOUT;
    while controller.worker_state() != WorkerState::Idle {
        assert!(std::time::Instant::now() < deadline);
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    engine.shutdown().unwrap();
    assert_eq!(controller.worker_state(), WorkerState::Terminated);
    assert!(matches!(next_event(&events), ScanEvent::Terminated(_)));
}

#[test]
fn test_terminate_event_carries_final_stats() {
    let (_dir, root) = temp_root();
    write_file(&root.join("a"), b"x");
    write_file(&root.join("b"), b"x");

    let (engine, events) = start_engine(EngineConfig::default());
    engine.controller().enqueue_root(&root).unwrap();
    let (_, drained) = until_drained(&events);
    let joined = engine.shutdown().unwrap();

    match next_event(&events) {
        ScanEvent::Terminated(stats) => assert_eq!(stats, joined),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(drained, joined);
}
