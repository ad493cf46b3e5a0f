use super::common::*;
use dupscan::duplicates::ScanStats;
use dupscan::engine::{EngineConfig, ScanController, ScanEngine};
use dupscan::observer::{ChannelObserver, ScanEvent, ScanObserver};
use dupscan::scanner::Hash;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Forwards events and pauses the engine from inside the first
/// directory-entered callback.
struct PauseOnFirstDirectory {
    inner: ChannelObserver,
    controller: Arc<OnceLock<ScanController>>,
    armed: std::sync::atomic::AtomicBool,
}

impl ScanObserver for PauseOnFirstDirectory {
    fn on_directory_entered(&self, path: &Path) {
        if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
            if let Some(controller) = self.controller.get() {
                controller.request_pause();
            }
        }
        self.inner.on_directory_entered(path);
    }

    fn on_duplicate_found(&self, path: &Path, hash: &Hash) {
        self.inner.on_duplicate_found(path, hash);
    }

    fn on_progress(&self, stats: &ScanStats) {
        self.inner.on_progress(stats);
    }

    fn on_error(&self, message: &str) {
        self.inner.on_error(message);
    }

    fn on_queue_drained(&self, stats: &ScanStats) {
        self.inner.on_queue_drained(stats);
    }

    fn on_terminated(&self, stats: &ScanStats) {
        self.inner.on_terminated(stats);
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

fn tree_with_subdirs(root: &Path, count: usize) {
    for i in 0..count {
        write_file(&root.join(format!("sub{}", i)).join("file"), b"same everywhere");
    }
}

#[test]
fn test_pause_holds_pending_directories() {
    let (_dir, root) = temp_root();
    tree_with_subdirs(&root, 5);

    let (inner, events) = ChannelObserver::bounded(4096);
    let slot = Arc::new(OnceLock::new());
    let observer = PauseOnFirstDirectory {
        inner,
        controller: Arc::clone(&slot),
        armed: std::sync::atomic::AtomicBool::new(true),
    };
    let engine = ScanEngine::start(EngineConfig::default(), observer).unwrap();
    let controller = engine.controller().clone();
    slot.set(controller.clone()).unwrap();

    controller.enqueue_root(&root).unwrap();
    wait_until(|| controller.is_suspended());

    // Root listed; one subdirectory popped and held at the gate
    let held = controller.queue_stats();
    assert_eq!(held.total_directories, 6);
    assert_eq!(held.directories_pending, 4);

    thread::sleep(Duration::from_millis(100));
    assert_eq!(controller.queue_stats(), held);
    let seen: Vec<ScanEvent> = events.try_iter().collect();
    let entered = seen
        .iter()
        .filter(|e| matches!(e, ScanEvent::DirectoryEntered { .. }))
        .count();
    assert_eq!(entered, 1);
    assert!(duplicates(&seen).is_empty());

    controller.request_resume();
    let (rest, stats) = until_drained(&events);

    assert_eq!(stats.total_files, 5);
    assert_eq!(stats.total_duplicates, 5);
    assert_eq!(stats.directories_pending, 0);
    assert_eq!(duplicates(&rest).len(), 5);
    engine.shutdown().unwrap();
}

#[test]
fn test_pause_before_start_holds_first_root() {
    let (_dir, root) = temp_root();
    write_file(&root.join("a"), b"1");

    let (engine, events) = start_engine(EngineConfig::default());
    let controller = engine.controller();
    controller.request_pause();
    controller.enqueue_root(&root).unwrap();

    wait_until(|| controller.is_suspended());
    assert!(controller.is_paused());
    assert!(events.try_recv().is_err());

    controller.request_resume();
    let (seen, stats) = until_drained(&events);
    assert!(!controller.is_paused());
    assert_eq!(stats.total_files, 1);
    assert_eq!(
        seen.first(),
        Some(&ScanEvent::DirectoryEntered { path: root.clone() })
    );
    engine.shutdown().unwrap();
}

#[test]
fn test_terminate_while_paused() {
    let (_dir, root) = temp_root();
    tree_with_subdirs(&root, 3);

    let (engine, events) = start_engine(EngineConfig::default());
    let controller = engine.controller().clone();
    controller.request_pause();
    controller.enqueue_root(&root).unwrap();
    wait_until(|| controller.is_suspended());

    let stats = engine.shutdown().unwrap();

    // The held root is finished, then the terminate command wins
    assert_eq!(stats.total_directories, 4);
    assert_eq!(stats.directories_pending, 3);
    let last = events.try_iter().last();
    assert!(matches!(last, Some(ScanEvent::Terminated(_))));
}

#[test]
fn test_resume_from_another_thread() {
    let (_dir, root) = temp_root();
    write_file(&root.join("x"), b"dup");
    write_file(&root.join("y"), b"dup");

    let (engine, events) = start_engine(EngineConfig::default());
    let controller = engine.controller().clone();
    controller.request_pause();
    controller.enqueue_root(&root).unwrap();
    wait_until(|| controller.is_suspended());

    let resumer = {
        let controller = controller.clone();
        thread::spawn(move || controller.request_resume())
    };
    resumer.join().unwrap();

    let (seen, _) = until_drained(&events);
    assert_eq!(duplicates(&seen).len(), 2);
    engine.shutdown().unwrap();
}

#[test]
fn test_pause_resume_with_idle_worker() {
    let (engine, events) = start_engine(EngineConfig::default());
    let controller = engine.controller();

    for _ in 0..3 {
        controller.request_pause();
        assert!(controller.is_paused());
        controller.request_resume();
        assert!(!controller.is_paused());
    }

    assert!(!controller.is_suspended());
    assert!(events.try_recv().is_err());
    assert_eq!(engine.shutdown().unwrap(), ScanStats::default());
}
