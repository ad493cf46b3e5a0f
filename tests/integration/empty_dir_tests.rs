use super::common::*;
use dupscan::engine::EngineConfig;
use std::fs;

#[test]
fn test_topmost_empty_directories_reported() {
    let (_dir, root) = temp_root();
    write_file(&root.join("full/file"), b"data");
    fs::create_dir_all(root.join("hollow/a/b")).unwrap();
    fs::create_dir_all(root.join("leaf")).unwrap();
    fs::create_dir_all(root.join("mixed/empty_child")).unwrap();
    write_file(&root.join("mixed/file"), b"more data");

    let (engine, events) = start_engine(EngineConfig::default());
    engine.controller().enqueue_root(&root).unwrap();
    until_drained(&events);

    assert_eq!(
        engine.controller().empty_dirs(),
        vec![
            root.join("hollow"),
            root.join("leaf"),
            root.join("mixed/empty_child"),
        ]
    );
    engine.shutdown().unwrap();
}

#[test]
fn test_entirely_empty_tree_reports_root_only() {
    let (_dir, root) = temp_root();
    fs::create_dir_all(root.join("x/y")).unwrap();
    fs::create_dir_all(root.join("z")).unwrap();

    let (engine, events) = start_engine(EngineConfig::default());
    engine.controller().enqueue_root(&root).unwrap();
    until_drained(&events);

    assert_eq!(engine.controller().empty_dirs(), vec![root.clone()]);
    engine.shutdown().unwrap();
}

#[test]
fn test_empty_file_makes_directory_non_empty() {
    let (_dir, root) = temp_root();
    write_file(&root.join("only/zero_length"), b"");
    fs::create_dir_all(root.join("nothing")).unwrap();

    let (engine, events) = start_engine(EngineConfig::default());
    engine.controller().enqueue_root(&root).unwrap();
    until_drained(&events);

    assert_eq!(engine.controller().empty_dirs(), vec![root.join("nothing")]);
    engine.shutdown().unwrap();
}

#[test]
fn test_no_empty_directories() {
    let (_dir, root) = temp_root();
    write_file(&root.join("a/file"), b"1");
    write_file(&root.join("file"), b"2");

    let (engine, events) = start_engine(EngineConfig::default());
    engine.controller().enqueue_root(&root).unwrap();
    until_drained(&events);

    assert!(engine.controller().empty_dirs().is_empty());
    engine.shutdown().unwrap();
}

#[test]
fn test_rescan_drops_directories_that_gained_files() {
    let (_dir, root) = temp_root();
    fs::create_dir_all(root.join("e")).unwrap();

    let (engine, events) = start_engine(EngineConfig::default());
    let controller = engine.controller();
    controller.enqueue_root(&root).unwrap();
    until_drained(&events);
    assert_eq!(controller.empty_dirs(), vec![root.clone()]);

    write_file(&root.join("e/file"), b"now populated");
    assert!(controller.rescan_root(&root).unwrap());
    until_drained(&events);

    assert!(controller.empty_dirs().is_empty());
    engine.shutdown().unwrap();
}

#[test]
fn test_rescan_reports_directories_that_lost_files() {
    let (_dir, root) = temp_root();
    write_file(&root.join("keep/file"), b"stays");
    write_file(&root.join("drained/file"), b"goes away");

    let (engine, events) = start_engine(EngineConfig::default());
    let controller = engine.controller();
    controller.enqueue_root(&root).unwrap();
    until_drained(&events);
    assert!(controller.empty_dirs().is_empty());

    fs::remove_file(root.join("drained/file")).unwrap();
    assert!(controller.rescan_root(&root).unwrap());
    until_drained(&events);

    assert_eq!(controller.empty_dirs(), vec![root.join("drained")]);
    engine.shutdown().unwrap();
}
