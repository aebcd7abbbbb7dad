//! Tests for the session log file

use tiffedit::{log_err, log_info, log_warn, logger};

#[test]
fn test_log_lines_are_level_tagged() {
    let path = std::env::temp_dir().join(format!("tiffedit-log-test-{}.log", std::process::id()));
    logger::init_at(path.clone(), None);
    assert_eq!(logger::log_path(), Some(&path));

    log_info!("loaded {}x{}", 3, 4);
    log_warn!("ignoring {}", "key");
    log_err!("save failed");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("session started"));
    assert!(content.contains("[INFO] loaded 3x4"));
    assert!(content.contains("[WARN] ignoring key"));
    assert!(content.contains("[ERROR] save failed"));

    let _ = std::fs::remove_file(&path);
}
