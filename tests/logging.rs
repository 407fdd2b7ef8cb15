use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

// Only the first subscriber installed in this process wins, so the file
// case runs first and the second call must not replace it.
#[test]
#[serial]
fn writes_log_file_and_ignores_reinit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.txt");

    ink_ask::logging::init(true, Some(path.clone()));
    tracing::info!("first message");

    let other = dir.path().join("other.txt");
    ink_ask::logging::init(false, Some(other.clone()));
    tracing::info!("second message");

    sleep(Duration::from_millis(200));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("first message"));
    assert!(contents.contains("second message"));
    assert!(!other.exists(), "second init should not create a log file");
}
