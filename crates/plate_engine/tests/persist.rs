use std::fs;

use plate_engine::{ensure_state_dir, read_if_exists, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_state_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_state_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write(".plate_state.ron", "(a)").unwrap();
    assert_eq!(first.file_name().unwrap(), ".plate_state.ron");
    assert_eq!(fs::read_to_string(&first).unwrap(), "(a)");

    let second = writer.write(".plate_state.ron", "(b)").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "(b)");
}

#[test]
fn write_into_file_path_fails_without_partial_output() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("state.ron", "data").is_err());
    assert!(!file_path.with_file_name("state.ron").exists());
}

#[test]
fn missing_file_reads_as_none() {
    let temp = TempDir::new().unwrap();
    assert_eq!(read_if_exists(&temp.path().join("absent.ron")).unwrap(), None);

    let present = temp.path().join("present.ron");
    fs::write(&present, "{}").unwrap();
    assert_eq!(read_if_exists(&present).unwrap().as_deref(), Some("{}"));
}
