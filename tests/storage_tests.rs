// SPDX-License-Identifier: MPL-2.0

//! Integration tests for photo storage

use snapcam::storage::save_photo;

#[test]
fn test_save_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("Pictures").join("snapcam");

    let path = save_photo(b"jpeg bytes", "jpg", &target).unwrap();
    assert!(path.starts_with(&target));
    assert_eq!(std::fs::read(&path).unwrap(), b"jpeg bytes");
}

#[test]
fn test_repeated_saves_do_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();

    let first = save_photo(b"first", "jpg", dir.path()).unwrap();
    let second = save_photo(b"second", "jpg", dir.path()).unwrap();
    let third = save_photo(b"third", "jpg", dir.path()).unwrap();

    assert_ne!(first, second);
    assert_ne!(second, third);
    assert_eq!(std::fs::read(&first).unwrap(), b"first");
    assert_eq!(std::fs::read(&second).unwrap(), b"second");
    assert_eq!(std::fs::read(&third).unwrap(), b"third");
}
