use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "vignette_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn memory_storage_counts_reads_and_reports_missing() {
    let store = MemoryStorage::new().with("a", vec![1u8, 2, 3]);
    assert_eq!(store.read_bytes(&AssetId::from("a")).unwrap(), vec![1, 2, 3]);
    assert_eq!(store.read_count(), 1);

    let err = store.read_bytes(&AssetId::from("b")).unwrap_err();
    assert!(matches!(err, VignetteError::NotFound(_)));
    assert_eq!(store.read_count(), 1);
}

#[test]
fn arc_storage_forwards_to_inner() {
    let store = Arc::new(MemoryStorage::new().with("a", vec![9u8]));
    let dynamic: Box<dyn StorageBackend> = Box::new(Arc::clone(&store));
    dynamic.read_bytes(&AssetId::from("a")).unwrap();
    assert_eq!(store.read_count(), 1);
}

#[test]
fn fs_storage_reads_relative_files() {
    let tmp = temp_dir("fs_storage_read");
    std::fs::create_dir_all(tmp.join("rows")).unwrap();
    std::fs::write(tmp.join("rows/a.bin"), [7u8, 8]).unwrap();

    let store = FsStorage::new(&tmp);
    assert_eq!(
        store.read_bytes(&AssetId::from("rows\\a.bin")).unwrap(),
        vec![7, 8]
    );

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn fs_storage_missing_or_escaping_ids_are_not_found() {
    let tmp = temp_dir("fs_storage_missing");
    std::fs::create_dir_all(&tmp).unwrap();

    let store = FsStorage::new(&tmp);
    for id in ["nope.png", "../outside.png", "/etc/passwd"] {
        let err = store.read_bytes(&AssetId::from(id)).unwrap_err();
        assert!(matches!(err, VignetteError::NotFound(_)), "{id}: {err}");
    }

    std::fs::remove_dir_all(&tmp).ok();
}
