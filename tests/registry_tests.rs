use std::collections::HashSet;

use key_registry::{KeyFile, KeyRecord, KeyRegistry, RegistryError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn test_registry() -> (TempDir, KeyRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = KeyRegistry::new(KeyFile::new(dir.path().join("server_keys.json")));
    (dir, registry)
}

fn seeded_registry() -> (TempDir, KeyRegistry) {
    let (dir, registry) = test_registry();
    for (key, date) in [("AAA", "2025-01-01"), ("BBB", "2025-02-01"), ("CCC", "2025-03-01")] {
        registry.create(KeyRecord::new(key, date)).unwrap();
    }
    (dir, registry)
}

fn file_bytes(registry: &KeyRegistry) -> Vec<u8> {
    std::fs::read(registry.file().path()).unwrap()
}

fn key_strings(registry: &KeyRegistry) -> Vec<String> {
    registry
        .list()
        .unwrap()
        .into_iter()
        .map(|k| k.key_string)
        .collect()
}

#[test]
fn list_on_fresh_registry_is_empty() {
    let (_dir, registry) = test_registry();
    assert!(registry.list().unwrap().is_empty());
}

#[test]
fn create_appends_in_insertion_order() {
    let (_dir, registry) = seeded_registry();
    assert_eq!(key_strings(&registry), vec!["AAA", "BBB", "CCC"]);
}

#[test]
fn create_returns_the_stored_record() {
    let (_dir, registry) = test_registry();
    let created = registry
        .create(KeyRecord::new("ABC123", "2025-12-31"))
        .unwrap();
    assert_eq!(created, KeyRecord::new("ABC123", "2025-12-31"));
}

#[test]
fn create_duplicate_is_conflict_and_leaves_file_unchanged() {
    let (_dir, registry) = seeded_registry();
    let before = file_bytes(&registry);

    let err = registry
        .create(KeyRecord::new("BBB", "2099-01-01"))
        .unwrap_err();

    assert!(matches!(err, RegistryError::Conflict(ref k) if k == "BBB"));
    assert_eq!(file_bytes(&registry), before);
}

#[test]
fn update_replaces_date_in_place() {
    let (_dir, registry) = seeded_registry();

    let updated = registry
        .update_expiration("BBB", "2030-12-31".to_string())
        .unwrap();

    assert_eq!(updated, KeyRecord::new("BBB", "2030-12-31"));
    assert_eq!(
        registry.list().unwrap(),
        vec![
            KeyRecord::new("AAA", "2025-01-01"),
            KeyRecord::new("BBB", "2030-12-31"),
            KeyRecord::new("CCC", "2025-03-01"),
        ]
    );
}

#[test]
fn update_missing_is_not_found_and_leaves_file_unchanged() {
    let (_dir, registry) = seeded_registry();
    let before = file_bytes(&registry);

    let err = registry
        .update_expiration("NOPE", "2030-12-31".to_string())
        .unwrap_err();

    assert!(matches!(err, RegistryError::NotFound(ref k) if k == "NOPE"));
    assert_eq!(file_bytes(&registry), before);
}

#[test]
fn delete_preserves_order_of_remaining_records() {
    let (_dir, registry) = seeded_registry();

    registry.delete("BBB").unwrap();

    assert_eq!(key_strings(&registry), vec!["AAA", "CCC"]);
}

#[test]
fn delete_missing_is_not_found_and_leaves_file_unchanged() {
    let (_dir, registry) = seeded_registry();
    let before = file_bytes(&registry);

    let err = registry.delete("NOPE").unwrap_err();

    assert!(matches!(err, RegistryError::NotFound(_)));
    assert_eq!(file_bytes(&registry), before);
}

#[test]
fn deleted_key_can_be_created_again() {
    let (_dir, registry) = seeded_registry();

    registry.delete("AAA").unwrap();
    registry.create(KeyRecord::new("AAA", "2040-01-01")).unwrap();

    assert_eq!(key_strings(&registry), vec!["BBB", "CCC", "AAA"]);
}

#[test]
fn operations_reread_the_file_every_time() {
    let (_dir, registry) = seeded_registry();

    // Edit the file behind the registry's back.
    KeyFile::new(registry.file().path())
        .save(&[KeyRecord::new("ZZZ", "2050-01-01")])
        .unwrap();

    assert_eq!(key_strings(&registry), vec!["ZZZ"]);
}

#[test]
fn concurrent_creates_are_not_lost() {
    let (_dir, registry) = test_registry();

    std::thread::scope(|s| {
        for i in 0..16 {
            let registry = &registry;
            s.spawn(move || {
                registry
                    .create(KeyRecord::new(format!("KEY-{i:02}"), "2030-01-01"))
                    .unwrap();
            });
        }
    });

    let keys: HashSet<String> = key_strings(&registry).into_iter().collect();
    assert_eq!(keys.len(), 16);
}

#[test]
fn concurrent_duplicate_creates_admit_exactly_one() {
    let (_dir, registry) = test_registry();

    let successes = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = &registry;
                s.spawn(move || registry.create(KeyRecord::new("SAME", "2030-01-01")).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(successes, 1);
    assert_eq!(key_strings(&registry), vec!["SAME"]);
}
