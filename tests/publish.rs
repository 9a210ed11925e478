// tests/publish.rs

//! Integration tests for the publishing side: manifests, archives and the
//! registry store's immutability guard.

mod common;

use base64::Engine;
use common::{component_files, publish};
use sha2::{Digest, Sha256};
use std::fs;
use wpsyde::archive::{extract_component, read_entries};
use wpsyde::registry::{diff_immutable, PublishOutcome, RegistryStore};
use wpsyde::{build_archive, ComponentSource, Error, ManifestBuilder};

fn sha256_tag(data: &[u8]) -> String {
    format!(
        "sha256-{}",
        base64::engine::general_purpose::STANDARD.encode(Sha256::digest(data))
    )
}

#[test]
fn test_file_integrity_matches_recomputed_digest() {
    let files = component_files("Button");
    let source = ComponentSource::from_files("Button", files.clone()).unwrap();
    let manifest = ManifestBuilder::new(&source, "1.0.0").build().unwrap();

    assert_eq!(manifest.files.len(), files.len());
    for (file_name, content) in &files {
        let entry = manifest
            .files
            .iter()
            .find(|f| f.source_path.ends_with(&format!("/{}", file_name)))
            .unwrap();
        assert_eq!(entry.integrity, sha256_tag(content));
    }
}

#[test]
fn test_archive_round_trip_is_byte_identical() {
    let source = ComponentSource::from_files(
        "Alert",
        vec![
            ("component.php", b"<?php echo 'alert'; ?>".to_vec()),
            ("styles.css", b".alert { color: red; }".to_vec()),
            ("enhancer.js", b"console.log('alert');".to_vec()),
            ("example.php", b"<?php get_template_part('x'); ?>".to_vec()),
            ("README.md", b"# Alert\n".to_vec()),
        ],
    )
    .unwrap();
    let manifest = ManifestBuilder::new(&source, "1.0.0").build().unwrap();
    let archive = build_archive(&manifest, &source).unwrap();

    let temp = tempfile::tempdir().unwrap();
    let entries = read_entries(&archive.bytes).unwrap();
    extract_component("Alert", &entries, temp.path()).unwrap();

    let expected = [
        ("alert.php", "<?php echo 'alert'; ?>"),
        ("Alert.css", ".alert { color: red; }"),
        ("alert.js", "console.log('alert');"),
        ("example.php", "<?php get_template_part('x'); ?>"),
        ("README.md", "# Alert\n"),
    ];
    for (name, content) in expected {
        assert_eq!(fs::read(temp.path().join(name)).unwrap(), content.as_bytes(), "{}", name);
    }
}

#[test]
fn test_archives_are_deterministic() {
    let source = ComponentSource::from_files("Button", component_files("Button")).unwrap();
    let first = ManifestBuilder::new(&source, "1.0.0").build().unwrap();
    let second = ManifestBuilder::new(&source, "1.0.0").build().unwrap();

    let a = build_archive(&first, &source).unwrap();
    let b = build_archive(&second, &source).unwrap();
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(a.integrity, b.integrity);
}

#[test]
fn test_republishing_identical_content_is_accepted() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("registry");
    let first = publish(&root, "Button", "1.0.0", component_files("Button"));

    let source = ComponentSource::from_files("Button", component_files("Button")).unwrap();
    let manifest = ManifestBuilder::new(&source, "1.0.0").build().unwrap();
    let archive = build_archive(&manifest, &source).unwrap();
    let outcome = RegistryStore::new(&root).publish(&manifest, &archive).unwrap();
    assert_eq!(outcome, PublishOutcome::Republished);

    let second = RegistryStore::new(&root).read_manifest("Button", "1.0.0").unwrap();
    assert_eq!(first.immutable_fields(), second.immutable_fields());
}

#[test]
fn test_changed_content_under_same_version_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("registry");
    publish(&root, "Button", "1.0.0", component_files("Button"));
    let archive_path = root.join("components/Button/1.0.0/component.zip");
    let before = fs::read(&archive_path).unwrap();

    let mut files = component_files("Button");
    files[0].1 = b"<?php echo 'changed'; ?>".to_vec();
    let source = ComponentSource::from_files("Button", files).unwrap();
    let manifest = ManifestBuilder::new(&source, "1.0.0").build().unwrap();
    let archive = build_archive(&manifest, &source).unwrap();

    let err = RegistryStore::new(&root).publish(&manifest, &archive).unwrap_err();
    match err {
        Error::ImmutableContentChanged { name, version, field } => {
            assert_eq!(name, "Button");
            assert_eq!(version, "1.0.0");
            assert_eq!(field, "files");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(fs::read(&archive_path).unwrap(), before);

    let bumped = ManifestBuilder::new(&source, "1.0.1").build().unwrap();
    let archive = build_archive(&bumped, &source).unwrap();
    RegistryStore::new(&root).publish(&bumped, &archive).unwrap();

    let index = RegistryStore::new(&root).load_index().unwrap();
    let entry = index.get("Button").unwrap();
    assert_eq!(entry.latest, "1.0.1");
    assert_eq!(entry.versions, vec!["1.0.0", "1.0.1"]);
}

#[test]
fn test_published_registry_verifies() {
    let (_temp, root) = common::setup_registry();
    let store = RegistryStore::new(&root);
    store.write_health(chrono::Utc::now()).unwrap();
    store.write_headers().unwrap();

    let report = store.verify().unwrap();
    assert!(report.is_ok(), "{:?}", report.findings);
    assert_eq!(report.checked, 2);
}

#[test]
fn test_verify_detects_tampered_archive() {
    let (_temp, root) = common::setup_registry();
    let store = RegistryStore::new(&root);
    store.write_health(chrono::Utc::now()).unwrap();
    fs::write(root.join("components/Card/1.0.0/component.zip"), b"not a zip").unwrap();

    let report = store.verify().unwrap();
    assert!(!report.is_ok());
    assert!(report.errors().any(|f| f.subject.contains("Card")));
}

#[test]
fn test_diff_immutable_reports_edited_manifest() {
    let (temp, base) = common::setup_registry();
    let current = temp.path().join("current");
    publish(&current, "Button", "1.0.0", component_files("Button"));
    let mut files = component_files("Card");
    files[1].1 = b".wps-card { display: grid; }".to_vec();
    publish(&current, "Card", "1.0.0", files);
    publish(&current, "Badge", "1.0.0", component_files("Badge"));

    let changes = diff_immutable(&base, &current).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].name, "Card");
    assert_eq!(changes[0].version, "1.0.0");
    assert_eq!(changes[0].field, "files");
}
