//! Incremental index builds and cold-start behavior

use mnemos_e2e_tests::harness::TestVault;
use mnemos_e2e_tests::mocks::NoteFixture;

fn fifty_notes() -> Vec<NoteFixture> {
    (0..50)
        .map(|i| {
            NoteFixture::new(format!("note {i:02}"))
                .note_type("idea")
                .body(&format!("body of note number {i}"))
        })
        .collect()
}

#[test]
fn rebuild_without_changes_skips_everything() {
    let vault = TestVault::with_notes(&fifty_notes());
    let engine = vault.engine();

    let first = engine.index_build(false).unwrap();
    assert_eq!(first.indexed, 50);
    assert_eq!(first.skipped, 0);
    assert_eq!(first.total, 50);

    let second = engine.index_build(false).unwrap();
    assert_eq!(second.skipped, second.total);
    assert_eq!(second.indexed, 0);

    // Row count equals note count
    let index = mnemos_core::EmbeddingIndex::open(&vault.embeddings_db()).unwrap();
    assert_eq!(index.count().unwrap(), 50);
}

#[test]
fn mutating_one_note_reindexes_exactly_that_note() {
    let vault = TestVault::with_notes(&fifty_notes());
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    vault.write_raw("note 07", "a completely rewritten body");
    let report = engine.index_build(false).unwrap();
    assert_eq!(report.indexed, 1);
    assert_eq!(report.skipped, 49);
    assert_eq!(report.total, 50);
}

#[test]
fn force_rebuild_reembeds_everything() {
    let vault = TestVault::with_notes(&fifty_notes());
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let forced = engine.index_build(true).unwrap();
    assert_eq!(forced.indexed, 50);
    assert_eq!(forced.skipped, 0);
}

#[test]
fn deleted_notes_leave_the_store() {
    let vault = TestVault::with_notes(&fifty_notes());
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    vault.delete_note("note 00");
    vault.delete_note("note 01");
    let report = engine.index_build(false).unwrap();
    assert_eq!(report.total, 48);

    let index = mnemos_core::EmbeddingIndex::open(&vault.embeddings_db()).unwrap();
    assert_eq!(index.count().unwrap(), 48);
    assert!(index.get("note 00").unwrap().is_none());
}

#[test]
fn cold_start_serves_after_deleting_the_store() {
    let vault = TestVault::new();
    vault.write_raw("broker deploy runbook", "steps to deploy the broker safely");
    vault.write_raw("garden", "tomatoes and basil");

    {
        let engine = vault.engine();
        engine.index_build(false).unwrap();
    }
    std::fs::remove_file(vault.embeddings_db()).unwrap();
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = vault.embeddings_db().into_os_string();
        sidecar.push(suffix);
        let _ = std::fs::remove_file(sidecar);
    }

    let engine = vault.engine();
    let response = engine.query_ranked("deploy the broker", None).unwrap();
    assert!(!response.results.is_empty());
    assert!(
        response.warnings.iter().any(|w| w.contains("built")),
        "warnings: {:?}",
        response.warnings
    );
}

#[test]
fn interrupted_state_is_completed_by_the_next_build() {
    // A store holding only part of the corpus stands in for a build that
    // stopped halfway
    let vault = TestVault::with_notes(&fifty_notes());
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let index = mnemos_core::EmbeddingIndex::open(&vault.embeddings_db()).unwrap();
    let kept: std::collections::HashSet<String> =
        (10..50).map(|i| format!("note {i:02}")).collect();
    index.remove_absent(&kept).unwrap();
    assert_eq!(index.count().unwrap(), 40);
    drop(index);

    // The next build completes the remainder via hash-skip
    let report = engine.index_build(false).unwrap();
    assert_eq!(report.indexed, 10);
    assert_eq!(report.skipped, 40);
}
