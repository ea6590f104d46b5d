//! Ranked retrieval: intent, fusion, exploration, and the access log

use mnemos_core::QueryIntent;
use mnemos_e2e_tests::harness::TestVault;
use mnemos_e2e_tests::mocks::NoteFixture;

/// A vault with one well-connected runbook and assorted distractors
fn runbook_vault() -> TestVault {
    let vault = TestVault::with_notes(&[
        NoteFixture::new("broker deploy runbook")
            .note_type("learning")
            .description("how to deploy the message broker")
            .body("check the config, roll one node at a time, verify health"),
        NoteFixture::new("garden planning")
            .note_type("idea")
            .body("tomatoes, basil, and a raised bed"),
        NoteFixture::new("reading list")
            .note_type("idea")
            .body("papers to read on ranking"),
    ]);
    // Five notes link to the runbook
    for i in 0..5 {
        vault.write(
            &NoteFixture::new(format!("ops log {i}"))
                .body("routine maintenance")
                .link_to("broker deploy runbook"),
        );
    }
    vault
}

#[test]
fn procedural_query_finds_the_runbook() {
    let vault = runbook_vault();
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let response = engine
        .query_ranked("how do I deploy the broker", None)
        .unwrap();
    assert_eq!(response.intent, QueryIntent::Procedural);

    let top3: Vec<&str> = response
        .results
        .iter()
        .take(3)
        .map(|r| r.title.as_str())
        .collect();
    assert!(
        top3.contains(&"broker deploy runbook"),
        "expected the runbook in the top 3, got {top3:?}"
    );
}

#[test]
fn decision_query_weights_and_scores_type_space() {
    let vault = TestVault::with_notes(&[
        NoteFixture::new("chose option x")
            .note_type("decision")
            .description("we picked option X for the cache layer")
            .body("option X won on operational simplicity"),
        NoteFixture::new("cache notes")
            .note_type("idea")
            .body("various cache thoughts"),
    ]);
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let response = engine
        .query_ranked("why did we choose option X", None)
        .unwrap();
    assert_eq!(response.intent, QueryIntent::Decision);
    assert!(QueryIntent::Decision.space_weights().note_type >= 0.30);

    let decision = response
        .results
        .iter()
        .find(|r| r.title == "chose option x")
        .expect("decision note served");
    let spaces = decision.spaces.expect("composite scored the note");
    assert!(spaces.note_type >= 0.9, "type space was {}", spaces.note_type);
}

#[test]
fn exploration_budget_flags_the_exact_tail() {
    let fixtures: Vec<NoteFixture> = (0..40)
        .map(|i| NoteFixture::new(format!("note {i:02}")).body("shared corpus text"))
        .collect();
    let vault = TestVault::with_notes(&fixtures);
    vault.write_config("retrieval:\n  exploration_budget: 0.20\n");

    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let response = engine.query_ranked("shared corpus", Some(10)).unwrap();
    assert_eq!(response.results.len(), 10);

    let exploration: Vec<&str> = response
        .results
        .iter()
        .filter(|r| r.exploration)
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(exploration.len(), 2, "exactly floor(10 * 0.2) slots");

    let ranked: Vec<&str> = response
        .results
        .iter()
        .filter(|r| !r.exploration)
        .map(|r| r.title.as_str())
        .collect();
    for title in &exploration {
        assert!(!ranked.contains(title), "exploration titles must be unseen");
    }
    // Exploration entries carry score zero
    assert!(response
        .results
        .iter()
        .filter(|r| r.exploration)
        .all(|r| r.score == 0.0));
}

#[test]
fn every_query_appends_one_access_event() {
    let vault = runbook_vault();
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    engine.query_ranked("deploy the broker", None).unwrap();
    engine.query_ranked("garden", None).unwrap();

    let log = mnemos_core::AccessLog::new(vault.access_log());
    let events = log.read_all().unwrap();
    assert_eq!(events.len(), 2);

    for event in &events {
        for (rank, entry) in event.results.iter().enumerate() {
            assert_eq!(entry.rank, rank);
            assert_eq!(entry.propensity, 0.0);
        }
    }
}

#[test]
fn propensities_floor_at_epsilon() {
    let vault = runbook_vault();
    let engine = vault.engine();
    engine.index_build(false).unwrap();
    engine.query_ranked("deploy the broker", None).unwrap();

    let propensities = engine.propensities().unwrap();
    assert_eq!(propensities.total_events(), 1);
    assert!(propensities.get("a title that was never served") >= 0.01);
}

#[test]
fn empty_query_and_empty_corpus_succeed() {
    let vault = TestVault::new();
    let engine = vault.engine();

    assert!(engine.query_ranked("", None).unwrap().results.is_empty());
    assert!(engine
        .query_ranked("anything at all", None)
        .unwrap()
        .results
        .is_empty());
}

#[test]
fn signals_carry_raw_scores_for_debugging() {
    let vault = runbook_vault();
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let response = engine.query_ranked("deploy the broker", None).unwrap();
    let top = &response.results[0];
    assert!(!top.signals.is_empty());
    for contribution in top.signals.values() {
        assert!(contribution.raw_score >= 0.0);
    }
}

#[test]
fn query_similar_uses_the_composite_signal_only() {
    let vault = runbook_vault();
    let engine = vault.engine();
    engine.index_build(false).unwrap();

    let hits = engine.query_similar("deploy the broker", Some(3)).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.len() <= 3);
    assert_eq!(hits[0].title, "broker deploy runbook");
    assert!(hits[0].spaces.text > 0.0);
}
