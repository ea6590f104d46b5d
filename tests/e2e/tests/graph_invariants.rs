//! Link graph invariants over real vaults on disk

use mnemos_core::vault::CorpusReader;
use mnemos_core::LinkGraph;
use mnemos_e2e_tests::harness::TestVault;
use mnemos_e2e_tests::mocks::NoteFixture;

#[test]
fn backlinks_orphans_and_dangling_track_the_corpus() {
    let vault = TestVault::new();
    vault.write_raw("a", "see [[b]]");
    vault.write_raw("b", "");

    let engine = vault.engine();
    assert_eq!(engine.query_backlinks("b"), vec!["a"]);
    assert_eq!(engine.query_orphans(), vec!["a"]);
    assert!(engine.query_dangling().is_empty());

    // Deleting b leaves a's link dangling
    vault.delete_note("b");
    assert_eq!(engine.query_dangling(), vec!["b"]);
}

#[test]
fn incoming_is_the_mirror_of_outgoing() {
    let vault = TestVault::new();
    vault.write_raw("hub", "points at [[spoke one]] and [[spoke two]]");
    vault.write_raw("spoke one", "back to [[hub]]");
    vault.write_raw("spoke two", "[[spoke one]] [[hub]] [[hub]]");
    vault.write_raw("loner", "links [[nowhere at all]]");

    let notes = CorpusReader::new(vault.root().join("notes")).read_all();
    let graph = LinkGraph::build(&notes);

    for u in 0..graph.len() {
        for &v in graph.out_neighbors(u) {
            assert!(
                graph.in_neighbors(v).contains(&u),
                "missing reverse edge {} -> {}",
                graph.title(u),
                graph.title(v)
            );
        }
        for &v in graph.in_neighbors(u) {
            assert!(graph.out_neighbors(v).contains(&u));
        }
    }

    // Orphans are exactly the titles absent from every incoming set
    let orphans = graph.orphans();
    for title in graph.titles() {
        let idx = graph.index_of(title).unwrap();
        assert_eq!(orphans.contains(title), graph.in_degree(idx) == 0);
    }

    // Dangling targets are exactly the link targets without a note
    assert_eq!(graph.dangling(), vec!["nowhere at all"]);
}

#[test]
fn cross_project_lists_multi_tag_notes() {
    let vault = TestVault::with_notes(&[
        NoteFixture::new("connector")
            .project("alpha")
            .project("beta"),
        NoteFixture::new("single").project("alpha"),
        NoteFixture::new("untagged"),
    ]);

    assert_eq!(vault.engine().query_cross_project(), vec!["connector"]);
}

#[test]
fn metrics_report_covers_the_vault() {
    let vault = TestVault::new();
    vault.write_raw("index", "the entry point: [[a]] [[b]]");
    vault.write_raw("a", "[[b]]");
    vault.write_raw("b", "");
    vault.write_raw("stray", "[[missing]]");

    let report = vault.engine().graph_metrics();
    assert_eq!(report.note_count, 4);
    assert_eq!(report.edge_count, 3);
    assert_eq!(report.dangling_count, 1);
    // "index" is role-based bridge material
    assert!(report.bridges.iter().any(|t| t == "index"));
    assert!(!report.top_authorities.is_empty());
}

#[test]
fn communities_partition_the_corpus() {
    let vault = TestVault::new();
    for (a, b) in [("r1", "r2"), ("r2", "r3"), ("r3", "r1")] {
        vault.write_raw(a, &format!("[[{b}]]"));
    }
    vault.write_raw("isolated", "");

    let communities = vault.engine().graph_communities();
    let member_count: usize = communities.iter().map(|c| c.members.len()).sum();
    assert_eq!(member_count, 4);

    // Every note appears exactly once
    let mut all: Vec<&String> = communities.iter().flat_map(|c| &c.members).collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 4);
}
