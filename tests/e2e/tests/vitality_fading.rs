//! Vitality bounds and the fading query

use mnemos_e2e_tests::harness::TestVault;
use mnemos_e2e_tests::mocks::NoteFixture;

#[test]
fn cold_old_note_fades_while_accessed_connected_note_survives() {
    let vault = TestVault::with_notes(&[
        NoteFixture::new("forgotten idea")
            .note_type("idea")
            .age_days(90)
            .access_count(0)
            .body("never revisited"),
        NoteFixture::new("living reference")
            .note_type("learning")
            .age_days(90)
            .access_count(20)
            .body("revisited constantly"),
    ]);
    // Three old notes link to the living reference
    for i in 0..3 {
        vault.write(
            &NoteFixture::new(format!("pointer {i}"))
                .age_days(90)
                .link_to("living reference"),
        );
    }

    let fading = vault.engine().query_fading(0.5, None);
    let titles: Vec<&str> = fading.iter().map(|(t, _)| t.as_str()).collect();
    assert!(titles.contains(&"forgotten idea"), "fading: {titles:?}");
    assert!(!titles.contains(&"living reference"));
}

#[test]
fn fading_is_sorted_ascending_and_bounded() {
    let fixtures: Vec<NoteFixture> = (0..10)
        .map(|i| {
            NoteFixture::new(format!("note {i}"))
                .age_days(30 * (i as i64 + 1))
                .access_count(i as u32)
        })
        .collect();
    let vault = TestVault::with_notes(&fixtures);

    // A threshold above the top of the range lists every note
    let all = vault.engine().query_fading(2.0, Some(100));
    assert_eq!(all.len(), 10);
    for window in all.windows(2) {
        assert!(window[0].1 <= window[1].1);
    }
    for (_, score) in &all {
        assert!((0.0..=1.0).contains(score));
    }
}

#[test]
fn bridge_notes_hold_the_vitality_floor() {
    let vault = TestVault::with_notes(&[
        // Role-based bridge, otherwise identical to the plain note
        NoteFixture::new("index").age_days(365).access_count(0),
        NoteFixture::new("plain old note").age_days(365).access_count(0),
    ]);

    let fading = vault.engine().query_fading(0.5, None);
    let titles: Vec<&str> = fading.iter().map(|(t, _)| t.as_str()).collect();
    assert!(!titles.contains(&"index"), "bridge floor must hold: {titles:?}");
    assert!(titles.contains(&"plain old note"));
}

#[test]
fn identity_notes_outlast_operational_notes() {
    let vault = TestVault::with_notes(&[
        NoteFixture::new("who I am")
            .project("self")
            .age_days(365)
            .access_count(3),
        NoteFixture::new("daily checklist")
            .project("ops")
            .age_days(365)
            .access_count(3),
    ]);

    let all = vault.engine().query_fading(2.0, None);
    let score_of = |title: &str| {
        all.iter()
            .find(|(t, _)| t == title)
            .map(|(_, s)| *s)
            .expect("note present")
    };
    assert!(score_of("who I am") > score_of("daily checklist"));
}
