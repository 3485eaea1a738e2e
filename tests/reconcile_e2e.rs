use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use edureconcile::{
    compute_similarity, detect_duplicates, edit_distance, ChannelSink, EntityId, EntityKind,
    EntityRecord, EntityStore, EventPayload, InMemoryEntityStore, MatchStrategy,
    ReconcileConfig, ReconciliationEngine, School, Teacher,
};

fn ids<R: edureconcile::ContactFields>(group: &edureconcile::DuplicateGroup<R>) -> Vec<String> {
    group.ids().iter().map(|id| id.to_string()).collect()
}

#[test]
fn three_record_scenario_groups_first_two() {
    let teachers = vec![
        Teacher::new(1u64, "Sarah Nakamya").with_email("s@x.com"),
        Teacher::new(2u64, "Sarah Nakamya").with_email("s@x.com"),
        Teacher::new(3u64, "John Okello").with_email("j@y.com"),
    ];

    let groups = detect_duplicates(&teachers, MatchStrategy::ContactOrName);
    assert_eq!(groups.len(), 1);
    assert_eq!(ids(&groups[0]), vec!["1", "2"]);
}

#[test]
fn seed_edit_distances() {
    assert_eq!(edit_distance("kitten", "sitting"), 3);
    assert_eq!(edit_distance("", "abc"), 3);
    assert_eq!(edit_distance("abc", "abc"), 0);
}

#[test]
fn similarity_bounds_and_symmetry() {
    let pairs = [("", ""), ("a", ""), ("Mengo", "Mengo SS"), ("Budo", "Kisubi")];
    for (a, b) in pairs {
        let ab = edureconcile::similarity(a, b);
        assert!((0.0..=1.0).contains(&ab));
        assert!((ab - edureconcile::similarity(b, a)).abs() < f64::EPSILON);
    }
    assert!((edureconcile::similarity("", "") - 1.0).abs() < f64::EPSILON);
    assert!((compute_similarity("Ntare School", "ntare  school") - 1.0).abs() < f64::EPSILON);
}

#[test]
fn identical_ids_never_form_a_group() {
    let teachers = vec![
        Teacher::new("dup", "Same Person").with_email("p@x.com"),
        Teacher::new("dup", "Same Person").with_email("p@x.com"),
    ];
    assert!(detect_duplicates(&teachers, MatchStrategy::ContactOrName).is_empty());
}

#[test]
fn detection_is_idempotent() {
    let schools = vec![
        School::new("a", "Mengo Senior School"),
        School::new("b", "Mengo Senior Schol"),
        School::new("c", "Ndejje University"),
        School::new("d", "Mengo Senior  School"),
    ];
    let strategy = MatchStrategy::name_similarity(0.8).unwrap();
    let first = detect_duplicates(&schools, strategy);
    let second = detect_duplicates(&schools, strategy);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(ids(&first[0]), vec!["a", "b", "d"]);
}

#[test]
fn email_beats_name_dissimilarity() {
    let teachers = vec![
        Teacher::new("1", "Alice A").with_email("X@Y.com"),
        Teacher::new("2", "Zzz").with_email("x@y.com"),
    ];
    assert_eq!(detect_duplicates(&teachers, MatchStrategy::ContactOrName).len(), 1);
}

#[test]
fn phones_match_ignoring_whitespace() {
    let teachers = vec![
        Teacher::new("1", "Grace").with_phone("+256 701 234 567"),
        Teacher::new("2", "Moses").with_phone("+256701234567"),
    ];
    assert_eq!(detect_duplicates(&teachers, MatchStrategy::ContactOrName).len(), 1);
}

#[test]
fn name_containment_is_literal_not_token_based() {
    let teachers = vec![
        Teacher::new("1", "John Ssali"),
        Teacher::new("2", "John K. Ssali"),
    ];
    assert!(detect_duplicates(&teachers, MatchStrategy::ContactOrName).is_empty());
}

#[test]
fn school_threshold_is_exclusive() {
    // One substitution in five characters: similarity exactly 0.8.
    assert!((compute_similarity("abcde", "abcdx") - 0.8).abs() < 1e-12);
    let at_threshold = vec![School::new("1", "abcde"), School::new("2", "abcdx")];
    let strategy = MatchStrategy::name_similarity(0.8).unwrap();
    assert!(detect_duplicates(&at_threshold, strategy).is_empty());

    let above = vec![School::new("1", "abcdefghij"), School::new("2", "abcdefghix")];
    assert_eq!(detect_duplicates(&above, strategy).len(), 1);
}

#[test]
fn staler_candidate_loses_even_when_more_complete() {
    let newer = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let older = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
    let current = School::new("cur", "Kololo SS").with_last_activity(newer);
    let candidate = School::new("cand", "Kololo S.S")
        .with_last_activity(older)
        .with_total_teachers(40);
    assert!(!edureconcile::should_replace(&current, &candidate));
}

#[test]
fn engine_review_and_resolve_flow() {
    let store = Arc::new(
        InMemoryEntityStore::with_records(vec![
            EntityRecord::from(Teacher::new("1", "Sarah Nakamya").with_email("s@x.com")),
            EntityRecord::from(Teacher::new("2", "Sarah Nakamya").with_email("S@X.COM")),
            EntityRecord::from(Teacher::new("3", "John Okello").with_email("j@y.com")),
            EntityRecord::from(School::new("s1", "Kings College Budo")),
        ])
        .unwrap(),
    );
    let (sink, events) = ChannelSink::new(16);
    let engine = ReconciliationEngine::new(store.clone(), Arc::new(sink), ReconcileConfig::default())
        .unwrap();

    let state = engine.review(EntityKind::Teacher).unwrap();
    assert_eq!(state.group_count(), 1);

    let kept = EntityId::from("1");
    let resolution = engine.resolve_group(&state.groups()[0], &kept).unwrap();
    assert_eq!(resolution.removed, vec![EntityId::from("2")]);
    let state = state.apply_resolution(&kept);
    assert_eq!(state.group_count(), 0);

    let remaining: Vec<String> = store
        .list(EntityKind::Teacher)
        .unwrap()
        .iter()
        .map(|r| edureconcile::ContactFields::id(r).to_string())
        .collect();
    assert_eq!(remaining, vec!["1", "3"]);
    assert_eq!(store.list(EntityKind::School).unwrap().len(), 1);

    let detected = events.recv_timeout(Duration::from_millis(100)).unwrap();
    assert!(matches!(detected.payload, EventPayload::DuplicatesDetected { group_count: 1, .. }));
    let removed = events.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(
        removed.payload,
        EventPayload::RecordRemoved {
            kind: EntityKind::Teacher,
            id: EntityId::from("2"),
        }
    );
}

#[test]
fn records_load_from_loose_json() {
    let raw = r#"[
        {"id": "t1", "full_name": "Peter Mugisha", "email": "pm@x.com", "phone": 701234567},
        {"id": "t2", "full_name": "peter mugisha", "is_active": true}
    ]"#;
    let teachers: Vec<Teacher> = serde_json::from_str(raw).unwrap();
    assert!(teachers[0].phone.is_none());
    let groups = detect_duplicates(&teachers, MatchStrategy::ContactOrName);
    assert_eq!(groups.len(), 1);
}

#[test]
fn blank_contacts_do_not_group_distinct_teachers() {
    let teachers = vec![
        Teacher::new("1", "Agnes Apio").with_phone("   ").with_email(" "),
        Teacher::new("2", "Brian Ouma").with_phone("\t").with_email("  "),
    ];
    assert!(detect_duplicates(&teachers, MatchStrategy::ContactOrName).is_empty());
}
