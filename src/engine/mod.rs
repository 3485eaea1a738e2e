//! Reconciliation engine.
//!
//! A synchronous facade over pluggable storage and notification
//! collaborators. Detection is a pure pass over a snapshot; the engine keeps
//! no mutable state of its own, so concurrent passes need no locking.
//!
//! Read-side operations (detection, previews, public listing) live here;
//! mutating operations are in `write_path`.

mod write_path;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ReconcileConfig;
use crate::entity::{EntityKind, EntityRecord, School, Teacher};
use crate::error::ReconcileResult;
use crate::grouping::{detect_duplicates, DuplicateGroup, ReviewState};
use crate::matching::{MatchReason, MatchStrategy};
use crate::notify::{
    ChannelSink, EventPayload, EventStream, NotificationSink, NullSink, ReconcileEvent,
};
use crate::report::Report;
use crate::resolution::dedupe_for_display;
use crate::similarity::normalized_similarity;
use crate::storage::EntityStore;

pub use write_path::{MergeOutcome, Resolution};

/// Entity reconciliation engine.
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use edureconcile::{EntityKind, InMemoryEntityStore, ReconciliationEngine, Teacher};
///
/// let store = InMemoryEntityStore::with_records(vec![
///     Teacher::new(1u64, "Sarah Nakamya").with_email("s@x.com").into(),
///     Teacher::new(2u64, "Sarah Nakamya").with_email("s@x.com").into(),
/// ])?;
/// let engine = ReconciliationEngine::with_defaults(Arc::new(store));
/// let groups = engine.scan(EntityKind::Teacher)?;
/// assert_eq!(groups.len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ReconciliationEngine {
    store: Arc<dyn EntityStore>,
    sink: Arc<dyn NotificationSink>,
    config: ReconcileConfig,
}

impl fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    /// Create an engine with explicit collaborators. The config is validated.
    pub fn new(
        store: Arc<dyn EntityStore>,
        sink: Arc<dyn NotificationSink>,
        config: ReconcileConfig,
    ) -> ReconcileResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            sink,
            config,
        })
    }

    /// Create an engine with the default config and no notifications.
    #[must_use]
    pub fn with_defaults(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            sink: Arc::new(NullSink),
            config: ReconcileConfig::default(),
        }
    }

    /// Create an engine that publishes to a bounded queue sized by
    /// `notification_queue_capacity`, returning the consumer side.
    pub fn with_channel(
        store: Arc<dyn EntityStore>,
        config: ReconcileConfig,
    ) -> ReconcileResult<(Self, EventStream)> {
        let (sink, stream) = ChannelSink::new(config.notification_queue_capacity);
        Ok((Self::new(store, Arc::new(sink), config)?, stream))
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// The match predicate used for a kind.
    #[must_use]
    pub const fn strategy(&self, kind: EntityKind) -> MatchStrategy {
        MatchStrategy::for_kind(kind, &self.config)
    }

    /// Groups `records` of `kind` (records of other kinds are ignored).
    ///
    /// Pure: no storage access, no notification.
    #[must_use]
    pub fn detect(&self, kind: EntityKind, records: &[EntityRecord]) -> Vec<DuplicateGroup<EntityRecord>> {
        let of_kind: Vec<&EntityRecord> = records.iter().filter(|r| r.kind() == kind).collect();
        detect_duplicates(&of_kind, self.strategy(kind))
            .into_iter()
            .filter_map(|group| {
                DuplicateGroup::from_members(group.into_members().into_iter().cloned().collect())
            })
            .collect()
    }

    /// Lists stored records of `kind` and groups them.
    pub fn scan(&self, kind: EntityKind) -> ReconcileResult<Vec<DuplicateGroup<EntityRecord>>> {
        let records = self.store.list(kind).map_err(|e| {
            warn!(%kind, error = %e, "listing records for duplicate scan failed");
            e
        })?;
        let groups = self.detect(kind, &records);
        debug!(
            %kind,
            records = records.len(),
            groups = groups.len(),
            strategy = self.strategy(kind).name(),
            "duplicate scan finished"
        );

        self.emit(EventPayload::DuplicatesDetected {
            kind,
            group_count: groups.len(),
            record_count: records.len(),
        });
        Ok(groups)
    }

    /// Starts an admin review session from a fresh scan.
    pub fn review(&self, kind: EntityKind) -> ReconcileResult<ReviewState<EntityRecord>> {
        Ok(ReviewState::new(kind, self.scan(kind)?))
    }

    /// Stored records of `kind` with near-duplicates collapsed for the public
    /// site, keeping the policy-preferred record of each cluster.
    pub fn public_listing(&self, kind: EntityKind) -> ReconcileResult<Vec<EntityRecord>> {
        let records = self.store.list(kind)?;
        let stored = records.len();
        let active: Vec<EntityRecord> = records.into_iter().filter(EntityRecord::is_active).collect();
        let listed = dedupe_for_display(&active, self.strategy(kind));
        debug!(%kind, stored, listed = listed.len(), "public listing built");
        Ok(listed)
    }

    /// Builds the marketplace report from every stored record.
    pub fn report(&self) -> ReconcileResult<Report> {
        let teachers: Vec<Teacher> = self
            .store
            .list(EntityKind::Teacher)?
            .iter()
            .filter_map(EntityRecord::as_teacher)
            .cloned()
            .collect();
        let schools: Vec<School> = self
            .store
            .list(EntityKind::School)?
            .iter()
            .filter_map(EntityRecord::as_school)
            .cloned()
            .collect();
        Ok(Report::build(&teachers, &schools, &self.config.report)?)
    }

    /// Why two records would be grouped under `kind`'s predicate.
    #[must_use]
    pub fn explain(&self, kind: EntityKind, a: &EntityRecord, b: &EntityRecord) -> Option<MatchReason> {
        self.strategy(kind).explain(a, b)
    }

    /// Similarity of two names after normalization, in `[0, 1]`.
    #[must_use]
    pub fn compute_similarity(&self, a: &str, b: &str) -> f64 {
        normalized_similarity(a, b)
    }

    pub(crate) fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Best-effort delivery; sink failures are logged and swallowed.
    pub(crate) fn emit(&self, payload: EventPayload) {
        if let Err(e) = self.sink.notify(ReconcileEvent::now(payload)) {
            warn!(error = %e, "reconciliation notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::entity::EntityId;
    use crate::error::{ReconcileError, ValidationError};
    use crate::storage::InMemoryEntityStore;

    fn engine_with(records: Vec<EntityRecord>) -> (ReconciliationEngine, EventStream) {
        let store = InMemoryEntityStore::with_records(records).unwrap();
        let config = ReconcileConfig {
            notification_queue_capacity: 16,
            ..ReconcileConfig::default()
        };
        ReconciliationEngine::with_channel(Arc::new(store), config).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = ReconcileConfig {
            school_similarity_threshold: -0.1,
            ..ReconcileConfig::default()
        };
        let err = ReconciliationEngine::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(NullSink),
            config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Validation(ValidationError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn scan_uses_kind_strategy_and_notifies() {
        let (engine, stream) = engine_with(vec![
            Teacher::new("t1", "Alice").with_email("a@x.com").into(),
            Teacher::new("t2", "Zed").with_email("A@X.com").into(),
            // Same email, but schools never match on contact fields.
            School::new("s1", "Gayaza High School").with_email("info@x.com").into(),
            School::new("s2", "Kings College Budo").with_email("info@x.com").into(),
        ]);

        assert_eq!(engine.scan(EntityKind::Teacher).unwrap().len(), 1);
        assert!(engine.scan(EntityKind::School).unwrap().is_empty());

        let event = stream.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(
            event.payload,
            EventPayload::DuplicatesDetected {
                kind: EntityKind::Teacher,
                group_count: 1,
                record_count: 2,
            }
        );
    }

    #[test]
    fn detect_ignores_other_kinds() {
        let (engine, _stream) = engine_with(Vec::new());
        let records: Vec<EntityRecord> = vec![
            Teacher::new("1", "Same Name").into(),
            School::new("2", "Same Name").into(),
        ];
        assert!(engine.detect(EntityKind::Teacher, &records).is_empty());
        assert!(engine.detect(EntityKind::School, &records).is_empty());
    }

    #[test]
    fn review_starts_from_scan() {
        let (engine, _stream) = engine_with(vec![
            Teacher::new("1", "Okello").with_phone("0700 111 222").into(),
            Teacher::new("2", "J. Okello").with_phone("0700111222").into(),
        ]);
        let state = engine.review(EntityKind::Teacher).unwrap();
        assert_eq!(state.group_count(), 1);
        let after = state.apply_delete(&EntityId::from("2"));
        assert_eq!(after.group_count(), 0);
    }

    #[test]
    fn public_listing_collapses_and_hides_inactive() {
        let mut hidden = School::new("3", "Namilyango College");
        hidden.is_active = false;
        let (engine, _stream) = engine_with(vec![
            School::new("1", "Gayaza High School").into(),
            School::new("2", "Gayaza High Schol").with_total_teachers(30).into(),
            hidden.into(),
        ]);
        let listed = engine.public_listing(EntityKind::School).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].as_school().unwrap().id, EntityId::from("2"));
    }

    #[test]
    fn report_covers_both_kinds() {
        let (engine, _stream) = engine_with(vec![
            Teacher::new("t1", "Alice").with_district("Mbale").into(),
            School::new("s1", "Mbale SS").into(),
            School::new("s2", "Tororo Girls").into(),
        ]);
        let report = engine.report().unwrap();
        assert_eq!(report.stats.total_teachers, 1);
        assert_eq!(report.stats.total_schools, 2);
        assert_eq!(report.title, "Marketplace Report");
    }

    #[test]
    fn compute_similarity_normalizes() {
        let engine = ReconciliationEngine::with_defaults(Arc::new(InMemoryEntityStore::new()));
        assert!((engine.compute_similarity("  BUDO ", "budo") - 1.0).abs() < f64::EPSILON);
        let s = engine.compute_similarity("Mengo", "Mengo SS");
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn explain_reports_rule() {
        let engine = ReconciliationEngine::with_defaults(Arc::new(InMemoryEntityStore::new()));
        let a: EntityRecord = Teacher::new("1", "A").with_phone("0700 1").into();
        let b: EntityRecord = Teacher::new("2", "B").with_phone("07001").into();
        assert_eq!(engine.explain(EntityKind::Teacher, &a, &b), Some(MatchReason::Phone));
    }
}
