use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use forgehub::achievements::{
    AchievementService, AwardInsert, AwardLedger, AwardNotice, AwardRecord, BadgeCatalog,
    BadgeCriterion, BadgeDefinition, BadgeId, BadgeRarity, BadgeReward, CriterionOperator,
    CriterionTarget, MetricKind, MetricSnapshot, NotificationDispatcher, NotifyError,
    ProgressionLedger, ProgressionState, SnapshotProvider, StoreError, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiService = AchievementService<
    InMemoryMetricStore,
    InMemoryBadgeCatalog,
    InMemoryAwardLedger,
    InMemoryProgressionLedger,
    InMemoryNotifier,
>;

#[derive(Default, Clone)]
pub(crate) struct InMemoryMetricStore {
    snapshots: Arc<Mutex<HashMap<UserId, MetricSnapshot>>>,
}

impl InMemoryMetricStore {
    pub(crate) fn upsert(&self, snapshot: MetricSnapshot) {
        let mut guard = self.snapshots.lock().expect("metric mutex poisoned");
        guard.insert(snapshot.user_id.clone(), snapshot);
    }
}

impl SnapshotProvider for InMemoryMetricStore {
    fn snapshot(&self, user_id: &UserId) -> Result<Option<MetricSnapshot>, StoreError> {
        let guard = self.snapshots.lock().expect("metric mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBadgeCatalog {
    badges: Arc<Mutex<Vec<BadgeDefinition>>>,
}

impl InMemoryBadgeCatalog {
    pub(crate) fn seed(&self, definitions: Vec<BadgeDefinition>) {
        let mut guard = self.badges.lock().expect("catalog mutex poisoned");
        guard.extend(definitions);
    }
}

impl BadgeCatalog for InMemoryBadgeCatalog {
    fn active_badges(&self) -> Result<Vec<BadgeDefinition>, StoreError> {
        let guard = self.badges.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().filter(|badge| badge.active).cloned().collect())
    }

    fn badge(&self, badge_id: &BadgeId) -> Result<Option<BadgeDefinition>, StoreError> {
        let guard = self.badges.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().find(|badge| &badge.id == badge_id).cloned())
    }

    fn names(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.badges.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().map(|badge| badge.name.clone()).collect())
    }

    fn insert(&self, definition: BadgeDefinition) -> Result<BadgeDefinition, StoreError> {
        let mut guard = self.badges.lock().expect("catalog mutex poisoned");
        guard.push(definition.clone());
        Ok(definition)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAwardLedger {
    records: Arc<Mutex<Vec<AwardRecord>>>,
}

impl AwardLedger for InMemoryAwardLedger {
    fn awards_for(&self, user_id: &UserId) -> Result<Vec<AwardRecord>, StoreError> {
        let guard = self.records.lock().expect("award mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert(&self, record: AwardRecord) -> Result<AwardInsert, StoreError> {
        // Check and push under one lock: this is the (user, badge)
        // uniqueness constraint.
        let mut guard = self.records.lock().expect("award mutex poisoned");
        if guard.iter().any(|existing| {
            existing.user_id == record.user_id && existing.badge_id == record.badge_id
        }) {
            return Ok(AwardInsert::AlreadyExists);
        }
        guard.push(record.clone());
        Ok(AwardInsert::Created(record))
    }

    fn mark_notified(&self, user_id: &UserId, badge_id: &BadgeId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("award mutex poisoned");
        match guard
            .iter_mut()
            .find(|record| &record.user_id == user_id && &record.badge_id == badge_id)
        {
            Some(record) => {
                record.notification_sent = true;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProgressionLedger {
    states: Arc<Mutex<HashMap<UserId, ProgressionState>>>,
}

impl ProgressionLedger for InMemoryProgressionLedger {
    fn apply_experience(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        delta: u32,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<ProgressionState, StoreError> {
        // The mutex spans the whole read-modify-write, serializing
        // progression updates per user.
        let mut guard = self.states.lock().expect("progression mutex poisoned");
        let state = guard
            .entry(user_id.clone())
            .or_insert_with(|| ProgressionState::new(user_id.clone()));
        state.record_badge(badge_id.clone(), now);
        state.apply_experience(delta, now);
        Ok(state.clone())
    }

    fn progression(&self, user_id: &UserId) -> Result<Option<ProgressionState>, StoreError> {
        let guard = self.states.lock().expect("progression mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }
}

/// Records dispatched notices and logs them; a stand-in for the push/email
/// adapters the platform wires in production.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotifier {
    notices: Arc<Mutex<Vec<AwardNotice>>>,
}

impl InMemoryNotifier {
    pub(crate) fn notices(&self) -> Vec<AwardNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for InMemoryNotifier {
    fn notify(&self, notice: AwardNotice) -> Result<(), NotifyError> {
        tracing::info!(
            user = %notice.user_id,
            badge = %notice.badge_id,
            rarity = notice.rarity.label(),
            "badge earned"
        );
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

fn definition(
    id: &str,
    name: &str,
    description: &str,
    metric: MetricKind,
    operator: CriterionOperator,
    target: CriterionTarget,
    rarity: BadgeRarity,
    points_required: u32,
    xp_bonus: u32,
) -> BadgeDefinition {
    BadgeDefinition {
        id: BadgeId(id.to_string()),
        name: name.to_string(),
        description: description.to_string(),
        criterion: BadgeCriterion {
            metric,
            operator,
            target,
        },
        rarity,
        points_required,
        reward: BadgeReward {
            xp_bonus,
            grants_profile_badge: true,
            special_privileges: BTreeSet::new(),
        },
        active: true,
    }
}

/// Built-in catalog used when no CSV seed is supplied.
pub(crate) fn starter_catalog() -> Vec<BadgeDefinition> {
    vec![
        definition(
            "badge-first-template",
            "First Template",
            "Publish your first project template",
            MetricKind::TemplatesCreated,
            CriterionOperator::Gte,
            CriterionTarget::Scalar(1),
            BadgeRarity::Common,
            25,
            10,
        ),
        definition(
            "badge-template-artisan",
            "Template Artisan",
            "Publish five project templates",
            MetricKind::TemplatesCreated,
            CriterionOperator::Gte,
            CriterionTarget::Scalar(5),
            BadgeRarity::Common,
            50,
            25,
        ),
        definition(
            "badge-rising-star",
            "Rising Star",
            "Collect between ten and fifty likes",
            MetricKind::LikesReceived,
            CriterionOperator::Between,
            CriterionTarget::Range { low: 10, high: 50 },
            BadgeRarity::Rare,
            150,
            40,
        ),
        definition(
            "badge-command-centurion",
            "Command Centurion",
            "Generate one hundred install commands",
            MetricKind::CommandsGenerated,
            CriterionOperator::Gte,
            CriterionTarget::Scalar(100),
            BadgeRarity::Epic,
            600,
            120,
        ),
        definition(
            "badge-gone-viral",
            "Gone Viral",
            "Ten thousand template views",
            MetricKind::TotalViews,
            CriterionOperator::Gte,
            CriterionTarget::Scalar(10_000),
            BadgeRarity::Legendary,
            1500,
            250,
        ),
    ]
}
