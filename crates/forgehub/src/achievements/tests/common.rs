use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::achievements::domain::{
    AwardRecord, BadgeCriterion, BadgeDefinition, BadgeId, BadgeRarity, BadgeReward,
    CriterionOperator, CriterionTarget, MetricKind, MetricSnapshot, UserId,
};
use crate::achievements::progression::ProgressionState;
use crate::achievements::repository::{
    AwardInsert, AwardLedger, AwardNotice, BadgeCatalog, NotificationDispatcher, NotifyError,
    ProgressionLedger, SnapshotProvider, StoreError,
};
use crate::achievements::service::AchievementService;

pub(super) fn user() -> UserId {
    UserId("user-42".to_string())
}

pub(super) fn badge_five_templates() -> BadgeDefinition {
    BadgeDefinition {
        id: BadgeId("badge-template-artisan".to_string()),
        name: "Template Artisan".to_string(),
        description: "Publish five project templates".to_string(),
        criterion: BadgeCriterion {
            metric: MetricKind::TemplatesCreated,
            operator: CriterionOperator::Gte,
            target: CriterionTarget::Scalar(5),
        },
        rarity: BadgeRarity::Common,
        points_required: 50,
        reward: BadgeReward {
            xp_bonus: 25,
            grants_profile_badge: true,
            special_privileges: BTreeSet::new(),
        },
        active: true,
    }
}

pub(super) fn badge_likes_between() -> BadgeDefinition {
    BadgeDefinition {
        id: BadgeId("badge-rising-star".to_string()),
        name: "Rising Star".to_string(),
        description: "Collect between ten and twenty likes".to_string(),
        criterion: BadgeCriterion {
            metric: MetricKind::LikesReceived,
            operator: CriterionOperator::Between,
            target: CriterionTarget::Range { low: 10, high: 20 },
        },
        rarity: BadgeRarity::Rare,
        points_required: 150,
        reward: BadgeReward {
            xp_bonus: 40,
            grants_profile_badge: true,
            special_privileges: BTreeSet::new(),
        },
        active: true,
    }
}

pub(super) fn badge_legendary_views() -> BadgeDefinition {
    let mut privileges = BTreeSet::new();
    privileges.insert("featured_profile".to_string());
    BadgeDefinition {
        id: BadgeId("badge-viral".to_string()),
        name: "Gone Viral".to_string(),
        description: "Ten thousand template views".to_string(),
        criterion: BadgeCriterion {
            metric: MetricKind::TotalViews,
            operator: CriterionOperator::Gte,
            target: CriterionTarget::Scalar(10_000),
        },
        rarity: BadgeRarity::Legendary,
        points_required: 1500,
        reward: BadgeReward {
            xp_bonus: 250,
            grants_profile_badge: true,
            special_privileges: privileges,
        },
        active: true,
    }
}

pub(super) fn snapshot_with_templates(templates_created: u64) -> MetricSnapshot {
    MetricSnapshot {
        user_id: user(),
        templates_created,
        copies_received: 0,
        commands_generated: 0,
        likes_received: 0,
        total_views: 0,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMetrics {
    snapshots: Arc<Mutex<HashMap<UserId, MetricSnapshot>>>,
}

impl MemoryMetrics {
    pub(super) fn put(&self, snapshot: MetricSnapshot) {
        self.snapshots
            .lock()
            .expect("metrics mutex poisoned")
            .insert(snapshot.user_id.clone(), snapshot);
    }
}

impl SnapshotProvider for MemoryMetrics {
    fn snapshot(&self, user_id: &UserId) -> Result<Option<MetricSnapshot>, StoreError> {
        let guard = self.snapshots.lock().expect("metrics mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    badges: Arc<Mutex<Vec<BadgeDefinition>>>,
}

impl MemoryCatalog {
    pub(super) fn seed(&self, definitions: Vec<BadgeDefinition>) {
        let mut guard = self.badges.lock().expect("catalog mutex poisoned");
        guard.extend(definitions);
    }
}

impl BadgeCatalog for MemoryCatalog {
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
pub(super) struct MemoryAwards {
    records: Arc<Mutex<Vec<AwardRecord>>>,
}

impl MemoryAwards {
    pub(super) fn all(&self) -> Vec<AwardRecord> {
        self.records.lock().expect("award mutex poisoned").clone()
    }
}

impl AwardLedger for MemoryAwards {
    fn awards_for(&self, user_id: &UserId) -> Result<Vec<AwardRecord>, StoreError> {
        let guard = self.records.lock().expect("award mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert(&self, record: AwardRecord) -> Result<AwardInsert, StoreError> {
        // Single lock across check and push: this is the uniqueness
        // constraint the engine relies on.
        let mut guard = self.records.lock().expect("award mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.user_id == record.user_id && existing.badge_id == record.badge_id)
        {
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
pub(super) struct MemoryProgression {
    states: Arc<Mutex<HashMap<UserId, ProgressionState>>>,
}

impl ProgressionLedger for MemoryProgression {
    fn apply_experience(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        delta: u32,
        now: DateTime<Utc>,
    ) -> Result<ProgressionState, StoreError> {
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

pub(super) struct UnavailableProgression;

impl ProgressionLedger for UnavailableProgression {
    fn apply_experience(
        &self,
        _user_id: &UserId,
        _badge_id: &BadgeId,
        _delta: u32,
        _now: DateTime<Utc>,
    ) -> Result<ProgressionState, StoreError> {
        Err(StoreError::Unavailable("progression store offline".to_string()))
    }

    fn progression(&self, _user_id: &UserId) -> Result<Option<ProgressionState>, StoreError> {
        Err(StoreError::Unavailable("progression store offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    notices: Arc<Mutex<Vec<AwardNotice>>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<AwardNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn notify(&self, notice: AwardNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationDispatcher for FailingNotifier {
    fn notify(&self, _notice: AwardNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("push gateway unreachable".to_string()))
    }
}

pub(super) type MemoryService =
    AchievementService<MemoryMetrics, MemoryCatalog, MemoryAwards, MemoryProgression, RecordingNotifier>;

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) metrics: Arc<MemoryMetrics>,
    pub(super) catalog: Arc<MemoryCatalog>,
    pub(super) awards: Arc<MemoryAwards>,
    pub(super) progression: Arc<MemoryProgression>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

pub(super) fn harness() -> Harness {
    let metrics = Arc::new(MemoryMetrics::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let awards = Arc::new(MemoryAwards::default());
    let progression = Arc::new(MemoryProgression::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let service = Arc::new(AchievementService::new(
        metrics.clone(),
        catalog.clone(),
        awards.clone(),
        progression.clone(),
        notifier.clone(),
    ));

    Harness {
        service,
        metrics,
        catalog,
        awards,
        progression,
        notifier,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
