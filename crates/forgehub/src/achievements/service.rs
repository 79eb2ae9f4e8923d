use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::catalog::{CatalogGuard, CatalogViolation};
use super::domain::{AwardRecord, BadgeDefinition, BadgeId, UserId};
use super::evaluation;
use super::progression::ProgressionState;
use super::repository::{
    AwardInsert, AwardLedger, AwardNotice, BadgeCatalog, NotificationDispatcher,
    ProgressionLedger, SnapshotProvider, StoreError,
};
use super::views::{
    AchievementSummaryView, BadgeProgressView, EarnedBadgeView, ProgressionView,
};

/// A newly created award together with the badge that produced it.
#[derive(Debug, Clone)]
pub struct AwardOutcome {
    pub badge: BadgeDefinition,
    pub record: AwardRecord,
}

/// Error raised by the achievement service.
#[derive(Debug, thiserror::Error)]
pub enum AchievementServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogViolation),
    #[error("criteria not met for badge '{badge_id}' ({progress_percentage}% progress)")]
    CriteriaNotMet {
        badge_id: BadgeId,
        progress_percentage: u8,
    },
    #[error("badge '{0}' already awarded to this user")]
    AlreadyAwarded(BadgeId),
    #[error("unknown badge '{0}'")]
    UnknownBadge(BadgeId),
    #[error("badge '{0}' is inactive")]
    BadgeInactive(BadgeId),
    #[error("unknown user '{0}'")]
    UnknownUser(UserId),
    #[error("progression update failed: {0}")]
    ProgressionUpdate(StoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Award engine: the only component with side effects. Orchestrates the
/// catalog scan, criterion evaluation, ledger writes, progression update,
/// and best-effort notification dispatch.
pub struct AchievementService<S, C, L, P, N> {
    snapshots: Arc<S>,
    catalog: Arc<C>,
    awards: Arc<L>,
    progression: Arc<P>,
    notifier: Arc<N>,
    guard: CatalogGuard,
}

impl<S, C, L, P, N> AchievementService<S, C, L, P, N>
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        snapshots: Arc<S>,
        catalog: Arc<C>,
        awards: Arc<L>,
        progression: Arc<P>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            snapshots,
            catalog,
            awards,
            progression,
            notifier,
            guard: CatalogGuard,
        }
    }

    /// Scan the active catalog and award every newly met badge exactly
    /// once. A user with no recorded activity yields an empty list.
    pub fn evaluate_and_award(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AwardOutcome>, AchievementServiceError> {
        let snapshot = match self.snapshots.snapshot(user_id)? {
            Some(snapshot) => snapshot,
            None => return Ok(Vec::new()),
        };

        let earned: HashSet<BadgeId> = self
            .awards
            .awards_for(user_id)?
            .into_iter()
            .map(|record| record.badge_id)
            .collect();

        let mut outcomes = Vec::new();
        for badge in self.catalog.active_badges()? {
            if earned.contains(&badge.id) {
                continue;
            }

            let evaluation = evaluation::evaluate(&badge.criterion, &snapshot);
            if !evaluation.met {
                continue;
            }

            if let Some(outcome) = self.commit_award(user_id, &badge, evaluation.current_value, None)? {
                outcomes.push(outcome);
            }
        }

        Ok(outcomes)
    }

    /// Administrative award path. Preconditions are surfaced as typed
    /// errors; the creation/reward/notification path is identical to the
    /// automatic sweep once they pass.
    pub fn award_directly(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        override_criteria: bool,
        reason: Option<String>,
    ) -> Result<AwardOutcome, AchievementServiceError> {
        let badge = self
            .catalog
            .badge(badge_id)?
            .ok_or_else(|| AchievementServiceError::UnknownBadge(badge_id.clone()))?;
        if !badge.active {
            return Err(AchievementServiceError::BadgeInactive(badge_id.clone()));
        }

        let snapshot = self
            .snapshots
            .snapshot(user_id)?
            .ok_or_else(|| AchievementServiceError::UnknownUser(user_id.clone()))?;

        if self
            .awards
            .awards_for(user_id)?
            .iter()
            .any(|record| &record.badge_id == badge_id)
        {
            return Err(AchievementServiceError::AlreadyAwarded(badge_id.clone()));
        }

        let evaluation = evaluation::evaluate(&badge.criterion, &snapshot);
        if !override_criteria && !evaluation.met {
            return Err(AchievementServiceError::CriteriaNotMet {
                badge_id: badge_id.clone(),
                progress_percentage: evaluation.progress_percentage,
            });
        }

        match self.commit_award(user_id, &badge, evaluation.current_value, reason)? {
            Some(outcome) => Ok(outcome),
            // Lost a race with a concurrent sweep between the existence
            // check and the insert.
            None => Err(AchievementServiceError::AlreadyAwarded(badge_id.clone())),
        }
    }

    /// Insert the award record, apply the XP reward, and dispatch the
    /// notification. Returns `None` when a concurrent caller already
    /// created the record; that caller owns the side effects.
    fn commit_award(
        &self,
        user_id: &UserId,
        badge: &BadgeDefinition,
        current_value: u64,
        reason: Option<String>,
    ) -> Result<Option<AwardOutcome>, AchievementServiceError> {
        let now = Utc::now();
        let record = AwardRecord::newly_earned(
            user_id.clone(),
            badge,
            current_value,
            evaluation::progress_target(&badge.criterion),
            now,
        );

        let record = match self.awards.insert(record)? {
            AwardInsert::Created(record) => record,
            AwardInsert::AlreadyExists => {
                debug!(
                    user = %user_id,
                    badge = %badge.id,
                    "award already recorded by a concurrent evaluation"
                );
                return Ok(None);
            }
        };

        self.progression
            .apply_experience(user_id, &badge.id, badge.reward.xp_bonus, now)
            .map_err(AchievementServiceError::ProgressionUpdate)?;

        let notice = AwardNotice {
            user_id: user_id.clone(),
            badge_id: badge.id.clone(),
            badge_name: badge.name.clone(),
            rarity: badge.rarity,
            reason,
        };
        match self.notifier.notify(notice) {
            Ok(()) => {
                if let Err(err) = self.awards.mark_notified(user_id, &badge.id) {
                    warn!(
                        user = %user_id,
                        badge = %badge.id,
                        error = %err,
                        "failed to record notification bookkeeping"
                    );
                }
            }
            Err(err) => {
                // Dispatch is best-effort: the award stands and the next
                // badge proceeds.
                warn!(
                    user = %user_id,
                    badge = %badge.id,
                    error = %err,
                    "notification dispatch failed"
                );
            }
        }

        Ok(Some(AwardOutcome {
            badge: badge.clone(),
            record,
        }))
    }

    /// Per-badge progress across the active catalog. Earned badges report
    /// their frozen progress; unearned badges report live evaluation.
    pub fn progress_report(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<BadgeProgressView>, AchievementServiceError> {
        let snapshot = self.snapshots.snapshot(user_id)?;
        let records = self.awards.awards_for(user_id)?;

        let mut rows = Vec::new();
        for badge in self.catalog.active_badges()? {
            let earned_record = records.iter().find(|record| record.badge_id == badge.id);
            let row = match earned_record {
                Some(record) => BadgeProgressView {
                    badge_id: badge.id.clone(),
                    name: badge.name.clone(),
                    rarity: badge.rarity,
                    rarity_label: badge.rarity.label(),
                    earned: true,
                    current_value: record.progress.current_value,
                    target_value: record.progress.target_value,
                    progress_percentage: record.progress.progress_percentage,
                },
                None => {
                    let (current_value, progress_percentage) = match &snapshot {
                        Some(snapshot) => {
                            let evaluation = evaluation::evaluate(&badge.criterion, snapshot);
                            (evaluation.current_value, evaluation.progress_percentage)
                        }
                        None => (0, 0),
                    };
                    BadgeProgressView {
                        badge_id: badge.id.clone(),
                        name: badge.name.clone(),
                        rarity: badge.rarity,
                        rarity_label: badge.rarity.label(),
                        earned: false,
                        current_value,
                        target_value: evaluation::progress_target(&badge.criterion),
                        progress_percentage,
                    }
                }
            };
            rows.push(row);
        }

        Ok(rows)
    }

    /// Composed achievements page for one user: progression state plus
    /// earned and in-progress badge views.
    pub fn achievement_summary(
        &self,
        user_id: &UserId,
    ) -> Result<AchievementSummaryView, AchievementServiceError> {
        let progression = self.progression_state(user_id)?;
        let records = self.awards.awards_for(user_id)?;
        let catalog = self.catalog.active_badges()?;

        let mut earned = Vec::new();
        for badge in &catalog {
            if let Some(record) = records.iter().find(|record| record.badge_id == badge.id) {
                earned.push(EarnedBadgeView::from_parts(badge, record));
            }
        }

        let in_progress: Vec<BadgeProgressView> = self
            .progress_report(user_id)?
            .into_iter()
            .filter(|row| !row.earned)
            .collect();

        let completion_percentage =
            AchievementSummaryView::completion_of(earned.len(), catalog.len());

        Ok(AchievementSummaryView {
            user_id: user_id.clone(),
            progression: ProgressionView::from(&progression),
            earned,
            in_progress,
            completion_percentage,
        })
    }

    /// Current progression state, lazily defaulted for users who have
    /// never earned XP.
    pub fn progression_state(
        &self,
        user_id: &UserId,
    ) -> Result<ProgressionState, AchievementServiceError> {
        Ok(self
            .progression
            .progression(user_id)?
            .unwrap_or_else(|| ProgressionState::new(user_id.clone())))
    }

    /// Administrative catalog creation. Validation happens here, once,
    /// never on the award path.
    pub fn create_badge(
        &self,
        definition: BadgeDefinition,
    ) -> Result<BadgeDefinition, AchievementServiceError> {
        let names = self.catalog.names()?;
        self.guard
            .validate(&definition, names.iter().map(String::as_str))?;
        Ok(self.catalog.insert(definition)?)
    }
}
