use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AwardRecord, BadgeDefinition, BadgeId, BadgeRarity, UserId};
use super::progression::{AchievementLogEntry, ProgressionState};
use super::service::AwardOutcome;

/// Public shape of a newly created award.
#[derive(Debug, Clone, Serialize)]
pub struct AwardOutcomeView {
    pub badge_id: BadgeId,
    pub name: String,
    pub rarity: BadgeRarity,
    pub rarity_label: &'static str,
    pub xp_bonus: u32,
    pub earned_at: DateTime<Utc>,
    pub featured: bool,
}

impl From<&AwardOutcome> for AwardOutcomeView {
    fn from(outcome: &AwardOutcome) -> Self {
        Self {
            badge_id: outcome.badge.id.clone(),
            name: outcome.badge.name.clone(),
            rarity: outcome.badge.rarity,
            rarity_label: outcome.badge.rarity.label(),
            xp_bonus: outcome.badge.reward.xp_bonus,
            earned_at: outcome.record.earned_at,
            featured: outcome.record.featured,
        }
    }
}

/// A badge the user has already earned, with its frozen progress.
#[derive(Debug, Clone, Serialize)]
pub struct EarnedBadgeView {
    pub badge_id: BadgeId,
    pub name: String,
    pub rarity: BadgeRarity,
    pub rarity_label: &'static str,
    pub earned_at: DateTime<Utc>,
    pub featured: bool,
}

impl EarnedBadgeView {
    pub fn from_parts(badge: &BadgeDefinition, record: &AwardRecord) -> Self {
        Self {
            badge_id: badge.id.clone(),
            name: badge.name.clone(),
            rarity: badge.rarity,
            rarity_label: badge.rarity.label(),
            earned_at: record.earned_at,
            featured: record.featured,
        }
    }
}

/// Per-badge progress row. Earned badges carry frozen 100% progress
/// regardless of live counters.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeProgressView {
    pub badge_id: BadgeId,
    pub name: String,
    pub rarity: BadgeRarity,
    pub rarity_label: &'static str,
    pub earned: bool,
    pub current_value: u64,
    pub target_value: u64,
    pub progress_percentage: u8,
}

/// Snapshot of a user's level/XP state for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressionView {
    pub level: u32,
    pub experience: u32,
    pub xp_to_next_level: u32,
    pub achievements_log: Vec<AchievementLogEntry>,
}

impl From<&ProgressionState> for ProgressionView {
    fn from(state: &ProgressionState) -> Self {
        Self {
            level: state.level,
            experience: state.experience,
            xp_to_next_level: state.xp_to_next_level(),
            achievements_log: state.achievements_log.clone(),
        }
    }
}

/// Composed achievements page payload for one user.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementSummaryView {
    pub user_id: UserId,
    pub progression: ProgressionView,
    pub earned: Vec<EarnedBadgeView>,
    pub in_progress: Vec<BadgeProgressView>,
    pub completion_percentage: u8,
}

impl AchievementSummaryView {
    /// Share of the active catalog already earned, rounded.
    pub fn completion_of(earned: usize, catalog_size: usize) -> u8 {
        if catalog_size == 0 {
            return 0;
        }
        ((earned as f64 / catalog_size as f64) * 100.0).round() as u8
    }
}
