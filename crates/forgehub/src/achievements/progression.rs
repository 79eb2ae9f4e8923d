use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{BadgeId, UserId};

/// Event recorded in a user's achievements log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementEvent {
    LevelUp { new_level: u32 },
    BadgeEarned { badge_id: BadgeId },
}

/// Append-only log entry on the progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementLogEntry {
    #[serde(flatten)]
    pub event: AchievementEvent,
    pub earned_at: DateTime<Utc>,
}

/// Per-user derived experience/level state. Mutated only through
/// `apply_experience` and `record_badge`, which preserve the rollover
/// invariant `experience < level * 100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub user_id: UserId,
    pub experience: u32,
    pub level: u32,
    pub achievements_log: Vec<AchievementLogEntry>,
}

impl ProgressionState {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            experience: 0,
            level: 1,
            achievements_log: Vec::new(),
        }
    }

    /// XP required to advance from the current level.
    pub const fn xp_required(level: u32) -> u32 {
        level * 100
    }

    pub fn xp_to_next_level(&self) -> u32 {
        Self::xp_required(self.level).saturating_sub(self.experience)
    }

    /// Add experience and roll over levels. A loop rather than a single
    /// check: one large grant may cross several level thresholds, and
    /// every crossing gets its own log entry.
    pub fn apply_experience(&mut self, delta: u32, now: DateTime<Utc>) {
        self.experience = self.experience.saturating_add(delta);

        while self.experience >= Self::xp_required(self.level) {
            self.experience -= Self::xp_required(self.level);
            self.level += 1;
            self.achievements_log.push(AchievementLogEntry {
                event: AchievementEvent::LevelUp {
                    new_level: self.level,
                },
                earned_at: now,
            });
        }
    }

    /// Log a badge grant alongside the level-up entries.
    pub fn record_badge(&mut self, badge_id: BadgeId, now: DateTime<Utc>) {
        self.achievements_log.push(AchievementLogEntry {
            event: AchievementEvent::BadgeEarned { badge_id },
            earned_at: now,
        });
    }
}
