use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for platform users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for badge catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BadgeId(pub String);

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Activity counters a badge criterion can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TemplatesCreated,
    CopiesReceived,
    CommandsGenerated,
    LikesReceived,
    TotalViews,
}

impl MetricKind {
    pub const fn label(self) -> &'static str {
        match self {
            MetricKind::TemplatesCreated => "templates_created",
            MetricKind::CopiesReceived => "copies_received",
            MetricKind::CommandsGenerated => "commands_generated",
            MetricKind::LikesReceived => "likes_received",
            MetricKind::TotalViews => "total_views",
        }
    }
}

/// Comparison applied between a metric counter and the criterion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionOperator {
    Gte,
    Lte,
    Eq,
    Between,
}

/// Target value for a criterion. `Range` is only meaningful with the
/// `between` operator; a mismatched shape evaluates as unmet rather than
/// panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionTarget {
    Scalar(u64),
    Range { low: u64, high: u64 },
}

/// Single rule deciding when a badge is earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCriterion {
    pub metric: MetricKind,
    pub operator: CriterionOperator,
    pub target: CriterionTarget,
}

/// Coarse badge classification constraining allowed point costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub const fn label(self) -> &'static str {
        match self {
            BadgeRarity::Common => "common",
            BadgeRarity::Rare => "rare",
            BadgeRarity::Epic => "epic",
            BadgeRarity::Legendary => "legendary",
        }
    }

    /// Inclusive band of allowed `points_required` values for this tier.
    pub const fn points_band(self) -> (u32, u32) {
        match self {
            BadgeRarity::Common => (0, 200),
            BadgeRarity::Rare => (100, 800),
            BadgeRarity::Epic => (500, 2000),
            BadgeRarity::Legendary => (1000, 10_000),
        }
    }
}

/// Reward granted exactly once when the badge is earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeReward {
    pub xp_bonus: u32,
    pub grants_profile_badge: bool,
    #[serde(default)]
    pub special_privileges: BTreeSet<String>,
}

/// Catalog entry. The engine only reads active entries; creation-time
/// validation lives in the catalog guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub criterion: BadgeCriterion,
    pub rarity: BadgeRarity,
    pub points_required: u32,
    pub reward: BadgeReward,
    pub active: bool,
}

/// Read-only view of a user's cumulative counters at evaluation time.
/// Supplied fresh on each evaluation call, never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub user_id: UserId,
    #[serde(default)]
    pub templates_created: u64,
    #[serde(default)]
    pub copies_received: u64,
    #[serde(default)]
    pub commands_generated: u64,
    #[serde(default)]
    pub likes_received: u64,
    #[serde(default)]
    pub total_views: u64,
}

impl MetricSnapshot {
    pub fn value_of(&self, metric: MetricKind) -> u64 {
        match metric {
            MetricKind::TemplatesCreated => self.templates_created,
            MetricKind::CopiesReceived => self.copies_received,
            MetricKind::CommandsGenerated => self.commands_generated,
            MetricKind::LikesReceived => self.likes_received,
            MetricKind::TotalViews => self.total_views,
        }
    }
}

/// Criterion progress captured on the award record, frozen at 100% once
/// the badge is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardProgress {
    pub current_value: u64,
    pub target_value: u64,
    pub progress_percentage: u8,
}

/// Proof that a user has earned a specific badge. Created at most once per
/// (user, badge) pair; only `notification_sent` is mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub earned_at: DateTime<Utc>,
    pub progress: AwardProgress,
    pub notification_sent: bool,
    pub featured: bool,
}

impl AwardRecord {
    /// Build the record for a freshly met criterion. Legendary badges are
    /// featured automatically.
    pub fn newly_earned(
        user_id: UserId,
        badge: &BadgeDefinition,
        current_value: u64,
        target_value: u64,
        earned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            badge_id: badge.id.clone(),
            earned_at,
            progress: AwardProgress {
                current_value,
                target_value,
                progress_percentage: 100,
            },
            notification_sent: false,
            featured: badge.rarity == BadgeRarity::Legendary,
        }
    }
}
