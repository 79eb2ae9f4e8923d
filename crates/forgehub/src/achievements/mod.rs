//! Achievement evaluation and progression engine.
//!
//! Given a user's accumulated activity counters, decide which badge
//! definitions they now qualify for, award each at most once, apply the
//! XP reward to the level progression, and request a best-effort
//! notification. Persistence, authentication, and notification transport
//! live behind the traits in [`repository`].

pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod import;
pub mod progression;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogGuard, CatalogViolation};
pub use domain::{
    AwardProgress, AwardRecord, BadgeCriterion, BadgeDefinition, BadgeId, BadgeRarity,
    BadgeReward, CriterionOperator, CriterionTarget, MetricKind, MetricSnapshot, UserId,
};
pub use evaluation::{evaluate, CriterionEvaluation};
pub use import::{CatalogCsvImporter, CatalogImportError};
pub use progression::{AchievementEvent, AchievementLogEntry, ProgressionState};
pub use repository::{
    AwardInsert, AwardLedger, AwardNotice, BadgeCatalog, NotificationDispatcher, NotifyError,
    ProgressionLedger, SnapshotProvider, StoreError,
};
pub use router::{achievement_router, DirectAwardRequest};
pub use service::{AchievementService, AchievementServiceError, AwardOutcome};
pub use views::{
    AchievementSummaryView, AwardOutcomeView, BadgeProgressView, EarnedBadgeView, ProgressionView,
};
