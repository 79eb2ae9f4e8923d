use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AwardRecord, BadgeDefinition, BadgeId, BadgeRarity, MetricSnapshot, UserId};
use super::progression::ProgressionState;

/// Error enumeration for collaborator store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of offering an award record to the ledger. Losing the
/// uniqueness race is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardInsert {
    Created(AwardRecord),
    AlreadyExists,
}

/// Read-only source of a user's current activity counters.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self, user_id: &UserId) -> Result<Option<MetricSnapshot>, StoreError>;
}

/// Badge definition store. The engine reads active entries; inserts come
/// only from the administrative creation path.
pub trait BadgeCatalog: Send + Sync {
    fn active_badges(&self) -> Result<Vec<BadgeDefinition>, StoreError>;
    fn badge(&self, badge_id: &BadgeId) -> Result<Option<BadgeDefinition>, StoreError>;
    fn names(&self) -> Result<Vec<String>, StoreError>;
    fn insert(&self, definition: BadgeDefinition) -> Result<BadgeDefinition, StoreError>;
}

/// The set of (user, badge) award records. Implementations must enforce
/// uniqueness per pair inside `insert`; concurrent duplicates surface as
/// `AwardInsert::AlreadyExists`.
pub trait AwardLedger: Send + Sync {
    fn awards_for(&self, user_id: &UserId) -> Result<Vec<AwardRecord>, StoreError>;
    fn insert(&self, record: AwardRecord) -> Result<AwardInsert, StoreError>;
    /// Bookkeeping only: flip `notification_sent` after a dispatch.
    fn mark_notified(&self, user_id: &UserId, badge_id: &BadgeId) -> Result<(), StoreError>;
}

/// Per-user experience/level state. `apply_experience` is an atomic
/// read-modify-write; implementations serialize updates for the same user.
pub trait ProgressionLedger: Send + Sync {
    fn apply_experience(
        &self,
        user_id: &UserId,
        badge_id: &BadgeId,
        delta: u32,
        now: DateTime<Utc>,
    ) -> Result<ProgressionState, StoreError>;
    fn progression(&self, user_id: &UserId) -> Result<Option<ProgressionState>, StoreError>;
}

/// Payload handed to the notification collaborator when a badge lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardNotice {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub badge_name: String,
    pub rarity: BadgeRarity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Notification dispatch error. Always logged, never propagated; an award
/// stands regardless of delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound notification hook (push/email/in-app adapters).
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notice: AwardNotice) -> Result<(), NotifyError>;
}
