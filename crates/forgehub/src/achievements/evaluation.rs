use serde::{Deserialize, Serialize};

use super::domain::{BadgeCriterion, CriterionOperator, CriterionTarget, MetricSnapshot};

/// Result of evaluating one criterion against one snapshot.
///
/// `progress_percentage` is display data independent of `met`; the earned
/// decision always comes from `met`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionEvaluation {
    pub met: bool,
    pub current_value: u64,
    pub progress_percentage: u8,
}

/// Evaluate a criterion against a snapshot. Pure and side-effect-free.
///
/// Shape mismatches between operator and target (a catalog bug, not a
/// runtime fault) evaluate as unmet with zero progress rather than
/// panicking.
pub fn evaluate(criterion: &BadgeCriterion, snapshot: &MetricSnapshot) -> CriterionEvaluation {
    let current_value = snapshot.value_of(criterion.metric);

    let (met, progress_target) = match (criterion.operator, criterion.target) {
        (CriterionOperator::Gte, CriterionTarget::Scalar(target)) => {
            (current_value >= target, Some(target))
        }
        (CriterionOperator::Lte, CriterionTarget::Scalar(target)) => {
            (current_value <= target, Some(target))
        }
        (CriterionOperator::Eq, CriterionTarget::Scalar(target)) => {
            (current_value == target, Some(target))
        }
        (CriterionOperator::Between, CriterionTarget::Range { low, high }) => {
            if low > high {
                (false, None)
            } else {
                (low <= current_value && current_value <= high, Some(high))
            }
        }
        // Operator/target shape mismatch.
        (_, CriterionTarget::Range { .. }) | (CriterionOperator::Between, _) => (false, None),
    };

    CriterionEvaluation {
        met,
        current_value,
        progress_percentage: progress_target
            .map(|target| progress_percentage(current_value, target))
            .unwrap_or(0),
    }
}

/// `clamp(round(current / target * 100), 0, 100)`. A zero target reports
/// 100 since the threshold is trivially reached.
pub fn progress_percentage(current_value: u64, target_value: u64) -> u8 {
    if target_value == 0 {
        return 100;
    }

    let ratio = current_value as f64 / target_value as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// The target a progress percentage is measured against: the scalar
/// target, or the range's upper bound for `between`.
pub fn progress_target(criterion: &BadgeCriterion) -> u64 {
    match criterion.target {
        CriterionTarget::Scalar(target) => target,
        CriterionTarget::Range { high, .. } => high,
    }
}
