use super::domain::{BadgeDefinition, BadgeRarity, CriterionOperator, CriterionTarget};

/// Validation errors raised when a badge definition enters the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogViolation {
    #[error("badge name '{0}' already exists in the catalog")]
    DuplicateName(String),
    #[error("points {found} outside the {rarity:?} band {expected_low}-{expected_high}")]
    RarityPointsMismatch {
        rarity: BadgeRarity,
        expected_low: u32,
        expected_high: u32,
        found: u32,
    },
    #[error("invalid criterion shape: {0}")]
    InvalidCriterionShape(String),
}

/// Guard applied to badge definitions at creation time. Award-time code
/// never re-validates; a definition that passed here is trusted.
#[derive(Debug, Clone, Default)]
pub struct CatalogGuard;

impl CatalogGuard {
    /// Validate a candidate definition against the catalog invariants.
    /// `existing_names` holds the names already present in the catalog.
    pub fn validate<'a, N>(
        &self,
        definition: &BadgeDefinition,
        existing_names: N,
    ) -> Result<(), CatalogViolation>
    where
        N: IntoIterator<Item = &'a str>,
    {
        let name = definition.name.trim();
        if name.is_empty() {
            return Err(CatalogViolation::InvalidCriterionShape(
                "badge name must not be empty".to_string(),
            ));
        }

        if existing_names
            .into_iter()
            .any(|existing| existing.trim().eq_ignore_ascii_case(name))
        {
            return Err(CatalogViolation::DuplicateName(name.to_string()));
        }

        let (expected_low, expected_high) = definition.rarity.points_band();
        if definition.points_required < expected_low || definition.points_required > expected_high {
            return Err(CatalogViolation::RarityPointsMismatch {
                rarity: definition.rarity,
                expected_low,
                expected_high,
                found: definition.points_required,
            });
        }

        self.validate_criterion_shape(definition)
    }

    fn validate_criterion_shape(
        &self,
        definition: &BadgeDefinition,
    ) -> Result<(), CatalogViolation> {
        match (definition.criterion.operator, definition.criterion.target) {
            (CriterionOperator::Between, CriterionTarget::Range { low, high }) => {
                if low > high {
                    Err(CatalogViolation::InvalidCriterionShape(format!(
                        "between range must be ascending, got {low}..{high}"
                    )))
                } else {
                    Ok(())
                }
            }
            (CriterionOperator::Between, CriterionTarget::Scalar(_)) => {
                Err(CatalogViolation::InvalidCriterionShape(
                    "between requires a two-element ascending range".to_string(),
                ))
            }
            (operator, CriterionTarget::Range { .. }) => {
                Err(CatalogViolation::InvalidCriterionShape(format!(
                    "operator {operator:?} requires a scalar target"
                )))
            }
            (_, CriterionTarget::Scalar(_)) => Ok(()),
        }
    }
}
