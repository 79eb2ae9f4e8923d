use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::catalog::{CatalogGuard, CatalogViolation};
use super::domain::{
    BadgeCriterion, BadgeDefinition, BadgeId, BadgeRarity, BadgeReward, CriterionOperator,
    CriterionTarget, MetricKind,
};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Parse { field: &'static str, value: String },
    Invalid(CatalogViolation),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::Parse { field, value } => {
                write!(f, "could not parse {} value '{}'", field, value)
            }
            CatalogImportError::Invalid(err) => {
                write!(f, "catalog row rejected by validation: {}", err)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Parse { .. } => None,
            CatalogImportError::Invalid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<CatalogViolation> for CatalogImportError {
    fn from(err: CatalogViolation) -> Self {
        Self::Invalid(err)
    }
}

/// Administrative seeding path: parse badge definitions from a CSV export
/// and run every row through the catalog guard before returning them.
pub struct CatalogCsvImporter;

impl CatalogCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<BadgeDefinition>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<BadgeDefinition>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let guard = CatalogGuard;
        let mut definitions: Vec<BadgeDefinition> = Vec::new();

        for row in csv_reader.deserialize::<CatalogRow>() {
            let row = row?;
            let definition = row.into_definition()?;
            guard.validate(
                &definition,
                definitions.iter().map(|existing| existing.name.as_str()),
            )?;
            definitions.push(definition);
        }

        Ok(definitions)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Badge ID")]
    badge_id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Metric")]
    metric: String,
    #[serde(rename = "Operator")]
    operator: String,
    #[serde(rename = "Target")]
    target: String,
    #[serde(rename = "Rarity")]
    rarity: String,
    #[serde(rename = "Points")]
    points: u32,
    #[serde(rename = "Xp Bonus")]
    xp_bonus: u32,
    #[serde(rename = "Profile Badge", default, deserialize_with = "yes_no")]
    grants_profile_badge: bool,
    #[serde(rename = "Privileges", default)]
    privileges: String,
}

impl CatalogRow {
    fn into_definition(self) -> Result<BadgeDefinition, CatalogImportError> {
        let metric = parse_metric(&self.metric)?;
        let operator = parse_operator(&self.operator)?;
        let target = parse_target(&self.target)?;
        let rarity = parse_rarity(&self.rarity)?;

        let special_privileges: BTreeSet<String> = self
            .privileges
            .split(';')
            .map(str::trim)
            .filter(|privilege| !privilege.is_empty())
            .map(str::to_string)
            .collect();

        Ok(BadgeDefinition {
            id: BadgeId(self.badge_id),
            name: self.name,
            description: self.description,
            criterion: BadgeCriterion {
                metric,
                operator,
                target,
            },
            rarity,
            points_required: self.points,
            reward: BadgeReward {
                xp_bonus: self.xp_bonus,
                grants_profile_badge: self.grants_profile_badge,
                special_privileges,
            },
            active: true,
        })
    }
}

fn parse_metric(value: &str) -> Result<MetricKind, CatalogImportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "templates_created" => Ok(MetricKind::TemplatesCreated),
        "copies_received" => Ok(MetricKind::CopiesReceived),
        "commands_generated" => Ok(MetricKind::CommandsGenerated),
        "likes_received" => Ok(MetricKind::LikesReceived),
        "total_views" => Ok(MetricKind::TotalViews),
        _ => Err(CatalogImportError::Parse {
            field: "Metric",
            value: value.to_string(),
        }),
    }
}

fn parse_operator(value: &str) -> Result<CriterionOperator, CatalogImportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "gte" => Ok(CriterionOperator::Gte),
        "lte" => Ok(CriterionOperator::Lte),
        "eq" => Ok(CriterionOperator::Eq),
        "between" => Ok(CriterionOperator::Between),
        _ => Err(CatalogImportError::Parse {
            field: "Operator",
            value: value.to_string(),
        }),
    }
}

/// Target accepts a scalar (`5`) or an inclusive range (`3..10`). Range
/// form is only valid with `between`; the catalog guard rejects the rest.
fn parse_target(value: &str) -> Result<CriterionTarget, CatalogImportError> {
    let trimmed = value.trim();
    let parse_error = || CatalogImportError::Parse {
        field: "Target",
        value: value.to_string(),
    };

    if let Some((low, high)) = trimmed.split_once("..") {
        let low = low.trim().parse::<u64>().map_err(|_| parse_error())?;
        let high = high.trim().parse::<u64>().map_err(|_| parse_error())?;
        return Ok(CriterionTarget::Range { low, high });
    }

    trimmed
        .parse::<u64>()
        .map(CriterionTarget::Scalar)
        .map_err(|_| parse_error())
}

fn parse_rarity(value: &str) -> Result<BadgeRarity, CatalogImportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "common" => Ok(BadgeRarity::Common),
        "rare" => Ok(BadgeRarity::Rare),
        "epic" => Ok(BadgeRarity::Epic),
        "legendary" => Ok(BadgeRarity::Legendary),
        _ => Err(CatalogImportError::Parse {
            field: "Rarity",
            value: value.to_string(),
        }),
    }
}

fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        raw.as_deref().map(str::trim),
        Some("yes") | Some("true") | Some("1")
    ))
}
