use crate::infra::{
    starter_catalog, InMemoryAwardLedger, InMemoryBadgeCatalog, InMemoryMetricStore,
    InMemoryNotifier, InMemoryProgressionLedger,
};
use clap::Args;
use forgehub::achievements::{
    AchievementService, CatalogCsvImporter, MetricSnapshot, UserId,
};
use forgehub::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional badge catalog CSV to seed instead of the built-ins
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Templates-created counter for the demo user
    #[arg(long, default_value_t = 5)]
    pub(crate) templates_created: u64,
    /// Likes-received counter for the demo user
    #[arg(long, default_value_t = 12)]
    pub(crate) likes_received: u64,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogValidateArgs {
    /// Badge catalog CSV to parse and validate
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) fn run_catalog_validate(args: CatalogValidateArgs) -> Result<(), AppError> {
    let definitions = CatalogCsvImporter::from_path(&args.file)?;
    println!(
        "Catalog '{}' is valid: {} badge definition(s)",
        args.file.display(),
        definitions.len()
    );
    for definition in &definitions {
        println!(
            "- {} [{}] {} points, {} XP",
            definition.name,
            definition.rarity.label(),
            definition.points_required,
            definition.reward.xp_bonus
        );
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        catalog_csv,
        templates_created,
        likes_received,
    } = args;

    println!("Achievement engine demo");

    let metric_store = Arc::new(InMemoryMetricStore::default());
    let catalog = Arc::new(InMemoryBadgeCatalog::default());
    let notifier = Arc::new(InMemoryNotifier::default());

    let definitions = match catalog_csv {
        Some(path) => {
            println!("Catalog source: CSV import ({})", path.display());
            CatalogCsvImporter::from_path(path)?
        }
        None => {
            println!("Catalog source: built-in starter catalog");
            starter_catalog()
        }
    };
    println!("Active badges: {}", definitions.len());
    catalog.seed(definitions);

    let service = Arc::new(AchievementService::new(
        metric_store.clone(),
        catalog,
        Arc::new(InMemoryAwardLedger::default()),
        Arc::new(InMemoryProgressionLedger::default()),
        notifier.clone(),
    ));

    let user = UserId("demo-user".to_string());
    metric_store.upsert(MetricSnapshot {
        user_id: user.clone(),
        templates_created,
        copies_received: 0,
        commands_generated: 0,
        likes_received,
        total_views: 0,
    });
    println!(
        "\nDemo user counters: {} template(s), {} like(s)",
        templates_created, likes_received
    );

    let outcomes = service.evaluate_and_award(&user).map_err(AppError::from)?;
    if outcomes.is_empty() {
        println!("No badges earned on this sweep");
    } else {
        println!("\nNewly earned badges");
        for outcome in &outcomes {
            println!(
                "- {} [{}] +{} XP{}",
                outcome.badge.name,
                outcome.badge.rarity.label(),
                outcome.badge.reward.xp_bonus,
                if outcome.record.featured {
                    " (featured)"
                } else {
                    ""
                }
            );
        }
    }

    let repeat = service.evaluate_and_award(&user).map_err(AppError::from)?;
    println!(
        "Second sweep with unchanged counters: {} new award(s)",
        repeat.len()
    );

    let progression = service.progression_state(&user).map_err(AppError::from)?;
    println!(
        "\nProgression: level {} with {} XP ({} XP to next level)",
        progression.level,
        progression.experience,
        progression.xp_to_next_level()
    );

    let summary = service.achievement_summary(&user).map_err(AppError::from)?;
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("\nAchievements payload:\n{}", json),
        Err(err) => println!("\nAchievements payload unavailable: {}", err),
    }

    let notices = notifier.notices();
    if notices.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications dispatched");
        for notice in notices {
            println!("- {} -> {}", notice.badge_name, notice.user_id);
        }
    }

    Ok(())
}
