use anyhow::Result;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use tri_additives_to_sqlite::{
    cli::{Cli, Commands},
    config::MainConfig,
    download::ensure_year_downloaded,
    enrich::{build_http_client, FrsClient, NaicsClient},
    filter::resolve_files,
    reference::{load_chemical_activities, seed_additives},
    schema::DependencyResolver,
    store::Store,
    transform::Enrichers,
    Orchestrator,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            year,
            config,
            db,
            data_dir,
            include,
            exclude,
            force,
            cache_dir,
        } => {
            let start = Instant::now();
            let config = MainConfig::load(&config)?;
            let files = resolve_files(include, exclude)?;

            // Credentials are checked before any file is touched
            let http = build_http_client(&config.enrichment)?;
            let enrichers = Enrichers {
                registry: Box::new(FrsClient::new(&config.frs_api, http.clone())),
                naics: Box::new(NaicsClient::from_env(&config.census_api, http)?),
                max_concurrency: config.enrichment.max_concurrent_requests,
            };

            let data_dir = match data_dir {
                Some(dir) => dir,
                None => {
                    ensure_year_downloaded(&config.tri_download, cache_dir, year, &files, force)
                        .await?
                }
            };

            let mut store = Store::open(&db)?;
            let summary = Orchestrator::new(&mut store, &config, &enrichers)
                .run_year(&data_dir, year, &files)
                .await?;
            store.finalize()?;

            println!("\n{}", summary);
            println!(
                "Wrote {:?} in {:.1}s",
                db,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Download {
            year,
            config,
            include,
            exclude,
            force,
            cache_dir,
        } => {
            let config = MainConfig::load(&config)?;
            let files = resolve_files(include, exclude)?;
            let path =
                ensure_year_downloaded(&config.tri_download, cache_dir, year, &files, force).await?;
            println!("TRI {} files available in {:?}", year, path);
        }

        Commands::InitDb { db } => {
            let store = Store::open(&db)?;
            store.finalize()?;
            info!(db = %db.display(), "Database initialized");
        }

        Commands::Seed { config, db } => {
            let config = MainConfig::load(&config)?;
            let mut store = Store::open(&db)?;
            {
                let tx = store.transaction()?;
                let additives = seed_additives(&tx, &config.plastic_additives.tri_chem_id)?;
                let activities =
                    load_chemical_activities(&tx, &config.tri_files.file_1b.needed_columns)?;
                tx.commit()?;
                println!(
                    "Created {} additives and {} chemical activities",
                    additives, activities.created
                );
            }
            store.finalize()?;
        }

        Commands::ListTables => {
            let resolver = DependencyResolver::new();
            let tables = resolver.creation_order().map_err(anyhow::Error::msg)?;
            println!("Tables in creation order:\n");
            for table in tables {
                let dependents = resolver.dependents_of(table.name);
                if dependents.is_empty() {
                    println!("  {}", table.name);
                } else {
                    println!("  {} (referenced by {})", table.name, dependents.join(", "));
                }
            }
        }
    }

    Ok(())
}
