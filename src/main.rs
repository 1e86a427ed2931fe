//! batchsearch-rs: runs the batch searches of a submission file
//!
//! Usage: `batchsearch-rs [FILE]`, where FILE holds a JSON array of batch
//! searches (default `batches.json`). Final states and results are printed
//! to stdout as JSON.

use anyhow::{Context, Result};
use batchsearch_rs::{
    config::{self, ConfigSource},
    BatchSearch, BatchSearchRepository, DefaultTaskFactory, ElasticsearchIndexer, Indexer,
    MemoryRepository, Monitorable, TaskFactory, User,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration before logging so debug can raise the level
    let settings = config::load()?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting batchsearch-rs v{}", batchsearch_rs::VERSION);

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("batches.json"));
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read batch searches from {}", path.display()))?;
    let submitted: Vec<BatchSearch> = serde_json::from_str(&content)
        .with_context(|| format!("invalid batch searches in {}", path.display()))?;
    info!("Loaded {} batch searches from {}", submitted.len(), path.display());

    let repository = Arc::new(MemoryRepository::new());
    for batch in &submitted {
        repository.save(batch.clone())?;
    }

    let indexer: Arc<dyn Indexer> = Arc::new(ElasticsearchIndexer::new(&settings.elasticsearch)?);
    info!("Index client initialized for {}", settings.elasticsearch.address);

    let config: Arc<dyn ConfigSource> = Arc::new(settings.clone());
    let factory = DefaultTaskFactory::new(indexer, repository.clone(), config);
    let user = User::new(settings.general.default_user.clone());
    let runner = Arc::new(factory.create_batch_search_runner(user));

    let worker = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.run_all().await })
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    while !worker.is_finished() {
        ticker.tick().await;
        info!("progress: {:.0}%", runner.progress_rate() * 100.0);
    }
    let total = worker.await??;
    info!("Saved {} results", total);

    for batch in repository.all()? {
        let results = repository.results(&batch.id)?;
        println!(
            "{}",
            serde_json::json!({
                "id": batch.id,
                "name": batch.name,
                "state": batch.state,
                "queries": batch.queries,
                "results": results,
            })
        );
    }

    match Arc::try_unwrap(runner) {
        Ok(runner) => runner.close().await?,
        Err(_) => {
            warn!("runner still shared, closing the store only");
            repository.close().await?;
        }
    }
    Ok(())
}
