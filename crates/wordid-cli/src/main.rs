//! # `wordid` operator tool
//!
//! Capacity planning and diagnostics for [`wordid`] deployments.
//!
//! ## Usage
//!
//! ```bash
//! wordid capacity
//! wordid encode 42
//! wordid decode babi-kozu-tapa
//! wordid --total-ids 1048576 --shard-count 16 --block-size 256 simulate --count 100000
//! ```
//!
//! Layout flags can also be supplied as `WORDID_*` environment variables or
//! through a `.env` file in the working directory.

mod cli;

use clap::Parser;
use cli::{
    config::{CliArgs, Command},
    inspect, simulate,
    telemetry::init_tracing,
};
use std::sync::Arc;
use wordid::{AliasService, Config, MemoryStore, RandSource, SeededRandom, ThreadRandom};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = args.config()?;

    init_tracing();
    log_startup_info(&config);

    match args.command {
        Command::Capacity => inspect::print_capacity(&config),
        Command::Encode { id } => {
            let service = inspect::offline_service(config)?;
            println!("{}", inspect::encode(&service, id)?);
        }
        Command::Decode { alias } => {
            let service = inspect::offline_service(config)?;
            let id = inspect::decode(&service, &alias)?;
            println!("{:<8} | {:>20}", "id", id.value());
            println!("{:<8} | {:>20}", "shard", id.shard());
            println!("{:<8} | {:>20}", "offset", id.offset());
        }
        Command::Simulate {
            count,
            concurrency,
            seed,
        } => {
            let concurrency = concurrency.unwrap_or_else(num_cpus::get);
            match seed {
                Some(seed) => {
                    run_simulation(config, SeededRandom::new(seed), count, concurrency).await?;
                }
                None => run_simulation(config, ThreadRandom, count, concurrency).await?,
            }
        }
    }

    Ok(())
}

fn log_startup_info(config: &Config) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting with full config: {:#?}", config);
    } else {
        tracing::debug!(
            total_ids = config.capacity.total_ids(),
            shards = config.capacity.shard_count(),
            "Starting"
        );
    }
}

async fn run_simulation<R>(
    config: Config,
    rand: R,
    count: usize,
    concurrency: usize,
) -> anyhow::Result<()>
where
    R: RandSource + Send + Sync + 'static,
{
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(AliasService::with_rand(Arc::clone(&store), config, rand)?);
    service.initialize().await?;

    tracing::info!(count, concurrency, "Starting simulation");
    let result = simulate::simulate(service, &store, count, concurrency).await?;
    result.print();
    Ok(())
}
