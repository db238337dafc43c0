//! Drives concurrent alias creation against an in-memory store.
//!
//! Used for capacity planning: it shows how evenly the weighted selector
//! spreads load, how many calls lose a shard race, and how the store's
//! optimistic commit behaves under contention.

use core::time::Duration;
use futures::{StreamExt, stream};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use wordid::{AliasService, Error, MemoryStore, RandSource, ShardReport};

#[derive(Debug)]
pub struct SimulationResult {
    pub requested: usize,
    pub issued: usize,
    pub failures: BTreeMap<&'static str, usize>,
    pub conflicts: u64,
    pub duration: Duration,
    pub report: ShardReport,
}

impl SimulationResult {
    fn throughput(&self) -> f64 {
        self.issued as f64 / self.duration.as_secs_f64()
    }

    pub fn print(&self) {
        println!("\n=== Simulation Summary ===");
        println!(
            "{:>10} requested | {:>10} issued | {:>8.2} ms | {:>10.2} aliases/sec | {:>8} conflicts",
            self.requested,
            self.issued,
            self.duration.as_secs_f64() * 1000.0,
            self.throughput(),
            self.conflicts,
        );

        if !self.failures.is_empty() {
            println!("\n=== Failures ===");
            for (kind, n) in &self.failures {
                println!("{kind:<20} | {n:>10}");
            }
        }

        println!("\n=== Shard Fill ===");
        println!(
            "{:<8} | {:>12} | {:>16} | {:>15}",
            "Shard", "Used", "Remaining blocks", "Allocatable"
        );
        println!("{}", "-".repeat(60));
        for shard in &self.report.shards {
            println!(
                "{:<8} | {:>12} | {:>16} | {:>15}",
                shard.shard, shard.used, shard.remaining_blocks, shard.allocatable_ids
            );
        }
        println!("{}", "-".repeat(60));
        println!(
            "{:<8} | {:>12} | {:>16} | {:>15}",
            "total",
            self.report.used_ids(),
            "",
            self.report.allocatable_ids()
        );
    }
}

/// Short label for a failed creation, used to group failures.
fn failure_kind(err: &Error) -> &'static str {
    match err {
        Error::CapacityExhausted => "capacity exhausted",
        Error::ShardFull { .. } => "shard full",
        Error::TransientStore { .. } => "transient store",
        Error::SnapshotRead { .. } => "snapshot read",
        Error::DeadlineExceeded { .. } => "deadline exceeded",
        Error::AliasTaken { .. } => "alias taken",
        _ => "other",
    }
}

/// Creates `count` aliases with at most `concurrency` in flight.
///
/// The service's shards must already be initialized.
pub async fn simulate<R>(
    service: Arc<AliasService<MemoryStore, R>>,
    store: &MemoryStore,
    count: usize,
    concurrency: usize,
) -> anyhow::Result<SimulationResult>
where
    R: RandSource + Send + Sync + 'static,
{
    let start = Instant::now();

    let outcomes: Vec<_> = stream::iter(0..count)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.create_alias(&format!("target-{i}")).await })
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let duration = start.elapsed();

    let mut issued = 0;
    let mut failures = BTreeMap::new();
    for outcome in outcomes {
        match outcome? {
            Ok(_) => issued += 1,
            Err(e) => {
                tracing::warn!(error = %e, "alias creation failed");
                *failures.entry(failure_kind(&e)).or_insert(0) += 1;
            }
        }
    }

    Ok(SimulationResult {
        requested: count,
        issued,
        failures,
        conflicts: store.conflicts(),
        duration,
        report: service.shard_report().await?,
    })
}
