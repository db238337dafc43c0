use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    AllocatedId, Allocator, Capacity, Error, MemoryStore, RandSource, Result, RetryPolicy,
    SeededRandom, ShardStore,
};

/// Reports a stale snapshot while delegating increments to the real store.
struct StaleSnapshot {
    counts: Vec<u64>,
    inner: MemoryStore,
}

impl ShardStore for StaleSnapshot {
    async fn initialize_shards(&self, shard_count: usize) -> Result<()> {
        self.inner.initialize_shards(shard_count).await
    }

    async fn read_all_counts(&self) -> Result<Vec<u64>> {
        Ok(self.counts.clone())
    }

    async fn try_increment(&self, shard: usize, capacity: u64) -> Result<u64> {
        self.inner.try_increment(shard, capacity).await
    }
}

/// Always draws the same value.
struct Draw(u64);

impl RandSource for Draw {
    fn rand_below(&self, upper: u64) -> u64 {
        self.0.min(upper - 1)
    }
}

fn tiny() -> Capacity {
    Capacity::new(8, 2, 1).unwrap()
}

async fn drain<S, R>(allocator: &Allocator<S, R>) -> (Vec<AllocatedId>, Error)
where
    S: ShardStore,
    R: RandSource + Send + Sync,
{
    let mut ids = Vec::new();
    loop {
        match allocator.allocate().await {
            Ok(id) => ids.push(id),
            Err(e) => return (ids, e),
        }
    }
}

#[test]
fn allocated_id_maps_into_shard_range() {
    let capacity = tiny();
    let id = AllocatedId::new(&capacity, 1, 2);
    assert_eq!(id.value(), 6);
    assert_eq!(id.shard(), 1);
    assert_eq!(id.offset(), 2);
    assert_eq!(AllocatedId::from_value(&capacity, 6).unwrap(), id);
    assert_eq!(id.to_string(), "6");
}

#[tokio::test]
async fn small_space_fills_both_shards_then_exhausts() {
    let store = Arc::new(MemoryStore::new());
    let allocator = Allocator::with_rand(Arc::clone(&store), tiny(), SeededRandom::new(1));
    allocator.initialize().await.unwrap();
    assert_eq!(store.read_all_counts().await.unwrap(), vec![0, 0]);

    let (ids, err) = drain(&allocator).await;
    assert_eq!(err, Error::CapacityExhausted);

    // One block per shard is held back: 3 of the 4 IDs in each shard.
    let values: HashSet<u64> = ids.iter().map(AllocatedId::value).collect();
    assert_eq!(values, HashSet::from([0, 1, 2, 4, 5, 6]));
    assert_eq!(store.read_all_counts().await.unwrap(), vec![3, 3]);

    // Exhaustion is sticky.
    for _ in 0..3 {
        assert_eq!(allocator.allocate().await, Err(Error::CapacityExhausted));
    }
}

#[tokio::test]
async fn a_full_shard_routes_all_traffic_to_the_other() {
    let store = Arc::new(MemoryStore::with_counts([3, 0]));
    let allocator = Allocator::with_rand(Arc::clone(&store), tiny(), SeededRandom::new(9));

    for expected in 4..7 {
        let id = allocator.allocate().await.unwrap();
        assert_eq!(id.shard(), 1);
        assert_eq!(id.value(), expected);
    }
    assert_eq!(allocator.allocate().await, Err(Error::CapacityExhausted));
}

#[tokio::test]
async fn exhausted_snapshot_fails_before_touching_counters() {
    let store = Arc::new(MemoryStore::with_counts([3, 4]));
    let allocator = Allocator::new(Arc::clone(&store), tiny());

    assert_eq!(allocator.allocate().await, Err(Error::CapacityExhausted));
    assert_eq!(store.read_all_counts().await.unwrap(), vec![3, 4]);
}

#[tokio::test]
async fn lost_race_is_reported_without_fallback() {
    // The snapshot claims both shards are empty, but shard 0 is actually full.
    let store = Arc::new(StaleSnapshot {
        counts: vec![0, 0],
        inner: MemoryStore::with_counts([4, 0]),
    });
    let allocator = Allocator::with_rand(Arc::clone(&store), tiny(), Draw(0));

    assert_eq!(
        allocator.allocate().await,
        Err(Error::ShardFull { shard: 0 })
    );
    assert_eq!(
        store.inner.read_all_counts().await.unwrap(),
        vec![4, 0],
        "no other shard may be tried"
    );
}

#[tokio::test]
async fn snapshot_failures_allocate_nothing() {
    let store = Arc::new(MemoryStore::with_counts([0, 0]));
    store.fail_reads(true);
    let allocator = Allocator::new(Arc::clone(&store), tiny());

    assert!(matches!(
        allocator.allocate().await,
        Err(Error::SnapshotRead { .. })
    ));
    store.fail_reads(false);
    assert_eq!(store.read_all_counts().await.unwrap(), vec![0, 0]);
}

#[tokio::test]
async fn uninitialized_store_is_a_snapshot_failure() {
    let allocator = Allocator::new(Arc::new(MemoryStore::new()), tiny());
    assert_eq!(
        allocator.allocate().await,
        Err(Error::SnapshotRead {
            reason: "expected 2 shards, found 0".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn transient_store_failures_surface() {
    let store = Arc::new(MemoryStore::with_counts([0, 0]).with_retry_policy(RetryPolicy {
        max_attempts: 2,
        ..RetryPolicy::default()
    }));
    store.inject_conflicts(2);
    let allocator = Allocator::with_rand(Arc::clone(&store), tiny(), Draw(0));

    assert_eq!(
        allocator.allocate().await,
        Err(Error::TransientStore {
            shard: 0,
            attempts: 2
        })
    );
    assert_eq!(store.read_all_counts().await.unwrap(), vec![0, 0]);

    // The next call goes through once the conflicts have drained.
    assert_eq!(allocator.allocate().await.unwrap().value(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_allocations_are_unique() {
    // 8 shards of 512 IDs in blocks of 8: 63 usable blocks, 504 IDs each.
    let capacity = Capacity::new(4096, 8, 8).unwrap();
    let store = Arc::new(MemoryStore::new().with_retry_policy(RetryPolicy {
        max_attempts: 10_000,
        ..RetryPolicy::default()
    }));
    let allocator = Arc::new(Allocator::new(Arc::clone(&store), capacity));
    allocator.initialize().await.unwrap();

    let tasks: Vec<_> = (0..2_000)
        .map(|_| {
            let allocator = Arc::clone(&allocator);
            tokio::spawn(async move { allocator.allocate().await })
        })
        .collect();

    let mut seen = HashSet::new();
    for task in tasks {
        let id = task.await.unwrap().unwrap();
        assert!(id.value() < capacity.total_ids());
        assert!(capacity.shard_range(id.shard()).contains(&id.value()));
        assert!(seen.insert(id.value()), "duplicate id {id}");
    }
    assert_eq!(seen.len(), 2_000);

    let counts = store.read_all_counts().await.unwrap();
    assert_eq!(counts.iter().sum::<u64>(), 2_000);
    assert!(counts.iter().all(|&used| used <= capacity.shard_capacity()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_drain_never_overfills_a_shard() {
    let capacity = Capacity::new(256, 4, 4).unwrap();
    let store = Arc::new(MemoryStore::new().with_retry_policy(RetryPolicy {
        max_attempts: 10_000,
        ..RetryPolicy::default()
    }));
    let allocator = Arc::new(Allocator::new(Arc::clone(&store), capacity));
    allocator.initialize().await.unwrap();

    let tasks: Vec<_> = (0..400)
        .map(|_| {
            let allocator = Arc::clone(&allocator);
            tokio::spawn(async move { allocator.allocate().await })
        })
        .collect();

    let mut seen = HashSet::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(id) => assert!(seen.insert(id.value())),
            Err(Error::CapacityExhausted | Error::ShardFull { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let counts = store.read_all_counts().await.unwrap();
    assert_eq!(counts.iter().sum::<u64>(), seen.len() as u64);
    assert!(counts.iter().all(|&used| used <= capacity.shard_capacity()));
}

#[tokio::test]
async fn shard_report_tracks_fill() {
    let store = Arc::new(MemoryStore::with_counts([0, 2, 3]));
    let capacity = Capacity::new(12, 3, 1).unwrap();
    let allocator = Allocator::new(store, capacity);

    let report = allocator.shard_report().await.unwrap();
    assert_eq!(report.used_ids(), 5);
    assert_eq!(report.allocatable_ids(), 3 + 1);
    assert_eq!(report.shards[0].remaining_blocks, 3);
    assert_eq!(report.shards[1].remaining_blocks, 1);
    assert!(report.shards[2].is_exhausted());
    assert!(!report.is_exhausted());
}
