//! Weighted-random shard selection.
//!
//! A shard's chance of being picked is proportional to its remaining block
//! budget, so nearly-full shards are chosen less often and empty ones absorb
//! more traffic without any central coordinator.

use crate::{Capacity, Error, RandSource, Result};

/// Remaining block budget of a shard holding `used` IDs.
///
/// One block per shard is held back and never handed out by normal
/// allocation, leaving operators headroom before absolute exhaustion. The
/// result saturates at zero.
pub const fn remaining_blocks(used: u64, capacity: &Capacity) -> u64 {
    let used_blocks = used / capacity.block_size();
    capacity
        .blocks_per_shard()
        .saturating_sub(used_blocks)
        .saturating_sub(1)
}

/// Converts a snapshot of per-shard `used` counts into remaining block
/// budgets, ordered by shard index.
pub fn remaining_by_shard(counts: &[u64], capacity: &Capacity) -> Vec<u64> {
    counts
        .iter()
        .map(|&used| remaining_blocks(used, capacity))
        .collect()
}

/// Picks a shard by roulette-wheel sampling over `remaining`.
///
/// A value `x` is drawn uniformly from `[0, sum + 1)` and the shards are
/// walked in index order, subtracting each budget; the shard where `x` first
/// drops to zero or below wins. Shards with no budget are skipped entirely,
/// so the extra padding unit always lands on the first shard that still has
/// budget and never on an exhausted one.
///
/// # Errors
///
/// Returns [`Error::CapacityExhausted`] when every budget is zero.
pub fn select_shard<R>(remaining: &[u64], rand: &R) -> Result<usize>
where
    R: RandSource + ?Sized,
{
    let sum: u64 = remaining.iter().sum();
    if sum == 0 {
        return Err(Error::CapacityExhausted);
    }

    let mut x = rand.rand_below(sum + 1);
    for (shard, &budget) in remaining.iter().enumerate() {
        if budget == 0 {
            continue;
        }
        if x <= budget {
            return Ok(shard);
        }
        x -= budget;
    }

    // x < sum + 1, so the walk above always lands on a shard.
    Err(Error::CapacityExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeededRandom;

    /// Replays a fixed draw.
    struct Draw(u64);

    impl RandSource for Draw {
        fn rand_below(&self, upper: u64) -> u64 {
            assert!(self.0 < upper, "draw {} out of range {upper}", self.0);
            self.0
        }
    }

    fn frequencies(remaining: &[u64], draws: usize, seed: u64) -> Vec<usize> {
        let rand = SeededRandom::new(seed);
        let mut hits = vec![0; remaining.len()];
        for _ in 0..draws {
            hits[select_shard(remaining, &rand).unwrap()] += 1;
        }
        hits
    }

    #[test]
    fn reserves_one_block_per_shard() {
        let c = Capacity::new(8, 2, 1).unwrap();
        assert_eq!(remaining_blocks(0, &c), 3);
        assert_eq!(remaining_blocks(2, &c), 1);
        assert_eq!(remaining_blocks(3, &c), 0);
        assert_eq!(remaining_blocks(4, &c), 0);
        assert_eq!(remaining_blocks(100, &c), 0);
    }

    #[test]
    fn samples_fill_in_whole_blocks() {
        let c = Capacity::new(64, 2, 8).unwrap();
        assert_eq!(c.blocks_per_shard(), 4);
        assert_eq!(remaining_by_shard(&[0, 7, 8, 31], &c), vec![3, 3, 2, 0]);
    }

    #[test]
    fn exhausted_snapshot_fails_without_drawing() {
        struct NeverDraw;
        impl RandSource for NeverDraw {
            fn rand_below(&self, _: u64) -> u64 {
                panic!("must not draw when capacity is exhausted");
            }
        }
        assert_eq!(
            select_shard(&[0, 0, 0], &NeverDraw),
            Err(Error::CapacityExhausted)
        );
        assert_eq!(select_shard(&[], &NeverDraw), Err(Error::CapacityExhausted));
    }

    #[test]
    fn walk_boundaries() {
        let remaining = [3, 3];
        // The padding unit (x == 0) goes to the first shard with budget.
        assert_eq!(select_shard(&remaining, &Draw(0)), Ok(0));
        assert_eq!(select_shard(&remaining, &Draw(3)), Ok(0));
        assert_eq!(select_shard(&remaining, &Draw(4)), Ok(1));
        assert_eq!(select_shard(&remaining, &Draw(6)), Ok(1));
    }

    #[test]
    fn never_selects_a_shard_without_budget() {
        let remaining = [0, 2, 0, 1, 0];
        for x in 0..=3 {
            let shard = select_shard(&remaining, &Draw(x)).unwrap();
            assert!(remaining[shard] > 0, "draw {x} routed to empty shard {shard}");
        }
        assert_eq!(select_shard(&remaining, &Draw(0)), Ok(1));
        assert_eq!(select_shard(&remaining, &Draw(3)), Ok(3));
    }

    #[test]
    fn equal_budgets_split_evenly() {
        let hits = frequencies(&[3, 3], 40_000, 7);
        let share = hits[0] as f64 / 40_000.0;
        assert!((0.45..0.60).contains(&share), "share = {share}");
    }

    #[test]
    fn frequency_grows_with_budget() {
        let mut previous = 0;
        for budget in [1, 4, 16, 64] {
            let hits = frequencies(&[budget, 16, 16], 50_000, 11);
            assert!(
                hits[0] > previous,
                "budget {budget}: {} <= {previous}",
                hits[0]
            );
            previous = hits[0];
        }
    }
}
