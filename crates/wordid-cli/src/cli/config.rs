use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use core::time::Duration;
use wordid::{Capacity, Config, DEFAULT_DELIMITER, DEFAULT_ROUND_KEYS};

/// Command-line arguments for the `wordid` operator tool.
///
/// Layout parameters are shared by every subcommand and must match the
/// deployment being inspected; all of them can be set from the environment
/// (or a `.env` file) so one configuration serves every invocation.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wordid",
    version,
    about = "Inspect and simulate word alias allocation"
)]
pub struct CliArgs {
    /// Size of the dense ID space.
    ///
    /// Environment variable: `WORDID_TOTAL_IDS`
    #[arg(long, env = "WORDID_TOTAL_IDS", default_value_t = Capacity::DEFAULT.total_ids())]
    pub total_ids: u64,

    /// Number of independent shard counters.
    ///
    /// Environment variable: `WORDID_SHARD_COUNT`
    #[arg(long, env = "WORDID_SHARD_COUNT", default_value_t = Capacity::DEFAULT.shard_count())]
    pub shard_count: usize,

    /// Granularity, in IDs, at which shard fill is sampled for weighting.
    ///
    /// Environment variable: `WORDID_BLOCK_SIZE`
    #[arg(long, env = "WORDID_BLOCK_SIZE", default_value_t = Capacity::DEFAULT.block_size())]
    pub block_size: u64,

    /// Comma-separated Feistel round keys. Uses the built-in keys when empty.
    ///
    /// Environment variable: `WORDID_ROUND_KEYS`
    #[arg(long, env = "WORDID_ROUND_KEYS", value_delimiter = ',')]
    pub round_keys: Vec<u64>,

    /// Separator placed between alias words.
    ///
    /// Environment variable: `WORDID_DELIMITER`
    #[arg(long, env = "WORDID_DELIMITER", default_value_t = DEFAULT_DELIMITER)]
    pub delimiter: char,

    /// Upper bound, in milliseconds, on a single alias operation.
    ///
    /// Environment variable: `WORDID_DEADLINE_MS`
    #[arg(long, env = "WORDID_DEADLINE_MS", default_value_t = 5_000)]
    pub deadline_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the derived capacity parameters.
    Capacity,

    /// Print the alias for a dense ID.
    Encode {
        /// Dense ID in `[0, total_ids)`.
        id: u64,
    },

    /// Recover the dense ID, shard and offset behind an alias.
    Decode {
        alias: String,
    },

    /// Allocate aliases against an in-memory store and report shard fill.
    Simulate {
        /// Number of aliases to create.
        #[arg(long, default_value_t = 10_000)]
        count: usize,

        /// Maximum in-flight allocations. Defaults to the number of CPUs.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Seed for reproducible shard selection.
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl CliArgs {
    /// Builds and validates the library configuration.
    pub fn config(&self) -> anyhow::Result<Config> {
        let capacity = Capacity::new(self.total_ids, self.shard_count, self.block_size)
            .context("invalid WORDID_TOTAL_IDS / WORDID_SHARD_COUNT / WORDID_BLOCK_SIZE")?;

        if self.deadline_ms == 0 {
            bail!("WORDID_DEADLINE_MS must be greater than 0");
        }

        let round_keys = if self.round_keys.is_empty() {
            DEFAULT_ROUND_KEYS.to_vec()
        } else {
            self.round_keys.clone()
        };

        let config = Config {
            capacity,
            round_keys,
            delimiter: self.delimiter,
            deadline: Duration::from_millis(self.deadline_ms),
        };
        config.validate()?;
        Ok(config)
    }
}
