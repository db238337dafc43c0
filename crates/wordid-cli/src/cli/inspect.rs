use std::sync::Arc;

use wordid::{AliasService, AllocatedId, Capacity, Config, MemoryStore};

/// Prints the parameters derived from the configured layout.
pub fn print_capacity(config: &Config) {
    let capacity: &Capacity = &config.capacity;
    let usable = (capacity.blocks_per_shard() - 1) * capacity.block_size();

    println!("{:<22} | {:>20}", "Parameter", "Value");
    println!("{}", "-".repeat(45));
    println!("{:<22} | {:>20}", "total ids", capacity.total_ids());
    println!("{:<22} | {:>20}", "shards", capacity.shard_count());
    println!("{:<22} | {:>20}", "ids per shard", capacity.ids_per_shard());
    println!("{:<22} | {:>20}", "block size", capacity.block_size());
    println!("{:<22} | {:>20}", "blocks per shard", capacity.blocks_per_shard());
    println!(
        "{:<22} | {:>20}",
        "allocatable ids",
        usable * capacity.shard_count() as u64
    );
    println!("{:<22} | {:>20}", "cipher width (bits)", capacity.cipher_width());
    println!("{:<22} | {:>20}", "words per alias", capacity.words_per_alias());
}

/// Builds a service for the pure encode/decode paths. The store is never
/// touched by those calls.
pub fn offline_service(config: Config) -> anyhow::Result<AliasService<MemoryStore>> {
    Ok(AliasService::new(Arc::new(MemoryStore::new()), config)?)
}

/// The alias text for dense ID `id`.
pub fn encode(service: &AliasService<MemoryStore>, id: u64) -> anyhow::Result<String> {
    let id = AllocatedId::from_value(service.allocator().capacity(), id)?;
    Ok(service.alias_for(id)?.to_string())
}

/// The dense ID behind `alias`, with its shard and offset.
pub fn decode(service: &AliasService<MemoryStore>, alias: &str) -> anyhow::Result<AllocatedId> {
    Ok(service.inspect(alias)?)
}
