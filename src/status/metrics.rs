//! Capacity and latency from a store's volume list

use crate::status::store::{StoreMetrics, Volume};

/// Largest block offset a volume can reach
pub const MAX_BLOCK_SIZE: u64 = u32::MAX as u64;

/// Block offsets count 8-byte aligned records
pub const PADDING: u64 = 8;

/// Reduce one store's volumes. The average delay is floored to whole
/// milliseconds and is `None` when no commands were processed.
pub fn aggregate(volumes: &[Volume]) -> StoreMetrics {
    let mut free_blocks: u64 = 0;
    let mut total_delay: u128 = 0;
    let mut processed: u128 = 0;
    let mut needles: u64 = 0;

    for v in volumes {
        free_blocks = free_blocks.saturating_add(MAX_BLOCK_SIZE.saturating_sub(v.block_offset));
        total_delay += u128::from(v.total_delay_nanos);
        processed += u128::from(v.total_commands_processed);
        needles = needles.saturating_add(v.needle_number);
    }

    let average_delay_ms = if processed > 0 {
        Some(u64::try_from(total_delay / (processed * 1000)).unwrap_or(u64::MAX))
    } else {
        None
    };

    StoreMetrics {
        used_bytes: PADDING.saturating_mul(free_blocks),
        total_bytes: PADDING
            .saturating_mul(volumes.len() as u64)
            .saturating_mul(MAX_BLOCK_SIZE),
        average_delay_ms,
        needle_count: needles,
    }
}
