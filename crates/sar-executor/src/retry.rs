//! Retry backoff (spec §4.6, §9): "a simple doubling schedule starting at
//! `retryDelay`, capped at a small multiple" — deterministic given the same
//! inputs so tests stay reproducible, per spec's own requirement.

/// `retryDelay` default when a step declares `retry` without `retryDelay`.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// The cap on the doubling schedule: once `2^attempt_index` would exceed
/// this multiple of the base delay, the delay stops growing.
const MAX_BACKOFF_MULTIPLIER: u64 = 8;

/// The delay before the `attempt_index`-th retry (0 = first retry after the
/// initial attempt), given a step's base `retryDelay`.
pub fn backoff_delay_ms(base_ms: u64, attempt_index: u32) -> u64 {
    let multiplier = 1u64.checked_shl(attempt_index).unwrap_or(u64::MAX);
    base_ms.saturating_mul(multiplier.min(MAX_BACKOFF_MULTIPLIER))
}
