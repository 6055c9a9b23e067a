/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Deadline `window_ms` after `now_unix_ms`, saturating at `u64::MAX`.
pub fn deadline_after_ms(now_unix_ms: u64, window_ms: u64) -> u64 {
    now_unix_ms.saturating_add(window_ms)
}

/// Returns true once `now_unix_ms` has reached `deadline_unix_ms`.
pub fn is_deadline_elapsed(deadline_unix_ms: u64, now_unix_ms: u64) -> bool {
    deadline_unix_ms <= now_unix_ms
}
