/// Wall-clock milliseconds since the unix epoch.
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Whole days in milliseconds.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;
