pub mod cache {

    /// Cached weather payloads are valid strictly less than this long.
    pub const FRESHNESS_MINUTES: i64 = 10;
}

pub mod limits {

    /// Recent searches surfaced in the history listing.
    pub const HISTORY_LIMIT: u64 = 5;

    pub const MIN_PASSWORD_LENGTH: usize = 8;
}

pub mod provider {

    pub const FORECAST_DAYS: u32 = 16;
}
