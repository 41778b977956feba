use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Current Unix time in fractional seconds, as carried by pong replies
pub fn unix_timestamp_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs_f64()
}
