use chrono::Utc;

/// Current Unix time in milliseconds, used as the default report name suffix.
pub fn unix_millis_suffix() -> String {
    Utc::now().timestamp_millis().to_string()
}
