//! Timestamp and identifier helpers.

/// Current unix time in seconds, 0 if the clock is before the epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Fresh opaque identifier (UUID v4).
pub fn new_id() -> String {
	uuid::Uuid::new_v4().to_string()
}

/// Shortens an id for log output: first 8 characters followed by `..`.
pub fn truncate_id(id: &str) -> String {
	if id.chars().count() <= 8 {
		id.to_string()
	} else {
		format!("{}..", id.chars().take(8).collect::<String>())
	}
}
