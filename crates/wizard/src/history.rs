use std::time::{SystemTime, UNIX_EPOCH};

use super::ids::HistoryId;

/// One successful try-on, recorded newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: HistoryId,
    pub person_image: String,
    pub clothing_image: String,
    pub result_image: String,
    pub created_at_unix_seconds: u64,
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
