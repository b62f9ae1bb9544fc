use crate::time::format_elapsed_seconds;

/// One entry on a quiz leaderboard, read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub player_name: String,
    pub score: i64,
    pub duration_ms: i64,
    /// Service timestamp (RFC 3339) when the entry was recorded.
    pub created_at: Option<String>,
}

impl LeaderboardRow {
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        format_elapsed_seconds(self.duration_ms)
    }
}
