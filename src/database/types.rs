use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// One row of the leaderboard, as served to the page and the submit endpoint
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i64,
}
