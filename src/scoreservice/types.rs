/// Result of applying a submitted score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// Authoritative best score after the submission
    pub best: i64,
    pub new_record: bool,
}
