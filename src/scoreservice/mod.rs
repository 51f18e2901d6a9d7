use serde_json::Value;

use crate::{
    accounts::CurrentUser,
    database::{types::LeaderboardEntry, Database},
};

mod types;

pub use types::ScoreOutcome;

pub const LEADERBOARD_SIZE: usize = 10;

/// Pulls the `score` field out of a submitted payload.
///
/// Anything that isn't a usable integer counts as 0: missing fields, nulls,
/// non-numeric strings, arrays and objects. Fractions truncate toward zero,
/// numeric strings are parsed after trimming and booleans count as 1 and 0.
pub fn parse_submitted_score(payload: &Value) -> i64 {
    match payload.get("score") {
        Some(Value::Number(number)) => number.as_i64().unwrap_or_else(|| {
            match number.as_f64() {
                // saturating cast, NaN becomes 0
                Some(float) if float.is_finite() => float.trunc() as i64,
                _ => 0,
            }
        }),
        Some(Value::String(text)) => text.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Bool(flag)) => i64::from(*flag),
        _ => 0,
    }
}

/// Records `submitted` as the user's best score if it beats the stored one.
///
/// A user without a score record starts from 0; the record is only written
/// when the submission is a strict improvement.
pub fn apply_score<D: Database>(
    database: &D,
    user: &CurrentUser,
    submitted: i64,
) -> Result<ScoreOutcome, anyhow::Error> {
    let current_best = database.get_best_score(user.id)?.unwrap_or(0);

    if submitted <= current_best {
        return Ok(ScoreOutcome {
            best: current_best,
            new_record: false,
        });
    }

    if database.raise_best_score(user.id, submitted)? {
        log::info!(
            "New best score for {}: {} (was {})",
            user.username,
            submitted,
            current_best
        );
        return Ok(ScoreOutcome {
            best: submitted,
            new_record: true,
        });
    }

    // another writer got there first with something at least as good
    let best = database.get_best_score(user.id)?.unwrap_or(current_best);
    log::debug!(
        "Score {} for {} lost to a concurrent best of {}",
        submitted,
        user.username,
        best
    );
    Ok(ScoreOutcome {
        best,
        new_record: false,
    })
}

pub fn get_leaderboard<D: Database>(database: &D) -> Result<Vec<LeaderboardEntry>, anyhow::Error> {
    database.get_top_scores(LEADERBOARD_SIZE)
}
