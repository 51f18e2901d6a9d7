use rusqlite::{ErrorCode, OptionalExtension};
use types::{LeaderboardEntry, UserRecord};

pub mod types;

pub trait Database {
    // Creates a user along with a zeroed score record. Returns None if the username is taken
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserRecord>, anyhow::Error>;

    // Gets a user by id
    fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, anyhow::Error>;

    // Gets a user by username
    fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, anyhow::Error>;

    // Gets the stored best score for a user, None if the user has no score record yet
    fn get_best_score(&self, user_id: i64) -> Result<Option<i64>, anyhow::Error>;

    // Stores the score as the user's best only if strictly greater, creating the record if
    // missing. Returns whether a write happened. Must be a single atomic statement
    fn raise_best_score(&self, user_id: i64, score: i64) -> Result<bool, anyhow::Error>;

    // Gets the highest scores, best first, ties broken by username
    fn get_top_scores(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, anyhow::Error>;
}

#[derive(Default, Debug)]
pub struct DatabaseConnectionCreater {
    file_path: Option<String>,
}

pub struct DatabaseConnection {
    connection: rusqlite::Connection,
}

impl DatabaseConnectionCreater {
    pub fn open_else_new(file_path: &str) -> Self {
        Self {
            file_path: Some(file_path.to_string()),
        }
    }

    pub fn open_in_memory() -> Self {
        Self::default()
    }

    fn initialize_tables_if_needed(
        dbconn: DatabaseConnection,
    ) -> Result<DatabaseConnection, anyhow::Error> {
        let statement = r#"
PRAGMA foreign_keys = ON;
CREATE TABLE IF NOT EXISTS "users" (
  "ID"              INTEGER PRIMARY KEY AUTOINCREMENT,
  "USERNAME"        TEXT NOT NULL UNIQUE,
  "PASSWORD_HASH"   TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS "scores" (
  "ID"          INTEGER PRIMARY KEY AUTOINCREMENT,
  "USER_ID"     INTEGER NOT NULL UNIQUE REFERENCES "users"("ID"),
  "BEST_SCORE"  INTEGER NOT NULL DEFAULT 0
);
"#;
        dbconn.connection.execute_batch(statement)?;
        Ok(dbconn)
    }

    pub fn start(self) -> Result<DatabaseConnection, anyhow::Error> {
        let connection = match self.file_path {
            Some(path) => DatabaseConnection {
                connection: rusqlite::Connection::open(path)?,
            },
            None => DatabaseConnection {
                connection: rusqlite::Connection::open_in_memory()?,
            },
        };

        Self::initialize_tables_if_needed(connection)
    }
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

impl Database for DatabaseConnection {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserRecord>, anyhow::Error> {
        let transaction = self.connection.unchecked_transaction()?;

        let inserted = transaction.execute(
            r#"INSERT INTO users (USERNAME, PASSWORD_HASH) VALUES (?, ?);"#,
            (username, password_hash),
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                log::debug!("Username {} already exists", username);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let user_id = transaction.last_insert_rowid();
        transaction.execute(
            r#"INSERT INTO scores (USER_ID, BEST_SCORE) VALUES (?, 0);"#,
            (user_id,),
        )?;
        transaction.commit()?;

        Ok(Some(UserRecord {
            id: user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        }))
    }

    fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, anyhow::Error> {
        let mut statement = self.connection.prepare(
            r#"SELECT ID, USERNAME, PASSWORD_HASH FROM users WHERE ID = ? LIMIT 1;"#,
        )?;
        Ok(statement
            .query_row((user_id,), user_from_row)
            .optional()?)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, anyhow::Error> {
        let mut statement = self.connection.prepare(
            r#"SELECT ID, USERNAME, PASSWORD_HASH FROM users WHERE USERNAME = ? LIMIT 1;"#,
        )?;
        Ok(statement
            .query_row((username,), user_from_row)
            .optional()?)
    }

    fn get_best_score(&self, user_id: i64) -> Result<Option<i64>, anyhow::Error> {
        let mut statement = self
            .connection
            .prepare(r#"SELECT BEST_SCORE FROM scores WHERE USER_ID = ? LIMIT 1;"#)?;
        Ok(statement
            .query_row((user_id,), |row| row.get(0))
            .optional()?)
    }

    fn raise_best_score(&self, user_id: i64, score: i64) -> Result<bool, anyhow::Error> {
        let statement = r#"
INSERT INTO scores (USER_ID, BEST_SCORE) VALUES (?1, ?2)
ON CONFLICT(USER_ID) DO UPDATE SET BEST_SCORE = excluded.BEST_SCORE
WHERE scores.BEST_SCORE < excluded.BEST_SCORE;
"#;
        let changed = self.connection.execute(statement, (user_id, score))?;
        Ok(changed > 0)
    }

    fn get_top_scores(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, anyhow::Error> {
        let mut statement = self.connection.prepare(
            r#"
SELECT users.USERNAME, scores.BEST_SCORE FROM scores
JOIN users ON users.ID = scores.USER_ID
ORDER BY scores.BEST_SCORE DESC, users.USERNAME ASC
LIMIT ?;
"#,
        )?;
        let entries = statement
            .query_map((limit as i64,), |row| {
                Ok(LeaderboardEntry {
                    username: row.get(0)?,
                    score: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
