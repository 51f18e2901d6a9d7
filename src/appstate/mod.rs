use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    accounts::password::PasswordHasher,
    config::{Config, IN_MEMORY_DATABASE},
    database::{Database, DatabaseConnection, DatabaseConnectionCreater},
    session::SessionSigner,
};

pub struct AppState<D: Database + Send> {
    pub database: Arc<Mutex<D>>,
    pub sessions: Arc<SessionSigner>,
    pub(crate) hasher: Arc<PasswordHasher>,
}

impl<D: Database + Send> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            sessions: self.sessions.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

pub fn new_real_appstate(config: &Config) -> Result<AppState<DatabaseConnection>, anyhow::Error> {
    let creater = if config.database_path == IN_MEMORY_DATABASE {
        log::warn!("Using an in-memory database, nothing will survive a restart");
        DatabaseConnectionCreater::open_in_memory()
    } else {
        DatabaseConnectionCreater::open_else_new(&config.database_path)
    };

    Ok(AppState {
        database: Arc::new(Mutex::new(creater.start()?)),
        sessions: Arc::new(SessionSigner::new(
            &config.secret_key,
            chrono::Duration::days(config.session_lifetime_days),
        )),
        hasher: Arc::new(PasswordHasher::new(config.password_hash_iterations)),
    })
}

#[cfg(test)]
pub const TESTING_SECRET_KEY: &str = "mole-game-testing-secret";

#[cfg(test)]
pub fn new_testing_appstate() -> Result<AppState<DatabaseConnection>, anyhow::Error> {
    Ok(AppState {
        database: Arc::new(Mutex::new(
            DatabaseConnectionCreater::open_in_memory().start()?,
        )),
        sessions: Arc::new(SessionSigner::new(
            TESTING_SECRET_KEY,
            chrono::Duration::days(1),
        )),
        // keeps the tests fast
        hasher: Arc::new(PasswordHasher::new(1_000)),
    })
}
