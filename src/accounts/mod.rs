use anyhow::anyhow;

use crate::{appstate::AppState, database::Database, session::Session};

pub mod password;

/// The authenticated user behind a request
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, PartialEq)]
pub enum RegisterOutcome {
    Registered(CurrentUser),
    MissingFields,
    UsernameTaken,
}

#[derive(Debug, PartialEq)]
pub enum LoginOutcome {
    LoggedIn(CurrentUser),
    InvalidCredentials,
}

/// Resolves the session's user id into a user. Ids of users that no longer exist resolve to None.
pub async fn current_user<D: Database + Send>(
    app_state: &AppState<D>,
    session: &Session,
) -> Result<Option<CurrentUser>, anyhow::Error> {
    let Some(user_id) = session.user_id else {
        return Ok(None);
    };

    let user = app_state.database.lock().await.get_user_by_id(user_id)?;
    if user.is_none() {
        log::debug!("Session refers to unknown user {}", user_id);
    }

    Ok(user.map(|record| CurrentUser {
        id: record.id,
        username: record.username,
    }))
}

pub async fn register<D: Database + Send>(
    app_state: &AppState<D>,
    username: &str,
    password: &str,
) -> Result<RegisterOutcome, anyhow::Error> {
    let username = username.trim();
    let password = password.trim();

    if username.is_empty() || password.is_empty() {
        return Ok(RegisterOutcome::MissingFields);
    }

    // checked up front so a taken name doesn't cost a hash
    if app_state
        .database
        .lock()
        .await
        .get_user_by_username(username)?
        .is_some()
    {
        return Ok(RegisterOutcome::UsernameTaken);
    }

    let hasher = app_state.hasher.clone();
    let owned_password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&owned_password))
        .await
        .map_err(|e| anyhow!("password hashing task failed: {}", e))?;

    let created = app_state
        .database
        .lock()
        .await
        .create_user(username, &password_hash)?;

    Ok(match created {
        Some(record) => {
            log::info!("Registered user {} ({})", record.username, record.id);
            RegisterOutcome::Registered(CurrentUser {
                id: record.id,
                username: record.username,
            })
        }
        None => RegisterOutcome::UsernameTaken,
    })
}

pub async fn login<D: Database + Send>(
    app_state: &AppState<D>,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, anyhow::Error> {
    let username = username.trim();
    let attempt = password.trim().to_string();

    let record = app_state
        .database
        .lock()
        .await
        .get_user_by_username(username)?;

    // unknown users verify against a dummy hash so both failures take equally long
    let stored_hash = match &record {
        Some(record) => record.password_hash.clone(),
        None => app_state.hasher.dummy_hash(),
    };
    let verified =
        tokio::task::spawn_blocking(move || password::verify_password(&attempt, &stored_hash))
            .await
            .map_err(|e| anyhow!("password verification task failed: {}", e))?;

    let record = match record {
        Some(record) if verified => record,
        Some(record) => {
            log::debug!("Wrong password for {}", record.username);
            return Ok(LoginOutcome::InvalidCredentials);
        }
        None => {
            log::debug!("Login attempt for unknown user");
            return Ok(LoginOutcome::InvalidCredentials);
        }
    };

    log::info!("{} logged in", record.username);
    Ok(LoginOutcome::LoggedIn(CurrentUser {
        id: record.id,
        username: record.username,
    }))
}
