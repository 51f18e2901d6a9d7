use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    error::{WebError, WebResult},
    page::IndexPage,
};
use crate::{
    accounts::{self, LoginOutcome, RegisterOutcome},
    appstate::AppState,
    database::{types::LeaderboardEntry, Database},
    scoreservice,
    session::Session,
};

const MISSING_FIELDS_MESSAGE: &str = "Username and password cannot be empty";
const USERNAME_TAKEN_MESSAGE: &str = "Username already exists, please choose another";
const REGISTERED_MESSAGE: &str = "Registration successful, you are now logged in!";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
const LOGGED_IN_MESSAGE: &str = "Login successful, let's play!";
const LOGGED_OUT_MESSAGE: &str = "You have been logged out";

#[derive(Deserialize, Default)]
pub(super) struct CredentialsForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub(super) struct SubmitScoreResponse {
    ok: bool,
    best: i64,
    new_record: bool,
    leaderboard: Vec<LeaderboardEntry>,
}

/// Persists the session and sends the browser back to the index page
fn redirect_home<D: Database + Send>(
    app_state: &AppState<D>,
    session: &Session,
) -> WebResult<Response> {
    let cookie = app_state.sessions.cookie_header(session)?;
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, HeaderValue::from_static("/")),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response())
}

pub(super) async fn index<D: Database + Send + 'static>(
    State(app_state): State<AppState<D>>,
    headers: HeaderMap,
) -> WebResult<Response> {
    let mut session = app_state.sessions.load(&headers);
    let flashes = session.take_flashes();
    let user = accounts::current_user(&app_state, &session).await?;
    let leaderboard = scoreservice::get_leaderboard(&*app_state.database.lock().await)?;

    let body = IndexPage {
        username: user.as_ref().map(|u| u.username.as_str()),
        flashes: &flashes,
        leaderboard: &leaderboard,
    }
    .render();

    let mut response = Html(body).into_response();
    if !flashes.is_empty() {
        // consumed flashes must not show up again
        let cookie = app_state.sessions.cookie_header(&session)?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

pub(super) async fn register<D: Database + Send + 'static>(
    State(app_state): State<AppState<D>>,
    headers: HeaderMap,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> WebResult<Response> {
    let mut session = app_state.sessions.load(&headers);
    let form = form.map(|Form(form)| form).unwrap_or_default();

    match accounts::register(&app_state, &form.username, &form.password).await? {
        RegisterOutcome::MissingFields => session.flash(MISSING_FIELDS_MESSAGE),
        RegisterOutcome::UsernameTaken => session.flash(USERNAME_TAKEN_MESSAGE),
        RegisterOutcome::Registered(user) => {
            session.log_in(user.id);
            session.flash(REGISTERED_MESSAGE);
        }
    }

    redirect_home(&app_state, &session)
}

pub(super) async fn login<D: Database + Send + 'static>(
    State(app_state): State<AppState<D>>,
    headers: HeaderMap,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> WebResult<Response> {
    let mut session = app_state.sessions.load(&headers);
    let form = form.map(|Form(form)| form).unwrap_or_default();

    match accounts::login(&app_state, &form.username, &form.password).await? {
        LoginOutcome::InvalidCredentials => session.flash(INVALID_CREDENTIALS_MESSAGE),
        LoginOutcome::LoggedIn(user) => {
            session.log_in(user.id);
            session.flash(LOGGED_IN_MESSAGE);
        }
    }

    redirect_home(&app_state, &session)
}

pub(super) async fn logout<D: Database + Send + 'static>(
    State(app_state): State<AppState<D>>,
    headers: HeaderMap,
) -> WebResult<Response> {
    let mut session = app_state.sessions.load(&headers);
    if let Some(user_id) = session.user_id {
        log::info!("User {} logged out", user_id);
    }
    session.log_out();
    session.flash(LOGGED_OUT_MESSAGE);

    redirect_home(&app_state, &session)
}

pub(super) async fn submit_score<D: Database + Send + 'static>(
    State(app_state): State<AppState<D>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> WebResult<Response> {
    let session = app_state.sessions.load(&headers);
    let user = accounts::current_user(&app_state, &session)
        .await?
        .ok_or(WebError::NotLoggedIn)?;

    let submitted = match payload {
        Ok(Json(value)) => scoreservice::parse_submitted_score(&value),
        Err(e) => {
            log::debug!("Unreadable score payload from {}: {}", user.username, e);
            0
        }
    };

    let (outcome, leaderboard) = {
        let database = app_state.database.lock().await;
        let outcome = scoreservice::apply_score(&*database, &user, submitted)?;
        (outcome, scoreservice::get_leaderboard(&*database)?)
    };

    // re-signing pushes the session expiry forward for active players
    let cookie = app_state.sessions.cookie_header(&session)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SubmitScoreResponse {
            ok: true,
            best: outcome.best,
            new_record: outcome.new_record,
            leaderboard,
        }),
    )
        .into_response())
}

pub(super) async fn health() -> &'static str {
    "OK"
}
