use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::create_router;
use crate::{
    appstate::{new_testing_appstate, AppState},
    database::DatabaseConnection,
};

async fn send(app_state: &AppState<DatabaseConnection>, request: Request<Body>) -> Response<Body> {
    create_router(app_state.clone())
        .oneshot(request)
        .await
        .expect("router never fails")
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("can read body");
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("body is json")
}

/// The `name=value` part of the response's Set-Cookie header
fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets the session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_index(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(
    app_state: &AppState<DatabaseConnection>,
    username: &str,
    password: &str,
) -> String {
    let response = send(
        app_state,
        form_post(
            "/register",
            &format!("username={}&password={}", username, password),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    session_cookie(&response)
}

async fn submit(app_state: &AppState<DatabaseConnection>, cookie: &str, score: Value) -> Value {
    let response = send(
        app_state,
        json_post("/submit_score", &score.to_string(), Some(cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_health() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    let response = send(
        &app_state,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_anonymous_index() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    let response = send(&app_state, get_index(None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains("data-logged-in=\"false\""));
    assert!(html.contains("No scores yet"));
}

#[tokio::test]
async fn test_register_logs_in_and_flashes_once() {
    let app_state = new_testing_appstate().expect("can create test appstate");

    let response = send(
        &app_state,
        form_post("/register", "username=alice&password=hunter2", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    let cookie = session_cookie(&response);

    let response = send(&app_state, get_index(Some(&cookie))).await;
    let cookie = session_cookie(&response);
    let html = body_text(response).await;
    assert!(html.contains("Logged in as <strong>alice</strong>"));
    assert!(html.contains("Registration successful"));
    assert!(html.contains("<span class=\"username\">alice</span> <span class=\"score\">0</span>"));

    let response = send(&app_state, get_index(Some(&cookie))).await;
    let html = body_text(response).await;
    assert!(html.contains("Logged in as <strong>alice</strong>"));
    assert!(!html.contains("Registration successful"));
}

#[tokio::test]
async fn test_register_validation_flashes() {
    let app_state = new_testing_appstate().expect("can create test appstate");

    let bodies = [
        "username=&password=pw",
        "username=alice&password=+++",
        "",
        "username=alice",
    ];
    for body in bodies {
        let response = send(&app_state, form_post("/register", body, None)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let cookie = session_cookie(&response);

        let html = body_text(send(&app_state, get_index(Some(&cookie))).await).await;
        assert!(html.contains("Username and password cannot be empty"), "body {:?}", body);
        assert!(html.contains("data-logged-in=\"false\""));
    }

    // not a form at all
    let response = send(
        &app_state,
        json_post("/register", r#"{"username":"alice","password":"pw"}"#, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let html = body_text(send(&app_state, get_index(Some(&session_cookie(&response)))).await).await;
    assert!(html.contains("Username and password cannot be empty"));
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    register(&app_state, "alice", "first").await;

    let response = send(
        &app_state,
        form_post("/register", "username=alice&password=second", None),
    )
    .await;
    let cookie = session_cookie(&response);
    let html = body_text(send(&app_state, get_index(Some(&cookie))).await).await;

    assert!(html.contains("Username already exists"));
    assert!(html.contains("data-logged-in=\"false\""));

    // the first password still works, the second one never took
    let response = send(
        &app_state,
        form_post("/login", "username=alice&password=first", None),
    )
    .await;
    let html = body_text(send(&app_state, get_index(Some(&session_cookie(&response)))).await).await;
    assert!(html.contains("Logged in as <strong>alice</strong>"));
}

#[tokio::test]
async fn test_login_and_logout() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    register(&app_state, "alice", "hunter2").await;

    for body in ["username=alice&password=wrong", "username=bob&password=hunter2"] {
        let response = send(&app_state, form_post("/login", body, None)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let html =
            body_text(send(&app_state, get_index(Some(&session_cookie(&response)))).await).await;
        assert!(html.contains("Invalid username or password"));
        assert!(html.contains("data-logged-in=\"false\""));
    }

    let response = send(
        &app_state,
        form_post("/login", "username=alice&password=hunter2", None),
    )
    .await;
    let logged_in = session_cookie(&response);
    let html = body_text(send(&app_state, get_index(Some(&logged_in))).await).await;
    assert!(html.contains("Login successful"));
    assert!(html.contains("Logged in as <strong>alice</strong>"));

    let response = send(&app_state, form_post("/logout", "", Some(&logged_in))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let logged_out = session_cookie(&response);
    let html = body_text(send(&app_state, get_index(Some(&logged_out))).await).await;
    assert!(html.contains("You have been logged out"));
    assert!(html.contains("data-logged-in=\"false\""));

    let response = send(
        &app_state,
        json_post("/submit_score", r#"{"score": 10}"#, Some(&logged_out)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submit_requires_login() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    let cookie = register(&app_state, "alice", "hunter2").await;
    submit(&app_state, &cookie, json!({ "score": 20 })).await;

    for cookie in [None, Some("session=forged.token.value")] {
        let response = send(
            &app_state,
            json_post("/submit_score", r#"{"score": 999}"#, cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": false, "message": "Please log in first" })
        );
    }

    let body = submit(&app_state, &cookie, json!({ "score": 0 })).await;
    assert_eq!(body["best"], 20);
    assert_eq!(body["leaderboard"], json!([{ "username": "alice", "score": 20 }]));
}

#[tokio::test]
async fn test_alice_scenario_over_http() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    let cookie = register(&app_state, "alice", "hunter2").await;

    let body = submit(&app_state, &cookie, json!({ "score": 50 })).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["best"], 50);
    assert_eq!(body["new_record"], true);

    let body = submit(&app_state, &cookie, json!({ "score": 30 })).await;
    assert_eq!(body["best"], 50);
    assert_eq!(body["new_record"], false);

    let body = submit(&app_state, &cookie, json!({ "score": 75 })).await;
    assert_eq!(body["best"], 75);
    assert_eq!(body["new_record"], true);
    assert_eq!(body["leaderboard"], json!([{ "username": "alice", "score": 75 }]));

    let html = body_text(send(&app_state, get_index(Some(&cookie))).await).await;
    assert!(html.contains("<span class=\"username\">alice</span> <span class=\"score\">75</span>"));
}

#[tokio::test]
async fn test_submit_renews_session_cookie() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    let cookie = register(&app_state, "alice", "hunter2").await;

    let response = send(
        &app_state,
        json_post("/submit_score", r#"{"score": 10}"#, Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = session_cookie(&response);
    assert!(renewed.starts_with("session="));

    let body = submit(&app_state, &renewed, json!({ "score": 15 })).await;
    assert_eq!(body["best"], 15);
    assert_eq!(body["new_record"], true);
}

#[tokio::test]
async fn test_malformed_payloads_count_as_zero() {
    let app_state = new_testing_appstate().expect("can create test appstate");
    let cookie = register(&app_state, "alice", "hunter2").await;

    let body = submit(&app_state, &cookie, json!({})).await;
    assert_eq!(body["best"], 0);
    assert_eq!(body["new_record"], false);

    let body = submit(&app_state, &cookie, json!({ "score": "lots" })).await;
    assert_eq!(body["new_record"], false);

    let response = send(
        &app_state,
        json_post("/submit_score", "not json at all", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["best"], 0);
    assert_eq!(body["new_record"], false);

    let body = submit(&app_state, &cookie, json!({ "score": "12" })).await;
    assert_eq!(body["best"], 12);
    assert_eq!(body["new_record"], true);
}

#[tokio::test]
async fn test_leaderboard_order_over_http() {
    let app_state = new_testing_appstate().expect("can create test appstate");

    for (name, score) in [("carol", 40), ("bob", 90), ("alice", 40)] {
        let cookie = register(&app_state, name, "pw").await;
        submit(&app_state, &cookie, json!({ "score": score })).await;
    }
    let cookie = register(&app_state, "dave", "pw").await;
    let body = submit(&app_state, &cookie, json!({ "score": 5 })).await;

    assert_eq!(
        body["leaderboard"],
        json!([
            { "username": "bob", "score": 90 },
            { "username": "alice", "score": 40 },
            { "username": "carol", "score": 40 },
            { "username": "dave", "score": 5 },
        ])
    );
}
