mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use nird::{api::create_app, config::Settings, domain::UserRole};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

async fn login(app: &Router, email: &str) -> anyhow::Result<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    Ok(body["access_token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_health_and_auth_gate() -> anyhow::Result<()> {
    let ctx = Arc::new(setup().await?);
    user(&ctx, "alice", UserRole::Student).await?;
    let app = create_app(ctx.clone(), Arc::new(Settings::default()));

    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(&app, Method::GET, "/api/users/me/stats", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/users/me/stats", Some("not-a-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@school.test", "password": "wrong" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "alice@school.test").await?;
    let (status, body) = send(&app, Method::GET, "/api/users/me/stats", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_points"], 0);
    assert_eq!(body["level"]["level_name"], "Novice");

    // Public routes need no token.
    let (status, body) = send(&app, Method::GET, "/api/badges", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(|b| b.len()), Some(nird::domain::badge_catalog().len()));

    Ok(())
}

#[tokio::test]
async fn test_submit_and_review_over_http() -> anyhow::Result<()> {
    let ctx = Arc::new(setup().await?);
    user(&ctx, "teacher", UserRole::Teacher).await?;
    let (_alpha, _captain) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;
    let app = create_app(ctx.clone(), Arc::new(Settings::default()));

    let student = login(&app, "alpha-captain@school.test").await?;
    let teacher = login(&app, "teacher@school.test").await?;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/missions/{}/submit", m.id),
        Some(&student),
        Some(json!({})),
    )
    .await?;
    // The mission asks for a description.
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/missions/{}/submit", m.id),
        Some(&student),
        Some(json!({ "description": "We audited twelve machines" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let submission_id = body["id"].as_str().unwrap_or_default().to_string();
    let review_uri = format!("/api/submissions/{}/review", submission_id);

    let (status, _) = send(&app, Method::GET, "/api/submissions?status=pending", Some(&student), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/api/submissions?status=pending", Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(|s| s.len()), Some(1));

    let (status, _) = send(&app, Method::POST, &review_uri, Some(&student), Some(json!({ "status": "approved" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, &review_uri, Some(&teacher), Some(json!({ "status": "approved" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, _) = send(&app, Method::POST, &review_uri, Some(&teacher), Some(json!({ "status": "rejected" }))).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/api/leaderboard", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["entries"][0]["team_name"], "Alpha");
    assert_eq!(body["entries"][0]["total_points"], 100);

    let (status, body) = send(&app, Method::GET, "/api/notifications/unread/count", Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["count"].as_i64().unwrap_or_default() >= 1);

    let (status, body) = send(&app, Method::PUT, "/api/notifications/read-all", Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["updated"].as_u64().unwrap_or_default() >= 1);

    let (status, body) = send(&app, Method::GET, "/api/notifications/unread/count", Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    Ok(())
}

#[tokio::test]
async fn test_notification_read_and_delete_are_owner_only() -> anyhow::Result<()> {
    let ctx = Arc::new(setup().await?);
    let (alpha, captain) = team(&ctx, "Alpha").await?;
    let carol = user(&ctx, "carol", UserRole::Student).await?;
    ctx.team_service.add_member(captain.id, alpha.id, carol.id).await?;
    let app = create_app(ctx.clone(), Arc::new(Settings::default()));

    let carol_token = login(&app, "carol@school.test").await?;
    let captain_token = login(&app, "alpha-captain@school.test").await?;

    let (status, body) = send(&app, Method::GET, "/api/notifications", Some(&carol_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 1);
    let id = body["notifications"][0]["id"].as_str().unwrap_or_default().to_string();
    let read_uri = format!("/api/notifications/{}/read", id);
    let delete_uri = format!("/api/notifications/{}", id);

    // Someone else's notification looks missing and stays untouched.
    let (status, _) = send(&app, Method::PUT, &read_uri, Some(&captain_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &delete_uri, Some(&captain_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&carol_token), None).await?;
    assert_eq!(body["notifications"].as_array().map(|n| n.len()), Some(1));
    assert_eq!(body["notifications"][0]["is_read"], false);

    let (status, _) = send(&app, Method::PUT, &read_uri, Some(&carol_token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, Method::GET, "/api/notifications/unread/count", Some(&carol_token), None).await?;
    assert_eq!(body["count"], 0);

    let (status, _) = send(&app, Method::DELETE, &delete_uri, Some(&carol_token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &delete_uri, Some(&carol_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&carol_token), None).await?;
    assert_eq!(body["notifications"].as_array().map(|n| n.len()), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_leaderboard_rejects_oversized_day_window() -> anyhow::Result<()> {
    let ctx = Arc::new(setup().await?);
    let app = create_app(ctx.clone(), Arc::new(Settings::default()));

    let (status, body) = send(&app, Method::GET, "/api/leaderboard?days=100000000", None, None).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/leaderboard?days=3650", None, None).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}
