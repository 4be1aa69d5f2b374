mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, TestApp, STRONG_PASSWORD};
use serde_json::Value;

fn emails(users: &Value) -> Vec<String> {
    users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_pending_listing_served_from_cache_within_ttl() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;
    app.signup("first@corp.com").await;

    let first = body_json(app.get("/admin/pending-users", Some(&cookie)).await).await;
    assert_eq!(first["fromCache"], false);
    assert_eq!(emails(&first["users"]), vec!["first@corp.com"]);

    app.clock.advance(Duration::seconds(10));
    app.signup("second@corp.com").await;

    let second = body_json(app.get("/admin/pending-users", Some(&cookie)).await).await;
    assert_eq!(second["fromCache"], true);
    assert_eq!(second["users"], first["users"]);

    app.clock.advance(Duration::seconds(20));
    let third = body_json(app.get("/admin/pending-users", Some(&cookie)).await).await;
    assert_eq!(third["fromCache"], false);
    assert_eq!(
        emails(&third["users"]),
        vec!["second@corp.com", "first@corp.com"]
    );
}

#[tokio::test]
async fn test_pending_listing_not_invalidated_by_approval() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;
    app.signup("a@corp.com").await;

    let before = body_json(app.get("/admin/pending-users", Some(&cookie)).await).await;
    let pending_id = before["users"][0]["id"].as_str().unwrap().to_string();

    let res = app
        .post_json(
            "/admin/approve-user",
            serde_json::json!({ "userId": pending_id }),
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let after = body_json(app.get("/admin/pending-users", Some(&cookie)).await).await;
    assert_eq!(after["fromCache"], true);
    assert_eq!(after["users"], before["users"]);
}

#[tokio::test]
async fn test_detailed_users_lists_accounts_without_passwords() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;
    app.seed_account("worker@corp.com", STRONG_PASSWORD, false, false);

    let res = app.get("/admin/detailed-users", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(
        emails(&body["users"]),
        vec!["admin@corp.com", "worker@corp.com"]
    );
    for user in body["users"].as_array().unwrap() {
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
    }
    assert_eq!(body["users"][1]["isActive"], false);
}

#[tokio::test]
async fn test_active_users_reflect_recent_sessions() {
    let app = TestApp::new().await;
    app.seed_account("worker@corp.com", STRONG_PASSWORD, false, true);
    app.session_cookie("worker@corp.com", STRONG_PASSWORD).await;

    app.clock.advance(Duration::minutes(16));
    let cookie = app.admin_cookie().await;

    let body = body_json(app.get("/admin/active-users", Some(&cookie)).await).await;
    assert_eq!(emails(&body["users"]), vec!["admin@corp.com"]);
}

#[tokio::test]
async fn test_user_stats_counts_active_accounts() {
    let app = TestApp::new().await;
    app.seed_account("worker@corp.com", STRONG_PASSWORD, false, true);
    app.seed_account("idle@corp.com", STRONG_PASSWORD, false, false);
    app.signup("pending@corp.com").await;
    let cookie = app.admin_cookie().await;

    let res = app.get("/admin/user-stats", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalUsers"], 2);
    assert_eq!(body["data"]["activeUsers"], 1);
    assert_eq!(body["data"]["usersByAccessLevel"]["leadership"], 2);
}

#[tokio::test]
async fn test_search_spans_registrations_and_accounts() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;
    app.seed_account("worker@corp.com", STRONG_PASSWORD, false, false);
    app.signup("ada@corp.com").await;

    let all = body_json(app.get("/admin/search-users?query=CORP", Some(&cookie)).await).await;
    assert_eq!(all["users"].as_array().unwrap().len(), 3);

    let pending =
        body_json(app.get("/admin/search-users?query=corp&status=pending", Some(&cookie)).await)
            .await;
    assert_eq!(emails(&pending["users"]), vec!["ada@corp.com"]);
    assert_eq!(pending["users"][0]["status"], "pending");

    let inactive =
        body_json(app.get("/admin/search-users?status=inactive", Some(&cookie)).await).await;
    assert_eq!(emails(&inactive["users"]), vec!["worker@corp.com"]);
    assert_eq!(inactive["users"][0]["status"], "inactive");

    let active = body_json(app.get("/admin/search-users?status=active", Some(&cookie)).await).await;
    assert_eq!(emails(&active["users"]), vec!["admin@corp.com"]);
}

#[tokio::test]
async fn test_search_query_is_literal() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;
    app.signup("ada@corp.com").await;

    let body = body_json(app.get("/admin/search-users?query=.%2A", Some(&cookie)).await).await;
    assert!(body["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_rejects_unknown_status() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;

    let res = app
        .get("/admin/search-users?status=rejected", Some(&cookie))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["success"], false);
}
