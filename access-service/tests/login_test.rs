mod common;

use access_service::services::{Clock, CredentialStore};
use axum::http::StatusCode;
use common::{
    auth_cookie_pair, body_json, set_cookie_header, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD,
    STRONG_PASSWORD,
};
use serde_json::json;

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new().await;

    let res = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = set_cookie_header(&res).expect("missing session cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));

    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["name"], "Seeded Account");
    assert_eq!(body["user"]["isAdmin"], true);
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_login_records_last_login_and_presence() {
    let app = TestApp::new().await;

    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let user = app
        .store
        .find_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.last_login, Some(app.clock.now()));

    let active = app
        .store
        .active_session_user_ids(app.clock.now())
        .await
        .unwrap();
    assert_eq!(active, vec![user.id]);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    let res = app.login("  ADMIN@Corp.com ", ADMIN_PASSWORD).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_share_message() {
    let app = TestApp::new().await;

    let wrong = app.login(ADMIN_EMAIL, "Wrong1!pass").await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(auth_cookie_pair(&wrong).is_none());

    let unknown = app.login("nobody@corp.com", "Wrong1!pass").await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(
        body_json(wrong).await["message"],
        body_json(unknown).await["message"]
    );
}

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let app = TestApp::new().await;

    let res = app
        .post_json("/login", json!({ "email": ADMIN_EMAIL }), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["message"],
        "Email and password are required"
    );
}

#[tokio::test]
async fn test_inactive_account_refused_before_password_check() {
    let app = TestApp::new().await;
    // A hash that can't be verified proves the password is never compared.
    app.seed_account_with_hash("idle@corp.com", "not-a-password-hash", false, false);

    let res = app.login("idle@corp.com", "anything").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["message"], "Account is inactive");
}

#[tokio::test]
async fn test_pending_registration_awaits_approval() {
    let app = TestApp::new().await;
    app.signup("new@corp.com").await;

    let res = app.login("new@corp.com", STRONG_PASSWORD).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(res).await["message"],
        "Your account is pending approval. Please wait for admin confirmation."
    );
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;
    let cookie = app.admin_cookie().await;

    let res = app.post_json("/logout", json!({}), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let cleared = set_cookie_header(&res).expect("logout must reset the cookie");
    assert!(cleared.starts_with("auth-token=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["message"], "Logged out successfully");
}
