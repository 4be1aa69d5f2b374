//! Shared setup for access-service integration tests.
//!
//! Every test builds the full router over an in-memory credential store and
//! a manual clock, so no MongoDB instance is needed.

#![allow(dead_code)]

use access_service::{
    build_router,
    config::{
        AccessConfig, Environment, JwtConfig, ListingConfig, MongoConfig, PasswordConfig,
        RateLimitConfig, SecurityConfig,
    },
    models::{status_for, AccessLevel, User},
    services::{CredentialStore, InMemoryStore, ManualClock},
    utils::{hash_password, Password},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@corp.com";
pub const ADMIN_PASSWORD: &str = "Admin1!pass";
pub const STRONG_PASSWORD: &str = "Aa1!aaaa";

pub fn test_config() -> AccessConfig {
    AccessConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "access-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "access_test".to_string(),
            max_pool_size: 1,
            server_selection_timeout_ms: 100,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789".to_string(),
            session_expiry_hours: 24,
        },
        password: PasswordConfig { hash_cost: 4 },
        listing: ListingConfig {
            pending_cache_ttl_seconds: 30,
            pending_list_limit: 50,
            active_window_minutes: 15,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: false,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 5,
            login_window_seconds: 900,
            signup_attempts: 3,
            signup_window_seconds: 3600,
            global_ip_limit: 100,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        ));

        let state = AppState::new(test_config(), store.clone(), clock.clone())
            .expect("Failed to build app state");
        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        let app = Self {
            router,
            store,
            clock,
            state,
        };
        app.seed_account(ADMIN_EMAIL, ADMIN_PASSWORD, true, true);
        app
    }

    /// Insert an account straight into the store. Returns its id.
    pub fn seed_account(&self, email: &str, password: &str, is_admin: bool, is_active: bool) -> String {
        let hash = hash_password(&Password::new(password.to_string()), 4).unwrap();
        self.seed_account_with_hash(email, &hash.into_string(), is_admin, is_active)
    }

    pub fn seed_account_with_hash(
        &self,
        email: &str,
        password_hash: &str,
        is_admin: bool,
        is_active: bool,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.store
            .seed_user(User {
                id: id.clone(),
                first_name: "Seeded".to_string(),
                last_name: "Account".to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                organization: "Corp".to_string(),
                access_level: AccessLevel::Leadership,
                is_admin,
                is_super_admin: false,
                is_active,
                status: status_for(is_active).to_string(),
                last_login: None,
                registration_date: None,
                approval_date: None,
            })
            .unwrap();
        id
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn signup(&self, email: &str) -> Response<Body> {
        self.post_json("/signup", signup_body(email), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        self.post_json("/login", json!({ "email": email, "password": password }), None)
            .await
    }

    /// Log in and return the `auth-token=...` pair for a Cookie header.
    pub async fn session_cookie(&self, email: &str, password: &str) -> String {
        let res = self.login(email, password).await;
        assert_eq!(res.status(), StatusCode::OK, "login failed for {}", email);
        auth_cookie_pair(&res).expect("login did not set a session cookie")
    }

    pub async fn admin_cookie(&self) -> String {
        self.session_cookie(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn pending_id(&self, email: &str) -> String {
        self.store
            .find_pending_by_email(email)
            .await
            .unwrap()
            .expect("no pending registration for email")
            .id
    }
}

pub fn signup_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": STRONG_PASSWORD,
        "firstName": "Ada",
        "lastName": "Byron",
        "organization": "Corp",
        "accessLevel": "inspection"
    })
}

/// Full `Set-Cookie` value for the session cookie, if one was set.
pub fn set_cookie_header(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("auth-token="))
        .map(str::to_string)
}

pub fn auth_cookie_pair(res: &Response<Body>) -> Option<String> {
    set_cookie_header(res).and_then(|v| v.split(';').next().map(str::to_string))
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
