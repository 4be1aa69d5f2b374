//! Cookie session gate.
//!
//! The decision itself is a pure function of the cookie, the path and the
//! token service's clock; the middleware only renders it.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use service_core::error::AppError;

use crate::dtos::ErrorResponse;
use crate::services::{JwtService, PolicyService, SessionIdentity, TokenError};
use crate::AppState;

pub const SESSION_COOKIE: &str = "auth-token";
pub const LOGIN_PATH: &str = "/auth/login";
const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"Protected Area\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(SessionIdentity),
    /// `clear_cookie` is set when a cookie was presented but is unusable.
    Unauthenticated { clear_cookie: bool },
    Forbidden,
}

pub struct SessionGate;

impl SessionGate {
    pub fn evaluate(jwt: &JwtService, token: Option<&str>, path: &str) -> GateDecision {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return GateDecision::Unauthenticated {
                clear_cookie: false,
            };
        };

        let identity = match jwt.verify(token) {
            Ok(claims) => SessionIdentity::from(claims),
            Err(TokenError::Expired) => {
                tracing::debug!("Session token expired");
                return GateDecision::Unauthenticated { clear_cookie: true };
            }
            Err(TokenError::Invalid(e)) => {
                tracing::warn!(error = %e, "Rejected session token");
                return GateDecision::Unauthenticated { clear_cookie: true };
            }
        };

        if is_admin_path(path) && !PolicyService::has_admin_access(&identity) {
            tracing::warn!(user_id = %identity.user_id, path = %path, "Admin route refused");
            return GateDecision::Forbidden;
        }

        GateDecision::Allow(identity)
    }
}

pub fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// Session cookie carrying a freshly issued token.
pub fn session_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Cookie that makes the browser drop the session.
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

fn unauthenticated_response(
    headers: &HeaderMap,
    path: &str,
    clear_cookie: bool,
    secure: bool,
) -> Response {
    let jar = if clear_cookie {
        CookieJar::new().add(expired_session_cookie(secure))
    } else {
        CookieJar::new()
    };

    if wants_html(headers) {
        let location = format!("{}?callbackUrl={}", LOGIN_PATH, urlencoding::encode(path));
        return (jar, Redirect::to(&location)).into_response();
    }

    let message = if clear_cookie {
        "Invalid session"
    } else {
        "Authentication required"
    };

    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
        )],
        jar,
        Json(ErrorResponse {
            success: false,
            message: message.to_string(),
            redirect: Some(LOGIN_PATH.to_string()),
        }),
    )
        .into_response()
}

/// Require a valid session cookie; admin paths also require admin access.
pub async fn session_gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let path = req.uri().path().to_string();

    match SessionGate::evaluate(&state.jwt, token.as_deref(), &path) {
        GateDecision::Allow(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        GateDecision::Unauthenticated { clear_cookie } => unauthenticated_response(
            req.headers(),
            &path,
            clear_cookie,
            state.config.security.secure_cookies,
        ),
        GateDecision::Forbidden => {
            AppError::Forbidden(anyhow::anyhow!("Admin access required")).into_response()
        }
    }
}

/// Extractor to easily get the session identity in handlers
pub struct AuthenticatedUser(pub SessionIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<SessionIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

        Ok(AuthenticatedUser(identity))
    }
}
