use crate::{AppState, SecurityConfig};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose};
use tracing::{debug, warn};

pub const ADMIN_REALM: &str = "Basic realm=\"Photodex admin\"";

/// Sends plain-HTTP requests to their HTTPS equivalent.
///
/// Only the `x-forwarded-proto` header set by a terminating proxy is
/// trusted; requests without it pass through.
pub async fn https_redirect(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if app_state.config.security.enforce_https
        && let Some(location) = https_location(request.headers(), request.uri())
    {
        debug!(location = %location, "Redirecting to HTTPS");
        return Redirect::permanent(&location).into_response();
    }

    next.run(request).await
}

fn https_location(headers: &HeaderMap, uri: &axum::http::Uri) -> Option<String> {
    let proto = headers.get("x-forwarded-proto")?.to_str().ok()?;
    if !proto.eq_ignore_ascii_case("http") {
        return None;
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    Some(format!("https://{}{}", host, path_and_query))
}

/// Checks HTTP basic credentials against the shared admin password.
///
/// Any username is accepted. With no password configured the admin
/// endpoints do not exist.
pub fn require_admin(headers: &HeaderMap, security: &SecurityConfig) -> Result<(), Response> {
    let Some(expected) = security.admin_password.as_deref() else {
        return Err(StatusCode::NOT_FOUND.into_response());
    };

    match basic_password(headers) {
        Some(password) if password == expected => Ok(()),
        Some(_) => {
            warn!("Rejected admin request with wrong password");
            Err(unauthorized())
        }
        None => Err(unauthorized()),
    }
}

fn basic_password(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (_, password) = credentials.split_once(':')?;
    Some(password.to_string())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, ADMIN_REALM)],
        "Unauthorized",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_auth(user: &str, password: &str) -> HeaderMap {
        let encoded = general_purpose::STANDARD.encode(format!("{}:{}", user, password));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
        );
        headers
    }

    fn security(password: Option<&str>) -> SecurityConfig {
        SecurityConfig {
            enforce_https: false,
            admin_password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_admin_password_accepted() {
        let config = security(Some("s3cret:pass"));
        assert!(require_admin(&with_auth("oak", "s3cret:pass"), &config).is_ok());
        assert!(require_admin(&with_auth("", "s3cret:pass"), &config).is_ok());
    }

    #[test]
    fn test_admin_rejections() {
        let config = security(Some("s3cret"));

        let wrong = require_admin(&with_auth("oak", "nope"), &config).unwrap_err();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.headers()[header::WWW_AUTHENTICATE], ADMIN_REALM);

        let missing = require_admin(&HeaderMap::new(), &config).unwrap_err();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let mut bearer = HeaderMap::new();
        bearer.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(require_admin(&bearer, &config).is_err());
    }

    #[test]
    fn test_admin_disabled_without_password() {
        let denied = require_admin(&with_auth("oak", "anything"), &security(None)).unwrap_err();
        assert_eq!(denied.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_https_location() {
        let uri: axum::http::Uri = "/red?x=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("dex.example"));
        assert_eq!(https_location(&headers, &uri), None);

        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert_eq!(
            https_location(&headers, &uri).as_deref(),
            Some("https://dex.example/red?x=1")
        );

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(https_location(&headers, &uri), None);
    }
}
