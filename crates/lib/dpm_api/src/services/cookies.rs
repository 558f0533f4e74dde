//! Session cookie: the `JWT` cookie set on login and cleared on logout.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie carrying the access token.
pub const JWT_COOKIE: &str = "JWT";

pub fn jwt_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Expired cookie that removes the session from the browser.
pub fn clear_jwt_cookie() -> Cookie<'static> {
    Cookie::build((JWT_COOKIE.to_string(), String::new()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}
