use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::tokens::TokenPair;
use crate::config;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config::config().security.secure_cookies)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Set both session cookies with max-ages matching the token TTLs
pub fn set_token_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    let auth = &config::config().auth;
    jar.add(session_cookie(
        ACCESS_COOKIE,
        pair.access.clone(),
        Duration::minutes(auth.access_ttl_minutes),
    ))
    .add(session_cookie(
        REFRESH_COOKIE,
        pair.refresh.clone(),
        Duration::days(auth.refresh_ttl_days),
    ))
}

/// Expire both session cookies (logout and failed refresh)
pub fn clear_token_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((ACCESS_COOKIE, "")).path("/").build())
        .remove(Cookie::build((REFRESH_COOKIE, "")).path("/").build())
}
