//! The `token` session cookie.
//!
//! Browsers' `EventSource` cannot set an `Authorization` header, so the
//! generation stream authenticates through this cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name carrying the session JWT.
pub const SESSION_COOKIE: &str = "token";

/// Session cookie holding `token` for `max_age_secs`.
///
/// `secure` also tightens `SameSite` from `Lax` to `Strict`.
pub fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(max_age_secs))
        .same_site(if secure { SameSite::Strict } else { SameSite::Lax })
        .secure(secure)
        .build()
}

/// Cookie that expires the session in the browser.
///
/// Built explicitly rather than through `CookieJar::remove`, which only
/// emits a removal for cookies the request carried.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), 0, secure);
    cookie.make_removal();
    cookie
}

/// Value of the session cookie in a request, if present and non-empty.
pub fn read_session_cookie(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
}
