// Opaque cookie jar captured from portal responses.
//
// The portal's session lives in whatever cookies the last response set.
// Every response carrying `Set-Cookie` replaces the jar wholesale; every
// request replays the jar through a single `Cookie` header.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Ordered set of `name=value` cookie pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the jar with the cookies set by `headers`.
    ///
    /// Returns `true` if the response carried any `Set-Cookie` header.
    /// Attributes (`Path`, `HttpOnly`, ...) are dropped; only the
    /// `name=value` pair is replayed.
    pub fn capture(&mut self, headers: &HeaderMap) -> bool {
        let captured: Vec<String> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(cookie_pair)
            .collect();

        if captured.is_empty() {
            return false;
        }
        self.cookies = captured;
        true
    }

    /// The `Cookie` header value, or `None` if the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            None
        } else {
            Some(self.cookies.join("; "))
        }
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

fn cookie_pair(raw: &str) -> Option<String> {
    let pair = raw.split(';').next()?.trim();
    if pair.is_empty() || !pair.contains('=') {
        return None;
    }
    Some(pair.to_owned())
}
