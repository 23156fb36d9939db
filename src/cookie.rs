//! Cookie parsing and `Set-Cookie` serialization.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters escaped in cookie values (RFC 6265 cookie-octet excludes these).
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// A cookie to send with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    max_age: Option<i64>,
    http_only: bool,
    same_site: Option<&'static str>,
}

impl Cookie {
    /// Session cookie with `Path=/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: Some("/".to_string()),
            max_age: None,
            http_only: false,
            same_site: None,
        }
    }

    /// Cookie that tells the browser to drop `name`.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(0)
    }

    /// Set the `Path` attribute.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set `Max-Age` in seconds.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Hide the cookie from scripts.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set `SameSite` to `Lax`, `Strict` or `None`.
    pub fn same_site(mut self, policy: &'static str) -> Self {
        self.same_site = Some(policy);
        self
    }

    /// Cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unencoded cookie value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!(
            "{}={}",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE)
        );
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
            if max_age <= 0 {
                out.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
            }
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(policy) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(policy);
        }
        out
    }
}

/// Parse a `Cookie` request header into name/value pairs.
///
/// Later duplicates do not override the first occurrence, which is the one
/// with the most specific path.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"');
        let decoded = percent_decode_str(value).decode_utf8_lossy().into_owned();
        cookies.entry(name.to_string()).or_insert(decoded);
    }
    cookies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("name=Grey%20Li; theme=dark;broken; =x");
        assert_eq!(cookies.get("name").map(String::as_str), Some("Grey Li"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let cookies = parse_cookie_header("name=a; name=b");
        assert_eq!(cookies["name"], "a");
    }

    #[test]
    fn test_set_cookie_value_is_encoded() {
        let cookie = Cookie::new("name", "a b;c").http_only(true);
        assert_eq!(cookie.to_header_value(), "name=a%20b%3Bc; Path=/; HttpOnly");
    }

    #[test]
    fn test_removal_expires_cookie() {
        let value = Cookie::removal("session").to_header_value();
        assert!(value.starts_with("session=; Path=/; Max-Age=0"));
        assert!(value.contains("Expires=Thu, 01 Jan 1970"));
    }
}
