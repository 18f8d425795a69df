//! Field-level rules that need no file access.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Host required for Android store links.
pub const ANDROID_STORE_HOST: &str = "play.google.com";
/// Host required for iOS store links.
pub const IOS_STORE_HOST: &str = "itunes.apple.com";

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\-.,'\s]+$").unwrap_or_else(|e| panic!("identifier regex: {e}"))
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
    )
    .unwrap_or_else(|e| panic!("email regex: {e}"))
});

/// Identifier characters are word characters, `-`, `.`, `,`, `'` and
/// whitespace; `..` is never allowed. The identifier also names the pack's
/// asset directory, so a lone `.` is rejected.
pub fn is_valid_identifier_charset(identifier: &str) -> bool {
    IDENTIFIER_RE.is_match(identifier)
        && !identifier.contains("..")
        && crate::store::is_safe_segment(identifier)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Parse an absolute http(s) URL with a host.
pub fn parse_web_url(value: &str) -> Option<Url> {
    let url = Url::parse(value).ok()?;
    matches!(url.scheme(), "http" | "https")
        .then_some(url)
        .filter(|u| u.host_str().is_some_and(|h| !h.is_empty()))
}

pub fn is_valid_web_url(value: &str) -> bool {
    parse_web_url(value).is_some()
}

/// http(s) URL whose host is exactly `host`.
pub fn is_store_link(value: &str, host: &str) -> bool {
    parse_web_url(value).is_some_and(|u| u.host_str() == Some(host))
}

/// Character count (not bytes).
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}
