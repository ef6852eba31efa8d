use crate::error::ResolutionError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// `[scheme://][www.]host.tld/[+|joinchat/]segment...`
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:[a-z][a-z0-9+.\-]*://)?(?:www\.)?[a-z0-9\-]+(?:\.[a-z0-9\-]+)+/(?:\+|joinchat/)?([A-Za-z0-9_\-]*)",
    )
    .expect("link pattern is valid")
});

static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+$").expect("numeric pattern is valid"));

const SIGIL: char = '@';

/// Normalized identifier extracted from user input: a public handle, an invite
/// slug, or a numeric chat id. Never empty, never carries a scheme or sigil.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityReference(String);

impl EntityReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric chat id, when the reference is one.
    pub fn as_numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a user-supplied reference into an [`EntityReference`].
///
/// Recognized shapes:
/// - a platform link, with or without scheme: `https://t.me/name`, `t.me/+slug`, `t.me/joinchat/slug`
/// - a handle with sigil: `@name`
/// - a bare numeric chat id: `-1001234567890`
///
/// Invite slugs and public handles come out in the same shape.
pub fn resolve(raw: &str) -> Result<EntityReference, ResolutionError> {
    let input = raw.trim();

    if let Some(caps) = LINK_RE.captures(input) {
        let segment = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if segment.is_empty() {
            return Err(ResolutionError::EmptyIdentifier(raw.to_string()));
        }
        return Ok(EntityReference(segment.to_string()));
    }

    if let Some(rest) = input.strip_prefix(SIGIL) {
        if rest.is_empty() {
            return Err(ResolutionError::EmptyIdentifier(raw.to_string()));
        }
        if rest.chars().any(char::is_whitespace) {
            return Err(ResolutionError::Unrecognized(raw.to_string()));
        }
        return Ok(EntityReference(rest.to_string()));
    }

    if NUMERIC_RE.is_match(input) {
        return Ok(EntityReference(input.to_string()));
    }

    Err(ResolutionError::Unrecognized(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_plus_prefix_is_stripped() {
        let r = resolve("https://chat.example/+abc123").unwrap();
        assert_eq!(r.as_str(), "abc123");
    }

    #[test]
    fn joinchat_prefix_is_stripped() {
        let r = resolve("t.me/joinchat/AAAAAE-x_y").unwrap();
        assert_eq!(r.as_str(), "AAAAAE-x_y");
    }

    #[test]
    fn link_without_scheme_and_trailing_parts() {
        assert_eq!(resolve("  t.me/rustlang/42?single ").unwrap().as_str(), "rustlang");
        assert_eq!(resolve("https://www.t.me/rustlang/").unwrap().as_str(), "rustlang");
    }

    #[test]
    fn sigil_handle() {
        assert_eq!(resolve("@durov").unwrap().as_str(), "durov");
    }

    #[test]
    fn numeric_handle() {
        let r = resolve("-1001234567890").unwrap();
        assert_eq!(r.as_numeric(), Some(-1001234567890));
    }

    #[test]
    fn rejects_free_text_and_empty_segments() {
        assert!(matches!(resolve("not a link"), Err(ResolutionError::Unrecognized(_))));
        assert!(matches!(resolve("@"), Err(ResolutionError::EmptyIdentifier(_))));
        assert!(matches!(resolve("https://t.me/"), Err(ResolutionError::EmptyIdentifier(_))));
        assert!(matches!(resolve("t.me/+"), Err(ResolutionError::EmptyIdentifier(_))));
        assert!(matches!(resolve(""), Err(ResolutionError::Unrecognized(_))));
    }
}
