//! Slug derivation and URL normalization.

use crate::{Error, Result};
use unicode_normalization::UnicodeNormalization;

/// Derives a URL slug from free text.
///
/// Decomposes the text (NFKD), drops whatever is not ASCII, keeps only word
/// characters, whitespace and hyphens, lower-cases, and joins the remaining
/// words with single hyphens.
///
/// ```
/// assert_eq!(formwork_types::slugify("01 HDR test"), "01-hdr-test");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || is_space(*c))
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut pending_separator = false;
    for c in kept.trim().chars() {
        if c == '-' || is_space(c) {
            pending_separator = true;
            continue;
        }
        if pending_separator && !slug.is_empty() {
            slug.push('-');
        }
        pending_separator = false;
        slug.push(c.to_ascii_lowercase());
    }
    slug
}

/// ASCII whitespace as regex `\s` sees it, vertical tab and the
/// information separators included.
const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c' | '\x1c'..='\x1f')
}

/// Validates that `input` has a scheme and a network location, and returns
/// it with scheme and host lower-cased. Path, query, fragment and user info
/// are left untouched.
pub fn normalize_url(input: &str) -> Result<String> {
    let (scheme, rest) = input
        .split_once(':')
        .filter(|(scheme, _)| is_scheme(scheme))
        .ok_or_else(|| Error::MissingScheme(input.to_string()))?;

    let rest = rest
        .strip_prefix("//")
        .ok_or_else(|| Error::MissingHost(input.to_string()))?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (netloc, tail) = rest.split_at(end);
    if netloc.is_empty() {
        return Err(Error::MissingHost(input.to_string()));
    }

    let (userinfo, host) = match netloc.rsplit_once('@') {
        Some((userinfo, host)) => (Some(userinfo), host),
        None => (None, netloc),
    };
    if host.is_empty() {
        return Err(Error::MissingHost(input.to_string()));
    }

    let mut normalized = format!("{}://", scheme.to_ascii_lowercase());
    if let Some(userinfo) = userinfo {
        normalized.push_str(userinfo);
        normalized.push('@');
    }
    normalized.push_str(&host.to_lowercase());
    normalized.push_str(tail);
    Ok(normalized)
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
