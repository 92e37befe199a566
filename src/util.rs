//! URL helpers consumed by the dispatcher.
//!
//! The dispatch loop only ever needs the pathname of the current request
//! URL; everything beyond that (query parsing, percent decoding) is out of
//! scope here.

use std::borrow::Cow;

use url::Url;

/// Extract the pathname from a request URL.
///
/// Handles both origin-form targets (`/admin/x?q=1`) and absolute-form
/// targets (`http://host/admin/x`). Returns `None` for an empty URL or an
/// unparseable absolute-form target; the caller treats that as `/`.
pub fn pathname(url: &str) -> Option<Cow<'_, str>> {
    if url.is_empty() {
        return None;
    }
    if url.contains("://") {
        let parsed = Url::parse(url).ok()?;
        Some(Cow::Owned(parsed.path().to_string()))
    } else {
        let end = url.find(&['?', '#'][..]).unwrap_or(url.len());
        Some(Cow::Borrowed(&url[..end]))
    }
}

/// Escape a string for inclusion in an HTML-safe diagnostic body.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(&['&', '<', '>', '"'][..]) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pathname_origin_form() {
        assert_eq!(pathname("/admin/x?q=1").as_deref(), Some("/admin/x"));
        assert_eq!(pathname("/admin/x#frag").as_deref(), Some("/admin/x"));
        assert_eq!(pathname("/").as_deref(), Some("/"));
    }

    #[test]
    fn pathname_absolute_form() {
        assert_eq!(
            pathname("http://example.com/admin/x?q=1").as_deref(),
            Some("/admin/x")
        );
    }

    #[test]
    fn pathname_empty() {
        assert_eq!(pathname(""), None);
    }

    #[test]
    fn escape_html_passthrough() {
        assert!(matches!(escape_html("/plain/path"), Cow::Borrowed(_)));
    }

    #[test]
    fn escape_html_entities() {
        assert_eq!(
            escape_html(r#"/x?<script>"&"#),
            "/x?&lt;script&gt;&quot;&amp;"
        );
    }
}
