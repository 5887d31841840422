//! Small helpers shared by the document templates.

use std::borrow::Cow;

/// Character limit for story text on exported slides.
pub const TEMPLATE_TRUNCATE: usize = 180;
/// Character limit for story text in the in-app recap.
pub const RECAP_TRUNCATE: usize = 200;

/// Escape text for element content and quoted attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Keep at most `limit` characters, appending `...` when something was cut.
///
/// Counts characters, not bytes, so a multi-byte code point is never split.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// The shared document head: doctype, meta tags, title and stylesheet.
pub fn head(title: &str, viewport: &str, css: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"{viewport}\">\n  <title>{}</title>\n  \
         <style>{css}</style>\n</head>\n",
        escape(title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
        assert_eq!(
            escape(r#"<b>"Tom & Jerry's"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 180), "short");
        assert_eq!(truncate(&"a".repeat(180), 180), "a".repeat(180));
        assert_eq!(truncate(&"a".repeat(181), 180), format!("{}...", "a".repeat(180)));

        let hearts = "♥".repeat(10);
        assert_eq!(truncate(&hearts, 3), "♥♥♥...");
    }
}
