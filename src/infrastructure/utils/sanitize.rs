use std::collections::HashSet;

use ammonia::{Builder, UrlRelative};

/// Length of an auto-generated excerpt, in characters.
pub const EXCERPT_CHARS: usize = 160;

/// Strips scripts, event handlers and other unsafe markup from post HTML.
/// Relative URLs are kept so `/uploads/...` images keep working.
pub fn sanitize_html(content: &str) -> String {
    Builder::default()
        .link_rel(Some("nofollow noopener noreferrer"))
        .url_relative(UrlRelative::PassThrough)
        .clean(content)
        .to_string()
}

/// Plain text of an HTML fragment with whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    // Block boundaries become word boundaries
    let spaced = html.replace('<', " <");
    let stripped = Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(&spaced)
        .to_string();

    let text = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of the text content, cut back to a word
/// boundary and suffixed with an ellipsis when shortened.
pub fn derive_excerpt(html: &str, max_chars: usize) -> Option<String> {
    let text = html_to_text(html);
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= max_chars {
        return Some(text);
    }

    let cut: String = text.chars().take(max_chars).collect();
    let ends_on_word = text.chars().nth(max_chars) == Some(' ');
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > 0 && !ends_on_word => &cut[..idx],
        _ => cut.as_str(),
    };

    Some(format!("{}…", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_and_handlers_are_removed() {
        let dirty = r#"<p onclick="steal()">Hi</p><script>alert(1)</script><img src="/uploads/a.png">"#;
        let clean = sanitize_html(dirty);
        assert!(!clean.contains("script"));
        assert!(!clean.contains("onclick"));
        assert!(clean.contains(r#"src="/uploads/a.png""#));
    }

    #[test]
    fn short_text_is_returned_whole() {
        assert_eq!(derive_excerpt("<p>Loyalty &amp; rewards</p>", 160).as_deref(), Some("Loyalty & rewards"));
    }

    #[test]
    fn long_text_is_cut_on_a_word_boundary() {
        let html = format!("<p>{}</p>", "reward ".repeat(40));
        assert_eq!(derive_excerpt(&html, 20).unwrap(), "reward reward reward…");
        assert_eq!(derive_excerpt(&html, 23).unwrap(), "reward reward reward…");
    }

    #[test]
    fn empty_content_has_no_excerpt() {
        assert_eq!(derive_excerpt("<p>   </p>", 160), None);
    }
}
