//! Text helpers shared by the product analyzer and the site audit.

/// Strip HTML tags and decode the common entities, collapsing whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words in the visible text of `html`.
#[must_use]
pub fn word_count(html: &str) -> usize {
    strip_html(html).split_whitespace().count()
}

/// Truncate `text` to at most `max_chars` characters, cutting at a word boundary.
///
/// Trailing separators (`,`, `;`, `:`, `-`, `|`) left by the cut are removed.
/// A single word longer than `max_chars` is hard-cut.
#[must_use]
pub fn truncate_words(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let prefix: String = text.chars().take(max_chars).collect();
    let next_is_space = text
        .chars()
        .nth(max_chars)
        .is_some_and(char::is_whitespace);

    let cut = if next_is_space {
        prefix.as_str()
    } else {
        prefix
            .rfind(char::is_whitespace)
            .map_or(prefix.as_str(), |idx| &prefix[..idx])
    };

    cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '|'))
        .to_string()
}

/// Convert a title into a lowercase, hyphen-separated URL handle of at most `max_len` bytes.
#[must_use]
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' {
            // "Men's" -> "mens"
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() <= max_len {
        return slug;
    }

    let prefix = &slug[..max_len];
    match prefix.rfind('-') {
        Some(idx) if idx > 0 => prefix[..idx].to_string(),
        _ => prefix.to_string(),
    }
}

/// Whether `handle` is a readable slug: lowercase words joined by single hyphens.
#[must_use]
pub fn is_readable_slug(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Soft&nbsp;cotton <b>tee</b></p><br/>Fits &amp; feels great"),
            "Soft cotton tee Fits & feels great"
        );
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("<p>one two</p><p>three</p>"), 3);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_truncate_words_keeps_short_text() {
        assert_eq!(truncate_words("  short text ", 20), "short text");
    }

    #[test]
    fn test_truncate_words_cuts_at_boundary() {
        assert_eq!(
            truncate_words("The quick brown fox jumps", 12),
            "The quick"
        );
        assert_eq!(truncate_words("The quick brown", 9), "The quick");
        assert_eq!(truncate_words("alpha, beta gamma", 8), "alpha");
    }

    #[test]
    fn test_truncate_words_hard_cuts_long_word() {
        assert_eq!(truncate_words("Supercalifragilistic", 5), "Super");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Men's Organic Cotton T-Shirt!", 60), "mens-organic-cotton-t-shirt");
        assert_eq!(slugify("  --Hello   World--  ", 60), "hello-world");
        assert_eq!(slugify("alpha beta gamma", 12), "alpha-beta");
    }

    #[test]
    fn test_is_readable_slug() {
        assert!(is_readable_slug("organic-cotton-tee"));
        assert!(is_readable_slug("tee2"));
        assert!(!is_readable_slug("Organic_Cotton"));
        assert!(!is_readable_slug("double--hyphen"));
        assert!(!is_readable_slug("-leading"));
        assert!(!is_readable_slug(""));
    }
}
