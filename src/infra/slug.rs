//! Slug and filename sanitization for note paths and heading anchors.

/// Longest path segment a sanitized filename may produce, in characters.
pub const MAX_SEGMENT_LENGTH: usize = 100;

/// Converts a heading to the slug used by `#section` anchors.
///
/// - Converts to lowercase
/// - Replaces whitespace with hyphens
/// - Keeps only alphanumeric characters, hyphens, and underscores
/// - Collapses consecutive hyphens
/// - Trims leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use lorekeep::infra::slugify;
///
/// assert_eq!(slugify("The Old Keep"), "the-old-keep");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut prev_was_hyphen = false;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            result.push(c);
            prev_was_hyphen = false;
        } else if (c.is_whitespace() || c == '-') && !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
        // Skip all other characters
    }
    result.trim_matches('-').to_string()
}

/// Replaces characters that are unsafe in a path segment.
///
/// - Replaces `< > : " / \ | ? *` with `_`
/// - Drops control characters
/// - Strips leading dots so the file is never hidden
///
/// Unlike [`valid_filename`] the result is not length-bounded.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();

    replaced
        .trim()
        .trim_start_matches('.')
        .trim_start()
        .to_string()
}

/// Makes a display name safe to use as one path segment.
///
/// Applies [`sanitize`], bounds the result to [`MAX_SEGMENT_LENGTH`]
/// characters and returns `_` for empty results.
///
/// # Examples
///
/// ```
/// use lorekeep::infra::valid_filename;
///
/// assert_eq!(valid_filename("Who? What: Why"), "Who_ What_ Why");
/// assert_eq!(valid_filename(".hidden"), "hidden");
/// ```
pub fn valid_filename(name: &str) -> String {
    let sanitized = sanitize(name);
    let bounded: String = sanitized.chars().take(MAX_SEGMENT_LENGTH).collect();
    let bounded = bounded.trim_end();

    if bounded.is_empty() {
        return "_".to_string();
    }
    bounded.to_string()
}

/// Keeps the last `max_chars` characters of `s`.
pub fn keep_tail(s: &str, max_chars: usize) -> &str {
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    match s.char_indices().nth(count - max_chars) {
        Some((start, _)) => &s[start..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // slugify()
    // ===========================================

    #[test]
    fn slugify_converts_to_lowercase() {
        assert_eq!(slugify("API Design"), "api-design");
        assert_eq!(slugify("HELLO WORLD"), "hello-world");
    }

    #[test]
    fn slugify_collapses_whitespace_and_hyphens() {
        assert_eq!(slugify("hello   world"), "hello-world");
        assert_eq!(slugify("hello - world"), "hello-world");
    }

    #[test]
    fn slugify_removes_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Dragon's Lair"), "dragons-lair");
        assert_eq!(slugify("-hello-"), "hello");
    }

    #[test]
    fn slugify_keeps_unicode_letters() {
        assert_eq!(slugify("Café Design"), "café-design");
    }

    #[test]
    fn slugify_of_punctuation_is_empty() {
        assert_eq!(slugify("!@#$%"), "");
    }

    // ===========================================
    // valid_filename()
    // ===========================================

    #[test]
    fn valid_filename_replaces_hostile_characters() {
        assert_eq!(valid_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn valid_filename_strips_leading_dots() {
        assert_eq!(valid_filename("..secret"), "secret");
        assert_eq!(valid_filename(". spaced"), "spaced");
    }

    #[test]
    fn valid_filename_drops_control_characters() {
        assert_eq!(valid_filename("tab\there"), "tabhere");
    }

    #[test]
    fn valid_filename_bounds_length() {
        let long = "x".repeat(300);
        assert_eq!(valid_filename(&long).chars().count(), MAX_SEGMENT_LENGTH);
    }

    #[test]
    fn valid_filename_never_returns_empty() {
        assert_eq!(valid_filename(""), "_");
        assert_eq!(valid_filename("..."), "_");
    }

    #[test]
    fn sanitize_does_not_bound_length() {
        let long = "y".repeat(300);
        assert_eq!(sanitize(&long).len(), 300);
        assert_eq!(sanitize("a:b"), "a_b");
    }

    #[test]
    fn valid_filename_keeps_uuids_intact() {
        assert_eq!(valid_filename("JournalEntry.abc123"), "JournalEntry.abc123");
    }

    // ===========================================
    // keep_tail()
    // ===========================================

    #[test]
    fn keep_tail_truncates_from_the_front() {
        assert_eq!(keep_tail("abcdef", 3), "def");
        assert_eq!(keep_tail("abc", 10), "abc");
        assert_eq!(keep_tail("ééé", 2), "éé");
    }
}
