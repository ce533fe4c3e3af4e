//! Plain-text segmentation helpers.

/// Split text into paragraphs on blank lines.
///
/// Paragraphs are trimmed and empty ones dropped; text with no blank lines is
/// a single paragraph.
pub fn segment_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

/// Collapse runs of whitespace to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Uppercase the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segment_paragraphs_blank_lines() {
        let text = "First line\nstill first.\n\n\n  Second paragraph.  \n\nThird.";
        assert_eq!(
            segment_paragraphs(text),
            vec![
                "First line still first.".to_string(),
                "Second paragraph.".to_string(),
                "Third.".to_string(),
            ]
        );
    }

    #[test]
    fn test_segment_paragraphs_single() {
        assert_eq!(segment_paragraphs("Just one."), vec!["Just one.".to_string()]);
    }

    #[test]
    fn test_segment_paragraphs_whitespace_only() {
        assert!(segment_paragraphs("  \n \n\t").is_empty());
    }

    #[test]
    fn test_excerpt_truncates_with_ellipsis() {
        assert_eq!(excerpt("abcdef", 3), "abc...");
        assert_eq!(excerpt("abc", 3), "abc");
    }

    #[test]
    fn test_excerpt_is_char_boundary_safe() {
        assert_eq!(excerpt("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("going to"), "Going to");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  John \n Smith "), "John Smith");
    }
}
