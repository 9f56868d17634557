//! URL slug normalization.
//!
//! Uniqueness probing lives in `storage::lifecycle::unique_slug`; this module
//! only owns the text transform.

/// Normalize display text to a lowercase hyphenated ASCII slug.
///
/// Non-alphanumeric runs collapse into a single hyphen; leading and trailing
/// hyphens are stripped. Returns `"n-a"` for input with no usable characters
/// so callers always get a non-empty base.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_hyphen = true;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "n-a".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugs() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Admin"), "admin");
        assert_eq!(slugify("  Graduate   Admissions  "), "graduate-admissions");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(slugify("News & Events!"), "news-events");
        assert_eq!(slugify("What's new?"), "what-s-new");
        assert_eq!(slugify("a---b"), "a-b");
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(slugify("Café Münster"), "caf-m-nster");
    }

    #[test]
    fn test_empty_input_fallback() {
        assert_eq!(slugify(""), "n-a");
        assert_eq!(slugify("!!!"), "n-a");
    }
}
