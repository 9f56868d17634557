//! Utility functions and helpers

pub mod slug;

pub use slug::slugify;

use std::sync::LazyLock;

use regex::Regex;

/// Two-letter country code (ISO 3166-1 alpha-2)
pub static ISO2_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("valid iso2 regex"));

/// Three-letter code (ISO 3166-1 alpha-3 / ISO 4217)
pub static ISO3_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}$").expect("valid iso3 regex"));

/// Language tag like "en" or "pt-BR"
pub static LANGUAGE_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z]{2,4})?$").expect("valid language regex"));

/// Random alphanumeric suffix, used to keep mutated unique codes
/// collision-free when duplicating an entity.
pub fn random_suffix(len: usize) -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_regexes() {
        assert!(ISO2_REGEX.is_match("FR"));
        assert!(!ISO2_REGEX.is_match("FRA"));
        assert!(ISO3_REGEX.is_match("EUR"));
        assert!(LANGUAGE_CODE_REGEX.is_match("en"));
        assert!(LANGUAGE_CODE_REGEX.is_match("pt-BR"));
        assert!(!LANGUAGE_CODE_REGEX.is_match("English"));
    }

    #[test]
    fn test_random_suffix_length_and_charset() {
        let suffix = random_suffix(4);
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
