//! Field name to declaration identifier.
//!
//! `user_id` → `UserID`, `first-name` → `FirstName`, `createdAt` → `CreatedAt`.
use once_cell::sync::Lazy;
use regex::Regex;

static CAPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{Lu})").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

/// Words rendered fully upper-case.
const FORCED_UPPER_CASE: [&str; 3] = ["id", "url", "api"];

/// Names containing these are never turned into identifiers. A backtick
/// cannot appear inside a raw tag literal.
const REJECTED_CHARS: [char; 3] = ['!', '*', '`'];

fn words(name: &str) -> Vec<String> {
    let spaced = name.replace(['-', '_'], " ");
    let spaced = CAPS_RE.replace_all(&spaced, " $1");
    WORD_RE.find_iter(&spaced).map(|m| m.as_str().to_owned()).collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Normalize a source field name into an identifier.
pub fn make_field_name(name: &str) -> String {
    let camel: String = words(name)
        .iter()
        .map(|word| {
            let lower = word.to_lowercase();
            if FORCED_UPPER_CASE.contains(&lower.as_str()) {
                word.to_uppercase()
            } else {
                title_case(word)
            }
        })
        .collect();
    camel
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let ok = if i == 0 { c.is_alphabetic() } else { c.is_alphanumeric() };
            if ok { c } else { '_' }
        })
        .collect()
}

/// Whether `name` can be emitted as a field at all.
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(REJECTED_CHARS) && WORD_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_upper_case_words() {
        assert_eq!(make_field_name("user_id"), "UserID");
        assert_eq!(make_field_name("avatar_url"), "AvatarURL");
        assert_eq!(make_field_name("ApiKey"), "APIKey");
        assert_eq!(make_field_name("_id"), "ID");
    }

    #[test]
    fn separators_and_camel_case_split_words() {
        assert_eq!(make_field_name("first-name"), "FirstName");
        assert_eq!(make_field_name("createdAt"), "CreatedAt");
        assert_eq!(make_field_name("SHOUTING"), "SHOUTING");
        assert_eq!(make_field_name("mixed.case value"), "MixedCaseValue");
    }

    #[test]
    fn title_case_lowers_the_rest_of_a_word() {
        assert_eq!(make_field_name("name"), "Name");
        assert_eq!(make_field_name("éclair"), "Éclair");
    }

    #[test]
    fn leading_digit_is_replaced() {
        assert_eq!(make_field_name("2fa"), "_fa");
        assert_eq!(make_field_name("v2"), "V2");
    }

    #[test]
    fn invalid_names() {
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("bang!"));
        assert!(!is_valid_field_name("star*"));
        assert!(!is_valid_field_name("tick`"));
        assert!(!is_valid_field_name("..."));
        assert!(is_valid_field_name("$ref"));
        assert!(is_valid_field_name("first-name"));
    }
}
