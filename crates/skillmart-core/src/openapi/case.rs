//! Identifier case conversion.

use regex::Regex;
use std::sync::OnceLock;

static WORD_START_RE: OnceLock<Regex> = OnceLock::new();
static CAMEL_HUMP_RE: OnceLock<Regex> = OnceLock::new();

fn word_start_re() -> &'static Regex {
    WORD_START_RE.get_or_init(|| Regex::new(r"([^_\-])([A-Z][a-z]+)").unwrap())
}

fn camel_hump_re() -> &'static Regex {
    CAMEL_HUMP_RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap())
}

/// Split camel humps with `sep` after normalising `-`, `_` and spaces to it.
fn separate(name: &str, sep: char) -> String {
    let normalised: String = name
        .chars()
        .map(|c| if matches!(c, '-' | '_' | ' ') { sep } else { c })
        .collect();
    let replacement = format!("${{1}}{sep}${{2}}");
    let s1 = word_start_re().replace_all(&normalised, replacement.as_str());
    camel_hump_re()
        .replace_all(&s1, replacement.as_str())
        .into_owned()
}

pub fn snake_case(name: &str) -> String {
    separate(name, '_').to_lowercase()
}

pub fn kebab_case(name: &str) -> String {
    separate(name, '-').to_lowercase()
}

pub fn upper_snake_case(name: &str) -> String {
    separate(name, '_').to_uppercase()
}

/// Lowercase words of `name`, split on humps and any non-alphanumeric.
fn words(name: &str) -> Vec<String> {
    snake_case(name)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn pascal_case(name: &str) -> String {
    words(name).iter().map(|w| capitalize(w)).collect()
}

pub fn camel_case(name: &str) -> String {
    words(name)
        .into_iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w } else { capitalize(&w) })
        .collect()
}

pub fn is_snake_case(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap())
        .is_match(name)
}

pub fn is_kebab_case(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9\-]*$").unwrap())
        .is_match(name)
}

pub fn is_upper_snake_case(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap())
        .is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_from_camel_and_acronyms() {
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("HTTPResponseCode"), "http_response_code");
        assert_eq!(snake_case("user-id"), "user_id");
        assert_eq!(snake_case("X-Request-Id"), "x_request_id");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn kebab_and_upper_snake() {
        assert_eq!(kebab_case("userProfiles"), "user-profiles");
        assert_eq!(kebab_case("order_items"), "order-items");
        assert_eq!(upper_snake_case("inProgress"), "IN_PROGRESS");
        assert_eq!(upper_snake_case("not-started"), "NOT_STARTED");
    }

    #[test]
    fn pascal_and_camel() {
        assert_eq!(pascal_case("out-of-credit"), "OutOfCredit");
        assert_eq!(camel_case("new-checkout-flow"), "newCheckoutFlow");
        assert_eq!(camel_case("dark_mode"), "darkMode");
        assert_eq!(pascal_case("dark_mode.v2"), "DarkModeV2");
    }

    #[test]
    fn predicates() {
        assert!(is_snake_case("trace_id"));
        assert!(!is_snake_case("traceId"));
        assert!(is_kebab_case("payment-methods"));
        assert!(!is_kebab_case("payment_methods"));
        assert!(is_upper_snake_case("IN_PROGRESS"));
        assert!(!is_upper_snake_case("active"));
    }
}
