//! Input validators shared by the management operations.
//!
//! Account names (organization names and usernames) follow the same pattern:
//! alphanumeric, with single `-` or `_` separators between alphanumeric runs,
//! 2 to 39 characters total.

use regex::Regex;
use std::sync::LazyLock;

static ACCOUNT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9](?:[-_]?[a-zA-Z0-9])+$").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

const ACCOUNT_NAME_MAX_LEN: usize = 39;

/// Checks an organization name or username against the account-name pattern.
pub fn is_valid_account_name(name: &str) -> bool {
    name.len() <= ACCOUNT_NAME_MAX_LEN && ACCOUNT_NAME_RE.is_match(name)
}

/// Checks an email address for plausible shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_separated_names() {
        assert!(is_valid_account_name("acme"));
        assert!(is_valid_account_name("Acme-Corp"));
        assert!(is_valid_account_name("acme_corp_2"));
        assert!(is_valid_account_name("a1"));
    }

    #[test]
    fn rejects_bad_names() {
        assert!(!is_valid_account_name(""));
        assert!(!is_valid_account_name("a"));
        assert!(!is_valid_account_name("-acme"));
        assert!(!is_valid_account_name("acme-"));
        assert!(!is_valid_account_name("acme--corp"));
        assert!(!is_valid_account_name("acme corp"));
        assert!(!is_valid_account_name("acme@corp"));
        assert!(!is_valid_account_name(&"a".repeat(40)));
    }

    #[test]
    fn accepts_reasonable_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn rejects_bad_emails() {
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("@example.com"));
    }
}
