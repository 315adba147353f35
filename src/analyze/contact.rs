//! Contact field extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Contact;

// ASCII word boundaries: "邮箱alice@example.com" has no Unicode boundary
// before the address.
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?-u:\b)").unwrap()
});

// Mobile numbers with an optional country prefix, or landlines with an
// optional area code.
static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:\+|00)86)?1[3-9]\d{9}|(?:0\d{2,3}-?)?[1-9]\d{6,7}").unwrap()
});

static WEBSITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}(?-u:\b)[-a-zA-Z0-9()@:%_+.~#?&/=]*",
    )
    .unwrap()
});

static GITHUB: Lazy<Regex> = Lazy::new(|| Regex::new(r"github\.com/[a-zA-Z0-9_-]+").unwrap());

/// First email address in `text`.
pub fn find_email(text: &str) -> Option<&str> {
    EMAIL.find(text).map(|m| m.as_str())
}

/// First phone number in `text`.
pub fn find_phone(text: &str) -> Option<&str> {
    PHONE.find(text).map(|m| m.as_str())
}

/// First `http(s)` URL that is not a GitHub link.
pub fn find_website(text: &str) -> Option<&str> {
    WEBSITE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|url| !url.contains("github"))
}

/// First GitHub profile, as an absolute `https://github.com/<user>` URL.
pub fn find_github(text: &str) -> Option<String> {
    GITHUB
        .find(text)
        .map(|m| format!("https://{}", m.as_str()))
}

/// Collect all contact fields; absent fields stay empty.
pub fn extract_contact(text: &str) -> Contact {
    Contact {
        email: find_email(text).unwrap_or_default().to_string(),
        phone: find_phone(text).unwrap_or_default().to_string(),
        website: find_website(text).unwrap_or_default().to_string(),
        github: find_github(text).unwrap_or_default(),
    }
}
