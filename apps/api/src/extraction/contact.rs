//! Contact Extractor — best-effort name/email/phone extraction from resume
//! text. Explicitly lossy and heuristic: an unmatched field stays `None`,
//! nothing here can fail a request.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid phone regex")
});

/// Common resume section headers that are never a candidate's name.
const SECTION_HEADERS: [&str; 6] = [
    "resume",
    "curriculum vitae",
    "cv",
    "profile",
    "summary",
    "contact",
];

const MAX_NAME_LEN: usize = 60;

/// Contact details scraped from a resume. All fields are optional; absence
/// of a match leaves a field empty rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Scans resume text for a candidate's name, email, and phone number.
/// Deterministic: the same text always yields the same contact.
pub fn extract_contact(text: &str) -> CandidateContact {
    CandidateContact {
        name: extract_name(text),
        email: EMAIL_RE.find(text).map(|m| m.as_str().to_string()),
        phone: PHONE_RE.find(text).map(|m| m.as_str().trim().to_string()),
    }
}

/// Heuristic: the first non-empty line that is not a section header and not
/// itself a contact line is taken as the candidate's name.
fn extract_name(text: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if SECTION_HEADERS.iter().any(|h| lower == *h) {
            continue;
        }
        if EMAIL_RE.is_match(line) || PHONE_RE.is_match(line) {
            continue;
        }
        let name: String = line.chars().take(MAX_NAME_LEN).collect();
        return Some(name);
    }
    None
}
