//! Subject (upstream username) validation and per-subject limit clamping.
//!
//! A subject is immutable once accepted into a feed's subject set, so the
//! rules here are the single gate for what the rest of the engine sees.

use thiserror::Error;

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 50;
pub const DEFAULT_LIMIT: i64 = 15;

const MAX_SUBJECT_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubjectError {
    #[error("invalid subject {0:?}: expected 1-32 characters of [A-Za-z0-9_-]")]
    Invalid(String),
    #[error("no valid subjects given")]
    Empty,
}

/// Accepts 1-32 characters of `[A-Za-z0-9_-]`, nothing else.
pub fn validate_subject(subject: &str) -> Result<(), SubjectError> {
    let valid = !subject.is_empty()
        && subject.len() <= MAX_SUBJECT_LEN
        && subject
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SubjectError::Invalid(subject.to_string()))
    }
}

/// Parses a comma-separated subject list.
///
/// Entries are trimmed, blanks dropped, and duplicates removed while
/// preserving first-seen order. Any invalid entry fails the whole list
/// rather than being silently dropped.
pub fn parse_subject_list(raw: &str) -> Result<Vec<String>, SubjectError> {
    let mut subjects = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        validate_subject(trimmed)?;
        if !subjects.iter().any(|s| s == trimmed) {
            subjects.push(trimmed.to_string());
        }
    }
    if subjects.is_empty() {
        return Err(SubjectError::Empty);
    }
    Ok(subjects)
}

/// Clamps a per-subject item limit to `[1, 50]`.
///
/// Unset or non-positive input falls back to the default of 15 rather than
/// clamping to the minimum.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        None => DEFAULT_LIMIT,
        Some(v) if v <= 0 => DEFAULT_LIMIT,
        Some(v) => v.clamp(MIN_LIMIT, MAX_LIMIT),
    }
}
