//! Slug derivation for group titles.

use crate::domain::error::DomainError;

const MAX_SLUG_LEN: usize = 64;

/// Derives a URL-safe slug from a group title. Fails when nothing
/// slug-worthy survives (e.g. a title of pure punctuation).
pub fn derive_slug(title: &str) -> Result<String, DomainError> {
    let candidate = slug::slugify(title.trim());
    if candidate.is_empty() {
        return Err(DomainError::UnsluggableTitle {
            value: title.to_string(),
        });
    }
    Ok(truncate_slug(candidate))
}

/// Validates a caller-supplied slug: lowercase ASCII alphanumerics and
/// hyphens, no leading/trailing/double hyphens.
pub fn validate_slug(candidate: &str) -> Result<(), DomainError> {
    let well_formed = !candidate.is_empty()
        && candidate.len() <= MAX_SLUG_LEN
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && !candidate.contains("--")
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(DomainError::UnsluggableTitle {
            value: candidate.to_string(),
        })
    }
}

fn truncate_slug(mut candidate: String) -> String {
    if candidate.len() > MAX_SLUG_LEN {
        candidate.truncate(MAX_SLUG_LEN);
        while candidate.ends_with('-') {
            candidate.pop();
        }
    }
    candidate
}
