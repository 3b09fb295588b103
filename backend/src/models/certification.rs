// src/models/certification.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'certifications' table. Every catalogue, history and test
/// view can be scoped to one certification, addressed by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Certification {
    pub id: i64,
    /// URL name, e.g. "ml-engineer".
    pub slug: String,
    /// Vendor exam code, e.g. "MLA-C01".
    pub code: String,
    pub name: String,
    pub provider: String,
}

/// DTO for creating or replacing a certification (admin).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CertificationInput {
    #[validate(length(min = 1, max = 64), custom(function = validate_slug))]
    pub slug: String,
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub provider: String,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let well_formed = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !well_formed {
        return Err(validator::ValidationError::new("invalid_slug"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(slug: &str) -> CertificationInput {
        CertificationInput {
            slug: slug.to_string(),
            code: "MLA-C01".to_string(),
            name: "Machine Learning Engineer".to_string(),
            provider: "AWS".to_string(),
        }
    }

    #[test]
    fn slugs_are_lowercase_words_joined_by_dashes() {
        assert!(input("ml-engineer").validate().is_ok());
        assert!(input("ML-Engineer").validate().is_err());
        assert!(input("-ml").validate().is_err());
        assert!(input("ml engineer").validate().is_err());
    }
}
