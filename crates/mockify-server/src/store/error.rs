//! Store error types

use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Organization with name '{0}' already exists for this user")]
    DuplicateOrganizationName(String),

    #[error("Referenced {entity} {id} does not exist")]
    MissingParent { entity: &'static str, id: i64 },

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub const fn is_duplicate_email(&self) -> bool {
        matches!(self, Self::DuplicateEmail(_))
    }

    #[must_use]
    pub const fn is_duplicate_organization_name(&self) -> bool {
        matches!(self, Self::DuplicateOrganizationName(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_display() {
        let err = StoreError::DuplicateEmail("a@b.com".to_string());
        assert!(err.to_string().contains("a@b.com"));
        assert!(err.is_duplicate_email());
    }

    #[test]
    fn test_duplicate_organization_name_display() {
        let err = StoreError::DuplicateOrganizationName("Acme".to_string());
        assert!(err.to_string().contains("'Acme'"));
        assert!(err.is_duplicate_organization_name());
        assert!(!err.is_duplicate_email());
    }

    #[test]
    fn test_missing_parent_display() {
        let err = StoreError::MissingParent {
            entity: "project",
            id: 42,
        };
        assert_eq!(err.to_string(), "Referenced project 42 does not exist");
        assert!(!err.is_duplicate_email());
    }

    #[test]
    fn test_backend_error_display() {
        let err = StoreError::Backend("connection reset".to_string());
        assert!(err.to_string().contains("connection reset"));
    }
}
