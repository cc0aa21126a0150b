use models::errors::ModelError;
use models::validation::Violations;
use thiserror::Error;

/// The only message an adapter may return for an internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "An error has occurred.";

pub const CUSTOMERS_NOT_FOUND: &str = "No customers found.";
pub const CUSTOMER_BY_ID_NOT_FOUND: &str = "Customer not found with ID: ";
pub const CUSTOMERS_BY_NAME_NOT_FOUND: &str = "No customers found with the given name: ";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(Violations),
    #[error("{0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error classes every transport must keep apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    Internal,
}

impl ErrorKind {
    /// Stable code for wire encodings and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl ServiceError {
    pub fn customer_not_found(id: i32) -> Self {
        Self::NotFound(format!("{CUSTOMER_BY_ID_NOT_FOUND}{id}"))
    }

    pub fn no_customers() -> Self { Self::NotFound(CUSTOMERS_NOT_FOUND.to_string()) }

    pub fn no_customers_named(fragment: &str) -> Self {
        Self::NotFound(format!("{CUSTOMERS_BY_NAME_NOT_FOUND}{fragment}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Validation(_) => ErrorKind::ValidationFailed,
            ServiceError::Db(_) | ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Violations carried by a validation failure.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            ServiceError::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Message safe to put on the wire: internal details are replaced by
    /// [`INTERNAL_ERROR_MESSAGE`].
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Db(msg) => Self::Db(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::validation::Violation;

    #[test]
    fn kinds_and_public_messages() {
        let nf = ServiceError::customer_not_found(7);
        assert_eq!(nf.kind(), ErrorKind::NotFound);
        assert_eq!(nf.public_message(), "Customer not found with ID: 7");

        let db = ServiceError::Db("connection refused on 10.0.0.3".into());
        assert_eq!(db.kind(), ErrorKind::Internal);
        assert_eq!(db.public_message(), INTERNAL_ERROR_MESSAGE);

        let v = ServiceError::Validation(vec![Violation::new("name", "bad")].into());
        assert_eq!(v.kind().as_str(), "VALIDATION_FAILED");
        assert_eq!(v.violations().map(|v| v.len()), Some(1));
    }

    #[test]
    fn model_db_error_stays_db() {
        let e: ServiceError = ModelError::Db("boom".into()).into();
        assert!(matches!(e, ServiceError::Db(ref m) if m == "boom"));
    }
}
