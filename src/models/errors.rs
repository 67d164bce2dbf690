use thiserror::Error;

/// Service-level errors surfaced by cart and catalog operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Cannot add more than {max_quantity} {unit}")]
    CapacityExceeded { max_quantity: u32, unit: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Cart amount exceeds the supported range")]
    AmountOutOfRange,

    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised by the cart persistence collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend unavailable")]
    ConnectionFailed,

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },

    #[error("Malformed stored value for key {key}: {message}")]
    MalformedValue { key: String, message: String },
}

/// Errors raised while loading the crop catalog from its tabular source
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog source unreadable: {path}: {message}")]
    SourceUnreadable { path: String, message: String },

    #[error("Catalog source malformed: {reason}")]
    Malformed { reason: String },
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Value out of range: {field}, min={min}, max={max}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for catalog loading
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
