use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration: {0}")]
    Configuration(String),

    #[error("Pool initialization failed: {0}")]
    PoolInit(#[source] sea_orm::DbErr),

    #[error("Connection pool is not initialized")]
    PoolNotInitialized,

    #[error("Connection pool exhausted ({max_size} connections in use)")]
    PoolExhausted { max_size: u32 },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl DomainError {
    /// Wraps a database error raised while running `operation`.
    pub fn storage(operation: &'static str) -> impl FnOnce(sea_orm::DbErr) -> Self {
        move |source| Self::Storage { operation, source }
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Whether this error is likely transient and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::Timeout { .. } | Self::Storage { .. }
        )
    }

    /// Stable category name, safe to show to untrusted callers.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::PoolInit(_) => "pool_init",
            Self::PoolNotInitialized => "pool_not_initialized",
            Self::PoolExhausted { .. } => "pool_exhausted",
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage { .. } => "storage",
            Self::Timeout { .. } => "timeout",
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_source() {
        let err = DomainError::storage("add_spot")(sea_orm::DbErr::Custom("disk full".into()));
        assert_eq!(err.category(), "storage");
        assert!(err.to_string().contains("add_spot"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_transient());
    }

    #[test]
    fn not_found_message() {
        let err = DomainError::not_found("ParkingSpot", "id", 7);
        assert_eq!(err.to_string(), "Not found: ParkingSpot with id=7");
        assert!(!err.is_transient());
    }

    #[test]
    fn infra_errors_surface_through_app_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: AppError = InfraError::from(io).into();
        assert_eq!(err.to_string(), "I/O error: port taken");
    }

    #[test]
    fn timeout_message_in_millis() {
        let err = DomainError::Timeout {
            operation: "list_spots",
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "list_spots timed out after 250ms");
    }
}
