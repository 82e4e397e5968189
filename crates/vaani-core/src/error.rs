use thiserror::Error;

/// Top-level error type for the Vaani system.
///
/// Covers configuration and catalog loading. Conversation-level failures
/// live in `vaani_chat::ChatError`, which converts from this type so `?`
/// works across the crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VaaniError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VaaniError {
    fn from(err: toml::de::Error) -> Self {
        VaaniError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VaaniError {
    fn from(err: toml::ser::Error) -> Self {
        VaaniError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VaaniError {
    fn from(err: serde_json::Error) -> Self {
        VaaniError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Vaani operations.
pub type Result<T> = std::result::Result<T, VaaniError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases: Vec<(VaaniError, &str)> = vec![
            (
                VaaniError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                VaaniError::Catalog("empty reply pool".to_string()),
                "Catalog error: empty reply pool",
            ),
            (
                VaaniError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VaaniError = io_err.into();
        assert!(matches!(err, VaaniError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let vaani_err: VaaniError = err.unwrap_err().into();
        assert!(matches!(vaani_err, VaaniError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let vaani_err: VaaniError = err.unwrap_err().into();
        assert!(matches!(vaani_err, VaaniError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
