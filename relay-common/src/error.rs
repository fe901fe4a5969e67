//! Error types for the chat relay.

use thiserror::Error;

/// Errors raised while interpreting relay settings.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("unknown provider 'foo'".into());
        assert_eq!(err.to_string(), "Configuration error: unknown provider 'foo'");
    }
}
