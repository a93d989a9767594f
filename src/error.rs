//! Error handling for ledger-holdings
//!
//! Structural problems (bad option combinations, unreadable CSV headers)
//! are typed errors that fail fast. Data-coverage gaps such as missing
//! prices or tickers are not errors at all; they degrade the result and
//! show up in logs and the classification debug view.

use thiserror::Error;

/// Core error types for holdings reports
#[derive(Error, Debug)]
pub enum HoldingsError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("csv error")]
    Csv(#[from] csv::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for holdings operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = HoldingsError::Configuration("--relative needs --currency".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: --relative needs --currency"
        );
    }

    #[test]
    fn test_format_error_downcasts_through_anyhow() {
        use anyhow::Context;
        let result: Result<()> = Err(HoldingsError::Format("bad header".to_string()))
            .context("failed to load holdings");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to load holdings"));
        assert!(matches!(
            err.downcast_ref::<HoldingsError>(),
            Some(HoldingsError::Format(_))
        ));
    }
}
