//! CLI error handling

use std::fmt;

use pvdrv_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(pvdrv_errors::ConfigError),
    /// Operations error
    Ops(pvdrv_errors::Error),
    /// System setup error
    Setup(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Setup(msg) => write!(f, "System setup error: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Setup(_) => None,
        }
    }
}

impl From<pvdrv_errors::ConfigError> for CliError {
    fn from(e: pvdrv_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<pvdrv_errors::Error> for CliError {
    fn from(e: pvdrv_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<pvdrv_errors::PlatformError> for CliError {
    fn from(e: pvdrv_errors::PlatformError) -> Self {
        CliError::Ops(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvdrv_errors::CleanupError;

    #[test]
    fn ops_error_shows_code_and_hint() {
        let err = CliError::from(pvdrv_errors::Error::from(CleanupError::UninstallFailed {
            product_code: "{ABC}".to_string(),
            exit_code: 1603,
            attempts: 5,
        }));
        let rendered = err.to_string();
        assert!(rendered.contains("{ABC}"));
        assert!(rendered.contains("Code: "));
    }
}
