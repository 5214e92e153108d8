//! Process execution operations

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use std::fmt;

use crate::core::PlatformContext;

/// Platform-specific command builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCommand {
    program: String,
    args: Vec<String>,
}

impl PlatformCommand {
    /// Create a new platform command
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Add an argument to the command
    #[must_use]
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments to the command
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Get the program name
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the arguments
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for PlatformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Trait for process execution operations
#[async_trait]
pub trait ProcessOperations: Send + Sync {
    /// Run a command to completion and return its exit code
    async fn run(&self, ctx: &PlatformContext, cmd: PlatformCommand)
        -> Result<i32, PlatformError>;
}
