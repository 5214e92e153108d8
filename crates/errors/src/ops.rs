//! Operation orchestration error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OpsError {
    #[error("component not found: {component}")]
    MissingComponent { component: String },

    #[error("unknown driver: {driver}")]
    UnknownDriver { driver: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl crate::UserFacingError for OpsError {
    fn user_message(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownDriver { .. } => {
                Some("Known drivers: xennet, xenvif, xenvbd, xeniface, xenbus.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::MissingComponent { .. } => "ops.missing_component",
            Self::UnknownDriver { .. } => "ops.unknown_driver",
            Self::SerializationError { .. } => "ops.serialization",
        })
    }
}
