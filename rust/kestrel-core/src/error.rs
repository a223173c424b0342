//! Error taxonomy for the object core.
//!
//! Every failure carries the routine that raised it and a condition message,
//! rendered as `(routine) Kind: message`. Errors always propagate; the only
//! negative result that is not an error is a lookup-chain miss.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Result alias used by every fallible object operation.
pub type ObjResult<T> = Result<T, ObjError>;

/// The kind of an [`ObjError`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    TypeError,
    KeyError,
    RuntimeError,
    ValueError,
    /// Raised by user code (a native routine or a compiled frame).
    Raised,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjError {
    #[error("({routine}) TypeError: {message}")]
    TypeError {
        routine: &'static str,
        message: String,
    },
    #[error("({routine}) KeyError: {message}")]
    KeyError {
        routine: &'static str,
        message: String,
    },
    #[error("({routine}) RuntimeError: {message}")]
    RuntimeError {
        routine: &'static str,
        message: String,
    },
    #[error("({routine}) ValueError: {message}")]
    ValueError {
        routine: &'static str,
        message: String,
    },
    #[error("{0}")]
    Raised(String),
}

impl ObjError {
    pub fn type_error(routine: &'static str, message: impl Into<String>) -> Self {
        ObjError::TypeError {
            routine,
            message: message.into(),
        }
    }

    pub fn key_error(routine: &'static str, message: impl Into<String>) -> Self {
        ObjError::KeyError {
            routine,
            message: message.into(),
        }
    }

    pub fn runtime_error(routine: &'static str, message: impl Into<String>) -> Self {
        ObjError::RuntimeError {
            routine,
            message: message.into(),
        }
    }

    pub fn value_error(routine: &'static str, message: impl Into<String>) -> Self {
        ObjError::ValueError {
            routine,
            message: message.into(),
        }
    }

    /// An error raised by user code with a free-form message.
    pub fn raised(message: impl Into<String>) -> Self {
        ObjError::Raised(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjError::TypeError { .. } => ErrorKind::TypeError,
            ObjError::KeyError { .. } => ErrorKind::KeyError,
            ObjError::RuntimeError { .. } => ErrorKind::RuntimeError,
            ObjError::ValueError { .. } => ErrorKind::ValueError,
            ObjError::Raised(_) => ErrorKind::Raised,
        }
    }

    /// Name of the routine that raised the error, if it was raised by the core.
    pub fn routine(&self) -> Option<&'static str> {
        match self {
            ObjError::TypeError { routine, .. }
            | ObjError::KeyError { routine, .. }
            | ObjError::RuntimeError { routine, .. }
            | ObjError::ValueError { routine, .. } => Some(routine),
            ObjError::Raised(_) => None,
        }
    }

    /// The condition message without the routine/kind prefix.
    pub fn message(&self) -> &str {
        match self {
            ObjError::TypeError { message, .. }
            | ObjError::KeyError { message, .. }
            | ObjError::RuntimeError { message, .. }
            | ObjError::ValueError { message, .. } => message,
            ObjError::Raised(message) => message,
        }
    }

    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::TypeError
    }

    pub fn is_key_error(&self) -> bool {
        self.kind() == ErrorKind::KeyError
    }

    pub fn is_runtime_error(&self) -> bool {
        self.kind() == ErrorKind::RuntimeError
    }

    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::ValueError
    }

    /// Check if the rendered message contains `needle`.
    pub fn message_contains(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }
}
