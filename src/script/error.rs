//! Error types for script evaluation.
//!
//! The evaluator is the most failure-prone surface of the crate. Callers need
//! to tell user-caused failures (a bad script, shown to the author) apart
//! from host-caused failures (an internal bug, logged for diagnostics);
//! [`ScriptError::is_user_error`] makes that split.

use thiserror::Error;

/// Result type for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Classification of host-level runtime failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// The script referenced an undefined variable or function.
    UndefinedReference,
    /// An index or numeric argument was out of range.
    IndexOutOfRange,
    /// A shape declaration carried an unknown or invalid attribute.
    InvalidAttribute,
    /// A value had the wrong type for its position.
    TypeMismatch,
    /// The script requested a capability that is not implemented.
    Unimplemented,
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UndefinedReference => "undefined reference",
            Self::IndexOutOfRange => "index out of range",
            Self::InvalidAttribute => "invalid attribute",
            Self::TypeMismatch => "type mismatch",
            Self::Unimplemented => "unimplemented",
        };
        f.write_str(s)
    }
}

/// Errors produced by evaluating a footprint script.
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    /// The script could not be parsed.
    #[error("syntax error: {message}")]
    Syntax {
        /// Parser diagnostic.
        message: String,
    },

    /// The script executed but failed a host-level check.
    #[error("runtime error ({kind}): {message}")]
    Runtime {
        /// What class of check failed.
        kind: RuntimeErrorKind,
        /// Description of the failure.
        message: String,
    },

    /// The script explicitly signalled failure.
    ///
    /// Carries the script-provided message verbatim, with the engine's
    /// `Error:` wrapper prefix stripped.
    #[error("{message}")]
    ScriptThrown {
        /// Message thrown by the script.
        message: String,
    },

    /// Unexpected internal failure.
    ///
    /// Carries the full diagnostic trace for logging; not meant for
    /// end-user display.
    #[error("internal evaluator error: {message}")]
    Host {
        /// Full diagnostic text.
        message: String,
    },
}

impl ScriptError {
    /// Creates a runtime error.
    pub fn runtime(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self::Runtime {
            kind,
            message: message.into(),
        }
    }

    /// Creates an invalid-attribute runtime error.
    pub fn invalid_attribute(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::InvalidAttribute, message)
    }

    /// Creates a type-mismatch runtime error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::TypeMismatch, message)
    }

    /// Creates a host error.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// True when the failure was caused by the script author rather than an
    /// internal bug, so the message is suitable for end-user display.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Host { .. })
    }
}
