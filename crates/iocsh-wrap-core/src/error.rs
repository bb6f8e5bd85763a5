//! Error types for argument conversion, dispatch and descriptor building.

use std::any::Any;

use thiserror::Error;

/// Errors that can occur while converting a shell slot into a native argument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The slot carries a different tag than the parameter kind expects.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The host supplied fewer slots than the function has parameters.
    #[error("missing argument slot {index} (buffer has {count} slots)")]
    MissingSlot { index: usize, count: usize },

    /// Invalid UTF-8 in string
    #[error("invalid UTF-8 string data")]
    InvalidUtf8,

    /// A null string was passed where a value is required.
    #[error("null string cannot be converted to {target_type}")]
    NullString { target_type: &'static str },

    /// A complex literal did not match `<real> j <imag>`.
    #[error("malformed complex value {input:?}, expected \"<real> j <imag>\"")]
    MalformedComplex { input: String },
}

/// A failure raised by the wrapped function itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The function panicked with a printable payload.
    #[error("exception: {message}")]
    Panic { message: String },

    /// The function panicked with a payload that carries no message.
    #[error("unknown exception")]
    Unknown,
}

impl TargetError {
    /// Build from a payload caught by `std::panic::catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<String>() {
            Ok(message) => Self::Panic { message: *message },
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => Self::Panic {
                    message: (*message).to_owned(),
                },
                Err(_) => Self::Unknown,
            },
        }
    }
}

/// Errors that abort a single command invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// Conversion of one argument failed; the target was never invoked.
    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// The target (or a converter) panicked.
    #[error(transparent)]
    Target(#[from] TargetError),
}

/// Errors raised while building a function descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// `release` was called with an argument slot never filled in.
    #[error("argument {index} of '{function}' has no descriptor")]
    MissingArgument { function: String, index: usize },

    /// A name cannot be handed to the host because it contains a NUL byte.
    #[error("{what} contains an interior NUL byte: {value:?}")]
    InteriorNul { what: &'static str, value: String },

    /// The host stores the argument count in a C `int`.
    #[error("'{function}' has too many arguments ({count})")]
    TooManyArguments { function: String, count: usize },
}
