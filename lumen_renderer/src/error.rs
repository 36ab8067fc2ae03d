//! Error types for the Lumen renderer
//!
//! Only genuine failures surface as errors. Quality fallbacks (shadow atlas
//! full, instancing unsupported) are logged and recovered locally, never
//! returned to the caller.

use std::fmt;
use crate::renderer::FramePhase;

/// Result type for Lumen renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen renderer errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A frame step was called out of order
    InvalidPhase {
        /// Name of the rejected operation
        operation: &'static str,
        /// Phases in which the operation is legal
        expected: &'static [FramePhase],
        /// Phase the renderer was in
        actual: FramePhase,
    },

    /// Invalid resource (geometry, material, shader, node, light)
    InvalidResource(String),

    /// Invalid configuration value
    InvalidConfig(String),

    /// Error reported by the draw submission layer
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPhase { operation, expected, actual } => write!(
                f,
                "Invalid frame phase: {} called in {:?}, expected one of {:?}",
                operation, actual, expected
            ),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error::BackendError` from a format string
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("lumen::Renderer", "Submitter rejected batch {}", index);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::lumen::Error::BackendError(message)
    }};
}

/// Log an error and return early with `Err(Error::BackendError)`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
