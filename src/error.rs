//! Error taxonomy of the separation engine.
//!
//! Running out of usable candidates during a search is not
//! an error: it is reported through the "unknown
//! temperature" [`TesResult`][crate::search::TesResult].

use thiserror::Error;

use crate::spectrum::Window;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TesError {
    /// Malformed, empty or mismatched reference data.
    #[error("invalid {origin} data: {reason}")]
    Data {
        origin: &'static str,
        reason: String,
    },

    /// A metric window holds fewer than three valid points.
    #[error("window {window} has {valid} valid points, at least 3 are required")]
    InsufficientData { window: Window, valid: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("search cancelled")]
    Cancelled,
}

impl TesError {
    pub(crate) fn data(origin: &'static str, reason: impl Into<String>) -> Self {
        TesError::Data {
            origin,
            reason: reason.into(),
        }
    }

    pub(crate) fn param(reason: impl Into<String>) -> Self {
        TesError::InvalidParameter(reason.into())
    }
}

pub type Result<T, E = TesError> = std::result::Result<T, E>;
