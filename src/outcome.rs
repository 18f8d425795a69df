//! Four-state result reported by every orchestrated operation.
//!
//! `Warning` means the request was well-formed but nothing happened (target
//! missing, invalid input), `Debug` carries diagnostic information, and
//! `Failure` wraps a fault that callers should treat as an error.

use crate::error::{Result, StickerError};

#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Warning(String),
    Debug(String),
    Failure(StickerError),
}

impl<T> Outcome<T> {
    /// `Ok` becomes `Success`, `Err` becomes `Failure`.
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Failure(e),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub const fn is_debug(&self) -> bool {
        matches!(self, Self::Debug(_))
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The success value, discarding any other state.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Message of a Warning or Debug outcome.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Warning(m) | Self::Debug(m) => Some(m),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&StickerError> {
        match self {
            Self::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(v) => Outcome::Success(f(v)),
            Self::Warning(m) => Outcome::Warning(m),
            Self::Debug(m) => Outcome::Debug(m),
            Self::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Only `Failure` becomes `Err`; the other states keep their meaning
    /// in the `Ok` value.
    pub fn into_result(self) -> Result<Self> {
        match self {
            Self::Failure(e) => Err(e),
            other => Ok(other),
        }
    }

    /// Short lowercase label, used in logs and robot output.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Warning(_) => "warning",
            Self::Debug(_) => "debug",
            Self::Failure(_) => "failure",
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        Self::from_result(result)
    }
}
