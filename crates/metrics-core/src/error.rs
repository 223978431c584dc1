//! Unified Error Model
use thiserror::Error;

/// Errors that escape a computation.
///
/// Plugin faults and degraded features (timezone, token scopes) never
/// surface here; they are absorbed into the computed data instead.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("INJECTED/{0}")]
    Injected(String),

    #[error("WRAPPED/{0}")]
    Wrapped(#[source] Box<ComputeError>),
}

impl ComputeError {
    /// Innermost error, looking through formatter wrapping
    pub fn root(&self) -> &ComputeError {
        match self {
            Self::Wrapped(inner) => inner.root(),
            other => other,
        }
    }

    /// Whether this failure was requested through the `--error` debug flag
    pub fn is_injected(&self) -> bool {
        matches!(self.root(), Self::Injected(_))
    }
}

/// Errors raised while building a plugin registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("REGISTRY/duplicate plugin name: {0}")]
    Duplicate(String),

    #[error("REGISTRY/invalid plugin name: {0:?}")]
    InvalidName(String),

    #[error("REGISTRY/reserved plugin name: {0}")]
    Reserved(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_looks_through_wrapping() {
        let err = ComputeError::Wrapped(Box::new(ComputeError::Wrapped(Box::new(
            ComputeError::Injected("boom".to_string()),
        ))));
        assert!(err.is_injected());
        assert_eq!(err.root().to_string(), "INJECTED/boom");
        assert_eq!(err.to_string(), "WRAPPED/WRAPPED/INJECTED/boom");
    }
}
