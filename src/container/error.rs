//! Container error definitions.

use thiserror::Error;

/// Boxed error raised by a source while building an instance.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering or resolving dependencies.
///
/// All of these are configuration or programming errors. They surface
/// synchronously to the caller of `set`, `make` or `invoke` and are never
/// retried.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// An empty address was supplied.
    #[error("dependency address must not be empty")]
    MissingAddress,

    /// The address is already taken.
    #[error("dependency \"{0}\" is already registered")]
    DuplicateAddress(String),

    /// The entry cannot be registered as given.
    #[error("dependency \"{address}\" is invalid: {reason}")]
    InvalidEntry { address: String, reason: String },

    /// Nothing is registered under the address.
    #[error("dependency \"{0}\" is not registered")]
    UnknownAddress(String),

    /// A parameter name is bound both as a literal and as a resolved dependency.
    #[error("parameter \"{param}\" of \"{address}\" is bound both as a literal and as a resolved dependency")]
    ParamKeyCollision { address: String, param: String },

    /// Resolution re-entered an address that is still being built.
    #[error("cyclic dependency: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// A value did not have the requested type.
    #[error("\"{subject}\" is not a {expected}")]
    TypeMismatch { subject: String, expected: &'static str },

    /// A source required a parameter that was not supplied.
    #[error("dependency \"{address}\" requires parameter \"{param}\"")]
    MissingParam { address: String, param: String },

    /// The source itself failed.
    #[error("failed to construct \"{address}\": {source}")]
    Construction {
        address: String,
        #[source]
        source: BoxError,
    },
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_dependency_names_the_chain() {
        let err = ContainerError::CyclicDependency {
            chain: vec!["a/A".into(), "b/B".into(), "a/A".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: a/A -> b/B -> a/A");
    }

    #[test]
    fn test_construction_keeps_source() {
        let err = ContainerError::Construction {
            address: "db/Pool".into(),
            source: "connection refused".into(),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "failed to construct \"db/Pool\": connection refused");
    }
}
