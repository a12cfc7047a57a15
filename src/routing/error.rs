//! Routing error definitions.

use thiserror::Error;

/// Errors raised while building a router. Lookups never fail.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A route's path pattern does not compile.
    #[error("malformed path pattern \"{pattern}\": {source}")]
    MalformedPathPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
