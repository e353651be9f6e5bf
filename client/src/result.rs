use url::Url;

/// Boxed error carried by variants that wrap an underlying failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of an executed request: a typed success value, or a categorized
/// failure. Delivered exactly once through the completion callback.
pub type ApiResult<S, E> = std::result::Result<S, ResultError<E>>;

/// Top-level failure envelope. Every completion path funnels into one of
/// these four variants; nothing is thrown across the async boundary.
#[derive(Debug, thiserror::Error)]
pub enum ResultError<E> {
    /// Application-level semantic error. Never produced by this crate; a
    /// pass-through channel for callers layering their own checks on top.
    #[error("client error")]
    Client(E),
    /// Failure attributable to the remote endpoint.
    #[error("server error: {0}")]
    Server(ServerError),
    /// Connectivity-level transport failure (DNS, timeout, TLS, reset).
    #[error("network error: {0}")]
    Network(#[source] BoxError),
    /// A transport failure that fits no recognized category.
    #[error("unexpected error: {0}")]
    Unexpected(#[source] BoxError),
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The endpoint answered with a failing status code (>= 500).
    #[error("HTTP {code} from {url:?}")]
    Status { code: u16, url: Option<Url> },
    /// Request data could not be serialized for the wire.
    #[error("serialization failed: {0}")]
    Serialization(DataError),
    /// Response body could not be parsed into the expected shape.
    #[error("parsing failed: {0}")]
    Parsing(DataError),
    /// Server behavior that fits no other variant.
    #[error("unexpected server behavior: {0:?}")]
    Unexpected(Option<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Underlying decoder error, carried verbatim.
    #[error(transparent)]
    Wrapped(BoxError),
    /// Data decoded, but not into the shape the caller declared. Keeps the
    /// offending decoded value for diagnostics.
    #[error("{message} (value: {value})")]
    Format {
        message: String,
        value: serde_json::Value,
    },
}
