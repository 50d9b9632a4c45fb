use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Metadata attached to a remote function's response.
///
/// The transport fills this in for completed-but-unsuccessful invocations so
/// that callers can diagnose failures without the engine having to understand
/// the transport's wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// Completion status reported by the remote endpoint.
    pub status: u16,
    /// Additional transport-specific response metadata, for diagnostics.
    pub fields: BTreeMap<String, String>,
}

impl ResponseMeta {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            fields: BTreeMap::new(),
        }
    }
}

/// An error raised by the [`Transport`](crate::Transport) while performing the
/// remote call.
///
/// The engine treats all three variants uniformly: a transport failure is
/// surfaced to the caller that owns the failing computation, but it is never
/// replayed to callers that observe it later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be dispatched to the remote function at all.
    #[error("failed to dispatch invocation: {0}")]
    Dispatch(String),
    /// The remote function was invoked but reported a non-success status.
    #[error("invocation completed with status {}", .0.status)]
    Status(ResponseMeta),
    /// The invocation succeeded at the protocol level, but its response
    /// payload could not be read.
    #[error("failed to read response payload: {reason}")]
    Read {
        meta: ResponseMeta,
        reason: String,
    },
}

/// An arbitrary error raised while decoding a response payload.
///
/// Decode errors are cacheable: the freshness policy decides whether they are
/// replayed to later callers. The original error remains available via
/// [`downcast_ref`](Self::downcast_ref), so policies can inspect
/// collaborator-specific error types.
#[derive(Debug, Clone)]
pub struct DecodeError(Arc<anyhow::Error>);

impl DecodeError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self(Arc::new(error.into()))
    }

    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// Attempts to downcast to a concrete error type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// An error raised while encoding a request into a [`CacheKey`](crate::CacheKey).
///
/// Encode errors are never cached; they propagate directly to the caller that
/// triggered them.
#[derive(Debug, Clone)]
pub struct EncodeError(Arc<anyhow::Error>);

impl EncodeError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self(Arc::new(error.into()))
    }

    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(anyhow::Error::msg(message)))
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// The error type produced by [`Memoizer::invoke`](crate::Memoizer::invoke).
///
/// This enum is intended for caching and replay, which is why all variants are
/// cloneable. Only the [`Decode`](Self::Decode) variant is subject to the
/// freshness policy; transport failures are always discarded by later
/// observers, and encode failures never enter a computation in the first
/// place.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The remote call itself failed.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// The response payload could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),
    /// The request could not be encoded into a cache key.
    #[error("failed to encode request: {0}")]
    Encode(#[from] EncodeError),
}

/// The terminal state of a computation, either a decoded value or the error
/// that produced it.
pub type Outcome<T> = Result<T, InvokeError>;
