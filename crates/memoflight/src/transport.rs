use bytes::Bytes;

use crate::error::TransportError;

/// Performs the actual remote call.
///
/// Implementations are expected to block; the [`Memoizer`](crate::Memoizer)
/// off-loads `invoke` onto the blocking worker pool so that it does not stall
/// other logical invocations. Any timeout policy belongs here, not in the
/// engine.
///
/// The three [`TransportError`] variants distinguish the failure modes a
/// transport must signal: the call could not be dispatched, it completed with
/// a non-success status, or its response payload could not be read.
pub trait Transport: Send + Sync {
    fn invoke(&self, payload: Bytes) -> Result<Bytes, TransportError>;
}
