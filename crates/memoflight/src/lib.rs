//! # Single-flight memoization for remote function invocations
//!
//! Memoflight deduplicates concurrent and repeated calls to a remote
//! invokable function (typically a serverless compute endpoint) that share
//! the same request payload. Callers who issue many logically-identical
//! requests against an expensive or rate-limited remote function get at most
//! one outstanding remote call per unique key, while still controlling
//! per-result freshness.
//!
//! ## Architecture
//!
//! The [`Memoizer`] composes four injected collaborators around a
//! [`Transport`]:
//!
//! - A [`KeyEncoder`] deterministically serializes a request into an opaque
//!   [`CacheKey`]. The default is canonical JSON with sorted object keys, so
//!   structurally equal requests collide regardless of field order. The
//!   encoded bytes double as the transport payload.
//! - A [`ResponseDecoder`] turns the raw response payload into the caller's
//!   result type. The default parses the response as JSON.
//! - A [`FreshnessPolicy`] decides whether a completed outcome (a value or a
//!   decode error; never a transport failure) may be replayed. The default
//!   reuses everything.
//! - A [`CacheStore`] maps keys to [`Computation`] handles. The default is an
//!   unbounded in-memory map; a bounded [`MokaStore`] is provided, and stores
//!   can be shared across memoizers through `Arc`.
//!
//! A computation is a spawned task running one off-loaded blocking transport
//! call followed by a decode. Its handle is a shared channel, so any number
//! of concurrent callers await the same computation and collectively trigger
//! only one remote call. Computations are never cancelled: once dispatched
//! they run to completion even if every caller is gone.
//!
//! ## Failure semantics
//!
//! The error taxonomy is deliberate and drives reuse:
//!
//! - [`TransportError`]s are never replayed. The caller that started the
//!   failing computation receives it on its own await; a caller observing it
//!   later transparently retries with a fresh computation. The engine does
//!   not serialize those retries: several callers that each observe the same
//!   failure may each spawn their own retry. This is intentional and relies
//!   on the store access not being atomic across the whole
//!   read-decide-write sequence.
//! - Decode errors are cached and replayed like values, subject to the
//!   freshness policy, which can inspect the concrete error via
//!   [`DecodeError::downcast_ref`].
//! - Encode errors propagate immediately to the triggering caller and are
//!   never cached.
//!
//! ## Metrics
//!
//! When statsd reporting is enabled via [`configure_statsd`], the following
//! metrics are emitted:
//!
//! - `invocations.access`: all `invoke` calls that produced a key.
//! - `invocations.store.hit`: a computation was found in the store.
//! - `invocations.reused` (tagged with `status`): a completed outcome was
//!   replayed to a caller.
//! - `invocations.computation`: fresh computations spawned.
//! - `invocations.computation.duration`: wall time of transport call plus
//!   decode.

#[macro_use]
pub mod metrics;

mod codec;
mod computation;
mod error;
mod key;
mod memoizer;
mod policy;
mod store;
mod transport;

pub use codec::{JsonDecoder, JsonKeyEncoder, KeyEncoder, ResponseDecoder};
pub use computation::Computation;
pub use error::{DecodeError, EncodeError, InvokeError, Outcome, ResponseMeta, TransportError};
pub use key::CacheKey;
pub use memoizer::Memoizer;
pub use metrics::configure_statsd;
pub use policy::{AlwaysReuse, FreshnessPolicy};
pub use store::{CacheStore, MemoryStore, MokaStore};
pub use transport::Transport;
