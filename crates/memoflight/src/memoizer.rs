use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::codec::{JsonDecoder, JsonKeyEncoder, KeyEncoder, ResponseDecoder};
use crate::computation::Computation;
use crate::error::{InvokeError, Outcome, TransportError};
use crate::policy::{AlwaysReuse, FreshnessPolicy};
use crate::store::{CacheStore, MemoryStore};
use crate::transport::Transport;

/// Memoizes calls to a remote invokable function.
///
/// The memoizer composes four injected collaborators around a [`Transport`]:
/// a [`KeyEncoder`], a [`ResponseDecoder`], a [`FreshnessPolicy`] and a
/// [`CacheStore`]. Each has a default (canonical JSON, JSON, always-reuse,
/// unbounded in-memory) that can be swapped via the `with_*` methods, which
/// follow the builder style and may change the memoizer's type.
///
/// Concurrent [`invoke`](Self::invoke) calls for the same key share a single
/// remote call. See `invoke` for the exact reuse rules.
pub struct Memoizer<
    D: ResponseDecoder,
    K = JsonKeyEncoder,
    P = AlwaysReuse,
    S = MemoryStore<<D as ResponseDecoder>::Item>,
> {
    transport: Arc<dyn Transport>,
    encoder: K,
    decoder: Arc<D>,
    policy: P,
    store: S,
}

impl<T> Memoizer<JsonDecoder<T>>
where
    T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a memoizer with all-default collaborators.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Memoizer {
            transport: Arc::new(transport),
            encoder: JsonKeyEncoder,
            decoder: Arc::new(JsonDecoder::new()),
            policy: AlwaysReuse,
            store: MemoryStore::new(),
        }
    }
}

impl<D: ResponseDecoder, K, P, S> Memoizer<D, K, P, S> {
    /// Replaces the key encoder.
    pub fn with_key_encoder<K2>(self, encoder: K2) -> Memoizer<D, K2, P, S> {
        Memoizer {
            transport: self.transport,
            encoder,
            decoder: self.decoder,
            policy: self.policy,
            store: self.store,
        }
    }

    /// Replaces the response decoder.
    ///
    /// When the new decoder produces a different item type, the store must be
    /// replaced as well, via [`with_store`](Self::with_store).
    pub fn with_decoder<D2: ResponseDecoder>(self, decoder: D2) -> Memoizer<D2, K, P, S> {
        Memoizer {
            transport: self.transport,
            encoder: self.encoder,
            decoder: Arc::new(decoder),
            policy: self.policy,
            store: self.store,
        }
    }

    /// Replaces the freshness policy.
    pub fn with_policy<P2>(self, policy: P2) -> Memoizer<D, K, P2, S> {
        Memoizer {
            transport: self.transport,
            encoder: self.encoder,
            decoder: self.decoder,
            policy,
            store: self.store,
        }
    }

    /// Replaces the cache store.
    pub fn with_store<S2>(self, store: S2) -> Memoizer<D, K, P, S2> {
        Memoizer {
            transport: self.transport,
            encoder: self.encoder,
            decoder: self.decoder,
            policy: self.policy,
            store,
        }
    }
}

impl<D, K, P, S> Memoizer<D, K, P, S>
where
    D: ResponseDecoder,
    D::Item: Clone + Send + Sync + 'static,
{
    /// Invokes the remote function, deduplicating against past and in-flight
    /// calls with the same key.
    ///
    /// The request is encoded into a key; encoding failures propagate
    /// immediately and are never cached. On a store hit the resident
    /// computation is awaited and its outcome judged:
    ///
    /// - a successful value or a decode error is replayed if the freshness
    ///   policy accepts it;
    /// - a transport failure is never replayed: the caller that started the
    ///   failing computation received it on its own await, and anyone
    ///   observing it here retries with fresh work instead.
    ///
    /// Otherwise a new computation is spawned and installed, unconditionally
    /// overwriting the previous entry. The read-decide-write sequence is
    /// intentionally not atomic: several callers that each observe the same
    /// failed computation may each spawn their own retry.
    pub async fn invoke<R>(&self, request: &R) -> Result<D::Item, InvokeError>
    where
        K: KeyEncoder<R>,
        P: FreshnessPolicy<D::Item>,
        S: CacheStore<D::Item>,
    {
        let key = self.encoder.encode(request).map_err(InvokeError::Encode)?;
        metric!(counter("invocations.access") += 1);

        if let Some(computation) = self.store.get(&key) {
            metric!(counter("invocations.store.hit") += 1);
            match computation.wait().await {
                Ok(item) => {
                    if self.policy.is_reusable(Ok(&item)) {
                        metric!(counter("invocations.reused") += 1, "status" => "ok");
                        return Ok(item);
                    }
                }
                Err(InvokeError::Transport(error)) => {
                    tracing::debug!(
                        key = %key,
                        error = %error,
                        "discarding failed computation, retrying"
                    );
                }
                Err(InvokeError::Decode(error)) => {
                    if self.policy.is_reusable(Err(&error)) {
                        metric!(counter("invocations.reused") += 1, "status" => "decode-error");
                        return Err(InvokeError::Decode(error));
                    }
                }
                // Encode errors are surfaced before a computation is ever
                // created, so this cannot be hit through `invoke`.
                Err(error) => return Err(error),
            }
        }

        tracing::trace!(key = %key, "spawning computation");
        metric!(counter("invocations.computation") += 1);

        let computation = Computation::spawn(invoke_and_decode(
            Arc::clone(&self.transport),
            Arc::clone(&self.decoder),
            key.payload().clone(),
        ));
        self.store.insert(key, computation.clone());
        computation.wait().await
    }
}

/// The body of a computation: one off-loaded transport call, then decode.
async fn invoke_and_decode<D>(
    transport: Arc<dyn Transport>,
    decoder: Arc<D>,
    payload: Bytes,
) -> Outcome<D::Item>
where
    D: ResponseDecoder,
{
    let start = Instant::now();

    let response = {
        let payload = payload.clone();
        tokio::task::spawn_blocking(move || transport.invoke(payload))
            .await
            .map_err(|_| TransportError::Dispatch("invocation worker panicked".into()))??
    };
    let result = decoder
        .decode(&payload, &response)
        .map_err(InvokeError::Decode);

    metric!(timer("invocations.computation.duration") = start.elapsed());
    result
}
