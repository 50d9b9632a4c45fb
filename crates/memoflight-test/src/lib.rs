//! Helpers for testing the memoization engine.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all
//!    console output is captured by the test runner.
//!
//!  - Keep a clone of the [`MockTransport`] you hand to the memoizer, so the
//!    test can assert on call counts and recorded payloads afterwards; both
//!    handles share the same state.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

use memoflight::{Transport, TransportError};

/// Setup the test environment.
///
///  - Initializes logs: the logger only captures logs from the `memoflight`
///    crate and mutes everything else.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("memoflight=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

#[derive(Default)]
struct MockInner {
    script: Mutex<VecDeque<Result<Bytes, TransportError>>>,
    default: Mutex<Option<Result<Bytes, TransportError>>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Bytes>>,
}

/// A scriptable in-memory [`Transport`].
///
/// Responses are served from a FIFO script first, then from the default
/// response. Every call is counted and its payload recorded. The transport is
/// cheaply cloneable; clones share all state.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that always responds with `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        let transport = Self::new();
        transport.respond_ok(body);
        transport
    }

    /// Creates a transport that always fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        let transport = Self::new();
        transport.respond_err(error);
        transport
    }

    /// Sets the default response to a successful `body`.
    pub fn respond_ok(&self, body: impl Into<Bytes>) {
        *self.inner.default.lock() = Some(Ok(body.into()));
    }

    /// Sets the default response to `error`.
    pub fn respond_err(&self, error: TransportError) {
        *self.inner.default.lock() = Some(Err(error));
    }

    /// Enqueues a one-shot response served before the default.
    pub fn enqueue(&self, response: Result<Bytes, TransportError>) {
        self.inner.script.lock().push_back(response);
    }

    /// Makes every call block for `delay` before responding, to widen the
    /// in-flight window in coalescing tests.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock() = Some(delay);
        self
    }

    /// The number of calls performed so far.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// The payloads of all calls performed so far, in order.
    pub fn requests(&self) -> Vec<Bytes> {
        self.inner.requests.lock().clone()
    }
}

impl Transport for MockTransport {
    fn invoke(&self, payload: Bytes) -> Result<Bytes, TransportError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.requests.lock().push(payload);

        if let Some(delay) = *self.inner.delay.lock() {
            std::thread::sleep(delay);
        }

        if let Some(next) = self.inner.script.lock().pop_front() {
            return next;
        }
        self.inner.default.lock().clone().unwrap_or_else(|| {
            Err(TransportError::Dispatch(
                "mock transport has no scripted response".into(),
            ))
        })
    }
}
