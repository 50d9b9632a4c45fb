use std::future::Future;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::Shared;

use crate::error::{Outcome, TransportError};

type ComputationChannel<T> = Shared<oneshot::Receiver<Outcome<T>>>;

/// A shareable handle to a single unit of work bound to one cache key.
///
/// The underlying future is spawned eagerly onto the runtime; it runs to
/// completion even if every handle is dropped, its result simply discarded.
/// Any number of callers can [`wait`](Self::wait) on the same computation,
/// and completion fans out to all of them.
pub struct Computation<T> {
    channel: ComputationChannel<T>,
}

impl<T> Clone for Computation<T> {
    fn clone(&self) -> Self {
        Computation {
            channel: self.channel.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Computation<T> {
    /// Spawns `future` as a separate task and returns a shareable handle to
    /// its outcome.
    ///
    /// This function is *not* `async`: the computation starts eagerly, even
    /// if the handle is never awaited.
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        tokio::spawn(async move {
            let result = future.await;
            // All waiters may be gone already; the computation still ran to
            // completion.
            sender.send(result).ok();
        });

        Computation {
            channel: receiver.shared(),
        }
    }

    /// Awaits the computation's outcome.
    ///
    /// A dropped completion channel means the computation task panicked. That
    /// is folded into a transport-kind failure, which the engine never
    /// caches.
    pub async fn wait(&self) -> Outcome<T> {
        self.channel.clone().await.unwrap_or_else(|_canceled| {
            Err(TransportError::Dispatch("computation channel dropped".into()).into())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_fans_out_to_all_waiters() {
        let computation = Computation::spawn(async { Ok(42u32) });

        let first = computation.wait().await;
        let second = computation.clone().wait().await;
        assert_eq!(first.unwrap(), 42);
        assert_eq!(second.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_abandoned_computation_runs_to_completion() {
        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);

        let computation = Computation::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        drop(computation);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicked_computation_becomes_transport_failure() {
        let computation: Computation<()> = Computation::spawn(async { panic!("boom") });

        let outcome = computation.wait().await;
        assert!(matches!(
            outcome,
            Err(crate::InvokeError::Transport(TransportError::Dispatch(_)))
        ));
    }
}
