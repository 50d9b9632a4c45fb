use crate::error::DecodeError;

/// Decides whether a completed outcome may be replayed for a new call with
/// the same key.
///
/// The policy sees successful values and decode errors. Transport failures
/// never reach it; the engine always discards those. The decision must be
/// synchronous and must not suspend.
///
/// Closures of the matching shape implement this trait directly:
///
/// ```
/// # use memoflight::{DecodeError, FreshnessPolicy};
/// let only_values = |outcome: Result<&u32, &DecodeError>| outcome.is_ok();
/// assert!(FreshnessPolicy::is_reusable(&only_values, Ok(&1)));
/// ```
pub trait FreshnessPolicy<T>: Send + Sync {
    fn is_reusable(&self, outcome: Result<&T, &DecodeError>) -> bool;
}

/// The default policy: every completed outcome is reusable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReuse;

impl<T> FreshnessPolicy<T> for AlwaysReuse {
    fn is_reusable(&self, _outcome: Result<&T, &DecodeError>) -> bool {
        true
    }
}

impl<T, F> FreshnessPolicy<T> for F
where
    F: Fn(Result<&T, &DecodeError>) -> bool + Send + Sync,
{
    fn is_reusable(&self, outcome: Result<&T, &DecodeError>) -> bool {
        self(outcome)
    }
}
