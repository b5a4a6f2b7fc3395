//! Dispatch policies: how the outcomes of many callbacks become one result.
//!
//! A policy receives a lazy, finite, non-restartable iterator. Pulling the
//! next element runs the next provider (or subscriber) and yields its outcome,
//! so a policy that stops pulling stops invoking. Policies decide termination,
//! aggregation and failure propagation.
//!
//! Policies are cloned for every invocation or publish, so state a policy
//! accumulates during one call never leaks into the next.
//!
//! | Policy | Used by | Behaviour |
//! |--------|---------|-----------|
//! | [`FirstSuccess`] | methods (default) | first `Ok` wins, else aggregate error |
//! | [`CollectAll`] | methods | run every provider, keep the successes |
//! | [`DropErrors`] | channels (default) | run every subscriber, discard errors |

use plexus_core::BoxError;
use tracing::{debug, trace};

use crate::error::{MethodError, MethodResult};

/// Combines provider outcomes into a method's result.
pub trait DispatchPolicy<R>: Clone + Send + Sync + 'static {
    /// What [`Method::invoke`](crate::Method::invoke) returns.
    type Output;

    /// Consumes provider outcomes, one provider call per `next()`.
    fn dispatch<I>(&self, calls: I) -> Self::Output
    where
        I: Iterator<Item = Result<R, BoxError>>;
}

/// Combines subscriber outcomes during channel fan-out.
///
/// Channel policies have no output: nothing ever reaches the publisher.
pub trait ChannelPolicy: Clone + Send + Sync + 'static {
    /// Consumes subscriber outcomes, one delivery per `next()`.
    fn deliver<I>(&self, deliveries: I)
    where
        I: Iterator<Item = Result<(), BoxError>>;
}

/// Tries providers in order until one succeeds.
///
/// If every provider fails (or there are none), returns
/// [`MethodError::NoResult`] carrying each provider's error text in
/// visitation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSuccess;

impl<R> DispatchPolicy<R> for FirstSuccess {
    type Output = MethodResult<R>;

    fn dispatch<I>(&self, calls: I) -> Self::Output
    where
        I: Iterator<Item = Result<R, BoxError>>,
    {
        let mut diagnostics = Vec::new();
        for outcome in calls {
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(error = %e, "Provider failed, trying next");
                    diagnostics.push(e.to_string());
                }
            }
        }
        Err(MethodError::NoResult { diagnostics })
    }
}

/// Runs every provider and returns the successful results in order.
///
/// Failed providers are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectAll;

impl<R> DispatchPolicy<R> for CollectAll {
    type Output = Vec<R>;

    fn dispatch<I>(&self, calls: I) -> Self::Output
    where
        I: Iterator<Item = Result<R, BoxError>>,
    {
        calls
            .filter_map(|outcome| {
                outcome
                    .inspect_err(|e| debug!(error = %e, "Provider failed, skipping"))
                    .ok()
            })
            .collect()
    }
}

/// Invokes every subscriber; failures are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropErrors;

impl ChannelPolicy for DropErrors {
    fn deliver<I>(&self, deliveries: I)
    where
        I: Iterator<Item = Result<(), BoxError>>,
    {
        for outcome in deliveries {
            if let Err(e) = outcome {
                trace!(error = %e, "Subscriber failed, dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fail(msg: &str) -> BoxError {
        msg.into()
    }

    #[test]
    fn test_first_success_short_circuits() {
        let calls = Cell::new(0);
        let outcomes = [Err(fail("a")), Ok(1), Ok(2)];
        let iter = outcomes.into_iter().inspect(|_| calls.set(calls.get() + 1));

        assert_eq!(FirstSuccess.dispatch(iter), Ok(1));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_first_success_aggregates_in_order() {
        let outcomes: Vec<Result<i32, BoxError>> = vec![Err(fail("first")), Err(fail("second"))];
        let err = FirstSuccess.dispatch(outcomes.into_iter()).unwrap_err();
        assert_eq!(err.diagnostics(), ["first", "second"]);
    }

    #[test]
    fn test_first_success_empty_is_no_result() {
        let err = FirstSuccess
            .dispatch(std::iter::empty::<Result<i32, BoxError>>())
            .unwrap_err();
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn test_collect_all_keeps_successes() {
        let outcomes: Vec<Result<i32, BoxError>> = vec![Ok(1), Err(fail("x")), Ok(3)];
        assert_eq!(CollectAll.dispatch(outcomes.into_iter()), vec![1, 3]);
    }

    #[test]
    fn test_drop_errors_drives_everything() {
        let calls = Cell::new(0);
        let outcomes: Vec<Result<(), BoxError>> = vec![Err(fail("x")), Ok(()), Err(fail("y"))];
        DropErrors.deliver(outcomes.into_iter().inspect(|_| calls.set(calls.get() + 1)));
        assert_eq!(calls.get(), 3);
    }
}
