//! Bounded-concurrency map over a finite input.
//!
//! [`BoundedMapper::run`] applies an async operation to every item with at
//! most `limit` operations in flight. Items are admitted in input order as
//! slots free up; completions are recorded in whatever order they finish.
//!
//! All in-flight operations are polled from the caller's task through a
//! single `FuturesUnordered`, so concurrency is interleaving, not
//! parallelism. The scheduler state (cursor, in-flight set, results) lives in
//! a [`MapRun`] created per call and dropped with it.
//!
//! The first failure short-circuits the aggregate. Operations that were
//! already started keep running on a detached task and their results are
//! discarded; items not yet admitted are never started.

use std::future::Future;
use std::iter::Enumerate;
use std::vec;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use tokio::runtime::Handle;

use postjoin_types::ConcurrencyLimit;

/// A result tagged with the position of the item that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<R> {
    pub index: usize,
    pub value: R,
}

/// Runs a per-item operation with a fixed concurrency bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedMapper {
    limit: ConcurrencyLimit,
}

impl BoundedMapper {
    #[must_use]
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self { limit }
    }

    #[must_use]
    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    /// Map `op` over `items`, returning every result in completion order.
    ///
    /// Returns the error of the first operation to fail.
    pub async fn run<T, R, E, F, Fut>(&self, items: Vec<T>, op: F) -> Result<Vec<Indexed<R>>, E>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
    {
        MapRun::new(items, self.limit, op).drive().await
    }
}

type Completion<R, E> = (usize, Result<R, E>);

struct MapRun<T, R, E, F> {
    limit: usize,
    total: usize,
    cursor: Enumerate<vec::IntoIter<T>>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion<R, E>>>,
    op: F,
    results: Vec<Indexed<R>>,
    peak_in_flight: usize,
}

impl<T, R, E, F, Fut> MapRun<T, R, E, F>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    fn new(items: Vec<T>, limit: ConcurrencyLimit, op: F) -> Self {
        let total = items.len();
        Self {
            limit: limit.get(),
            total,
            cursor: items.into_iter().enumerate(),
            in_flight: FuturesUnordered::new(),
            op,
            results: Vec::with_capacity(total),
            peak_in_flight: 0,
        }
    }

    async fn drive(mut self) -> Result<Vec<Indexed<R>>, E> {
        self.admit();

        while let Some((index, outcome)) = self.in_flight.next().await {
            match outcome {
                Ok(value) => {
                    self.results.push(Indexed { index, value });
                    self.admit();
                }
                Err(err) => {
                    self.abandon(index);
                    return Err(err);
                }
            }
        }

        debug_assert_eq!(self.results.len(), self.total);
        tracing::debug!(
            total = self.total,
            limit = self.limit,
            peak_in_flight = self.peak_in_flight,
            "bounded map complete"
        );
        Ok(self.results)
    }

    /// Start items in input order until the bound is reached or the input
    /// is exhausted.
    fn admit(&mut self) {
        while self.in_flight.len() < self.limit {
            let Some((index, item)) = self.cursor.next() else {
                break;
            };
            let operation = (self.op)(item);
            self.in_flight
                .push(Box::pin(async move { (index, operation.await) }));
            self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
            tracing::trace!(index, in_flight = self.in_flight.len(), "admitted");
        }
    }

    /// Hand the still-running operations to a detached task that polls them
    /// to completion and drops their results.
    fn abandon(self, failed_index: usize) {
        let remaining = self.in_flight.len();
        tracing::debug!(
            failed_index,
            remaining,
            not_started = self.cursor.len(),
            "bounded map short-circuited"
        );
        if remaining == 0 {
            return;
        }

        let mut in_flight = self.in_flight;
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { while in_flight.next().await.is_some() {} });
            }
            Err(_) => {
                tracing::warn!(remaining, "no runtime to drain abandoned operations; dropping");
            }
        }
    }
}
