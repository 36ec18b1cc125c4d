// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composed client: cache, then breaker, then retry, then the transport.
//!
//! A cache hit never reaches the breaker. The breaker sees one outcome per
//! call, after the retry layer has given up or succeeded, so a call that
//! exhausts its retries counts as a single failure.

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::cache::TtlCache;
use crate::config::ResilienceConfig;
use crate::invocation::InvocationClient;
use crate::retry::{RetryController, RetryPolicy};
use relay_adapters::InvokeAdapter;
use relay_core::{Arguments, Clock, InvokeError, Observable, OperationRequest, Outcome};
use relay_core::{Scheduler, TokioClock, TokioScheduler};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// An [`InvocationClient`] wrapped in optional cache, breaker and retry
/// layers.
///
/// Every call gets its own retry session, so concurrent calls never cancel
/// each other's backoff. Cache and breaker are shared across calls and
/// clones.
pub struct ResilientClient<T, A, C = TokioClock, S = TokioScheduler> {
    client: InvocationClient<T, A>,
    clock: C,
    scheduler: S,
    cache: Option<TtlCache<T, C>>,
    breaker: Option<CircuitBreaker<C>>,
    retry: Option<RetryPolicy>,
}

impl<T, A: Clone, C: Clone, S: Clone> Clone for ResilientClient<T, A, C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            clock: self.clock.clone(),
            scheduler: self.scheduler.clone(),
            cache: self.cache.clone(),
            breaker: self.breaker.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<T, A> ResilientClient<T, A>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    A: InvokeAdapter,
{
    pub fn new(adapter: A) -> Self {
        Self::with_runtime(adapter, TokioClock, TokioScheduler)
    }

    /// Client with every layer configured from `config`
    pub fn from_config(adapter: A, config: &ResilienceConfig) -> Self {
        Self::new(adapter).apply_config(config)
    }
}

impl<T, A, C, S> ResilientClient<T, A, C, S>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    A: InvokeAdapter,
    C: Clock,
    S: Scheduler,
{
    /// Bare client over `adapter`; layers are added with the `with_*` methods
    pub fn with_runtime(adapter: A, clock: C, scheduler: S) -> Self {
        Self {
            client: InvocationClient::new(adapter),
            clock,
            scheduler,
            cache: None,
            breaker: None,
            retry: None,
        }
    }

    pub fn apply_config(self, config: &ResilienceConfig) -> Self {
        self.with_cache(config.cache.ttl())
            .with_breaker(config.breaker.clone())
            .with_retry(config.retry.clone())
    }

    pub fn with_cache(self, ttl: Duration) -> Self {
        let cache = TtlCache::with_clock(self.clock.clone(), ttl);
        self.with_shared_cache(cache)
    }

    /// Use a cache instance that other clients may also hold
    pub fn with_shared_cache(mut self, cache: TtlCache<T, C>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_breaker(mut self, config: BreakerConfig) -> Self {
        self.breaker = Some(CircuitBreaker::with_clock(config, self.clock.clone()));
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Run `name` through every configured layer.
    pub async fn call(&self, name: impl Into<String>, arguments: Arguments) -> Outcome<T> {
        let request = OperationRequest::new(name, arguments)?;
        match &self.cache {
            Some(cache) => {
                let key = request.cache_key();
                cache.get_or_compute(&key, None, || self.guarded(request)).await
            }
            None => self.guarded(request).await,
        }
    }

    /// Drop the cached result of this call, if any
    pub fn invalidate(&self, name: impl Into<String>, arguments: Arguments) -> Outcome<()> {
        let request = OperationRequest::new(name, arguments)?;
        if let Some(cache) = &self.cache {
            cache.invalidate(&request.cache_key());
        }
        Ok(())
    }

    pub fn client(&self) -> &InvocationClient<T, A> {
        &self.client
    }

    pub fn data(&self) -> &Observable<Option<T>> {
        self.client.data()
    }

    pub fn pending(&self) -> &Observable<bool> {
        self.client.pending()
    }

    pub fn error(&self) -> &Observable<Option<InvokeError>> {
        self.client.error()
    }

    pub fn cache(&self) -> Option<&TtlCache<T, C>> {
        self.cache.as_ref()
    }

    pub fn breaker(&self) -> Option<&CircuitBreaker<C>> {
        self.breaker.as_ref()
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    async fn guarded(&self, request: OperationRequest) -> Outcome<T> {
        match &self.breaker {
            Some(breaker) => breaker.execute(|| self.retried(request)).await,
            None => self.retried(request).await,
        }
    }

    async fn retried(&self, request: OperationRequest) -> Outcome<T> {
        tracing::debug!(operation = request.name(), "dispatching call");
        match &self.retry {
            Some(policy) => {
                let session = RetryController::with_scheduler(
                    policy.clone(),
                    self.scheduler.clone(),
                    self.clock.clone(),
                );
                session.execute(|| self.client.execute_request(request.clone())).await
            }
            None => self.client.execute_request(request).await,
        }
    }
}

#[cfg(test)]
#[path = "resilient_tests.rs"]
mod tests;
