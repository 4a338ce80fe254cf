// web-server/src/middleware/rate_limiter.rs
use crate::error::ApiError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use common::RateLimitConfig;
use dashmap::DashMap;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window limit on requests per client IP for selected path prefixes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    paths: Vec<String>,
    max_requests: usize,
    window: Duration,
    store: Arc<DashMap<String, VecDeque<Instant>>>,
    last_sweep: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(paths: Vec<String>, max_requests: usize, window: Duration) -> Self {
        Self {
            paths,
            max_requests,
            window,
            store: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(paths: Vec<String>, config: &RateLimitConfig) -> Self {
        Self::new(paths, config.max_attempts, Duration::from_secs(config.window_seconds))
    }

    fn applies_to(&self, path: &str) -> bool {
        self.paths.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Record a request at `now`. Returns false when the client is over the limit.
    fn try_acquire(&self, client: &str, now: Instant) -> bool {
        if self.sweep_due(now) {
            self.sweep(now);
        }

        let mut hits = self.store.entry(client.to_string()).or_default();
        while hits
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests {
            return false;
        }
        hits.push_back(now);
        true
    }

    fn sweep_due(&self, now: Instant) -> bool {
        let mut last = self.last_sweep.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match *last {
            Some(at) if now.duration_since(at) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Drop expired hits and forget clients with none left. Runs at most once per window.
    fn sweep(&self, now: Instant) {
        let window = self.window;
        let before = self.store.len();
        self.store.retain(|_, hits| {
            hits.retain(|hit| now.duration_since(*hit) < window);
            !hits.is_empty()
        });
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            tracing::debug!("Rate limiter forgot {} idle clients", removed);
        }
    }

    /// Seconds until the oldest recorded hit leaves the window
    fn retry_after(&self, client: &str, now: Instant) -> u64 {
        self.store
            .get(client)
            .and_then(|hits| hits.front().copied())
            .map(|first| self.window.saturating_sub(now.duration_since(first)).as_secs().max(1))
            .unwrap_or_else(|| self.window.as_secs())
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service,
            limiter: self.clone(),
        }))
    }
}

pub struct RateLimiterMiddleware<S> {
    service: S,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.limiter.applies_to(req.path()) {
            let ip = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            let now = Instant::now();
            if !self.limiter.try_acquire(&ip, now) {
                let retry_after = self.limiter.retry_after(&ip, now);
                tracing::warn!("Rate limit exceeded for IP: {}", ip);
                return Box::pin(async move { Err(ApiError::RateLimited { retry_after }.into()) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}
