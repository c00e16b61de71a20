// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower layer that paces explorer API calls.
//!
//! Free explorer tiers (Subscan, Etherscan) reject bursts with HTTP 429. The
//! pacer hands every request a start slot so one adapter stays under its
//! provider's quota and the retry layer rarely has to back off.
//!
//! Slots follow a virtual schedule: each request pushes the schedule forward
//! by one interval, and a request may start early by at most the burst
//! allowance. With a burst of one request this is plain minimum spacing.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll},
    time::Duration,
};

use tokio::time::Instant;
use tower::Layer;
use tracing::trace;

/// A Tower layer that spaces requests out in time.
///
/// Clones share one schedule, so every service built from the same layer
/// counts against the same quota.
///
/// # Example
///
/// ```rust
/// use awakenscan::transport::RateLimitLayer;
/// use std::time::Duration;
///
/// // Etherscan free tier: 5 requests per second
/// let layer = RateLimitLayer::per_second(5);
///
/// // At least 250ms between Subscan requests
/// let layer = RateLimitLayer::with_min_delay(Duration::from_millis(250));
/// ```
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    schedule: Arc<Mutex<Schedule>>,
}

impl RateLimitLayer {
    /// Allow `requests` per `period`, bursting up to `requests` at once.
    pub fn new(requests: u32, period: Duration) -> Self {
        Self {
            schedule: Arc::new(Mutex::new(Schedule::new(requests, period))),
        }
    }

    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// At least `delay` between consecutive request starts.
    pub fn with_min_delay(delay: Duration) -> Self {
        Self::new(1, delay)
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            service,
            schedule: self.schedule.clone(),
        }
    }
}

/// Virtual schedule of request starts.
#[derive(Debug)]
struct Schedule {
    /// Time between slots
    interval: Duration,
    /// How far ahead of the schedule a request may start
    burst: Duration,
    /// Slot the next request is due at, if nothing ran early
    due: Option<Instant>,
}

impl Schedule {
    fn new(requests: u32, period: Duration) -> Self {
        let requests = requests.max(1);
        let interval = period / requests;
        Self {
            interval,
            burst: interval * (requests - 1),
            due: None,
        }
    }

    /// Reserve the next slot and return when the request may start.
    fn reserve(&mut self, now: Instant) -> Instant {
        let due = self.due.map_or(now, |due| due.max(now));
        let start = due
            .checked_sub(self.burst)
            .map_or(now, |earliest| earliest.max(now));
        self.due = Some(due + self.interval);
        start
    }
}

/// A Tower service that waits for its slot before calling the inner service.
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    service: S,
    schedule: Arc<Mutex<Schedule>>,
}

impl<S, Request> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let now = Instant::now();
        let start = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reserve(now);
        let mut service = self.service.clone();

        Box::pin(async move {
            if start > now {
                trace!(wait_ms = (start - now).as_millis() as u64, "Waiting for rate limit slot");
                tokio::time::sleep_until(start).await;
            }
            service.call(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_then_spacing() {
        let mut schedule = Schedule::new(2, Duration::from_secs(1));
        let now = Instant::now();

        assert_eq!(schedule.reserve(now), now);
        assert_eq!(schedule.reserve(now), now);
        assert_eq!(schedule.reserve(now), now + Duration::from_millis(500));
        assert_eq!(schedule.reserve(now), now + Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_is_not_banked_beyond_burst() {
        let mut schedule = Schedule::new(1, Duration::from_millis(100));
        let start = Instant::now();
        assert_eq!(schedule.reserve(start), start);

        let later = start + Duration::from_secs(5);
        assert_eq!(schedule.reserve(later), later);
        assert_eq!(schedule.reserve(later), later + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn min_delay_spaces_requests() {
        #[derive(Clone)]
        struct InstantService;

        impl tower::Service<()> for InstantService {
            type Response = ();
            type Error = std::convert::Infallible;
            type Future = std::future::Ready<Result<(), std::convert::Infallible>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, _req: ()) -> Self::Future {
                std::future::ready(Ok(()))
            }
        }

        let layer = RateLimitLayer::with_min_delay(Duration::from_millis(250));
        let mut service = layer.layer(InstantService);

        let start = Instant::now();
        for _ in 0..3 {
            tower::Service::call(&mut service, ()).await.unwrap();
        }

        // first request is free, the next two wait 250ms each
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }
}
