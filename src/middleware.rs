use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::AppState;

/// Requests are bucketed by client IP; connections without peer info share one bucket
pub type ClientKey = Option<IpAddr>;

pub type ClientLimiter = DefaultKeyedRateLimiter<ClientKey>;

/// Allow `requests` per `window_secs` per client, with the full allowance available as a burst
pub fn client_limiter(requests: u32, window_secs: u64) -> ClientLimiter {
    let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_secs(window_secs.max(1)) / burst.get();

    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);

    RateLimiter::keyed(quota)
}

/// Forget clients whose allowance has fully refilled
pub fn evict_idle_clients(limiter: &ClientLimiter) {
    let before = limiter.len();
    limiter.retain_recent();
    limiter.shrink_to_fit();

    let evicted = before.saturating_sub(limiter.len());
    if evicted > 0 {
        tracing::debug!("Evicted {} idle rate limit keys", evicted);
    }
}

/// Sweep idle clients out of the limiter once per window
pub fn spawn_limiter_sweeper(limiter: Arc<ClientLimiter>, window_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(window_secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            evict_idle_clients(&limiter);
        }
    })
}

/// Reject the request with 429 once the client's allowance is spent
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client: ClientKey = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if state.limiter.check_key(&client).is_err() {
        tracing::warn!("Rate limit exceeded for client {:?}", client);
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_burst_then_rejects() {
        let limiter = client_limiter(3, 60);
        let client = Some(IpAddr::from([10, 0, 0, 1]));

        for _ in 0..3 {
            assert!(limiter.check_key(&client).is_ok());
        }
        assert!(limiter.check_key(&client).is_err());
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiter = client_limiter(1, 60);
        let first = Some(IpAddr::from([10, 0, 0, 1]));
        let second = Some(IpAddr::from([10, 0, 0, 2]));

        assert!(limiter.check_key(&first).is_ok());
        assert!(limiter.check_key(&first).is_err());
        assert!(limiter.check_key(&second).is_ok());
        assert!(limiter.check_key(&None).is_ok());
    }

    #[test]
    fn test_idle_clients_are_evicted() {
        // 10 per second refills one cell every 100ms
        let limiter = client_limiter(10, 1);

        for i in 0..100u8 {
            assert!(limiter.check_key(&Some(IpAddr::from([10, 0, 1, i]))).is_ok());
        }
        assert_eq!(limiter.len(), 100);

        std::thread::sleep(Duration::from_millis(300));

        let active = Some(IpAddr::from([10, 0, 2, 1]));
        assert!(limiter.check_key(&active).is_ok());

        evict_idle_clients(&limiter);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_zero_requests_still_builds() {
        let limiter = client_limiter(0, 0);
        assert!(limiter.check_key(&None).is_ok());
    }
}
