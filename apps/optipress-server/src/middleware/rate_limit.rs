//! Per-client fixed-window rate limiting

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets
    pub reset_after: Duration,
}

/// Fixed-window counter keyed by client address
///
/// IPv6 clients are grouped by their /56 prefix, since a single subscriber
/// usually controls a whole prefix.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: DashMap::new(),
        }
    }

    /// Count one request from `ip` and report whether it may proceed
    pub fn check(&self, ip: IpAddr, now: Instant) -> Decision {
        let key = client_key(ip);
        let mut entry = self.clients.entry(key).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        let elapsed = now.duration_since(entry.started_at);
        Decision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(elapsed),
        }
    }

    /// Drop windows that have already expired
    pub fn prune(&self, now: Instant) {
        let before = self.clients.len();
        self.clients
            .retain(|_, window| now.duration_since(window.started_at) < self.window);
        debug!(
            removed = before.saturating_sub(self.clients.len()),
            tracked = self.clients.len(),
            "Pruned rate limit windows"
        );
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of clients currently tracked
    #[cfg(test)]
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

fn client_key(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(_) => ip,
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => {
                let prefix = u128::from(v6) & (!0u128 << (128 - 56));
                IpAddr::V6(Ipv6Addr::from(prefix))
            }
        },
    }
}

/// `RateLimit-Policy` and `RateLimit` values in the draft-8 structured form
///
/// Follows draft-ietf-httpapi-ratelimit-headers-08: the policy carries its
/// quota (`q`) and window (`w`), the state its remaining quota (`r`) and the
/// seconds until reset (`t`), both keyed by the same policy name.
pub fn rate_limit_headers(decision: &Decision, window: Duration, reset_secs: u64) -> (String, String) {
    let name = format!("{}-in-{}s", decision.limit, window.as_secs());
    let policy = format!("\"{}\";q={};w={}", name, decision.limit, window.as_secs());
    let state = format!("\"{}\";r={};t={}", name, decision.remaining, reset_secs);
    (policy, state)
}

/// Reject requests once the caller's window is exhausted
///
/// The client address comes from `ConnectInfo`; requests without one (for
/// example in-process test clients) share a single bucket.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let decision = limiter.check(ip, Instant::now());
    let reset_secs = decision.reset_after.as_secs().max(1);

    if !decision.allowed {
        warn!(client = %ip, limit = decision.limit, "Rate limit exceeded");
        return ApiError::RateLimited {
            retry_after_secs: reset_secs,
        }
        .into_response();
    }

    let mut response = next.run(request).await;

    let (policy, state) = rate_limit_headers(&decision, limiter.window(), reset_secs);
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert("ratelimit-policy", value);
    }
    if let Ok(value) = HeaderValue::from_str(&state) {
        headers.insert("ratelimit", value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        let remaining: Vec<u32> = (0..3)
            .map(|_| limiter.check(ip("10.0.0.1"), now))
            .inspect(|decision| assert!(decision.allowed))
            .map(|decision| decision.remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let blocked = limiter.check(ip("10.0.0.1"), now);
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check(ip("10.0.0.1"), now).allowed);
        assert!(limiter.check(ip("10.0.0.2"), now).allowed);
        assert!(!limiter.check(ip("10.0.0.1"), now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check(ip("10.0.0.1"), now).allowed);
        assert!(!limiter.check(ip("10.0.0.1"), now + Duration::from_secs(59)).allowed);
        assert!(limiter.check(ip("10.0.0.1"), now + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn test_reset_after_counts_down() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        limiter.check(ip("10.0.0.1"), now);
        let later = limiter.check(ip("10.0.0.1"), now + Duration::from_secs(20));

        assert_eq!(later.reset_after, Duration::from_secs(40));
    }

    #[test]
    fn test_ipv6_grouped_by_prefix() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check(ip("2001:db8:1:100::1"), now).allowed);
        // Same /56, different host
        assert!(!limiter.check(ip("2001:db8:1:1ff::2"), now).allowed);
        // Different /56
        assert!(limiter.check(ip("2001:db8:1:200::1"), now).allowed);
    }

    #[test]
    fn test_ipv4_mapped_addresses_share_ipv4_bucket() {
        assert_eq!(client_key(ip("::ffff:10.0.0.1")), ip("10.0.0.1"));
    }

    #[test]
    fn test_headers_use_draft_8_shape() {
        let decision = Decision {
            allowed: true,
            limit: 100,
            remaining: 42,
            reset_after: Duration::from_secs(300),
        };

        let (policy, state) = rate_limit_headers(&decision, Duration::from_secs(900), 300);

        assert_eq!(policy, "\"100-in-900s\";q=100;w=900");
        assert_eq!(state, "\"100-in-900s\";r=42;t=300");
    }

    #[test]
    fn test_prune_drops_expired_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        limiter.check(ip("10.0.0.1"), now);
        limiter.check(ip("10.0.0.2"), now + Duration::from_secs(30));
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.prune(now + Duration::from_secs(61));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
