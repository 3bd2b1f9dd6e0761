//! API Middleware (Rate Limiting, Logging)

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Rate limiter configuration
pub struct RateLimitConfig {
    /// Requests per window
    pub requests_per_window: u32,
    /// Window duration
    pub window: Duration,
}

impl RateLimitConfig {
    /// Per-minute limit, overridable via WALLETSCORE_RATE_LIMIT
    pub fn from_env() -> Self {
        let requests_per_window = std::env::var("WALLETSCORE_RATE_LIMIT")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);
        Self {
            requests_per_window,
            window: Duration::from_secs(60),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: DEFAULT_REQUESTS_PER_MINUTE,
            window: Duration::from_secs(60),
        }
    }
}

/// One client's current fixed window
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of a rate-limit check, surfaced as response headers
pub struct RateCheck {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_secs: u64,
}

/// In-memory fixed-window rate limiter keyed by client IP.
/// Production: Use Redis for distributed rate limiting
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    pub fn check(&self, key: &str) -> RateCheck {
        let now = Instant::now();
        let limit = self.config.requests_per_window;

        let mut window = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window { count: 0, started: now });

        // Fixed windows: an expired one simply restarts at now
        if now.duration_since(window.started) >= self.config.window {
            *window = Window { count: 0, started: now };
        }

        let reset_secs = self
            .config
            .window
            .saturating_sub(now.duration_since(window.started))
            .as_secs();

        if window.count >= limit {
            return RateCheck {
                allowed: false,
                remaining: 0,
                reset_secs,
            };
        }

        window.count += 1;
        RateCheck {
            allowed: true,
            remaining: limit - window.count,
            reset_secs,
        }
    }

    /// Drop windows idle long enough that a fresh check would restart
    /// them anyway. Called periodically.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let stale_after = self.config.window * 2;
        self.windows
            .retain(|_, window| now.duration_since(window.started) < stale_after);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::from_env())
    }
}

// Global rate limiter instance
lazy_static::lazy_static! {
    pub static ref RATE_LIMITER: Arc<RateLimiter> = Arc::new(RateLimiter::default());
}

/// Spawn the periodic rate-limiter cleanup task
pub fn start_cleanup_task() {
    tokio::spawn(async {
        let mut interval = tokio::time::interval(Duration::from_secs(120));
        loop {
            interval.tick().await;
            RATE_LIMITER.cleanup();
        }
    });
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Skip rate limiting for health check
    if request.uri().path() == "/health" || request.uri().path() == "/v1/health" {
        return Ok(next.run(request).await);
    }

    // IP-based limiting
    let rate_key = headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let check = RATE_LIMITER.check(&rate_key);

    if !check.allowed {
        warn!(key = %rate_key, "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let mut response = next.run(request).await;

    // Add rate limit headers
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Remaining", check.remaining.into());
    headers.insert("X-RateLimit-Reset", check.reset_secs.into());

    Ok(response)
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_window: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_window: per_window,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_allows_until_limit_then_blocks() {
        let limiter = limiter(3);

        assert!(limiter.check("client").allowed);
        assert!(limiter.check("client").allowed);
        let third = limiter.check("client");
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.check("client");
        assert!(!fourth.allowed);
        assert!(fourth.reset_secs <= 60);
    }

    #[test]
    fn test_keys_are_isolated() {
        let limiter = limiter(1);

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = limiter(3);
        let counts: Vec<u32> = (0..3).map(|_| limiter.check("c").remaining).collect();
        assert_eq!(counts, vec![2, 1, 0]);
    }

    #[test]
    fn test_zero_duration_window_restarts() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_window: 1,
            window: Duration::from_secs(0),
        });
        // Every check lands in a fresh window
        assert!(limiter.check("c").allowed);
        assert!(limiter.check("c").allowed);
    }

    #[test]
    fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_window: 5,
            window: Duration::from_secs(0),
        });
        limiter.check("a");
        limiter.check("b");
        limiter.cleanup();
        assert_eq!(limiter.windows.len(), 0);
    }
}
