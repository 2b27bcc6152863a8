//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

type PeerIpGovernor =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket parameters for one group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Seconds needed to replenish one token.
    pub per_second: u64,
    pub burst: u32,
}

impl RateLimit {
    /// Public tracking lookups: one token every second, bursts of 100.
    pub const PUBLIC: Self = Self {
        per_second: 1,
        burst: 100,
    };

    /// Admin endpoints: one token every 2 seconds, bursts of 20.
    ///
    /// Unauthenticated requests count against the same bucket.
    pub const ADMIN: Self = Self {
        per_second: 2,
        burst: 20,
    };
}

/// Creates a per-peer-IP rate limiter.
///
/// Requests exceeding the limit receive `429 Too Many Requests`. The key is
/// the socket peer address, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Panics
///
/// Panics if `per_second` or `burst` is zero.
///
/// # Example
///
/// ```rust,ignore
/// let public = api::routes::public_routes().layer(rate_limit::layer(RateLimit::PUBLIC));
/// ```
pub fn layer(limit: RateLimit) -> PeerIpGovernor {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(limit.per_second)
            .burst_size(limit.burst)
            .finish()
            .expect("rate limit parameters must be non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
