// src/services/rate_limiter.rs
// DOCUMENTATION: In-memory per-client rate limiting
// PURPOSE: Throttle login attempts and tracking beacons by client IP

use actix_web::HttpRequest;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::FolioError;

/// Keyed limiter with a per-minute quota
#[derive(Clone)]
pub struct ClientRateLimiter {
    name: &'static str,
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    trust_proxy: bool,
}

impl ClientRateLimiter {
    pub fn per_minute(name: &'static str, per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            name,
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            trust_proxy: false,
        }
    }

    /// Key requests on forwarded headers; only for deployments behind a proxy
    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn check(&self, key: &str) -> Result<(), FolioError> {
        self.limiter.check_key(&key.to_string()).map_err(|_| {
            log::warn!("Rate limit '{}' exceeded for {}", self.name, key);
            FolioError::RateLimitExceeded
        })
    }

    pub fn check_request(&self, req: &HttpRequest) -> Result<(), FolioError> {
        self.check(&client_key(req, self.trust_proxy))
    }

    /// Drop state for keys whose quota has fully replenished
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

/// Limiters shared across workers
#[derive(Clone)]
pub struct RateLimiters {
    pub login: ClientRateLimiter,
    pub tracking: ClientRateLimiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Self {
        Self {
            login: ClientRateLimiter::per_minute("login", config.login_rate_per_minute)
                .trusting_proxy(config.trust_proxy),
            tracking: ClientRateLimiter::per_minute("tracking", config.track_rate_per_minute)
                .trusting_proxy(config.trust_proxy),
        }
    }
}

/// Peer IP, or the forwarded client address when the proxy is trusted.
/// The port is dropped so reconnects share one key.
pub fn client_key(req: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return strip_port(addr).to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn strip_port(addr: &str) -> &str {
    match addr.parse::<SocketAddr>() {
        Ok(_) => addr.rsplit_once(':').map(|(host, _)| host).unwrap_or(addr),
        Err(_) => addr,
    }
}

/// Periodically forget idle clients
pub fn start_prune_task(limiters: RateLimiters, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            limiters.login.prune();
            limiters.tracking.prune();
        }
    });
}
