//! Per-token limiter for anonymous shared reads.
//!
//! Each token gets a fixed window that starts at its first read and is not
//! extended by later reads. Within a window at most `ceiling` reads are
//! admitted. Windows live in a sharded map; check-and-increment happens
//! under the shard lock so concurrent readers of one token never overshoot.

use std::time::Duration;

use coshare_types::ShareToken;
use dashmap::DashMap;
use tokio::time::Instant;

/// Reads admitted per token per window.
pub const DEFAULT_CEILING: u32 = 250;
/// Length of a token's window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub ceiling: u32,
    pub window: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    expires_at: Instant,
}

impl Window {
    fn starting(now: Instant, length: Duration) -> Self {
        Self {
            count: 0,
            expires_at: now + length,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Bounds how often one share token can be read without authentication.
#[derive(Debug)]
pub struct AnonymousReadLimiter {
    config: LimiterConfig,
    windows: DashMap<ShareToken, Window>,
}

impl AnonymousReadLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    pub fn config(&self) -> LimiterConfig {
        self.config
    }

    /// Count one read against `token`, returning whether it is admitted.
    ///
    /// Rejected reads do not advance the counter further, so a flood of
    /// rejected requests cannot push it toward overflow.
    pub fn try_acquire(&self, token: &ShareToken) -> bool {
        let now = Instant::now();
        let mut window = self
            .windows
            .entry(token.clone())
            .or_insert_with(|| Window::starting(now, self.config.window));

        if window.is_expired(now) {
            *window = Window::starting(now, self.config.window);
        }
        if window.count > self.config.ceiling {
            return false;
        }
        window.count = window.count.saturating_add(1);
        window.count <= self.config.ceiling
    }

    /// Drop every window that has run out. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let keep = !window.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of tokens currently holding a window.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

impl Default for AnonymousReadLimiter {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}
