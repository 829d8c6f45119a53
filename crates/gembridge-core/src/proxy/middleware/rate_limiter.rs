use dashmap::DashMap;
use gembridge_types::models::{EndpointClass, RateLimitConfig};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{GatewayError, GatewayResult};

type WindowKey = (String, EndpointClass);

/// Outcome of an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub limit: u32,
    pub remaining: u32,
}

/// Sliding-window limiter keyed by client identity and endpoint class.
///
/// Each window is a deque of request instants. The DashMap entry guard is
/// held across prune, count and push, so concurrent requests from one
/// identity cannot both take the last slot.
pub struct RateLimiter {
    windows: DashMap<WindowKey, VecDeque<Instant>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { windows: DashMap::new(), config }
    }

    pub fn check(&self, identity: &str, class: EndpointClass) -> GatewayResult<Admission> {
        self.check_at(identity, class, Instant::now())
    }

    pub fn check_at(
        &self,
        identity: &str,
        class: EndpointClass,
        now: Instant,
    ) -> GatewayResult<Admission> {
        let policy = self.config.policy(class);
        let window = policy.window();
        self.trim_if_needed(now);

        let mut entry = self.windows.entry((identity.to_string(), class)).or_default();
        while entry.front().is_some_and(|t| now.saturating_duration_since(*t) >= window) {
            entry.pop_front();
        }

        let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
        if used >= policy.max {
            let retry_after = entry
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            let retry_after_secs = ceil_secs(retry_after);
            tracing::warn!(
                "[Admission] Rate limit hit: identity={} class={} used={}/{}",
                identity,
                class,
                used,
                policy.max
            );
            return Err(GatewayError::RateLimited {
                endpoint: class.to_string(),
                retry_after_secs,
            });
        }

        entry.push_back(now);
        Ok(Admission { limit: policy.max, remaining: policy.max.saturating_sub(used + 1) })
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Bound the number of tracked windows: drop idle ones, then the least
    /// recently active. Each window ages out under its own class policy.
    fn trim_if_needed(&self, now: Instant) {
        let max = self.config.max_tracked_identities;
        if self.windows.len() < max {
            return;
        }
        self.windows.retain(|(_, class), w| {
            let window = self.config.policy(*class).window();
            w.back().is_some_and(|t| now.saturating_duration_since(*t) < window)
        });

        let excess = (self.windows.len() + 1).saturating_sub(max);
        if excess == 0 {
            return;
        }
        let mut by_activity: Vec<(WindowKey, Option<Instant>)> =
            self.windows.iter().map(|e| (e.key().clone(), e.value().back().copied())).collect();
        by_activity.sort_by_key(|(_, last)| *last);
        for (key, _) in by_activity.into_iter().take(excess) {
            self.windows.remove(&key);
        }
        tracing::debug!("[Admission] Trimmed {} idle rate windows", excess);
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}
