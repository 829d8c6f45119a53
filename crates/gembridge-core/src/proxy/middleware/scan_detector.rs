//! Scan/abuse heuristics over request paths.
//!
//! An identity that touches enough distinct sensitive paths inside the scan
//! window is blocked for `block_duration`; the block lifts itself on the
//! first check after it expires.

use dashmap::DashMap;
use gembridge_types::models::ScanConfig;
use regex::RegexSet;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use std::time::Instant;

/// Credential files, admin consoles, traversal and shell-injection tokens.
const SENSITIVE_PATTERNS: &[&str] = &[
    r"\.env\b",
    r"\.git/",
    r"\.aws/credentials",
    r"\.htaccess",
    r"id_rsa",
    r"config\.php",
    r"wp-admin",
    r"wp-login",
    r"phpmyadmin",
    r"(^|/)admin(/|$)",
    r"/etc/passwd",
    r"\.\./",
    r"%2e%2e",
    r";",
    r"\|",
    r"`",
    r"\$\(",
    r"cmd=",
    r"/bin/(ba)?sh",
];

static SENSITIVE_PATHS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(SENSITIVE_PATTERNS).unwrap_or_else(|e| {
        tracing::error!("[Scan] Failed to compile sensitive path patterns: {}", e);
        RegexSet::empty()
    })
});

pub fn is_sensitive_path(path: &str) -> bool {
    SENSITIVE_PATHS.is_match(&path.to_ascii_lowercase())
}

#[derive(Default)]
struct ScanRecord {
    recent: VecDeque<(Instant, String)>,
}

pub struct ScanDetector {
    records: DashMap<String, ScanRecord>,
    blocks: DashMap<String, Instant>,
    config: ScanConfig,
}

impl ScanDetector {
    pub fn new(config: ScanConfig) -> Self {
        Self { records: DashMap::new(), blocks: DashMap::new(), config }
    }

    pub fn record(&self, identity: &str, path: &str) {
        self.record_at(identity, path, Instant::now());
    }

    pub fn record_at(&self, identity: &str, path: &str, now: Instant) {
        self.trim_if_needed(now);
        let mut record = self.records.entry(identity.to_string()).or_default();
        record.recent.push_back((now, path.to_string()));
        while record.recent.len() > self.config.history_limit {
            record.recent.pop_front();
        }
    }

    pub fn is_attack(&self, identity: &str) -> bool {
        self.is_attack_at(identity, Instant::now())
    }

    /// Already blocked, or just crossed the distinct-sensitive-path threshold
    /// (which starts a block).
    pub fn is_attack_at(&self, identity: &str, now: Instant) -> bool {
        if self.is_blocked_at(identity, now) {
            return true;
        }

        let distinct = match self.records.get(identity) {
            Some(record) => {
                let window = self.config.window();
                record
                    .recent
                    .iter()
                    .filter(|(t, _)| now.saturating_duration_since(*t) < window)
                    .filter(|(_, p)| is_sensitive_path(p))
                    .map(|(_, p)| p.as_str())
                    .collect::<HashSet<_>>()
                    .len()
            },
            None => 0,
        };

        if distinct >= self.config.threshold {
            tracing::warn!(
                "[Scan] Blocking {} for {}s after {} distinct sensitive paths",
                identity,
                self.config.block_secs,
                distinct
            );
            self.blocks.insert(identity.to_string(), now);
            return true;
        }
        false
    }

    pub fn is_blocked_at(&self, identity: &str, now: Instant) -> bool {
        let blocked_at = match self.blocks.get(identity) {
            Some(entry) => *entry,
            None => return false,
        };
        if now.saturating_duration_since(blocked_at) < self.config.block_duration() {
            return true;
        }
        self.blocks.remove(identity);
        self.records.remove(identity);
        tracing::info!("[Scan] Block expired for {}", identity);
        false
    }

    fn trim_if_needed(&self, now: Instant) {
        let max = self.config.max_tracked_identities;
        if self.records.len() < max {
            return;
        }
        let window = self.config.window();
        self.records.retain(|_, r| {
            r.recent.back().is_some_and(|(t, _)| now.saturating_duration_since(*t) < window)
        });
        let block_duration = self.config.block_duration();
        self.blocks.retain(|_, t| now.saturating_duration_since(*t) < block_duration);

        let excess = (self.records.len() + 1).saturating_sub(max);
        if excess == 0 {
            return;
        }
        let mut by_activity: Vec<(String, Option<Instant>)> = self
            .records
            .iter()
            .map(|e| (e.key().clone(), e.value().recent.back().map(|(t, _)| *t)))
            .collect();
        by_activity.sort_by_key(|(_, last)| *last);
        for (key, _) in by_activity.into_iter().take(excess) {
            self.records.remove(&key);
        }
    }
}
