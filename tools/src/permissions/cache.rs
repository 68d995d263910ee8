use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::permissions::RuleAction;

/// Key an ask-decision is cached under: the tool name plus either the path
/// or the command's first word, matching the rule-matching subject.
pub type CacheKey = (String, String);

struct CachedDecision {
    action: RuleAction,
    expires_at: Instant,
}

/// Caches user "ask" responses so the same (tool, path|command) pair is not
/// re-prompted within the TTL window. The teacher's original implementation
/// raced here: it read the cache, dropped the lock, asked the user, then
/// re-acquired a write lock to store the answer, leaving a window where two
/// concurrent callers for the same key could both prompt. This cache takes
/// its write lock once across the whole "ask and remember" sequence instead.
pub struct AskDecisionCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CachedDecision>>,
}

impl AskDecisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<RuleAction> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| cached.action)
    }

    /// Looks up `key` under a single write-lock guard; if absent, calls
    /// `decide` to obtain (and cache) a fresh decision. `decide` runs while
    /// the lock is held, so two callers racing on the same key serialize
    /// instead of both invoking the ask callback.
    pub fn get_or_decide(&self, key: CacheKey, decide: impl FnOnce() -> RuleAction) -> RuleAction {
        let mut entries = self.entries.write();
        if let Some(cached) = entries.get(&key) {
            if cached.expires_at > Instant::now() {
                return cached.action;
            }
        }
        let action = decide();
        entries.insert(
            key,
            CachedDecision {
                action,
                expires_at: Instant::now() + self.ttl,
            },
        );
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn caches_decision_across_calls() {
        let cache = AskDecisionCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let key = ("bash".to_string(), "git status".to_string());

        for _ in 0..3 {
            let action = cache.get_or_decide(key.clone(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                RuleAction::Allow
            });
            assert_eq!(action, RuleAction::Allow);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_entries_are_recomputed() {
        let cache = AskDecisionCache::new(Duration::from_millis(1));
        let key = ("bash".to_string(), "git status".to_string());
        cache.get_or_decide(key.clone(), || RuleAction::Deny);
        std::thread::sleep(Duration::from_millis(5));
        let calls = AtomicUsize::new(0);
        let action = cache.get_or_decide(key, || {
            calls.fetch_add(1, Ordering::SeqCst);
            RuleAction::Allow
        });
        assert_eq!(action, RuleAction::Allow);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
