pub mod audit;
pub mod cache;
pub mod hitl;
pub mod rules;

use std::time::Duration;

use forgelet_config::{PermissionMode, PermissionsConfig};

pub use cache::AskDecisionCache;
pub use hitl::RiskTier;
pub use rules::{Rule, RuleAction, RuleSubject};

/// Something the Permission Manager can ask the caller about a pending
/// request. Implementations that cannot interact with a user (CI, the
/// non-interactive Workflow driver) simply auto-deny.
pub trait AskCallback: Send + Sync {
    fn ask(&self, tool_name: &str, subject: &str) -> RuleAction;
}

/// Auto-denies every ask, the default for headless/CI runs (§4.4 notes the
/// engine's ask-callback auto-denies outside an interactive context).
pub struct AutoDenyCallback;

impl AskCallback for AutoDenyCallback {
    fn ask(&self, _tool_name: &str, _subject: &str) -> RuleAction {
        RuleAction::Deny
    }
}

/// C3: evaluates permission rules in the order the spec fixes - bypass mode
/// short-circuits everything, then the disallowed set, then ordered rules,
/// then an allow-list, then the mode's fallback action.
pub struct PermissionManager {
    mode: PermissionMode,
    disallowed: Vec<String>,
    rules: Vec<Rule>,
    allow_list: Vec<String>,
    cache: AskDecisionCache,
    audit: Option<audit::AuditLogger>,
    ask_callback: Box<dyn AskCallback>,
}

impl PermissionManager {
    pub fn new(config: &PermissionsConfig, ask_callback: Box<dyn AskCallback>) -> std::io::Result<Self> {
        let audit = if config.audit_enabled {
            let expanded = shellexpand_home(&config.audit_directory);
            Some(audit::AuditLogger::new(expanded)?)
        } else {
            None
        };
        Ok(Self {
            mode: config.mode,
            disallowed: Vec::new(),
            rules: Vec::new(),
            allow_list: Vec::new(),
            cache: AskDecisionCache::new(Duration::from_secs(config.cache_ttl_seconds)),
            audit,
            ask_callback,
        })
    }

    pub fn mode(&self) -> PermissionMode {
        self.mode
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_disallowed(mut self, tool_names: Vec<String>) -> Self {
        self.disallowed = tool_names;
        self
    }

    pub fn with_allow_list(mut self, tool_names: Vec<String>) -> Self {
        self.allow_list = tool_names;
        self
    }

    /// `subject` is the file path argument for file tools or the shell
    /// command for exec tools.
    pub fn evaluate(&self, tool_name: &str, subject: &str) -> RuleAction {
        let decision = self.evaluate_inner(tool_name, subject);
        if let Some(audit) = &self.audit {
            let _ = audit.record(tool_name, subject, decision);
        }
        decision
    }

    fn evaluate_inner(&self, tool_name: &str, subject: &str) -> RuleAction {
        if matches!(self.mode, PermissionMode::Bypass) {
            return RuleAction::Allow;
        }

        if self.disallowed.iter().any(|name| name == tool_name) {
            return RuleAction::Deny;
        }

        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(tool_name, subject)) {
            return self.resolve(rule.action, tool_name, subject);
        }

        if self.allow_list.iter().any(|name| name == tool_name) {
            return RuleAction::Allow;
        }

        let fallback = self.mode_fallback();
        if fallback == RuleAction::Ask && hitl::classify(tool_name) == RiskTier::Low {
            return RuleAction::Allow;
        }
        self.resolve(fallback, tool_name, subject)
    }

    fn resolve(&self, action: RuleAction, tool_name: &str, subject: &str) -> RuleAction {
        match action {
            RuleAction::Ask => {
                let key = (tool_name.to_string(), subject.to_string());
                self.cache
                    .get_or_decide(key, || self.ask_callback.ask(tool_name, subject))
            }
            other => other,
        }
    }

    fn mode_fallback(&self) -> RuleAction {
        match self.mode {
            PermissionMode::Bypass => RuleAction::Allow,
            PermissionMode::DontAsk => RuleAction::Deny,
            PermissionMode::AcceptEdits => RuleAction::Allow,
            PermissionMode::Plan => RuleAction::Deny,
            PermissionMode::Default => RuleAction::Ask,
        }
    }
}

fn shellexpand_home(path: &str) -> std::path::PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    std::path::PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::glob_to_regex;

    fn manager_with_mode(mode: PermissionMode) -> PermissionManager {
        let config = PermissionsConfig {
            mode,
            audit_enabled: false,
            audit_directory: "/tmp/forgelet-test-audit".to_string(),
            ..PermissionsConfig::default()
        };
        PermissionManager::new(&config, Box::new(AutoDenyCallback)).unwrap()
    }

    #[test]
    fn bypass_mode_allows_everything() {
        let manager = manager_with_mode(PermissionMode::Bypass).with_disallowed(vec!["bash".to_string()]);
        assert_eq!(manager.evaluate("bash", "rm -rf /"), RuleAction::Allow);
    }

    #[test]
    fn disallowed_set_wins_over_rules() {
        let manager = manager_with_mode(PermissionMode::AcceptEdits)
            .with_disallowed(vec!["bash".to_string()])
            .with_rules(vec![Rule {
                tool_name: "bash".to_string(),
                subject: RuleSubject::CommandPrefix(glob_to_regex("*").unwrap()),
                action: RuleAction::Allow,
            }]);
        assert_eq!(manager.evaluate("bash", "git status"), RuleAction::Deny);
    }

    #[test]
    fn rule_match_wins_over_allow_list() {
        let manager = manager_with_mode(PermissionMode::Default)
            .with_allow_list(vec!["bash".to_string()])
            .with_rules(vec![Rule {
                tool_name: "bash".to_string(),
                subject: RuleSubject::CommandPrefix(glob_to_regex("rm *").unwrap()),
                action: RuleAction::Deny,
            }]);
        assert_eq!(manager.evaluate("bash", "rm -rf /"), RuleAction::Deny);
        assert_eq!(manager.evaluate("bash", "git status"), RuleAction::Allow);
    }

    #[test]
    fn default_mode_falls_back_to_ask_and_caches() {
        let manager = manager_with_mode(PermissionMode::Default);
        assert_eq!(manager.evaluate("bash", "git status"), RuleAction::Deny);
    }

    #[test]
    fn plan_mode_denies_by_default() {
        let manager = manager_with_mode(PermissionMode::Plan);
        assert_eq!(manager.evaluate("write_file", "/tmp/a.txt"), RuleAction::Deny);
    }

    #[test]
    fn low_risk_tools_skip_the_ask_fallback() {
        let manager = manager_with_mode(PermissionMode::Default);
        assert_eq!(manager.evaluate("read_file", "/tmp/a.txt"), RuleAction::Allow);
    }

    #[test]
    fn high_risk_tools_still_hit_the_ask_fallback() {
        let manager = manager_with_mode(PermissionMode::Default);
        assert_eq!(manager.evaluate("exec_command", "rm -rf /"), RuleAction::Deny);
    }
}
