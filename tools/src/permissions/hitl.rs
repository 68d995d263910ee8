/// Coarse risk tier a tool invocation is assigned before the Permission
/// Manager consults its rules, mirroring the teacher's human-in-the-loop
/// oversight gate (`safety::hitl`): low-risk read-only calls skip the rule
/// engine's Ask path even in stricter modes, while high-risk calls always
/// reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Classifies a tool call by name using simple prefix heuristics - the same
/// shape the teacher's oversight policy uses (`is_write_tool`,
/// `is_destructive_command`), generalized past any one concrete tool name
/// since concrete tool bodies are out of scope here.
pub fn classify(tool_name: &str) -> RiskTier {
    const HIGH_RISK_PREFIXES: &[&str] = &["exec", "bash", "shell", "delete", "rm"];
    const MEDIUM_RISK_PREFIXES: &[&str] = &["write", "edit", "patch", "mv", "move"];

    let lower = tool_name.to_ascii_lowercase();
    if HIGH_RISK_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        RiskTier::High
    } else if MEDIUM_RISK_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}
