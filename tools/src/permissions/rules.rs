use regex::Regex;

/// What a [`Rule`] resolves a matching tool invocation to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Allow,
    Deny,
    Ask,
}

/// What part of the invocation a rule matches against: a file path argument,
/// or the first word of a shell command.
#[derive(Debug, Clone)]
pub enum RuleSubject {
    Path(Regex),
    CommandPrefix(Regex),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub tool_name: String,
    pub subject: RuleSubject,
    pub action: RuleAction,
}

impl Rule {
    pub fn matches(&self, tool_name: &str, path_or_command: &str) -> bool {
        if self.tool_name != tool_name {
            return false;
        }
        match &self.subject {
            RuleSubject::Path(re) | RuleSubject::CommandPrefix(re) => re.is_match(path_or_command),
        }
    }
}

/// Compiles a shell-style glob (`*`, `?`) into an anchored regex, the same
/// translation the teacher's command policy evaluator uses for its allow
/// and deny lists.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut escaped = regex::escape(pattern);
    escaped = escaped.replace(r"\*", ".*").replace(r"\?", ".");
    Regex::new(&format!("^{escaped}$"))
}
