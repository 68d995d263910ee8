use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maps a short model alias (e.g. `"fast"`, `"reasoning"`) to the concrete
/// model identifier a provider understands. Forgelet never hard-codes model
/// names: every role agent looks its model up through this table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelAliasTable {
    #[serde(flatten)]
    aliases: IndexMap<String, String>,
}

impl Default for ModelAliasTable {
    fn default() -> Self {
        let mut aliases = IndexMap::new();
        aliases.insert("default".to_string(), "default".to_string());
        Self { aliases }
    }
}

impl ModelAliasTable {
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }
}

/// Which model alias each role agent uses, with a `"default"` fallback used
/// whenever a role has no specific entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleModelTable {
    #[serde(flatten)]
    roles: IndexMap<String, String>,
}

impl Default for RoleModelTable {
    fn default() -> Self {
        let mut roles = IndexMap::new();
        roles.insert("default".to_string(), "default".to_string());
        Self { roles }
    }
}

impl RoleModelTable {
    pub fn model_for(&self, role: &str) -> &str {
        self.roles
            .get(role)
            .or_else(|| self.roles.get("default"))
            .map(String::as_str)
            .unwrap_or("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_table_falls_back_to_default() {
        let table = RoleModelTable::default();
        assert_eq!(table.model_for("manager"), "default");
    }

    #[test]
    fn role_table_prefers_specific_entry() {
        let mut roles = IndexMap::new();
        roles.insert("default".to_string(), "default".to_string());
        roles.insert("reviewer".to_string(), "reasoning".to_string());
        let table = RoleModelTable { roles };
        assert_eq!(table.model_for("reviewer"), "reasoning");
        assert_eq!(table.model_for("executor"), "default");
    }

    #[test]
    fn alias_table_resolves_known_alias() {
        let mut aliases = IndexMap::new();
        aliases.insert("fast".to_string(), "claude-haiku".to_string());
        let table = ModelAliasTable { aliases };
        assert_eq!(table.resolve("fast"), Some("claude-haiku"));
        assert_eq!(table.resolve("unknown"), None);
    }
}
