use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::permissions::RuleAction;

/// Appends permission decisions to `<audit_directory>/bash-audit.log` in the
/// line format §6 specifies: `<rfc3339> <decision> <tool> <subject>`. The
/// directory and file are created with 0700/0600 permissions on Unix, the
/// same pattern the teacher's audit module uses for its own log files.
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(audit_directory: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = audit_directory.as_ref();
        std::fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
        }
        let log_path = dir.join("bash-audit.log");
        Ok(Self { log_path })
    }

    pub fn record(&self, tool_name: &str, subject: &str, action: RuleAction) -> std::io::Result<()> {
        use std::io::Write;

        let line = format!(
            "{} {:?} {tool_name} {subject}\n",
            Utc::now().to_rfc3339(),
            action
        );
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(line.as_bytes())
    }
}
