use crate::registry::ToolResult;

/// Fluent builder for [`ToolResult`], grounded on the teacher's
/// `ToolResponseBuilder`: tool bodies compose stdout/stderr/exit-code style
/// fragments and the builder decides the final `is_error` flag and rendered
/// content.
#[derive(Debug, Default, Clone)]
pub struct ToolResponseBuilder {
    stdout: Option<String>,
    stderr: Option<String>,
    summary: Option<String>,
    is_error: bool,
}

impl ToolResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, text: impl Into<String>) -> Self {
        self.stdout = Some(text.into());
        self
    }

    pub fn stderr(mut self, text: impl Into<String>) -> Self {
        self.stderr = Some(text.into());
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }

    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn build(self) -> ToolResult {
        let mut parts = Vec::new();
        if let Some(summary) = self.summary {
            parts.push(summary);
        }
        if let Some(stdout) = &self.stdout {
            parts.push(stdout.clone());
        }
        if let Some(stderr) = &self.stderr {
            if Some(stderr) != self.stdout.as_ref() {
                parts.push(stderr.clone());
            }
        }
        ToolResult {
            content: parts.join("\n"),
            is_error: self.is_error,
        }
    }
}
