//! Shared traits and helper types reused across the forgelet crates: error
//! reporting/formatting, telemetry sinks, error categorization, token
//! estimation, and secret redaction for hook/audit output.

pub mod error_category;
pub mod errors;
pub mod sanitizer;
pub mod telemetry;
pub mod tokens;

pub use errors::{DisplayErrorFormatter, ErrorFormatter, ErrorReporter, NoopErrorReporter};
pub use error_category::ErrorCategory;
pub use sanitizer::redact_secrets;
pub use telemetry::{NoopTelemetry, TelemetrySink};
pub use tokens::{estimate_tokens, truncate_to_tokens};
