//! CLI command implementations

pub mod authenticate;
pub mod check_config;

use crate::OutputFormat;
use dirauth_core::DirAuthConfig;

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirAuthConfig,
    pub output_format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print diagnostic message on stderr if not quiet
    pub fn note(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }
}
