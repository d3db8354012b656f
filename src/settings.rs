//! Tool location settings.
//!
//! The only configuration surface is where the `snipkit` executable lives.
//! The default is the bare command name, resolved through the environment's
//! normal executable search; hosts can override it programmatically or via
//! `SNIPRUNNER_CLI`.

use std::env;
use std::env::VarError;
use std::ffi::OsString;
use std::path::Path;

/// Bare command name used when nothing else is configured.
pub const DEFAULT_TOOL: &str = "snipkit";

/// Environment override for the tool path.
pub const TOOL_PATH_ENV: &str = "SNIPRUNNER_CLI";

#[derive(Debug, Clone)]
pub struct Settings {
    tool_path: OsString,
}

impl Settings {
    /// Settings with an explicit tool path.
    pub fn with_tool(path: impl Into<OsString>) -> Self {
        Self {
            tool_path: path.into(),
        }
    }

    /// Settings from the environment, falling back to the bare command name.
    pub fn from_env() -> Self {
        let tool_path = match env::var(TOOL_PATH_ENV) {
            Ok(value) if !value.is_empty() => OsString::from(value),
            Ok(_) | Err(VarError::NotPresent) => OsString::from(DEFAULT_TOOL),
            Err(VarError::NotUnicode(raw)) => raw,
        };
        Self { tool_path }
    }

    pub fn tool_path(&self) -> &OsString {
        &self.tool_path
    }

    /// Short display name for status and error text.
    pub fn tool_name(&self) -> String {
        Path::new(&self.tool_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.tool_path.to_string_lossy().into_owned())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_tool(DEFAULT_TOOL)
    }
}
