//! # Output Configuration
//!
//! Controls the appearance of CLI output. Color is resolved once per
//! invocation from the `--color` flag and the environment, then threaded
//! through the commands so styling decisions live in one place.
//!
//! Respected environment variables:
//! - `NO_COLOR` - disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - disables colors
//! - `CLICOLOR_FORCE=1` - forces colors even in non-TTY
//! - `TERM=dumb` - disables colors for dumb terminals

use std::env;

use console::style;

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the configuration from environment and the `--color` flag.
    ///
    /// `always` forces colors on (overriding `NO_COLOR`), `never` forces
    /// them off, anything else detects from the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even empty) disables colors.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Status marker for a successful build/update unit.
    pub fn ok_marker(&self) -> String {
        if self.use_color {
            style("ok").green().to_string()
        } else {
            "ok".to_string()
        }
    }

    /// Status marker for a failed unit.
    pub fn failed_marker(&self) -> String {
        if self.use_color {
            style("failed").red().bold().to_string()
        } else {
            "failed".to_string()
        }
    }

    /// Status marker for an entry with upstream changes.
    pub fn changed_marker(&self) -> String {
        if self.use_color {
            style("changed").yellow().to_string()
        } else {
            "changed".to_string()
        }
    }

    /// Dim a secondary detail such as a repository URL or a ref.
    pub fn dim(&self, text: &str) -> String {
        if self.use_color {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// Force colors on, regardless of environment.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Force colors off, regardless of environment.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
