//! Logging and output control
//!
//! This module provides the [`Logger`] for controlling output verbosity,
//! formatting durations, and emitting the category-coded event lines that
//! log tooling consumes. Rotation and compression of log files on disk is
//! left to external tooling.

use std::fmt;
use std::time::Duration;

/// Category code attached to every structured event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Discovery,
    Login,
    Sync,
    Progress,
    Summary,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventCategory::Discovery => "DISCOVERY",
            EventCategory::Login => "LOGIN",
            EventCategory::Sync => "SYNC",
            EventCategory::Progress => "PROGRESS",
            EventCategory::Summary => "SUMMARY",
        };
        f.write_str(s)
    }
}

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Step information
    pub fn step(&self, message: &str) {
        if !self.quiet {
            println!("▶️  {}", message);
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Structured event line: `[CATEGORY] [CODE] message`
    pub fn event(&self, category: EventCategory, code: &str, message: &str) {
        if !self.quiet {
            println!("[{}] [{}] {}", category, code, message);
        }
    }

    /// Structured event line for failures, always emitted
    pub fn event_error(&self, category: EventCategory, code: &str, message: &str) {
        eprintln!("[{}] [{}] {}", category, code, message);
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(logger.format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(logger.format_duration(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn test_event_category_codes() {
        assert_eq!(EventCategory::Discovery.to_string(), "DISCOVERY");
        assert_eq!(EventCategory::Summary.to_string(), "SUMMARY");
    }
}
