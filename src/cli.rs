//! Command-line interface parsing for the aidwatch dashboard
//!
//! This module handles parsing of CLI arguments using clap, including the
//! backend URL, initial view selection, detection log size, and refresh
//! control.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Default backend base URL (the device's Raspberry Pi on the local network)
const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Largest accepted detection page size
const MAX_DETECTION_LIMIT: usize = 500;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified view name is not recognized
    #[error("Invalid view: '{0}'. Valid views: log, analytics, health")]
    InvalidView(String),

    /// The detection limit is out of range
    #[error("Invalid limit: {0}. Must be between 1 and 500")]
    InvalidLimit(usize),

    /// The refresh interval is out of range
    #[error("Invalid refresh interval: {0}. Must be at least 1 second")]
    InvalidRefresh(u64),
}

/// Dashboard views selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Recent detection log
    DetectionLog,
    /// ML-prediction analytics
    Analytics,
    /// Device status and system health
    Health,
}

impl View {
    /// Parses a view name, accepting common aliases
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "detections" | "d" => Some(View::DetectionLog),
            "analytics" | "predictions" | "a" => Some(View::Analytics),
            "health" | "status" | "h" => Some(View::Health),
            _ => None,
        }
    }
}

/// Aidwatch - dashboard for a wearable assistive device
#[derive(Parser, Debug)]
#[command(name = "aidwatch")]
#[command(about = "Wearable assistive-device dashboard: detections, predictions, system health")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Open directly in a specific view
    ///
    /// Valid views: log, analytics, health
    #[arg(long, value_name = "VIEW")]
    pub view: Option<String>,

    /// Number of detections to request per refresh (1-500)
    #[arg(long, value_name = "N", default_value_t = 50)]
    pub limit: usize,

    /// Seconds between detection log refreshes
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub refresh: u64,

    /// Disable background refresh entirely
    #[arg(long)]
    pub no_refresh: bool,

    /// Write logs to this file instead of the default XDG location
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Backend base URL
    pub server_url: String,
    /// View to open once data has loaded
    pub initial_view: Option<View>,
    /// Detection log page size
    pub detection_limit: usize,
    /// Interval between detection log refreshes
    pub refresh_interval: Duration,
    /// Whether background refresh runs at all
    pub refresh_enabled: bool,
    /// Log file override
    pub log_file: Option<PathBuf>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER.to_string(),
            initial_view: None,
            detection_limit: 50,
            refresh_interval: Duration::from_secs(10),
            refresh_enabled: true,
            log_file: None,
        }
    }
}

/// Parses a view string argument into a View enum.
///
/// # Arguments
/// * `s` - The view string from CLI
///
/// # Returns
/// * `Ok(View)` if the string matches a valid view
/// * `Err(CliError::InvalidView)` if the string doesn't match
pub fn parse_view_arg(s: &str) -> Result<View, CliError> {
    View::from_str(s).ok_or_else(|| CliError::InvalidView(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if a value is invalid or out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let initial_view = cli.view.as_deref().map(parse_view_arg).transpose()?;

        if cli.limit == 0 || cli.limit > MAX_DETECTION_LIMIT {
            return Err(CliError::InvalidLimit(cli.limit));
        }
        if cli.refresh == 0 {
            return Err(CliError::InvalidRefresh(cli.refresh));
        }

        Ok(StartupConfig {
            server_url: cli.server.trim_end_matches('/').to_string(),
            initial_view,
            detection_limit: cli.limit,
            refresh_interval: Duration::from_secs(cli.refresh),
            refresh_enabled: !cli.no_refresh,
            log_file: cli.log_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_view_arg_log_aliases() {
        assert_eq!(parse_view_arg("log").unwrap(), View::DetectionLog);
        assert_eq!(parse_view_arg("detections").unwrap(), View::DetectionLog);
        assert_eq!(parse_view_arg("d").unwrap(), View::DetectionLog);
    }

    #[test]
    fn test_parse_view_arg_analytics_aliases() {
        assert_eq!(parse_view_arg("analytics").unwrap(), View::Analytics);
        assert_eq!(parse_view_arg("predictions").unwrap(), View::Analytics);
    }

    #[test]
    fn test_parse_view_arg_health_aliases() {
        assert_eq!(parse_view_arg("health").unwrap(), View::Health);
        assert_eq!(parse_view_arg("STATUS").unwrap(), View::Health);
    }

    #[test]
    fn test_parse_view_arg_invalid_returns_error() {
        let result = parse_view_arg("weather");
        assert!(matches!(result, Err(CliError::InvalidView(_))));
    }

    #[test]
    fn test_startup_config_default() {
        let config = StartupConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER);
        assert!(config.initial_view.is_none());
        assert_eq!(config.detection_limit, 50);
        assert_eq!(config.refresh_interval, Duration::from_secs(10));
        assert!(config.refresh_enabled);
    }

    #[test]
    fn test_from_cli_defaults() {
        let cli = Cli::parse_from(["aidwatch"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER);
        assert!(config.initial_view.is_none());
        assert_eq!(config.detection_limit, 50);
        assert!(config.refresh_enabled);
    }

    #[test]
    fn test_from_cli_with_view() {
        let cli = Cli::parse_from(["aidwatch", "--view", "analytics"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.initial_view, Some(View::Analytics));
    }

    #[test]
    fn test_from_cli_with_invalid_view() {
        let cli = Cli::parse_from(["aidwatch", "--view", "bogus"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_from_cli_strips_trailing_slash_from_server() {
        let cli = Cli::parse_from(["aidwatch", "--server", "http://pi.local:8000/"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.server_url, "http://pi.local:8000");
    }

    #[test]
    fn test_from_cli_rejects_zero_limit() {
        let cli = Cli::parse_from(["aidwatch", "--limit", "0"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidLimit(0))
        ));
    }

    #[test]
    fn test_from_cli_rejects_oversized_limit() {
        let cli = Cli::parse_from(["aidwatch", "--limit", "1000"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidLimit(1000))
        ));
    }

    #[test]
    fn test_from_cli_rejects_zero_refresh() {
        let cli = Cli::parse_from(["aidwatch", "--refresh", "0"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidRefresh(0))
        ));
    }

    #[test]
    fn test_from_cli_no_refresh_disables_polling() {
        let cli = Cli::parse_from(["aidwatch", "--no-refresh"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(!config.refresh_enabled);
    }
}
