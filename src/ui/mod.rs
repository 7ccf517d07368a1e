//! UI rendering module for the aidwatch dashboard
//!
//! This module contains all the rendering logic for the terminal user
//! interface, using the ratatui library for TUI components.

pub mod analytics;
pub mod detection_detail;
pub mod detection_log;
pub mod health;
pub mod help_overlay;
pub mod widgets;

pub use analytics::render as render_analytics;
pub use detection_detail::render as render_detection_detail;
pub use detection_log::render as render_detection_log;
pub use health::render as render_health;
pub use help_overlay::render as render_help_overlay;

use chrono::{DateTime, Utc};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use crate::app::App;
use crate::data::DangerLevel;

/// Color for a danger level
pub(crate) fn danger_color(level: DangerLevel) -> Color {
    match level {
        DangerLevel::Critical => Color::Red,
        DangerLevel::High => Color::LightRed,
        DangerLevel::Medium => Color::Yellow,
        DangerLevel::Low => Color::Green,
        DangerLevel::Unknown => Color::DarkGray,
    }
}

/// Danger level to icon mapping
pub(crate) fn danger_icon(level: DangerLevel) -> &'static str {
    match level {
        DangerLevel::Critical => "\u{1F534}", // 🔴
        DangerLevel::High => "\u{1F7E0}",     // 🟠
        DangerLevel::Medium => "\u{1F7E1}",   // 🟡
        DangerLevel::Low => "\u{1F7E2}",      // 🟢
        DangerLevel::Unknown => "\u{26AA}",   // ⚪
    }
}

/// Formats how long ago a timestamp was, for log rows and footers
pub(crate) fn format_age(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return "--".to_string();
    };

    let age = Utc::now().signed_duration_since(timestamp);
    if age.num_seconds() < 0 {
        return "now".to_string();
    }
    if age.num_seconds() < 60 {
        format!("{}s ago", age.num_seconds())
    } else if age.num_minutes() < 60 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_hours() < 24 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}

/// Builds the shared status footer: refresh state, last refresh time, errors
pub(crate) fn status_footer(app: &App) -> Line<'static> {
    let mut spans = Vec::new();

    if app.refreshing {
        spans.push(Span::styled(
            "Refreshing... ",
            Style::default().fg(Color::Cyan),
        ));
    } else if let Some(last) = app.last_refresh {
        spans.push(Span::styled(
            format!("Updated {} ", last.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(error) = &app.last_error {
        spans.push(Span::styled(
            format!("| {} ", error),
            Style::default().fg(Color::Red),
        ));
    }

    spans.push(Span::styled(
        "| 1 Log  2 Analytics  3 Health  r Refresh  ? Help",
        Style::default().fg(Color::DarkGray),
    ));

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_age_missing_timestamp() {
        assert_eq!(format_age(None), "--");
    }

    #[test]
    fn test_format_age_buckets() {
        let now = Utc::now();
        assert!(format_age(Some(now - Duration::seconds(30))).ends_with("s ago"));
        assert!(format_age(Some(now - Duration::minutes(5))).ends_with("m ago"));
        assert!(format_age(Some(now - Duration::hours(3))).ends_with("h ago"));
        assert!(format_age(Some(now - Duration::days(2))).ends_with("d ago"));
    }

    #[test]
    fn test_format_age_future_timestamp_is_now() {
        let future = Utc::now() + Duration::seconds(90);
        assert_eq!(format_age(Some(future)), "now");
    }

    #[test]
    fn test_danger_colors_are_distinct_for_real_levels() {
        let levels = [
            DangerLevel::Critical,
            DangerLevel::High,
            DangerLevel::Medium,
            DangerLevel::Low,
        ];
        for (i, a) in levels.iter().enumerate() {
            for (j, b) in levels.iter().enumerate() {
                if i != j {
                    assert_ne!(danger_color(*a), danger_color(*b));
                }
            }
        }
    }
}
