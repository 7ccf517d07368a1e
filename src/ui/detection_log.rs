//! Detection log screen rendering
//!
//! Renders the main detection log view showing recent detections with their
//! danger levels, distances, confidences, and sources, newest first.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{danger_color, danger_icon, format_age, status_footer};
use crate::app::App;
use crate::data::DetectionRecord;

/// Formats a distance reading for a log row
fn format_distance(distance_cm: Option<f64>) -> String {
    match distance_cm {
        Some(cm) if cm >= 100.0 => format!("{:.1}m", cm / 100.0),
        Some(cm) => format!("{:.0}cm", cm),
        None => "--".to_string(),
    }
}

/// Formats a normalized confidence as a percentage
fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) => format!("{:.0}%", c * 100.0),
        None => "--".to_string(),
    }
}

/// Builds one log row for a detection
fn detection_row(detection: &DetectionRecord, selected: bool) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let base_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(marker.to_string(), base_style.fg(Color::Cyan)),
        Span::styled(
            format!("{} ", danger_icon(detection.danger_level)),
            base_style,
        ),
        Span::styled(
            format!("{:<8} ", detection.danger_level.label()),
            base_style.fg(danger_color(detection.danger_level)),
        ),
        Span::styled(format!("{:<16} ", detection.object_detected), base_style),
        Span::styled(
            format!("{:>7} ", format_distance(detection.distance_cm)),
            base_style.fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:>4} ", format_confidence(detection.detection_confidence)),
            base_style.fg(Color::Gray),
        ),
        Span::styled(
            format!(
                "{:<10} ",
                detection.detection_source.as_deref().unwrap_or("--")
            ),
            base_style.fg(Color::DarkGray),
        ),
        Span::styled(
            format_age(detection.detected_at),
            base_style.fg(Color::DarkGray),
        ),
    ])
}

/// Renders the detection log screen
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let title = match app.danger_filter {
        Some(threshold) => format!(" Detections (>= {}) ", threshold.label()),
        None => " Detections ".to_string(),
    };

    let detections = app.filtered_detections();
    let mut lines: Vec<Line> = Vec::new();

    if detections.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No detections",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for (i, detection) in detections.iter().enumerate() {
            lines.push(detection_row(detection, i == app.selected_index));
        }
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);
    frame.render_widget(Paragraph::new(status_footer(app)), chunks[1]);
}
