//! Detection detail screen rendering
//!
//! Renders the detailed view for a single detection, showing the full record
//! in a bordered box layout: object, danger level, measurements, source, and
//! snapshot image location.

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

/// Builds a "label: value" line with dimmed label
fn field_line(label: &str, value: String, value_style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<14}", label),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(value, value_style),
    ])
}

/// Builds the body lines for a detection record
fn detail_lines(detection: &DetectionRecord) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled(
            format!(" {} ", danger_icon(detection.danger_level)),
            Style::default(),
        ),
        Span::styled(
            detection.object_detected.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  [{}]", detection.danger_level.label()),
            Style::default()
                .fg(danger_color(detection.danger_level))
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(""));

    lines.push(field_line(
        "Distance",
        match detection.distance_cm {
            Some(cm) => format!("{:.0} cm", cm),
            None => "no rangefinder fix".to_string(),
        },
        Style::default().fg(Color::Cyan),
    ));
    lines.push(field_line(
        "Confidence",
        match detection.detection_confidence {
            Some(c) => format!("{:.1}%", c * 100.0),
            None => "--".to_string(),
        },
        Style::default().fg(Color::Cyan),
    ));
    lines.push(field_line(
        "Source",
        detection
            .detection_source
            .clone()
            .unwrap_or_else(|| "--".to_string()),
        Style::default(),
    ));
    lines.push(field_line(
        "Detected",
        match detection.detected_at {
            Some(at) => format!("{} ({})", at.format("%Y-%m-%d %H:%M:%S UTC"), format_age(Some(at))),
            None => "--".to_string(),
        },
        Style::default(),
    ));
    lines.push(field_line(
        "Record id",
        detection.id.to_string(),
        Style::default().fg(Color::DarkGray),
    ));

    lines.push(Line::from(""));
    match &detection.image_url {
        Some(url) => {
            lines.push(field_line(
                "Snapshot",
                url.clone(),
                Style::default().fg(Color::Blue),
            ));
        }
        None => {
            lines.push(field_line(
                "Snapshot",
                "none captured".to_string(),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    lines
}

/// Renders the detection detail screen
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
/// * `detection_id` - The id of the detection to display
pub fn render(frame: &mut Frame, app: &App, detection_id: i64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let block = Block::default()
        .title(" Detection ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let body = match app.get_detection(detection_id) {
        Some(detection) => Paragraph::new(detail_lines(detection))
            .block(block)
            .scroll((app.detail_scroll_offset, 0)),
        None => Paragraph::new(Line::from(Span::styled(
            "  Detection no longer in the log (refreshed away)",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block),
    };

    frame.render_widget(body, chunks[0]);
    frame.render_widget(Paragraph::new(status_footer(app)), chunks[1]);
}
