//! Device status and system health screen rendering
//!
//! Renders the wearable's self-reported status (battery, subsystems,
//! last heartbeat) alongside host-level health of its Raspberry Pi.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{format_age, status_footer};
use crate::app::App;

/// Color for a utilization/battery percentage (higher usage = hotter color)
fn utilization_color(percent: f64) -> Color {
    if percent >= 90.0 {
        Color::Red
    } else if percent >= 70.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Color for remaining battery (lower charge = hotter color)
fn battery_color(percent: f64) -> Color {
    if percent < 20.0 {
        Color::Red
    } else if percent < 50.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// OK/FAIL span for a subsystem flag
fn subsystem_span(ok: bool) -> Span<'static> {
    if ok {
        Span::styled("OK", Style::default().fg(Color::Green))
    } else {
        Span::styled("FAIL", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    }
}

/// Formats seconds-since-boot as "1d 2h 3m"
fn format_uptime(uptime_secs: Option<u64>) -> String {
    let Some(secs) = uptime_secs else {
        return "--".to_string();
    };

    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Builds a "label: value" line with dimmed label
fn field_line(label: &str, value: Span<'static>) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<14}", label),
            Style::default().fg(Color::Gray),
        ),
        value,
    ])
}

/// Builds a percentage line, or a dimmed placeholder when the reading is gone
fn percent_line(label: &str, percent: Option<f64>, color_for: fn(f64) -> Color) -> Line<'static> {
    let value = match percent {
        Some(p) => Span::styled(
            format!("{:>5.1}%", p),
            Style::default().fg(color_for(p)),
        ),
        None => Span::styled("--", Style::default().fg(Color::DarkGray)),
    };
    field_line(label, value)
}

/// Renders the health screen
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Device section
    let mut device_lines: Vec<Line> = Vec::new();
    match &app.device_status {
        Some(status) => {
            device_lines.push(field_line(
                "Device",
                Span::styled(status.device_id.clone(), Style::default().fg(Color::White)),
            ));
            device_lines.push(field_line(
                "State",
                if status.online {
                    Span::styled("Online", Style::default().fg(Color::Green))
                } else {
                    Span::styled(
                        "Offline",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                },
            ));
            device_lines.push(percent_line("Battery", status.battery_percent, battery_color));
            device_lines.push(field_line(
                "Temperature",
                match status.temperature_c {
                    Some(t) => Span::styled(format!("{:.1}°C", t), Style::default().fg(Color::Cyan)),
                    None => Span::styled("--", Style::default().fg(Color::DarkGray)),
                },
            ));
            device_lines.push(field_line(
                "Firmware",
                Span::raw(
                    status
                        .firmware_version
                        .clone()
                        .unwrap_or_else(|| "--".to_string()),
                ),
            ));
            device_lines.push(field_line("Camera", subsystem_span(status.camera_ok)));
            device_lines.push(field_line("Sensors", subsystem_span(status.sensors_ok)));
            device_lines.push(field_line(
                "Last seen",
                Span::styled(
                    format_age(status.last_seen),
                    Style::default().fg(Color::DarkGray),
                ),
            ));
        }
        None => {
            device_lines.push(Line::from(Span::styled(
                "  No device status",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let device_block = Block::default()
        .title(" Device ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(device_lines).block(device_block), chunks[0]);

    // System section
    let mut system_lines: Vec<Line> = Vec::new();
    match &app.health {
        Some(health) => {
            system_lines.push(percent_line("CPU", health.cpu_percent, utilization_color));
            system_lines.push(percent_line("Memory", health.memory_percent, utilization_color));
            system_lines.push(percent_line("Disk", health.disk_percent, utilization_color));
            system_lines.push(field_line("Network", subsystem_span(health.network_ok)));
            system_lines.push(field_line(
                "Uptime",
                Span::raw(format_uptime(health.uptime_secs)),
            ));
        }
        None => {
            system_lines.push(Line::from(Span::styled(
                "  No system health data",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let system_block = Block::default()
        .title(" System ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(system_lines).block(system_block), chunks[1]);

    frame.render_widget(Paragraph::new(status_footer(app)), chunks[2]);
}
