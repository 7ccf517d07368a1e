//! Prediction analytics screen rendering
//!
//! Renders one tile per prediction family (anomaly, danger, maintenance,
//! activity) with the latest class label, confidence, and a sparkline of the
//! recent score history.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{format_age, status_footer};
use super::widgets::ScoreSparkline;
use crate::app::App;
use crate::data::PredictionSummary;

/// Builds the header line of a prediction tile
fn tile_header(summary: &PredictionSummary) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {:<12}", summary.kind.label()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<16}", summary.label),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:>5.1}%  ", summary.confidence * 100.0),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format_age(summary.updated_at),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Renders the prediction analytics screen
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

    let block = Block::default()
        .title(" Prediction Analytics ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    if app.predictions.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "  No prediction data",
                Style::default().fg(Color::DarkGray),
            ))),
            inner,
        );
    } else {
        let mut constraints: Vec<Constraint> =
            app.predictions.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Min(0));
        let tiles = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (i, summary) in app.predictions.iter().enumerate() {
            let tile = tiles[i];
            if tile.height == 0 {
                continue;
            }

            let header_area = Rect { height: 1, ..tile };
            frame.render_widget(Paragraph::new(tile_header(summary)), header_area);

            if tile.height > 1 && !summary.history.is_empty() {
                let spark_area = Rect {
                    x: tile.x + 2,
                    y: tile.y + 1,
                    width: tile.width.saturating_sub(4),
                    height: 1,
                };
                let latest = summary.history.len().saturating_sub(1);
                frame.render_widget(
                    ScoreSparkline::new(&summary.history).marked_position(latest),
                    spark_area,
                );
            }
        }
    }

    frame.render_widget(Paragraph::new(status_footer(app)), chunks[1]);
}
