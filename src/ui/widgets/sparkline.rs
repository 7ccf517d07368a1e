//! Score sparkline widget for inline trend visualization

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for different score levels (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A sparkline widget showing prediction scores over time
///
/// Scores are fractions in [0, 1]; values outside that range are clamped.
pub struct ScoreSparkline<'a> {
    /// Scores for each time slot, oldest first
    scores: &'a [f64],
    /// Position marker (index into scores), usually the latest sample
    marked_position: Option<usize>,
    /// Style for the sparkline
    style: Style,
    /// Style for the position marker
    marker_style: Style,
}

impl<'a> ScoreSparkline<'a> {
    pub fn new(scores: &'a [f64]) -> Self {
        Self {
            scores,
            marked_position: None,
            style: Style::default().fg(Color::Cyan),
            marker_style: Style::default().fg(Color::Yellow),
        }
    }

    pub fn marked_position(mut self, pos: usize) -> Self {
        self.marked_position = Some(pos);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn score_to_block(&self, score: f64) -> char {
        let normalized = score.clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }
}

impl<'a> Widget for ScoreSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;

        for (i, score) in self.scores.iter().take(width).enumerate() {
            let block = self.score_to_block(*score);
            let x = area.x + i as u16;
            let y = area.y;

            let style = if self.marked_position == Some(i) {
                self.marker_style
            } else {
                self.style
            };

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(block).set_style(style);
            }
        }
    }
}
