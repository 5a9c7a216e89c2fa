//! Pie chart of spending by category.
//!
//! [`slices`] turns a category breakdown into chart data without touching the
//! terminal; [`PieChart`] is the ratatui widget that draws it.

use crate::models::format_currency;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Paragraph, Widget};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::f64::consts::TAU;

/// Where the first slice begins, counter-clockwise from the positive x axis.
const START_ANGLE_DEG: f64 = 140.0;

const PALETTE: [Color; 8] = [
    Color::Blue,
    Color::Yellow,
    Color::Green,
    Color::Red,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
    Color::LightBlue,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub amount: Decimal,
    /// Fraction of the circle, 0.0..=1.0.
    pub share: f64,
}

/// Builds one slice per category. Categories with a non-positive total stay
/// in the legend with a zero share.
pub fn slices<'a>(breakdown: impl IntoIterator<Item = (&'a str, Decimal)>) -> Vec<Slice> {
    let pairs: Vec<(&str, Decimal)> = breakdown.into_iter().collect();
    let drawn: Decimal = pairs.iter().map(|(_, amount)| (*amount).max(Decimal::ZERO)).sum();
    pairs
        .into_iter()
        .map(|(label, amount)| Slice {
            label: label.to_string(),
            amount,
            share: if drawn > Decimal::ZERO {
                (amount.max(Decimal::ZERO) / drawn).to_f64().unwrap_or(0.0)
            } else {
                0.0
            },
        })
        .collect()
}

fn color_for(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// Index of the slice covering the point `(x, y)` of the unit circle.
fn slice_at(slices: &[Slice], x: f64, y: f64) -> Option<usize> {
    let start = START_ANGLE_DEG.to_radians();
    let offset = (y.atan2(x) - start).rem_euclid(TAU) / TAU;
    let mut cumulative = 0.0;
    let mut last_drawn = None;
    for (idx, slice) in slices.iter().enumerate() {
        if slice.share <= 0.0 {
            continue;
        }
        cumulative += slice.share;
        last_drawn = Some(idx);
        if offset < cumulative {
            return Some(idx);
        }
    }
    // rounding can leave a sliver past the final boundary
    last_drawn
}

/// Canvas bounds that keep the circle round on cells roughly twice as tall
/// as they are wide.
fn bounds(area: Rect) -> ([f64; 2], [f64; 2]) {
    let ratio = f64::from(area.width) / (2.0 * f64::from(area.height.max(1)));
    if ratio >= 1.0 {
        ([-ratio, ratio], [-1.0, 1.0])
    } else {
        ([-1.0, 1.0], [-1.0 / ratio, 1.0 / ratio])
    }
}

/// Samples per axis; braille gives 2x4 dots per cell.
fn grid_steps(area: Rect) -> usize {
    usize::from(area.width).max(usize::from(area.height) * 2) * 2
}

fn sample_points(slices: &[Slice], area: Rect) -> Vec<Vec<(f64, f64)>> {
    let mut points = vec![Vec::new(); slices.len()];
    let steps = grid_steps(area);
    let step = 2.0 / steps as f64;
    for i in 0..=steps {
        for j in 0..=steps {
            let x = -1.0 + i as f64 * step;
            let y = -1.0 + j as f64 * step;
            if x * x + y * y > 1.0 {
                continue;
            }
            if let Some(idx) = slice_at(slices, x, y) {
                points[idx].push((x, y));
            }
        }
    }
    points
}

/// Pie chart with a legend showing each category's share and amount.
pub struct PieChart<'a> {
    slices: &'a [Slice],
    block: Option<Block<'a>>,
}

impl<'a> PieChart<'a> {
    pub fn new(slices: &'a [Slice]) -> Self {
        Self {
            slices,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn legend(&self) -> Vec<Line<'a>> {
        let slices: &'a [Slice] = self.slices;
        slices
            .iter()
            .enumerate()
            .map(|(idx, slice)| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(color_for(idx))),
                    Span::raw(slice.label.as_str()),
                    Span::raw(format!(
                        "  {:.1}%  {}",
                        slice.share * 100.0,
                        format_currency(slice.amount)
                    )),
                ])
            })
            .collect()
    }
}

impl Widget for PieChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if area.width == 0 || area.height == 0 {
            return;
        }

        if self.slices.iter().all(|s| s.share <= 0.0) {
            Paragraph::new("Nothing to chart yet.").render(area, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let points = sample_points(self.slices, chunks[0]);
        let (x_bounds, y_bounds) = bounds(chunks[0]);
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                for (idx, coords) in points.iter().enumerate() {
                    ctx.draw(&Points {
                        coords,
                        color: color_for(idx),
                    });
                }
            })
            .render(chunks[0], buf);

        Paragraph::new(self.legend()).render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn shares_follow_amounts() {
        let slices = slices([("Food", dec!(20)), ("Transport", dec!(10))]);
        assert_eq!(slices.len(), 2);
        assert!((slices[0].share - 2.0 / 3.0).abs() < 1e-9);
        assert!((slices[1].share - 1.0 / 3.0).abs() < 1e-9);
        let sum: f64 = slices.iter().map(|s| s.share).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_categories_get_no_share() {
        let slices = slices([("Refund", dec!(-5)), ("Food", dec!(10)), ("Free", dec!(0))]);
        assert_eq!(slices[0].share, 0.0);
        assert_eq!(slices[1].share, 1.0);
        assert_eq!(slices[2].share, 0.0);
    }

    #[test]
    fn first_slice_starts_at_start_angle() {
        let slices = slices([("A", dec!(1)), ("B", dec!(1))]);
        let just_after = (START_ANGLE_DEG + 10.0).to_radians();
        let opposite = (START_ANGLE_DEG + 190.0).to_radians();
        assert_eq!(slice_at(&slices, just_after.cos(), just_after.sin()), Some(0));
        assert_eq!(slice_at(&slices, opposite.cos(), opposite.sin()), Some(1));
    }

    #[test]
    fn slice_at_skips_empty_slices() {
        let slices = slices([("Zero", dec!(0)), ("All", dec!(5))]);
        assert_eq!(slice_at(&slices, 1.0, 0.0), Some(1));
        assert_eq!(slice_at(&slices, -1.0, 0.0), Some(1));
    }

    #[test]
    fn renders_legend_with_percentages() {
        let slices = slices([("Food", dec!(20.00)), ("Transport", dec!(10))]);
        let area = Rect::new(0, 0, 70, 12);
        let mut buf = Buffer::empty(area);
        PieChart::new(&slices).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Food  66.7%  $20.00"));
        assert!(text.contains("Transport  33.3%  $10.00"));
    }

    #[test]
    fn renders_placeholder_when_nothing_positive() {
        let slices = slices([("Refund", dec!(-3))]);
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        PieChart::new(&slices)
            .block(Block::default().title("Pie"))
            .render(area, &mut buf);
        assert!(buffer_text(&buf).contains("Nothing to chart yet."));
    }

    #[test]
    fn grid_steps_handle_very_tall_areas() {
        assert_eq!(grid_steps(Rect::new(0, 0, 40, 10)), 80);
        assert_eq!(grid_steps(Rect::new(0, 0, 10, 40)), 160);
        assert_eq!(grid_steps(Rect::new(0, 0, 10, u16::MAX)), usize::from(u16::MAX) * 4);
    }

    #[test]
    fn amounts_keep_exact_decimal_values() {
        let slices = slices([("Food", dec!(0.1)), ("Drink", dec!(0.2))]);
        assert_eq!(slices[0].amount + slices[1].amount, dec!(0.3));
        assert!((slices[0].share - 1.0 / 3.0).abs() < 1e-9);
    }
}
