// ============================================================================
// Indicateurs - Graphiques RSI et MACD
// ============================================================================
// RSI : une courbe et les niveaux 70 / 30
// MACD : ligne MACD, ligne de signal et histogramme (nuage de points)
// ============================================================================

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use crate::market::SeriesBuffer;
use crate::ui::chart::{padded_bounds, render_no_data};

/// Niveau de surachat
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// Niveau de survente
pub const RSI_OVERSOLD: f64 = 30.0;

/// Séries MACD prêtes à tracer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<(f64, f64)>,
    pub signal: Vec<(f64, f64)>,
    pub histogram: Vec<(f64, f64)>,
}

impl MacdSeries {
    /// Bornes min/max sur les trois séries
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.macd
            .iter()
            .chain(&self.signal)
            .chain(&self.histogram)
            .map(|&(_, y)| y)
            .fold(None, |acc, y| match acc {
                None => Some((y, y)),
                Some((min, max)) => Some((f64::min(min, y), f64::max(max, y))),
            })
    }
}

/// Points (index, RSI) ; les points sans RSI sont ignorés
pub fn rsi_points(series: &SeriesBuffer) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .filter_map(|(i, point)| point.rsi.map(|rsi| (i as f64, rsi)))
        .collect()
}

pub fn macd_series(series: &SeriesBuffer) -> MacdSeries {
    let mut out = MacdSeries::default();
    for (i, point) in series.iter().enumerate() {
        if let Some(macd) = point.macd {
            let x = i as f64;
            out.macd.push((x, macd.macd));
            out.signal.push((x, macd.signal));
            out.histogram.push((x, macd.histogram));
        }
    }
    out
}

fn x_bounds(series: &SeriesBuffer) -> [f64; 2] {
    [0.0, (series.len().max(2) - 1) as f64]
}

/// Dessine le graphique RSI
pub fn render_rsi_chart(frame: &mut Frame, series: &SeriesBuffer, area: Rect) {
    let points = rsi_points(series);
    if points.is_empty() {
        render_no_data(frame, area, "RSI indisponible");
        return;
    }

    let [x_min, x_max] = x_bounds(series);
    let overbought = [(x_min, RSI_OVERBOUGHT), (x_max, RSI_OVERBOUGHT)];
    let oversold = [(x_min, RSI_OVERSOLD), (x_max, RSI_OVERSOLD)];

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&overbought),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&oversold),
        Dataset::default()
            .name("RSI")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&points),
    ];

    let last = points.last().map(|&(_, rsi)| rsi).unwrap_or_default();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" RSI (14) {:.1} ", last)),
        )
        .x_axis(Axis::default().bounds([x_min, x_max]))
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, 100.0])
                .labels(vec![Span::raw("0"), Span::raw("50"), Span::raw("100")]),
        );

    frame.render_widget(chart, area);
}

/// Dessine le graphique MACD
pub fn render_macd_chart(frame: &mut Frame, series: &SeriesBuffer, area: Rect) {
    let macd = macd_series(series);
    let (min, max) = match macd.bounds() {
        Some(bounds) => bounds,
        None => {
            render_no_data(frame, area, "MACD indisponible");
            return;
        }
    };
    let (y_min, y_max) = padded_bounds(min, max);
    let [x_min, x_max] = x_bounds(series);

    let datasets = vec![
        Dataset::default()
            .name("Hist")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::DarkGray))
            .data(&macd.histogram),
        Dataset::default()
            .name("MACD")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&macd.macd),
        Dataset::default()
            .name("Signal")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&macd.signal),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" MACD (12, 26, 9) "))
        .x_axis(Axis::default().bounds([x_min, x_max]))
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.5}", y_min)),
                    Span::raw(format!("{:.5}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Macd, MarketDataPoint};
    use chrono::{TimeZone, Utc};

    fn series() -> SeriesBuffer {
        let mut series = SeriesBuffer::new();
        for i in 0..4 {
            series.push(MarketDataPoint {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
                price: 1.0,
                rsi: if i == 1 { None } else { Some(40.0 + i as f64) },
                macd: Some(Macd::new(0.1 * i as f64, 0.05)),
            });
        }
        series
    }

    #[test]
    fn test_rsi_points_skip_missing() {
        let points = rsi_points(&series());
        assert_eq!(points, vec![(0.0, 40.0), (2.0, 42.0), (3.0, 43.0)]);
    }

    #[test]
    fn test_macd_series_and_bounds() {
        let macd = macd_series(&series());
        assert_eq!(macd.macd.len(), 4);
        assert_eq!(macd.histogram[0].1, -0.05);

        let (min, max) = macd.bounds().unwrap();
        assert_eq!(min, -0.05);
        assert!((max - 0.3).abs() < 1e-12);

        assert_eq!(MacdSeries::default().bounds(), None);
    }
}
