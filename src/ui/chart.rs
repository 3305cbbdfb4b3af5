// ============================================================================
// Chart - Graphique des prix
// ============================================================================
// Graphique ligne des 60 derniers prix de l'actif sélectionné
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de points (x, y)
// 3. Axis : bornes et labels
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::market::SeriesBuffer;
use crate::models::Signal;

/// Marge verticale, en fraction de l'amplitude des prix
const Y_PADDING: f64 = 0.10;

/// Bornes de l'axe Y avec 10% de marge de chaque côté
///
/// Une série plate reçoit une marge relative au prix pour rester lisible.
pub fn padded_bounds(min: f64, max: f64) -> (f64, f64) {
    let range = max - min;
    let padding = if range > 0.0 {
        range * Y_PADDING
    } else {
        (max.abs() * 0.0001).max(f64::EPSILON)
    };
    (min - padding, max + padding)
}

/// Couleur de la courbe : rouge après un signal de VENTE, cyan sinon
pub fn price_color(last_signal: Option<Signal>) -> Color {
    match last_signal {
        Some(Signal::Sell) => Color::Red,
        _ => Color::Cyan,
    }
}

/// Points (index, prix) de la série
fn price_points(series: &SeriesBuffer) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .map(|(i, point)| (i as f64, point.price))
        .collect()
}

/// Dessine le graphique des prix
pub fn render_price_chart(frame: &mut Frame, app: &App, area: Rect) {
    let series = app.session.series();
    let asset = match app.selected_asset() {
        Some(asset) => asset,
        None => {
            render_no_data(frame, area, "Sélectionnez un actif dans la liste");
            return;
        }
    };

    let (min_price, max_price) = match series.price_bounds() {
        Some(bounds) => bounds,
        None => {
            render_no_data(frame, area, "En attente de données...");
            return;
        }
    };

    let points = price_points(series);
    let (y_min, y_max) = padded_bounds(min_price, max_price);
    let color = price_color(app.last_signal());

    let datasets = vec![Dataset::default()
        .name(asset.symbol)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let (first_time, last_time) = match (series.iter().next(), series.latest()) {
        (Some(first), Some(last)) => (first.time_label(), last.time_label()),
        _ => (String::new(), String::new()),
    };

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, (points.len().max(2) - 1) as f64])
        .labels(vec![Span::raw(first_time), Span::raw(last_time)]);

    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{:.5}", y_min)),
            Span::raw(format!("{:.5}", (y_min + y_max) / 2.0)),
            Span::raw(format!("{:.5}", y_max)),
        ]);

    let title = match series.latest() {
        Some(last) => Line::from(vec![
            Span::raw(format!(" {} ", asset.symbol)),
            Span::styled(
                format!("{} ", last.price_label()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(format!(" {} ", asset.symbol)),
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Affiche un message à la place d'un graphique
pub fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bounds() {
        let (low, high) = padded_bounds(1.0, 2.0);
        assert!((low - 0.9).abs() < 1e-12);
        assert!((high - 2.1).abs() < 1e-12);

        // Série plate : bornes distinctes
        let (low, high) = padded_bounds(1.085, 1.085);
        assert!(low < 1.085 && high > 1.085);
    }

    #[test]
    fn test_price_color() {
        assert_eq!(price_color(Some(Signal::Sell)), Color::Red);
        assert_eq!(price_color(Some(Signal::Buy)), Color::Cyan);
        assert_eq!(price_color(None), Color::Cyan);
    }
}
