// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine le tableau de bord complet :
//
//   ┌ header : actif, badge "En direct", timeframes ───────────────────┐
//   │ sidebar │ prix                                    │ analyse      │
//   │ actifs  │ RSI              │ MACD                 │ (signal,     │
//   │         │ prévision                               │  force)      │
//   └ footer : raccourcis / saisie / message d'état ───────────────────┘
//
// CONCEPTS RATATUI :
// 1. Layout imbriqués : découpage vertical puis horizontal
// 2. List + ListState : sélection surlignée dans la sidebar
// 3. Gauge : jauge de force du signal
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::{Signal, Timeframe};
use crate::ui::chart::render_price_chart;
use crate::ui::indicators::{render_macd_chart, render_rsi_chart};

const SIDEBAR_WIDTH: u16 = 26;
const ANALYSIS_WIDTH: u16 = 36;

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Contenu
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    render_header(frame, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(20),
            Constraint::Length(ANALYSIS_WIDTH),
        ])
        .split(rows[1]);

    render_sidebar(frame, app, columns[0]);
    render_market(frame, app, columns[1]);
    render_analysis_panel(frame, app, columns[2]);

    match app.current_screen {
        Screen::Dashboard => render_footer(frame, app, rows[2]),
        Screen::PredictionInput => render_input_footer(frame, app, rows[2]),
    }
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" PocketBot ")
        .title_alignment(Alignment::Center);

    let mut spans = match app.selected_asset() {
        Some(asset) => vec![
            Span::styled(
                format!(" {} ", asset.symbol),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                " ● En direct ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ],
        None => vec![Span::styled(" Aucun actif ", Style::default().fg(Color::Gray))],
    };

    spans.push(Span::raw("   "));
    spans.extend(timeframe_strip(app.timeframe));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

/// Bandeau des timeframes, le courant en surbrillance
fn timeframe_strip(current: Timeframe) -> Vec<Span<'static>> {
    Timeframe::ALL
        .iter()
        .map(|tf| {
            let style = if *tf == current {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Span::styled(format!(" {} ", tf.label()), style)
        })
        .collect()
}

// ============================================================================
// Sidebar : catégories et actifs
// ============================================================================

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", app.category.label()));

    let selected_symbol = app.selected_asset().map(|asset| asset.symbol);

    let items: Vec<ListItem> = app
        .visible_assets()
        .into_iter()
        .map(|asset| {
            let marker = if Some(asset.symbol) == selected_symbol { "▶ " } else { "  " };
            let mut spans = vec![Span::raw(format!("{}{}", marker, asset.symbol))];
            if asset.is_otc {
                spans.push(Span::styled(" OTC", Style::default().fg(Color::Yellow)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));

    // CONCEPT RATATUI : Stateful widget
    // - ListState porte l'index surligné (et le défilement)
    let mut state = ListState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(list, area, &mut state);
}

// ============================================================================
// Zone centrale : prix, indicateurs, prévision
// ============================================================================

fn render_market(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(30),
            Constraint::Min(4),
        ])
        .split(area);

    render_price_chart(frame, app, rows[0]);

    let indicators = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_rsi_chart(frame, app.session.series(), indicators[0]);
    render_macd_chart(frame, app.session.series(), indicators[1]);

    render_prediction(frame, app, rows[2]);
}

fn render_prediction(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Comparateur temporel & prévision ");

    let line = if app.is_predicting {
        Line::from(Span::styled("Analyse...", Style::default().fg(Color::Cyan)))
    } else if let Some(prediction) = &app.prediction {
        let style = if prediction.is_fallback() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(Span::styled(prediction.text().to_string(), style))
    } else {
        Line::from(Span::styled(
            "[p] Saisir une heure cible (HH:MM:SS) pour l'actif sélectionné",
            Style::default().fg(Color::Gray),
        ))
    };

    let paragraph = Paragraph::new(line)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Panneau d'analyse
// ============================================================================

fn signal_color(signal: Signal) -> Color {
    match signal {
        Signal::Buy => Color::Green,
        Signal::Sell => Color::Red,
        Signal::Neutral => Color::Gray,
    }
}

fn render_analysis_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Analyse du marché ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Signal
            Constraint::Length(1), // Jauge
            Constraint::Min(0),    // Justification
        ])
        .split(inner);

    if app.is_analyzing {
        let waiting = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Analyse des indicateurs...",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(waiting, inner);
        return;
    }

    let outcome = match &app.analysis {
        Some(outcome) => outcome,
        None => {
            let idle = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled("En attente d'analyse", Style::default().fg(Color::Gray))),
                Line::from(""),
                Line::from(Span::styled(
                    "[a] Lancer l'analyse",
                    Style::default().fg(Color::Yellow),
                )),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(idle, inner);
            return;
        }
    };

    let result = outcome.result();
    let color = signal_color(result.signal);

    let source = if outcome.is_fallback() {
        Span::styled("calcul local", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("Gemini", Style::default().fg(Color::Green))
    };

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            result.signal.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw(format!("{}  {}  ", result.asset, result.timeframe.label())),
            source,
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(header, rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(result.trend_strength.min(100)))
        .label(format!("Force : {}%", result.trend_strength));
    frame.render_widget(gauge, rows[1]);

    let reasoning = Paragraph::new(Line::from(Span::styled(
        format!("\"{}\"", result.reasoning),
        Style::default().add_modifier(Modifier::ITALIC),
    )))
    .wrap(Wrap { trim: true });
    frame.render_widget(reasoning, rows[2]);
}

// ============================================================================
// Footer : raccourcis, confirmation de sortie, message d'état
// ============================================================================

fn key_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if let Some(message) = &app.status_message {
        Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(vec![
            Span::styled("[q]", key_style()),
            Span::raw(" Quitter  "),
            Span::styled("[Tab]", key_style()),
            Span::raw(" Catégorie  "),
            Span::styled("[↑↓ / j k]", key_style()),
            Span::raw(" Naviguer  "),
            Span::styled("[Enter]", key_style()),
            Span::raw(" Sélectionner  "),
            Span::styled("[h l]", key_style()),
            Span::raw(" Timeframe  "),
            Span::styled("[a]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Analyser  "),
            Span::styled("[p]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Prévision"),
        ])
    };

    let paragraph = Paragraph::new(line)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie : ligne de l'heure cible
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let line = Line::from(vec![
        Span::styled(
            "Temps cible (HH:MM:SS) : ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::raw("   "),
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Valider  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Annuler"),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
