// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de la boucle
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Poll avec timeout : la boucle continue même sans touche pressée
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Délai d'attente d'un événement clavier
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Aucun événement pendant POLL_INTERVAL
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant au plus POLL_INTERVAL)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    /// - Les relâchements de touches sont ignorés (doublons sur certains OS)
    pub fn next(&self) -> Result<Event> {
        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// 'q' : quitter (confirmation en deux temps)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    )
}

/// Flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    )
}

/// Tab : catégorie suivante
pub fn is_next_category_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Tab))
}

/// 'l' ou flèche droite : timeframe suivant
pub fn is_next_timeframe_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l') | KeyCode::Right))
}

/// 'h' ou flèche gauche : timeframe précédent
pub fn is_previous_timeframe_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h') | KeyCode::Left))
}

/// 'a' : lancer l'analyse
pub fn is_analyze_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('a') | KeyCode::Char('A')))
}

/// 'p' : ouvrir la saisie de prévision
pub fn is_predict_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('p') | KeyCode::Char('P')))
}

/// Caractère accepté dans la saisie HH:MM:SS
pub fn is_time_char_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if c.is_ascii_digit() || c == ':')
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
