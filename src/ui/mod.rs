// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod events;     // Gestion des événements clavier
pub mod dashboard;  // Layout du tableau de bord
pub mod chart;      // Graphique des prix
pub mod indicators; // Graphiques RSI et MACD

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};
pub use dashboard::render;
