// ============================================================================
// PocketBot - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Service d'analyse (modèle génératif)
pub mod app;     // État de l'application
pub mod config;  // Paramètres (environnement, .env)
pub mod error;   // Erreurs typées du service d'analyse
pub mod market;  // Générateur de ticks, série, session
pub mod models;  // Structures de données
pub mod ui;      // Interface utilisateur
