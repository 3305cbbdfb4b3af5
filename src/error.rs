// ============================================================================
// Erreurs du service d'analyse
// ============================================================================
// Seule la précondition (clé API absente) remonte à l'appelant.
// Les échecs du service distant sont convertis en fallback (voir api::analysis).
// ============================================================================

use thiserror::Error;

/// Erreur signalée avant toute tentative réseau
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// La variable d'environnement portant la clé API est absente ou vide
    #[error("Clé API manquante : la variable d'environnement {var} n'est pas définie")]
    MissingCredential { var: String },
}
