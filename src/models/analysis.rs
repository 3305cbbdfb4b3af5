// ============================================================================
// Structures : Signal, AnalysisResult, AnalysisOutcome
// ============================================================================
// Résultats renvoyés par le service d'analyse
//
// CONCEPTS RUST :
// 1. #[serde(rename = "...")] : le service parle français (ACHAT/VENTE/NEUTRE)
// 2. Enum à deux variantes pour distinguer réponse réelle et fallback
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Timeframe;

/// Signal de trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Achat (call / hausse)
    #[serde(rename = "ACHAT")]
    Buy,
    /// Vente (put / baisse)
    #[serde(rename = "VENTE")]
    Sell,
    /// Neutre
    #[serde(rename = "NEUTRE")]
    Neutral,
}

impl Signal {
    /// Label tel qu'échangé avec le service et affiché
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Buy => "ACHAT",
            Signal::Sell => "VENTE",
            Signal::Neutral => "NEUTRE",
        }
    }
}

/// Résultat d'une analyse
///
/// Immuable, remplacé (pas fusionné) par l'analyse suivante.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub signal: Signal,

    /// Force de la tendance, entre 0 et 100
    pub trend_strength: u8,

    /// Brève justification textuelle
    pub reasoning: String,

    pub timestamp: DateTime<Utc>,

    /// Symbole de l'actif analysé
    pub asset: String,

    pub timeframe: Timeframe,
}

/// Issue d'une analyse : réponse du service ou fallback local
///
/// CONCEPT RUST : Enum avec données
/// - Les deux variantes portent un AnalysisResult valide
/// - L'appelant sait s'il s'agit d'un fallback sans comparer de chaînes
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Réponse structurée reçue du service
    Live(AnalysisResult),
    /// Résultat calculé localement après un échec du service
    Fallback(AnalysisResult),
}

impl AnalysisOutcome {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            AnalysisOutcome::Live(result) | AnalysisOutcome::Fallback(result) => result,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            AnalysisOutcome::Live(result) | AnalysisOutcome::Fallback(result) => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisOutcome::Fallback(_))
    }
}

/// Issue d'une prévision : texte libre du service ou texte de repli fixe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionOutcome {
    Live(String),
    Fallback(String),
}

impl PredictionOutcome {
    pub fn text(&self) -> &str {
        match self {
            PredictionOutcome::Live(text) | PredictionOutcome::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PredictionOutcome::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_uses_french_wire_names() {
        let signal: Signal = serde_json::from_str("\"VENTE\"").unwrap();
        assert_eq!(signal, Signal::Sell);
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"ACHAT\"");
        assert!(serde_json::from_str::<Signal>("\"BUY\"").is_err());
    }

    #[test]
    fn test_outcome_accessors() {
        let result = AnalysisResult {
            signal: Signal::Neutral,
            trend_strength: 42,
            reasoning: "Range étroit".to_string(),
            timestamp: Utc::now(),
            asset: "EUR/USD".to_string(),
            timeframe: Timeframe::M5,
        };

        let outcome = AnalysisOutcome::Fallback(result.clone());
        assert!(outcome.is_fallback());
        assert_eq!(outcome.result(), &result);
        assert!(!AnalysisOutcome::Live(result.clone()).is_fallback());
        assert_eq!(outcome.into_result(), result);
    }
}
