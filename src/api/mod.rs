// ============================================================================
// Module : api
// ============================================================================
// Communication avec le service d'analyse externe :
// - gemini   : client HTTP du modèle génératif (trait GenerativeModel)
// - analysis : construction des requêtes, interprétation, fallback local
// ============================================================================

pub mod analysis;  // Analyse de marché et prévision
pub mod gemini;    // Client HTTP generateContent

// Re-export des types principaux
pub use analysis::{AnalysisRequest, AnalysisService, Credential, PredictionRequest};
pub use gemini::{ContentRequest, GeminiClient, GenerativeModel};
