// ============================================================================
// Module : models
// ============================================================================
// Structures de données partagées par le générateur, le service d'analyse
// et l'interface
// ============================================================================

pub mod analysis;  // Signal, AnalysisResult, issues live/fallback
pub mod asset;     // Catalogue des actifs
pub mod market;    // MarketDataPoint, Macd
pub mod timeframe; // Horizons d'analyse

// Re-export des structures principales pour simplifier les imports
pub use analysis::{AnalysisOutcome, AnalysisResult, PredictionOutcome, Signal};
pub use asset::{assets_in, find_asset, Asset, AssetCategory, ASSETS};
pub use market::{Macd, MarketDataPoint};
pub use timeframe::Timeframe;
