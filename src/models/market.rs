// ============================================================================
// Structure : MarketDataPoint
// ============================================================================
// Un tick synthétique : prix + indicateurs dérivés (RSI, MACD)
//
// CONCEPTS RUST :
// 1. Copy : un point est une petite valeur, copiée sans coût
// 2. Option<T> : les indicateurs sont optionnels dans le modèle
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Triple MACD : ligne MACD, ligne de signal, histogramme
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    /// Toujours égal à `macd - signal`
    pub histogram: f64,
}

impl Macd {
    /// Construit le triple, l'histogramme est dérivé des deux lignes
    pub fn new(macd: f64, signal: f64) -> Self {
        Self {
            macd,
            signal,
            histogram: macd - signal,
        }
    }
}

/// Un point de marché généré
///
/// Créé par le générateur, immuable ensuite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketDataPoint {
    /// Horodatage du tick
    pub timestamp: DateTime<Utc>,

    /// Prix (toujours positif)
    pub price: f64,

    /// RSI approximé, borné à [10, 90] par construction
    pub rsi: Option<f64>,

    /// MACD approximé
    pub macd: Option<Macd>,
}

impl MarketDataPoint {
    /// Prix formaté avec 5 décimales (format des requêtes et de l'affichage)
    pub fn price_label(&self) -> String {
        format!("{:.5}", self.price)
    }

    /// Heure du tick au format HH:MM:SS
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_histogram() {
        let macd = Macd::new(0.5, 0.2);
        assert!((macd.histogram - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_price_label_has_five_decimals() {
        let point = MarketDataPoint {
            timestamp: Utc::now(),
            price: 1.085,
            rsi: None,
            macd: None,
        };
        assert_eq!(point.price_label(), "1.08500");
    }
}
