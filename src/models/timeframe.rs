// ============================================================================
// Enum : Timeframe
// ============================================================================
// Horizon d'analyse transmis au service d'analyse
//
// CONCEPT : Le timeframe est un label
// - Il ne change pas la période des ticks (toujours 1 par seconde)
// - Il est envoyé tel quel dans la requête d'analyse
// ============================================================================

use serde::Serialize;

/// Horizon d'analyse sélectionnable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Timeframe {
    /// 3 secondes
    S3,
    /// 15 secondes
    S15,
    /// 30 secondes
    S30,
    /// 1 minute
    M1,
    /// 3 minutes
    M3,
    /// 5 minutes
    M5,
    /// 30 minutes
    M30,
    /// 1 heure
    H1,
    /// 2 heures
    H2,
}

impl Timeframe {
    /// Tous les timeframes, dans l'ordre de la barre de sélection
    pub const ALL: [Timeframe; 9] = [
        Timeframe::S3,
        Timeframe::S15,
        Timeframe::S30,
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::M5,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
    ];

    /// Label envoyé au service et affiché dans l'en-tête
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::S3 => "3s",
            Timeframe::S15 => "15s",
            Timeframe::S30 => "30s",
            Timeframe::M1 => "1M",
            Timeframe::M3 => "3M",
            Timeframe::M5 => "5M",
            Timeframe::M30 => "30M",
            Timeframe::H1 => "1H",
            Timeframe::H2 => "2H",
        }
    }

    /// Parse un label ("1M", "30s", ...)
    pub fn from_label(label: &str) -> Option<Timeframe> {
        Self::ALL.into_iter().find(|tf| tf.label() == label)
    }

    /// Timeframe suivant (cycle)
    pub fn next(&self) -> Timeframe {
        let index = self.position();
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Timeframe précédent (cycle)
    pub fn previous(&self) -> Timeframe {
        let index = self.position();
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn position(&self) -> usize {
        Self::ALL
            .iter()
            .position(|tf| tf == self)
            .unwrap_or_default()
    }
}

impl Default for Timeframe {
    /// Timeframe par défaut : 1 minute
    fn default() -> Self {
        Timeframe::M1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_label(tf.label()), Some(tf));
        }
        assert_eq!(Timeframe::from_label("4h"), None);
    }

    #[test]
    fn test_cycle() {
        assert_eq!(Timeframe::S3.previous(), Timeframe::H2);
        assert_eq!(Timeframe::H2.next(), Timeframe::S3); // Boucle
        assert_eq!(Timeframe::M1.next(), Timeframe::M3);
    }

    #[test]
    fn test_default_is_one_minute() {
        assert_eq!(Timeframe::default().label(), "1M");
    }
}
