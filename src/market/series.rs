// ============================================================================
// Structure : SeriesBuffer
// ============================================================================
// Fenêtre glissante des derniers ticks (historique borné pour les graphiques)
//
// CONCEPTS RUST :
// 1. VecDeque : file à double extrémité, push_back / pop_front en O(1)
// 2. Éviction FIFO stricte : un seul point retiré par point ajouté
// ============================================================================

use std::collections::VecDeque;

use crate::models::MarketDataPoint;

/// Capacité de la fenêtre
pub const SERIES_CAPACITY: usize = 60;

/// Historique borné, trié du plus ancien au plus récent
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBuffer {
    points: VecDeque<MarketDataPoint>,
    capacity: usize,
}

impl SeriesBuffer {
    /// Crée un buffer vide de capacité SERIES_CAPACITY
    pub fn new() -> Self {
        Self::with_capacity(SERIES_CAPACITY)
    }

    /// Crée un buffer vide avec une capacité donnée (au moins 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Ajoute un point, évince le plus ancien si la capacité est dépassée
    ///
    /// # Retourne
    /// * Le point évincé, s'il y en a un
    pub fn push(&mut self, point: MarketDataPoint) -> Option<MarketDataPoint> {
        self.points.push_back(point);
        if self.points.len() > self.capacity {
            self.points.pop_front()
        } else {
            None
        }
    }

    /// Ajoute plusieurs points dans l'ordre
    pub fn extend<I: IntoIterator<Item = MarketDataPoint>>(&mut self, points: I) {
        for point in points {
            self.push(point);
        }
    }

    /// Vide le buffer
    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Itère sur la séquence complète, du plus ancien au plus récent
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MarketDataPoint> + ExactSizeIterator {
        self.points.iter()
    }

    /// Point le plus récent (affichage du prix actuel)
    pub fn latest(&self) -> Option<&MarketDataPoint> {
        self.points.back()
    }

    /// Les `n` derniers prix, du plus ancien au plus récent
    pub fn recent_prices(&self, n: usize) -> Vec<f64> {
        let skip = self.points.len().saturating_sub(n);
        self.points.iter().skip(skip).map(|p| p.price).collect()
    }

    /// Prix minimum et maximum de la fenêtre (bornes des graphiques)
    ///
    /// CONCEPT RUST : fold
    /// - Calcule min et max en un seul passage
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().fold((f64::MAX, f64::MIN), |(min, max), p| {
            (min.min(p.price), max.max(p.price))
        }))
    }
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn point(i: i64) -> MarketDataPoint {
        MarketDataPoint {
            timestamp: Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
            price: 1.0 + i as f64,
            rsi: None,
            macd: None,
        }
    }

    #[test]
    fn test_bounded_buffer_keeps_most_recent() {
        let mut buffer = SeriesBuffer::new();
        for i in 0..150 {
            buffer.push(point(i));
        }

        assert_eq!(buffer.len(), SERIES_CAPACITY);
        let prices: Vec<f64> = buffer.iter().map(|p| p.price).collect();
        let expected: Vec<f64> = (90..150).map(|i| 1.0 + i as f64).collect();
        assert_eq!(prices, expected);
    }

    #[test]
    fn test_push_evicts_exactly_one() {
        let mut buffer = SeriesBuffer::with_capacity(3);
        assert_eq!(buffer.push(point(0)), None);
        buffer.push(point(1));
        buffer.push(point(2));

        let evicted = buffer.push(point(3));
        assert_eq!(evicted, Some(point(0)));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.iter().next(), Some(&point(1)));
    }

    #[test]
    fn test_latest_and_order() {
        let mut buffer = SeriesBuffer::new();
        assert!(buffer.latest().is_none());

        buffer.extend((0..5).map(point));
        assert_eq!(buffer.latest(), Some(&point(4)));
        assert!(buffer
            .iter()
            .zip(buffer.iter().skip(1))
            .all(|(a, b)| b.timestamp - a.timestamp == Duration::seconds(1)));
    }

    #[test]
    fn test_recent_prices() {
        let mut buffer = SeriesBuffer::new();
        buffer.extend((0..30).map(point));

        let recent = buffer.recent_prices(20);
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0], 11.0);
        assert_eq!(recent[19], 30.0);

        // Moins de points que demandé : tout le buffer
        let mut short = SeriesBuffer::new();
        short.extend((0..5).map(point));
        assert_eq!(short.recent_prices(20).len(), 5);
    }

    #[test]
    fn test_price_bounds() {
        let mut buffer = SeriesBuffer::new();
        assert_eq!(buffer.price_bounds(), None);

        buffer.extend([point(3), point(0), point(7)]);
        assert_eq!(buffer.price_bounds(), Some((1.0, 8.0)));
    }

    #[test]
    fn test_clear() {
        let mut buffer = SeriesBuffer::new();
        buffer.extend((0..10).map(point));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), SERIES_CAPACITY);
    }
}
