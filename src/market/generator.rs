// ============================================================================
// Générateur de ticks synthétiques
// ============================================================================
// Produit un MarketDataPoint par appel à partir de l'état précédent
//
// ALGORITHME (par tick) :
// - Prix : marche aléatoire à bruit multiplicatif
//     p' = p + p * volatilité * (U - 0.5)
// - RSI : marche aléatoire bornée, rappel de ±1 au-delà de 70 / en deçà de 30,
//   bornée à [10, 90]
// - MACD : incrément aléatoire sur la ligne MACD, signal en retard
//   exponentiel (poids 0.15), histogramme = macd - signal
//
// Ce ne sont PAS les formules classiques du RSI (moyennes gains/pertes) ni du
// MACD 12/26/9 : les graphiques attendent ce comportement-là.
//
// CONCEPT RUST : Fonction pure
// - next_tick ne modifie rien : elle prend l'état et rend le nouvel état
// - La source aléatoire est injectée (StdRng seedé dans les tests)
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::{AssetCategory, Macd, MarketDataPoint};

/// Nombre de points synthétisés à la sélection d'un actif
pub const BACKFILL_LEN: usize = 60;

/// RSI neutre au démarrage
pub const RSI_NEUTRAL: f64 = 50.0;

/// Bornes du RSI approximé
pub const RSI_MIN: f64 = 10.0;
pub const RSI_MAX: f64 = 90.0;

/// Seuils de surachat / survente déclenchant le rappel vers le centre
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Amplitude du pas RSI : (U - 0.5) * 8 ∈ [-4, +4)
const RSI_STEP: f64 = 8.0;

/// Poids du retard exponentiel de la ligne de signal
const MACD_SIGNAL_SMOOTHING: f64 = 0.15;

/// Espacement des points du backfill
const BACKFILL_SPACING_SECS: i64 = 1;

/// Volatilité du prix selon la catégorie
pub fn volatility(category: AssetCategory) -> f64 {
    match category {
        AssetCategory::Crypto => 0.002,
        _ => 0.0001,
    }
}

/// Amplitude de l'incrément MACD selon la catégorie
pub fn macd_scale(category: AssetCategory) -> f64 {
    match category {
        AssetCategory::Crypto => 0.5,
        _ => 0.0002,
    }
}

/// Prix de départ selon la catégorie
pub fn seed_price(category: AssetCategory) -> f64 {
    match category {
        AssetCategory::Crypto => 45_000.0,
        AssetCategory::Commodities => 2_000.0,
        AssetCategory::ForexOtc | AssetCategory::ForexClassic => 1.0850,
    }
}

/// État porté d'un tick à l'autre
///
/// CONCEPT RUST : Copy + immutabilité
/// - Chaque tick produit un nouvel état au lieu de muter l'ancien
/// - L'état est toujours cohérent avec le dernier point émis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorState {
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal: f64,
}

impl GeneratorState {
    /// État initial pour une catégorie : prix de référence, RSI 50, MACD 0/0
    pub fn seed(category: AssetCategory) -> Self {
        Self {
            price: seed_price(category),
            rsi: RSI_NEUTRAL,
            macd: 0.0,
            signal: 0.0,
        }
    }
}

/// Calcule le tick suivant
///
/// # Arguments
/// * `state` - État après le tick précédent
/// * `category` - Catégorie de l'actif (volatilité, échelle MACD)
/// * `timestamp` - Horodatage du nouveau point
/// * `rng` - Source aléatoire uniforme
///
/// # Retourne
/// * `(GeneratorState, MarketDataPoint)` - Nouvel état et point émis
pub fn next_tick<R: Rng + ?Sized>(
    state: &GeneratorState,
    category: AssetCategory,
    timestamp: DateTime<Utc>,
    rng: &mut R,
) -> (GeneratorState, MarketDataPoint) {
    // Prix
    let change = state.price * volatility(category) * (rng.gen::<f64>() - 0.5);
    let price = state.price + change;

    // RSI : pas aléatoire + rappel vers le centre
    let mut rsi_change = (rng.gen::<f64>() - 0.5) * RSI_STEP;
    if state.rsi > RSI_OVERBOUGHT {
        rsi_change -= 1.0;
    }
    if state.rsi < RSI_OVERSOLD {
        rsi_change += 1.0;
    }
    let rsi = (state.rsi + rsi_change).clamp(RSI_MIN, RSI_MAX);

    // MACD : incrément aléatoire, signal en retard exponentiel
    let macd_move = (rng.gen::<f64>() - 0.5) * macd_scale(category);
    let macd = state.macd + macd_move;
    let signal = state.signal + (macd - state.signal) * MACD_SIGNAL_SMOOTHING;

    let next = GeneratorState {
        price,
        rsi,
        macd,
        signal,
    };

    let point = MarketDataPoint {
        timestamp,
        price,
        rsi: Some(rsi),
        macd: Some(Macd::new(macd, signal)),
    };

    (next, point)
}

/// Synthétise l'historique initial d'un actif
///
/// Part de l'état seedé de la catégorie et génère BACKFILL_LEN points
/// horodatés de `now - 60s` à `now - 1s`.
///
/// # Retourne
/// * L'état après le dernier point et les points, du plus ancien au plus récent
pub fn backfill<R: Rng + ?Sized>(
    category: AssetCategory,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (GeneratorState, Vec<MarketDataPoint>) {
    let mut state = GeneratorState::seed(category);
    let mut points = Vec::with_capacity(BACKFILL_LEN);

    // CONCEPT RUST : Range inversé avec .rev()
    // - 60, 59, ..., 1 : on remonte le temps du plus ancien au plus récent
    for i in (1..=BACKFILL_LEN as i64).rev() {
        let timestamp = now - Duration::seconds(i * BACKFILL_SPACING_SECS);
        let (next, point) = next_tick(&state, category, timestamp, rng);
        state = next;
        points.push(point);
    }

    (state, points)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_per_category() {
        let forex = GeneratorState::seed(AssetCategory::ForexOtc);
        assert_eq!(forex.price, 1.0850);
        assert_eq!(forex.rsi, 50.0);
        assert_eq!((forex.macd, forex.signal), (0.0, 0.0));

        assert_eq!(GeneratorState::seed(AssetCategory::ForexClassic).price, 1.0850);
        assert_eq!(GeneratorState::seed(AssetCategory::Crypto).price, 45_000.0);
        assert_eq!(GeneratorState::seed(AssetCategory::Commodities).price, 2_000.0);
    }

    #[test]
    fn test_crypto_is_more_volatile() {
        assert!(volatility(AssetCategory::Crypto) > volatility(AssetCategory::ForexOtc));
        assert!(macd_scale(AssetCategory::Crypto) > macd_scale(AssetCategory::Commodities));
    }

    #[test]
    fn test_rsi_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();

        // Part des deux extrêmes pour exercer le rappel et le clamp
        for start in [RSI_MIN, RSI_MAX, RSI_NEUTRAL] {
            let mut state = GeneratorState {
                rsi: start,
                ..GeneratorState::seed(AssetCategory::Crypto)
            };
            for _ in 0..5_000 {
                let (next, point) = next_tick(&state, AssetCategory::Crypto, now, &mut rng);
                let rsi = point.rsi.unwrap();
                assert!((RSI_MIN..=RSI_MAX).contains(&rsi), "rsi hors bornes: {}", rsi);
                state = next;
            }
        }
    }

    #[test]
    fn test_rsi_pulls_back_above_seventy() {
        // Au-dessus de 70 le pas maximal est +4 - 1 = +3
        let mut rng = StdRng::seed_from_u64(11);
        let state = GeneratorState {
            rsi: 80.0,
            ..GeneratorState::seed(AssetCategory::ForexOtc)
        };
        for _ in 0..1_000 {
            let (next, _) = next_tick(&state, AssetCategory::ForexOtc, Utc::now(), &mut rng);
            assert!(next.rsi <= 83.0);
            assert!(next.rsi >= 75.0);
        }
    }

    #[test]
    fn test_macd_histogram_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        let (_, points) = backfill(AssetCategory::Crypto, Utc::now(), &mut rng);

        for point in &points {
            let macd = point.macd.unwrap();
            assert!((macd.histogram - (macd.macd - macd.signal)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_signal_lags_toward_macd() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = GeneratorState {
            macd: 1.0,
            signal: 0.0,
            ..GeneratorState::seed(AssetCategory::ForexOtc)
        };
        let (next, _) = next_tick(&state, AssetCategory::ForexOtc, Utc::now(), &mut rng);

        // Échelle forex minuscule : signal ≈ 0.15 * macd
        assert!((next.signal - 0.15 * next.macd).abs() < 1e-9);
    }

    #[test]
    fn test_price_step_is_bounded_by_volatility() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = GeneratorState::seed(AssetCategory::Crypto);
        for _ in 0..1_000 {
            let (next, point) = next_tick(&state, AssetCategory::Crypto, Utc::now(), &mut rng);
            let max_step = state.price * volatility(AssetCategory::Crypto) / 2.0;
            assert!((point.price - state.price).abs() <= max_step + 1e-9);
            assert!(point.price > 0.0);
            state = next;
        }
    }

    #[test]
    fn test_carry_state_matches_point() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = GeneratorState::seed(AssetCategory::Commodities);
        let (next, point) = next_tick(&state, AssetCategory::Commodities, Utc::now(), &mut rng);

        assert_eq!(next.price, point.price);
        assert_eq!(Some(next.rsi), point.rsi);
        assert_eq!(point.macd, Some(Macd::new(next.macd, next.signal)));
    }

    #[test]
    fn test_backfill_is_time_ordered() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = Utc::now();
        let (state, points) = backfill(AssetCategory::ForexOtc, now, &mut rng);

        assert_eq!(points.len(), BACKFILL_LEN);
        assert_eq!(points[0].timestamp, now - Duration::seconds(60));
        assert_eq!(points[BACKFILL_LEN - 1].timestamp, now - Duration::seconds(1));
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(state.price, points[BACKFILL_LEN - 1].price);
    }

    #[test]
    fn test_same_seed_same_series() {
        let now = Utc::now();
        let (_, a) = backfill(AssetCategory::Crypto, now, &mut StdRng::seed_from_u64(99));
        let (_, b) = backfill(AssetCategory::Crypto, now, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
