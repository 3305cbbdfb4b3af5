// ============================================================================
// Structure : MarketSession
// ============================================================================
// Session de marché pour l'actif sélectionné
//
// MACHINE À ÉTATS :
//   Uninitialized ──select_asset──▶ Seeded ──start_streaming──▶ Streaming
//        Streaming ──select_asset──▶ Seeded (reset complet)
//
// La session possède :
// - l'état porté du générateur (prix, RSI, MACD)
// - le buffer de ticks (60 points)
// - le scheduler des ticks (1 par seconde)
// - un identifiant de session, incrémenté à chaque reset
//
// CONCEPT : Le générateur ne connaît pas le temps réel
// - TickScheduler décide QUAND générer
// - generator::next_tick décide QUOI générer
// ============================================================================

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::market::generator::{self, GeneratorState};
use crate::market::series::SeriesBuffer;
use crate::models::{Asset, MarketDataPoint};

/// Période par défaut entre deux ticks
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// États de la session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Aucun actif sélectionné
    Uninitialized,
    /// Historique synthétisé, pas encore de ticks en direct
    Seeded,
    /// Ticks périodiques en cours
    Streaming,
}

// ============================================================================
// TickScheduler
// ============================================================================

/// Scheduler à période fixe, possédé par la session
///
/// CONCEPT RUST : Instant injecté
/// - L'appelant fournit l'instant courant
/// - Les tests avancent le temps sans dormir
#[derive(Debug, Clone)]
pub struct TickScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Démarre (ou redémarre) le scheduler : premier tick dans une période
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Annule les ticks à venir
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Indique si un tick est dû, et planifie le suivant
    ///
    /// Un seul tick par appel : si la boucle a pris du retard, on repart
    /// de `now` au lieu d'enchaîner les ticks en rafale.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.period;
                if next <= now {
                    next = now + self.period;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// MarketSession
// ============================================================================

/// Session de marché (générateur + buffer + scheduler)
///
/// CONCEPT RUST : Paramètre générique avec valeur par défaut
/// - `MarketSession` utilise StdRng
/// - Les tests peuvent injecter n'importe quelle source `Rng`
pub struct MarketSession<R: Rng = StdRng> {
    asset: Option<Asset>,
    state: SessionState,
    carry: Option<GeneratorState>,
    series: SeriesBuffer,
    scheduler: TickScheduler,
    session_id: u64,
    rng: R,
}

impl MarketSession<StdRng> {
    /// Session avec une source aléatoire initialisée par l'OS
    pub fn new(tick_period: Duration) -> Self {
        Self::with_rng(tick_period, StdRng::from_entropy())
    }

    /// Session reproductible (même graine ⇒ même marche aléatoire)
    pub fn with_seed(tick_period: Duration, seed: u64) -> Self {
        Self::with_rng(tick_period, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MarketSession<R> {
    pub fn with_rng(tick_period: Duration, rng: R) -> Self {
        Self {
            asset: None,
            state: SessionState::Uninitialized,
            carry: None,
            series: SeriesBuffer::new(),
            scheduler: TickScheduler::new(tick_period),
            session_id: 0,
            rng,
        }
    }

    /// Sélectionne un actif : reset complet puis backfill
    ///
    /// Valable depuis n'importe quel état. Le scheduler est annulé,
    /// la série et l'état porté sont remplacés, la session passe à Seeded.
    ///
    /// # Retourne
    /// * Le nouvel identifiant de session
    pub fn select_asset(&mut self, asset: Asset, now: DateTime<Utc>) -> u64 {
        self.scheduler.cancel();

        let (carry, points) = generator::backfill(asset.category, now, &mut self.rng);
        self.series.clear();
        self.series.extend(points);

        self.carry = Some(carry);
        self.asset = Some(asset);
        self.state = SessionState::Seeded;
        self.session_id += 1;

        info!(
            asset = %asset.symbol,
            session_id = self.session_id,
            points = self.series.len(),
            "Session reset with synthetic backfill"
        );
        self.session_id
    }

    /// Démarre les ticks périodiques (Seeded → Streaming)
    ///
    /// Sans effet si aucun actif n'est sélectionné.
    pub fn start_streaming(&mut self, now: Instant) {
        if self.state == SessionState::Uninitialized {
            return;
        }
        self.scheduler.start(now);
        self.state = SessionState::Streaming;
        debug!(session_id = self.session_id, "Streaming started");
    }

    /// Change d'actif et reprend immédiatement le streaming
    pub fn switch_asset(&mut self, asset: Asset, wall: DateTime<Utc>, now: Instant) -> u64 {
        let id = self.select_asset(asset, wall);
        self.start_streaming(now);
        id
    }

    /// Appelé à chaque itération de la boucle : génère un tick s'il est dû
    pub fn poll(&mut self, now: Instant, wall: DateTime<Utc>) -> Option<MarketDataPoint> {
        if self.state != SessionState::Streaming {
            return None;
        }
        if !self.scheduler.poll(now) {
            return None;
        }
        self.tick(wall)
    }

    /// Génère un tick immédiatement, indépendamment du scheduler
    ///
    /// L'horodatage est forcé strictement croissant au sein de la série.
    pub fn tick(&mut self, wall: DateTime<Utc>) -> Option<MarketDataPoint> {
        let asset = self.asset?;
        let carry = self.carry?;

        let timestamp = match self.series.latest() {
            Some(last) if wall <= last.timestamp => last.timestamp + chrono::Duration::milliseconds(1),
            _ => wall,
        };

        let (next, point) = generator::next_tick(&carry, asset.category, timestamp, &mut self.rng);
        self.carry = Some(next);
        self.series.push(point);
        Some(point)
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn series(&self) -> &SeriesBuffer {
        &self.series
    }

    /// État porté du générateur (None avant la première sélection)
    pub fn carry(&self) -> Option<&GeneratorState> {
        self.carry.as_ref()
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Prix actuel (dernier point de la série)
    pub fn current_price(&self) -> Option<f64> {
        self.series.latest().map(|p| p.price)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
