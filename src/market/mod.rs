// ============================================================================
// Module : market
// ============================================================================
// Génération synthétique des ticks de marché :
// - generator : marche aléatoire du prix et des proxies RSI / MACD
// - series    : fenêtre glissante des 60 derniers points
// - session   : cycle de vie du flux (sélection d'actif, ticks périodiques)
// ============================================================================

pub mod generator;
pub mod series;
pub mod session;

pub use generator::{backfill, next_tick, GeneratorState};
pub use series::{SeriesBuffer, SERIES_CAPACITY};
pub use session::{MarketSession, SessionState, TickScheduler, DEFAULT_TICK_PERIOD};
