// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global du tableau de bord
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Identifiant de session : les résultats asynchrones périmés sont ignorés
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Le worker thread ne touche jamais la session de marché
// ============================================================================

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{AnalysisRequest, PredictionRequest};
use crate::market::generator::seed_price;
use crate::market::MarketSession;
use crate::models::{
    assets_in, Asset, AssetCategory, AnalysisOutcome, MarketDataPoint, PredictionOutcome, Signal,
    Timeframe,
};

/// Longueur maximale de la saisie HH:MM:SS
const TIME_INPUT_LEN: usize = 8;

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : graphiques, indicateurs, analyse
    Dashboard,

    /// Saisie de l'heure cible d'une prévision
    /// CONCEPT : Modal input mode (Vim-like)
    /// - Enter valide, ESC annule
    PredictionInput,
}

// ============================================================================
// Jobs envoyés au worker
// ============================================================================

/// Analyse à exécuter, rattachée à la session qui l'a construite
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisJob {
    pub session_id: u64,
    pub request: AnalysisRequest,
}

/// Prévision à exécuter
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionJob {
    pub session_id: u64,
    pub request: PredictionRequest,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Session de marché (actif sélectionné, série, scheduler)
    pub session: MarketSession,

    /// Catégorie affichée dans la sidebar
    pub category: AssetCategory,

    /// Index de l'actif surligné dans la liste de la catégorie
    pub selected_index: usize,

    /// Timeframe transmis au service d'analyse
    /// Peut être modifié avec les touches h et l
    pub timeframe: Timeframe,

    pub current_screen: Screen,

    /// Two-step quit : première pression de 'q' arme, seconde quitte
    pub confirm_quit: bool,

    /// Dernière analyse reçue (remplacée, jamais fusionnée)
    pub analysis: Option<AnalysisOutcome>,

    /// Une analyse est en cours dans le worker
    pub is_analyzing: bool,

    /// Dernière prévision reçue
    pub prediction: Option<PredictionOutcome>,

    pub is_predicting: bool,

    /// Buffer de saisie de l'heure cible
    pub input_buffer: String,

    /// Message d'état affiché en bas de l'écran (erreurs, confirmations)
    pub status_message: Option<String>,
}

impl App {
    /// Crée l'application avec une session dont les ticks ont la période donnée
    pub fn new(tick_period: Duration) -> Self {
        Self::with_session(MarketSession::new(tick_period))
    }

    /// Crée l'application autour d'une session existante (graine fixe en test)
    pub fn with_session(session: MarketSession) -> Self {
        Self {
            running: true,
            session,
            category: AssetCategory::ForexOtc,
            selected_index: 0,
            timeframe: Timeframe::default(),
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            analysis: None,
            is_analyzing: false,
            prediction: None,
            is_predicting: false,
            input_buffer: String::new(),
            status_message: None,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Sidebar : catégories et actifs
    // ========================================================================

    /// Actifs de la catégorie affichée, dans l'ordre du catalogue
    pub fn visible_assets(&self) -> Vec<&'static Asset> {
        assets_in(self.category).collect()
    }

    /// Passe à la catégorie suivante (touche Tab)
    pub fn next_category(&mut self) {
        self.category = self.category.next();
        self.selected_index = 0;
    }

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// CONCEPT RUST : min() pour éviter le dépassement
    pub fn navigate_down(&mut self) {
        let max_index = self.visible_assets().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Actif surligné dans la sidebar
    pub fn highlighted_asset(&self) -> Option<&'static Asset> {
        assets_in(self.category).nth(self.selected_index)
    }

    /// Actif dont le flux est affiché
    pub fn selected_asset(&self) -> Option<&Asset> {
        self.session.asset()
    }

    /// Sélectionne un actif : reset de la session puis reprise du streaming
    ///
    /// L'analyse et la prévision de l'actif précédent sont effacées ;
    /// un résultat encore en vol sera ignoré (identifiant de session changé).
    pub fn select_asset(&mut self, asset: Asset, now: Instant, wall: DateTime<Utc>) -> u64 {
        let session_id = self.session.switch_asset(asset, wall, now);

        self.analysis = None;
        self.is_analyzing = false;
        self.prediction = None;
        self.is_predicting = false;
        self.status_message = None;

        info!(asset = %asset.symbol, session_id, "Asset selected");
        session_id
    }

    /// Sélectionne l'actif surligné (touche Enter)
    pub fn select_highlighted(&mut self, now: Instant, wall: DateTime<Utc>) -> Option<u64> {
        let asset = *self.highlighted_asset()?;
        Some(self.select_asset(asset, now, wall))
    }

    // ========================================================================
    // Timeframe
    // ========================================================================

    pub fn next_timeframe(&mut self) {
        self.timeframe = self.timeframe.next();
    }

    pub fn previous_timeframe(&mut self) {
        self.timeframe = self.timeframe.previous();
    }

    // ========================================================================
    // Boucle
    // ========================================================================

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Génère un point si le scheduler de la session est dû.
    pub fn tick(&mut self, now: Instant, wall: DateTime<Utc>) -> Option<MarketDataPoint> {
        self.session.poll(now, wall)
    }

    // ========================================================================
    // Analyse
    // ========================================================================

    /// Prépare une analyse de l'actif sélectionné
    ///
    /// # Retourne
    /// * `None` sans changer l'état si aucun actif n'est sélectionné, si une
    ///   analyse est déjà en cours ou si la série est trop courte
    pub fn begin_analysis(&mut self) -> Option<AnalysisJob> {
        if self.is_analyzing {
            debug!("Analysis already in flight");
            return None;
        }

        let asset = self.session.asset()?;
        let request = AnalysisRequest::build(asset, self.timeframe, self.session.series())?;

        self.is_analyzing = true;
        self.status_message = None;

        Some(AnalysisJob {
            session_id: self.session.session_id(),
            request,
        })
    }

    /// Applique le résultat d'une analyse
    ///
    /// # Retourne
    /// * `false` si le résultat appartient à une session remplacée (ignoré)
    pub fn apply_analysis(&mut self, session_id: u64, outcome: AnalysisOutcome) -> bool {
        if session_id != self.session.session_id() {
            debug!(
                stale = session_id,
                current = self.session.session_id(),
                "Discarding stale analysis result"
            );
            return false;
        }

        if outcome.is_fallback() {
            warn!(asset = %outcome.result().asset, "Displaying fallback analysis");
        }

        self.analysis = Some(outcome);
        self.is_analyzing = false;
        true
    }

    /// L'analyse n'a pas pu être lancée (clé absente)
    pub fn analysis_failed(&mut self, session_id: u64, message: String) {
        if session_id == self.session.session_id() {
            self.is_analyzing = false;
        }
        self.status_message = Some(message);
    }

    /// Signal de la dernière analyse (colore le graphique des prix)
    pub fn last_signal(&self) -> Option<Signal> {
        self.analysis.as_ref().map(|outcome| outcome.result().signal)
    }

    // ========================================================================
    // Prévision
    // ========================================================================

    /// Prix de référence d'une prévision : prix actuel, sinon prix initial de la catégorie
    pub fn reference_price(&self) -> Option<f64> {
        let asset = self.session.asset()?;
        Some(
            self.session
                .current_price()
                .unwrap_or_else(|| seed_price(asset.category)),
        )
    }

    /// Prépare une prévision pour l'heure cible saisie
    pub fn begin_prediction(&mut self, target_time: &str) -> Result<PredictionJob> {
        let asset = *self
            .session
            .asset()
            .context("Aucun actif sélectionné")?;
        let reference_price = self
            .session
            .current_price()
            .unwrap_or_else(|| seed_price(asset.category));

        let request = PredictionRequest::new(&asset, target_time, reference_price)?;

        self.is_predicting = true;
        self.prediction = None;

        Ok(PredictionJob {
            session_id: self.session.session_id(),
            request,
        })
    }

    /// Applique le résultat d'une prévision (ignoré si la session a changé)
    pub fn apply_prediction(&mut self, session_id: u64, outcome: PredictionOutcome) -> bool {
        if session_id != self.session.session_id() {
            debug!(stale = session_id, "Discarding stale prediction result");
            return false;
        }
        self.prediction = Some(outcome);
        self.is_predicting = false;
        true
    }

    pub fn prediction_failed(&mut self, session_id: u64, message: String) {
        if session_id == self.session.session_id() {
            self.is_predicting = false;
        }
        self.status_message = Some(message);
    }

    // ========================================================================
    // Confirmation de sortie
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Ouvre la saisie de l'heure cible (nécessite un actif sélectionné)
    pub fn start_prediction_input(&mut self) {
        if self.session.asset().is_none() {
            return;
        }
        self.current_screen = Screen::PredictionInput;
        self.input_buffer.clear();
    }

    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
    }

    /// Récupère la valeur saisie et retourne au dashboard
    pub fn submit_input(&mut self) -> String {
        self.current_screen = Screen::Dashboard;
        std::mem::take(&mut self.input_buffer)
    }

    /// Ajoute un caractère (chiffres et ':' uniquement, 8 au plus)
    pub fn append_char(&mut self, c: char) {
        if (c.is_ascii_digit() || c == ':') && self.input_buffer.len() < TIME_INPUT_LEN {
            self.input_buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::PredictionInput
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(crate::market::DEFAULT_TICK_PERIOD)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::SERIES_CAPACITY;
    use crate::models::{find_asset, AnalysisResult};

    fn app() -> App {
        App::with_session(MarketSession::with_seed(Duration::from_secs(1), 42))
    }

    fn outcome(signal: Signal, asset: &str) -> AnalysisOutcome {
        AnalysisOutcome::Live(AnalysisResult {
            signal,
            trend_strength: 80,
            reasoning: "Momentum".to_string(),
            timestamp: Utc::now(),
            asset: asset.to_string(),
            timeframe: Timeframe::M1,
        })
    }

    #[test]
    fn test_app_creation() {
        let app = app();
        assert!(app.is_running());
        assert!(app.selected_asset().is_none());
        assert_eq!(app.category, AssetCategory::ForexOtc);
        assert_eq!(app.timeframe, Timeframe::M1);
    }

    #[test]
    fn test_navigation_within_category() {
        let mut app = app();
        let count = app.visible_assets().len();

        app.navigate_up();
        assert_eq!(app.selected_index, 0);

        for _ in 0..count + 3 {
            app.navigate_down();
        }
        assert_eq!(app.selected_index, count - 1);

        app.next_category();
        assert_eq!(app.category, AssetCategory::ForexClassic);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.highlighted_asset().unwrap().symbol, "EUR/USD");
    }

    #[test]
    fn test_select_highlighted_resets_panels() {
        let mut app = app();
        let now = Instant::now();
        let wall = Utc::now();

        let first = app.select_highlighted(now, wall).unwrap();
        app.analysis = Some(outcome(Signal::Buy, "EUR/USD OTC"));
        app.prediction = Some(PredictionOutcome::Live("texte".into()));

        app.navigate_down();
        let second = app.select_highlighted(now, wall).unwrap();

        assert!(second > first);
        assert!(app.analysis.is_none());
        assert!(app.prediction.is_none());
        assert_eq!(app.session.series().len(), SERIES_CAPACITY);
    }

    #[test]
    fn test_begin_analysis_guard() {
        let mut app = app();
        // Aucun actif : pas de job, pas de changement d'état
        assert!(app.begin_analysis().is_none());
        assert!(!app.is_analyzing);

        app.select_highlighted(Instant::now(), Utc::now());
        let job = app.begin_analysis().unwrap();
        assert!(app.is_analyzing);
        assert_eq!(job.session_id, app.session.session_id());
        assert_eq!(job.request.prices.len(), 20);

        // Déjà en cours
        assert!(app.begin_analysis().is_none());
    }

    #[test]
    fn test_stale_analysis_is_discarded() {
        let mut app = app();
        let now = Instant::now();
        app.select_highlighted(now, Utc::now());
        let job = app.begin_analysis().unwrap();

        // L'utilisateur change d'actif pendant l'appel
        let bitcoin = *find_asset("BITCOIN OTC").unwrap();
        app.select_asset(bitcoin, now, Utc::now());

        assert!(!app.apply_analysis(job.session_id, outcome(Signal::Sell, "EUR/USD OTC")));
        assert!(app.analysis.is_none());

        let fresh = app.begin_analysis().unwrap();
        assert!(app.apply_analysis(fresh.session_id, outcome(Signal::Sell, "BITCOIN OTC")));
        assert_eq!(app.last_signal(), Some(Signal::Sell));
        assert!(!app.is_analyzing);
    }

    #[test]
    fn test_analysis_failed_sets_status() {
        let mut app = app();
        app.select_highlighted(Instant::now(), Utc::now());
        let job = app.begin_analysis().unwrap();

        app.analysis_failed(job.session_id, "Clé API manquante".to_string());
        assert!(!app.is_analyzing);
        assert_eq!(app.status_message.as_deref(), Some("Clé API manquante"));
    }

    #[test]
    fn test_tick_only_when_streaming() {
        let mut app = app();
        let start = Instant::now();
        assert!(app.tick(start, Utc::now()).is_none());

        app.select_highlighted(start, Utc::now());
        let point = app.tick(start + Duration::from_secs(1), Utc::now());
        assert!(point.is_some());
        assert_eq!(app.session.series().len(), SERIES_CAPACITY);
    }

    #[test]
    fn test_prediction_flow() {
        let mut app = app();
        assert!(app.begin_prediction("12:00:00").is_err());

        app.select_highlighted(Instant::now(), Utc::now());
        let current = app.session.current_price().unwrap();

        let job = app.begin_prediction("12:00:00").unwrap();
        assert_eq!(job.request.reference_price, current);
        assert!(app.is_predicting);

        assert!(app.begin_prediction("99:00:00").is_err());

        assert!(app.apply_prediction(job.session_id, PredictionOutcome::Live("ok".into())));
        assert!(!app.is_predicting);
        assert!(!app.apply_prediction(job.session_id + 1, PredictionOutcome::Live("x".into())));
    }

    #[test]
    fn test_input_mode() {
        let mut app = app();
        app.start_prediction_input();
        assert!(!app.is_in_input_mode());

        app.select_highlighted(Instant::now(), Utc::now());
        app.start_prediction_input();
        assert!(app.is_in_input_mode());

        for c in "14:3x0:00:99".chars() {
            app.append_char(c);
        }
        assert_eq!(app.input_buffer, "14:30:00");

        app.backspace();
        assert_eq!(app.submit_input(), "14:30:0");
        assert!(!app.is_in_input_mode());
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = app();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }
}
