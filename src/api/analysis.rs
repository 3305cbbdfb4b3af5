// ============================================================================
// Service : analyse de marché et prévision
// ============================================================================
// Construit les requêtes envoyées au modèle génératif et interprète ses
// réponses. Tout échec du service distant est remplacé par un résultat local.
//
// CONCEPTS RUST AVANCÉS :
// 1. Générique sur trait (AnalysisService<M: GenerativeModel>)
// 2. Option comme garde : pas assez de données ⇒ pas de requête
// 3. Erreur typée (thiserror) pour la seule précondition visible
// ============================================================================

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::api::gemini::{ContentRequest, GenerativeModel};
use crate::error::AnalysisError;
use crate::market::SeriesBuffer;
use crate::models::{
    Asset, AnalysisOutcome, AnalysisResult, PredictionOutcome, Signal, Timeframe,
};

/// Nombre minimum de points pour lancer une analyse
pub const MIN_POINTS_FOR_ANALYSIS: usize = 10;

/// Nombre de prix envoyés au service
pub const PRICES_IN_REQUEST: usize = 20;

/// Force attribuée au signal de repli
pub const FALLBACK_STRENGTH: u8 = 50;

pub const FALLBACK_REASONING: &str =
    "Analyse AI indisponible, signal technique calculé localement.";

/// Texte de repli quand le service répond sans contenu
pub const PREDICTION_EMPTY_FALLBACK: &str = "Analyse non disponible.";

/// Texte de repli quand l'appel échoue
pub const PREDICTION_ERROR_FALLBACK: &str = "Erreur de connexion au service d'analyse.";

// ============================================================================
// Requête d'analyse
// ============================================================================

/// Charge utile d'une analyse : actif, timeframe, derniers prix formatés
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub asset: String,
    pub timeframe: Timeframe,

    /// Prix à 5 décimales, du plus ancien au plus récent
    pub prices: Vec<String>,
}

impl AnalysisRequest {
    /// Construit la requête depuis la série courante
    ///
    /// # Retourne
    /// * `None` si la série contient moins de MIN_POINTS_FOR_ANALYSIS points
    pub fn build(asset: &Asset, timeframe: Timeframe, series: &SeriesBuffer) -> Option<Self> {
        if series.len() < MIN_POINTS_FOR_ANALYSIS {
            debug!(
                asset = %asset.symbol,
                points = series.len(),
                "Not enough points to build an analysis request"
            );
            return None;
        }

        let prices = series
            .recent_prices(PRICES_IN_REQUEST)
            .into_iter()
            .map(|price| format!("{:.5}", price))
            .collect();

        Some(Self {
            asset: asset.symbol.to_string(),
            timeframe,
            prices,
        })
    }

    /// Prompt envoyé au modèle
    pub fn prompt(&self) -> String {
        format!(
            "Agis comme un expert en trading technique senior pour les options binaires.\n\
             \n\
             Analyse technique pour :\n\
             Actif : {}\n\
             Timeframe : {}\n\
             Prix récents (du plus ancien au plus récent) : [{}]\n\
             \n\
             Tâche :\n\
             Détermine la tendance immédiate et fournis un signal clair d'ACHAT (hausse) ou de VENTE (baisse).\n\
             Le signal doit se baser sur la dynamique des prix (momentum) et sur les supports/résistances \
             implicites dans la suite de nombres.\n\
             \n\
             Réponds UNIQUEMENT en JSON.",
            self.asset,
            self.timeframe.label(),
            self.prices.join(", ")
        )
    }

    fn to_content_request(&self) -> ContentRequest {
        ContentRequest::json(self.prompt(), analysis_response_schema())
    }
}

/// Schéma JSON imposé à la réponse d'analyse
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "signal": {
                "type": "STRING",
                "enum": ["ACHAT", "VENTE", "NEUTRE"]
            },
            "trendStrength": {
                "type": "INTEGER",
                "description": "Force du signal entre 0 et 100"
            },
            "reasoning": {
                "type": "STRING",
                "description": "Brève explication technique en français (max 20 mots)"
            }
        },
        "required": ["signal", "trendStrength", "reasoning"]
    })
}

/// Réponse structurée attendue du modèle
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReply {
    signal: Signal,
    trend_strength: i64,
    reasoning: String,
}

/// Interprète le texte renvoyé par le modèle
///
/// Accepte un bloc ```json ... ``` autour de l'objet. Une force hors de
/// 0..=100 est une réponse invalide.
pub fn parse_analysis_reply(text: &str, request: &AnalysisRequest) -> Result<AnalysisResult> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        anyhow::bail!("Réponse vide du service d'analyse");
    }

    let reply: AnalysisReply =
        serde_json::from_str(body).context("Réponse d'analyse non conforme au schéma")?;

    let trend_strength = u8::try_from(reply.trend_strength)
        .ok()
        .filter(|strength| *strength <= 100)
        .with_context(|| format!("trendStrength hors bornes : {}", reply.trend_strength))?;

    Ok(AnalysisResult {
        signal: reply.signal,
        trend_strength,
        reasoning: reply.reasoning,
        timestamp: Utc::now(),
        asset: request.asset.clone(),
        timeframe: request.timeframe,
    })
}

fn strip_code_fence(text: &str) -> &str {
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(text)
}

/// Signal de repli : ACHAT ou VENTE à pile ou face, jamais NEUTRE
pub fn fallback_result<R: Rng + ?Sized>(request: &AnalysisRequest, rng: &mut R) -> AnalysisResult {
    let signal = if rng.gen_bool(0.5) {
        Signal::Buy
    } else {
        Signal::Sell
    };

    AnalysisResult {
        signal,
        trend_strength: FALLBACK_STRENGTH,
        reasoning: FALLBACK_REASONING.to_string(),
        timestamp: Utc::now(),
        asset: request.asset.clone(),
        timeframe: request.timeframe,
    }
}

// ============================================================================
// Requête de prévision
// ============================================================================

/// Demande de projection du prix d'un actif à une heure donnée
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub asset: String,
    pub target_time: NaiveTime,

    /// Prix de référence (prix actuel de l'actif)
    pub reference_price: f64,
}

impl PredictionRequest {
    /// Construit la requête, l'heure cible au format HH:MM:SS
    pub fn new(asset: &Asset, target_time: &str, reference_price: f64) -> Result<Self> {
        let target_time = NaiveTime::parse_from_str(target_time.trim(), "%H:%M:%S")
            .with_context(|| format!("Heure cible invalide (HH:MM:SS attendu) : '{}'", target_time))?;

        Ok(Self {
            asset: asset.symbol.to_string(),
            target_time,
            reference_price,
        })
    }

    pub fn prompt(&self) -> String {
        format!(
            "L'utilisateur veut comparer le prix actuel ({:.5}) de {} avec une projection pour {}.\n\
             Comme il est impossible de prédire le futur exact, fournis une analyse de probabilité \
             basée sur la volatilité typique de cet actif à cette heure de la journée.\n\
             Sois bref et professionnel.",
            self.reference_price,
            self.asset,
            self.target_time.format("%H:%M:%S")
        )
    }
}

// ============================================================================
// Service
// ============================================================================

/// Source de la clé API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Lue dans la variable d'environnement nommée, à chaque appel
    Env(String),
    /// Valeur fixe (tests, intégrations)
    Static(Option<String>),
}

impl Credential {
    /// Résout la clé ; absente ou vide ⇒ MissingCredential
    fn resolve(&self) -> Result<String, AnalysisError> {
        let (value, var) = match self {
            Credential::Env(var) => (std::env::var(var).ok(), var.as_str()),
            Credential::Static(value) => (value.clone(), "API_KEY"),
        };

        value
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalysisError::MissingCredential {
                var: var.to_string(),
            })
    }
}

/// Service d'analyse, générique sur le modèle distant
pub struct AnalysisService<M> {
    model: M,
    credential: Credential,
}

impl<M: GenerativeModel> AnalysisService<M> {
    pub fn new(model: M, credential: Credential) -> Self {
        Self { model, credential }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Lance une analyse
    ///
    /// # Erreurs
    /// * `MissingCredential` avant tout appel réseau
    ///
    /// Tout autre échec produit `AnalysisOutcome::Fallback`.
    #[instrument(skip_all, fields(asset = %request.asset, timeframe = %request.timeframe.label()))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let api_key = self.credential.resolve()?;

        let reply = self
            .model
            .generate_content(&api_key, &request.to_content_request())
            .await;

        let parsed = reply.and_then(|text| parse_analysis_reply(&text, request));

        match parsed {
            Ok(result) => {
                info!(signal = result.signal.label(), strength = result.trend_strength, "Analysis received");
                Ok(AnalysisOutcome::Live(result))
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Analysis failed, using local fallback");
                Ok(AnalysisOutcome::Fallback(fallback_result(
                    request,
                    &mut rand::thread_rng(),
                )))
            }
        }
    }

    /// Construit la requête depuis la série puis lance l'analyse
    ///
    /// # Retourne
    /// * `Ok(None)` si la série est trop courte (aucun appel)
    pub async fn analyze_market_data(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        series: &SeriesBuffer,
    ) -> Result<Option<AnalysisOutcome>, AnalysisError> {
        match AnalysisRequest::build(asset, timeframe, series) {
            Some(request) => self.analyze(&request).await.map(Some),
            None => Ok(None),
        }
    }

    /// Demande une projection de prix en texte libre
    #[instrument(skip_all, fields(asset = %request.asset, target = %request.target_time))]
    pub async fn predict_price_at_time(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionOutcome, AnalysisError> {
        let api_key = self.credential.resolve()?;

        let reply = self
            .model
            .generate_content(&api_key, &ContentRequest::text(request.prompt()))
            .await;

        Ok(match reply {
            Ok(text) if !text.trim().is_empty() => {
                debug!(chars = text.len(), "Prediction received");
                PredictionOutcome::Live(text.trim().to_string())
            }
            Ok(_) => {
                warn!("Empty prediction reply");
                PredictionOutcome::Fallback(PREDICTION_EMPTY_FALLBACK.to_string())
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Prediction request failed");
                PredictionOutcome::Fallback(PREDICTION_ERROR_FALLBACK.to_string())
            }
        })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::find_asset;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::models::MarketDataPoint;

    /// Faux modèle : réponse fixe, compte les appels
    struct FakeModel {
        reply: std::result::Result<String, String>,
        calls: AtomicUsize,
        last_request: Mutex<Option<ContentRequest>>,
    }

    impl FakeModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("connection refused".to_string()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeModel for FakeModel {
        async fn generate_content(&self, api_key: &str, request: &ContentRequest) -> Result<String> {
            assert_eq!(api_key, "test-key");
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(anyhow::anyhow!(msg.clone())),
            }
        }
    }

    fn service(model: FakeModel) -> AnalysisService<FakeModel> {
        AnalysisService::new(model, Credential::Static(Some("test-key".to_string())))
    }

    fn eurusd() -> Asset {
        *find_asset("EUR/USD OTC").unwrap()
    }

    fn series_with(n: usize) -> SeriesBuffer {
        let mut series = SeriesBuffer::new();
        for i in 0..n {
            series.push(MarketDataPoint {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                price: 1.085 + i as f64 * 0.00001,
                rsi: Some(50.0),
                macd: None,
            });
        }
        series
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::build(&eurusd(), Timeframe::M1, &series_with(30)).unwrap()
    }

    #[test]
    fn test_build_guard() {
        assert!(AnalysisRequest::build(&eurusd(), Timeframe::M1, &series_with(9)).is_none());
        assert!(AnalysisRequest::build(&eurusd(), Timeframe::M1, &series_with(10)).is_some());
    }

    #[test]
    fn test_build_takes_last_twenty_prices() {
        let request = request();
        assert_eq!(request.prices.len(), PRICES_IN_REQUEST);
        assert_eq!(request.prices.first().unwrap(), "1.08510");
        assert_eq!(request.prices.last().unwrap(), "1.08529");
        assert_eq!(request.asset, "EUR/USD OTC");

        let prompt = request.prompt();
        assert!(prompt.contains("EUR/USD OTC"));
        assert!(prompt.contains("1M"));
        assert!(prompt.contains("1.08510, 1.08511"));
    }

    #[test]
    fn test_parse_reply() {
        let result = parse_analysis_reply(
            r#"{"signal":"VENTE","trendStrength":72,"reasoning":"Momentum baissier"}"#,
            &request(),
        )
        .unwrap();
        assert_eq!(result.signal, Signal::Sell);
        assert_eq!(result.trend_strength, 72);
        assert_eq!(result.timeframe, Timeframe::M1);

        let fenced = "```json\n{\"signal\":\"NEUTRE\",\"trendStrength\":0,\"reasoning\":\"Range\"}\n```";
        assert_eq!(parse_analysis_reply(fenced, &request()).unwrap().signal, Signal::Neutral);
    }

    #[test]
    fn test_parse_reply_rejects_invalid() {
        let request = request();
        assert!(parse_analysis_reply("", &request).is_err());
        assert!(parse_analysis_reply("pas du json", &request).is_err());
        assert!(parse_analysis_reply(r#"{"signal":"HOLD","trendStrength":10,"reasoning":"x"}"#, &request).is_err());
        assert!(parse_analysis_reply(r#"{"signal":"ACHAT","trendStrength":101,"reasoning":"x"}"#, &request).is_err());
        assert!(parse_analysis_reply(r#"{"signal":"ACHAT","trendStrength":-3,"reasoning":"x"}"#, &request).is_err());
        assert!(parse_analysis_reply(r#"{"signal":"ACHAT","reasoning":"x"}"#, &request).is_err());
    }

    #[test]
    fn test_fallback_never_neutral() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = request();
        for _ in 0..100 {
            let result = fallback_result(&request, &mut rng);
            assert_ne!(result.signal, Signal::Neutral);
            assert_eq!(result.trend_strength, FALLBACK_STRENGTH);
            assert_eq!(result.reasoning, FALLBACK_REASONING);
        }
    }

    #[test]
    fn test_prediction_request_parsing() {
        let request = PredictionRequest::new(&eurusd(), "14:30:00", 1.085).unwrap();
        assert_eq!(request.target_time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert!(request.prompt().contains("14:30:00"));
        assert!(request.prompt().contains("1.08500"));

        assert!(PredictionRequest::new(&eurusd(), "25:00:00", 1.0).is_err());
        assert!(PredictionRequest::new(&eurusd(), "14h30", 1.0).is_err());
    }

    #[tokio::test]
    async fn test_analyze_live() {
        let service = service(FakeModel::replying(
            r#"{"signal":"ACHAT","trendStrength":85,"reasoning":"Cassure de résistance"}"#,
        ));

        let outcome = service.analyze(&request()).await.unwrap();
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.result().signal, Signal::Buy);
        assert_eq!(outcome.result().trend_strength, 85);

        let sent = service.model().last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.response_schema, Some(analysis_response_schema()));
    }

    #[tokio::test]
    async fn test_analyze_failure_falls_back() {
        let service = service(FakeModel::failing());
        let outcome = service.analyze(&request()).await.unwrap();

        assert!(outcome.is_fallback());
        let result = outcome.result();
        assert_eq!(result.trend_strength, 50);
        assert_eq!(result.reasoning, FALLBACK_REASONING);
        assert_eq!(result.asset, "EUR/USD OTC");
        assert_ne!(result.signal, Signal::Neutral);
    }

    #[tokio::test]
    async fn test_analyze_malformed_falls_back() {
        for reply in ["", "{}", r#"{"signal":"ACHAT","trendStrength":250,"reasoning":"x"}"#] {
            let outcome = service(FakeModel::replying(reply)).analyze(&request()).await.unwrap();
            assert!(outcome.is_fallback(), "reply {:?} should fall back", reply);
        }
    }

    #[tokio::test]
    async fn test_missing_credential_before_call() {
        let service = AnalysisService::new(FakeModel::failing(), Credential::Static(None));
        let err = service.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential { .. }));
        assert_eq!(service.model().calls(), 0);

        let blank = AnalysisService::new(FakeModel::failing(), Credential::Static(Some("  ".into())));
        assert!(blank.analyze(&request()).await.is_err());

        let env = AnalysisService::new(
            FakeModel::failing(),
            Credential::Env("POCKETBOT_TEST_UNSET_CREDENTIAL".to_string()),
        );
        let err = env.analyze(&request()).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingCredential {
                var: "POCKETBOT_TEST_UNSET_CREDENTIAL".to_string()
            }
        );
        assert_eq!(env.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_market_data_guard() {
        let service = service(FakeModel::failing());
        let outcome = service
            .analyze_market_data(&eurusd(), Timeframe::S15, &series_with(5))
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(service.model().calls(), 0);

        let outcome = service
            .analyze_market_data(&eurusd(), Timeframe::S15, &series_with(12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.result().timeframe, Timeframe::S15);
        assert_eq!(service.model().calls(), 1);
    }

    #[tokio::test]
    async fn test_prediction_outcomes() {
        let request = PredictionRequest::new(&eurusd(), "09:15:00", 1.085).unwrap();

        let live = service(FakeModel::replying("  Probabilité de hausse modérée.  "))
            .predict_price_at_time(&request)
            .await
            .unwrap();
        assert_eq!(live, PredictionOutcome::Live("Probabilité de hausse modérée.".to_string()));

        let empty = service(FakeModel::replying("")).predict_price_at_time(&request).await.unwrap();
        assert_eq!(empty, PredictionOutcome::Fallback(PREDICTION_EMPTY_FALLBACK.to_string()));

        let failed = service(FakeModel::failing()).predict_price_at_time(&request).await.unwrap();
        assert_eq!(failed, PredictionOutcome::Fallback(PREDICTION_ERROR_FALLBACK.to_string()));
    }
}
