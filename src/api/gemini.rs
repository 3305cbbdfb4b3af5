// ============================================================================
// API Client : Gemini generateContent
// ============================================================================
// Client HTTP du modèle génératif utilisé pour l'analyse et la prévision
//
// CONCEPTS RUST AVANCÉS :
// 1. Trait async (async-trait) : le service dépend du trait, pas du client
// 2. serde_json::json! : construction du corps de requête
// 3. Désérialisation partielle : on ne garde que candidates[].content.parts[]
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, instrument};

use crate::config::Settings;

/// Requête de génération de contenu
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    /// Prompt textuel
    pub prompt: String,

    /// Schéma JSON imposé à la réponse (None : texte libre)
    pub response_schema: Option<Value>,
}

impl ContentRequest {
    /// Requête à réponse libre
    pub fn text(prompt: String) -> Self {
        Self {
            prompt,
            response_schema: None,
        }
    }

    /// Requête à réponse JSON contrainte par un schéma
    pub fn json(prompt: String, schema: Value) -> Self {
        Self {
            prompt,
            response_schema: Some(schema),
        }
    }

    /// Corps JSON de l'appel generateContent
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "contents": [
                { "parts": [ { "text": self.prompt } ] }
            ]
        });

        if let Some(schema) = &self.response_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        body
    }
}

/// Collaborateur externe : un modèle qui transforme un prompt en texte
///
/// CONCEPT RUST : #[async_trait]
/// - Permet des méthodes async dans un trait
/// - Le service d'analyse est générique sur ce trait (faux modèle en test)
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Envoie la requête et retourne le texte de la réponse
    ///
    /// Une chaîne vide signifie que le modèle n'a rien répondu.
    async fn generate_content(&self, api_key: &str, request: &ContentRequest) -> Result<String>;
}

// ============================================================================
// Structures pour parser la réponse JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatène les parties texte du premier candidat
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Client HTTP
// ============================================================================

/// Client de l'API Gemini
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    /// Crée le client à partir de la configuration
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_endpoint(&settings.api_base, &settings.model, settings.http_timeout)
    }

    pub fn with_endpoint(api_base: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pocketbot/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// URL de l'endpoint generateContent pour le modèle configuré
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate_content(&self, api_key: &str, request: &ContentRequest) -> Result<String> {
        let url = self.endpoint();
        debug!(url = %url, structured = request.response_schema.is_some(), "Sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request.to_body())
            .send()
            .await
            .context("Échec de la requête HTTP vers le service d'analyse")?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            error!(status = %status, body = %snippet, "Analysis service returned error status");
            anyhow::bail!("Le service d'analyse a retourné une erreur : HTTP {}", status);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Échec du parsing JSON de la réponse generateContent")?;

        let text = parsed.into_text();
        debug!(chars = text.len(), "Extracted reply text");
        Ok(text)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
