// ============================================================================
// Configuration
// ============================================================================
// Paramètres lus depuis l'environnement (et un éventuel fichier .env)
//
// Variables reconnues :
// - API_KEY                          : clé du service d'analyse (lue à l'appel)
// - POCKETBOT_MODEL                  : modèle (défaut gemini-2.5-flash)
// - POCKETBOT_API_BASE               : URL de base de l'API
// - POCKETBOT_HTTP_TIMEOUT_SECS      : timeout HTTP (défaut 30)
// - POCKETBOT_TICK_MS                : période des ticks (défaut 1000)
// - POCKETBOT_ANALYSIS_MIN_DELAY_MS  : durée minimale de l'état "analyse" (1500)
// - POCKETBOT_SEED                   : graine de la marche aléatoire (optionnelle)
// ============================================================================

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Nom de la variable d'environnement portant la clé API
pub const API_KEY_VAR: &str = "API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Paramètres de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Variable d'environnement lue à chaque appel pour obtenir la clé
    pub api_key_var: String,

    /// Modèle génératif interrogé
    pub model: String,

    /// URL de base de l'API (sans slash final)
    pub api_base: String,

    pub http_timeout: Duration,

    /// Période entre deux ticks synthétiques
    pub tick_period: Duration,

    /// Durée minimale d'affichage de l'état "analyse en cours"
    pub analysis_min_delay: Duration,

    /// Graine de la marche aléatoire (None : aléatoire à chaque lancement)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key_var: API_KEY_VAR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Duration::from_secs(30),
            tick_period: Duration::from_millis(1000),
            analysis_min_delay: Duration::from_millis(1500),
            seed: None,
        }
    }
}

impl Settings {
    /// Charge la configuration depuis l'environnement du processus
    ///
    /// Le fichier .env est chargé s'il existe (sans erreur sinon).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de lookup
    ///
    /// CONCEPT RUST : Closure en paramètre (impl Fn)
    /// - `load()` passe std::env::var
    /// - Les tests passent une HashMap, sans toucher à l'environnement global
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let model = lookup("POCKETBOT_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.model);

        let api_base = lookup("POCKETBOT_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);

        let http_timeout = match parse_var::<u64, _>(&lookup, "POCKETBOT_HTTP_TIMEOUT_SECS")? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.http_timeout,
        };

        let tick_period = match parse_var::<u64, _>(&lookup, "POCKETBOT_TICK_MS")? {
            Some(0) => bail!("POCKETBOT_TICK_MS doit être > 0"),
            Some(ms) => Duration::from_millis(ms),
            None => defaults.tick_period,
        };

        let analysis_min_delay =
            match parse_var::<u64, _>(&lookup, "POCKETBOT_ANALYSIS_MIN_DELAY_MS")? {
                Some(ms) => Duration::from_millis(ms),
                None => defaults.analysis_min_delay,
            };

        let seed = parse_var::<u64, _>(&lookup, "POCKETBOT_SEED")?;

        Ok(Self {
            api_key_var: defaults.api_key_var,
            model,
            api_base,
            http_timeout,
            tick_period,
            analysis_min_delay,
            seed,
        })
    }
}

/// Parse une variable optionnelle, erreur avec contexte si la valeur est invalide
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("valeur invalide pour {} : '{}'", key, raw)),
        _ => Ok(None),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_key_var, "API_KEY");
        assert_eq!(settings.tick_period, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("POCKETBOT_MODEL", "gemini-2.0-flash"),
            ("POCKETBOT_API_BASE", "http://127.0.0.1:8080/"),
            ("POCKETBOT_TICK_MS", "250"),
            ("POCKETBOT_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(settings.model, "gemini-2.0-flash");
        assert_eq!(settings.api_base, "http://127.0.0.1:8080");
        assert_eq!(settings.tick_period, Duration::from_millis(250));
        assert_eq!(settings.seed, Some(42));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = settings_from(&[("POCKETBOT_SEED", "abc")]).unwrap_err();
        assert!(err.to_string().contains("POCKETBOT_SEED"));

        assert!(settings_from(&[("POCKETBOT_TICK_MS", "0")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let settings = settings_from(&[("POCKETBOT_MODEL", "  "), ("POCKETBOT_SEED", "")]).unwrap();
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.seed, None);
    }
}
