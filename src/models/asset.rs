// ============================================================================
// Structure : Asset
// ============================================================================
// Catalogue statique des actifs synthétiques affichés par le dashboard
//
// CONCEPTS RUST :
// 1. &'static str : les symboles vivent dans le binaire, pas d'allocation
// 2. const slice : le catalogue est défini à la compilation, jamais modifié
// 3. Copy : un Asset est petit, on le copie au lieu de le partager
// ============================================================================

use serde::Serialize;

/// Catégorie d'actif
///
/// La catégorie pilote la volatilité du générateur et le prix de départ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssetCategory {
    /// Paires forex over-the-counter
    ForexOtc,
    /// Paires forex classiques
    ForexClassic,
    /// Crypto-monnaies
    Crypto,
    /// Matières premières (or, argent)
    Commodities,
}

impl AssetCategory {
    /// Toutes les catégories, dans l'ordre du sélecteur
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::ForexOtc,
        AssetCategory::ForexClassic,
        AssetCategory::Crypto,
        AssetCategory::Commodities,
    ];

    /// Label complet pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::ForexOtc => "Forex OTC",
            AssetCategory::ForexClassic => "Forex Classique",
            AssetCategory::Crypto => "Crypto-monnaies",
            AssetCategory::Commodities => "Matières Premières",
        }
    }

    /// Label court pour les onglets du sélecteur
    pub fn short_label(&self) -> &'static str {
        match self {
            AssetCategory::ForexOtc => "OTC",
            AssetCategory::ForexClassic => "Classique",
            AssetCategory::Crypto => "Crypto",
            AssetCategory::Commodities => "Matières",
        }
    }

    /// Catégorie suivante (cycle, touche Tab)
    pub fn next(&self) -> AssetCategory {
        match self {
            AssetCategory::ForexOtc => AssetCategory::ForexClassic,
            AssetCategory::ForexClassic => AssetCategory::Crypto,
            AssetCategory::Crypto => AssetCategory::Commodities,
            AssetCategory::Commodities => AssetCategory::ForexOtc, // Boucle
        }
    }
}

/// Un actif négociable du catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Symbole affiché, unique dans le catalogue (ex: "EUR/USD OTC")
    pub symbol: &'static str,

    /// Catégorie de l'actif
    pub category: AssetCategory,

    /// Variante over-the-counter (badge "OTC")
    pub is_otc: bool,
}

impl Asset {
    /// Constructeur const : permet de construire le catalogue à la compilation
    pub const fn new(symbol: &'static str, category: AssetCategory, is_otc: bool) -> Self {
        Self {
            symbol,
            category,
            is_otc,
        }
    }
}

// ============================================================================
// Catalogue
// ============================================================================

use AssetCategory::{Commodities, Crypto, ForexClassic, ForexOtc};

/// Catalogue complet, dans l'ordre d'affichage
pub const ASSETS: &[Asset] = &[
    // Forex OTC
    Asset::new("AUD/CHF OTC", ForexOtc, true),
    Asset::new("AUD/NZD OTC", ForexOtc, true),
    Asset::new("CAD/CHF OTC", ForexOtc, true),
    Asset::new("EUR/GBP OTC", ForexOtc, true),
    Asset::new("EUR/NZD OTC", ForexOtc, true),
    Asset::new("EUR/USD OTC", ForexOtc, true),
    Asset::new("GBP/USD OTC", ForexOtc, true),
    Asset::new("USD/EGP OTC", ForexOtc, true),
    Asset::new("USD/JPY OTC", ForexOtc, true),
    Asset::new("CHF/JPY OTC", ForexOtc, true),
    Asset::new("USD/CAD OTC", ForexOtc, true),
    Asset::new("CAD/JPY OTC", ForexOtc, true),
    // Forex classique
    Asset::new("AUD/CHF", ForexClassic, false),
    Asset::new("GBP/CHF", ForexClassic, false),
    Asset::new("AUD/CAD", ForexClassic, false),
    Asset::new("GBP/AUD", ForexClassic, false),
    Asset::new("EUR/USD", ForexClassic, false),
    Asset::new("GBP/CAD", ForexClassic, false),
    Asset::new("USD/CHF", ForexClassic, false),
    Asset::new("EUR/CAD", ForexClassic, false),
    Asset::new("USD/JPY", ForexClassic, false),
    Asset::new("GBP/JPY", ForexClassic, false),
    Asset::new("CHF/JPY", ForexClassic, false),
    Asset::new("EUR/CHF", ForexClassic, false),
    // Crypto
    Asset::new("BNB OTC", Crypto, true),
    Asset::new("DOGECOIN OTC", Crypto, true),
    Asset::new("BITCOIN OTC", Crypto, true),
    // Matières premières
    Asset::new("Gold OTC", Commodities, true),
    Asset::new("Silver OTC", Commodities, true),
];

/// Retourne les actifs d'une catégorie
///
/// CONCEPT RUST : impl Iterator
/// - Pas de Vec intermédiaire, l'appelant collecte s'il en a besoin
pub fn assets_in(category: AssetCategory) -> impl Iterator<Item = &'static Asset> {
    ASSETS.iter().filter(move |asset| asset.category == category)
}

/// Recherche un actif par symbole
pub fn find_asset(symbol: &str) -> Option<&'static Asset> {
    ASSETS.iter().find(|asset| asset.symbol == symbol)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_symbols_are_unique() {
        let symbols: HashSet<&str> = ASSETS.iter().map(|a| a.symbol).collect();
        assert_eq!(symbols.len(), ASSETS.len());
        assert_eq!(ASSETS.len(), 29);
    }

    #[test]
    fn test_assets_in_category() {
        assert_eq!(assets_in(ForexOtc).count(), 12);
        assert_eq!(assets_in(ForexClassic).count(), 12);
        assert_eq!(assets_in(Crypto).count(), 3);
        assert_eq!(assets_in(Commodities).count(), 2);
    }

    #[test]
    fn test_classic_forex_is_not_otc() {
        assert!(assets_in(ForexClassic).all(|a| !a.is_otc));
        assert!(assets_in(ForexOtc).all(|a| a.is_otc));
    }

    #[test]
    fn test_find_asset() {
        let btc = find_asset("BITCOIN OTC").unwrap();
        assert_eq!(btc.category, Crypto);
        assert!(find_asset("AAPL").is_none());
    }

    #[test]
    fn test_category_cycle() {
        let mut category = ForexOtc;
        for _ in 0..AssetCategory::ALL.len() {
            category = category.next();
        }
        assert_eq!(category, ForexOtc);
    }
}
