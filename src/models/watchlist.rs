// ============================================================================
// Structure : WatchedSymbol
// ============================================================================
// Un symbole suivi dans la watchlist, avec sa série de chandelles et son
// verdict d'analyse une fois chargés
//
// CONCEPTS RUST :
// 1. Composition : WatchedSymbol contient CandleSeries et AnalysisSnapshot
// 2. Option : les deux sections sont absentes tant que le worker n'a pas
//    répondu (ou en cas d'erreur de chargement)
// ============================================================================

use crate::models::analysis::{AnalysisSnapshot, PatternBias};
use crate::models::candle::{Candle, CandleSeries};

/// Un symbole suivi avec ses données chargées
#[derive(Debug, Clone)]
pub struct WatchedSymbol {
    /// Symbole du titre (ex: "AAPL")
    pub symbol: String,

    /// Nom complet (ex: "Apple Inc.")
    pub name: String,

    /// Série canonique chargée (None si pas encore chargée ou erreur)
    pub series: Option<CandleSeries>,

    /// Verdict d'analyse (chargé en même temps que la série)
    pub analysis: Option<AnalysisSnapshot>,
}

impl WatchedSymbol {
    /// Crée un symbole suivi sans données
    pub fn new(symbol: String, name: String) -> Self {
        Self {
            symbol,
            name,
            series: None,
            analysis: None,
        }
    }

    /// Retourne le prix actuel
    ///
    /// Priorité au prix du verdict d'analyse (plus frais), sinon close de la
    /// dernière chandelle.
    pub fn current_price(&self) -> Option<f64> {
        if let Some(price) = self.analysis.as_ref().and_then(|a| a.current_price) {
            return Some(price);
        }
        let series = self.series.as_ref()?;
        Some(series.last()?.close)
    }

    /// Retourne la variation journalière en pourcentage
    pub fn change_percent(&self) -> Option<f64> {
        self.series
            .as_ref()
            .and_then(|series| series.daily_change_percent())
    }

    /// Retourne la dernière chandelle
    pub fn last_candle(&self) -> Option<&Candle> {
        self.series.as_ref()?.last()
    }

    /// Vérifie si les données sont chargées
    pub fn has_data(&self) -> bool {
        self.series.is_some()
    }

    /// Biais du score d'analyse (pour la couleur de la colonne verdict)
    pub fn score_bias(&self) -> PatternBias {
        self.analysis
            .as_ref()
            .map(|a| a.score_bias())
            .unwrap_or(PatternBias::Neutral)
    }

    /// Retourne true si le titre est en hausse
    pub fn is_positive(&self) -> bool {
        self.change_percent().map(|c| c >= 0.0).unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candle::CanonicalTime;
    use crate::models::granularity::Granularity;
    use chrono::NaiveDate;

    fn series_with_one_candle() -> CandleSeries {
        let mut series = CandleSeries::new("AAPL".to_string(), Granularity::D1);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        series
            .candles
            .push(Candle::new(CanonicalTime::Day(day), 100.0, 110.0, 95.0, 105.0));
        series
    }

    #[test]
    fn test_watched_symbol_new() {
        let item = WatchedSymbol::new("AAPL".to_string(), "Apple Inc.".to_string());
        assert_eq!(item.symbol, "AAPL");
        assert!(!item.has_data());
        assert!(item.current_price().is_none());
        assert_eq!(item.score_bias(), PatternBias::Neutral);
    }

    #[test]
    fn test_watched_symbol_with_series() {
        let mut item = WatchedSymbol::new("AAPL".to_string(), "Apple Inc.".to_string());
        item.series = Some(series_with_one_candle());

        assert!(item.has_data());
        assert_eq!(item.current_price(), Some(105.0));
        assert!(item.is_positive());
    }

    #[test]
    fn test_analysis_price_takes_precedence() {
        let mut item = WatchedSymbol::new("AAPL".to_string(), "Apple Inc.".to_string());
        item.series = Some(series_with_one_candle());
        item.analysis = Some(AnalysisSnapshot {
            score: 72.0,
            current_price: Some(106.5),
            ..AnalysisSnapshot::default()
        });

        assert_eq!(item.current_price(), Some(106.5));
        assert_eq!(item.score_bias(), PatternBias::Bullish);
    }
}
