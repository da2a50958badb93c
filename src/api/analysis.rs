// ============================================================================
// API Client : backend d'analyse
// ============================================================================
// Récupère l'historique de chandelles (indicateurs précalculés inclus) et le
// verdict d'analyse depuis le backend. Deux endpoints :
//
//   GET {base}/history/{symbol}?interval=1d   -> chandelles + indicateurs
//   GET {base}/analyze/{symbol}               -> score, signal, niveaux, figures
//
// Le client ne calcule RIEN : il transporte des données brutes que le moteur
// de chart normalise et projette.
//
// CONCEPTS RUST :
// 1. async/await : I/O réseau non bloquante
// 2. anyhow::Context : contexte d'erreur empilé à chaque étape
// 3. tokio::join! : les deux requêtes partent en parallèle
// ============================================================================

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::models::{AnalysisSnapshot, Granularity, RawCandle};

/// Variable d'environnement pour surcharger l'URL du backend
const API_URL_ENV: &str = "LAZYCHART_API_URL";

/// Backend local par défaut (serveur d'analyse FastAPI)
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Réponse de l'endpoint /history
///
/// Le tableau `data` porte les chandelles avec leurs colonnes d'indicateurs
/// aplaties ; les colonnes inconnues sont ignorées à la désérialisation.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    ticker: String,

    #[serde(default)]
    data: Vec<RawCandle>,
}

/// Rapport complet pour un symbole : chandelles brutes + verdict
///
/// C'est l'instantané d'entrée du moteur de chart : les chandelles restent
/// BRUTES ici, la normalisation se rejoue à chaque reconstruction.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub symbol: String,
    pub granularity: Granularity,
    pub candles: Vec<RawCandle>,
    pub analysis: AnalysisSnapshot,
}

/// URL de base du backend, surchargée par LAZYCHART_API_URL
fn base_url() -> String {
    std::env::var(API_URL_ENV)
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

fn build_history_url(base: &str, symbol: &str, granularity: Granularity) -> String {
    format!(
        "{}/history/{}?interval={}",
        base,
        symbol,
        granularity.api_label()
    )
}

fn build_analyze_url(base: &str, symbol: &str) -> String {
    format!("{}/analyze/{}", base, symbol)
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("lazychart/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Échec de la création du client HTTP")
}

/// Récupère l'historique de chandelles d'un symbole
///
/// Un historique vide n'est PAS une erreur : le moteur affiche simplement
/// un chart vide (symbole sans cotation sur cet intervalle).
///
/// CONCEPT RUST : #[instrument]
/// - Tous les logs de la fonction portent le contexte symbol + granularity
#[instrument(skip(granularity), fields(granularity = granularity.label()))]
pub async fn fetch_history(symbol: &str, granularity: Granularity) -> Result<Vec<RawCandle>> {
    let url = build_history_url(&base_url(), symbol, granularity);
    debug!(url = %url, "Fetching candle history");

    let response = http_client()?
        .get(&url)
        .send()
        .await
        .context("Échec de la requête HTTP vers le backend d'analyse")?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Le backend a retourné une erreur : HTTP {}", status);
    }

    let history: HistoryResponse = response
        .json()
        .await
        .context("Échec du parsing JSON de l'historique")?;

    if history.data.is_empty() {
        warn!(ticker = %history.ticker, "Backend returned empty history");
    }
    debug!(candles = history.data.len(), "History fetched");
    Ok(history.data)
}

/// Récupère le verdict d'analyse d'un symbole
#[instrument]
pub async fn fetch_analysis(symbol: &str) -> Result<AnalysisSnapshot> {
    let url = build_analyze_url(&base_url(), symbol);
    debug!(url = %url, "Fetching analysis verdict");

    let response = http_client()?
        .get(&url)
        .send()
        .await
        .context("Échec de la requête HTTP vers le backend d'analyse")?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Le backend a retourné une erreur : HTTP {}", status);
    }

    let snapshot: AnalysisSnapshot = response
        .json()
        .await
        .context("Échec du parsing JSON du verdict d'analyse")?;

    debug!(
        score = snapshot.score,
        patterns = snapshot.patterns.len(),
        "Analysis fetched"
    );
    Ok(snapshot)
}

/// Récupère le rapport complet d'un symbole (historique + verdict)
///
/// CONCEPT RUST : tokio::join!
/// - Les deux futures avancent en parallèle sur le même runtime
/// - On attend que LES DEUX soient terminées avant de continuer
///
/// L'historique est indispensable ; un verdict indisponible dégrade en
/// snapshot neutre (le chart s'affiche sans annotations).
pub async fn fetch_report(symbol: &str, granularity: Granularity) -> Result<AnalysisReport> {
    let (candles, analysis) = tokio::join!(
        fetch_history(symbol, granularity),
        fetch_analysis(symbol)
    );

    let candles = candles?;
    let analysis = match analysis {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(symbol, error = %format!("{err:#}"), "Analysis unavailable, chart renders without annotations");
            AnalysisSnapshot::default()
        }
    };

    info!(
        symbol,
        candles = candles.len(),
        score = analysis.score,
        "Report fetched"
    );

    Ok(AnalysisReport {
        symbol: symbol.to_string(),
        granularity,
        candles,
        analysis,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_history_url() {
        let url = build_history_url("http://127.0.0.1:8000", "AAPL", Granularity::H1);
        assert_eq!(url, "http://127.0.0.1:8000/history/AAPL?interval=1h");
    }

    #[test]
    fn test_build_analyze_url() {
        let url = build_analyze_url("http://127.0.0.1:8000", "005930.KS");
        assert_eq!(url, "http://127.0.0.1:8000/analyze/005930.KS");
    }

    #[test]
    fn test_history_response_parsing() {
        // Payload réaliste : timestamps hétérogènes, colonnes d'indicateurs
        // aplaties, colonnes inconnues ignorées
        let json = r#"{
            "ticker": "AAPL",
            "interval": "1d",
            "data": [
                {"time": "2024-01-02", "open": 185.0, "high": 186.5, "low": 183.2,
                 "close": 185.6, "volume": 52000000, "sma_20": 184.2, "rsi": 56.1,
                 "macd": 0.82, "macd_signal": 0.64, "obv": 123456.0},
                {"time": "2024-01-03", "open": 185.6, "high": 187.0, "low": 184.9,
                 "close": 186.2, "volume": 48000000, "bb_upper": 190.1, "bb_lower": 178.3}
            ]
        }"#;

        let history: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(history.ticker, "AAPL");
        assert_eq!(history.data.len(), 2);
        assert_eq!(history.data[0].indicators.sma_20, Some(184.2));
        assert_eq!(history.data[0].indicators.rsi_14, Some(56.1));
        assert_eq!(history.data[1].indicators.bb_upper, Some(190.1));
    }

    #[test]
    fn test_history_response_empty() {
        let history: HistoryResponse = serde_json::from_str(r#"{"ticker": "X", "data": []}"#).unwrap();
        assert!(history.data.is_empty());
    }

    // Test avec un vrai appel au backend local (peut échouer s'il ne tourne pas)
    #[tokio::test]
    async fn test_fetch_report_live() {
        let result = fetch_report("AAPL", Granularity::D1).await;

        match result {
            Ok(report) => {
                assert_eq!(report.symbol, "AAPL");
                println!("✓ Récupéré {} chandelles pour AAPL", report.candles.len());
            }
            Err(e) => {
                println!("⚠ Test skippé (backend non démarré?) : {}", e);
            }
        }
    }
}
