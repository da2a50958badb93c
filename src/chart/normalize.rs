// ============================================================================
// Module : chart::normalize
// ============================================================================
// Normalisation des chandelles brutes : parsing des timestamps hétérogènes,
// tri, canonicalisation par granularité, déduplication. C'est la première
// étape de chaque reconstruction du chart ; la surface de rendu exige des
// clés strictement croissantes et uniques, c'est ici qu'on les garantit.
//
// Règles :
// 1. Parser chaque timestamp en instant absolu UTC. Ligne écartée si le
//    parsing échoue ou si un champ OHLC manque ou n'est pas fini.
// 2. Tri stable croissant par instant.
// 3. Clé canonique : jour calendaire pour D1 et plus, secondes epoch pour
//    l'intraday.
// 4. Première occurrence de chaque clé conservée, les suivantes écartées
//    (départage documenté : la plus tôt dans l'ordre de tri gagne).
//
// Les lignes écartées sont des erreurs de données : comptées dans les logs,
// jamais remontées à l'utilisateur. Déterministe et idempotent : repasser
// une sortie canonique dans le normaliseur la laisse identique.
// ============================================================================

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::candle::{Candle, CanonicalTime, RawCandle};
use crate::models::granularity::Granularity;

/// Dérive la clé canonique d'un instant pour une granularité
///
/// - D1/W1/MN1 : jour calendaire "YYYY-MM-DD" (absorbe le bruit intraday)
/// - Intraday : secondes epoch entières
pub fn canonical_key(instant: DateTime<Utc>, granularity: Granularity) -> CanonicalTime {
    if granularity.is_intraday() {
        CanonicalTime::Instant(instant.timestamp())
    } else {
        CanonicalTime::Day(instant.date_naive())
    }
}

/// Normalise un lot de chandelles brutes en séquence canonique
///
/// Sortie : strictement croissante en clé canonique, sans doublon, lignes
/// invalides écartées. Entrée vide ou toute invalide → sortie vide (le
/// moteur ne tentera aucune construction de surface).
pub fn normalize_candles(rows: &[RawCandle], granularity: Granularity) -> Vec<Candle> {
    let mut parsed: Vec<(DateTime<Utc>, &RawCandle)> = Vec::with_capacity(rows.len());
    let mut dropped_rows = 0usize;

    for row in rows {
        let instant = match row.time.parse_instant() {
            Some(instant) => instant,
            None => {
                dropped_rows += 1;
                continue;
            }
        };

        match (row.open, row.high, row.low, row.close) {
            (Some(o), Some(h), Some(l), Some(c))
                if o.is_finite() && h.is_finite() && l.is_finite() && c.is_finite() =>
            {
                parsed.push((instant, row));
            }
            _ => {
                dropped_rows += 1;
            }
        }
    }

    // Tri stable : à instant égal, l'ordre d'entrée départage
    parsed.sort_by_key(|(instant, _)| *instant);

    // Déduplication : les clés égales sont contiguës après tri (la
    // troncature au jour est monotone), un seul passage suffit
    let mut candles: Vec<Candle> = Vec::with_capacity(parsed.len());
    let mut dropped_duplicates = 0usize;

    for (instant, row) in parsed {
        let key = canonical_key(instant, granularity);
        if candles.last().map(|c| c.time) == Some(key) {
            dropped_duplicates += 1;
            continue;
        }

        // Les unwrap_or sont inatteignables (filtrés plus haut), mais on
        // évite tout panic dans le chemin de données
        candles.push(Candle {
            time: key,
            open: row.open.unwrap_or(0.0),
            high: row.high.unwrap_or(0.0),
            low: row.low.unwrap_or(0.0),
            close: row.close.unwrap_or(0.0),
            volume: row.volume.filter(|v| v.is_finite()),
            indicators: row.indicators,
        });
    }

    if dropped_rows > 0 || dropped_duplicates > 0 {
        warn!(
            granularity = granularity.label(),
            dropped_rows, dropped_duplicates, "Dropped invalid or duplicate candle rows"
        );
    }
    debug!(
        granularity = granularity.label(),
        input = rows.len(),
        output = candles.len(),
        "Normalized candle batch"
    );

    candles
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candle::RawTimestamp;

    fn raw(time: RawTimestamp, open: f64, close: f64) -> RawCandle {
        RawCandle::new(time, open, open.max(close) + 1.0, open.min(close) - 1.0, close)
    }

    fn text(value: &str) -> RawTimestamp {
        RawTimestamp::Text(value.to_string())
    }

    /// Reconvertit une sortie canonique en entrée brute (pour l'idempotence)
    fn to_raw_batch(candles: &[Candle]) -> Vec<RawCandle> {
        candles
            .iter()
            .map(|c| {
                let mut row = RawCandle::new(c.time.to_raw(), c.open, c.high, c.low, c.close);
                row.volume = c.volume;
                row.indicators = c.indicators;
                row
            })
            .collect()
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        // Entrée volontairement désordonnée avec un doublon
        let rows = vec![
            raw(text("2024-01-03"), 12.0, 13.0),
            raw(text("2024-01-01"), 10.0, 10.5),
            raw(text("2024-01-02"), 11.0, 11.5),
            raw(text("2024-01-01"), 99.0, 99.0), // Doublon, écarté
        ];

        let candles = normalize_candles(&rows, Granularity::D1);
        assert_eq!(candles.len(), 3);
        for pair in candles.windows(2) {
            assert!(pair[0].time < pair[1].time);
        }
        // La première occurrence (dans l'ordre trié) a gagné
        assert_eq!(candles[0].open, 10.0);
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            raw(text("2024-01-02T10:30:00Z"), 11.0, 11.5),
            raw(text("2024-01-02T10:00:00Z"), 10.0, 11.0),
            raw(RawTimestamp::Epoch(1_704_193_800), 11.5, 12.0), // 2024-01-02 11:10
        ];

        let once = normalize_candles(&rows, Granularity::M30);
        let twice = normalize_candles(&to_raw_batch(&once), Granularity::M30);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_same_day_collapse_keeps_earliest() {
        // Deux chandelles intraday du même jour, granularité journalière :
        // une seule ligne survit, celle du premier instant trié
        let rows = vec![
            RawCandle::new(text("2024-01-01T00:00Z"), 10.0, 11.0, 9.0, 10.5),
            RawCandle::new(text("2024-01-01T05:00Z"), 10.5, 10.6, 10.4, 10.5),
        ];

        let candles = normalize_candles(&rows, Granularity::D1);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].time.to_string(), "2024-01-01");
        assert_eq!(candles[0].open, 10.0);
        assert_eq!(candles[0].high, 11.0);
        assert_eq!(candles[0].low, 9.0);
        assert_eq!(candles[0].close, 10.5);
    }

    #[test]
    fn test_same_instants_survive_intraday() {
        // Les mêmes deux lignes en granularité intraday : clés epoch
        // distinctes, les deux survivent
        let rows = vec![
            RawCandle::new(text("2024-01-01T00:00Z"), 10.0, 11.0, 9.0, 10.5),
            RawCandle::new(text("2024-01-01T05:00Z"), 10.5, 10.6, 10.4, 10.5),
        ];

        let candles = normalize_candles(&rows, Granularity::H1);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, CanonicalTime::Instant(1_704_067_200));
        assert_eq!(candles[1].time, CanonicalTime::Instant(1_704_085_200));
    }

    #[test]
    fn test_invalid_rows_dropped_silently() {
        let mut incomplete = raw(text("2024-01-02"), 11.0, 11.5);
        incomplete.close = None;
        let mut not_finite = raw(text("2024-01-03"), 12.0, 12.5);
        not_finite.high = Some(f64::NAN);

        let rows = vec![
            raw(text("n'importe quoi"), 1.0, 2.0), // Timestamp imparsable
            incomplete,
            not_finite,
            raw(text("2024-01-04"), 13.0, 13.5), // Seule ligne valide
        ];

        let candles = normalize_candles(&rows, Granularity::D1);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].time.to_string(), "2024-01-04");
    }

    #[test]
    fn test_empty_and_all_invalid() {
        assert!(normalize_candles(&[], Granularity::D1).is_empty());

        let rows = vec![raw(text("invalide"), 1.0, 2.0)];
        assert!(normalize_candles(&rows, Granularity::D1).is_empty());
    }

    #[test]
    fn test_millis_and_seconds_same_key() {
        // Le même instant en secondes et en millisecondes : un doublon
        let rows = vec![
            raw(RawTimestamp::Epoch(1_704_085_200), 10.0, 10.5),
            raw(RawTimestamp::Epoch(1_704_085_200_000), 99.0, 99.5),
        ];

        let candles = normalize_candles(&rows, Granularity::M5);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 10.0);
    }

    #[test]
    fn test_indicators_carried_through() {
        let mut row = raw(text("2024-01-01"), 10.0, 10.5);
        row.indicators.sma_20 = Some(10.2);
        row = row.with_volume(1500.0);

        let candles = normalize_candles(&[row], Granularity::D1);
        assert_eq!(candles[0].indicators.sma_20, Some(10.2));
        assert_eq!(candles[0].volume, Some(1500.0));
    }
}
