// ============================================================================
// Module : chart::overlays
// ============================================================================
// Peuplement des séries d'indicateurs depuis le snapshot canonique :
// moyennes mobiles et bandes sur le panneau principal, RSI / MACD / volume
// vers leurs panneaux dédiés (coquilles créées par le compositeur, chacune
// avec son échelle réservée).
//
// Un indicateur sans aucune valeur dans la fenêtre est simplement sauté :
// ce n'est PAS une erreur, le backend n'envoie pas toujours toutes les
// colonnes.
// ============================================================================

use tracing::{debug, warn};

use crate::chart::style::{ChartTheme, OscillatorKind, OverlayToggles};
use crate::chart::surface::{
    ChartSurface, HistogramPoint, HistogramSeries, LinePoint, LineSeries,
};
use crate::models::candle::{Candle, IndicatorKey};

/// Remplit la surface avec les overlays actifs
pub fn apply(surface: &mut ChartSurface, toggles: &OverlayToggles) {
    let theme = surface.theme;

    // --- Panneau principal : moyennes mobiles et paire de bandes ---
    let mut enabled_keys: Vec<IndicatorKey> = Vec::new();
    if toggles.sma_20 {
        enabled_keys.push(IndicatorKey::Sma20);
    }
    if toggles.sma_50 {
        enabled_keys.push(IndicatorKey::Sma50);
    }
    if toggles.ema_20 {
        enabled_keys.push(IndicatorKey::Ema20);
    }
    if toggles.bollinger {
        // Paire haute/basse : deux séries indépendantes, un seul style
        enabled_keys.push(IndicatorKey::BbUpper);
        enabled_keys.push(IndicatorKey::BbLower);
    }

    let mut main_series: Vec<LineSeries> = Vec::new();
    for key in enabled_keys {
        let points = points_for(&surface.main.candles, key);
        if points.is_empty() {
            debug!(indicator = key.label(), "Indicator absent from window, overlay skipped");
            continue;
        }

        let mut series = LineSeries::new(key.label(), theme.overlay_style(key));
        match series.set_data(points) {
            Ok(()) => main_series.push(series),
            Err(err) => warn!(error = %err, "Overlay series rejected by surface, skipping"),
        }
    }
    surface.main.series.extend(main_series);

    // --- Panneaux oscillateurs ---
    // Les points sont extraits avant de prendre le panneau en mutable
    let rsi_points = points_for(&surface.main.candles, IndicatorKey::Rsi14);
    let macd_points = points_for(&surface.main.candles, IndicatorKey::Macd);
    let signal_points = points_for(&surface.main.candles, IndicatorKey::MacdSignal);
    let volume_points = volume_histogram(&surface.main.candles, &theme);

    if let Some(pane) = surface.oscillator_mut(OscillatorKind::Rsi) {
        let mut lines = Vec::new();
        push_line(&mut lines, IndicatorKey::Rsi14, rsi_points, &theme);
        pane.lines = lines;
    }

    if let Some(pane) = surface.oscillator_mut(OscillatorKind::Macd) {
        let mut lines = Vec::new();
        push_line(&mut lines, IndicatorKey::Macd, macd_points, &theme);
        push_line(&mut lines, IndicatorKey::MacdSignal, signal_points, &theme);
        pane.lines = lines;
    }

    if let Some(pane) = surface.oscillator_mut(OscillatorKind::Volume) {
        if volume_points.is_empty() {
            debug!("No volume data in window, histogram skipped");
        } else {
            let mut histogram = HistogramSeries::new(OscillatorKind::Volume.label());
            match histogram.set_data(volume_points) {
                Ok(()) => pane.histogram = Some(histogram),
                Err(err) => warn!(error = %err, "Volume histogram rejected by surface, skipping"),
            }
        }
    }
}

/// Extrait les points d'un indicateur, slots sans valeur sautés
///
/// Les chandelles sont canoniques (croissantes, uniques) : la série produite
/// respecte le contrat de la surface par construction.
fn points_for(candles: &[Candle], key: IndicatorKey) -> Vec<LinePoint> {
    candles
        .iter()
        .filter_map(|candle| {
            candle
                .indicators
                .get(key)
                .filter(|value| value.is_finite())
                .map(|value| LinePoint::new(candle.time, value))
        })
        .collect()
}

/// Histogramme de volume, barres colorées par direction de la chandelle
fn volume_histogram(candles: &[Candle], theme: &ChartTheme) -> Vec<HistogramPoint> {
    candles
        .iter()
        .filter_map(|candle| {
            candle.volume.map(|volume| HistogramPoint {
                time: candle.time,
                value: volume,
                color: if candle.is_bearish() {
                    theme.bearish
                } else {
                    theme.bullish
                },
            })
        })
        .collect()
}

fn push_line(
    lines: &mut Vec<LineSeries>,
    key: IndicatorKey,
    points: Vec<LinePoint>,
    theme: &ChartTheme,
) {
    if points.is_empty() {
        debug!(indicator = key.label(), "Indicator absent from window, pane series skipped");
        return;
    }
    let mut series = LineSeries::new(key.label(), theme.overlay_style(key));
    match series.set_data(points) {
        Ok(()) => lines.push(series),
        Err(err) => warn!(error = %err, "Pane series rejected by surface, skipping"),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::surface::{OscillatorPane, PaneAllocation};
    use crate::models::candle::CanonicalTime;
    use crate::models::granularity::Granularity;
    use chrono::NaiveDate;

    fn candle(d: u32, close: f64) -> Candle {
        let day = NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        Candle::new(CanonicalTime::Day(day), close - 0.5, close + 1.0, close - 1.0, close)
    }

    fn surface_with(candles: Vec<Candle>, panes: &[OscillatorKind]) -> ChartSurface {
        let mut surface = ChartSurface::new(
            "AAPL".to_string(),
            Granularity::D1,
            ChartTheme::default(),
            120,
            40,
            candles,
            PaneAllocation::for_oscillators(panes.len()),
        );
        for kind in panes {
            surface.oscillators.push(OscillatorPane::new(*kind));
        }
        surface
    }

    #[test]
    fn test_missing_indicator_skipped_silently() {
        // Aucune colonne d'indicateur : aucun overlay, aucune erreur
        let surface_candles = vec![candle(1, 10.0), candle(2, 10.5)];
        let mut surface = surface_with(surface_candles, &[]);

        apply(&mut surface, &OverlayToggles::default());
        assert!(surface.main.series.is_empty());
    }

    #[test]
    fn test_sma_series_built_where_present() {
        let mut c1 = candle(1, 10.0);
        let mut c2 = candle(2, 10.5);
        // SMA seulement sur la deuxième chandelle (début de fenêtre)
        c1.indicators.sma_20 = None;
        c2.indicators.sma_20 = Some(10.2);

        let mut surface = surface_with(vec![c1, c2], &[]);
        apply(&mut surface, &OverlayToggles::default());

        let sma = surface
            .main
            .series
            .iter()
            .find(|s| s.name == "SMA 20")
            .expect("série SMA 20 attendue");
        assert_eq!(sma.points().len(), 1);
    }

    #[test]
    fn test_band_pair_two_series_one_style() {
        let mut c1 = candle(1, 10.0);
        c1.indicators.bb_upper = Some(11.0);
        c1.indicators.bb_lower = Some(9.0);

        let mut surface = surface_with(vec![c1], &[]);
        apply(&mut surface, &OverlayToggles::default());

        let upper = surface.main.series.iter().find(|s| s.name == "BB sup").unwrap();
        let lower = surface.main.series.iter().find(|s| s.name == "BB inf").unwrap();
        assert_eq!(upper.style, lower.style);
    }

    #[test]
    fn test_rsi_routed_to_own_pane() {
        let mut c1 = candle(1, 10.0);
        c1.indicators.rsi_14 = Some(55.0);

        let toggles = OverlayToggles {
            rsi: true,
            volume: false,
            ..OverlayToggles::default()
        };
        let mut surface = surface_with(vec![c1], &[OscillatorKind::Rsi]);
        apply(&mut surface, &toggles);

        // Le RSI n'apparaît jamais sur le panneau principal
        assert!(surface.main.series.iter().all(|s| s.name != "RSI 14"));
        let pane = &surface.oscillators[0];
        assert_eq!(pane.lines.len(), 1);
        assert_eq!(pane.lines[0].name, "RSI 14");
    }

    #[test]
    fn test_macd_pane_gets_both_lines() {
        let mut c1 = candle(1, 10.0);
        c1.indicators.macd = Some(0.5);
        c1.indicators.macd_signal = Some(0.3);

        let mut surface = surface_with(vec![c1], &[OscillatorKind::Macd]);
        apply(
            &mut surface,
            &OverlayToggles {
                macd: true,
                volume: false,
                ..OverlayToggles::default()
            },
        );

        assert_eq!(surface.oscillators[0].lines.len(), 2);
    }

    #[test]
    fn test_volume_histogram_colored_by_direction() {
        let mut up = candle(1, 10.5); // close > open : haussière
        up.volume = Some(1000.0);
        let mut down = candle(2, 10.0);
        down.open = 10.5;
        down.close = 10.0; // baissière
        down.volume = Some(1200.0);

        let theme = ChartTheme::default();
        let mut surface = surface_with(vec![up, down], &[OscillatorKind::Volume]);
        apply(&mut surface, &OverlayToggles::default());

        let histogram = surface.oscillators[0].histogram.as_ref().unwrap();
        assert_eq!(histogram.points().len(), 2);
        assert_eq!(histogram.points()[0].color, theme.bullish);
        assert_eq!(histogram.points()[1].color, theme.bearish);
    }

    #[test]
    fn test_disabled_toggles_draw_nothing() {
        let mut c1 = candle(1, 10.0);
        c1.indicators.sma_20 = Some(10.1);
        c1.indicators.rsi_14 = Some(60.0);

        let all_off = OverlayToggles {
            sma_20: false,
            sma_50: false,
            ema_20: false,
            bollinger: false,
            rsi: false,
            macd: false,
            volume: false,
        };
        let mut surface = surface_with(vec![c1], &[]);
        apply(&mut surface, &all_off);

        assert!(surface.main.series.is_empty());
        assert!(surface.oscillators.is_empty());
    }
}
