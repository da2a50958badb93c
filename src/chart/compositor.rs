// ============================================================================
// Module : chart::compositor
// ============================================================================
// Le compositeur : builder SANS ÉTAT invoqué à chaque changement de
// dépendance (données, toggles, figures, viewport). La primitive de rendu ne
// supporte pas l'ajout/retrait sûr de séries ou de panneaux sur une instance
// vivante : on démonte TOUJOURS l'ancienne surface et on en reconstruit une
// neuve depuis le snapshot courant. Reconstruction complète, idempotente,
// jamais de patch incrémental.
//
// Résultat :
// - Ok(Some(surface)) : chart prêt à dessiner
// - Ok(None) : aucune chandelle valide, on ne tente aucune construction
// - Err(BuildError) : surface indisponible (viewport dégénéré), réessayable
// ============================================================================

use thiserror::Error;
use tracing::debug;

use crate::chart::normalize;
use crate::chart::overlays;
use crate::chart::patterns;
use crate::chart::style::{ChartTheme, OverlayToggles};
use crate::chart::surface::{ChartSurface, OscillatorPane, PaneAllocation};
use crate::models::analysis::AnalysisSnapshot;
use crate::models::candle::RawCandle;
use crate::models::drawing::ManualDrawing;
use crate::models::granularity::Granularity;

/// Largeur minimale pour tenter une construction
const MIN_BUILD_WIDTH: u16 = 20;
/// Hauteur minimale pour tenter une construction
const MIN_BUILD_HEIGHT: u16 = 8;

/// Échec de construction de la surface
///
/// Toujours réessayable : l'appelant affiche le message et retente à la
/// prochaine invalidation (resize, nouvelles données).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("surface de rendu indisponible ({width}x{height}), agrandissez le terminal")]
    SurfaceUnavailable { width: u16, height: u16 },
}

/// Snapshot des dépendances du chart
///
/// CONCEPT : Reconstruction = fonction pure de ce snapshot
/// - Tout ce qui influence le rendu est ici, rien d'ambiant
/// - Deux snapshots égaux produisent la même surface
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    pub symbol: &'a str,
    pub granularity: Granularity,
    /// Chandelles brutes : la normalisation fait partie de la construction
    pub candles: &'a [RawCandle],
    /// Verdict d'analyse (figures + niveaux), si chargé
    pub analysis: Option<&'a AnalysisSnapshot>,
    /// Annotations manuelles committées
    pub drawings: &'a [ManualDrawing],
    pub toggles: OverlayToggles,
    pub theme: ChartTheme,
    /// Dimensions de la zone de chart au moment de la reconstruction
    pub width: u16,
    pub height: u16,
}

/// Construit une surface neuve depuis le snapshot
///
/// Ordre de peuplement : chandelles canoniques, panneaux oscillateurs
/// (coquilles avec échelle réservée), overlays, annotations de figures,
/// dessins manuels. Aucune sortie partielle : en cas d'échec, rien n'est
/// rendu.
pub fn build(inputs: &ChartInputs) -> Result<Option<ChartSurface>, BuildError> {
    if inputs.width < MIN_BUILD_WIDTH || inputs.height < MIN_BUILD_HEIGHT {
        return Err(BuildError::SurfaceUnavailable {
            width: inputs.width,
            height: inputs.height,
        });
    }

    let candles = normalize::normalize_candles(inputs.candles, inputs.granularity);
    if candles.is_empty() {
        debug!(symbol = inputs.symbol, "No valid candles, skipping surface construction");
        return Ok(None);
    }

    // Allocation verticale : une tranche fixe par panneau demandé, la marge
    // du panneau principal en découle
    let panes = inputs.toggles.active_oscillators();
    let allocation = PaneAllocation::for_oscillators(panes.len());

    let mut surface = ChartSurface::new(
        inputs.symbol.to_string(),
        inputs.granularity,
        inputs.theme,
        inputs.width,
        inputs.height,
        candles,
        allocation,
    );

    // Coquilles de panneaux dans l'ordre de déclaration, chacune avec son
    // identifiant d'échelle ; les séries arrivent via les overlays
    for kind in panes {
        surface.oscillators.push(OscillatorPane::new(kind));
    }

    overlays::apply(&mut surface, &inputs.toggles);

    if let Some(analysis) = inputs.analysis {
        patterns::annotate(&mut surface, analysis);
    }

    surface.set_drawings(inputs.drawings.to_vec());

    debug!(
        symbol = inputs.symbol,
        granularity = inputs.granularity.label(),
        candles = surface.slot_count(),
        overlays = surface.main.series.len(),
        oscillators = surface.oscillators.len(),
        markers = surface.main.markers().len(),
        price_lines = surface.main.price_lines.len(),
        "Chart surface rebuilt"
    );

    Ok(Some(surface))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::style::OscillatorKind;
    use crate::models::analysis::EntryLevels;
    use crate::models::candle::RawTimestamp;

    fn raw_day(date: &str, open: f64, close: f64) -> RawCandle {
        RawCandle::new(
            RawTimestamp::Text(date.to_string()),
            open,
            open.max(close) + 1.0,
            open.min(close) - 1.0,
            close,
        )
    }

    fn inputs<'a>(candles: &'a [RawCandle], analysis: Option<&'a AnalysisSnapshot>) -> ChartInputs<'a> {
        ChartInputs {
            symbol: "AAPL",
            granularity: Granularity::D1,
            candles,
            analysis,
            drawings: &[],
            toggles: OverlayToggles::default(),
            theme: ChartTheme::default(),
            width: 120,
            height: 40,
        }
    }

    #[test]
    fn test_zero_size_viewport_is_retryable_error() {
        let candles = vec![raw_day("2024-01-01", 10.0, 10.5)];
        let mut bad = inputs(&candles, None);
        bad.width = 0;
        bad.height = 0;

        let result = build(&bad);
        assert!(matches!(
            result,
            Err(BuildError::SurfaceUnavailable { width: 0, height: 0 })
        ));
    }

    #[test]
    fn test_no_candles_builds_nothing_without_error() {
        // Niveaux d'entrée présents mais aucune chandelle : zéro série
        // rendue, aucune erreur
        let analysis = AnalysisSnapshot {
            entry_levels: EntryLevels {
                buy: Some(100.0),
                target: Some(120.0),
                stop: Some(90.0),
            },
            ..AnalysisSnapshot::default()
        };

        let result = build(&inputs(&[], Some(&analysis)));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_all_invalid_candles_builds_nothing() {
        let candles = vec![raw_day("pas une date", 10.0, 10.5)];
        assert!(matches!(build(&inputs(&candles, None)), Ok(None)));
    }

    #[test]
    fn test_build_creates_requested_panes_in_order() {
        let candles = vec![
            raw_day("2024-01-01", 10.0, 10.5),
            raw_day("2024-01-02", 10.5, 11.0),
        ];
        let mut with_all = inputs(&candles, None);
        with_all.toggles = OverlayToggles {
            rsi: true,
            macd: true,
            volume: true,
            ..OverlayToggles::default()
        };

        let surface = build(&with_all).unwrap().unwrap();
        let kinds: Vec<OscillatorKind> = surface.oscillators.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![OscillatorKind::Volume, OscillatorKind::Rsi, OscillatorKind::Macd]
        );
        assert_eq!(surface.allocation.oscillator_count, 3);
    }

    #[test]
    fn test_margin_follows_pane_count() {
        let candles = vec![raw_day("2024-01-01", 10.0, 10.5)];

        let mut no_panes = inputs(&candles, None);
        no_panes.toggles = OverlayToggles {
            volume: false,
            rsi: false,
            macd: false,
            ..OverlayToggles::default()
        };
        let mut one_pane = inputs(&candles, None);
        one_pane.toggles = OverlayToggles {
            volume: true,
            rsi: false,
            macd: false,
            ..OverlayToggles::default()
        };

        let flat = build(&no_panes).unwrap().unwrap();
        let stacked = build(&one_pane).unwrap().unwrap();
        assert!(flat.allocation.main_top_margin < stacked.allocation.main_top_margin);
    }

    #[test]
    fn test_drawings_copied_into_surface() {
        let candles = vec![raw_day("2024-01-01", 10.0, 10.5)];
        let drawings = vec![ManualDrawing::HorizontalLine { price: 10.2 }];
        let mut with_drawing = inputs(&candles, None);
        with_drawing.drawings = &drawings;

        let surface = build(&with_drawing).unwrap().unwrap();
        assert_eq!(surface.drawings, drawings);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let candles = vec![
            raw_day("2024-01-01", 10.0, 10.5),
            raw_day("2024-01-02", 10.5, 11.0),
        ];
        let snapshot = inputs(&candles, None);

        let first = build(&snapshot).unwrap().unwrap();
        let second = build(&snapshot).unwrap().unwrap();
        assert_eq!(first, second);
    }
}
