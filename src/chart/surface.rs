// ============================================================================
// Module : chart::surface
// ============================================================================
// La surface de chart : scène retenue que le compositeur construit et que
// l'UI dessine à chaque frame. Elle joue le rôle de la primitive de rendu
// et en garde les contrats stricts :
//
// - une série ligne n'accepte que des points STRICTEMENT croissants en clé
//   canonique, une valeur par slot ;
// - les markers forment UNE liste triée croissante (égalités permises),
//   appliquée en un seul appel.
//
// Toute violation est une erreur typée : l'appelant dégrade (série ou
// markers ignorés) au lieu de dessiner un état incohérent.
//
// CONCEPT RUST : encapsulation par visibilité
// - Les Vec de points sont privés, remplis uniquement via set_data /
//   set_markers qui valident le contrat
// ============================================================================

use thiserror::Error;

use crate::chart::style::{ChartTheme, OscillatorKind, SeriesStyle};
use crate::models::candle::{Candle, CanonicalTime};
use crate::models::drawing::{ChartPoint, ManualDrawing};
use crate::models::granularity::Granularity;
use ratatui::style::Color;

/// Tranche verticale consommée par chaque panneau oscillateur (fraction de
/// la hauteur totale du chart)
const OSCILLATOR_SLICE: f64 = 0.18;

/// Marge haute maximale réservable au-dessus du panneau principal
const MAX_TOP_MARGIN: f64 = 0.60;

/// Violations du contrat de la surface
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    /// Points non triés dans une série ligne
    #[error("série '{name}' : points non triés (index {index})")]
    UnsortedSeries { name: String, index: usize },

    /// Clé temporelle dupliquée dans une série (une valeur par slot)
    #[error("série '{name}' : clé temporelle dupliquée (index {index})")]
    DuplicateTime { name: String, index: usize },

    /// Liste de markers non triée croissante
    #[error("markers non triés (index {index})")]
    UnsortedMarkers { index: usize },
}

/// Un point d'une série ligne
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub time: CanonicalTime,
    pub value: f64,
}

impl LinePoint {
    pub fn new(time: CanonicalTime, value: f64) -> Self {
        Self { time, value }
    }
}

/// Une série ligne (overlay, oscillateur ou polyligne de figure)
///
/// Les points consécutifs sont reliés par des segments au rendu : une
/// polyligne clairsemée (3 ancres de figure) et un overlay dense (une valeur
/// par chandelle) passent par le même type.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    /// Nom pour légende et logs
    pub name: String,
    /// Style visuel
    pub style: SeriesStyle,
    points: Vec<LinePoint>,
}

impl LineSeries {
    pub fn new(name: impl Into<String>, style: SeriesStyle) -> Self {
        Self {
            name: name.into(),
            style,
            points: Vec::new(),
        }
    }

    /// Remplace les données de la série
    ///
    /// Contrat de la primitive : clés strictement croissantes, une valeur
    /// par slot. En cas de violation la série reste vide et l'erreur remonte
    /// à l'appelant, qui décide de dégrader.
    pub fn set_data(&mut self, points: Vec<LinePoint>) -> Result<(), SurfaceError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(SurfaceError::UnsortedSeries {
                    name: self.name.clone(),
                    index: index + 1,
                });
            }
            if pair[1].time == pair[0].time {
                return Err(SurfaceError::DuplicateTime {
                    name: self.name.clone(),
                    index: index + 1,
                });
            }
        }
        self.points = points;
        Ok(())
    }

    pub fn points(&self) -> &[LinePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Un point d'histogramme (volume), avec sa couleur propre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramPoint {
    pub time: CanonicalTime,
    pub value: f64,
    pub color: Color,
}

/// Une série histogramme (barres par slot)
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub name: String,
    points: Vec<HistogramPoint>,
}

impl HistogramSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Même contrat que les séries ligne : croissant strict, unique
    pub fn set_data(&mut self, points: Vec<HistogramPoint>) -> Result<(), SurfaceError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(SurfaceError::UnsortedSeries {
                    name: self.name.clone(),
                    index: index + 1,
                });
            }
            if pair[1].time == pair[0].time {
                return Err(SurfaceError::DuplicateTime {
                    name: self.name.clone(),
                    index: index + 1,
                });
            }
        }
        self.points = points;
        Ok(())
    }

    pub fn points(&self) -> &[HistogramPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ligne de prix horizontale statique (niveau d'entrée, dessin manuel)
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLine {
    pub price: f64,
    pub label: String,
    pub style: SeriesStyle,
}

/// Position d'un marker par rapport à sa chandelle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
}

/// Forme d'un marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
    Circle,
}

/// Un marker : annotation ponctuelle attachée à une clé temporelle de la
/// série principale
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMarker {
    pub time: CanonicalTime,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: Color,
    /// Label affiché à côté du marker (nom de figure pour le premier point)
    pub label: Option<String>,
}

/// Le panneau principal : chandelles + overlays + figures + lignes de prix
/// + markers
#[derive(Debug, Clone, PartialEq)]
pub struct MainPane {
    /// Chandelles canoniques (la série principale)
    pub candles: Vec<Candle>,
    /// Séries lignes : overlays d'indicateurs et polylignes de figures
    pub series: Vec<LineSeries>,
    /// Lignes de prix statiques
    pub price_lines: Vec<PriceLine>,
    markers: Vec<SeriesMarker>,
}

impl MainPane {
    fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            series: Vec::new(),
            price_lines: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Applique la liste complète des markers en un seul appel
    ///
    /// Contrat de la primitive : liste triée croissante sur TOUTE la série
    /// principale. Les égalités sont permises (plusieurs figures peuvent
    /// démarrer sur la même chandelle) ; l'ordre d'application des égalités
    /// est celui de la liste.
    pub fn set_markers(&mut self, markers: Vec<SeriesMarker>) -> Result<(), SurfaceError> {
        for (index, pair) in markers.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(SurfaceError::UnsortedMarkers { index: index + 1 });
            }
        }
        self.markers = markers;
        Ok(())
    }

    pub fn markers(&self) -> &[SeriesMarker] {
        &self.markers
    }
}

/// Un panneau oscillateur : série(s) avec sa propre échelle
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorPane {
    pub kind: OscillatorKind,
    /// Identifiant d'échelle, distinct par panneau (les ranges de valeurs
    /// ne doivent jamais interférer)
    pub scale_id: &'static str,
    /// Séries lignes (RSI, MACD + signal)
    pub lines: Vec<LineSeries>,
    /// Histogramme (volume)
    pub histogram: Option<HistogramSeries>,
    /// Bornes fixes de l'échelle (RSI : 0..100), sinon auto
    pub fixed_bounds: Option<(f64, f64)>,
    /// Lignes guides horizontales (RSI : 30 et 70)
    pub guides: Vec<f64>,
}

impl OscillatorPane {
    pub fn new(kind: OscillatorKind) -> Self {
        let (fixed_bounds, guides) = match kind {
            OscillatorKind::Rsi => (Some((0.0, 100.0)), vec![30.0, 70.0]),
            _ => (None, Vec::new()),
        };
        Self {
            kind,
            scale_id: kind.scale_id(),
            lines: Vec::new(),
            histogram: None,
            fixed_bounds,
            guides,
        }
    }

    /// Bornes de valeurs du panneau (fixes ou déduites des séries)
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        if let Some(bounds) = self.fixed_bounds {
            return Some(bounds);
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for series in &self.lines {
            for point in series.points() {
                min = min.min(point.value);
                max = max.max(point.value);
            }
        }
        if let Some(histogram) = &self.histogram {
            for point in histogram.points() {
                min = min.min(point.value.min(0.0));
                max = max.max(point.value);
            }
        }

        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

/// Allocation verticale des panneaux, recalculée à chaque reconstruction
///
/// Chaque panneau oscillateur consomme une tranche fixe, empilée depuis le
/// haut dans l'ordre de déclaration ; le panneau principal reçoit le reste.
/// La marge haute réservée est donc monotone croissante avec le nombre de
/// panneaux.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneAllocation {
    /// Nombre de panneaux oscillateurs demandés
    pub oscillator_count: usize,
    /// Fraction de hauteur réservée au-dessus du panneau principal
    pub main_top_margin: f64,
}

impl PaneAllocation {
    pub fn for_oscillators(count: usize) -> Self {
        let margin = (count as f64 * OSCILLATOR_SLICE).min(MAX_TOP_MARGIN);
        Self {
            oscillator_count: count,
            main_top_margin: margin,
        }
    }

    /// Bande verticale (fractions top..bottom) du panneau oscillateur i
    pub fn oscillator_band(&self, index: usize) -> (f64, f64) {
        let slice = if self.oscillator_count == 0 {
            0.0
        } else {
            self.main_top_margin / self.oscillator_count as f64
        };
        let top = index as f64 * slice;
        (top, top + slice)
    }

    /// Bande verticale du panneau principal
    pub fn main_band(&self) -> (f64, f64) {
        (self.main_top_margin, 1.0)
    }
}

/// La surface de chart complète, produite par une reconstruction
///
/// Entièrement jetable : la prochaine reconstruction en produit une
/// nouvelle, l'ancienne est drop. Aucun handler ne garde de référence
/// dessus entre deux reconstructions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSurface {
    pub symbol: String,
    pub granularity: Granularity,
    pub theme: ChartTheme,
    /// Dimensions du viewport au moment de la construction
    pub width: u16,
    pub height: u16,
    pub allocation: PaneAllocation,
    pub main: MainPane,
    pub oscillators: Vec<OscillatorPane>,
    /// Annotations manuelles committées (copie du contrôleur de dessin)
    pub drawings: Vec<ManualDrawing>,
    /// Prévisualisation de tendance en cours (jamais persistée)
    preview: Option<(ChartPoint, ChartPoint)>,
}

impl ChartSurface {
    pub fn new(
        symbol: String,
        granularity: Granularity,
        theme: ChartTheme,
        width: u16,
        height: u16,
        candles: Vec<Candle>,
        allocation: PaneAllocation,
    ) -> Self {
        Self {
            symbol,
            granularity,
            theme,
            width,
            height,
            allocation,
            main: MainPane::new(candles),
            oscillators: Vec::new(),
            drawings: Vec::new(),
            preview: None,
        }
    }

    /// Nombre de slots temporels (un par chandelle canonique)
    pub fn slot_count(&self) -> usize {
        self.main.candles.len()
    }

    /// Index du slot d'une clé canonique, si elle existe dans la série
    ///
    /// Les chandelles sont strictement croissantes : recherche binaire.
    pub fn slot_of(&self, time: CanonicalTime) -> Option<usize> {
        self.main
            .candles
            .binary_search_by(|candle| candle.time.cmp(&time))
            .ok()
    }

    /// Clé canonique du slot d'index donné
    pub fn time_at(&self, slot: usize) -> Option<CanonicalTime> {
        self.main.candles.get(slot).map(|c| c.time)
    }

    /// Panneau oscillateur d'un type donné, s'il a été alloué
    pub fn oscillator_mut(&mut self, kind: OscillatorKind) -> Option<&mut OscillatorPane> {
        self.oscillators.iter_mut().find(|pane| pane.kind == kind)
    }

    /// Bornes de prix du panneau principal
    ///
    /// Chandelles et séries lignes comprises (une figure qui dépasse le
    /// range des chandelles reste visible) ; lignes de prix et dessins
    /// manuels exclus, comme la primitive d'origine.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for candle in &self.main.candles {
            min = min.min(candle.low);
            max = max.max(candle.high);
        }
        for series in &self.main.series {
            for point in series.points() {
                min = min.min(point.value);
                max = max.max(point.value);
            }
        }

        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }

    /// Remplace les annotations manuelles affichées
    pub fn set_drawings(&mut self, drawings: Vec<ManualDrawing>) {
        self.drawings = drawings;
    }

    /// Met à jour (ou efface) la prévisualisation de tendance
    ///
    /// Seule mutation autorisée sur une surface vivante : la
    /// prévisualisation suit la souris sans reconstruction.
    pub fn set_preview(&mut self, preview: Option<(ChartPoint, ChartPoint)>) {
        self.preview = preview;
    }

    pub fn preview(&self) -> Option<(ChartPoint, ChartPoint)> {
        self.preview
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::style::SeriesStyle;
    use chrono::NaiveDate;
    use ratatui::style::Color;

    fn day(d: u32) -> CanonicalTime {
        CanonicalTime::Day(NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
    }

    fn style() -> SeriesStyle {
        SeriesStyle::solid(Color::White)
    }

    fn surface_with_candles(days: &[u32]) -> ChartSurface {
        let candles = days
            .iter()
            .map(|d| Candle::new(day(*d), 10.0, 11.0, 9.0, 10.5))
            .collect();
        ChartSurface::new(
            "AAPL".to_string(),
            Granularity::D1,
            ChartTheme::default(),
            120,
            40,
            candles,
            PaneAllocation::for_oscillators(0),
        )
    }

    #[test]
    fn test_series_accepts_sorted() {
        let mut series = LineSeries::new("SMA 20", style());
        let points = vec![
            LinePoint::new(day(1), 10.0),
            LinePoint::new(day(2), 10.5),
            LinePoint::new(day(3), 11.0),
        ];
        assert!(series.set_data(points).is_ok());
        assert_eq!(series.points().len(), 3);
    }

    #[test]
    fn test_series_rejects_unsorted() {
        let mut series = LineSeries::new("SMA 20", style());
        let result = series.set_data(vec![
            LinePoint::new(day(2), 10.5),
            LinePoint::new(day(1), 10.0),
        ]);
        assert!(matches!(result, Err(SurfaceError::UnsortedSeries { .. })));
        assert!(series.is_empty()); // La série reste vide
    }

    #[test]
    fn test_series_rejects_duplicate_key() {
        let mut series = LineSeries::new("SMA 20", style());
        let result = series.set_data(vec![
            LinePoint::new(day(1), 10.0),
            LinePoint::new(day(1), 10.5),
        ]);
        assert!(matches!(result, Err(SurfaceError::DuplicateTime { .. })));
    }

    #[test]
    fn test_markers_allow_equal_times() {
        let mut surface = surface_with_candles(&[1, 2, 3]);
        let marker = |d: u32, label: Option<&str>| SeriesMarker {
            time: day(d),
            position: MarkerPosition::BelowBar,
            shape: MarkerShape::ArrowUp,
            color: Color::Green,
            label: label.map(String::from),
        };

        // Deux figures démarrent le même jour : égalité permise
        let markers = vec![marker(1, Some("Double Bottom")), marker(1, Some("Hammer")), marker(2, None)];
        assert!(surface.main.set_markers(markers).is_ok());
        assert_eq!(surface.main.markers().len(), 3);
    }

    #[test]
    fn test_markers_reject_descending() {
        let mut surface = surface_with_candles(&[1, 2, 3]);
        let marker = |d: u32| SeriesMarker {
            time: day(d),
            position: MarkerPosition::AboveBar,
            shape: MarkerShape::Circle,
            color: Color::Gray,
            label: None,
        };

        let result = surface.main.set_markers(vec![marker(2), marker(1)]);
        assert!(matches!(result, Err(SurfaceError::UnsortedMarkers { index: 1 })));
        assert!(surface.main.markers().is_empty());
    }

    #[test]
    fn test_allocation_monotonic() {
        // La marge haute réservée croît avec le nombre de panneaux
        let mut previous = -1.0;
        for count in 0..=3 {
            let allocation = PaneAllocation::for_oscillators(count);
            assert!(allocation.main_top_margin > previous);
            previous = allocation.main_top_margin;
        }
        assert_eq!(PaneAllocation::for_oscillators(0).main_top_margin, 0.0);
    }

    #[test]
    fn test_allocation_bands_stack_in_order() {
        let allocation = PaneAllocation::for_oscillators(2);
        let (top0, bottom0) = allocation.oscillator_band(0);
        let (top1, bottom1) = allocation.oscillator_band(1);
        let (main_top, main_bottom) = allocation.main_band();

        assert_eq!(top0, 0.0);
        assert_eq!(bottom0, top1); // Empilés sans trou
        assert_eq!(bottom1, main_top); // Le principal commence sous le dernier
        assert_eq!(main_bottom, 1.0);
    }

    #[test]
    fn test_slot_lookup() {
        let surface = surface_with_candles(&[1, 3, 5]);
        assert_eq!(surface.slot_of(day(3)), Some(1));
        assert_eq!(surface.slot_of(day(2)), None); // Pas une chandelle
        assert_eq!(surface.time_at(2), Some(day(5)));
        assert_eq!(surface.time_at(9), None);
    }

    #[test]
    fn test_price_bounds_include_series() {
        let mut surface = surface_with_candles(&[1, 2]);
        // Chandelles : 9.0 .. 11.0
        assert_eq!(surface.price_bounds(), Some((9.0, 11.0)));

        // Une figure qui dépasse le range des chandelles l'étend
        let mut series = LineSeries::new("Double Top", style());
        series
            .set_data(vec![LinePoint::new(day(1), 8.0), LinePoint::new(day(2), 12.5)])
            .unwrap();
        surface.main.series.push(series);
        assert_eq!(surface.price_bounds(), Some((8.0, 12.5)));
    }

    #[test]
    fn test_rsi_pane_fixed_bounds() {
        let pane = OscillatorPane::new(OscillatorKind::Rsi);
        assert_eq!(pane.value_bounds(), Some((0.0, 100.0)));
        assert_eq!(pane.guides, vec![30.0, 70.0]);
        assert_eq!(pane.scale_id, "scale-rsi");
    }

    #[test]
    fn test_empty_pane_has_no_bounds() {
        let pane = OscillatorPane::new(OscillatorKind::Macd);
        assert_eq!(pane.value_bounds(), None);
    }
}
