// ============================================================================
// Module : chart::patterns
// ============================================================================
// Projection du verdict d'analyse sur la surface : lignes de prix pour les
// niveaux d'entrée, polylignes pour les figures chartistes, markers sur la
// série principale.
//
// Contrat de la primitive pour les markers : UNE liste triée croissante sur
// toute la série principale, appliquée en un seul appel. On collecte donc
// tous les markers de toutes les figures, puis on filtre / trie / applique
// en bloc. Un ensemble rejeté dégrade en "pas de markers", jamais en chart
// cassé.
// ============================================================================

use tracing::{debug, warn};

use crate::chart::normalize::canonical_key;
use crate::chart::style::ChartTheme;
use crate::chart::surface::{
    ChartSurface, LinePoint, LineSeries, MarkerPosition, MarkerShape, PriceLine, SeriesMarker,
};
use crate::models::analysis::{AnalysisSnapshot, Pattern, PatternBias};
use crate::models::candle::CanonicalTime;

/// Projette niveaux d'entrée et figures sur la surface
pub fn annotate(surface: &mut ChartSurface, analysis: &AnalysisSnapshot) {
    let theme = surface.theme;

    // --- Niveaux d'entrée : jusqu'à trois lignes de prix statiques ---
    for (kind, price) in analysis.entry_levels.present() {
        if !price.is_finite() {
            warn!(level = kind.label(), "Non-finite entry level, line skipped");
            continue;
        }
        surface.main.price_lines.push(PriceLine {
            price,
            label: format!("{} {:.2}", kind.label(), price),
            style: theme.entry_style(kind),
        });
    }

    // --- Figures : polylignes + collecte des markers ---
    let mut polylines: Vec<LineSeries> = Vec::new();
    let mut markers: Vec<SeriesMarker> = Vec::new();

    for pattern in &analysis.patterns {
        let anchors = resolve_anchors(surface, pattern);
        if anchors.len() < 2 {
            // Une figure à moins de deux ancres résolues distinctes n'a pas
            // de segment à tracer : ni série, ni marker
            debug!(
                pattern = %pattern.name,
                resolved = anchors.len(),
                "Pattern lacks two resolvable anchors, skipped"
            );
            continue;
        }

        let bias = pattern.bias();
        let mut series = LineSeries::new(pattern.name.clone(), theme.pattern_style(bias));
        let points = anchors
            .iter()
            .map(|anchor| LinePoint::new(anchor.time, anchor.price))
            .collect();
        match series.set_data(points) {
            Ok(()) => polylines.push(series),
            Err(err) => {
                // Cette figure est abandonnée (markers compris), le reste
                // du chart continue
                warn!(pattern = %pattern.name, error = %err, "Pattern polyline rejected, skipped");
                continue;
            }
        }

        // Un marker par ancre ; la première porte le nom de la figure
        for (index, anchor) in anchors.iter().enumerate() {
            let label = if index == 0 {
                Some(pattern.name.clone())
            } else {
                anchor.label.clone()
            };
            markers.push(marker_at(anchor.time, bias, label, &theme));
        }
    }

    surface.main.series.extend(polylines);

    // --- Fusion des markers : tri stable croissant, application unique ---
    // Les égalités (deux figures démarrant sur la même chandelle) restent
    // dans l'ordre de collecte ; au rendu le dernier dessiné recouvre.
    markers.sort_by_key(|marker| marker.time);
    if markers.is_empty() {
        return;
    }
    let count = markers.len();
    if let Err(err) = surface.main.set_markers(markers) {
        warn!(error = %err, "Marker set rejected by surface, chart renders without markers");
    } else {
        debug!(markers = count, "Pattern markers applied");
    }
}

/// Ancre résolue : une clé canonique existant dans la série principale
struct ResolvedAnchor {
    time: CanonicalTime,
    price: f64,
    label: Option<String>,
}

/// Résout les points d'une figure vers des slots de la série principale
///
/// Un point est résolu s'il se parse, se canonise selon la granularité de
/// la surface ET tombe sur une chandelle existante. Le résultat est trié
/// chronologiquement ; deux points qui s'effondrent sur la même clé (même
/// jour en granularité journalière) ne comptent qu'une fois, premier gagnant.
fn resolve_anchors(surface: &ChartSurface, pattern: &Pattern) -> Vec<ResolvedAnchor> {
    let mut anchors: Vec<ResolvedAnchor> = pattern
        .points
        .iter()
        .filter_map(|point| {
            if !point.price.is_finite() {
                return None;
            }
            let instant = point.time.parse_instant()?;
            let key = canonical_key(instant, surface.granularity);
            surface.slot_of(key)?;
            Some(ResolvedAnchor {
                time: key,
                price: point.price,
                label: point.label.clone(),
            })
        })
        .collect();

    anchors.sort_by_key(|anchor| anchor.time);
    anchors.dedup_by_key(|anchor| anchor.time);
    anchors
}

/// Construit le marker d'une ancre selon le biais de sa figure
fn marker_at(
    time: CanonicalTime,
    bias: PatternBias,
    label: Option<String>,
    theme: &ChartTheme,
) -> SeriesMarker {
    let (position, shape) = match bias {
        PatternBias::Bullish => (MarkerPosition::BelowBar, MarkerShape::ArrowUp),
        PatternBias::Bearish => (MarkerPosition::AboveBar, MarkerShape::ArrowDown),
        PatternBias::Neutral => (MarkerPosition::AboveBar, MarkerShape::Circle),
    };
    SeriesMarker {
        time,
        position,
        shape,
        color: theme.bias_color(bias),
        label,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
