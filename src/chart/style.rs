// ============================================================================
// Module : chart::style
// ============================================================================
// Thème et toggles d'overlays : la configuration immuable passée au
// compositeur à chaque reconstruction. Aucun état global : qui veut changer
// une couleur ou un toggle fournit une nouvelle config et reconstruit.
//
// CONCEPT RUST : Copy pour la config
// - ChartTheme et OverlayToggles sont de petites structs Copy
// - Les passer par valeur évite toute mutation partagée cachée
// ============================================================================

use ratatui::style::Color;

use crate::models::analysis::{EntryLevelKind, PatternBias};
use crate::models::candle::IndicatorKey;

// ----------------------------------------------------------------------------
// Couleurs du thème (défaut sombre)
// ----------------------------------------------------------------------------
const BULLISH_COLOR: Color = Color::Rgb(52, 208, 88); // Vert
const BEARISH_COLOR: Color = Color::Rgb(234, 74, 90); // Rouge
const NEUTRAL_COLOR: Color = Color::Rgb(120, 140, 160); // Gris bleuté
const SMA20_COLOR: Color = Color::Rgb(255, 152, 0); // Orange
const SMA50_COLOR: Color = Color::Rgb(156, 39, 176); // Violet
const EMA20_COLOR: Color = Color::Rgb(0, 188, 212); // Cyan
const BAND_COLOR: Color = Color::Rgb(110, 110, 130); // Gris (paire Bollinger)
const MACD_COLOR: Color = Color::Rgb(66, 165, 245); // Bleu
const MACD_SIGNAL_COLOR: Color = Color::Rgb(255, 112, 67); // Orange foncé
const RSI_COLOR: Color = Color::Rgb(171, 71, 188); // Violet clair
const DRAWING_COLOR: Color = Color::Rgb(255, 213, 79); // Jaune
const PREVIEW_COLOR: Color = Color::Rgb(255, 241, 118); // Jaune pâle
const AXIS_COLOR: Color = Color::DarkGray;

/// Type de trait d'une série ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Trait continu
    Solid,
    /// Trait discontinu (une cellule sur deux)
    Dashed,
}

/// Style visuel d'une série ligne
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    /// Couleur de la série
    pub color: Color,
    /// Continu ou discontinu
    pub line: LineKind,
    /// Rendu atténué (DIM) pour les paires de bandes
    pub dimmed: bool,
}

impl SeriesStyle {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            line: LineKind::Solid,
            dimmed: false,
        }
    }

    pub fn dashed(color: Color) -> Self {
        Self {
            color,
            line: LineKind::Dashed,
            dimmed: false,
        }
    }

    pub fn dashed_dim(color: Color) -> Self {
        Self {
            color,
            line: LineKind::Dashed,
            dimmed: true,
        }
    }
}

/// Panneau oscillateur disponible
///
/// L'ordre de déclaration (Volume, Rsi, Macd) est l'ordre d'empilement des
/// panneaux : chaque panneau actif consomme une tranche verticale fixe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorKind {
    /// Histogramme de volume
    Volume,
    /// RSI 14 (échelle fixe 0..100, guides 30/70)
    Rsi,
    /// MACD + ligne de signal
    Macd,
}

impl OscillatorKind {
    /// Titre du panneau
    pub fn label(&self) -> &'static str {
        match self {
            OscillatorKind::Volume => "Volume",
            OscillatorKind::Rsi => "RSI 14",
            OscillatorKind::Macd => "MACD",
        }
    }

    /// Identifiant d'échelle, distinct par panneau
    ///
    /// Deux panneaux ne partagent jamais une échelle : chaque identifiant
    /// isole son propre range de valeurs.
    pub fn scale_id(&self) -> &'static str {
        match self {
            OscillatorKind::Volume => "scale-volume",
            OscillatorKind::Rsi => "scale-rsi",
            OscillatorKind::Macd => "scale-macd",
        }
    }
}

/// Toggles d'overlays et de panneaux
///
/// CONCEPT : Configuration déclarative
/// - L'utilisateur déclare ce qu'il veut voir, le compositeur reconstruit
/// - Pas de méthode "ajouter une série au chart existant"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayToggles {
    /// Moyenne mobile simple 20 périodes
    pub sma_20: bool,
    /// Moyenne mobile simple 50 périodes
    pub sma_50: bool,
    /// Moyenne mobile exponentielle 20 périodes
    pub ema_20: bool,
    /// Paire de bandes de Bollinger
    pub bollinger: bool,
    /// Panneau RSI
    pub rsi: bool,
    /// Panneau MACD
    pub macd: bool,
    /// Panneau volume
    pub volume: bool,
}

impl Default for OverlayToggles {
    /// Défaut aligné sur le chart d'analyse : SMA 20/50, Bollinger, volume
    fn default() -> Self {
        Self {
            sma_20: true,
            sma_50: true,
            ema_20: false,
            bollinger: true,
            rsi: false,
            macd: false,
            volume: true,
        }
    }
}

impl OverlayToggles {
    /// Panneaux oscillateurs actifs, dans l'ordre d'empilement
    pub fn active_oscillators(&self) -> Vec<OscillatorKind> {
        let mut panes = Vec::new();
        if self.volume {
            panes.push(OscillatorKind::Volume);
        }
        if self.rsi {
            panes.push(OscillatorKind::Rsi);
        }
        if self.macd {
            panes.push(OscillatorKind::Macd);
        }
        panes
    }
}

/// Thème du chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartTheme {
    /// Chandelle haussière
    pub bullish: Color,
    /// Chandelle baissière
    pub bearish: Color,
    /// Neutre (figures indécises, texte secondaire)
    pub neutral: Color,
    /// Axes et graduations
    pub axis: Color,
    /// Annotations manuelles committées
    pub drawing: Color,
    /// Prévisualisation de tendance en cours
    pub preview: Color,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            bullish: BULLISH_COLOR,
            bearish: BEARISH_COLOR,
            neutral: NEUTRAL_COLOR,
            axis: AXIS_COLOR,
            drawing: DRAWING_COLOR,
            preview: PREVIEW_COLOR,
        }
    }
}

impl ChartTheme {
    /// Couleur associée à un biais directionnel
    pub fn bias_color(&self, bias: PatternBias) -> Color {
        match bias {
            PatternBias::Bullish => self.bullish,
            PatternBias::Bearish => self.bearish,
            PatternBias::Neutral => self.neutral,
        }
    }

    /// Style d'un overlay du panneau principal
    ///
    /// Convention fixe : trait continu et couleur distincte par moyenne
    /// mobile, trait discontinu atténué partagé par la paire de bandes.
    pub fn overlay_style(&self, key: IndicatorKey) -> SeriesStyle {
        match key {
            IndicatorKey::Sma20 => SeriesStyle::solid(SMA20_COLOR),
            IndicatorKey::Sma50 => SeriesStyle::solid(SMA50_COLOR),
            IndicatorKey::Ema20 => SeriesStyle::solid(EMA20_COLOR),
            IndicatorKey::BbUpper | IndicatorKey::BbLower => SeriesStyle::dashed_dim(BAND_COLOR),
            IndicatorKey::Rsi14 => SeriesStyle::solid(RSI_COLOR),
            IndicatorKey::Macd => SeriesStyle::solid(MACD_COLOR),
            IndicatorKey::MacdSignal => SeriesStyle::solid(MACD_SIGNAL_COLOR),
        }
    }

    /// Style d'une ligne de niveau d'entrée
    pub fn entry_style(&self, kind: EntryLevelKind) -> SeriesStyle {
        match kind {
            EntryLevelKind::Buy => SeriesStyle::dashed(self.bullish),
            EntryLevelKind::Target => SeriesStyle::dashed(self.bearish),
            EntryLevelKind::Stop => SeriesStyle::dashed_dim(self.neutral),
        }
    }

    /// Style d'une figure chartiste selon son biais
    pub fn pattern_style(&self, bias: PatternBias) -> SeriesStyle {
        SeriesStyle::dashed(self.bias_color(bias))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_oscillators_order() {
        let toggles = OverlayToggles {
            rsi: true,
            macd: true,
            volume: true,
            ..OverlayToggles::default()
        };

        // Ordre d'empilement fixe : volume, puis RSI, puis MACD
        assert_eq!(
            toggles.active_oscillators(),
            vec![OscillatorKind::Volume, OscillatorKind::Rsi, OscillatorKind::Macd]
        );
    }

    #[test]
    fn test_scale_ids_distinct() {
        let ids = [
            OscillatorKind::Volume.scale_id(),
            OscillatorKind::Rsi.scale_id(),
            OscillatorKind::Macd.scale_id(),
        ];
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                assert_ne!(ids[i], ids[j]);
            }
        }
    }

    #[test]
    fn test_band_pair_shares_style() {
        let theme = ChartTheme::default();
        assert_eq!(
            theme.overlay_style(IndicatorKey::BbUpper),
            theme.overlay_style(IndicatorKey::BbLower)
        );
        assert_eq!(
            theme.overlay_style(IndicatorKey::BbUpper).line,
            LineKind::Dashed
        );
        assert!(theme.overlay_style(IndicatorKey::BbUpper).dimmed);
    }

    #[test]
    fn test_moving_averages_distinct_colors() {
        let theme = ChartTheme::default();
        let sma20 = theme.overlay_style(IndicatorKey::Sma20);
        let sma50 = theme.overlay_style(IndicatorKey::Sma50);
        assert_ne!(sma20.color, sma50.color);
        assert_eq!(sma20.line, LineKind::Solid);
        assert_eq!(sma50.line, LineKind::Solid);
    }
}
