// ============================================================================
// Structures : DrawingTool / ChartPoint / ManualDrawing
// ============================================================================
// Annotations dessinées à la souris par l'utilisateur. Elles vivent dans la
// liste en mémoire du contrôleur de dessin (chart::drawing) et ne sont
// jamais persistées : une session, un chart.
// ============================================================================

use crate::models::candle::CanonicalTime;

/// Outil de dessin actif
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingTool {
    /// Aucun outil : la souris ne dessine pas
    #[default]
    None,
    /// Ligne horizontale : un clic = une ligne au prix cliqué
    HorizontalLine,
    /// Ligne de tendance : deux clics, avec prévisualisation entre les deux
    TrendLine,
}

impl DrawingTool {
    /// Label pour la barre d'état
    pub fn label(&self) -> &'static str {
        match self {
            DrawingTool::None => "aucun",
            DrawingTool::HorizontalLine => "ligne horizontale",
            DrawingTool::TrendLine => "ligne de tendance",
        }
    }

    /// Raccourci clavier associé
    pub fn shortcut(&self) -> Option<char> {
        match self {
            DrawingTool::None => None,
            DrawingTool::HorizontalLine => Some('h'),
            DrawingTool::TrendLine => Some('t'),
        }
    }

    /// Vrai si un outil de dessin est armé
    pub fn is_armed(&self) -> bool {
        !matches!(self, DrawingTool::None)
    }
}

/// Un point du chart : clé temporelle canonique + prix
///
/// Produit par le hit-testing de la surface (position souris → point) ;
/// un clic hors de la zone tracée ne produit pas de ChartPoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    /// Clé temporelle de la chandelle sous le curseur
    pub time: CanonicalTime,
    /// Prix à la hauteur du curseur
    pub price: f64,
}

impl ChartPoint {
    pub fn new(time: CanonicalTime, price: f64) -> Self {
        Self { time, price }
    }
}

/// Une annotation manuelle committée
///
/// CONCEPT RUST : enum à variantes structurées
/// - Chaque variante porte exactement les données de sa géométrie
/// - Le match du rendu est exhaustif : ajouter un outil force à traiter
///   son rendu
#[derive(Debug, Clone, PartialEq)]
pub enum ManualDrawing {
    /// Ligne horizontale à prix fixe, sur toute la largeur
    HorizontalLine { price: f64 },
    /// Segment entre deux points datés
    TrendLine { start: ChartPoint, end: ChartPoint },
}

impl ManualDrawing {
    /// Description courte pour la barre d'état et les logs
    pub fn label(&self) -> String {
        match self {
            ManualDrawing::HorizontalLine { price } => {
                format!("ligne @ {:.2}", price)
            }
            ManualDrawing::TrendLine { start, end } => {
                format!("tendance {:.2} → {:.2}", start.price, end.price)
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_tool_default_is_none() {
        assert_eq!(DrawingTool::default(), DrawingTool::None);
        assert!(!DrawingTool::None.is_armed());
        assert!(DrawingTool::TrendLine.is_armed());
    }

    #[test]
    fn test_tool_shortcuts() {
        assert_eq!(DrawingTool::HorizontalLine.shortcut(), Some('h'));
        assert_eq!(DrawingTool::TrendLine.shortcut(), Some('t'));
        assert_eq!(DrawingTool::None.shortcut(), None);
    }

    #[test]
    fn test_drawing_labels() {
        let hline = ManualDrawing::HorizontalLine { price: 101.5 };
        assert_eq!(hline.label(), "ligne @ 101.50");

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let trend = ManualDrawing::TrendLine {
            start: ChartPoint::new(CanonicalTime::Day(day), 100.0),
            end: ChartPoint::new(CanonicalTime::Day(day.succ_opt().unwrap()), 110.0),
        };
        assert_eq!(trend.label(), "tendance 100.00 → 110.00");
    }
}
