// ============================================================================
// Module : chart::drawing
// ============================================================================
// Machine à états des outils de dessin. Deux états seulement : Idle, et
// AwaitingSecondPoint (atteignable uniquement avec l'outil tendance, entre
// le premier et le second clic).
//
// La ligne horizontale committe dès le premier clic et ne quitte jamais
// Idle. Tout changement d'outil (bascule ou re-sélection) jette le point en
// attente et la prévisualisation : rien ne survit à une session hormis ce
// qui a été explicitement committé dans la liste.
//
// CONCEPT RUST : enum d'état + transitions par méthodes
// - L'état en attente vit DANS la variante AwaitingSecondPoint, il ne peut
//   pas exister en Idle (impossible de lire un premier point fantôme)
// ============================================================================

use tracing::debug;

use crate::models::drawing::{ChartPoint, DrawingTool, ManualDrawing};

/// État de la session de dessin en cours
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingSessionState {
    /// Aucun geste en cours
    #[default]
    Idle,
    /// Premier point de tendance posé, en attente du second
    AwaitingSecondPoint { first: ChartPoint },
}

/// Contrôleur des annotations manuelles
///
/// Possède exclusivement la liste des dessins committés et l'état de la
/// session : aucun autre composant ne les mute. La prévisualisation est
/// recopiée sur la surface vivante par le moteur, jamais persistée.
#[derive(Debug, Default)]
pub struct DrawingToolController {
    tool: DrawingTool,
    state: DrawingSessionState,
    drawings: Vec<ManualDrawing>,
    preview: Option<(ChartPoint, ChartPoint)>,
}

impl DrawingToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> DrawingTool {
        self.tool
    }

    pub fn state(&self) -> DrawingSessionState {
        self.state
    }

    /// Dessins committés, dans l'ordre de création
    pub fn drawings(&self) -> &[ManualDrawing] {
        &self.drawings
    }

    /// Segment de prévisualisation en cours (outil tendance uniquement)
    pub fn preview(&self) -> Option<(ChartPoint, ChartPoint)> {
        self.preview
    }

    /// Vrai si un geste est en cours
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, DrawingSessionState::Idle)
    }

    /// Sélectionne (ou re-sélectionne) un outil
    ///
    /// Re-sélectionner l'outil actif le désarme. Dans tous les cas le point
    /// en attente et la prévisualisation sont jetés.
    pub fn select_tool(&mut self, tool: DrawingTool) {
        if tool == self.tool {
            self.tool = DrawingTool::None;
        } else {
            self.tool = tool;
        }
        self.reset_session();
        debug!(tool = self.tool.label(), "Drawing tool changed");
    }

    /// Clic sur le chart
    ///
    /// `point` est None quand le clic ne résout aucun couple temps/prix
    /// (hors zone tracée) : le clic est ignoré, aucune transition.
    /// Retourne le dessin committé par ce clic, s'il y en a un.
    pub fn handle_click(&mut self, point: Option<ChartPoint>) -> Option<ManualDrawing> {
        let point = point?;

        match (self.tool, self.state) {
            (DrawingTool::HorizontalLine, DrawingSessionState::Idle) => {
                let drawing = ManualDrawing::HorizontalLine { price: point.price };
                self.drawings.push(drawing.clone());
                debug!(price = point.price, "Horizontal line committed");
                Some(drawing)
            }
            (DrawingTool::TrendLine, DrawingSessionState::Idle) => {
                self.state = DrawingSessionState::AwaitingSecondPoint { first: point };
                None
            }
            (DrawingTool::TrendLine, DrawingSessionState::AwaitingSecondPoint { first }) => {
                let drawing = ManualDrawing::TrendLine {
                    start: first,
                    end: point,
                };
                self.drawings.push(drawing.clone());
                self.reset_session();
                debug!(
                    from = first.price,
                    to = point.price,
                    "Trend line committed"
                );
                Some(drawing)
            }
            // Outil désarmé, ou ligne horizontale avec un point en attente
            // (état inatteignable) : rien à faire
            _ => None,
        }
    }

    /// Déplacement de la souris sur le chart
    ///
    /// Ne fait avancer que la prévisualisation : jamais de transition
    /// d'état, jamais de commit.
    pub fn handle_move(&mut self, point: Option<ChartPoint>) {
        let Some(point) = point else {
            return;
        };
        if let DrawingSessionState::AwaitingSecondPoint { first } = self.state {
            self.preview = Some((first, point));
        }
    }

    /// Vide la liste des dessins et réarme la session, quel que soit l'état
    ///
    /// Retourne le nombre de dessins supprimés (pour la barre d'état).
    pub fn clear_all(&mut self) -> usize {
        let removed = self.drawings.len();
        self.drawings.clear();
        self.reset_session();
        debug!(removed, "Manual drawings cleared");
        removed
    }

    /// Jette le geste en cours (point en attente + prévisualisation)
    pub fn reset_session(&mut self) {
        self.state = DrawingSessionState::Idle;
        self.preview = None;
    }

    /// Réinitialisation complète : outil désarmé, session vide, liste vidée
    ///
    /// Appelé quand le chart est démonté ; seuls les dessins explicitement
    /// committés auraient pu survivre, et ils appartiennent au chart démonté.
    pub fn reset(&mut self) {
        self.tool = DrawingTool::None;
        self.drawings.clear();
        self.reset_session();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candle::CanonicalTime;
    use chrono::NaiveDate;

    fn point(d: u32, price: f64) -> ChartPoint {
        ChartPoint::new(
            CanonicalTime::Day(NaiveDate::from_ymd_opt(2024, 1, d).unwrap()),
            price,
        )
    }

    #[test]
    fn test_hline_commits_on_single_click() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::HorizontalLine);

        let committed = controller.handle_click(Some(point(1, 101.5)));
        assert_eq!(
            committed,
            Some(ManualDrawing::HorizontalLine { price: 101.5 })
        );
        assert_eq!(controller.drawings().len(), 1);
        assert_eq!(controller.state(), DrawingSessionState::Idle);
    }

    #[test]
    fn test_trend_needs_two_clicks() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::TrendLine);

        // Premier clic : point en attente, rien de committé
        assert_eq!(controller.handle_click(Some(point(1, 100.0))), None);
        assert!(controller.is_pending());
        assert!(controller.drawings().is_empty());

        // Second clic : un seul TrendLine committé, retour en Idle
        let committed = controller.handle_click(Some(point(3, 110.0)));
        assert!(matches!(
            committed,
            Some(ManualDrawing::TrendLine { start, end })
                if start.price == 100.0 && end.price == 110.0
        ));
        assert_eq!(controller.drawings().len(), 1);
        assert_eq!(controller.state(), DrawingSessionState::Idle);
        assert_eq!(controller.preview(), None);
    }

    #[test]
    fn test_preview_follows_mouse() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::TrendLine);
        controller.handle_click(Some(point(1, 100.0)));

        controller.handle_move(Some(point(2, 104.0)));
        let (start, end) = controller.preview().unwrap();
        assert_eq!(start.price, 100.0);
        assert_eq!(end.price, 104.0);

        // La souris continue : la prévisualisation suit
        controller.handle_move(Some(point(3, 108.0)));
        assert_eq!(controller.preview().unwrap().1.price, 108.0);

        // Hors session, le déplacement ne fait rien
        controller.handle_click(Some(point(3, 108.0)));
        controller.handle_move(Some(point(4, 112.0)));
        assert_eq!(controller.preview(), None);
    }

    #[test]
    fn test_reselect_tool_discards_pending() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::TrendLine);
        controller.handle_click(Some(point(1, 100.0)));
        controller.handle_move(Some(point(2, 105.0)));

        // Re-sélection du même outil : désarme ET jette le point en attente
        controller.select_tool(DrawingTool::TrendLine);
        assert_eq!(controller.tool(), DrawingTool::None);
        assert_eq!(controller.state(), DrawingSessionState::Idle);
        assert_eq!(controller.preview(), None);

        // Le clic suivant ne committe rien : l'outil est désarmé
        assert_eq!(controller.handle_click(Some(point(3, 110.0))), None);
        assert!(controller.drawings().is_empty());
    }

    #[test]
    fn test_switch_tool_discards_pending() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::TrendLine);
        controller.handle_click(Some(point(1, 100.0)));

        // Bascule vers la ligne horizontale : le point en attente est jeté
        controller.select_tool(DrawingTool::HorizontalLine);
        assert_eq!(controller.state(), DrawingSessionState::Idle);

        // Et le clic suivant committe une ligne horizontale, pas une tendance
        let committed = controller.handle_click(Some(point(2, 103.0)));
        assert_eq!(
            committed,
            Some(ManualDrawing::HorizontalLine { price: 103.0 })
        );
    }

    #[test]
    fn test_unresolved_click_ignored() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::TrendLine);
        controller.handle_click(Some(point(1, 100.0)));

        // Clic hors zone tracée : ignoré, l'état ne bouge pas
        assert_eq!(controller.handle_click(None), None);
        assert!(controller.is_pending());

        controller.handle_move(None);
        assert_eq!(controller.preview(), None); // Pas de préviz fantôme
    }

    #[test]
    fn test_unarmed_click_does_nothing() {
        let mut controller = DrawingToolController::new();
        assert_eq!(controller.handle_click(Some(point(1, 100.0))), None);
        assert!(controller.drawings().is_empty());
        assert_eq!(controller.state(), DrawingSessionState::Idle);
    }

    #[test]
    fn test_clear_all_empties_and_resets() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::HorizontalLine);
        controller.handle_click(Some(point(1, 100.0)));
        controller.handle_click(Some(point(2, 105.0)));

        controller.select_tool(DrawingTool::TrendLine);
        controller.handle_click(Some(point(3, 108.0))); // Geste en cours

        assert_eq!(controller.clear_all(), 2);
        assert!(controller.drawings().is_empty());
        assert_eq!(controller.state(), DrawingSessionState::Idle);
        // L'outil reste armé : seul le geste et la liste sont vidés
        assert_eq!(controller.tool(), DrawingTool::TrendLine);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut controller = DrawingToolController::new();
        controller.select_tool(DrawingTool::HorizontalLine);
        controller.handle_click(Some(point(1, 100.0)));

        controller.reset();
        assert_eq!(controller.tool(), DrawingTool::None);
        assert!(controller.drawings().is_empty());
        assert_eq!(controller.state(), DrawingSessionState::Idle);
    }
}
