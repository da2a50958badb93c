// ============================================================================
// Module : chart
// ============================================================================
// Le moteur de chart : normalisation des chandelles, composition de la
// surface, overlays d'indicateurs, annotations d'analyse, dessin manuel et
// suivi du viewport.
//
// Discipline de reconstruction : la surface est un instantané jetable.
// Chaque changement de dépendance (données, toggles, dessins, viewport)
// invalide l'instantané courant et en reconstruit un complet depuis les
// entrées. Jamais de retouche incrémentale d'une surface vivante, à une
// exception près : la prévisualisation de tendance, qui suit la souris.
// ============================================================================

pub mod compositor;
pub mod drawing;
pub mod normalize;
pub mod overlays;
pub mod patterns;
pub mod style;
pub mod surface;
pub mod viewport;

pub use compositor::{build, BuildError, ChartInputs};
pub use drawing::{DrawingSessionState, DrawingToolController};
pub use normalize::normalize_candles;
pub use style::{ChartTheme, OscillatorKind, OverlayToggles};
pub use surface::ChartSurface;
pub use viewport::ViewportController;

use tracing::{info, warn};

use crate::models::analysis::AnalysisSnapshot;
use crate::models::candle::RawCandle;
use crate::models::drawing::{ChartPoint, DrawingTool};
use crate::models::granularity::Granularity;

/// État courant du chart
///
/// CONCEPT RUST : enum d'état plutôt que Option + booléens
/// - Ready porte la surface, Failed porte le message : impossible d'avoir
///   à la fois une surface et une erreur
#[derive(Debug, Default)]
pub enum ChartState {
    /// Rien à afficher (pas de données, ou surface invalidée)
    #[default]
    Empty,
    /// Surface construite, prête au rendu
    Ready(ChartSurface),
    /// La construction a échoué ; message court pour l'utilisateur.
    /// Réessayable : la prochaine invalidation relance une construction.
    Failed(String),
}

/// Le moteur de chart complet
///
/// Possède les toggles, le thème, le contrôleur de dessin, le viewport et
/// l'état courant. Le flux est toujours le même : une mutation marque le
/// moteur à reconstruire, la boucle applicative appelle rebuild une fois
/// par itération au plus.
#[derive(Debug, Default)]
pub struct ChartEngine {
    pub toggles: OverlayToggles,
    pub theme: ChartTheme,
    pub drawing: DrawingToolController,
    pub viewport: ViewportController,
    state: ChartState,
    dirty: bool,
}

impl ChartEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Surface courante, si le chart est prêt
    pub fn surface(&self) -> Option<&ChartSurface> {
        match &self.state {
            ChartState::Ready(surface) => Some(surface),
            _ => None,
        }
    }

    /// Marque le moteur à reconstruire (données ou toggles changés)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Vrai si une reconstruction est due
    ///
    /// Absorbe l'invalidation du viewport. L'appelant qui reçoit vrai doit
    /// appeler rebuild dans la même itération de boucle.
    pub fn needs_rebuild(&mut self) -> bool {
        if self.viewport.take_dirty() {
            self.dirty = true;
        }
        self.dirty
    }

    /// Reconstruction complète depuis l'instantané d'entrées
    ///
    /// L'état courant est invalidé AVANT de construire : aucun handler ne
    /// peut écrire dans l'ancienne surface pendant la construction, et un
    /// échec ne laisse jamais un chart partiel.
    pub fn rebuild(
        &mut self,
        symbol: &str,
        granularity: Granularity,
        candles: &[RawCandle],
        analysis: Option<&AnalysisSnapshot>,
    ) {
        self.dirty = false;
        self.state = ChartState::Empty;

        let (width, height) = self.viewport.dimensions();
        let inputs = ChartInputs {
            symbol,
            granularity,
            candles,
            analysis,
            drawings: self.drawing.drawings(),
            toggles: self.toggles,
            theme: self.theme,
            width,
            height,
        };

        self.state = match compositor::build(&inputs) {
            Ok(Some(mut surface)) => {
                // Le geste en cours survit à la reconstruction : la
                // prévisualisation est recopiée sur la surface neuve
                surface.set_preview(self.drawing.preview());
                info!(symbol, granularity = granularity.label(), "Chart rebuilt");
                ChartState::Ready(surface)
            }
            Ok(None) => ChartState::Empty,
            Err(err) => {
                warn!(symbol, error = %err, "Chart construction failed");
                ChartState::Failed(err.to_string())
            }
        };
    }

    /// Démonte le chart courant
    ///
    /// Appelé en quittant la vue chart ou en changeant de symbole : la
    /// surface est jetée et les annotations manuelles ne survivent pas.
    pub fn teardown(&mut self) {
        self.state = ChartState::Empty;
        self.drawing.reset();
        self.dirty = false;
    }

    /// Sélection d'un outil de dessin (raccourci clavier)
    ///
    /// Le geste en cours est jeté ; la prévisualisation disparaît de la
    /// surface vivante sans reconstruction.
    pub fn select_tool(&mut self, tool: DrawingTool) {
        self.drawing.select_tool(tool);
        if let ChartState::Ready(surface) = &mut self.state {
            surface.set_preview(None);
        }
    }

    /// Clic souris résolu sur le chart (None hors zone tracée)
    pub fn handle_chart_click(&mut self, point: Option<ChartPoint>) {
        if let Some(drawing) = self.drawing.handle_click(point) {
            info!(drawing = %drawing.label(), "Drawing committed");
            // Le dessin committé entre dans la prochaine surface
            self.dirty = true;
        }
        // Commit ou changement de geste : la préviz courante est recopiée
        if let ChartState::Ready(surface) = &mut self.state {
            surface.set_preview(self.drawing.preview());
        }
    }

    /// Déplacement souris sur le chart
    ///
    /// Seule la prévisualisation bouge : jamais de reconstruction par
    /// mouvement de souris.
    pub fn handle_chart_move(&mut self, point: Option<ChartPoint>) {
        self.drawing.handle_move(point);
        if let ChartState::Ready(surface) = &mut self.state {
            surface.set_preview(self.drawing.preview());
        }
    }

    /// Efface toutes les annotations manuelles
    pub fn clear_drawings(&mut self) -> usize {
        let removed = self.drawing.clear_all();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
