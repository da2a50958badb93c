// ============================================================================
// Module : chart::viewport
// ============================================================================
// Dimensions du chart et mode plein écran. Un redimensionnement ou un
// changement de mode invalide la surface courante : le compositeur est
// ré-invoqué avec les dimensions à jour.
//
// Le plein écran suit le protocole demande / application : demander le mode
// ne suffit PAS à le considérer actif. Le rendu choisit la disposition,
// peut la refuser (terminal trop étroit), et notifie la disposition
// réellement appliquée via confirm_layout. Seule cette notification fait
// foi pour is_fullscreen.
// ============================================================================

use tracing::debug;

/// Hauteur de terminal sous laquelle le plein écran est refusé au profit
/// de la disposition standard
pub const MIN_FULLSCREEN_HEIGHT: u16 = 12;

/// Suivi du viewport du chart
#[derive(Debug, Default)]
pub struct ViewportController {
    width: u16,
    height: u16,
    /// Mode plein écran effectivement appliqué (confirmé par le rendu)
    fullscreen: bool,
    /// Demande de mode en attente d'application
    requested_fullscreen: Option<bool>,
    /// Une reconstruction est nécessaire
    dirty: bool,
}

impl ViewportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Mode plein écran confirmé (jamais déduit d'une simple demande)
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Mode que le rendu doit tenter d'appliquer au prochain passage
    pub fn desired_fullscreen(&self) -> bool {
        self.requested_fullscreen.unwrap_or(self.fullscreen)
    }

    /// Nouvelle taille de la zone de chart
    ///
    /// Retourne vrai si les dimensions ont changé (surface invalidée).
    pub fn on_resize(&mut self, width: u16, height: u16) -> bool {
        if (width, height) == (self.width, self.height) {
            return false;
        }
        debug!(width, height, "Chart viewport resized");
        self.width = width;
        self.height = height;
        self.dirty = true;
        true
    }

    /// Demande de bascule du mode plein écran
    ///
    /// La demande reste en attente jusqu'à la notification de disposition ;
    /// l'état confirmé ne bouge pas ici.
    pub fn request_fullscreen_toggle(&mut self) {
        let target = !self.desired_fullscreen();
        self.requested_fullscreen = Some(target);
        debug!(target, "Fullscreen mode requested");
    }

    /// Notification de la disposition réellement appliquée par le rendu
    ///
    /// Consomme la demande en attente. Si le mode appliqué diffère du mode
    /// confirmé, la surface est invalidée.
    pub fn confirm_layout(&mut self, fullscreen: bool) {
        self.requested_fullscreen = None;
        if fullscreen != self.fullscreen {
            debug!(fullscreen, "Fullscreen mode applied");
            self.fullscreen = fullscreen;
            self.dirty = true;
        }
    }

    /// Consomme le drapeau d'invalidation
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_invalidates() {
        let mut viewport = ViewportController::new();
        assert!(viewport.on_resize(120, 40));
        assert_eq!(viewport.dimensions(), (120, 40));
        assert!(viewport.take_dirty());

        // Même taille : rien à faire
        assert!(!viewport.on_resize(120, 40));
        assert!(!viewport.take_dirty());
    }

    #[test]
    fn test_fullscreen_never_assumed_from_request() {
        let mut viewport = ViewportController::new();
        viewport.on_resize(120, 40);
        viewport.take_dirty();

        viewport.request_fullscreen_toggle();
        // La demande seule ne change pas l'état confirmé
        assert!(!viewport.is_fullscreen());
        assert!(viewport.desired_fullscreen());
        assert!(!viewport.take_dirty());

        // La notification d'application fait foi
        viewport.confirm_layout(true);
        assert!(viewport.is_fullscreen());
        assert!(viewport.take_dirty());
    }

    #[test]
    fn test_fullscreen_denied_by_renderer() {
        let mut viewport = ViewportController::new();
        viewport.request_fullscreen_toggle();

        // Le rendu refuse (terminal trop petit) : la demande est consommée,
        // l'état reste hors plein écran
        viewport.confirm_layout(false);
        assert!(!viewport.is_fullscreen());
        assert!(!viewport.desired_fullscreen());
        assert!(!viewport.take_dirty());
    }

    #[test]
    fn test_toggle_back_from_fullscreen() {
        let mut viewport = ViewportController::new();
        viewport.request_fullscreen_toggle();
        viewport.confirm_layout(true);
        viewport.take_dirty();

        viewport.request_fullscreen_toggle();
        assert!(!viewport.desired_fullscreen());
        assert!(viewport.is_fullscreen()); // Toujours appliqué pour l'instant

        viewport.confirm_layout(false);
        assert!(!viewport.is_fullscreen());
        assert!(viewport.take_dirty());
    }

    #[test]
    fn test_confirm_same_layout_is_noop() {
        let mut viewport = ViewportController::new();
        viewport.confirm_layout(false);
        assert!(!viewport.take_dirty());
    }
}
