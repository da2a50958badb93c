// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod candlesticks; // Rendu texte du panneau principal (chandelles, figures)
pub mod chart_view;   // Écran d'analyse : panneaux, score, plein écran
pub mod dashboard;    // Rendu de la watchlist
pub mod events;       // Gestion des événements clavier et souris

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};

use ratatui::Frame;

use crate::app::{App, Screen};

/// Dessine l'écran actif
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Pattern matching sur app.current_screen
/// - Le compilateur garantit l'exhaustivité (tous les cas gérés)
///
/// La vue chart prend App en mutable : elle notifie le viewport du layout
/// appliqué et mémorise la zone tracée pour le hit-testing souris.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.current_screen {
        Screen::Dashboard => dashboard::render_dashboard(frame, app),
        Screen::ChartView => chart_view::render_chart_view(frame, app),
        Screen::InputMode => dashboard::render_input_mode(frame, app),
    }
}
