// ============================================================================
// LazyChart - Library
// ============================================================================
// Expose les modules publics pour les exemples et tests
// ============================================================================

pub mod api;    // Client du backend d'analyse
pub mod app;    // État de l'application
pub mod chart;  // Moteur de chart : surface, overlays, figures, dessins
pub mod models; // Structures de données
pub mod ui;     // Interface utilisateur
