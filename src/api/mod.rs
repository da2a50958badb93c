// ============================================================================
// Module : api
// ============================================================================
// Ce module contient le client du backend d'analyse : historique de
// chandelles (indicateurs précalculés) et verdict par symbole
// ============================================================================

pub mod analysis; // Client du backend d'analyse

// Re-export des fonctions principales
pub use analysis::{fetch_analysis, fetch_history, fetch_report, AnalysisReport};
