// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod analysis;    // Verdict d'analyse : score, signal, figures, niveaux
pub mod candle;      // Chandelles brutes et canoniques, clé temporelle
pub mod drawing;     // Annotations manuelles (outils de dessin)
pub mod granularity; // Granularité des chandelles (1m ... 1mo)
pub mod watchlist;   // Symbole suivi dans la watchlist

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazychart::models::candle::Candle;
// On peut faire : use lazychart::models::Candle;
pub use analysis::{
    classify_bias, AnalysisSnapshot, EntryLevelKind, EntryLevels, Pattern, PatternBias,
    PatternPoint,
};
pub use candle::{
    Candle, CandleSeries, CanonicalTime, IndicatorKey, IndicatorValues, RawCandle, RawTimestamp,
};
pub use drawing::{ChartPoint, DrawingTool, ManualDrawing};
pub use granularity::{AxisFormats, Granularity, LabelStrategy};
pub use watchlist::WatchedSymbol;
