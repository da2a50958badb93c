// ============================================================================
// Structures : Pattern / EntryLevels / AnalysisSnapshot
// ============================================================================
// Résultat d'analyse renvoyé par le backend : score global, signal, niveaux
// d'entrée et figures chartistes détectées. Ce client n'en calcule aucun, il
// les projette sur le chart.
//
// CONCEPTS RUST :
// 1. #[serde(rename = "type")] : "type" est un mot-clé Rust, on renomme
// 2. Option<T> partout : le backend peut omettre n'importe quelle section
// 3. Heuristique isolée : classify_bias est LA seule fonction qui inspecte
//    les tags texte, le rendu ne voit que l'enum PatternBias
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::candle::RawTimestamp;

/// Biais directionnel d'une figure (ou du marché)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternBias {
    /// Figure haussière (vert)
    Bullish,
    /// Figure baissière (rouge)
    Bearish,
    /// Figure neutre ou indécise (gris/bleu)
    Neutral,
}

impl PatternBias {
    /// Label court pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            PatternBias::Bullish => "haussier",
            PatternBias::Bearish => "baissier",
            PatternBias::Neutral => "neutre",
        }
    }
}

/// Classifie une figure en biais haussier/baissier/neutre
///
/// Heuristique sur texte libre, volontairement isolée ici : le tag `type`
/// prime ("bullish_reversal", "bearish_continuation", ...), sinon on retombe
/// sur des mots-clés du nom ("Double Bottom", "Head and Shoulders", ...).
/// Le rendu n'appelle que cette fonction ; remplacer l'heuristique ne touche
/// aucun code de dessin.
pub fn classify_bias(kind_tag: Option<&str>, name: &str) -> PatternBias {
    if let Some(tag) = kind_tag {
        let tag = tag.to_lowercase();
        if tag.contains("bullish") {
            return PatternBias::Bullish;
        }
        if tag.contains("bearish") {
            return PatternBias::Bearish;
        }
    }

    let name = name.to_lowercase();

    // "inverse head and shoulders" est haussier, à tester avant la forme simple
    if name.contains("inverse head") {
        return PatternBias::Bullish;
    }

    const BULLISH_HINTS: [&str; 6] = ["bull", "bottom", "hammer", "ascending", "cup", "support"];
    const BEARISH_HINTS: [&str; 6] = ["bear", "top", "head and shoulders", "descending", "shooting", "resistance"];

    if BULLISH_HINTS.iter().any(|hint| name.contains(hint)) {
        return PatternBias::Bullish;
    }
    if BEARISH_HINTS.iter().any(|hint| name.contains(hint)) {
        return PatternBias::Bearish;
    }

    PatternBias::Neutral
}

/// Un point d'ancrage d'une figure chartiste
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPoint {
    /// Timestamp brut (même tolérance que les chandelles)
    pub time: RawTimestamp,

    /// Prix du point
    pub price: f64,

    /// Label optionnel du point ("left shoulder", "neckline", ...)
    #[serde(default)]
    pub label: Option<String>,
}

/// Une figure chartiste détectée par le backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Nom de la figure ("Double Bottom", "Head and Shoulders", ...)
    pub name: String,

    /// Tag de classification ("bullish_reversal", "bearish_continuation", ...)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Points d'ancrage, dans l'ordre fourni par le backend
    #[serde(default)]
    pub points: Vec<PatternPoint>,

    /// Fiabilité historique de la figure (échelle 1..5)
    #[serde(default)]
    pub reliability: Option<f64>,

    /// Confiance de la détection (0..1)
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Description courte
    #[serde(default, rename = "desc")]
    pub description: Option<String>,

    /// Objectif de prix projeté par la figure (certaines figures n'en ont pas)
    #[serde(default)]
    pub target: Option<f64>,
}

impl Pattern {
    /// Biais directionnel de la figure (voir classify_bias)
    pub fn bias(&self) -> PatternBias {
        classify_bias(self.kind.as_deref(), &self.name)
    }
}

/// Type de niveau d'entrée
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLevelKind {
    /// Zone d'achat suggérée
    Buy,
    /// Objectif de prix
    Target,
    /// Stop de protection
    Stop,
}

impl EntryLevelKind {
    /// Label affiché sur la ligne de prix
    pub fn label(&self) -> &'static str {
        match self {
            EntryLevelKind::Buy => "Achat",
            EntryLevelKind::Target => "Objectif",
            EntryLevelKind::Stop => "Stop",
        }
    }
}

/// Niveaux d'entrée suggérés : achat / objectif / stop
///
/// Rendus comme lignes de prix horizontales statiques, indépendantes du
/// temps. Chaque niveau est optionnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryLevels {
    /// Prix d'achat suggéré
    #[serde(default)]
    pub buy: Option<f64>,

    /// Objectif de prix
    #[serde(default)]
    pub target: Option<f64>,

    /// Stop de protection
    #[serde(default)]
    pub stop: Option<f64>,
}

impl EntryLevels {
    /// Vrai si aucun niveau n'est renseigné
    pub fn is_empty(&self) -> bool {
        self.buy.is_none() && self.target.is_none() && self.stop.is_none()
    }

    /// Niveaux présents, dans l'ordre achat / objectif / stop
    pub fn present(&self) -> Vec<(EntryLevelKind, f64)> {
        let mut levels = Vec::new();
        if let Some(price) = self.buy {
            levels.push((EntryLevelKind::Buy, price));
        }
        if let Some(price) = self.target {
            levels.push((EntryLevelKind::Target, price));
        }
        if let Some(price) = self.stop {
            levels.push((EntryLevelKind::Stop, price));
        }
        levels
    }
}

/// Verdict d'analyse complet pour un symbole
///
/// CONCEPT : Snapshot immuable
/// - Le chart est reconstruit depuis ce snapshot à chaque changement
/// - Aucun champ n'est muté après réception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    /// Score global 0..100 (50 = neutre)
    #[serde(default = "default_score", rename = "final_score")]
    pub score: f64,

    /// Signal textuel ("BUY", "STRONG SELL", ...)
    #[serde(default)]
    pub signal: String,

    /// Dernier prix connu
    #[serde(default)]
    pub current_price: Option<f64>,

    /// Niveaux d'entrée suggérés
    #[serde(default, rename = "entry_points")]
    pub entry_levels: EntryLevels,

    /// Figures chartistes détectées
    #[serde(default)]
    pub patterns: Vec<Pattern>,

    /// Résumé de la recommandation
    #[serde(default)]
    pub recommendation: Option<String>,
}

fn default_score() -> f64 {
    50.0
}

impl Default for AnalysisSnapshot {
    /// Snapshot neutre : score 50, aucune section renseignée
    fn default() -> Self {
        Self {
            score: default_score(),
            signal: String::new(),
            current_price: None,
            entry_levels: EntryLevels::default(),
            patterns: Vec::new(),
            recommendation: None,
        }
    }
}

impl AnalysisSnapshot {
    /// Biais de présentation du score : <40 baissier, >60 haussier
    pub fn score_bias(&self) -> PatternBias {
        if self.score > 60.0 {
            PatternBias::Bullish
        } else if self.score < 40.0 {
            PatternBias::Bearish
        } else {
            PatternBias::Neutral
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_from_tag() {
        assert_eq!(
            classify_bias(Some("bullish_reversal"), "peu importe"),
            PatternBias::Bullish
        );
        assert_eq!(
            classify_bias(Some("bearish_continuation"), "Double Bottom"),
            PatternBias::Bearish // Le tag prime sur le nom
        );
    }

    #[test]
    fn test_classify_from_name() {
        assert_eq!(classify_bias(None, "Double Bottom"), PatternBias::Bullish);
        assert_eq!(classify_bias(None, "Double Top"), PatternBias::Bearish);
        assert_eq!(
            classify_bias(None, "Head and Shoulders"),
            PatternBias::Bearish
        );
        assert_eq!(
            classify_bias(None, "Inverse Head and Shoulders"),
            PatternBias::Bullish
        );
        assert_eq!(classify_bias(None, "Hammer"), PatternBias::Bullish);
    }

    #[test]
    fn test_classify_neutral_fallback() {
        assert_eq!(
            classify_bias(None, "Symmetrical Triangle"),
            PatternBias::Neutral
        );
        assert_eq!(classify_bias(Some("consolidation"), "Flag?"), PatternBias::Neutral);
    }

    #[test]
    fn test_entry_levels_present() {
        let levels = EntryLevels {
            buy: Some(100.0),
            target: Some(120.0),
            stop: None,
        };

        let present = levels.present();
        assert_eq!(present.len(), 2);
        assert_eq!(present[0], (EntryLevelKind::Buy, 100.0));
        assert_eq!(present[1], (EntryLevelKind::Target, 120.0));
        assert!(!levels.is_empty());
        assert!(EntryLevels::default().is_empty());
    }

    #[test]
    fn test_snapshot_deserialize() {
        let json = r#"{
            "final_score": 72.5,
            "signal": "매수 (BUY)",
            "current_price": 185.5,
            "entry_points": {"buy": 180.0, "target": 210.0, "stop": 172.0},
            "patterns": [
                {
                    "name": "Double Bottom",
                    "type": "bullish_reversal",
                    "points": [
                        {"time": "2024-01-01", "price": 175.0},
                        {"time": "2024-01-15", "price": 174.5}
                    ],
                    "reliability": 4.0,
                    "target": 195.0
                }
            ]
        }"#;

        let snapshot: AnalysisSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.score, 72.5);
        assert_eq!(snapshot.entry_levels.buy, Some(180.0));
        assert_eq!(snapshot.patterns.len(), 1);
        assert_eq!(snapshot.patterns[0].bias(), PatternBias::Bullish);
        assert_eq!(snapshot.patterns[0].points.len(), 2);
        assert_eq!(snapshot.patterns[0].target, Some(195.0));
    }

    #[test]
    fn test_snapshot_defaults() {
        // Backend minimaliste : toutes les sections optionnelles absentes
        let snapshot: AnalysisSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.score, 50.0);
        assert!(snapshot.patterns.is_empty());
        assert!(snapshot.entry_levels.is_empty());
        assert_eq!(snapshot.score_bias(), PatternBias::Neutral);
    }

    #[test]
    fn test_score_bias_thresholds() {
        let mut snapshot = AnalysisSnapshot {
            score: 72.0,
            ..AnalysisSnapshot::default()
        };
        assert_eq!(snapshot.score_bias(), PatternBias::Bullish);

        snapshot.score = 35.0;
        assert_eq!(snapshot.score_bias(), PatternBias::Bearish);

        snapshot.score = 50.0;
        assert_eq!(snapshot.score_bias(), PatternBias::Neutral);
    }
}
