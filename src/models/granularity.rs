// ============================================================================
// Enum : Granularity
// ============================================================================
// Granularité des chandelles demandée au backend d'analyse (1m ... 1mo)
//
// CONCEPTS RUST :
// 1. enum avec méthodes : un type fermé qui porte son propre comportement
// 2. &'static str : labels littéraux stockés dans le binaire, zéro allocation
// 3. matches! : macro pour tester un pattern sans match complet
// ============================================================================

use serde::{Deserialize, Serialize};

/// Granularité des chandelles
///
/// CONCEPT : Granularité et clé temporelle canonique
/// - Intraday (M1..H4) : plusieurs chandelles par jour, clé = secondes epoch
/// - Journalier et plus (D1, W1, MN1) : clé = jour calendaire "YYYY-MM-DD"
/// - La granularité sélectionne donc la règle de canonicalisation du temps
///
/// Exemples :
/// - M30 (30 minutes) → clé 1704096000 (epoch)
/// - D1 (1 jour) → clé "2024-01-01"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// 1 minute
    M1,
    /// 2 minutes
    M2,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 30 minutes
    M30,
    /// 1 heure
    H1,
    /// 4 heures
    H4,
    /// 1 jour (daily)
    D1,
    /// 1 semaine (weekly)
    W1,
    /// 1 mois (monthly)
    MN1,
}

/// Stratégie d'affichage des labels sur l'axe X
///
/// CONCEPT : Labels intelligents par granularité
/// - Chaque granularité a une stratégie adaptée (heures rondes, jours, etc.)
/// - Évite les labels bizarres (14:17) au profit de valeurs rondes (15:00)
#[derive(Debug, Clone, Copy)]
pub enum LabelStrategy {
    /// Heures rondes (00:00, 06:00, 12:00, 18:00)
    /// interval_hours : affiche un label toutes les N heures (1, 3, 6, etc.)
    RoundHours { interval_hours: u32 },

    /// Jours réguliers (tous les N jours)
    RegularDays { interval_days: u32 },

    /// Mois / trimestres
    RegularMonths { interval_months: u32 },

    /// Années / périodes très longues
    RegularYears { interval_years: u32 },
}

/// Formats pour l'axe X (heures et dates séparées)
///
/// CONCEPT : Séparation des préoccupations + stratégie intelligente
/// - time_format : pour la ligne des heures (None si pas applicable)
/// - date_format : pour la ligne des dates
/// - label_strategy : détermine quelles chandelles ont un label
#[derive(Debug, Clone, Copy)]
pub struct AxisFormats {
    /// Format pour la ligne des heures (None pour D1/W1/MN1)
    pub time_format: Option<&'static str>,
    /// Format pour la ligne des dates
    pub date_format: &'static str,
    /// Stratégie d'affichage des labels
    pub label_strategy: LabelStrategy,
}

impl Granularity {
    /// Convertit la granularité en label pour l'API du backend d'analyse
    ///
    /// CONCEPT RUST : &'static str
    /// - Retourne une string littérale (dans le binaire)
    /// - Lifetime 'static : vit pendant toute l'exécution
    /// - Pas d'allocation, très efficace
    pub fn api_label(&self) -> &'static str {
        match self {
            Granularity::M1 => "1m",
            Granularity::M2 => "2m",
            Granularity::M5 => "5m",
            Granularity::M15 => "15m",
            Granularity::M30 => "30m",
            Granularity::H1 => "1h",
            Granularity::H4 => "4h",
            Granularity::D1 => "1d",
            Granularity::W1 => "1wk",
            Granularity::MN1 => "1mo",
        }
    }

    /// Retourne le label court pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::M1 => "1m",
            Granularity::M2 => "2m",
            Granularity::M5 => "5m",
            Granularity::M15 => "15m",
            Granularity::M30 => "30m",
            Granularity::H1 => "1h",
            Granularity::H4 => "4h",
            Granularity::D1 => "1d",
            Granularity::W1 => "1w",
            Granularity::MN1 => "1mo",
        }
    }

    /// Retourne la fenêtre d'historique par défaut, en jours
    ///
    /// CONCEPT : Fenêtres optimisées pour 300-500 chandelles
    /// - Actions : marché ouvert ~6.5h/jour (9h30-16h)
    /// - Objectif : assez de points pour les indicateurs (SMA50 = 50 chandelles)
    ///
    /// Limitation courante côté backend :
    /// - Intraday (<1d) : historique max ~60 jours
    pub fn lookback_days(&self) -> u32 {
        match self {
            Granularity::M1 => 2,
            Granularity::M2 => 3,
            Granularity::M5 => 7,
            Granularity::M15 => 14,
            Granularity::M30 => 30,
            Granularity::H1 => 30,
            Granularity::H4 => 60,
            Granularity::D1 => 365,
            Granularity::W1 => 1825,
            Granularity::MN1 => 3650,
        }
    }

    /// Retourne les formats et stratégie de labels pour l'axe X
    ///
    /// CONCEPT : Labels adaptés à la granularité
    /// - M1/M2/M5 : labels toutes les heures (09:00, 10:00, ...)
    /// - M15 : labels toutes les 3h, M30 : toutes les 6h
    /// - H1 : labels tous les 2 jours, H4 : tous les mois
    /// - D1 : labels tous les mois, W1/MN1 : tous les ans
    ///
    /// Structure à 3 lignes :
    /// - Ligne 1 : tick marks │
    /// - Ligne 2 : heures (ou vide)
    /// - Ligne 3 : dates
    pub fn x_axis_format(&self) -> AxisFormats {
        match self {
            Granularity::M1 | Granularity::M2 | Granularity::M5 => AxisFormats {
                time_format: Some("%H:%M"),
                date_format: "%d/%m",
                label_strategy: LabelStrategy::RoundHours { interval_hours: 1 },
            },
            Granularity::M15 => AxisFormats {
                time_format: Some("%H:%M"),
                date_format: "%d/%m",
                label_strategy: LabelStrategy::RoundHours { interval_hours: 3 },
            },
            Granularity::M30 => AxisFormats {
                time_format: Some("%H:%M"),
                date_format: "%d/%m",
                label_strategy: LabelStrategy::RoundHours { interval_hours: 6 },
            },
            Granularity::H1 => AxisFormats {
                time_format: None,
                date_format: "%d/%m",
                label_strategy: LabelStrategy::RegularDays { interval_days: 2 },
            },
            Granularity::H4 => AxisFormats {
                time_format: None,
                date_format: "%b", // Month only
                label_strategy: LabelStrategy::RegularMonths { interval_months: 1 },
            },
            Granularity::D1 => AxisFormats {
                time_format: None,
                date_format: "%b", // Month only
                label_strategy: LabelStrategy::RegularMonths { interval_months: 1 },
            },
            Granularity::W1 | Granularity::MN1 => AxisFormats {
                time_format: None,
                date_format: "%Y", // Year only
                label_strategy: LabelStrategy::RegularYears { interval_years: 1 },
            },
        }
    }

    /// Retourne true si la granularité est intraday (plusieurs chandelles/jour)
    ///
    /// CONCEPT : Sélecteur de la règle de canonicalisation
    /// - Intraday : clé temporelle = secondes epoch (i64)
    /// - D1/W1/MN1 : clé temporelle = jour calendaire (les doublons du même
    ///   jour sont fusionnés à la normalisation)
    pub fn is_intraday(&self) -> bool {
        !matches!(self, Granularity::D1 | Granularity::W1 | Granularity::MN1)
    }

    /// Retourne toutes les granularités disponibles (pour UI de sélection)
    pub fn all() -> Vec<Granularity> {
        vec![
            Granularity::M1,
            Granularity::M2,
            Granularity::M5,
            Granularity::M15,
            Granularity::M30,
            Granularity::H1,
            Granularity::H4,
            Granularity::D1,
            Granularity::W1,
            Granularity::MN1,
        ]
    }

    /// Retourne la granularité suivante (cycle)
    pub fn next(&self) -> Granularity {
        match self {
            Granularity::M1 => Granularity::M2,
            Granularity::M2 => Granularity::M5,
            Granularity::M5 => Granularity::M15,
            Granularity::M15 => Granularity::M30,
            Granularity::M30 => Granularity::H1,
            Granularity::H1 => Granularity::H4,
            Granularity::H4 => Granularity::D1,
            Granularity::D1 => Granularity::W1,
            Granularity::W1 => Granularity::MN1,
            Granularity::MN1 => Granularity::M1, // Boucle
        }
    }

    /// Retourne la granularité précédente (cycle)
    pub fn previous(&self) -> Granularity {
        match self {
            Granularity::M1 => Granularity::MN1, // Boucle
            Granularity::M2 => Granularity::M1,
            Granularity::M5 => Granularity::M2,
            Granularity::M15 => Granularity::M5,
            Granularity::M30 => Granularity::M15,
            Granularity::H1 => Granularity::M30,
            Granularity::H4 => Granularity::H1,
            Granularity::D1 => Granularity::H4,
            Granularity::W1 => Granularity::D1,
            Granularity::MN1 => Granularity::W1,
        }
    }
}

impl Default for Granularity {
    /// Granularité par défaut : 1 jour (celle de l'analyse de fond)
    fn default() -> Self {
        Granularity::D1
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_label() {
        assert_eq!(Granularity::M30.api_label(), "30m");
        assert_eq!(Granularity::H1.api_label(), "1h");
        assert_eq!(Granularity::D1.api_label(), "1d");
        assert_eq!(Granularity::W1.api_label(), "1wk");
        assert_eq!(Granularity::MN1.api_label(), "1mo");
    }

    #[test]
    fn test_is_intraday() {
        assert!(Granularity::M1.is_intraday());
        assert!(Granularity::M30.is_intraday());
        assert!(Granularity::H4.is_intraday());
        assert!(!Granularity::D1.is_intraday());
        assert!(!Granularity::W1.is_intraday());
        assert!(!Granularity::MN1.is_intraday());
    }

    #[test]
    fn test_cycle() {
        assert_eq!(Granularity::M1.next(), Granularity::M2);
        assert_eq!(Granularity::M1.previous(), Granularity::MN1);
        assert_eq!(Granularity::MN1.next(), Granularity::M1); // Boucle

        // Un cycle complet revient au point de départ
        let mut g = Granularity::D1;
        for _ in 0..Granularity::all().len() {
            g = g.next();
        }
        assert_eq!(g, Granularity::D1);
    }

    #[test]
    fn test_all_count() {
        assert_eq!(Granularity::all().len(), 10);
    }

    #[test]
    fn test_lookback_days() {
        assert!(Granularity::M5.lookback_days() <= 60); // Limite intraday
        assert_eq!(Granularity::D1.lookback_days(), 365);
    }
}
