// ============================================================================
// Structures : RawCandle / Candle / CandleSeries
// ============================================================================
// Le backend d'analyse renvoie des chandelles "brutes" : timestamp hétérogène
// (date ISO, date+heure, epoch en secondes ou millisecondes), champs OHLC
// potentiellement absents. La normalisation (chart::normalize) les convertit
// en chandelles canoniques à clé temporelle unique et strictement croissante.
//
// CONCEPTS RUST :
// 1. #[serde(untagged)] : essaie chaque variante dans l'ordre, sans tag JSON
// 2. Option<f64> : champ numérique absent ou null, sans valeur sentinelle
// 3. Ord implémenté à la main : ordre sémantique (instant absolu), pas
//    l'ordre structurel dérivé
// ============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::granularity::Granularity;

/// Seuil au-delà duquel une valeur epoch est interprétée en millisecondes
/// (20e9 secondes ≈ année 2603, aucune donnée boursière réelle n'y arrive)
const EPOCH_MILLIS_THRESHOLD: i64 = 20_000_000_000;

/// Timestamp brut tel que reçu du backend
///
/// CONCEPT RUST : enum untagged
/// - Le JSON peut contenir 1704067200, 1704067200.0, "2024-01-01" ou
///   "2024-01-01T05:00Z" pour le même champ
/// - serde essaie Epoch (i64), puis EpochFloat (f64), puis Text (String)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Secondes (ou millisecondes, détectées par seuil) depuis epoch
    Epoch(i64),
    /// Même chose mais encodé en flottant par certains sérialiseurs
    EpochFloat(f64),
    /// Date ISO ("2024-01-01") ou date+heure ("2024-01-01T05:00Z")
    Text(String),
}

impl RawTimestamp {
    /// Résout le timestamp brut en instant absolu UTC
    ///
    /// Chaîne de parsing, du plus strict au plus permissif :
    /// 1. RFC 3339 complet ("2024-01-01T00:00:00Z", offsets inclus)
    /// 2. Formats naïfs usuels, interprétés en UTC (suffixe Z toléré)
    /// 3. Date seule → minuit UTC
    ///
    /// Retourne None si rien ne matche : la ligne sera silencieusement
    /// écartée par la normalisation (erreur de données, jamais fatale).
    pub fn parse_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Epoch(value) => epoch_to_instant(*value),
            RawTimestamp::EpochFloat(value) => {
                if !value.is_finite() {
                    return None;
                }
                epoch_to_instant(*value as i64)
            }
            RawTimestamp::Text(text) => parse_text_instant(text),
        }
    }
}

fn epoch_to_instant(value: i64) -> Option<DateTime<Utc>> {
    let seconds = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        value / 1000
    } else {
        value
    };
    Utc.timestamp_opt(seconds, 0).single()
}

fn parse_text_instant(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 1. RFC 3339 complet : gère "Z" et les offsets (+05:00)
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    // 2. Formats naïfs : suffixe "Z" toléré, le reste est supposé UTC
    let naive_part = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    const NAIVE_FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_part, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    // 3. Date seule → minuit UTC
    if let Ok(date) = NaiveDate::parse_from_str(naive_part, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    None
}

/// Clé temporelle canonique d'une chandelle normalisée
///
/// CONCEPT : Une clé par règle de granularité
/// - `Day` : granularité 1 jour ou plus → jour calendaire (fusionne les
///   doublons du même jour qui ne diffèrent que par l'heure)
/// - `Instant` : granularité intraday → secondes epoch
///
/// La surface de rendu exige des clés strictement croissantes et uniques :
/// c'est ce type qui porte cette garantie après normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalTime {
    /// Jour calendaire ("YYYY-MM-DD" à l'affichage)
    Day(NaiveDate),
    /// Secondes depuis epoch
    Instant(i64),
}

impl CanonicalTime {
    /// Secondes epoch de la clé (minuit UTC pour un jour calendaire)
    ///
    /// Sert de base à l'ordre sémantique et au positionnement sur l'axe X.
    pub fn epoch_seconds(&self) -> i64 {
        match self {
            CanonicalTime::Day(date) => {
                Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp()
            }
            CanonicalTime::Instant(seconds) => *seconds,
        }
    }

    /// Jour calendaire UTC de la clé
    pub fn calendar_day(&self) -> NaiveDate {
        match self {
            CanonicalTime::Day(date) => *date,
            CanonicalTime::Instant(seconds) => match Utc.timestamp_opt(*seconds, 0).single() {
                Some(instant) => instant.date_naive(),
                // Instant hors bornes chrono : on retombe sur l'époque
                None => NaiveDate::default(),
            },
        }
    }

    /// Instant UTC complet de la clé (minuit pour un jour calendaire)
    pub fn instant_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.epoch_seconds(), 0).single()
    }

    /// Reconvertit la clé en timestamp brut
    ///
    /// Utilisé pour vérifier l'idempotence de la normalisation : une sortie
    /// canonique repassée dans le normaliseur doit ressortir identique.
    pub fn to_raw(&self) -> RawTimestamp {
        match self {
            CanonicalTime::Day(date) => RawTimestamp::Text(date.format("%Y-%m-%d").to_string()),
            CanonicalTime::Instant(seconds) => RawTimestamp::Epoch(*seconds),
        }
    }

    /// Label d'affichage : "2024-01-01" ou l'heure formatée selon le format
    pub fn format(&self, fmt: &str) -> String {
        match self {
            CanonicalTime::Day(date) => date.format(fmt).to_string(),
            CanonicalTime::Instant(seconds) => match Utc.timestamp_opt(*seconds, 0).single() {
                Some(instant) => instant.format(fmt).to_string(),
                None => String::new(),
            },
        }
    }
}

impl std::fmt::Display for CanonicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalTime::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            CanonicalTime::Instant(seconds) => write!(f, "{}", seconds),
        }
    }
}

// Ord sémantique : comparaison par instant absolu, le discriminant ne sert
// que de départage pour garder un ordre total déterministe
impl Ord for CanonicalTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let tag = |t: &CanonicalTime| matches!(t, CanonicalTime::Instant(_)) as u8;
        self.epoch_seconds()
            .cmp(&other.epoch_seconds())
            .then_with(|| tag(self).cmp(&tag(other)))
    }
}

impl PartialOrd for CanonicalTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Valeurs d'indicateurs précalculées portées par une chandelle
///
/// Le backend les calcule (ce client ne recalcule rien) ; chaque champ est
/// optionnel car les premières chandelles d'une fenêtre n'ont pas encore de
/// moyenne mobile complète.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    /// Moyenne mobile simple 20 périodes
    #[serde(default)]
    pub sma_20: Option<f64>,

    /// Moyenne mobile simple 50 périodes
    #[serde(default)]
    pub sma_50: Option<f64>,

    /// Moyenne mobile exponentielle 20 périodes
    #[serde(default)]
    pub ema_20: Option<f64>,

    /// Bande de Bollinger supérieure
    #[serde(default)]
    pub bb_upper: Option<f64>,

    /// Bande de Bollinger inférieure
    #[serde(default)]
    pub bb_lower: Option<f64>,

    /// RSI 14 périodes (0..100)
    #[serde(default, rename = "rsi")]
    pub rsi_14: Option<f64>,

    /// Ligne MACD
    #[serde(default)]
    pub macd: Option<f64>,

    /// Ligne de signal du MACD
    #[serde(default)]
    pub macd_signal: Option<f64>,
}

/// Clé d'indicateur, pour router une valeur vers sa série
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKey {
    Sma20,
    Sma50,
    Ema20,
    BbUpper,
    BbLower,
    Rsi14,
    Macd,
    MacdSignal,
}

impl IndicatorKey {
    /// Label court pour légendes et logs
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKey::Sma20 => "SMA 20",
            IndicatorKey::Sma50 => "SMA 50",
            IndicatorKey::Ema20 => "EMA 20",
            IndicatorKey::BbUpper => "BB sup",
            IndicatorKey::BbLower => "BB inf",
            IndicatorKey::Rsi14 => "RSI 14",
            IndicatorKey::Macd => "MACD",
            IndicatorKey::MacdSignal => "Signal",
        }
    }
}

impl IndicatorValues {
    /// Accès par clé (routage générique des overlays)
    pub fn get(&self, key: IndicatorKey) -> Option<f64> {
        match key {
            IndicatorKey::Sma20 => self.sma_20,
            IndicatorKey::Sma50 => self.sma_50,
            IndicatorKey::Ema20 => self.ema_20,
            IndicatorKey::BbUpper => self.bb_upper,
            IndicatorKey::BbLower => self.bb_lower,
            IndicatorKey::Rsi14 => self.rsi_14,
            IndicatorKey::Macd => self.macd,
            IndicatorKey::MacdSignal => self.macd_signal,
        }
    }
}

/// Chandelle brute, telle que désérialisée depuis le backend
///
/// Tous les champs de prix sont optionnels : une ligne incomplète est une
/// erreur de données, écartée sans bruit à la normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    /// Timestamp hétérogène (voir RawTimestamp)
    pub time: RawTimestamp,

    /// Prix d'ouverture (Open)
    #[serde(default)]
    pub open: Option<f64>,

    /// Prix le plus haut (High)
    #[serde(default)]
    pub high: Option<f64>,

    /// Prix le plus bas (Low)
    #[serde(default)]
    pub low: Option<f64>,

    /// Prix de clôture (Close)
    #[serde(default)]
    pub close: Option<f64>,

    /// Volume échangé
    #[serde(default)]
    pub volume: Option<f64>,

    /// Indicateurs précalculés, aplatis dans le même objet JSON
    #[serde(flatten)]
    pub indicators: IndicatorValues,
}

impl RawCandle {
    /// Constructeur compact (surtout utile dans les tests)
    pub fn new(time: RawTimestamp, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: None,
            indicators: IndicatorValues::default(),
        }
    }

    /// Variante avec volume
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Une chandelle canonique (sortie du normaliseur)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Clé temporelle canonique, unique dans la série
    pub time: CanonicalTime,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,

    /// Volume échangé (absent pour certains indices)
    pub volume: Option<f64>,

    /// Indicateurs précalculés portés par la chandelle
    pub indicators: IndicatorValues,
}

impl Candle {
    /// Constructeur : crée une chandelle canonique sans indicateurs
    pub fn new(time: CanonicalTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume: None,
            indicators: IndicatorValues::default(),
        }
    }

    /// Vérifie si la chandelle est haussière (bullish)
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Vérifie si la chandelle est baissière (bearish)
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Calcule le corps de la chandelle (body)
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Calcule la mèche haute (upper wick)
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Calcule la mèche basse (lower wick)
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Variation en pourcentage depuis l'ouverture
    pub fn change_percent(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            ((self.close - self.open) / self.open) * 100.0
        }
    }
}

/// Série de chandelles canoniques pour un symbole
///
/// CONCEPT RUST : Ownership
/// - CandleSeries possède le Vec, le Vec possède les Candle
/// - Quand la série est drop, tout est libéré automatiquement
///
/// Invariant (garanti par chart::normalize) : `candles` est strictement
/// croissant en temps canonique, sans clé dupliquée.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    /// Symbole du titre
    pub symbol: String,

    /// Granularité des chandelles
    pub granularity: Granularity,

    /// Chandelles canoniques, triées par clé croissante
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    /// Crée une série vide
    pub fn new(symbol: String, granularity: Granularity) -> Self {
        Self {
            symbol,
            granularity,
            candles: Vec::new(),
        }
    }

    /// Retourne le nombre de chandelles
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Retourne la chandelle la plus récente
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Prix minimum sur toute la période (plus bas des Low)
    pub fn min_price(&self) -> Option<f64> {
        self.candles
            .iter()
            .map(|c| c.low)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Prix maximum sur toute la période (plus haut des High)
    pub fn max_price(&self) -> Option<f64> {
        self.candles
            .iter()
            .map(|c| c.high)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Volume maximum (pour l'échelle du panneau volume)
    pub fn max_volume(&self) -> Option<f64> {
        self.candles
            .iter()
            .filter_map(|c| c.volume)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Variation journalière en pourcentage
    ///
    /// - Granularité D1 ou plus : variation de la dernière chandelle
    /// - Granularité intraday : variation open→close du dernier jour présent
    pub fn daily_change_percent(&self) -> Option<f64> {
        if self.candles.is_empty() {
            return None;
        }

        if !self.granularity.is_intraday() {
            return self.last().map(|c| c.change_percent());
        }

        let last_day = self.last()?.time.calendar_day();
        let day_candles: Vec<&Candle> = self
            .candles
            .iter()
            .filter(|c| c.time.calendar_day() == last_day)
            .collect();

        let day_open = day_candles.first()?.open;
        let day_close = day_candles.last()?.close;
        if day_open == 0.0 {
            return None;
        }

        Some(((day_close - day_open) / day_open) * 100.0)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
