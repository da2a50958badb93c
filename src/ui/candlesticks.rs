// ============================================================================
// Rendu texte du panneau principal : chandelles, overlays, figures, dessins
// ============================================================================
// Implémentation inspirée de cli-candlestick-chart, intégrée à ratatui.
// La surface retenue (chart::surface) est la source unique de vérité : ce
// module ne fait que la projeter en caractères, couche par couche.
//
// ALGORITHME :
// - Grille de cellules (caractère + style) peinte en profondeur croissante :
//   chandelles, séries lignes, lignes de prix, dessins manuels, markers
// - Chandelles : rendu vertical ligne par ligne, logique des 3 zones
//   (mèche supérieure, corps, mèche inférieure), seuils fractionnaires
//   0.25 / 0.75 pour la précision sub-caractère
// - Séries lignes : interpolation linéaire par colonne entre points
//   consécutifs ; trait discontinu = une colonne sur deux
// - Le hit-testing (position souris → ChartPoint) partage la même géométrie
//   que le rendu : ce qui est cliqué est exactement ce qui est dessiné
//
// CARACTÈRES UNICODE :
// ┃ Corps plein          │ Mèche pleine
// ╻ Demi-corps (bas)     ╹ Demi-corps (haut)
// ╽ Transition top       ╿ Transition bottom
// ╷ Demi-mèche sup       ╵ Demi-mèche inf
// ============================================================================

use chrono::{Datelike, Timelike};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::chart::style::{LineKind, SeriesStyle};
use crate::chart::surface::{ChartSurface, LineSeries, MarkerPosition, MarkerShape, PriceLine};
use crate::models::candle::{Candle, CanonicalTime};
use crate::models::drawing::{ChartPoint, ManualDrawing};
use crate::models::granularity::LabelStrategy;

// ============================================================================
// Constantes
// ============================================================================

/// Caractères Unicode pour le rendu des chandeliers
const UNICODE_VOID: char = ' ';
const UNICODE_BODY: char = '┃'; // Corps plein
const UNICODE_HALF_BODY_BOTTOM: char = '╻'; // Corps avec espace en bas
const UNICODE_HALF_BODY_TOP: char = '╹'; // Corps avec espace en haut
const UNICODE_WICK: char = '│'; // Mèche pleine
const UNICODE_TOP: char = '╽'; // Transition corps→mèche (haut)
const UNICODE_BOTTOM: char = '╿'; // Transition corps→mèche (bas)
const UNICODE_UPPER_WICK: char = '╷'; // Demi-mèche supérieure
const UNICODE_LOWER_WICK: char = '╵'; // Demi-mèche inférieure

/// Marqueur des séries lignes (même caractère que Marker::Dot de ratatui)
const SERIES_DOT: char = '•';

/// Largeur de l'axe Y (pour les prix)
const Y_AXIS_WIDTH: u16 = 12;

/// Constantes pour le design réactif
/// - MIN_TERMINAL_WIDTH : largeur minimale absolue pour afficher le graphique
/// - ADAPTIVE_Y_AXIS_THRESHOLD : en dessous, on réduit la largeur de l'axe Y
/// - NARROW_Y_AXIS_WIDTH : largeur réduite de l'axe Y pour terminaux étroits
pub(crate) const MIN_TERMINAL_WIDTH: u16 = 60;
const ADAPTIVE_Y_AXIS_THRESHOLD: u16 = 80;
const NARROW_Y_AXIS_WIDTH: u16 = 8;

// ============================================================================
// Géométrie partagée rendu ↔ hit-testing
// ============================================================================

/// Géométrie du panneau principal pour une zone d'écran donnée
///
/// CONCEPT : Single source of truth for alignment
/// - Rendu et hit-testing construisent la même géométrie depuis la même
///   surface et la même zone : alignement chandelier ↔ clic garanti
/// - Toutes les couches (chandeliers, séries, ticks, labels) utilisent les
///   mêmes positions de colonnes
#[derive(Debug, Clone, Copy)]
struct ChartGeometry {
    /// Zone écran complète du panneau (axe Y et axe X compris)
    area: Rect,
    /// Largeur de l'axe des prix, adaptative selon la largeur du terminal
    y_axis_width: u16,
    /// Colonnes disponibles pour les chandelles
    chart_width: u16,
    /// Lignes disponibles pour la grille (hors axe X)
    rows: u16,
    /// Index de la première chandelle visible (les N dernières qui tiennent)
    first_visible: usize,
    /// Nombre de chandelles visibles
    visible_len: usize,
    /// Espacement horizontal entre chandelles (>= 1.0)
    spacing: f64,
    /// Bornes de prix avec marge de 2%
    min_price: f64,
    max_price: f64,
}

impl ChartGeometry {
    fn new(surface: &ChartSurface, area: Rect) -> Option<Self> {
        if surface.main.candles.is_empty() {
            return None;
        }

        // Largeur adaptative de l'axe Y selon la largeur du terminal
        let y_axis_width = if area.width < ADAPTIVE_Y_AXIS_THRESHOLD {
            NARROW_Y_AXIS_WIDTH
        } else {
            Y_AXIS_WIDTH
        };

        let formats = surface.granularity.x_axis_format();
        let x_axis_rows: u16 = if formats.time_format.is_some() { 3 } else { 2 };

        let chart_width = area.width.saturating_sub(y_axis_width);
        let rows = area.height.saturating_sub(x_axis_rows);
        if chart_width < 8 || rows < 4 {
            return None;
        }

        let (raw_min, raw_max) = surface.price_bounds()?;
        let margin = (raw_max - raw_min) * 0.02;

        let len = surface.main.candles.len();
        let first_visible = len.saturating_sub(chart_width as usize);
        let visible_len = len - first_visible;
        let spacing = if visible_len > 1 {
            chart_width as f64 / visible_len as f64
        } else {
            1.0
        };

        Some(Self {
            area,
            y_axis_width,
            chart_width,
            rows,
            first_visible,
            visible_len,
            spacing,
            min_price: (raw_min - margin).max(0.0),
            max_price: raw_max + margin,
        })
    }

    /// Chandelles visibles (les N dernières qui tiennent à l'écran)
    fn visible<'a>(&self, surface: &'a ChartSurface) -> &'a [Candle] {
        &surface.main.candles[self.first_visible..]
    }

    /// Convertit un prix en coordonnée de hauteur (0 = bas, rows = haut)
    fn price_to_height(&self, price: f64) -> f64 {
        if self.max_price == self.min_price {
            return self.rows as f64 / 2.0;
        }
        (price - self.min_price) / (self.max_price - self.min_price) * self.rows as f64
    }

    /// Ligne de grille (0 = haut) d'un prix, None si le prix sort de
    /// l'échelle (les éléments hors bornes sont clippés, pas plaqués au bord)
    fn row_of_price(&self, price: f64) -> Option<u16> {
        if price < self.min_price || price > self.max_price {
            return None;
        }
        let y = self.price_to_height(price).round().clamp(1.0, self.rows as f64) as u16;
        Some(self.rows - y)
    }

    /// Colonne d'une chandelle visible
    ///
    /// CONCEPT : Accumulator pattern pour éviter le drift
    /// - Chaque position = index × spacing (pas position_précédente + spacing)
    /// - Évite l'accumulation d'erreurs d'arrondi sur plusieurs chandeliers
    fn column_of(&self, index: usize) -> u16 {
        if self.visible_len == 1 {
            // Cas spécial : chandelier unique centré
            return self.chart_width / 2;
        }
        let exact = index as f64 * self.spacing;
        (exact.round() as u16).min(self.chart_width.saturating_sub(1))
    }

    /// Colonne fractionnaire d'une clé temporelle, négative si la chandelle
    /// est sortie de la fenêtre visible ; None si la clé n'est pas un slot
    fn virtual_column(&self, surface: &ChartSurface, time: CanonicalTime) -> Option<f64> {
        let slot = surface.slot_of(time)?;
        if self.visible_len == 1 {
            return Some((self.chart_width / 2) as f64);
        }
        Some((slot as f64 - self.first_visible as f64) * self.spacing)
    }

    /// Position souris absolue → point du chart
    fn point_at(&self, surface: &ChartSurface, column: u16, row: u16) -> Option<ChartPoint> {
        let left = self.area.x.checked_add(self.y_axis_width)?;
        if column < left || row < self.area.y {
            return None;
        }
        let rel_col = column - left;
        let rel_row = row - self.area.y;
        if rel_col >= self.chart_width || rel_row >= self.rows {
            return None;
        }

        // Chandelle la plus proche de la colonne cliquée
        let index = if self.visible_len <= 1 {
            0
        } else {
            ((rel_col as f64 / self.spacing).round() as usize).min(self.visible_len - 1)
        };
        let time = surface.time_at(self.first_visible + index)?;

        // Prix à la hauteur du curseur (inverse exact du rendu)
        let y = (self.rows - rel_row) as f64;
        let price = self.min_price + y * (self.max_price - self.min_price) / self.rows as f64;

        Some(ChartPoint::new(time, price))
    }
}

// ============================================================================
// Grille de cellules
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Cell {
    ch: char,
    style: Style,
}

/// Grille de rendu : une cellule par (ligne, colonne) de la zone tracée
struct Grid {
    width: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Grid {
    fn new(width: usize, rows: usize) -> Self {
        Self {
            width,
            rows,
            cells: vec![
                Cell {
                    ch: UNICODE_VOID,
                    style: Style::default(),
                };
                width * rows
            ],
        }
    }

    /// Écrit une cellule, ignore silencieusement les positions hors grille
    fn put(&mut self, row: usize, col: usize, ch: char, style: Style) {
        if row < self.rows && col < self.width {
            self.cells[row * self.width + col] = Cell { ch, style };
        }
    }

    fn put_str(&mut self, row: usize, col: usize, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            self.put(row, col + i, ch, style);
        }
    }

    fn cell(&self, row: usize, col: usize) -> Cell {
        if row < self.rows && col < self.width {
            self.cells[row * self.width + col]
        } else {
            Cell {
                ch: UNICODE_VOID,
                style: Style::default(),
            }
        }
    }

    /// Fusionne les cellules adjacentes de même style en spans
    fn row_spans(&self, row: usize) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        let mut buffer = String::new();
        let mut current = Style::default();

        for col in 0..self.width {
            let cell = self.cell(row, col);
            if cell.style != current && !buffer.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut buffer), current));
            }
            current = cell.style;
            buffer.push(cell.ch);
        }
        if !buffer.is_empty() {
            spans.push(Span::styled(buffer, current));
        }
        spans
    }
}

// ============================================================================
// Couches de peinture
// ============================================================================

/// Style ratatui d'un style de série (couleur + atténuation éventuelle)
pub(crate) fn paint_style(style: SeriesStyle) -> Style {
    let mut rendered = Style::default().fg(style.color);
    if style.dimmed {
        rendered = rendered.add_modifier(Modifier::DIM);
    }
    rendered
}

/// Rend un chandelier à une hauteur donnée
///
/// Le cœur de l'algorithme, adapté de cli-candlestick-chart : détermine quel
/// caractère Unicode afficher selon la position verticale.
fn candle_glyph(geometry: &ChartGeometry, candle: &Candle, y: u16) -> char {
    let height_unit = y as f64;

    let high_y = geometry.price_to_height(candle.high);
    let low_y = geometry.price_to_height(candle.low);
    let max_y = geometry.price_to_height(candle.open.max(candle.close));
    let min_y = geometry.price_to_height(candle.close.min(candle.open));

    let mut output = UNICODE_VOID;

    // ========================================
    // ZONE 1 : Mèche supérieure (high → max)
    // ========================================
    if high_y.ceil() >= height_unit && height_unit >= max_y.floor() {
        if max_y - height_unit > 0.75 {
            // Corps s'étend significativement dans cette ligne
            output = UNICODE_BODY;
        } else if (max_y - height_unit) > 0.25 {
            // Corps partiellement présent
            if (high_y - height_unit) > 0.75 {
                // Mèche s'étend aussi → transition
                output = UNICODE_TOP;
            } else {
                // Juste le corps avec espace
                output = UNICODE_HALF_BODY_BOTTOM;
            }
        } else if (high_y - height_unit) > 0.75 {
            // Que la mèche, pleine
            output = UNICODE_WICK;
        } else if (high_y - height_unit) > 0.25 {
            // Demi-mèche
            output = UNICODE_UPPER_WICK;
        }
    }
    // ========================================
    // ZONE 2 : Corps (min → max)
    // ========================================
    else if max_y.floor() >= height_unit && height_unit >= min_y.ceil() {
        // Toujours corps plein dans la zone du corps
        output = UNICODE_BODY;
    }
    // ========================================
    // ZONE 3 : Mèche inférieure (min → low)
    // ========================================
    else if min_y.ceil() >= height_unit && height_unit >= low_y.floor() {
        if (min_y - height_unit) < 0.25 {
            // Corps encore très proche
            output = UNICODE_BODY;
        } else if (min_y - height_unit) < 0.75 {
            // Corps partiellement présent
            if (low_y - height_unit) < 0.25 {
                // Mèche proche aussi → transition
                output = UNICODE_BOTTOM;
            } else {
                // Juste le corps avec espace
                output = UNICODE_HALF_BODY_TOP;
            }
        } else if low_y - height_unit < 0.25 {
            // Que la mèche, pleine
            output = UNICODE_WICK;
        } else if low_y - height_unit < 0.75 {
            // Demi-mèche
            output = UNICODE_LOWER_WICK;
        }
    }

    output
}

fn paint_candles(grid: &mut Grid, geometry: &ChartGeometry, surface: &ChartSurface) {
    let theme = surface.theme;
    for (i, candle) in geometry.visible(surface).iter().enumerate() {
        let col = geometry.column_of(i) as usize;
        let color = if candle.is_bearish() {
            theme.bearish
        } else {
            theme.bullish
        };
        let style = Style::default().fg(color);

        for y in 1..=geometry.rows {
            let ch = candle_glyph(geometry, candle, y);
            if ch != UNICODE_VOID {
                grid.put((geometry.rows - y) as usize, col, ch, style);
            }
        }
    }
}

/// Peint un segment de ligne entre deux colonnes fractionnaires
///
/// Pour un trait continu, les marches verticales entre colonnes adjacentes
/// sont remplies ; un trait discontinu saute une colonne sur deux. Les
/// valeurs hors échelle sont clippées cellule par cellule.
#[allow(clippy::too_many_arguments)]
fn paint_segment(
    grid: &mut Grid,
    geometry: &ChartGeometry,
    c0: f64,
    v0: f64,
    c1: f64,
    v1: f64,
    ch: char,
    style: Style,
    dashed: bool,
    last: &mut Option<(i64, u16)>,
) {
    let span = (c1 - c0).max(f64::EPSILON);
    let start = c0.ceil().max(0.0) as i64;
    let end = c1.floor().min(grid.width.saturating_sub(1) as f64) as i64;

    for x in start..=end {
        if dashed && x % 2 != 0 {
            continue;
        }
        let t = (x as f64 - c0) / span;
        let value = v0 + t * (v1 - v0);
        let Some(row) = geometry.row_of_price(value) else {
            *last = None;
            continue;
        };
        grid.put(row as usize, x as usize, ch, style);

        // Remplissage vertical des marches pour le trait continu
        if !dashed {
            if let Some((prev_x, prev_row)) = *last {
                if x == prev_x + 1 && (row as i32 - prev_row as i32).abs() > 1 {
                    let (low, high) = if row < prev_row {
                        (row + 1, prev_row - 1)
                    } else {
                        (prev_row + 1, row - 1)
                    };
                    for r in low..=high {
                        grid.put(r as usize, x as usize, ch, style);
                    }
                }
            }
        }
        *last = Some((x, row));
    }
}

fn paint_series(grid: &mut Grid, geometry: &ChartGeometry, surface: &ChartSurface, series: &LineSeries) {
    let style = paint_style(series.style);
    let dashed = series.style.line == LineKind::Dashed;
    let points = series.points();

    // Point isolé : une seule cellule, rien à interpoler
    if points.len() == 1 {
        if let (Some(col), Some(row)) = (
            geometry.virtual_column(surface, points[0].time),
            geometry.row_of_price(points[0].value),
        ) {
            let col = col.round();
            if col >= 0.0 {
                grid.put(row as usize, col as usize, SERIES_DOT, style);
            }
        }
        return;
    }

    let mut last: Option<(i64, u16)> = None;
    for pair in points.windows(2) {
        let (Some(c0), Some(c1)) = (
            geometry.virtual_column(surface, pair[0].time),
            geometry.virtual_column(surface, pair[1].time),
        ) else {
            last = None;
            continue;
        };
        paint_segment(
            grid, geometry, c0, pair[0].value, c1, pair[1].value, SERIES_DOT, style, dashed, &mut last,
        );
    }
}

fn paint_price_line(grid: &mut Grid, geometry: &ChartGeometry, line: &PriceLine) {
    // Hors échelle : la ligne est clippée, pas plaquée au bord
    let Some(row) = geometry.row_of_price(line.price) else {
        return;
    };
    let dashed = line.style.line == LineKind::Dashed;
    let ch = if dashed { '╌' } else { '─' };
    let style = paint_style(line.style);

    for x in 0..grid.width {
        if dashed && x % 2 != 0 {
            continue;
        }
        grid.put(row as usize, x, ch, style);
    }

    // Label par-dessus la ligne, côté gauche
    let label_style = Style::default().fg(line.style.color).add_modifier(Modifier::BOLD);
    grid.put_str(row as usize, 1, &line.label, label_style);
}

/// Peint un segment défini par deux points du chart (dessin manuel ou
/// prévisualisation), dans n'importe quel ordre de clic
fn paint_chart_segment(
    grid: &mut Grid,
    geometry: &ChartGeometry,
    surface: &ChartSurface,
    a: ChartPoint,
    b: ChartPoint,
    style: Style,
    dashed: bool,
) {
    let (Some(mut c0), Some(mut c1)) = (
        geometry.virtual_column(surface, a.time),
        geometry.virtual_column(surface, b.time),
    ) else {
        // Un des points n'est plus un slot (granularité changée) : ignoré
        return;
    };
    let (mut v0, mut v1) = (a.price, b.price);
    if c1 < c0 {
        std::mem::swap(&mut c0, &mut c1);
        std::mem::swap(&mut v0, &mut v1);
    }

    // Segment quasi vertical : deux clics sur la même chandelle
    if (c1 - c0).abs() < 0.5 {
        let col = c0.round();
        if col < 0.0 || col as usize >= grid.width {
            return;
        }
        let clamp = |v: f64| v.clamp(geometry.min_price, geometry.max_price);
        if let (Some(r0), Some(r1)) = (
            geometry.row_of_price(clamp(v0)),
            geometry.row_of_price(clamp(v1)),
        ) {
            for r in r0.min(r1)..=r0.max(r1) {
                grid.put(r as usize, col as usize, SERIES_DOT, style);
            }
        }
        return;
    }

    let mut last: Option<(i64, u16)> = None;
    paint_segment(grid, geometry, c0, v0, c1, v1, SERIES_DOT, style, dashed, &mut last);
}

fn paint_drawings(grid: &mut Grid, geometry: &ChartGeometry, surface: &ChartSurface) {
    let theme = surface.theme;
    let committed = Style::default().fg(theme.drawing);

    for drawing in &surface.drawings {
        match drawing {
            ManualDrawing::HorizontalLine { price } => {
                if let Some(row) = geometry.row_of_price(*price) {
                    for x in 0..grid.width {
                        grid.put(row as usize, x, '─', committed);
                    }
                }
            }
            ManualDrawing::TrendLine { start, end } => {
                paint_chart_segment(grid, geometry, surface, *start, *end, committed, false);
            }
        }
    }

    // La prévisualisation suit la souris : trait discontinu, couleur dédiée
    if let Some((anchor, cursor)) = surface.preview() {
        let style = Style::default().fg(theme.preview);
        paint_chart_segment(grid, geometry, surface, anchor, cursor, style, true);
    }
}

fn paint_markers(grid: &mut Grid, geometry: &ChartGeometry, surface: &ChartSurface) {
    for marker in surface.main.markers() {
        let Some(slot) = surface.slot_of(marker.time) else {
            continue;
        };
        if slot < geometry.first_visible {
            continue;
        }
        let col = geometry.column_of(slot - geometry.first_visible);
        let candle = &surface.main.candles[slot];

        let row = match marker.position {
            MarkerPosition::AboveBar => match geometry.row_of_price(candle.high) {
                Some(row) => row.saturating_sub(1),
                None => continue,
            },
            MarkerPosition::BelowBar => match geometry.row_of_price(candle.low) {
                Some(row) => (row + 1).min(geometry.rows.saturating_sub(1)),
                None => continue,
            },
        };

        let glyph = match marker.shape {
            MarkerShape::ArrowUp => '▲',
            MarkerShape::ArrowDown => '▼',
            MarkerShape::Circle => '●',
        };
        let style = Style::default().fg(marker.color);
        grid.put(row as usize, col as usize, glyph, style);

        // Label à droite du glyphe, à gauche si le bord est trop proche
        if let Some(label) = &marker.label {
            let len = label.chars().count();
            let start = if col as usize + 2 + len <= grid.width {
                col as usize + 2
            } else {
                (col as usize).saturating_sub(len + 1)
            };
            grid.put_str(row as usize, start, label, style);
        }
    }
}

fn build_grid(geometry: &ChartGeometry, surface: &ChartSurface) -> Grid {
    let mut grid = Grid::new(geometry.chart_width as usize, geometry.rows as usize);

    paint_candles(&mut grid, geometry, surface);
    for series in &surface.main.series {
        paint_series(&mut grid, geometry, surface, series);
    }
    for line in &surface.main.price_lines {
        paint_price_line(&mut grid, geometry, line);
    }
    paint_drawings(&mut grid, geometry, surface);
    paint_markers(&mut grid, geometry, surface);

    grid
}

// ============================================================================
// Axes
// ============================================================================

/// Rend une ligne de l'axe Y avec le prix (un label toutes les 4 lignes)
fn y_axis_prefix(geometry: &ChartGeometry, y: u16) -> String {
    let narrow = geometry.y_axis_width == NARROW_Y_AXIS_WIDTH;
    if y % 4 == 0 {
        let price = geometry.min_price
            + y as f64 * (geometry.max_price - geometry.min_price) / geometry.rows as f64;
        if narrow {
            format!("{:>5.2} │ ", price)
        } else {
            format!("{:>9.2} │ ", price)
        }
    } else if narrow {
        format!("{:>5} │ ", "")
    } else {
        format!("{:>9} │ ", "")
    }
}

/// Décide si une chandelle porte un label d'axe X
///
/// CONCEPT : Labels intelligents par granularité
/// - Heures rondes pour l'intraday fin, changements de jour / mois / année
///   pour les granularités larges : jamais de label bizarre (14:17)
fn wants_label(time: CanonicalTime, prev: Option<CanonicalTime>, strategy: LabelStrategy) -> bool {
    match strategy {
        LabelStrategy::RoundHours { interval_hours } => match time.instant_utc() {
            Some(instant) => instant.minute() == 0 && instant.hour() % interval_hours == 0,
            None => false,
        },
        LabelStrategy::RegularDays { interval_days } => {
            let day = time.calendar_day();
            let changed = prev.map(|p| p.calendar_day() != day).unwrap_or(true);
            changed && (interval_days <= 1 || day.day() % interval_days == 1)
        }
        LabelStrategy::RegularMonths { interval_months } => {
            let day = time.calendar_day();
            let changed = prev
                .map(|p| p.calendar_day().month() != day.month())
                .unwrap_or(true);
            changed && (interval_months <= 1 || day.month0() % interval_months == 0)
        }
        LabelStrategy::RegularYears { interval_years } => {
            let day = time.calendar_day();
            let changed = prev
                .map(|p| p.calendar_day().year() != day.year())
                .unwrap_or(true);
            changed && (interval_years <= 1 || day.year() % interval_years as i32 == 0)
        }
    }
}

/// Colonnes et textes des labels de l'axe X, espacement minimal garanti
fn label_columns(geometry: &ChartGeometry, surface: &ChartSurface) -> Vec<(u16, String)> {
    let formats = surface.granularity.x_axis_format();
    let mut labels = Vec::new();
    let mut prev: Option<CanonicalTime> = None;
    let mut last_end: i64 = -2;

    for (i, candle) in geometry.visible(surface).iter().enumerate() {
        if wants_label(candle.time, prev, formats.label_strategy) {
            let text = match formats.time_format {
                Some(fmt) => candle.time.format(fmt),
                None => candle.time.format(formats.date_format),
            };
            let col = geometry.column_of(i);
            if col as i64 >= last_end + 2 {
                last_end = col as i64 + text.chars().count() as i64;
                labels.push((col, text));
            }
        }
        prev = Some(candle.time);
    }
    labels
}

/// Dates aux changements de jour (3e ligne d'axe, intraday seulement)
fn date_columns(geometry: &ChartGeometry, surface: &ChartSurface) -> Vec<(u16, String)> {
    let mut dates = Vec::new();
    let mut prev_day = None;
    let mut last_end: i64 = -2;

    for (i, candle) in geometry.visible(surface).iter().enumerate() {
        let day = candle.time.calendar_day();
        if let Some(previous) = prev_day {
            if previous != day {
                let col = geometry.column_of(i);
                let text = day.format("%d/%m").to_string();
                if col as i64 >= last_end + 2 {
                    last_end = col as i64 + text.chars().count() as i64;
                    dates.push((col, text));
                }
            }
        }
        prev_day = Some(day);
    }
    dates
}

/// Construit une ligne de texte en plaçant chaque entrée à sa colonne
fn positioned_row(width: usize, entries: &[(u16, String)], tick_only: bool) -> String {
    let mut row = vec![UNICODE_VOID; width];
    for (col, text) in entries {
        if tick_only {
            if (*col as usize) < width {
                row[*col as usize] = '│';
            }
        } else {
            for (i, ch) in text.chars().enumerate() {
                let at = *col as usize + i;
                if at < width {
                    row[at] = ch;
                }
            }
        }
    }
    row.into_iter().collect()
}

/// Génère les lignes de l'axe X : tick marks, labels, dates éventuelles
fn axis_lines(geometry: &ChartGeometry, surface: &ChartSurface) -> Vec<Line<'static>> {
    let axis_style = Style::default().fg(surface.theme.axis);
    let prefix = " ".repeat(geometry.y_axis_width as usize);
    let width = geometry.chart_width as usize;
    let labels = label_columns(geometry, surface);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}{}", prefix, positioned_row(width, &labels, true)),
            axis_style,
        )),
        Line::from(Span::styled(
            format!("{}{}", prefix, positioned_row(width, &labels, false)),
            axis_style,
        )),
    ];

    if surface.granularity.x_axis_format().time_format.is_some() {
        let dates = date_columns(geometry, surface);
        lines.push(Line::from(Span::styled(
            format!("{}{}", prefix, positioned_row(width, &dates, false)),
            axis_style.add_modifier(Modifier::DIM),
        )));
    }

    lines
}

// ============================================================================
// API publique
// ============================================================================

/// Dessine le panneau principal de la surface dans la zone donnée
///
/// La zone est la zone intérieure (sans bordure) ; l'appelant dessine le
/// Block autour. Zone trop petite ou surface sans chandelle : rien n'est
/// dessiné, l'appelant gère le message.
pub fn render(frame: &mut Frame, surface: &ChartSurface, area: Rect) {
    let Some(geometry) = ChartGeometry::new(surface, area) else {
        return;
    };
    let grid = build_grid(&geometry, surface);

    let axis_style = Style::default().fg(surface.theme.axis);
    let mut lines = Vec::with_capacity(geometry.rows as usize + 3);

    // Parcourt de haut en bas (reversed)
    for y in (1..=geometry.rows).rev() {
        let mut spans = vec![Span::styled(y_axis_prefix(&geometry, y), axis_style)];
        spans.extend(grid.row_spans((geometry.rows - y) as usize));
        lines.push(Line::from(spans));
    }
    lines.extend(axis_lines(&geometry, surface));

    frame.render_widget(Paragraph::new(lines), area);
}

/// Position souris absolue → point du chart, avec la même zone que `render`
///
/// Retourne None hors de la zone tracée (axe Y, axe X, bordures) : un clic
/// qui ne résout pas de point est ignoré par l'appelant.
pub fn hit_test(surface: &ChartSurface, area: Rect, column: u16, row: u16) -> Option<ChartPoint> {
    let geometry = ChartGeometry::new(surface, area)?;
    geometry.point_at(surface, column, row)
}

/// Index de la première chandelle visible pour une zone donnée
///
/// Les panneaux oscillateurs alignent leur fenêtre temporelle dessus.
pub(crate) fn visible_start(surface: &ChartSurface, area: Rect) -> usize {
    ChartGeometry::new(surface, area)
        .map(|geometry| geometry.first_visible)
        .unwrap_or(0)
}

// ============================================================================
// Tests unitaires
// ============================================================================
