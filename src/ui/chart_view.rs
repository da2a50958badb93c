// ============================================================================
// Vue chart : header de score, panneaux empilés, figures, plein écran
// ============================================================================
// L'écran d'analyse d'un symbole. Les panneaux oscillateurs sont empilés
// au-dessus du panneau principal selon l'allocation portée par la surface ;
// le panneau latéral liste les figures détectées avec leur fiabilité.
//
// Le plein écran suit le protocole requête → layout appliqué → confirmation :
// la vue décide du layout réellement appliqué (refusé si le terminal est
// trop bas) et le notifie au viewport. L'état plein écran n'est jamais
// supposé depuis la requête.
//
// CONCEPTS RATATUI :
// 1. Chart widget : panneaux oscillateurs (Dataset + Axis + bounds)
// 2. Layout imbriqué : colonnes (chart + panneau latéral) dans les lignes
// 3. Rendu conditionnel selon l'état du moteur (Empty / Ready / Failed)
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::chart::style::ChartTheme;
use crate::chart::surface::{ChartSurface, OscillatorPane};
use crate::chart::viewport::MIN_FULLSCREEN_HEIGHT;
use crate::chart::ChartState;
use crate::models::analysis::{AnalysisSnapshot, PatternBias};
use crate::models::drawing::DrawingTool;
use crate::ui::candlesticks;

/// Largeur du panneau latéral des figures
const PATTERN_PANEL_WIDTH: u16 = 34;

/// Largeur minimale du terminal pour afficher le panneau latéral
const PANEL_MIN_TERMINAL_WIDTH: u16 = 100;

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine l'écran chart complet
///
/// Mutable sur App : la vue notifie le viewport du layout appliqué et
/// mémorise la zone tracée du panneau principal pour le hit-testing souris.
pub fn render_chart_view(frame: &mut Frame, app: &mut App) {
    let size = frame.size();

    // Décision de layout plein écran, puis notification au viewport.
    // L'état confirmé vient du layout réellement appliqué, jamais de la
    // requête : un terminal trop bas refuse le passage en plein écran.
    let applied_fullscreen =
        app.chart.viewport.desired_fullscreen() && size.height >= MIN_FULLSCREEN_HEIGHT;
    app.chart.viewport.confirm_layout(applied_fullscreen);

    if size.width < candlesticks::MIN_TERMINAL_WIDTH {
        app.chart_area = None;
        render_too_narrow(frame, size);
        return;
    }

    // Plein écran : le chart occupe tout le terminal, chrome caché
    if applied_fullscreen {
        render_chart_block(frame, app, size);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : prix, score, signal
            Constraint::Min(0),    // Chart + panneau latéral
            Constraint::Length(1), // Barre de raccourcis
        ])
        .split(size)
        .to_vec();

    render_header(frame, app, chunks[0]);

    let show_panel = app.show_patterns && size.width >= PANEL_MIN_TERMINAL_WIDTH;
    let chart_zone = if show_panel {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(PATTERN_PANEL_WIDTH)])
            .split(chunks[1])
            .to_vec();
        render_pattern_panel(frame, &app.chart.theme, app.analysis.as_ref(), columns[1]);
        columns[0]
    } else {
        chunks[1]
    };

    render_chart_block(frame, app, chart_zone);
    render_footer(frame, app, chunks[2]);
}

// ============================================================================
// Header
// ============================================================================

/// Header avec prix, variation, score d'analyse et signal
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" 📊 {} - analyse ", app.active_symbol));

    let text = if app.is_loading_data() {
        let message = app
            .loading_message
            .clone()
            .unwrap_or_else(|| "Chargement en cours...".to_string());
        vec![Line::from(vec![
            Span::styled(
                "⏳ ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                message,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ])]
    } else {
        let mut spans = Vec::new();

        // Prix et variation de la dernière chandelle rendue
        if let Some(candle) = app.chart.surface().and_then(|s| s.main.candles.last()) {
            let change = candle.change_percent();
            let color = if change >= 0.0 { Color::Green } else { Color::Red };
            let arrow = if change >= 0.0 { "▲" } else { "▼" };

            spans.push(Span::raw("Prix: "));
            spans.push(Span::styled(
                format!("${:.2}", candle.close),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("{} {:+.2}%", arrow, change),
                Style::default().fg(color),
            ));
            spans.push(Span::raw("  "));
        }

        if let Some(analysis) = &app.analysis {
            let bias_color = app.chart.theme.bias_color(analysis.score_bias());
            spans.push(Span::raw("Score: "));
            spans.push(Span::styled(
                format!("{:.0}/100", analysis.score),
                Style::default().fg(bias_color).add_modifier(Modifier::BOLD),
            ));
            if !analysis.signal.is_empty() {
                spans.push(Span::raw("  Signal: "));
                spans.push(Span::styled(
                    analysis.signal.clone(),
                    Style::default().fg(bias_color).add_modifier(Modifier::BOLD),
                ));
            }
            spans.push(Span::raw("  "));
        }

        spans.push(Span::styled(
            "[ESC]",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" Retour"));
        vec![Line::from(spans)]
    };

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Bloc chart : états du moteur et panneaux
// ============================================================================

/// Dessine le bloc chart et route selon l'état du moteur
fn render_chart_block(frame: &mut Frame, app: &mut App, area: Rect) {
    let candle_count = app
        .chart
        .surface()
        .map(|s| s.main.candles.len())
        .unwrap_or(0);
    let tool = app.chart.drawing.tool();

    let title = if tool.is_armed() {
        format!(
            " 🕯️ {} - {} ({} chandelles) [outil : {}] ",
            app.active_symbol,
            app.granularity.label(),
            candle_count,
            tool.label()
        )
    } else {
        format!(
            " 🕯️ {} - {} ({} chandelles) ",
            app.active_symbol,
            app.granularity.label(),
            candle_count
        )
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Le viewport suit la zone intérieure : tout changement de dimensions
    // déclenche une reconstruction au prochain tour de boucle
    app.chart.viewport.on_resize(inner.width, inner.height);
    app.chart_area = None;

    match app.chart.state() {
        ChartState::Failed(message) => {
            render_build_error(frame, inner, message);
        }
        ChartState::Empty => {
            let message = if app.is_loading_data() {
                "Chargement des données..."
            } else {
                "Pas de données à afficher"
            };
            render_centered_notice(frame, inner, message);
        }
        ChartState::Ready(surface) => {
            render_panes(frame, surface, inner, &mut app.chart_area);
        }
    }
}

/// Empile les panneaux oscillateurs puis le panneau principal
///
/// Chaque panneau consomme sa bande verticale d'allocation, dans l'ordre
/// d'empilement ; le panneau principal reçoit le reste et sa zone est
/// mémorisée pour le hit-testing souris.
fn render_panes(
    frame: &mut Frame,
    surface: &ChartSurface,
    inner: Rect,
    chart_area: &mut Option<Rect>,
) {
    let allocation = surface.allocation;
    let height = inner.height as f64;
    let bottom = inner.y + inner.height;

    let (main_top, _) = allocation.main_band();
    let main_y = inner.y + (height * main_top).round() as u16;
    let main_area = if main_y < bottom {
        Some(Rect::new(inner.x, main_y, inner.width, bottom - main_y))
    } else {
        None
    };

    // Fenêtre temporelle du panneau principal, partagée par les oscillateurs
    let first_visible = main_area
        .map(|area| candlesticks::visible_start(surface, area))
        .unwrap_or(0);

    for (index, pane) in surface.oscillators.iter().enumerate() {
        let (top, band_bottom) = allocation.oscillator_band(index);
        let y0 = inner.y + (height * top).round() as u16;
        let y1 = inner.y + (height * band_bottom).round() as u16;
        if y1 <= y0 {
            continue;
        }
        let pane_area = Rect::new(inner.x, y0, inner.width, y1 - y0);
        render_oscillator_pane(frame, surface, pane, first_visible, pane_area);
    }

    if let Some(area) = main_area {
        candlesticks::render(frame, surface, area);
        *chart_area = Some(area);
    }
}

/// Dessine un panneau oscillateur avec sa propre échelle
///
/// CONCEPT RATATUI : Dataset + Axis
/// - Chaque panneau a ses bornes propres (RSI : 0..100 fixe, sinon auto)
/// - Les bornes X suivent la fenêtre visible du panneau principal
fn render_oscillator_pane(
    frame: &mut Frame,
    surface: &ChartSurface,
    pane: &OscillatorPane,
    first_visible: usize,
    area: Rect,
) {
    let axis_style = Style::default().fg(surface.theme.axis);
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(axis_style)
        .title(Span::styled(format!(" {} ", pane.kind.label()), axis_style));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let Some((y_min, y_max)) = pane.value_bounds() else {
        let notice = Paragraph::new(Span::styled(
            "aucune donnée",
            axis_style.add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(notice, inner);
        return;
    };

    let x_min = first_visible as f64;
    let mut x_max = surface.slot_count().saturating_sub(1) as f64;
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }

    // Séries lignes, positionnées par index de slot
    let mut line_data: Vec<(String, Style, Vec<(f64, f64)>)> = Vec::new();
    for series in &pane.lines {
        let points: Vec<(f64, f64)> = series
            .points()
            .iter()
            .filter_map(|p| surface.slot_of(p.time).map(|slot| (slot as f64, p.value)))
            .collect();
        if !points.is_empty() {
            line_data.push((
                series.name.clone(),
                candlesticks::paint_style(series.style),
                points,
            ));
        }
    }

    // Histogramme scindé par couleur (un Dataset par couleur de barre)
    let mut histogram_data: Vec<(Style, Vec<(f64, f64)>)> = Vec::new();
    if let Some(histogram) = &pane.histogram {
        for point in histogram.points() {
            let Some(slot) = surface.slot_of(point.time) else {
                continue;
            };
            let style = Style::default().fg(point.color);
            match histogram_data.iter_mut().find(|(s, _)| *s == style) {
                Some((_, points)) => points.push((slot as f64, point.value)),
                None => histogram_data.push((style, vec![(slot as f64, point.value)])),
            }
        }
    }

    // Lignes guides horizontales (RSI : 30 / 70)
    let guide_data: Vec<Vec<(f64, f64)>> = pane
        .guides
        .iter()
        .map(|level| vec![(x_min, *level), (x_max, *level)])
        .collect();

    let mut datasets = Vec::new();
    for guide in &guide_data {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(axis_style.add_modifier(Modifier::DIM))
                .data(guide),
        );
    }
    for (style, points) in &histogram_data {
        // Marker::Bar en nuage de points : un glyphe de barre par slot
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Bar)
                .graph_type(GraphType::Scatter)
                .style(*style)
                .data(points),
        );
    }
    for (name, style, points) in &line_data {
        datasets.push(
            Dataset::default()
                .name(name.as_str())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(*style)
                .data(points),
        );
    }

    let y_axis = Axis::default()
        .style(axis_style)
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format_scale_value(y_min)),
            Span::raw(format_scale_value((y_min + y_max) / 2.0)),
            Span::raw(format_scale_value(y_max)),
        ]);
    let x_axis = Axis::default().style(axis_style).bounds([x_min, x_max]);

    let chart = Chart::new(datasets).x_axis(x_axis).y_axis(y_axis);
    frame.render_widget(chart, inner);
}

/// Formate une valeur d'échelle de façon compacte (volumes en M / k)
fn format_scale_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000_000.0 {
        format!("{:.1}G", value / 1_000_000_000.0)
    } else if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 10_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else if magnitude >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

// ============================================================================
// Panneau latéral des figures
// ============================================================================

/// Liste des figures détectées avec biais, fiabilité et confiance
fn render_pattern_panel(
    frame: &mut Frame,
    theme: &ChartTheme,
    analysis: Option<&AnalysisSnapshot>,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Figures détectées [p] ");

    let dim = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    match analysis {
        None => lines.push(Line::from(Span::styled("Analyse indisponible", dim))),
        Some(analysis) => {
            if analysis.patterns.is_empty() {
                lines.push(Line::from(Span::styled("Aucune figure détectée", dim)));
            }

            for pattern in &analysis.patterns {
                let bias = pattern.bias();
                let color = theme.bias_color(bias);
                let glyph = match bias {
                    PatternBias::Bullish => "▲",
                    PatternBias::Bearish => "▼",
                    PatternBias::Neutral => "●",
                };

                let mut spans = vec![
                    Span::styled(format!("{} ", glyph), Style::default().fg(color)),
                    Span::styled(
                        pattern.name.clone(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                ];
                if let Some(reliability) = pattern.reliability {
                    let stars = "★".repeat(reliability.round().clamp(0.0, 5.0) as usize);
                    if !stars.is_empty() {
                        spans.push(Span::styled(
                            format!("  {}", stars),
                            Style::default().fg(Color::Yellow),
                        ));
                    }
                }
                if let Some(confidence) = pattern.confidence {
                    // Le backend renvoie 0..1 ou un pourcentage direct
                    let percent = if confidence <= 1.0 {
                        confidence * 100.0
                    } else {
                        confidence
                    };
                    spans.push(Span::styled(
                        format!("  {:.0}%", percent),
                        Style::default().fg(Color::Gray),
                    ));
                }
                lines.push(Line::from(spans));

                if let Some(description) = &pattern.description {
                    lines.push(Line::from(Span::styled(format!("  {}", description), dim)));
                }
                if let Some(target) = pattern.target {
                    lines.push(Line::from(Span::styled(
                        format!("  objectif {:.2}", target),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }

            let levels = analysis.entry_levels.present();
            if !levels.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Niveaux d'entrée",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                for (kind, price) in levels {
                    lines.push(Line::from(Span::raw(format!(
                        "  {:<9} {:.2}",
                        kind.label(),
                        price
                    ))));
                }
            }

            if let Some(recommendation) = &analysis.recommendation {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Recommandation",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    recommendation.clone(),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Barre de raccourcis
// ============================================================================

/// Barre de raccourcis avec surlignage des toggles actifs
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let toggles = app.chart.toggles;
    let tool = app.chart.drawing.tool();

    let key = |label: &str, active: bool| -> Span<'static> {
        if active {
            Span::styled(
                label.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label.to_string(), Style::default().fg(Color::DarkGray))
        }
    };

    let mut spans = vec![
        key("[1]SMA20", toggles.sma_20),
        Span::raw(" "),
        key("[2]SMA50", toggles.sma_50),
        Span::raw(" "),
        key("[3]EMA20", toggles.ema_20),
        Span::raw(" "),
        key("[b]Bollinger", toggles.bollinger),
        Span::raw(" "),
        key("[r]RSI", toggles.rsi),
        Span::raw(" "),
        key("[m]MACD", toggles.macd),
        Span::raw(" "),
        key("[v]Volume", toggles.volume),
        Span::raw("  "),
        key("[h]Ligne", tool == DrawingTool::HorizontalLine),
        Span::raw(" "),
        key("[t]Tendance", tool == DrawingTool::TrendLine),
        Span::raw(" "),
        key("[c]Effacer", false),
        Span::raw(" "),
        key("[f]Plein écran", app.chart.viewport.is_fullscreen()),
        Span::raw(" "),
        key("[p]Figures", app.show_patterns),
        Span::raw(" "),
        key("[←/→]Granularité", false),
    ];

    if app.chart.drawing.is_pending() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "second point de la tendance...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ============================================================================
// Messages d'état
// ============================================================================

/// Erreur de construction : message court, rien d'autre n'est dessiné
fn render_build_error(frame: &mut Frame, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("⚠ {}", message),
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Un changement d'affichage relancera la construction",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_centered_notice(frame: &mut Frame, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Terminal trop étroit pour le chart
fn render_too_narrow(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" ⚠ Terminal trop petit ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Terminal trop étroit pour afficher le graphique",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Largeur minimale requise : {} colonnes",
                candlesticks::MIN_TERMINAL_WIDTH
            ),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled("[ESC] Retour", Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::Pattern;
    use crate::models::candle::{RawCandle, RawTimestamp};
    use crate::models::granularity::Granularity;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn raw_day(d: u32) -> RawCandle {
        RawCandle::new(
            RawTimestamp::Text(format!("2024-01-{:02}", d)),
            10.0,
            11.0,
            9.0,
            10.5,
        )
    }

    fn ready_app() -> App {
        let mut app = App::new();
        app.active_symbol = "AAPL".to_string();
        app.chart.viewport.on_resize(120, 40);
        app.chart.viewport.take_dirty();
        app.chart
            .rebuild("AAPL", Granularity::D1, &[raw_day(1), raw_day(2), raw_day(3)], None);
        app
    }

    /// Aplati le buffer de rendu en une chaîne, ligne par ligne
    fn buffer_text(buffer: &Buffer) -> String {
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_fullscreen_denied_when_terminal_too_small() {
        let mut app = ready_app();
        app.chart.viewport.request_fullscreen_toggle();
        assert!(app.chart.viewport.desired_fullscreen());

        // Hauteur sous le minimum : la requête est refusée et consommée
        let backend = TestBackend::new(80, MIN_FULLSCREEN_HEIGHT - 4);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_chart_view(frame, &mut app)).unwrap();

        assert!(!app.chart.viewport.is_fullscreen());
        assert!(!app.chart.viewport.desired_fullscreen());
    }

    #[test]
    fn test_fullscreen_confirmed_from_applied_layout() {
        let mut app = ready_app();
        app.chart.viewport.request_fullscreen_toggle();

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_chart_view(frame, &mut app)).unwrap();

        assert!(app.chart.viewport.is_fullscreen());
    }

    #[test]
    fn test_chart_area_tracked_for_hit_testing() {
        let mut app = ready_app();
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_chart_view(frame, &mut app)).unwrap();

        // La zone tracée est mémorisée et résout des points
        let area = app.chart_area.expect("zone du chart non mémorisée");
        let surface = app.chart.surface().unwrap();
        let point = candlesticks::hit_test(surface, area, area.x + 20, area.y + 2);
        assert!(point.is_some());
    }

    #[test]
    fn test_volume_histogram_painted_as_bar_glyphs() {
        let mut app = App::new();
        app.active_symbol = "AAPL".to_string();
        app.chart.viewport.on_resize(120, 40);
        app.chart.viewport.take_dirty();
        let candles = vec![
            raw_day(1).with_volume(1_000.0),
            raw_day(2).with_volume(2_000.0),
            raw_day(3).with_volume(1_500.0),
        ];
        app.chart.rebuild("AAPL", Granularity::D1, &candles, None);

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_chart_view(frame, &mut app)).unwrap();

        // Le panneau volume est titré et son histogramme est peint
        let content = buffer_text(terminal.backend().buffer());
        assert!(content.contains(" Volume "));
        assert!(content.contains('▄'), "barres de volume absentes du rendu");
    }

    #[test]
    fn test_pattern_panel_shows_price_target() {
        let analysis = AnalysisSnapshot {
            patterns: vec![Pattern {
                name: "Double Bottom".to_string(),
                kind: Some("bullish_reversal".to_string()),
                points: Vec::new(),
                reliability: Some(4.0),
                confidence: None,
                description: None,
                target: Some(210.0),
            }],
            ..AnalysisSnapshot::default()
        };

        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let theme = ChartTheme::default();
                render_pattern_panel(frame, &theme, Some(&analysis), frame.size());
            })
            .unwrap();

        let content = buffer_text(terminal.backend().buffer());
        assert!(content.contains("objectif 210.00"));
    }

    #[test]
    fn test_scale_value_formatting() {
        assert_eq!(format_scale_value(1_250_000.0), "1.2M");
        assert_eq!(format_scale_value(52_000.0), "52k");
        assert_eq!(format_scale_value(70.0), "70.0");
        assert_eq!(format_scale_value(101.5), "102");
    }
}
