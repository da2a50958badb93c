// ============================================================================
// Dashboard - Rendu de la watchlist
// ============================================================================
// Dessine l'écran principal en utilisant les widgets de ratatui
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, List)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

/// Dessine le dashboard (watchlist)
pub fn render_dashboard(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

/// Dessine le dashboard avec le mode input actif
///
/// CONCEPT : Modal input (Vim-like)
/// - Affiche la watchlist en arrière-plan
/// - Affiche une ligne d'input en bas pour saisir le symbole
/// - ESC annule, Enter valide
pub fn render_input_mode(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);

    // Footer : la ligne de saisie remplace les raccourcis
    render_input_footer(frame, app, chunks[2]);
}

/// Crée le layout principal (header, content, footer)
///
/// CONCEPT RUST : Rc<[T]> vs Vec<T>
/// - Layout::split() retourne Rc<[Rect]> (reference counted slice)
/// - On le convertit en Vec avec .to_vec() pour simplifier
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : 3 lignes
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(3), // Footer : 3 lignes
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header
// ============================================================================

/// Dessine le header avec le titre et l'indicateur de chargement
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" LazyChart ")
        .title_alignment(Alignment::Center);

    let text = if app.is_loading_data() {
        let message = app
            .loading_message
            .clone()
            .unwrap_or_else(|| "Chargement en cours...".to_string());
        vec![Line::from(Span::styled(
            format!("⏳ {}", message),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))]
    } else {
        vec![Line::from(Span::styled(
            "📈 Analyse technique dans le terminal",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))]
    };

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Main Content : la watchlist
// ============================================================================

/// Dessine la watchlist
///
/// CONCEPT RATATUI : List widget
/// - Widget pour afficher une liste d'items
/// - Highlight : style spécial pour l'item sélectionné
/// - ListItem : chaque ligne de la liste
///
/// Chaque ligne : symbole, nom, prix, variation, verdict d'analyse.
/// La colonne verdict est colorée par le biais du score (vert / rouge / gris).
fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 📊 Watchlist ");

    // Si la watchlist est vide, affiche un message
    if app.watchlist.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Watchlist vide, [a] pour ajouter un symbole",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .watchlist
        .iter()
        .enumerate()
        .map(|(index, item)| {
            // Style de la ligne selon la variation
            let mut style = if item.has_data() {
                if item.is_positive() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }
            } else {
                Style::default().fg(Color::Gray)
            };

            // L'item sélectionné est inversé
            if index == app.selected_index {
                style = style
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::REVERSED);
            }

            let price_str = item
                .current_price()
                .map(|p| format!("${:.2}", p))
                .unwrap_or_else(|| "Chargement...".to_string());

            let change_str = item
                .change_percent()
                .map(|c| {
                    let arrow = if c >= 0.0 { "▲" } else { "▼" };
                    format!("{} {:+.2}%", arrow, c)
                })
                .unwrap_or_default();

            // Le nom est tronqué pour laisser la place au verdict
            let name = if item.name.chars().count() <= 18 {
                item.name.clone()
            } else {
                let truncated: String = item.name.chars().take(17).collect();
                format!("{}…", truncated)
            };

            let mut spans = vec![Span::styled(
                format!(
                    " {:<8} {:<18} {:>12}  {:<10}",
                    item.symbol, name, price_str, change_str
                ),
                style,
            )];

            // Colonne verdict : score et signal colorés par le biais
            if let Some(analysis) = &item.analysis {
                let verdict_color = app.chart.theme.bias_color(item.score_bias());
                spans.push(Span::styled(
                    format!("  {:>3.0} {}", analysis.score, analysis.signal),
                    style.fg(verdict_color).add_modifier(Modifier::BOLD),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

// ============================================================================
// Footer : raccourcis et confirmations
// ============================================================================

/// Dessine le footer avec les raccourcis clavier
///
/// CONCEPT : Confirmations two-step
/// - Suppression et quit demandent une seconde pression
/// - Le footer affiche l'avertissement tant que la confirmation est attendue
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_delete_confirmation() {
        let symbol = app
            .watchlist
            .get(app.selected_index)
            .map(|item| item.symbol.as_str())
            .unwrap_or("?");

        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[d]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                format!(
                    " à nouveau pour supprimer {} ou autre touche pour annuler ⚠",
                    symbol
                ),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                "[q]",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Quit  "),
            Span::styled(
                "[↑↓ / j k]",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Navigate  "),
            Span::styled(
                "[Enter]",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Chart  "),
            Span::styled(
                "[a]",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Add  "),
            Span::styled(
                "[d]",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Delete"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine le footer en mode input avec la ligne de saisie
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green)); // Vert pour indiquer mode input

    let input_line = Line::from(vec![
        Span::styled(
            &app.input_prompt,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(&app.input_buffer, Style::default().fg(Color::White)),
        Span::styled(
            "█", // Curseur
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        Span::styled(
            "[Enter]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Confirm  "),
        Span::styled(
            "[ESC]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
